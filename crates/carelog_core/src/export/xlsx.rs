//! Minimal single-sheet XLSX (SpreadsheetML) writer.
//!
//! # Responsibility
//! - Hold text cells, merged ranges and column widths for one worksheet.
//! - Serialize the workbook package (zip of XML parts).
//!
//! # Invariants
//! - All cells are inline strings; no shared-string table is written.
//! - Rows are emitted in ascending index order; skipped indexes stay blank.
//! - Auto-sizing ignores cells covered by a merged range.

use std::collections::BTreeMap;
use std::io::{Seek, Write};
use zip::result::ZipResult;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const MAX_COLUMN_WIDTH: f64 = 255.0;
const COLUMN_PADDING: usize = 2;

/// Cell formats registered in `styles.xml`; the discriminant is the xf index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    Plain = 0,
    /// Bold, 14pt.
    Title = 1,
    /// Bold, centered, wrapped.
    Header = 2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Cell {
    text: String,
    style: CellStyle,
}

/// Inclusive cell range within one row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowMerge {
    row: u32,
    first_column: u32,
    last_column: u32,
}

/// One worksheet under construction.
#[derive(Debug, Clone)]
pub struct Worksheet {
    name: String,
    rows: BTreeMap<u32, BTreeMap<u32, Cell>>,
    merges: Vec<RowMerge>,
    column_widths: BTreeMap<u32, f64>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: BTreeMap::new(),
            merges: Vec::new(),
            column_widths: BTreeMap::new(),
        }
    }

    /// Sets the text of one cell (zero-based row and column).
    pub fn set_cell(&mut self, row: u32, column: u32, text: impl Into<String>, style: CellStyle) {
        self.rows.entry(row).or_default().insert(
            column,
            Cell {
                text: text.into(),
                style,
            },
        );
    }

    /// Merges `first_column..=last_column` of `row` into one visual cell.
    pub fn merge_row(&mut self, row: u32, first_column: u32, last_column: u32) {
        self.merges.push(RowMerge {
            row,
            first_column,
            last_column,
        });
    }

    /// Sizes columns `0..column_count` to their widest unmerged cell.
    pub fn auto_size_columns(&mut self, column_count: u32) {
        for column in 0..column_count {
            let widest = self
                .rows
                .iter()
                .filter_map(|(row, cells)| {
                    if self.is_merged(*row, column) {
                        return None;
                    }
                    cells.get(&column).map(|cell| display_width(&cell.text))
                })
                .max();

            if let Some(widest) = widest.filter(|width| *width > 0) {
                let width = ((widest + COLUMN_PADDING) as f64).min(MAX_COLUMN_WIDTH);
                self.column_widths.insert(column, width);
            }
        }
    }

    /// Width assigned to a column by `auto_size_columns`.
    pub fn column_width(&self, column: u32) -> Option<f64> {
        self.column_widths.get(&column).copied()
    }

    /// Text of one cell, if set.
    pub fn cell_text(&self, row: u32, column: u32) -> Option<&str> {
        self.rows
            .get(&row)
            .and_then(|cells| cells.get(&column))
            .map(|cell| cell.text.as_str())
    }

    /// Writes the complete workbook package and returns the inner writer.
    pub fn write_workbook<W: Write + Seek>(&self, writer: W) -> ZipResult<W> {
        let mut zip = ZipWriter::new(writer);
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let parts: [(&str, String); 6] = [
            ("[Content_Types].xml", CONTENT_TYPES_XML.to_string()),
            ("_rels/.rels", ROOT_RELS_XML.to_string()),
            ("xl/workbook.xml", self.workbook_xml()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XML.to_string()),
            ("xl/styles.xml", STYLES_XML.to_string()),
            ("xl/worksheets/sheet1.xml", self.sheet_xml()),
        ];
        for (path, body) in parts {
            zip.start_file(path, options)?;
            zip.write_all(body.as_bytes())?;
        }

        zip.finish()
    }

    fn is_merged(&self, row: u32, column: u32) -> bool {
        self.merges.iter().any(|merge| {
            merge.row == row && (merge.first_column..=merge.last_column).contains(&column)
        })
    }

    fn workbook_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="{}" sheetId="1" r:id="rId1"/></sheets>"#,
                r#"</workbook>"#
            ),
            escape_xml(&self.name)
        )
    }

    fn sheet_xml(&self) -> String {
        let mut xml = String::from(concat!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
            r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
            r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#
        ));

        if !self.column_widths.is_empty() {
            xml.push_str("<cols>");
            for (column, width) in &self.column_widths {
                let number = column + 1;
                xml.push_str(&format!(
                    r#"<col min="{number}" max="{number}" width="{width:.2}" customWidth="1"/>"#
                ));
            }
            xml.push_str("</cols>");
        }

        xml.push_str("<sheetData>");
        for (row, cells) in &self.rows {
            xml.push_str(&format!(r#"<row r="{}">"#, row + 1));
            for (column, cell) in cells {
                xml.push_str(&format!(
                    r#"<c r="{}" s="{}" t="inlineStr"><is><t xml:space="preserve">{}</t></is></c>"#,
                    cell_reference(*row, *column),
                    cell.style as u8,
                    escape_xml(&cell.text)
                ));
            }
            xml.push_str("</row>");
        }
        xml.push_str("</sheetData>");

        if !self.merges.is_empty() {
            xml.push_str(&format!(r#"<mergeCells count="{}">"#, self.merges.len()));
            for merge in &self.merges {
                xml.push_str(&format!(
                    r#"<mergeCell ref="{}:{}"/>"#,
                    cell_reference(merge.row, merge.first_column),
                    cell_reference(merge.row, merge.last_column)
                ));
            }
            xml.push_str("</mergeCells>");
        }

        xml.push_str("</worksheet>");
        xml
    }
}

/// Spreadsheet column name for a zero-based index (`0 -> A`, `26 -> AA`).
pub fn column_name(column: u32) -> String {
    let mut remaining = column + 1;
    let mut letters = Vec::new();
    while remaining > 0 {
        let offset = ((remaining - 1) % 26) as u8;
        letters.push(char::from(b'A' + offset));
        remaining = (remaining - 1) / 26;
    }
    letters.iter().rev().collect()
}

fn cell_reference(row: u32, column: u32) -> String {
    format!("{}{}", column_name(column), row + 1)
}

/// Approximate rendered width in character units; CJK glyphs count double.
fn display_width(text: &str) -> usize {
    text.lines()
        .map(|line| {
            line.chars()
                .map(|ch| if u32::from(ch) >= 0x2E80 { 2 } else { 1 })
                .sum::<usize>()
        })
        .max()
        .unwrap_or(0)
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            // XML 1.0 forbids most control characters, even escaped.
            ch if (ch as u32) < 0x20 && !matches!(ch, '\t' | '\n' | '\r') => {}
            ch => escaped.push(ch),
        }
    }
    escaped
}

const CONTENT_TYPES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
    r#"<Default Extension="xml" ContentType="application/xml"/>"#,
    r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
    r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
    r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#,
    r#"</Types>"#
);

const ROOT_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
    r#"</Relationships>"#
);

const WORKBOOK_RELS_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
    r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    r#"</Relationships>"#
);

const STYLES_XML: &str = concat!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
    r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
    r#"<fonts count="3">"#,
    r#"<font><sz val="11"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="14"/><name val="Calibri"/></font>"#,
    r#"<font><b/><sz val="11"/><name val="Calibri"/></font>"#,
    r#"</fonts>"#,
    r#"<fills count="2"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill></fills>"#,
    r#"<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>"#,
    r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#,
    r#"<cellXfs count="3">"#,
    r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#,
    r#"<xf numFmtId="0" fontId="1" fillId="0" borderId="0" xfId="0" applyFont="1"/>"#,
    r#"<xf numFmtId="0" fontId="2" fillId="0" borderId="0" xfId="0" applyFont="1" applyAlignment="1"><alignment horizontal="center" wrapText="1"/></xf>"#,
    r#"</cellXfs>"#,
    r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#,
    r#"</styleSheet>"#
);

//! Command-line probe over a care-log database.
//!
//! # Responsibility
//! - Verify `carelog_core` linkage without the Flutter runtime.
//! - Inspect and export a database file from a shell.

use carelog_core::codec::encode_clients;
use carelog_core::db::open_db;
use carelog_core::{
    export_clients_to_spreadsheet, Clock, ExportTarget, HomeService, SqlitePreferenceStore,
    StorageConfig, SystemClock,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

#[derive(Debug, Parser)]
#[command(name = "carelog", about = "Postpartum care log tools", version)]
struct Cli {
    /// Database file; defaults to CARELOG_DB_PATH or the temp dir.
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print core health and version.
    Ping,
    /// List clients with their entry counts.
    List {
        /// Print the stored JSON collection instead of the table view.
        #[arg(long)]
        json: bool,
    },
    /// Export clients to an .xlsx file.
    Export {
        /// Directory that receives the workbook.
        #[arg(long)]
        out: PathBuf,
        /// Client id to include; repeatable. Defaults to every client.
        #[arg(long = "client")]
        clients: Vec<i64>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("Error: {message}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let db_path = cli.db.unwrap_or_else(|| StorageConfig::from_env().db_path);

    match cli.command {
        Commands::Ping => {
            println!("carelog_core ping={}", carelog_core::ping());
            println!("carelog_core version={}", carelog_core::core_version());
            Ok(())
        }
        Commands::List { json } => {
            let conn = open_db(&db_path).map_err(|err| err.to_string())?;
            let service = HomeService::open(SqlitePreferenceStore::new(&conn))
                .map_err(|err| err.to_string())?;
            if json {
                let blob = encode_clients(service.clients()).map_err(|err| err.to_string())?;
                println!("{blob}");
                return Ok(());
            }
            for client in service.clients() {
                println!(
                    "{:>4}  {:<24}  entries={}",
                    client.id,
                    client.title,
                    client.entries.len()
                );
            }
            Ok(())
        }
        Commands::Export { out, clients } => {
            let conn = open_db(&db_path).map_err(|err| err.to_string())?;
            let service = HomeService::open(SqlitePreferenceStore::new(&conn))
                .map_err(|err| err.to_string())?;
            let selected = if clients.is_empty() {
                service.clients().to_vec()
            } else {
                service.clients_for_export(&clients)
            };
            let path = export_clients_to_spreadsheet(
                &selected,
                &ExportTarget::new(None, out),
                SystemClock.now(),
            )
            .map_err(|err| err.to_string())?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

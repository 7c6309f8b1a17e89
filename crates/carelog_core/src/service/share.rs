//! Share preparation for the most recent export.
//!
//! The platform layer owns the actual share intent; core only decides
//! whether sharing is possible and what to hand over.

use crate::export::EXPORT_MIME_TYPE;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

/// Package id of the messaging app that receives shared exports.
pub const SHARE_TARGET_PACKAGE: &str = "com.tencent.mm";

/// Platform check for an installed share target.
pub trait ShareTargetProbe {
    fn is_installed(&self, package: &str) -> bool;
}

/// Everything the platform needs to dispatch a read-only file share.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareRequest {
    pub path: PathBuf,
    pub mime_type: &'static str,
    pub target_package: &'static str,
    /// Grant the receiver revocable read-only access, never write access.
    pub grant_read_only: bool,
}

/// Non-fatal reasons a share cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareError {
    /// No export recorded, or the file is gone from disk.
    NoRecentExport,
    /// The messaging app is not installed.
    TargetNotInstalled,
}

impl Display for ShareError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoRecentExport => write!(f, "no recent export to share; export first"),
            Self::TargetNotInstalled => write!(f, "the messaging app is not installed"),
        }
    }
}

impl Error for ShareError {}

/// Validates the last export and the share target.
pub fn prepare_share<P: ShareTargetProbe + ?Sized>(
    last_export: Option<&Path>,
    probe: &P,
) -> Result<ShareRequest, ShareError> {
    let path = last_export
        .filter(|path| path.is_file())
        .ok_or(ShareError::NoRecentExport)?;

    if !probe.is_installed(SHARE_TARGET_PACKAGE) {
        info!("event=share_prepare module=service status=rejected reason=target_not_installed");
        return Err(ShareError::TargetNotInstalled);
    }

    info!("event=share_prepare module=service status=ok");
    Ok(ShareRequest {
        path: path.to_path_buf(),
        mime_type: EXPORT_MIME_TYPE,
        target_package: SHARE_TARGET_PACKAGE,
        grant_read_only: true,
    })
}

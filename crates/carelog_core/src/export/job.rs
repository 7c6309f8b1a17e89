//! Background export job with a single-flight guard.
//!
//! # Responsibility
//! - Run one export at a time on a dedicated worker thread.
//! - Hand the outcome back to the caller as a path or a readable message.
//!
//! # Invariants
//! - At most one export is in flight per coordinator.
//! - The in-flight flag is cleared on every outcome, including a worker panic.
//! - No timeout or cancellation: a started export runs to completion.

use super::{export_clients_to_spreadsheet, ExportTarget};
use crate::model::care::Client;
use crate::model::time::{Clock, SystemClock};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Message used when a failure carries no readable cause.
pub const EXPORT_FAILED_UNKNOWN: &str = "unknown error";

const WORKER_THREAD_NAME: &str = "carelog-export";

/// Why an export could not be started.
#[derive(Debug)]
pub enum ExportStartError {
    /// Another export is still running.
    AlreadyRunning,
    /// Nothing was selected.
    EmptySelection,
    /// The worker thread could not be spawned.
    Spawn(std::io::Error),
}

impl Display for ExportStartError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyRunning => write!(f, "an export is already in progress"),
            Self::EmptySelection => write!(f, "select at least one client to export"),
            Self::Spawn(err) => write!(f, "failed to start export worker: {err}"),
        }
    }
}

impl Error for ExportStartError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

/// Final result of one export run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Succeeded { path: PathBuf },
    Failed { message: String },
}

impl ExportOutcome {
    fn failed(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.trim().is_empty() {
            return Self::Failed {
                message: EXPORT_FAILED_UNKNOWN.to_string(),
            };
        }
        Self::Failed { message }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Handle to a running export.
#[derive(Debug)]
pub struct ExportHandle {
    worker: JoinHandle<ExportOutcome>,
}

impl ExportHandle {
    /// Blocks until the export finishes.
    pub fn wait(self) -> ExportOutcome {
        self.worker.join().unwrap_or_else(|_| {
            error!("event=export_job module=export status=error error_code=worker_panicked");
            ExportOutcome::failed(EXPORT_FAILED_UNKNOWN)
        })
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }
}

/// Starts exports while enforcing the single-flight guard.
#[derive(Debug, Clone, Default)]
pub struct ExportCoordinator {
    in_flight: Arc<AtomicBool>,
}

impl ExportCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether an export is currently running.
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Starts exporting `clients` on a worker thread using the system clock.
    pub fn start(
        &self,
        clients: Vec<Client>,
        target: ExportTarget,
    ) -> Result<ExportHandle, ExportStartError> {
        self.start_with_clock(clients, target, SystemClock)
    }

    /// Starts exporting `clients`; `clock` stamps the file name.
    pub fn start_with_clock<C: Clock + 'static>(
        &self,
        clients: Vec<Client>,
        target: ExportTarget,
        clock: C,
    ) -> Result<ExportHandle, ExportStartError> {
        if self.is_running() {
            return Err(ExportStartError::AlreadyRunning);
        }
        if clients.is_empty() {
            return Err(ExportStartError::EmptySelection);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ExportStartError::AlreadyRunning);
        }

        let guard = InFlightGuard(Arc::clone(&self.in_flight));
        info!(
            "event=export_job module=export status=start clients={}",
            clients.len()
        );

        let spawned = std::thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                let _guard = guard;
                match export_clients_to_spreadsheet(&clients, &target, clock.now()) {
                    Ok(path) => {
                        info!("event=export_job module=export status=ok");
                        ExportOutcome::Succeeded { path }
                    }
                    Err(err) => {
                        warn!("event=export_job module=export status=error error={err}");
                        ExportOutcome::failed(err.to_string())
                    }
                }
            });

        match spawned {
            Ok(worker) => Ok(ExportHandle { worker }),
            Err(err) => {
                // The closure (and its guard) is dropped on spawn failure.
                self.in_flight.store(false, Ordering::Release);
                Err(ExportStartError::Spawn(err))
            }
        }
    }
}

/// Clears the in-flight flag when dropped.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::ExportOutcome;

    #[test]
    fn blank_failure_message_uses_generic_text() {
        assert_eq!(
            ExportOutcome::failed("  "),
            ExportOutcome::Failed {
                message: "unknown error".to_string()
            }
        );
        assert!(!ExportOutcome::failed("disk full").is_success());
    }
}

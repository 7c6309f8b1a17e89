use carelog_core::{Client, Clock, ExportCoordinator, ExportOutcome, ExportStartError, ExportTarget};
use chrono::{NaiveDate, NaiveDateTime};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Mutex;

fn created() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Clock that blocks until the test releases it, keeping the job in flight.
struct GatedClock {
    release: Mutex<Receiver<()>>,
}

impl Clock for GatedClock {
    fn now(&self) -> NaiveDateTime {
        if let Ok(release) = self.release.lock() {
            let _ = release.recv();
        }
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(5, 6, 7)
            .unwrap()
    }
}

#[test]
fn finished_export_reports_written_path() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = ExportCoordinator::new();

    let handle = coordinator
        .start(
            vec![Client::new(0, "A", created())],
            ExportTarget::new(None, dir.path()),
        )
        .unwrap();
    let outcome = handle.wait();

    match outcome {
        ExportOutcome::Succeeded { path } => {
            assert!(path.is_file());
            assert!(path.starts_with(dir.path()));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!coordinator.is_running());
}

#[test]
fn second_start_is_rejected_while_first_is_running() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = ExportCoordinator::new();
    let (release, gate) = channel();

    let handle = coordinator
        .start_with_clock(
            vec![Client::new(0, "A", created())],
            ExportTarget::new(None, dir.path()),
            GatedClock {
                release: Mutex::new(gate),
            },
        )
        .unwrap();

    assert!(coordinator.is_running());
    assert!(!handle.is_finished());
    let rejected = coordinator.clone().start(
        vec![Client::new(1, "B", created())],
        ExportTarget::new(None, dir.path()),
    );
    assert!(matches!(rejected, Err(ExportStartError::AlreadyRunning)));

    release.send(()).unwrap();
    let outcome = handle.wait();
    assert_eq!(
        outcome,
        ExportOutcome::Succeeded {
            path: dir.path().join("care_export_20240304_050607.xlsx")
        }
    );
    assert!(!coordinator.is_running());

    let again = coordinator
        .start(
            vec![Client::new(1, "B", created())],
            ExportTarget::new(None, dir.path().join("again")),
        )
        .unwrap();
    assert!(again.wait().is_success());
}

#[test]
fn empty_selection_is_rejected_before_spawning() {
    let dir = tempfile::tempdir().unwrap();
    let coordinator = ExportCoordinator::new();

    let result = coordinator.start(Vec::new(), ExportTarget::new(None, dir.path()));
    assert!(matches!(result, Err(ExportStartError::EmptySelection)));
    assert!(!coordinator.is_running());
}

#[test]
fn failed_export_surfaces_message_and_clears_flag() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"x").unwrap();
    let coordinator = ExportCoordinator::new();

    let outcome = coordinator
        .start(
            vec![Client::new(0, "A", created())],
            ExportTarget::new(None, blocker.join("sub")),
        )
        .unwrap()
        .wait();

    match outcome {
        ExportOutcome::Failed { message } => assert!(!message.trim().is_empty()),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!coordinator.is_running());
}

use std::cell::{Cell, RefCell};

use kiriko_core::persistence::ProgressPersistence;
use kiriko_core::snapshot::{PersistedPiece, ProgressRecord, ProgressSnapshot};
use kiriko_core::view::ViewTransform;

fn sample_snapshot() -> ProgressSnapshot {
    ProgressSnapshot {
        pieces: vec![PersistedPiece {
            cell_index: 0,
            x: 10.0,
            y: 20.0,
            rotation: 0.0,
            z_index: 0,
            cluster_id: Some(0),
        }],
        clusters: vec![0],
        view: ViewTransform::identity(),
        completed_at: None,
    }
}

#[test]
fn debounce_collapses_bursts_into_one_save() {
    let saves = Cell::new(0u32);
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || Some(sample_snapshot()),
        |_record| {
            saves.set(saves.get() + 1);
            Ok(())
        },
    )
    .with_timing(0, 750, 10_000);

    persistence.notify_change(0);
    persistence.notify_change(100);
    persistence.notify_change(700);
    persistence.tick(1_000);
    assert_eq!(saves.get(), 0);
    assert!(persistence.has_unsaved_changes());

    persistence.tick(1_500);
    assert_eq!(saves.get(), 1);
    assert!(!persistence.has_unsaved_changes());
}

#[test]
fn checkpoint_saves_when_dirty() {
    let saves = Cell::new(0u32);
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || Some(sample_snapshot()),
        |_record| {
            saves.set(saves.get() + 1);
            Ok(())
        },
    )
    .with_timing(0, 750, 1_000);

    persistence.notify_change(100);
    persistence.tick(900);
    assert_eq!(saves.get(), 1);

    // Dirty again right before the checkpoint boundary.
    persistence.notify_change(950);
    persistence.tick(1_000);
    assert_eq!(saves.get(), 2);

    // Clean checkpoints are free.
    persistence.tick(2_000);
    persistence.tick(3_000);
    assert_eq!(saves.get(), 2);
}

#[test]
fn flush_saves_immediately_and_is_idempotent() {
    let records: RefCell<Vec<ProgressRecord>> = RefCell::new(Vec::new());
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || Some(sample_snapshot()),
        |record| {
            records.borrow_mut().push(record.clone());
            Ok(())
        },
    );

    persistence.notify_change(10);
    persistence.flush(20);
    persistence.flush(30);
    let records = records.borrow();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].puzzle_id, "p1");
    assert_eq!(records[0].last_saved_at, 20);
    assert_eq!(records[0].pieces.len(), 1);
}

#[test]
fn failed_saves_stay_dirty_and_retry() {
    let saves = Cell::new(0u32);
    let fail = Cell::new(true);
    let errors = RefCell::new(Vec::new());
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || Some(sample_snapshot()),
        |_record| {
            if fail.get() {
                Err("storage unavailable".to_string())
            } else {
                saves.set(saves.get() + 1);
                Ok(())
            }
        },
    )
    .with_error_handler(|message| errors.borrow_mut().push(message.to_string()));

    persistence.notify_change(0);
    persistence.tick(800);
    assert_eq!(saves.get(), 0);
    assert_eq!(errors.borrow().len(), 1);
    assert!(persistence.has_unsaved_changes());

    // The checkpoint retries once storage recovers.
    fail.set(false);
    persistence.tick(10_000);
    assert_eq!(saves.get(), 1);
    assert!(!persistence.has_unsaved_changes());
}

#[test]
fn missing_snapshot_skips_the_save() {
    let saves = Cell::new(0u32);
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || None,
        |_record: &ProgressRecord| {
            saves.set(saves.get() + 1);
            Ok(())
        },
    );
    persistence.notify_change(0);
    persistence.flush(100);
    assert_eq!(saves.get(), 0);
    assert!(persistence.has_unsaved_changes());
}

#[test]
fn disposed_writer_ignores_everything() {
    let saves = Cell::new(0u32);
    let mut persistence = ProgressPersistence::new(
        "p1",
        0,
        || Some(sample_snapshot()),
        |_record| {
            saves.set(saves.get() + 1);
            Ok(())
        },
    );
    persistence.notify_change(0);
    persistence.dispose();
    persistence.tick(60_000);
    persistence.flush(60_000);
    assert_eq!(saves.get(), 0);
}

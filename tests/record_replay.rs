//! Recording runs and replaying them verbatim across governor instances.
//!
//! Run with: `cargo test --test record_replay`

mod common;

use std::fs;
use std::sync::Arc;

use common::{init_test_logging, run_workers};
use interlock::{Governor, GovernorConfig, RunMode};

#[test]
fn random_run_records_exactly_its_own_order() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");
    let governor = Arc::new(
        Governor::new(
            GovernorConfig::new(RunMode::Random)
                .data_path(&path)
                .seed(0xA11CE),
        )
        .unwrap(),
    );

    let order = run_workers(&governor, 2, 1);
    governor.seal();

    // Both workers ran exactly once.
    assert_eq!(order.len(), 2);
    assert!(order.contains(&0) && order.contains(&1));

    // The journal is derivable from the observed order: first decision
    // chose among two subscribers, the second among the one that remained.
    let first_higher = usize::from(order[0] == 0);
    let expected = format!("{} 2 {}\n{} 1 0\nEND\n", order[0], first_higher, order[1]);
    assert_eq!(fs::read_to_string(&path).unwrap(), expected);
}

#[test]
fn preset_replays_the_recorded_order() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");
    // A completed recording in which thread 1 ran before thread 0.
    fs::write(&path, "1 2 0\n0 1 0\nEND\n").unwrap();

    let governor =
        Arc::new(Governor::new(GovernorConfig::new(RunMode::Preset).data_path(&path)).unwrap());
    let order = run_workers(&governor, 2, 1);
    assert_eq!(order, vec![1, 0]);

    // A recording is good for exactly one run, and replay never writes.
    assert!(!governor.reset(false));
    assert_eq!(fs::read_to_string(&path).unwrap(), "1 2 0\n0 1 0\nEND\n");
}

#[test]
fn replay_selects_identically_to_the_recording_run() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");

    let recorded = {
        let governor = Arc::new(
            Governor::new(GovernorConfig::new(RunMode::Random).data_path(&path)).unwrap(),
        );
        run_workers(&governor, 3, 2)
        // Dropping the governor seals the journal.
    };
    assert_eq!(recorded.len(), 6);

    let replayed = {
        let governor = Arc::new(
            Governor::new(GovernorConfig::new(RunMode::Preset).data_path(&path)).unwrap(),
        );
        run_workers(&governor, 3, 2)
    };
    assert_eq!(replayed, recorded);
}

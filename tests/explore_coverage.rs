//! Depth-first exploration across runs.
//!
//! Run with: `cargo test --test explore_coverage`

mod common;

use std::collections::HashSet;
use std::fs;
use std::sync::Arc;

use common::{init_test_logging, run_workers};
use interlock::{Governor, GovernorConfig, RunMode};

#[test]
fn explore_enumerates_every_interleaving_then_stops() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");
    let governor =
        Arc::new(Governor::new(GovernorConfig::new(RunMode::Explore).data_path(&path)).unwrap());

    let mut seen = HashSet::new();
    let mut runs = 0;
    loop {
        let order = run_workers(&governor, 2, 2);
        assert_eq!(order.len(), 4);
        seen.insert(order);
        runs += 1;
        assert!(runs <= 16, "exploration failed to converge");
        if !governor.reset(false) {
            break;
        }
    }

    // Two workers with two control points each: every order-preserving
    // merge of [0, 0] and [1, 1] must have executed.
    let expected: HashSet<Vec<usize>> = [
        vec![0, 0, 1, 1],
        vec![0, 1, 0, 1],
        vec![0, 1, 1, 0],
        vec![1, 0, 0, 1],
        vec![1, 0, 1, 0],
        vec![1, 1, 0, 0],
    ]
    .into_iter()
    .collect();
    assert_eq!(seen, expected);
    // One run per interleaving: the search never repeats a sequence.
    assert_eq!(runs, 6);
}

#[test]
fn unfinished_recording_is_reattempted_verbatim() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");
    // Footprint of a run that died after two decisions: no sentinel.
    fs::write(&path, "1 2 0\n0 1 0\n").unwrap();

    let governor =
        Arc::new(Governor::new(GovernorConfig::new(RunMode::Explore).data_path(&path)).unwrap());
    let order = run_workers(&governor, 2, 1);
    // The interrupted prefix replays unchanged.
    assert_eq!(order, vec![1, 0]);

    governor.seal();
    assert_eq!(fs::read_to_string(&path).unwrap(), "1 2 0\n0 1 0\nEND\n");

    // That prefix had no alternatives left, so completing it finished the
    // search.
    assert!(!governor.reset(false));
}

#[test]
fn explore_resumes_the_frontier_across_instances() {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gov.data");

    // First instance takes the leftmost interleaving and terminates
    // cleanly.
    let first = {
        let governor = Arc::new(
            Governor::new(GovernorConfig::new(RunMode::Explore).data_path(&path)).unwrap(),
        );
        run_workers(&governor, 2, 1)
    };
    assert_eq!(first, vec![0, 1]);

    // A fresh instance (a new process, as far as the journal can tell)
    // picks up the next branch instead of repeating the first.
    let second = {
        let governor = Arc::new(
            Governor::new(GovernorConfig::new(RunMode::Explore).data_path(&path)).unwrap(),
        );
        run_workers(&governor, 2, 1)
    };
    assert_eq!(second, vec![1, 0]);
}

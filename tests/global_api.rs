//! Smoke test for the process-wide surface.
//!
//! Kept in its own test binary: the instance latches the working directory,
//! `GOV_MODE`, and `GOV_SEED` at first use, so nothing else in this process
//! may touch them.
//!
//! Run with: `cargo test --test global_api`

use std::env;
use std::fs;

use interlock::global;

#[test]
fn singleton_round_trip_in_random_mode() {
    let dir = tempfile::tempdir().unwrap();
    env::set_current_dir(dir.path()).unwrap();
    env::set_var("GOV_MODE", "RAND");
    env::set_var("GOV_SEED", "7");

    // One announced subscriber: the test thread itself.
    global::prepare(1);
    global::subscribe(0);
    global::control_point();
    global::control_point();
    global::unsubscribe();

    let data = dir.path().join("gov.data");
    assert_eq!(fs::read_to_string(&data).unwrap(), "0 1 0\n0 1 0\n");

    // Advancing to the next run truncates the journal for rewriting.
    assert!(global::reset(false));
    assert_eq!(fs::read_to_string(&data).unwrap(), "");

    global::prepare(1);
    global::subscribe(0);
    global::control_point();
    global::unsubscribe();
    global::governor().seal();
    assert_eq!(fs::read_to_string(&data).unwrap(), "0 1 0\nEND\n");

    // Misuse after the announced count is consumed is refused, not fatal.
    global::subscribe(1);
    global::unsubscribe();

    env::remove_var("GOV_MODE");
    env::remove_var("GOV_SEED");
}

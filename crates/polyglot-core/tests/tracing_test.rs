//! Tests for the polyglot tracing setup.

use std::sync::Mutex;

use polyglot_core::tracing::init_tracing;

static TRACING_MUTEX: Mutex<()> = Mutex::new(());

#[test]
fn test_init_with_per_subsystem_filter() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var(
        "POLYGLOT_LOG",
        "polyglot_analysis::normalizers=debug,polyglot_analysis::parsers=warn",
    );
    init_tracing();
    std::env::remove_var("POLYGLOT_LOG");
}

#[test]
fn test_init_tracing_idempotent() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    init_tracing();
    init_tracing();
    init_tracing();
}

#[test]
fn test_invalid_filter_falls_back() {
    let _lock = TRACING_MUTEX.lock().unwrap();
    std::env::set_var("POLYGLOT_LOG", "this_is=garbage=not=a=filter");
    init_tracing();
    std::env::remove_var("POLYGLOT_LOG");
}

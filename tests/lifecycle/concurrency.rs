//! Concurrent activation against a shared file-backed database

#[path = "../common/mod.rs"]
mod common;

use std::sync::{Arc, Barrier};
use std::thread;

use common::*;

#[test]
fn test_parallel_activations_never_oversubscribe() {
    const WORKERS: usize = 8;

    let (state, _dir) = create_file_app_state(WORKERS as u32);
    let fx = Arc::new(setup_fixture_with(state));
    let license = fx.create_license(1);

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let fx = Arc::clone(&fx);
            let barrier = Arc::clone(&barrier);
            let code = license.code.clone();
            thread::spawn(move || {
                barrier.wait();
                fx.activate(&user_caller(OWNER_EMAIL), &code, "AA:20", &format!("worker-{i}"))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one activation should win the last slot");
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(
            matches!(result, Err(AppError::InvalidState(_))),
            "losers should see a business refusal, got {:?}",
            result
        );
    }

    let stored = fx.license(&license.id);
    assert_eq!(stored.device_count, 0, "device_count must never go negative");
    assert_eq!(fx.binding_count(&license.id), 1);
    assert_eq!(fx.device_count(), 1, "refused activations leave no devices behind");
}

#[test]
fn test_parallel_activations_fill_capacity_exactly() {
    const WORKERS: usize = 6;
    const SLOTS: i32 = 3;

    let (state, _dir) = create_file_app_state(WORKERS as u32);
    let fx = Arc::new(setup_fixture_with(state));
    let license = fx.create_license(SLOTS);

    let barrier = Arc::new(Barrier::new(WORKERS));
    let handles: Vec<_> = (0..WORKERS)
        .map(|i| {
            let fx = Arc::clone(&fx);
            let barrier = Arc::clone(&barrier);
            let code = license.code.clone();
            thread::spawn(move || {
                barrier.wait();
                fx.activate(&user_caller(OWNER_EMAIL), &code, "AA:30", &format!("worker-{i}"))
                    .is_ok()
            })
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, SLOTS as usize);
    assert_eq!(fx.license(&license.id).device_count, 0);
    assert_eq!(fx.binding_count(&license.id), i64::from(SLOTS));
}

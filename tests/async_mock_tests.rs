//! End-to-end tests for callback mocks and deferred assertions.

use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use testkit_deferred::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

#[test]
fn async_assert_equals_accepts_exact_arguments() {
    init_tracing();
    let control = MockControl::new();
    let async_mock = AsyncMockControl::new(&control);

    let cases = [
        (0, String::new(), vec![]),
        (1, "a".to_string(), vec![1.5]),
        (-7, "long value".to_string(), vec![0.0, -0.5, 3.25]),
    ];
    for args in cases {
        let check = async_mock.async_assert_equals("exact args", args.clone());
        check(args);
    }

    control.verify_all().unwrap();
    assert_eq!(control.mock_count(), 3);
}

#[test]
fn async_assert_equals_rejects_any_difference() {
    let expected = (1, "a".to_string(), vec![1.5]);
    let variants = [
        (2, "a".to_string(), vec![1.5]),
        (1, "b".to_string(), vec![1.5]),
        (1, "a".to_string(), vec![]),
        (1, "a".to_string(), vec![1.5, 1.5]),
    ];

    for actual in variants {
        let control = MockControl::new();
        let check =
            AsyncMockControl::new(&control).async_assert_equals("differs", expected.clone());
        let outcome = std::panic::catch_unwind(AssertUnwindSafe(move || check(actual)));
        assert!(outcome.is_err());
    }
}

#[test]
fn callback_mock_forwards_arguments_unchanged() {
    let control = MockControl::new();
    let received = Arc::new(parking_lot::Mutex::new(None));

    let sink = Arc::clone(&received);
    let callback = AsyncMockControl::new(&control).create_callback_mock(
        "forward",
        move |args: (Vec<String>, Option<u32>)| {
            *sink.lock() = Some(args);
        },
    );

    let args = (vec!["x".to_string(), "y".to_string()], Some(3));
    callback(args.clone());

    assert_eq!(*received.lock(), Some(args));
    control.verify_all().unwrap();
}

#[test]
fn callback_mock_used_as_deferred_continuation() {
    let control = MockControl::new();
    let deferred = Deferred::<u32, String>::new();
    let total = Arc::new(AtomicUsize::new(0));

    let sum = Arc::clone(&total);
    deferred.add_callback(AsyncMockControl::new(&control).create_callback_mock(
        "on_value",
        move |n: u32| {
            sum.fetch_add(n as usize, Ordering::SeqCst);
        },
    ));

    assert!(control.verify_all().is_err());
    deferred.resolve(12).unwrap();
    assert_eq!(total.load(Ordering::SeqCst), 12);
    control.verify_all().unwrap();
}

#[test]
fn assert_deferred_equals_usage_error_without_deferred() {
    let control = MockControl::new();
    let err = AsyncMockControl::new(&control)
        .assert_deferred_equals(
            "no deferred",
            DeferredOr::<_, Deferred<&str, ()>>::value("x"),
            DeferredOr::value("x"),
        )
        .unwrap_err();

    assert!(matches!(err, Error::Usage(_)));
    control.verify_all().unwrap();
}

#[test]
fn assert_deferred_equals_literal_against_resolved_deferred() {
    let control = MockControl::new();
    let resolved = Deferred::<i64, ()>::succeeded(99);

    AsyncMockControl::new(&control)
        .assert_deferred_equals("resolved", DeferredOr::value(99), &resolved)
        .unwrap();

    control.verify_all().unwrap();
}

#[test]
#[should_panic(expected = "assertion failed: resolved\n  expected: 99\n  actual: 98")]
fn assert_deferred_equals_literal_against_different_value() {
    let control = MockControl::new();
    let resolved = Deferred::<i64, ()>::succeeded(98);

    AsyncMockControl::new(&control)
        .assert_deferred_equals("resolved", DeferredOr::value(99), &resolved)
        .unwrap();
}

#[test]
fn assert_deferred_equals_two_deferreds_with_same_value() {
    init_tracing();
    let control = MockControl::new();
    let d1 = Deferred::<&'static str, ()>::new();
    let d2 = Deferred::<&'static str, ()>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("eq", &d1, &d2)
        .unwrap();
    assert!(control.verify_all().is_err());

    d1.resolve("x").unwrap();
    assert!(control.verify_all().is_err());

    d2.resolve("x").unwrap();
    control.verify_all().unwrap();
    assert_eq!(control.mock_count(), 2);
}

#[test]
fn assert_deferred_equals_two_deferreds_resolved_in_reverse_order() {
    let control = MockControl::new();
    let d1 = Deferred::<&'static str, ()>::new();
    let d2 = Deferred::<&'static str, ()>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("eq", &d1, &d2)
        .unwrap();

    d2.resolve("x").unwrap();
    d1.resolve("x").unwrap();
    control.verify_all().unwrap();
}

#[test]
#[should_panic(expected = "assertion failed: eq")]
fn assert_deferred_equals_two_deferreds_with_different_values() {
    let control = MockControl::new();
    let d1 = Deferred::<&'static str, ()>::new();
    let d2 = Deferred::<&'static str, ()>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("eq", &d1, &d2)
        .unwrap();

    d1.resolve("x").unwrap();
    d2.resolve("y").unwrap();
}

#[test]
fn assert_deferred_equals_expected_never_resolving_fails_verify() {
    let control = MockControl::new();
    let d1 = Deferred::<&'static str, ()>::new();
    let d2 = Deferred::<&'static str, ()>::succeeded("x");

    AsyncMockControl::new(&control)
        .assert_deferred_equals("eq", &d1, &d2)
        .unwrap();

    let err = control.verify_all().unwrap_err();
    assert_eq!(err.failures().len(), 1);
    assert!(err.to_string().contains("assert_deferred_equals"));
}

#[test]
fn assert_deferred_equals_rejected_expected_fails_verify() {
    let control = MockControl::new();
    let d1 = Deferred::<&'static str, String>::new();
    let d2 = Deferred::<&'static str, String>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("eq", &d1, &d2)
        .unwrap();

    d1.reject("lookup failed".to_string()).unwrap();
    d2.resolve("x").unwrap();

    let err = control.verify_all().unwrap_err();
    assert_eq!(
        err.failures(),
        vec![&Error::UnmetExpectation {
            mock: "assert_deferred_equals".to_string(),
            expected: Times::once(),
            actual: 0,
        }]
    );
}

#[test]
fn assert_deferred_error_passes_when_trigger_fails_deferred() {
    let control = MockControl::new();
    let deferred = Deferred::<String, String>::new();

    let target = deferred.clone();
    AsyncMockControl::new(&control).assert_deferred_error(&deferred, move || {
        target.reject("connection reset".to_string()).unwrap();
    });

    control.verify_all().unwrap();
}

#[test]
fn assert_deferred_error_fails_verify_when_trigger_succeeds() {
    let control = MockControl::new();
    let deferred = Deferred::<String, String>::new();

    let target = deferred.clone();
    AsyncMockControl::new(&control).assert_deferred_error(&deferred, move || {
        target.resolve("fine".to_string()).unwrap();
    });

    let err = control.verify_all().unwrap_err();
    assert!(err
        .to_string()
        .contains("Expected assert_deferred_error to be called exactly 1 time(s)"));
}

#[test]
fn reset_all_discards_pending_callbacks() {
    let control = MockControl::new();
    let _pending = AsyncMockControl::new(&control).async_assert_equals("unused", 1);
    assert!(control.verify_all().is_err());

    control.reset_all();
    control.verify_all().unwrap();
}

#[tokio::test]
async fn deferred_resolved_by_task_satisfies_assertion() {
    let control = MockControl::new();
    let d1 = Deferred::<u64, String>::new();
    let d2 = Deferred::<u64, String>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("from tasks", &d1, &d2)
        .unwrap();

    let (r1, r2) = (d1.clone(), d2.clone());
    let first = tokio::spawn(async move { r1.resolve(7).unwrap() });
    let second = tokio::spawn(async move { r2.resolve(7).unwrap() });
    first.await.unwrap();
    second.await.unwrap();

    assert_eq!(d2.wait().await, Ok(7));
    control.verify_all().unwrap();
}

#[tokio::test]
async fn waiter_is_woken_when_comparison_panics() {
    let control = MockControl::new();
    let deferred = Deferred::<i32, ()>::new();

    AsyncMockControl::new(&control)
        .assert_deferred_equals("value", DeferredOr::value(1), &deferred)
        .unwrap();

    let waiter = tokio::spawn(deferred.wait());
    tokio::task::yield_now().await;

    let resolver = deferred.clone();
    let resolved = tokio::spawn(async move { resolver.resolve(2) }).await;
    assert!(resolved.unwrap_err().is_panic());

    let outcome = tokio::time::timeout(Duration::from_secs(2), waiter)
        .await
        .expect("waiter was not woken");
    assert_eq!(outcome.unwrap(), Ok(2));
}

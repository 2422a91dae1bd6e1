//! Integration tests for resources managed by an App lifecycle

use mooring::testing::{MockResource, RecordingObserver};
use mooring::{
    App, AppState, BoxError, Context, Hook, Lifecycle, LifecycleConfig, LifecycleError,
    ManagedResource, ResourceError, ResourceState, RetryPolicy,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_default_policy_rides_out_four_failed_probes() {
    let mut app = App::new();
    let observer = RecordingObserver::new();
    let owner = ManagedResource::<MockResource>::open("mock://primary?fail=4&release_error=1")
        .unwrap()
        .with_observer(observer.clone())
        .register(&mut app);
    let start = Instant::now();

    app.start(&Context::background()).await.unwrap();

    assert_eq!(owner.state(), ResourceState::Active);
    assert_eq!(owner.handle().probe_count(), 5);
    assert_eq!(observer.attempts(), vec![1, 2, 3, 4]);
    assert_eq!(start.elapsed(), Duration::from_secs(12));

    // Release errors are swallowed, so stop still succeeds.
    app.stop(&Context::background()).await.unwrap();
    assert_eq!(owner.handle().release_count(), 1);
    assert_eq!(owner.state(), ResourceState::Released);
    assert_eq!(app.state(), AppState::Stopped);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_probes_fail_start() {
    let mut app = App::new();
    let owner = ManagedResource::<MockResource>::open("mock://primary?fail=100")
        .unwrap()
        .register(&mut app);

    let err = app.start(&Context::background()).await.unwrap_err();

    match &err {
        LifecycleError::Start { hook, source, .. } => {
            assert_eq!(hook, "mock");
            assert!(source.to_string().contains("connection refused (probe 5)"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(owner.handle().probe_count(), 5);
    assert_eq!(owner.state(), ResourceState::ActivationFailed);
    assert_eq!(app.state(), AppState::Failed);
}

#[tokio::test]
async fn test_bad_configuration_registers_nothing() {
    let mut app = App::new();

    let err = ManagedResource::<MockResource>::provide(&mut app, "postgres://primary").unwrap_err();

    assert!(matches!(err, ResourceError::Configuration { resource: "mock", .. }));
    assert!(err.is_construction_phase());
    assert_eq!(app.pending_hooks(), 0);

    app.start(&Context::background()).await.unwrap();
    assert_eq!(app.state(), AppState::Started);
}

#[tokio::test]
async fn test_construction_failure_registers_nothing() {
    let mut app = App::new();

    let err =
        ManagedResource::<MockResource>::provide(&mut app, "mock://primary?construct_error=1")
            .unwrap_err();

    assert_eq!(err.to_string(), "mock: init: cannot allocate pool for primary");
    assert_eq!(app.pending_hooks(), 0);
}

#[tokio::test]
async fn test_later_failure_releases_earlier_resources() {
    let mut app = App::new();
    let fast = RetryPolicy::new(2, Duration::ZERO);

    let first = ManagedResource::<MockResource>::open("mock://first")
        .unwrap()
        .with_policy(fast)
        .register(&mut app);
    let second = ManagedResource::<MockResource>::open("mock://second?fail=9")
        .unwrap()
        .with_policy(fast)
        .register(&mut app);

    let err = app.start(&Context::background()).await.unwrap_err();

    assert_eq!(err.failed_hook(), Some("mock"));
    assert_eq!(first.state(), ResourceState::Released);
    assert_eq!(first.handle().release_count(), 1);
    // The failing hook never started, so its OnStop is not run.
    assert_eq!(second.handle().release_count(), 0);
    assert_eq!(second.handle().probe_count(), 2);
}

#[tokio::test]
async fn test_resources_interleave_with_plain_hooks() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let mut app = App::new();

    let before = journal.clone();
    app.append(Hook::new("config").on_start(move |_ctx| async move {
        before.lock().unwrap().push("config");
        Ok::<_, BoxError>(())
    }));

    let pool = ManagedResource::<MockResource>::provide(&mut app, "mock://primary").unwrap();

    let after = journal.clone();
    let seen = pool.clone();
    app.append(Hook::new("server").on_start(move |_ctx| async move {
        // Hooks registered after the resource see it already activated.
        assert_eq!(seen.probe_count(), 1);
        after.lock().unwrap().push("server");
        Ok::<_, BoxError>(())
    }));

    app.start(&Context::background()).await.unwrap();
    assert_eq!(*journal.lock().unwrap(), vec!["config", "server"]);
}

#[tokio::test(start_paused = true)]
async fn test_start_timeout_cuts_activation_short() {
    let mut app = App::with_config(
        LifecycleConfig::default().with_start_timeout(Duration::from_secs(5)),
    );
    let owner = ManagedResource::<MockResource>::open("mock://primary?fail=100")
        .unwrap()
        .register(&mut app);
    let start = Instant::now();

    let err = app.start(&Context::background()).await.unwrap_err();

    assert!(err.to_string().contains("context deadline exceeded"));
    assert_eq!(start.elapsed(), Duration::from_secs(5));
    // Probes at 0s and 3s; the hook is dropped during the second delay.
    assert_eq!(owner.handle().probe_count(), 2);
    assert_eq!(owner.state(), ResourceState::Activating);
}

#[tokio::test]
async fn test_run_until_stops_after_shutdown() {
    let mut app = App::new();
    let pool = ManagedResource::<MockResource>::provide(&mut app, "mock://primary").unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let runner = tokio::spawn(app.run_until(async move {
        let _ = rx.await;
    }));

    tx.send(()).unwrap();
    runner.await.unwrap().unwrap();

    assert_eq!(pool.probe_count(), 1);
    assert_eq!(pool.release_count(), 1);
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower_query::retry::{RetryLayer, RetrySettings};

#[test]
fn empty_settings_use_defaults() {
    let settings: RetrySettings = serde_json::from_str("{}").unwrap();

    assert_eq!(settings, RetrySettings::default());
    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.delay(), Duration::from_secs(2));
    assert_eq!(settings.deadline(), None);
}

#[test]
fn partial_settings_keep_remaining_defaults() {
    let settings: RetrySettings = serde_json::from_str(r#"{ "delay_ms": 100 }"#).unwrap();

    assert_eq!(settings.max_attempts, 3);
    assert_eq!(settings.delay(), Duration::from_millis(100));
}

#[test]
fn settings_round_trip_through_json() {
    let settings = RetrySettings {
        max_attempts: 5,
        delay_ms: 250,
        deadline_ms: Some(2_000),
    };

    let json = serde_json::to_value(&settings).unwrap();
    assert_eq!(
        json,
        serde_json::json!({ "max_attempts": 5, "delay_ms": 250, "deadline_ms": 2000 })
    );
}

#[tokio::test(start_paused = true)]
async fn layer_built_from_settings() {
    let settings: RetrySettings =
        serde_json::from_str(r#"{ "max_attempts": 4, "delay_ms": 500 }"#).unwrap();
    let retry = RetryLayer::<String>::builder().settings(&settings).build();
    let calls = Arc::new(AtomicUsize::new(0));

    let start = tokio::time::Instant::now();
    let result = retry
        .run(|| {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err::<(), _>(format!("failure {}", n)) }
        })
        .await;

    assert_eq!(retry.max_attempts(), 4);
    assert_eq!(result, Err("failure 4".to_string()));
    assert_eq!(start.elapsed(), Duration::from_millis(1500));
}

#[tokio::test(start_paused = true)]
async fn settings_deadline_limits_attempts() {
    let settings = RetrySettings {
        max_attempts: 10,
        delay_ms: 1_000,
        deadline_ms: Some(2_500),
    };
    let deadline_hits = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&deadline_hits);
    let retry = RetryLayer::<String>::builder()
        .settings(&settings)
        .on_deadline_exceeded(move |_| {
            d.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    let calls = AtomicUsize::new(0);

    let result = retry
        .run(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>("database is locked".to_string()) }
        })
        .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(deadline_hits.load(Ordering::SeqCst), 1);
}

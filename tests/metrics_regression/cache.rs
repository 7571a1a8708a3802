//! Cache metrics regression tests

use super::helpers::*;
use serial_test::serial;
use tower::{Layer, ServiceExt};
use tower_query::cache::{CacheLayer, QueryCache};

#[tokio::test]
#[serial]
async fn cache_metrics_exist() {
    init_recorder();

    let cache: QueryCache<u64, &'static str> = QueryCache::builder().name("test_cache").build();
    let service = CacheLayer::new(cache, |req: &u64| *req)
        .layer(tower::service_fn(|_: u64| async { Ok::<_, &'static str>("rows") }));

    // First call - cache miss
    let _ = service.clone().oneshot(1).await;

    // Second call with same key - cache hit
    let _ = service.oneshot(1).await;

    assert_counter_exists("cache_requests_total");
    assert_metric_has_label("cache_requests_total", "cache", "test_cache");
    assert_metric_has_label("cache_requests_total", "result", "hit");
    assert_metric_has_label("cache_requests_total", "result", "miss");

    assert_gauge_exists("cache_size");
    assert_metric_has_label("cache_size", "cache", "test_cache");
}

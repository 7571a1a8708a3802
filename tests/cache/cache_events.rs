use std::sync::{Arc, Mutex};
use tower::{Layer, ServiceExt};
use tower_query::cache::{CacheLayer, QueryCache};

#[tokio::test]
async fn hit_miss_and_not_stored_callbacks() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (h, m, n) = (Arc::clone(&seen), Arc::clone(&seen), Arc::clone(&seen));

    let cache: QueryCache<String, String> = QueryCache::builder()
        .name("users")
        .on_hit(move |key| h.lock().unwrap().push(format!("hit {key}")))
        .on_miss(move |key| m.lock().unwrap().push(format!("miss {key}")))
        .on_not_stored(move |key| n.lock().unwrap().push(format!("not stored {key}")))
        .build();

    let service = CacheLayer::new(cache, |q: &String| q.clone()).layer(tower::service_fn(
        |q: String| async move {
            if q.contains("orders") {
                Err("no such table: orders".to_string())
            } else {
                Ok(q)
            }
        },
    ));

    service.clone().oneshot("users".to_string()).await.unwrap();
    service.clone().oneshot("users".to_string()).await.unwrap();
    service.oneshot("orders".to_string()).await.unwrap_err();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            "miss users",
            "hit users",
            "miss orders",
            "not stored orders",
        ]
    );
}

#[tokio::test]
async fn panicking_callback_does_not_break_the_cache() {
    let cache: QueryCache<String, String> = QueryCache::builder()
        .on_miss(|_| panic!("listener failure"))
        .build();

    let service = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(tower::service_fn(|q: String| async move { Ok::<_, String>(q) }));

    assert_eq!(service.oneshot("users".to_string()).await.unwrap(), "users");
    assert_eq!(cache.len(), 1);
}

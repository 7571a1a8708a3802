use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tower::{Layer, ServiceExt};
use tower_query::cache::{CacheLayer, QueryCache};

#[derive(Clone, Debug)]
struct UserQuery {
    tenant: &'static str,
    sql: &'static str,
}

#[tokio::test]
async fn keys_are_matched_verbatim() {
    let computes = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&computes);
    let cache: QueryCache<String, usize> = QueryCache::new();

    let service = CacheLayer::new(cache.clone(), |q: &String| q.clone()).layer(
        tower::service_fn(move |_: String| {
            let n = c.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, String>(n) }
        }),
    );

    service.clone().oneshot("SELECT 1".to_string()).await.unwrap();
    service.clone().oneshot("SELECT  1".to_string()).await.unwrap();
    service.clone().oneshot("select 1".to_string()).await.unwrap();
    service.oneshot("SELECT 1".to_string()).await.unwrap();

    assert_eq!(computes.load(Ordering::SeqCst), 3);
    assert_eq!(cache.len(), 3);
}

#[tokio::test]
async fn key_from_request_fields() {
    let cache: QueryCache<String, String> = QueryCache::new();
    let service = CacheLayer::new(cache.clone(), |q: &UserQuery| {
        format!("{}:{}", q.tenant, q.sql)
    })
    .layer(tower::service_fn(|q: UserQuery| async move {
        Ok::<_, String>(format!("rows of {}", q.tenant))
    }));

    let acme = UserQuery {
        tenant: "acme",
        sql: "SELECT * FROM users",
    };
    let globex = UserQuery {
        tenant: "globex",
        sql: "SELECT * FROM users",
    };

    assert_eq!(service.clone().oneshot(acme).await.unwrap(), "rows of acme");
    assert_eq!(service.oneshot(globex).await.unwrap(), "rows of globex");
    assert!(cache.contains_key(&"acme:SELECT * FROM users".to_string()));
    assert!(cache.contains_key(&"globex:SELECT * FROM users".to_string()));
}

#[tokio::test]
async fn warmed_entries_skip_the_service() {
    let cache: QueryCache<u64, String> = QueryCache::new();
    cache.insert(42, "warmed".to_string());

    let service = CacheLayer::new(cache.clone(), |id: &u64| *id).layer(tower::service_fn(
        |_: u64| async move { Err::<String, _>("service should not run".to_string()) },
    ));

    assert_eq!(service.oneshot(42).await.unwrap(), "warmed");
}

#[tokio::test]
async fn layers_sharing_a_cache_see_each_others_entries() {
    let cache: QueryCache<String, usize> = QueryCache::new();

    let writer = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(tower::service_fn(|q: String| async move { Ok::<_, String>(q.len()) }));
    let reader = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(tower::service_fn(|_: String| async move { Ok::<_, String>(0) }));

    assert_eq!(writer.oneshot("SELECT 1".to_string()).await.unwrap(), 8);
    assert_eq!(reader.oneshot("SELECT 1".to_string()).await.unwrap(), 8);
}

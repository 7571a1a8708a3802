use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tower::util::BoxCloneService;
use tower::{Layer, ServiceExt};
use tower_query::cache::{CacheLayer, QueryCache};

fn slow_query(computes: Arc<AtomicUsize>) -> BoxCloneService<String, Arc<String>, String> {
    BoxCloneService::new(tower::service_fn(move |query: String| {
        let computes = Arc::clone(&computes);
        async move {
            computes.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            Ok(Arc::new(format!("rows for {}", query)))
        }
    }))
}

#[tokio::test]
async fn concurrent_misses_without_single_flight_all_compute() {
    let computes = Arc::new(AtomicUsize::new(0));
    let cache: QueryCache<String, Arc<String>> = QueryCache::new();
    let service = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(slow_query(Arc::clone(&computes)));

    let mut handles = vec![];
    for _ in 0..5 {
        let svc = service.clone();
        handles.push(tokio::spawn(async move {
            svc.oneshot("SELECT * FROM users".to_string()).await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(computes.load(Ordering::SeqCst), 5);
    assert_eq!(cache.len(), 1);
}

#[tokio::test]
async fn single_flight_computes_once() {
    let computes = Arc::new(AtomicUsize::new(0));
    let cache: QueryCache<String, Arc<String>> = QueryCache::builder().single_flight(true).build();
    let service = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(slow_query(Arc::clone(&computes)));

    let mut handles = vec![];
    for _ in 0..20 {
        let svc = service.clone();
        handles.push(tokio::spawn(async move {
            svc.oneshot("SELECT * FROM users".to_string()).await
        }));
    }

    let mut results = vec![];
    for handle in handles {
        results.push(handle.await.unwrap().unwrap());
    }

    assert_eq!(computes.load(Ordering::SeqCst), 1);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
}

#[tokio::test]
async fn single_flight_keys_do_not_block_each_other() {
    let computes = Arc::new(AtomicUsize::new(0));
    let cache: QueryCache<String, Arc<String>> = QueryCache::builder().single_flight(true).build();
    let service = CacheLayer::new(cache.clone(), |q: &String| q.clone())
        .layer(slow_query(Arc::clone(&computes)));

    let (a, b) = tokio::join!(
        service.clone().oneshot("SELECT 1".to_string()),
        service.clone().oneshot("SELECT 2".to_string())
    );

    assert_eq!(*a.unwrap(), "rows for SELECT 1");
    assert_eq!(*b.unwrap(), "rows for SELECT 2");
    assert_eq!(computes.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn single_flight_waiter_computes_after_failure() {
    let cache: QueryCache<String, u32> = QueryCache::builder().single_flight(true).build();
    let attempts = Arc::new(AtomicUsize::new(0));

    let first = {
        let cache = cache.clone();
        let attempts = Arc::clone(&attempts);
        async move {
            cache
                .get_or_compute("k".to_string(), || async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err::<u32, String>("database is locked".to_string())
                })
                .await
        }
    };
    let second = {
        let cache = cache.clone();
        let attempts = Arc::clone(&attempts);
        async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            cache
                .get_or_compute("k".to_string(), || async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Ok::<u32, String>(7)
                })
                .await
        }
    };

    let (first, second) = tokio::join!(first, second);

    assert_eq!(first, Err("database is locked".to_string()));
    assert_eq!(second, Ok(7));
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    assert_eq!(cache.get(&"k".to_string()), Some(7));
}

#[tokio::test]
async fn single_flight_survives_cancelled_leader() {
    let cache: QueryCache<String, u32> = QueryCache::builder().single_flight(true).build();

    let leader = {
        let cache = cache.clone();
        tokio::spawn(async move {
            cache
                .get_or_compute("k".to_string(), || async {
                    tokio::time::sleep(Duration::from_secs(60)).await;
                    Ok::<u32, String>(1)
                })
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    leader.abort();

    let value = tokio::time::timeout(
        Duration::from_secs(1),
        cache.get_or_compute("k".to_string(), || async { Ok::<u32, String>(2) }),
    )
    .await
    .expect("waiter should not hang after the leader is cancelled");

    assert_eq!(value, Ok(2));
}

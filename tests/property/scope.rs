//! Property tests for the resource scope.
//!
//! Invariants tested:
//! - Every acquired handle is released exactly once
//! - The operation runs only when acquisition succeeds
//! - The operation's outcome is returned unchanged

use proptest::prelude::*;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::runtime::Runtime;
use tower::{Layer, ServiceExt};
use tower_query::scope::{resource_fn, ScopeError, ScopeLayer, Scoped};

#[derive(Debug, Clone)]
enum Outcome {
    AcquireFails,
    OperationFails,
    Succeeds,
}

fn outcome() -> impl Strategy<Value = Outcome> {
    prop_oneof![
        Just(Outcome::AcquireFails),
        Just(Outcome::OperationFails),
        Just(Outcome::Succeeds),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Property: acquisitions and releases always balance
    #[test]
    fn acquire_and_release_balance(outcomes in prop::collection::vec(outcome(), 1..30)) {
        let rt = Runtime::new().unwrap();
        rt.block_on(async {
            let acquired = Arc::new(AtomicUsize::new(0));
            let released = Arc::new(AtomicUsize::new(0));
            let ran = Arc::new(AtomicUsize::new(0));
            let refuse = Arc::new(AtomicBool::new(false));
            let (a, r, o) = (Arc::clone(&acquired), Arc::clone(&released), Arc::clone(&ran));
            let f = Arc::clone(&refuse);

            let scope = ScopeLayer::new(resource_fn(
                move || {
                    let a = Arc::clone(&a);
                    let refused = f.load(Ordering::SeqCst);
                    async move {
                        if refused {
                            return Err("connection refused".to_string());
                        }
                        a.fetch_add(1, Ordering::SeqCst);
                        Ok(())
                    }
                },
                move |_: &()| {
                    r.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            ));
            let service = scope.layer(tower::service_fn(move |scoped: Scoped<(), Outcome>| {
                o.fetch_add(1, Ordering::SeqCst);
                async move {
                    match scoped.request() {
                        Outcome::OperationFails => Err("query failed".to_string()),
                        _ => Ok(()),
                    }
                }
            }));

            for outcome in &outcomes {
                refuse.store(matches!(outcome, Outcome::AcquireFails), Ordering::SeqCst);
                let result = service.clone().oneshot(outcome.clone()).await;
                match outcome {
                    Outcome::Succeeds => prop_assert!(result.is_ok()),
                    Outcome::OperationFails => {
                        prop_assert!(matches!(result, Err(ScopeError::Operation(_))))
                    }
                    Outcome::AcquireFails => {
                        prop_assert!(matches!(result, Err(ScopeError::Acquire(_))))
                    }
                }
            }

            let opened = outcomes
                .iter()
                .filter(|o| !matches!(o, Outcome::AcquireFails))
                .count();
            prop_assert_eq!(acquired.load(Ordering::SeqCst), opened);
            prop_assert_eq!(released.load(Ordering::SeqCst), opened);
            prop_assert_eq!(ran.load(Ordering::SeqCst), opened);

            Ok(())
        })?;
    }
}

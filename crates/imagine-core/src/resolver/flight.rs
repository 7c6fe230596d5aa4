//! Collapsing of concurrent computations for the same cache key.
//!
//! The first request for a key spawns the computation and records a shared
//! handle to it; requests arriving while it runs await the same handle and
//! receive a clone of its result. The spawned task removes its own entry
//! when it finishes, so a failure is never cached and the next request
//! starts over. Because the work runs on its own task, a caller that goes
//! away does not cancel it for the others.

use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::{ResolveError, ResolveResult};

type SharedResult = Shared<BoxFuture<'static, ResolveResult<String>>>;

#[derive(Clone, Default)]
pub(crate) struct InFlight {
    pending: Arc<Mutex<HashMap<String, (u64, SharedResult)>>>,
    next_id: Arc<AtomicU64>,
}

impl InFlight {
    /// Await the computation for `key`, starting `work` only if none is
    /// already running.
    pub(crate) async fn run<F>(&self, key: &str, work: F) -> ResolveResult<String>
    where
        F: Future<Output = ResolveResult<String>> + Send + 'static,
    {
        let shared = {
            let mut pending = self.pending.lock().map_err(|_| ResolveError::Task {
                key: key.to_string(),
                message: "in-flight table poisoned".to_string(),
            })?;

            if let Some((_, running)) = pending.get(key) {
                tracing::debug!("Joining in-flight computation for {key}");
                running.clone()
            } else {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let table = Arc::clone(&self.pending);
                let task_key = key.to_string();
                let handle = tokio::spawn(async move {
                    let result = work.await;
                    if let Ok(mut pending) = table.lock() {
                        if pending.get(&task_key).is_some_and(|(owner, _)| *owner == id) {
                            pending.remove(&task_key);
                        }
                    }
                    result
                });

                let join_key = key.to_string();
                let running: SharedResult = async move {
                    handle.await.unwrap_or_else(|e| {
                        Err(ResolveError::Task {
                            key: join_key,
                            message: e.to_string(),
                        })
                    })
                }
                .boxed()
                .shared();
                pending.insert(key.to_string(), (id, running.clone()));
                running
            }
        };
        shared.await
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for InFlight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InFlight").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    fn counted(
        calls: &Arc<AtomicUsize>,
        result: ResolveResult<String>,
    ) -> impl Future<Output = ResolveResult<String>> + Send + 'static {
        let calls = Arc::clone(calls);
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(50)).await;
            result
        }
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_one_computation() {
        let flights = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b, c) = tokio::join!(
            flights.run("thumb/a.jpg", counted(&calls, Ok("/cache/a".into()))),
            flights.run("thumb/a.jpg", counted(&calls, Ok("/cache/b".into()))),
            flights.run("thumb/a.jpg", counted(&calls, Ok("/cache/c".into()))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(a.unwrap(), "/cache/a");
        assert_eq!(b.unwrap(), "/cache/a");
        assert_eq!(c.unwrap(), "/cache/a");
        assert_eq!(flights.len(), 0);
    }

    #[tokio::test]
    async fn test_distinct_keys_run_independently() {
        let flights = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            flights.run("thumb/a.jpg", counted(&calls, Ok("/cache/a".into()))),
            flights.run("thumb/b.jpg", counted(&calls, Ok("/cache/b".into()))),
        );

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(a.unwrap(), "/cache/a");
        assert_eq!(b.unwrap(), "/cache/b");
    }

    #[tokio::test]
    async fn test_failure_is_shared_but_not_remembered() {
        let flights = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));
        let missing = || Err(ResolveError::SourceNotFound("a.jpg".into()));

        let (a, b) = tokio::join!(
            flights.run("thumb/a.jpg", counted(&calls, missing())),
            flights.run("thumb/a.jpg", counted(&calls, missing())),
        );
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(a.unwrap_err().is_not_found());
        assert!(b.unwrap_err().is_not_found());

        let retry = flights
            .run("thumb/a.jpg", counted(&calls, Ok("/cache/a".into())))
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(retry.unwrap(), "/cache/a");
    }

    #[tokio::test]
    async fn test_dropped_caller_does_not_cancel_work() {
        let flights = InFlight::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let abandoned = tokio::time::timeout(
            Duration::from_millis(5),
            flights.run("thumb/a.jpg", counted(&calls, Ok("/cache/a".into()))),
        )
        .await;
        assert!(abandoned.is_err());

        let joined = flights
            .run("thumb/a.jpg", counted(&calls, Ok("/cache/other".into())))
            .await;
        assert_eq!(joined.unwrap(), "/cache/a");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}

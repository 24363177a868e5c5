// workers.rs
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::error;

/// Runs `task` over every item with at most `limit` in flight. Results come
/// back in completion order. A panicking task is logged and its item dropped;
/// the rest of the batch continues.
pub async fn run_bounded<I, T, F, Fut>(items: Vec<I>, limit: usize, task: F) -> Vec<T>
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = T> + Send + 'static,
{
    let permits = Arc::new(Semaphore::new(limit.max(1)));
    let task = Arc::new(task);
    let mut set = JoinSet::new();

    for item in items {
        let permits = permits.clone();
        let task = task.clone();
        set.spawn(async move {
            // Never closed, so this only yields None after a shutdown.
            let _permit = permits.acquire_owned().await.ok();
            task(item).await
        });
    }

    let mut out = Vec::with_capacity(set.len());
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(value) => out.push(value),
            Err(e) => error!(error = %e, "worker task aborted"),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn never_exceeds_limit() {
        let active = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let (a, p) = (active.clone(), peak.clone());
        let out = run_bounded((0..20).collect(), 3, move |i: u32| {
            let (a, p) = (a.clone(), p.clone());
            async move {
                let now = a.fetch_add(1, Ordering::SeqCst) + 1;
                p.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                a.fetch_sub(1, Ordering::SeqCst);
                i * 2
            }
        })
        .await;

        assert_eq!(out.len(), 20);
        assert!(peak.load(Ordering::SeqCst) <= 3);
        let mut sorted = out;
        sorted.sort();
        assert_eq!(sorted[19], 38);
    }

    #[tokio::test]
    async fn panicking_item_is_isolated() {
        let out = run_bounded(vec![1, 2, 3], 2, |i: u32| async move {
            if i == 2 {
                panic!("boom");
            }
            i
        })
        .await;
        assert_eq!(out.len(), 2);
    }
}

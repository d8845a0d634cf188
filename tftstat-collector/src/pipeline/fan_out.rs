//! Spawn-per-item fan-out with a join barrier
//!
//! Every item gets its own task on a `JoinSet`. Each task owns a clone of the
//! result sender, so the receiver only observes closure once the last task
//! has finished (successfully, with an error value, or by panicking). The
//! consumer drains the queue until closure, which is the stage's completion
//! signal.

use std::future::Future;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::error;

/// Accounting for one fan-out stage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOutStats {
    /// Tasks spawned (one per input item)
    pub spawned: usize,
    /// Results delivered to the consumer
    pub delivered: usize,
    /// Tasks that panicked before delivering
    pub lost: usize,
}

impl FanOutStats {
    pub fn is_complete(&self) -> bool {
        self.delivered + self.lost == self.spawned
    }
}

/// Run `task` for every item concurrently, feeding each result to `on_result`
///
/// Returns only after every spawned task has completed and every delivered
/// result has been consumed.
pub async fn fan_out<I, F, Fut, T, C>(items: I, task: F, mut on_result: C) -> FanOutStats
where
    I: IntoIterator,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = T> + Send + 'static,
    T: Send + 'static,
    C: FnMut(T),
{
    let (tx, mut rx) = mpsc::unbounded_channel::<T>();
    let mut tasks = JoinSet::new();
    let mut stats = FanOutStats::default();

    for item in items {
        let tx = tx.clone();
        let work = task(item);
        tasks.spawn(async move {
            let result = work.await;
            // Receiver outlives every sender; a send error only means the
            // consumer itself is gone
            let _ = tx.send(result);
        });
        stats.spawned += 1;
    }
    drop(tx);

    while let Some(result) = rx.recv().await {
        on_result(result);
        stats.delivered += 1;
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Fan-out task did not complete");
            stats.lost += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_queue_closes_after_slowest_task() {
        let delays = vec![30u64, 5, 50, 0, 10];
        let mut seen = Vec::new();

        let stats = fan_out(
            delays.clone(),
            |ms| async move {
                tokio::time::sleep(Duration::from_millis(ms)).await;
                ms
            },
            |ms| seen.push(ms),
        )
        .await;

        assert_eq!(stats.spawned, 5);
        assert_eq!(stats.delivered, 5);
        assert_eq!(stats.lost, 0);
        // Delivered in completion order, none missing
        assert_eq!(seen, vec![0, 5, 10, 30, 50]);
    }

    #[tokio::test]
    async fn test_failures_are_delivered_as_values() {
        let mut errors = 0;
        let mut values = 0;

        let stats = fan_out(
            1..=10,
            |n| async move {
                if n % 3 == 0 {
                    Err(format!("item {} failed", n))
                } else {
                    Ok(n)
                }
            },
            |result: Result<i32, String>| match result {
                Ok(_) => values += 1,
                Err(_) => errors += 1,
            },
        )
        .await;

        assert!(stats.is_complete());
        assert_eq!(values, 7);
        assert_eq!(errors, 3);
    }

    #[tokio::test]
    async fn test_panicking_task_counted_as_lost() {
        let mut seen = Vec::new();

        let stats = fan_out(
            vec![1, 2, 3],
            |n| async move {
                if n == 2 {
                    panic!("boom");
                }
                n
            },
            |n| seen.push(n),
        )
        .await;

        seen.sort();
        assert_eq!(seen, vec![1, 3]);
        assert_eq!(stats.delivered, 2);
        assert_eq!(stats.lost, 1);
        assert!(stats.is_complete());
    }

    #[tokio::test]
    async fn test_empty_input() {
        let stats = fan_out(Vec::<u8>::new(), |n| async move { n }, |_| {}).await;
        assert_eq!(stats, FanOutStats::default());
    }
}

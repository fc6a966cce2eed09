//! Bounded teardown of the supervisor's background tasks

use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{error, warn};

/// Timings of the graceful shutdown sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownPolicy {
    /// Pause after the shutdown command so the server can save and exit
    pub grace: Duration,
    /// Longest wait for background tasks after cancellation
    pub ceiling: Duration,
}

impl Default for ShutdownPolicy {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(2),
            ceiling: Duration::from_secs(5),
        }
    }
}

/// Wait for every task in `tasks`, giving up after `ceiling`.
///
/// Returns true when all tasks finished on their own. On timeout the
/// remaining tasks are aborted and false is returned.
pub async fn drain_tasks(tasks: &mut JoinSet<()>, ceiling: Duration) -> bool {
    let drained = tokio::time::timeout(ceiling, async {
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Err(e) if e.is_panic() => error!("Background task panicked: {}", e),
                _ => {}
            }
        }
    })
    .await;

    match drained {
        Ok(()) => true,
        Err(_) => {
            warn!(
                remaining = tasks.len(),
                "Background tasks did not stop within {:?}, aborting", ceiling
            );
            tasks.abort_all();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[tokio::test]
    async fn test_drain_finished_tasks() {
        let mut tasks = JoinSet::new();
        tasks.spawn(async {});
        tasks.spawn(async {
            tokio::time::sleep(Duration::from_millis(20)).await;
        });

        assert!(drain_tasks(&mut tasks, Duration::from_secs(1)).await);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn test_drain_is_bounded_by_ceiling() {
        let mut tasks = JoinSet::new();
        tasks.spawn(std::future::pending::<()>());

        let started = Instant::now();
        let clean = drain_tasks(&mut tasks, Duration::from_millis(200)).await;
        let elapsed = started.elapsed();

        assert!(!clean);
        assert!(elapsed >= Duration::from_millis(200));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_drain_survives_panicking_task() {
        let mut tasks = JoinSet::new();
        tasks.spawn(async { panic!("boom") });

        assert!(drain_tasks(&mut tasks, Duration::from_secs(1)).await);
    }

    #[test]
    fn test_default_policy() {
        let policy = ShutdownPolicy::default();
        assert_eq!(policy.grace, Duration::from_secs(2));
        assert_eq!(policy.ceiling, Duration::from_secs(5));
    }
}

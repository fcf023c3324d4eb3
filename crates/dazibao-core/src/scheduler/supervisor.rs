use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info_span, warn};

use crate::events;
use crate::scheduler::block::BlockScheduler;
use crate::store::ConfigStore;

/// How long [`Supervisor::shutdown`] waits for in-flight ticks before aborting.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Owns one scheduler task per block for the process lifetime.
///
/// Tasks are spawned once at [`start`](Self::start); blocks are never added
/// or removed afterwards. Dropping the supervisor aborts every task.
pub struct Supervisor {
    tasks: JoinSet<()>,
    shutdown: CancellationToken,
    block_titles: Vec<String>,
}

impl Supervisor {
    /// Spawn a scheduler for every block in `store`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(store: &ConfigStore) -> Self {
        Self::start_with_token(store, CancellationToken::new())
    }

    /// Like [`start`](Self::start), stopping when `shutdown` (or a parent) is cancelled.
    pub fn start_with_token(store: &ConfigStore, shutdown: CancellationToken) -> Self {
        let mut tasks = JoinSet::new();
        let mut block_titles = Vec::new();

        for scheduler in BlockScheduler::for_all(store) {
            let span = info_span!(
                "block",
                index = scheduler.index(),
                title = %scheduler.title()
            );
            block_titles.push(scheduler.title().to_string());
            tasks.spawn(scheduler.run(shutdown.child_token()).instrument(span));
        }

        events::log_supervisor_started(block_titles.len());

        Self {
            tasks,
            shutdown,
            block_titles,
        }
    }

    pub fn len(&self) -> usize {
        self.block_titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.block_titles.is_empty()
    }

    pub fn block_titles(&self) -> &[String] {
        &self.block_titles
    }

    /// Token whose cancellation stops every scheduler.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop every scheduler and wait for them.
    ///
    /// Schedulers stop at their next timer wait. Ticks still running after
    /// `grace` (e.g. a hung command) are aborted; store mutations are
    /// synchronous, so an abort never leaves a block half-committed.
    pub async fn shutdown(mut self, grace: Duration) {
        self.shutdown.cancel();

        let drained = tokio::time::timeout(grace, async {
            while let Some(result) = self.tasks.join_next().await {
                if let Err(e) = result {
                    warn!(event = "core.supervisor.task_failed", error = %e);
                }
            }
        })
        .await;

        let mut aborted = 0;
        if drained.is_err() {
            aborted = self.tasks.len();
            warn!(
                event = "core.supervisor.abort_stragglers",
                remaining = aborted,
                grace_ms = grace.as_millis() as u64,
                "Schedulers still running after grace period, aborting"
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }

        events::log_supervisor_stopped(self.len(), aborted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::{Block, DashboardConfig, GlobalColors};
    use chrono::{DateTime, Utc};

    fn counting_block(title: &str, log: &std::path::Path, interval: u64) -> Block {
        Block::single(
            title,
            format!("echo x >> '{}'; wc -l < '{}'", log.display(), log.display()),
            interval,
        )
    }

    fn tree(blocks: Vec<Block>) -> DashboardConfig {
        DashboardConfig {
            blocks,
            last_updated: DateTime::<Utc>::default(),
            port: 8080,
            version: String::new(),
            colors: GlobalColors::default(),
        }
    }

    fn tick_count(store: &ConfigStore, index: usize) -> u32 {
        store.snapshot().blocks[index].outputs()[0]
            .trim()
            .parse()
            .unwrap_or(0)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_blocks_tick_on_their_own_intervals() {
        let dir = tempfile::tempdir().unwrap();
        let fast_log = dir.path().join("fast.log");
        let slow_log = dir.path().join("slow.log");
        let store = ConfigStore::in_memory(tree(vec![
            counting_block("fast", &fast_log, 1),
            counting_block("slow", &slow_log, 100),
        ]));

        let supervisor = Supervisor::start(&store);
        assert_eq!(supervisor.len(), 2);
        tokio::time::sleep(Duration::from_millis(3200)).await;
        supervisor.shutdown(DEFAULT_SHUTDOWN_GRACE).await;

        assert!(tick_count(&store, 0) >= 2, "fast block ticked {}", tick_count(&store, 0));
        assert_eq!(tick_count(&store, 1), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_hung_block_does_not_stall_others() {
        let dir = tempfile::tempdir().unwrap();
        let log = dir.path().join("busy.log");
        let store = ConfigStore::in_memory(tree(vec![
            Block::single("hung", "sleep 30", 1),
            counting_block("busy", &log, 1),
        ]));

        let supervisor = Supervisor::start(&store);
        tokio::time::sleep(Duration::from_millis(2300)).await;

        // Rendering reads stay available while the hung command runs
        let snap = store.snapshot();
        assert_eq!(snap.blocks[0].outputs(), vec![""]);
        assert!(tick_count(&store, 1) >= 2);

        // The hung tick is aborted after the grace period
        tokio::time::timeout(
            Duration::from_secs(5),
            supervisor.shutdown(Duration::from_millis(200)),
        )
        .await
        .expect("shutdown should abort the hung scheduler");
    }

    #[tokio::test]
    async fn test_parent_token_stops_supervisor() {
        let store = ConfigStore::in_memory(tree(vec![Block::single("var", "%time", 1)]));
        let parent = CancellationToken::new();
        let supervisor = Supervisor::start_with_token(&store, parent.child_token());

        tokio::time::sleep(Duration::from_millis(100)).await;
        parent.cancel();
        assert!(supervisor.shutdown_token().is_cancelled());

        supervisor.shutdown(Duration::from_secs(1)).await;
        assert!(!store.snapshot().blocks[0].outputs()[0].is_empty());
    }
}

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::blocks::Block;
use crate::events;
use crate::executor;
use crate::store::ConfigStore;

/// What one tick of one block produced.
#[derive(Debug, Clone, PartialEq)]
pub struct TickOutcome {
    pub index: usize,
    /// One slot text per command, in declared order.
    pub outputs: Vec<String>,
    pub failures: usize,
    /// Block timestamp written by the commit, `None` if the commit was refused.
    pub committed_at: Option<DateTime<Utc>>,
}

/// Scheduler for the block at `index` in the store's tree.
///
/// Holds its own copy of the block's command strings; they never change after
/// load, so ticks read nothing from the store until they commit.
#[derive(Debug, Clone)]
pub struct BlockScheduler {
    index: usize,
    title: String,
    interval: Duration,
    commands: Vec<String>,
    store: ConfigStore,
}

impl BlockScheduler {
    pub fn new(store: ConfigStore, index: usize, block: &Block) -> Self {
        Self {
            index,
            title: block.title.clone(),
            interval: Duration::from_secs(block.interval.max(1)),
            commands: block.commands().into_iter().map(str::to_string).collect(),
            store,
        }
    }

    /// One scheduler per block currently in the store, in display order.
    pub fn for_all(store: &ConfigStore) -> Vec<Self> {
        store
            .snapshot()
            .blocks
            .iter()
            .enumerate()
            .map(|(index, block)| Self::new(store.clone(), index, block))
            .collect()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one tick: execute every command in declared order, then commit all
    /// slots and the block timestamp as one store mutation.
    pub async fn tick(&self) -> TickOutcome {
        let mut outputs = Vec::with_capacity(self.commands.len());
        let mut failures = 0;

        for command in &self.commands {
            let result = executor::execute(command).await;
            if let Err(e) = &result {
                failures += 1;
                warn!(
                    event = "core.scheduler.command_failed",
                    block = %self.title,
                    command = %command,
                    error = %e,
                    output = e.output().unwrap_or_default()
                );
            }
            outputs.push(executor::slot_text(result));
        }

        let committed_at = self.commit(outputs.clone());

        match committed_at {
            Some(at) => debug!(
                event = "core.scheduler.tick_completed",
                block = %self.title,
                index = self.index,
                failures = failures,
                last_updated = %at
            ),
            None => warn!(
                event = "core.scheduler.commit_refused",
                block = %self.title,
                index = self.index,
                "Block no longer matches its scheduler; tick results dropped"
            ),
        }

        TickOutcome {
            index: self.index,
            outputs,
            failures,
            committed_at,
        }
    }

    fn commit(&self, outputs: Vec<String>) -> Option<DateTime<Utc>> {
        self.store.try_mutate(|tree| {
            let block = tree.blocks.get_mut(self.index)?;
            if !block.set_outputs(outputs) {
                return None;
            }
            let at = block.touch(Utc::now());
            tree.last_updated = tree.last_updated.max(at);
            Some(at)
        })
    }

    /// Tick immediately, then once per interval, until `shutdown` is cancelled.
    ///
    /// Cancellation is observed between ticks only; a running tick always
    /// reaches its commit. A tick that overruns the interval delays the next
    /// one instead of causing a burst.
    pub async fn run(self, shutdown: CancellationToken) {
        events::log_scheduler_started(
            self.index,
            &self.title,
            self.interval,
            self.commands.len(),
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    self.tick().await;
                }
            }
        }

        events::log_scheduler_stopped(self.index, &self.title);
    }
}

/// Tick every block once, sequentially, in display order.
pub async fn run_all_once(store: &ConfigStore) -> Vec<TickOutcome> {
    let mut outcomes = Vec::new();
    for scheduler in BlockScheduler::for_all(store) {
        outcomes.push(scheduler.tick().await);
    }
    outcomes
}

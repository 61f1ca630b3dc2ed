//! Background task driving a [`QueryState`].
//!
//! One task per query. It owns the state machine and reacts to four inputs:
//! the poll ticker, commands from the view (refresh, focus, mutations),
//! fetch completions, and mutation completions. Every transition is
//! published as a [`QuerySnapshot`] on a `watch` channel.
//!
//! Dropping the driver, or calling [`QueryDriver::shutdown`], stops the
//! task. Fetches and mutations still in flight are aborted with it, so a
//! late response can never land in a torn-down view.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};
use crate::notice::Notifier;
use crate::query::{QuerySnapshot, QueryState, RefreshTrigger};
use crate::transport::BoxFuture;

/// Produces one fetch of the query's value per call.
pub type Fetcher<T> = Arc<dyn Fn() -> BoxFuture<'static, ClientResult<T>> + Send + Sync>;

/// A write against the API, followed by invalidation when it succeeds.
pub struct Mutation {
    /// Notice shown on success.
    pub success: String,
    /// Notice shown on failure.
    pub failure: String,
    pub run: BoxFuture<'static, ClientResult<()>>,
}

impl Mutation {
    pub fn new(
        success: impl Into<String>,
        failure: impl Into<String>,
        run: BoxFuture<'static, ClientResult<()>>,
    ) -> Self {
        Self {
            success: success.into(),
            failure: failure.into(),
            run,
        }
    }
}

enum Command {
    Refresh(RefreshTrigger),
    Mutate(Mutation),
}

struct MutationOutcome {
    result: ClientResult<()>,
    success: String,
    failure: String,
}

/// Handle to a running query task.
pub struct QueryDriver<T> {
    label: String,
    commands: mpsc::UnboundedSender<Command>,
    snapshots: watch::Receiver<QuerySnapshot<T>>,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl<T> QueryDriver<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Start the task and issue the initial `Mount` fetch.
    pub fn spawn(
        label: impl Into<String>,
        fetch: Fetcher<T>,
        poll_interval: Duration,
        notifier: Notifier,
    ) -> Self {
        let label = label.into();
        let (commands, command_rx) = mpsc::unbounded_channel();
        let (snapshot_tx, snapshots) = watch::channel(QuerySnapshot::default());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = QueryLoop {
            label: label.clone(),
            fetch,
            poll_interval,
            notifier,
            state: QueryState::new(),
            snapshots: snapshot_tx,
        };
        let handle = tokio::spawn(task.run(command_rx, shutdown_rx));

        let driver = Self {
            label,
            commands,
            snapshots,
            shutdown_tx,
            handle,
        };
        driver.refresh(RefreshTrigger::Mount);
        debug!(query = %driver.label, ?poll_interval, "query driver started");
        driver
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn refresh(&self, trigger: RefreshTrigger) {
        self.send(Command::Refresh(trigger));
    }

    pub fn mutate(&self, mutation: Mutation) {
        self.send(Command::Mutate(mutation));
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> QuerySnapshot<T> {
        self.snapshots.borrow().clone()
    }

    /// Receiver notified on every transition.
    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<T>> {
        self.snapshots.clone()
    }

    /// Stop the task and wait for it to exit.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            warn!(query = %self.label, error = %e, "query task ended abnormally");
        }
        debug!(query = %self.label, "query driver stopped");
    }

    fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            debug!(query = %self.label, "query task gone, command dropped");
        }
    }
}

struct QueryLoop<T> {
    label: String,
    fetch: Fetcher<T>,
    poll_interval: Duration,
    notifier: Notifier,
    state: QueryState<T>,
    snapshots: watch::Sender<QuerySnapshot<T>>,
}

impl<T> QueryLoop<T>
where
    T: Clone + Send + Sync + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker =
            tokio::time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut fetches: JoinSet<ClientResult<T>> = JoinSet::new();
        let mut mutations: JoinSet<MutationOutcome> = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!(query = %self.label, "query loop shutting down");
                    break;
                }
                command = commands.recv() => match command {
                    Some(Command::Refresh(trigger)) => self.trigger(trigger, &mut fetches),
                    Some(Command::Mutate(mutation)) => {
                        let Mutation { success, failure, run } = mutation;
                        mutations.spawn(async move {
                            MutationOutcome { result: run.await, success, failure }
                        });
                    }
                    None => break,
                },
                _ = ticker.tick() => self.trigger(RefreshTrigger::Interval, &mut fetches),
                Some(joined) = fetches.join_next(), if !fetches.is_empty() => {
                    let result = joined.unwrap_or_else(|e| Err(ClientError::transport(e)));
                    self.settle(result, &mut fetches);
                }
                Some(joined) = mutations.join_next(), if !mutations.is_empty() => {
                    self.mutation_done(joined, &mut fetches);
                }
            }
        }
        // JoinSets abort whatever is left when dropped here.
    }

    fn trigger(&mut self, trigger: RefreshTrigger, fetches: &mut JoinSet<ClientResult<T>>) {
        if self.state.begin(trigger) {
            debug!(query = %self.label, ?trigger, "fetch started");
            fetches.spawn((self.fetch)());
            self.publish();
        } else {
            debug!(query = %self.label, ?trigger, "fetch in flight, trigger coalesced");
        }
    }

    fn settle(&mut self, result: ClientResult<T>, fetches: &mut JoinSet<ClientResult<T>>) {
        if let Err(e) = &result {
            warn!(query = %self.label, error = %e, "fetch failed, keeping last data");
            self.notifier.error(format!("Failed to refresh {}.", self.label));
        }
        let refetch = self.state.complete(result, Utc::now());
        self.publish();
        if refetch {
            self.trigger(RefreshTrigger::Invalidate, fetches);
        }
    }

    fn mutation_done(
        &mut self,
        joined: Result<MutationOutcome, tokio::task::JoinError>,
        fetches: &mut JoinSet<ClientResult<T>>,
    ) {
        match joined {
            Ok(MutationOutcome {
                result: Ok(()),
                success,
                ..
            }) => {
                debug!(query = %self.label, "mutation succeeded, invalidating");
                self.notifier.success(success);
                self.trigger(RefreshTrigger::Invalidate, fetches);
            }
            Ok(MutationOutcome {
                result: Err(e),
                failure,
                ..
            }) => {
                warn!(query = %self.label, error = %e, "mutation failed");
                self.notifier.error(failure);
            }
            Err(e) => {
                warn!(query = %self.label, error = %e, "mutation task ended abnormally");
                self.notifier.error("Request failed. Please try again.");
            }
        }
    }

    fn publish(&self) {
        self.snapshots.send_replace(self.state.snapshot().clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::notice::NoticeLevel;
    use crate::query::QueryPhase;

    /// Counting fetcher; fails while `fail` is set.
    struct Counter {
        calls: AtomicUsize,
        fail: std::sync::atomic::AtomicBool,
    }

    fn counting_fetcher(counter: Arc<Counter>) -> Fetcher<usize> {
        Arc::new(move || {
            let counter = counter.clone();
            Box::pin(async move {
                let n = counter.calls.fetch_add(1, Ordering::SeqCst) + 1;
                if counter.fail.load(Ordering::SeqCst) {
                    Err(ClientError::Transport("connection refused".into()))
                } else {
                    Ok(n)
                }
            })
        })
    }

    fn counter() -> Arc<Counter> {
        Arc::new(Counter {
            calls: AtomicUsize::new(0),
            fail: std::sync::atomic::AtomicBool::new(false),
        })
    }

    async fn wait_for<T: Clone>(
        rx: &mut watch::Receiver<QuerySnapshot<T>>,
        pred: impl Fn(&QuerySnapshot<T>) -> bool,
    ) -> QuerySnapshot<T> {
        let snap = rx.wait_for(|s| pred(s)).await.unwrap();
        snap.clone()
    }

    #[tokio::test]
    async fn mount_fetch_reaches_ready() {
        let c = counter();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(60),
            Notifier::silent(),
        );
        let mut rx = driver.subscribe();
        let snap = wait_for(&mut rx, |s| s.phase == QueryPhase::Ready).await;
        assert_eq!(snap.data, Some(1));
        assert_eq!(snap.generation, 1);
        driver.shutdown().await;
    }

    #[tokio::test]
    async fn failed_refresh_keeps_data_and_notifies() {
        let c = counter();
        let (notifier, mut notices) = Notifier::channel();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(60),
            notifier,
        );
        let mut rx = driver.subscribe();
        wait_for(&mut rx, |s| s.generation == 1).await;

        c.fail.store(true, Ordering::SeqCst);
        driver.refresh(RefreshTrigger::Manual);
        let snap = wait_for(&mut rx, |s| s.last_error.is_some()).await;
        assert_eq!(snap.phase, QueryPhase::Ready);
        assert_eq!(snap.data, Some(1));

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "Failed to refresh numbers.");
        driver.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn interval_polls_on_schedule() {
        let c = counter();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(15),
            Notifier::silent(),
        );
        let mut rx = driver.subscribe();
        wait_for(&mut rx, |s| s.generation == 1).await;
        assert_eq!(c.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert_eq!(c.calls.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(2)).await;
        wait_for(&mut rx, |s| s.generation == 2).await;

        tokio::time::sleep(Duration::from_secs(15)).await;
        wait_for(&mut rx, |s| s.generation == 3).await;
        driver.shutdown().await;
    }

    #[tokio::test]
    async fn successful_mutation_invalidates() {
        let c = counter();
        let (notifier, mut notices) = Notifier::channel();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(60),
            notifier,
        );
        let mut rx = driver.subscribe();
        wait_for(&mut rx, |s| s.generation == 1).await;

        driver.mutate(Mutation::new("saved", "not saved", Box::pin(async { Ok(()) })));
        let snap = wait_for(&mut rx, |s| s.generation == 2).await;
        assert_eq!(snap.data, Some(2));

        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, "saved");
        driver.shutdown().await;
    }

    #[tokio::test]
    async fn failed_mutation_leaves_cache_alone() {
        let c = counter();
        let (notifier, mut notices) = Notifier::channel();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(60),
            notifier,
        );
        let mut rx = driver.subscribe();
        wait_for(&mut rx, |s| s.generation == 1).await;

        driver.mutate(Mutation::new(
            "saved",
            "not saved",
            Box::pin(async { Err(ClientError::Validation("name is required".into())) }),
        ));
        let notice = notices.recv().await.unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, "not saved");

        let snap = driver.snapshot();
        assert_eq!(snap.generation, 1);
        assert_eq!(c.calls.load(Ordering::SeqCst), 1);
        driver.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_stops_the_task() {
        let c = counter();
        let driver = QueryDriver::spawn(
            "numbers",
            counting_fetcher(c.clone()),
            Duration::from_secs(60),
            Notifier::silent(),
        );
        let mut rx = driver.subscribe();
        wait_for(&mut rx, |s| s.generation == 1).await;
        driver.shutdown().await;

        // Sender side is gone with the task.
        assert!(rx.changed().await.is_err());
    }
}

//! Portfolio synchronization
//!
//! Keeps one [`Snapshot`] of every collection current for any number of
//! readers. A single background worker owns all writes:
//!
//! 1. Fetch every collection in parallel and publish a Ready snapshot
//! 2. Subscribe to changes on every table
//! 3. On any change, session change or manual refresh, re-fetch everything
//!    and replace the snapshot wholesale
//!
//! Refresh requests are coalesced with a queue of depth one: requests that
//! arrive while a fetch is in flight cause exactly one more fetch after it.
//!
//! ## Usage
//!
//! ```ignore
//! let sync = PortfolioSync::new(store, sessions).with_feed(feed).spawn();
//! let snapshot = sync.ready().await?;
//! println!("{} projects", snapshot.projects.len());
//! ```

mod fallback;
mod fetch;
mod snapshot;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::{mpsc, watch, Notify};
use tracing::{debug, info, warn};

pub use fallback::{Collection, Fallback, Policy, Trigger, POLICIES};
pub use fetch::fetch_snapshot;
pub use snapshot::{LoadState, Snapshot};

use crate::auth::SessionProvider;
use crate::store::{ChangeEvent, ChangeFeed, ChangeSubscription, RemoteStore, Table};

pub(crate) use fetch::bounded;

/// Capacity of the change-event fan-in channel
const EVENT_BUFFER: usize = 64;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SyncError {
    #[error("Synchronization has stopped")]
    Stopped,
}

/// Builder for the synchronization worker
pub struct PortfolioSync {
    store: Arc<dyn RemoteStore>,
    sessions: Arc<dyn SessionProvider>,
    feed: Option<Arc<dyn ChangeFeed>>,
    fetch_timeout: Duration,
}

impl PortfolioSync {
    pub fn new(store: Arc<dyn RemoteStore>, sessions: Arc<dyn SessionProvider>) -> Self {
        Self {
            store,
            sessions,
            feed: None,
            fetch_timeout: Duration::from_secs(15),
        }
    }

    /// Refresh on change notifications from `feed`
    pub fn with_feed(mut self, feed: Arc<dyn ChangeFeed>) -> Self {
        self.feed = Some(feed);
        self
    }

    /// Bound on every individual store call
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Start the worker; the initial fetch begins immediately
    pub fn spawn(self) -> SyncHandle {
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(Snapshot::loading()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let requests = Arc::new(Requests {
            requested: AtomicU64::new(1),
            wake: Notify::new(),
        });

        let worker = Worker {
            store: self.store,
            sessions: self.sessions,
            feed: self.feed,
            fetch_timeout: self.fetch_timeout,
            requests: requests.clone(),
            snapshot_tx,
            shutdown_rx,
        };
        tokio::spawn(worker.run());

        SyncHandle {
            inner: Arc::new(HandleInner {
                requests,
                snapshot_rx,
                shutdown_tx,
            }),
        }
    }
}

/// Refresh requests shared between handles and the worker
///
/// `requested` is the generation the latest request wants published; the
/// worker publishes each fetch under the value it read before fetching.
struct Requests {
    requested: AtomicU64,
    wake: Notify,
}

impl Requests {
    fn request(&self) -> u64 {
        let target = self.requested.fetch_add(1, Ordering::SeqCst) + 1;
        self.wake.notify_one();
        target
    }
}

struct HandleInner {
    requests: Arc<Requests>,
    snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    shutdown_tx: watch::Sender<bool>,
}

/// Read access to the snapshot, plus refresh and shutdown
///
/// Clones share one worker. The worker stops when `shutdown` is called or
/// the last clone is dropped.
#[derive(Clone)]
pub struct SyncHandle {
    inner: Arc<HandleInner>,
}

impl SyncHandle {
    /// The latest published snapshot
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot_rx.borrow().clone()
    }

    /// Receiver notified on every publication
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.inner.snapshot_rx.clone()
    }

    /// Wait for the first Ready snapshot
    pub async fn ready(&self) -> Result<Arc<Snapshot>, SyncError> {
        self.wait_for(|snapshot| snapshot.is_ready()).await
    }

    /// Request a full refresh and wait until it is published
    pub async fn refresh(&self) -> Result<Arc<Snapshot>, SyncError> {
        let target = self.inner.requests.request();
        self.wait_for(|snapshot| snapshot.generation >= target).await
    }

    /// Request a full refresh without waiting
    pub fn request_refresh(&self) {
        self.inner.requests.request();
    }

    /// Stop the worker and release every change subscription
    ///
    /// Nothing is published after this returns.
    pub fn shutdown(&self) {
        self.inner.shutdown_tx.send_replace(true);
    }

    pub fn is_shut_down(&self) -> bool {
        *self.inner.shutdown_tx.borrow()
    }

    async fn wait_for(
        &self,
        done: impl Fn(&Snapshot) -> bool,
    ) -> Result<Arc<Snapshot>, SyncError> {
        if self.is_shut_down() {
            return Err(SyncError::Stopped);
        }
        let mut rx = self.inner.snapshot_rx.clone();
        let mut shutdown = self.inner.shutdown_tx.subscribe();
        tokio::select! {
            result = rx.wait_for(|snapshot| done(snapshot)) => match result {
                Ok(snapshot) => Ok(snapshot.clone()),
                Err(_) => Err(SyncError::Stopped),
            },
            _ = shutdown.wait_for(|stopped| *stopped) => Err(SyncError::Stopped),
        }
    }
}

impl Drop for HandleInner {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}

struct Worker {
    store: Arc<dyn RemoteStore>,
    sessions: Arc<dyn SessionProvider>,
    feed: Option<Arc<dyn ChangeFeed>>,
    fetch_timeout: Duration,
    requests: Arc<Requests>,
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Worker {
    fn stopped(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    async fn run(mut self) {
        let (event_tx, mut event_rx) = mpsc::channel(EVENT_BUFFER);
        let mut subscriptions: Vec<ChangeSubscription> = Vec::new();
        let mut subscribed = false;
        let mut published = 0u64;

        let mut session_rx = self.sessions.session_changes();
        session_rx.borrow_and_update();
        let mut session_open = true;

        loop {
            if self.stopped() {
                break;
            }

            let target = self.requests.requested.load(Ordering::SeqCst);
            if target > published {
                let fetched = tokio::select! {
                    biased;
                    _ = self.shutdown_rx.wait_for(|stopped| *stopped) => break,
                    snapshot = fetch_snapshot(
                        self.store.as_ref(),
                        self.sessions.as_ref(),
                        self.fetch_timeout,
                    ) => snapshot,
                };

                // The owner may have gone away while the fetch was in flight
                if self.stopped() {
                    break;
                }

                let mut snapshot = fetched;
                snapshot.generation = target;
                debug!(
                    "Publishing snapshot generation {} ({} projects, {} leads)",
                    target,
                    snapshot.projects.len(),
                    snapshot.leads.len()
                );
                self.snapshot_tx.send_replace(Arc::new(snapshot));
                published = target;

                if !subscribed {
                    subscribed = true;
                    if let Some(ref feed) = self.feed {
                        subscriptions = subscribe_all(feed.as_ref(), &event_tx).await;
                        info!("Listening for changes on {} tables", subscriptions.len());
                    }
                }
                continue;
            }

            tokio::select! {
                _ = self.shutdown_rx.wait_for(|stopped| *stopped) => break,
                Some(event) = event_rx.recv() => {
                    debug!("Change on {} ({:?}), refreshing", event.table, event.kind);
                    // Drain the burst; one refresh covers all of it
                    while event_rx.try_recv().is_ok() {}
                    self.requests.request();
                }
                changed = session_rx.changed(), if session_open => {
                    match changed {
                        Ok(()) => {
                            session_rx.borrow_and_update();
                            debug!("Session changed, refreshing");
                            self.requests.request();
                        }
                        Err(_) => session_open = false,
                    }
                }
                _ = self.requests.wake.notified() => {}
            }
        }

        let count = subscriptions.len();
        drop(subscriptions);
        info!("Synchronization stopped, released {} subscriptions", count);
    }
}

async fn subscribe_all(
    feed: &dyn ChangeFeed,
    sink: &mpsc::Sender<ChangeEvent>,
) -> Vec<ChangeSubscription> {
    let mut subscriptions = Vec::with_capacity(Table::ALL.len());
    for table in Table::ALL {
        match feed.subscribe(table, sink.clone()).await {
            Ok(subscription) => subscriptions.push(subscription),
            Err(e) => warn!("Could not subscribe to {}: {}", table, e),
        }
    }
    subscriptions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, SessionUser};
    use crate::defaults::default_skills;
    use crate::store::{ChangeKind, MemoryStore};
    use serde_json::json;

    fn spawn(store: &MemoryStore) -> SyncHandle {
        let store = Arc::new(store.clone());
        PortfolioSync::new(store.clone(), store.clone())
            .with_feed(store)
            .with_timeout(Duration::from_secs(5))
            .spawn()
    }

    async fn wait_until(what: impl Fn() -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !what() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    fn admin() -> Session {
        Session {
            access_token: "t".to_string(),
            refresh_token: None,
            expires_at: None,
            user: SessionUser {
                id: "admin".to_string(),
                email: Some("admin@example.com".to_string()),
            },
        }
    }

    #[tokio::test]
    async fn test_initial_load_publishes_ready_snapshot() {
        let store = MemoryStore::new();
        store.seed(Table::Projects, vec![json!({"title": "One", "visible": true})]);
        let sync = spawn(&store);

        let snapshot = sync.ready().await.unwrap();
        assert_eq!(snapshot.generation, 1);
        assert_eq!(snapshot.projects.len(), 1);
        assert_eq!(snapshot.skills, default_skills());
    }

    #[tokio::test]
    async fn test_subscribes_every_table_after_initial_load() {
        let store = MemoryStore::new();
        let sync = spawn(&store);
        sync.ready().await.unwrap();
        wait_until(|| store.subscriber_count() == Table::ALL.len()).await;
    }

    #[tokio::test]
    async fn test_change_notification_refreshes_everything() {
        let store = MemoryStore::new();
        let sync = spawn(&store);
        sync.ready().await.unwrap();
        wait_until(|| store.subscriber_count() == Table::ALL.len()).await;

        let mut rx = sync.subscribe();
        rx.borrow_and_update();
        let before: Vec<_> = Table::ALL.iter().map(|t| store.select_count(*t)).collect();

        // Written straight to the store, as another client would
        store
            .insert(Table::Blogs, json!({"title": "New post", "status": "published"}))
            .await
            .unwrap();
        rx.changed().await.unwrap();
        let snapshot = rx.borrow().clone();

        assert_eq!(snapshot.blogs.len(), 1);
        assert!(snapshot.generation > 1);
        for (i, table) in Table::ALL.iter().enumerate() {
            if *table != Table::Leads {
                assert!(store.select_count(*table) > before[i], "{} not re-fetched", table);
            }
        }
    }

    #[tokio::test]
    async fn test_burst_of_changes_is_coalesced() {
        let store = MemoryStore::new();
        let sync = spawn(&store);
        sync.ready().await.unwrap();
        wait_until(|| store.subscriber_count() == Table::ALL.len()).await;

        store.set_latency(Duration::from_millis(30));
        let start = store.select_count(Table::Projects);
        for _ in 0..20 {
            store.emit(Table::Projects, ChangeKind::Update);
        }
        // Latest state must still land: one more write after the burst
        store.seed(Table::Projects, vec![json!({"title": "Final"})]);
        store.emit(Table::Projects, ChangeKind::Insert);

        wait_until(|| sync.snapshot().projects.len() == 1).await;
        tokio::time::sleep(Duration::from_millis(200)).await;
        let fetches = store.select_count(Table::Projects) - start;
        assert!(fetches >= 1 && fetches <= 3, "{} fetches for one burst", fetches);
        assert_eq!(sync.snapshot().projects[0].title, "Final");
    }

    #[tokio::test]
    async fn test_requests_during_fetch_cause_exactly_one_more() {
        let store = MemoryStore::new();
        store.set_latency(Duration::from_millis(50));
        let sync = PortfolioSync::new(Arc::new(store.clone()), Arc::new(store.clone())).spawn();
        sync.ready().await.unwrap();
        let start = store.select_count(Table::Projects);

        let first = sync.clone();
        let in_flight = tokio::spawn(async move { first.refresh().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        for _ in 0..5 {
            sync.request_refresh();
        }
        in_flight.await.unwrap().unwrap();
        let last = sync.refresh().await.unwrap();

        // The in-flight fetch, one coalesced follow-up, and the final refresh
        // (which may itself coalesce into the follow-up)
        let fetches = store.select_count(Table::Projects) - start;
        assert!(fetches <= 3, "{} fetches", fetches);
        assert!(last.generation >= 7);
    }

    #[tokio::test]
    async fn test_manual_refresh_sees_direct_writes() {
        let store = MemoryStore::new();
        let sync = PortfolioSync::new(Arc::new(store.clone()), Arc::new(store.clone())).spawn();
        sync.ready().await.unwrap();

        store.seed(Table::Services, vec![json!({"title": "Consulting"})]);
        let snapshot = sync.refresh().await.unwrap();
        assert_eq!(snapshot.services.len(), 1);
    }

    #[tokio::test]
    async fn test_sign_in_refreshes_with_leads() {
        let store = MemoryStore::new().with_admin("admin@example.com", "pw");
        store.seed(
            Table::Leads,
            vec![json!({"name": "Ann", "date": "2024-01-01", "status": "new"})],
        );
        let sync = spawn(&store);
        let snapshot = sync.ready().await.unwrap();
        assert!(snapshot.leads.is_empty());

        store.sign_in("admin@example.com", "pw").await.unwrap();
        wait_until(|| sync.snapshot().leads.len() == 1).await;
        assert!(sync.snapshot().authenticated);

        store.set_session(None);
        wait_until(|| sync.snapshot().leads.is_empty()).await;
    }

    #[tokio::test]
    async fn test_shutdown_releases_subscriptions() {
        let store = MemoryStore::new();
        let sync = spawn(&store);
        sync.ready().await.unwrap();
        wait_until(|| store.subscriber_count() == Table::ALL.len()).await;

        sync.shutdown();
        wait_until(|| store.subscriber_count() == 0).await;
        assert_eq!(sync.refresh().await, Err(SyncError::Stopped));
    }

    #[tokio::test]
    async fn test_drop_releases_subscriptions() {
        let store = MemoryStore::new();
        let sync = spawn(&store);
        sync.ready().await.unwrap();
        wait_until(|| store.subscriber_count() == Table::ALL.len()).await;

        drop(sync);
        wait_until(|| store.subscriber_count() == 0).await;
    }

    #[tokio::test]
    async fn test_no_publish_after_shutdown() {
        let store = MemoryStore::new();
        store.set_latency(Duration::from_millis(100));
        let sync = spawn(&store);
        let rx = sync.subscribe();

        // Shut down while the initial fetch is in flight
        tokio::time::sleep(Duration::from_millis(20)).await;
        sync.shutdown();
        tokio::time::sleep(Duration::from_millis(250)).await;

        assert!(!rx.borrow().is_ready());
        assert_eq!(rx.borrow().generation, 0);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_session_check_failure_still_ready() {
        let store = MemoryStore::new();
        store.set_session(Some(admin()));
        store.fail_session_check(Some("auth down"));
        store.seed(Table::Leads, vec![json!({"name": "Ann"})]);

        let sync = spawn(&store);
        let snapshot = sync.ready().await.unwrap();
        assert!(snapshot.leads.is_empty());
        assert!(snapshot.error.is_some());
    }
}

//! Incremental event history for one detail view.
//!
//! The pager accumulates pages of `GET /services/{id}/events` in order. At
//! most one page request is in flight at a time: a `load_more` issued while
//! another is running is a no-op, as is one issued after the end of the
//! history was seen. An empty page ends the history for good.
//!
//! Closing the pager (the view went away) makes every later result a no-op.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use monito_state::{ServiceEvent, ServiceId};

use crate::error::ClientResult;
use crate::notice::Notifier;
use crate::transport::ServiceApi;

/// Events per page requested by the detail view.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// What a call to [`EventPager::open`] or [`EventPager::load_more`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A page arrived and was appended.
    Loaded { count: usize, has_more: bool },
    /// Another page request is in flight, or the pager is already open.
    Skipped,
    /// The end of the history was already reached.
    Exhausted,
    /// The pager was closed before or during the request.
    Closed,
}

/// Point-in-time copy of the pager, for rendering.
#[derive(Debug, Clone, PartialEq)]
pub struct PagerSnapshot {
    pub events: Vec<ServiceEvent>,
    /// Last page appended, `None` before the first one.
    pub page: Option<usize>,
    pub has_more: bool,
    pub is_loading_more: bool,
}

#[derive(Debug, Default)]
struct PagerState {
    events: Vec<ServiceEvent>,
    page: Option<usize>,
    opened: bool,
    has_more: bool,
    is_loading_more: bool,
    closed: bool,
}

pub struct EventPager {
    api: Arc<dyn ServiceApi>,
    service_id: ServiceId,
    limit: usize,
    state: Mutex<PagerState>,
    notifier: Notifier,
}

impl EventPager {
    pub fn new(api: Arc<dyn ServiceApi>, service_id: impl Into<ServiceId>, notifier: Notifier) -> Self {
        Self::with_page_size(api, service_id, DEFAULT_PAGE_SIZE, notifier)
    }

    pub fn with_page_size(
        api: Arc<dyn ServiceApi>,
        service_id: impl Into<ServiceId>,
        limit: usize,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            service_id: service_id.into(),
            limit: limit.max(1),
            state: Mutex::new(PagerState::default()),
            notifier,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn page_size(&self) -> usize {
        self.limit
    }

    /// Seed the history with page 0.
    pub async fn open(&self) -> ClientResult<LoadOutcome> {
        {
            let mut state = self.lock();
            if state.closed {
                return Ok(LoadOutcome::Closed);
            }
            if state.opened || state.is_loading_more {
                return Ok(LoadOutcome::Skipped);
            }
            state.is_loading_more = true;
        }
        self.fetch(0, true, InFlight::new(self)).await
    }

    /// Append the next page, if allowed.
    pub async fn load_more(&self) -> ClientResult<LoadOutcome> {
        let page = {
            let mut state = self.lock();
            if state.closed {
                return Ok(LoadOutcome::Closed);
            }
            if state.is_loading_more {
                debug!(service_id = %self.service_id, "page request in flight, load skipped");
                return Ok(LoadOutcome::Skipped);
            }
            if !state.opened {
                None
            } else if !state.has_more {
                return Ok(LoadOutcome::Exhausted);
            } else {
                state.is_loading_more = true;
                Some(state.page.map_or(0, |p| p + 1))
            }
        };
        match page {
            Some(page) => self.fetch(page, false, InFlight::new(self)).await,
            None => self.open().await,
        }
    }

    /// Tear down: later results are discarded.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.is_loading_more = false;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn snapshot(&self) -> PagerSnapshot {
        let state = self.lock();
        PagerSnapshot {
            events: state.events.clone(),
            page: state.page,
            has_more: state.has_more,
            is_loading_more: state.is_loading_more,
        }
    }

    async fn fetch(
        &self,
        page: usize,
        seeding: bool,
        mut in_flight: InFlight<'_>,
    ) -> ClientResult<LoadOutcome> {
        let result = self
            .api
            .list_events(&self.service_id, page, self.limit)
            .await;

        in_flight.settle();
        let mut state = self.lock();
        if state.closed {
            debug!(service_id = %self.service_id, page, "pager closed, page discarded");
            return Ok(LoadOutcome::Closed);
        }
        state.is_loading_more = false;

        match result {
            Ok(events) => {
                let count = events.len();
                if seeding {
                    state.opened = true;
                }
                if count == 0 {
                    state.has_more = false;
                } else {
                    state.events.extend(events);
                    state.page = Some(page);
                    state.has_more = count >= self.limit;
                }
                debug!(
                    service_id = %self.service_id,
                    page,
                    count,
                    has_more = state.has_more,
                    "event page loaded"
                );
                Ok(LoadOutcome::Loaded {
                    count,
                    has_more: state.has_more,
                })
            }
            Err(e) => {
                warn!(service_id = %self.service_id, page, error = %e, "event page failed");
                self.notifier.error("Failed to load more events.");
                Err(e)
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears `is_loading_more` if a page request is dropped before it settles.
struct InFlight<'a> {
    pager: &'a EventPager,
    pending: bool,
}

impl<'a> InFlight<'a> {
    fn new(pager: &'a EventPager) -> Self {
        Self {
            pager,
            pending: true,
        }
    }

    /// The response arrived; the caller now owns the flag.
    fn settle(&mut self) {
        self.pending = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.pending {
            debug!(service_id = %self.pager.service_id, "page request abandoned");
            self.pager.lock().is_loading_more = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    use tokio::sync::Semaphore;

    use crate::error::ClientError;
    use crate::testing::MockApi;

    fn pager(api: Arc<MockApi>) -> EventPager {
        EventPager::new(api, "1", Notifier::silent())
    }

    #[tokio::test]
    async fn pages_until_short_page() {
        // Six full pages then three events.
        let api = Arc::new(MockApi::with_catalog().with_events(63));
        let pager = pager(api.clone());

        assert_eq!(
            pager.open().await.unwrap(),
            LoadOutcome::Loaded { count: 10, has_more: true }
        );
        for _ in 1..6 {
            assert_eq!(
                pager.load_more().await.unwrap(),
                LoadOutcome::Loaded { count: 10, has_more: true }
            );
        }
        assert_eq!(
            pager.load_more().await.unwrap(),
            LoadOutcome::Loaded { count: 3, has_more: false }
        );
        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(api.event_calls.load(Ordering::SeqCst), 7);

        let snap = pager.snapshot();
        assert_eq!(snap.events.len(), 63);
        assert_eq!(snap.page, Some(6));
        assert!(!snap.has_more);
        assert_eq!(snap.events[0].id, "event-1-0");
        assert_eq!(snap.events[62].id, "event-1-62");
    }

    #[tokio::test]
    async fn empty_page_ends_history() {
        let api = Arc::new(MockApi::with_catalog().with_events(20));
        let pager = pager(api.clone());
        pager.open().await.unwrap();
        pager.load_more().await.unwrap();
        // Page 2 is empty even though page 1 was full.
        assert_eq!(
            pager.load_more().await.unwrap(),
            LoadOutcome::Loaded { count: 0, has_more: false }
        );
        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Exhausted);
        assert_eq!(pager.snapshot().page, Some(1));
        assert_eq!(api.event_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn concurrent_load_more_is_a_noop() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            MockApi::with_catalog()
                .with_events(40)
                .with_events_gate(gate.clone()),
        );
        let pager = Arc::new(pager(api.clone()));

        gate.add_permits(1);
        pager.open().await.unwrap();

        let first = tokio::spawn({
            let pager = pager.clone();
            async move { pager.load_more().await }
        });
        while api.event_calls.load(Ordering::SeqCst) < 2 {
            tokio::task::yield_now().await;
        }
        assert!(pager.snapshot().is_loading_more);
        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Skipped);

        gate.add_permits(1);
        assert_eq!(
            first.await.unwrap().unwrap(),
            LoadOutcome::Loaded { count: 10, has_more: true }
        );
        assert_eq!(api.event_calls.load(Ordering::SeqCst), 2);
        assert_eq!(pager.snapshot().events.len(), 20);
    }

    #[tokio::test]
    async fn failure_keeps_cursor_and_clears_guard() {
        let api = Arc::new(MockApi::with_catalog().with_events(30));
        let (notifier, mut notices) = Notifier::channel();
        let pager = EventPager::new(api.clone(), "1", notifier);
        pager.open().await.unwrap();

        api.fail.store(true, Ordering::SeqCst);
        assert!(matches!(
            pager.load_more().await,
            Err(ClientError::Transport(_))
        ));
        let snap = pager.snapshot();
        assert_eq!(snap.page, Some(0));
        assert_eq!(snap.events.len(), 10);
        assert!(!snap.is_loading_more);
        assert_eq!(notices.recv().await.unwrap().message, "Failed to load more events.");

        api.fail.store(false, Ordering::SeqCst);
        assert_eq!(
            pager.load_more().await.unwrap(),
            LoadOutcome::Loaded { count: 10, has_more: true }
        );
        assert_eq!(pager.snapshot().page, Some(1));
    }

    #[tokio::test]
    async fn closed_pager_ignores_late_page() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            MockApi::with_catalog()
                .with_events(30)
                .with_events_gate(gate.clone()),
        );
        let pager = Arc::new(pager(api.clone()));

        let opening = tokio::spawn({
            let pager = pager.clone();
            async move { pager.open().await }
        });
        while api.event_calls.load(Ordering::SeqCst) < 1 {
            tokio::task::yield_now().await;
        }
        pager.close();
        gate.add_permits(1);

        assert_eq!(opening.await.unwrap().unwrap(), LoadOutcome::Closed);
        assert!(pager.snapshot().events.is_empty());
        assert_eq!(pager.load_more().await.unwrap(), LoadOutcome::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_load_releases_the_guard() {
        let gate = Arc::new(Semaphore::new(0));
        let api = Arc::new(
            MockApi::with_catalog()
                .with_events(30)
                .with_events_gate(gate.clone()),
        );
        let pager = pager(api.clone());
        gate.add_permits(1);
        pager.open().await.unwrap();

        let abandoned =
            tokio::time::timeout(std::time::Duration::from_millis(50), pager.load_more()).await;
        assert!(abandoned.is_err());
        assert!(!pager.snapshot().is_loading_more);

        gate.add_permits(1);
        assert_eq!(
            pager.load_more().await.unwrap(),
            LoadOutcome::Loaded { count: 10, has_more: true }
        );
        assert_eq!(pager.snapshot().page, Some(1));
        assert_eq!(api.event_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn load_more_before_open_seeds_first_page() {
        let api = Arc::new(MockApi::with_catalog().with_events(5));
        let pager = pager(api);
        assert_eq!(
            pager.load_more().await.unwrap(),
            LoadOutcome::Loaded { count: 5, has_more: false }
        );
        assert_eq!(pager.open().await.unwrap(), LoadOutcome::Skipped);
    }

    #[tokio::test]
    async fn unknown_service_has_no_history() {
        let api = Arc::new(MockApi::with_catalog().with_events(30));
        let pager = EventPager::new(api, "99", Notifier::silent());
        let err = pager.open().await.unwrap_err();
        assert!(matches!(err, ClientError::NotFound(_)));
        let snap = pager.snapshot();
        assert!(snap.events.is_empty());
        assert_eq!(snap.page, None);
        assert!(!snap.is_loading_more);
    }
}

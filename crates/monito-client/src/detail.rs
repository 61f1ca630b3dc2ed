//! The service detail view: its own poll of one service plus the event history.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

use monito_state::{Service, ServiceId};

use crate::driver::{Fetcher, QueryDriver};
use crate::error::ClientResult;
use crate::notice::Notifier;
use crate::pager::{DEFAULT_PAGE_SIZE, EventPager, LoadOutcome};
use crate::query::{QuerySnapshot, RefreshTrigger};
use crate::transport::ServiceApi;

/// Poll period of the detail view, independent of the list.
pub const DEFAULT_DETAIL_POLL_INTERVAL: Duration = Duration::from_secs(10);

pub struct ServiceDetail {
    service_id: ServiceId,
    query: QueryDriver<Service>,
    events: Arc<EventPager>,
}

impl ServiceDetail {
    /// Start polling `service_id` and seed the first page of events.
    ///
    /// A failed first page leaves the pager unopened; the next
    /// [`load_more_events`](Self::load_more_events) retries it.
    pub async fn open(
        api: Arc<dyn ServiceApi>,
        service_id: impl Into<ServiceId>,
        notifier: Notifier,
    ) -> Self {
        Self::open_with(
            api,
            service_id,
            DEFAULT_DETAIL_POLL_INTERVAL,
            DEFAULT_PAGE_SIZE,
            notifier,
        )
        .await
    }

    pub async fn open_with(
        api: Arc<dyn ServiceApi>,
        service_id: impl Into<ServiceId>,
        poll_interval: Duration,
        page_size: usize,
        notifier: Notifier,
    ) -> Self {
        let service_id = service_id.into();

        let fetch_api = api.clone();
        let fetch_id = service_id.clone();
        let fetch: Fetcher<Service> = Arc::new(move || {
            let api = fetch_api.clone();
            let id = fetch_id.clone();
            Box::pin(async move { api.get_service(&id).await })
        });
        let query = QueryDriver::spawn(
            format!("service {service_id}"),
            fetch,
            poll_interval,
            notifier.clone(),
        );

        let events = Arc::new(EventPager::with_page_size(
            api,
            service_id.clone(),
            page_size,
            notifier,
        ));
        let detail = Self {
            service_id,
            query,
            events,
        };
        if let Err(e) = detail.events.open().await {
            debug!(service_id = %detail.service_id, error = %e, "first event page deferred");
        }
        detail
    }

    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    pub fn snapshot(&self) -> QuerySnapshot<Service> {
        self.query.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuerySnapshot<Service>> {
        self.query.subscribe()
    }

    pub fn refresh(&self) {
        self.query.refresh(RefreshTrigger::Manual);
    }

    pub fn focus_regained(&self) {
        self.query.refresh(RefreshTrigger::Focus);
    }

    pub fn events(&self) -> &Arc<EventPager> {
        &self.events
    }

    /// The scroll sentinel came into view.
    pub async fn load_more_events(&self) -> ClientResult<LoadOutcome> {
        self.events.load_more().await
    }

    /// Navigate away: stop polling and drop pending pages.
    pub async fn close(self) {
        self.events.close();
        self.query.shutdown().await;
    }
}

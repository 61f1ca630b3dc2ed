//! The dashboard's service list: a polled query plus the CRUD mutations.

use std::sync::Arc;
use std::time::Duration;

use monito_state::{Service, ServiceDraft, ServicePatch};

use crate::driver::{Fetcher, Mutation, QueryDriver};
use crate::filter::{ServiceFilters, filter_services};
use crate::notice::Notifier;
use crate::query::{QuerySnapshot, RefreshTrigger};
use crate::transport::ServiceApi;

/// Poll period of the list view.
pub const DEFAULT_LIST_POLL_INTERVAL: Duration = Duration::from_secs(15);

pub type ServiceListSnapshot = QuerySnapshot<Vec<Service>>;

impl QuerySnapshot<Vec<Service>> {
    /// Last fetched list, empty before the first success.
    pub fn services(&self) -> &[Service] {
        self.data.as_deref().unwrap_or_default()
    }

    /// What the table shows under `filters`.
    pub fn filtered(&self, filters: &ServiceFilters) -> Vec<Service> {
        filter_services(self.services(), filters)
    }
}

pub struct ServiceListQuery {
    api: Arc<dyn ServiceApi>,
    driver: QueryDriver<Vec<Service>>,
    notifier: Notifier,
}

impl ServiceListQuery {
    pub fn spawn(api: Arc<dyn ServiceApi>, notifier: Notifier) -> Self {
        Self::with_interval(api, DEFAULT_LIST_POLL_INTERVAL, notifier)
    }

    pub fn with_interval(
        api: Arc<dyn ServiceApi>,
        poll_interval: Duration,
        notifier: Notifier,
    ) -> Self {
        let fetch_api = api.clone();
        let fetch: Fetcher<Vec<Service>> = Arc::new(move || {
            let api = fetch_api.clone();
            Box::pin(async move { api.list_services().await })
        });
        let driver = QueryDriver::spawn("services", fetch, poll_interval, notifier.clone());
        Self {
            api,
            driver,
            notifier,
        }
    }

    pub fn snapshot(&self) -> ServiceListSnapshot {
        self.driver.snapshot()
    }

    pub fn subscribe(&self) -> tokio::sync::watch::Receiver<ServiceListSnapshot> {
        self.driver.subscribe()
    }

    /// The refresh button.
    pub fn refresh(&self) {
        self.notifier.info("Services list updated with latest status.");
        self.driver.refresh(RefreshTrigger::Manual);
    }

    /// The window came back to the foreground.
    pub fn focus_regained(&self) {
        self.driver.refresh(RefreshTrigger::Focus);
    }

    pub fn create(&self, draft: ServiceDraft) {
        let api = self.api.clone();
        self.driver.mutate(Mutation::new(
            "Service created successfully.",
            "Failed to create service. Please try again.",
            Box::pin(async move { api.create_service(&draft).await.map(|_| ()) }),
        ));
    }

    pub fn update(&self, id: impl Into<String>, patch: ServicePatch) {
        let api = self.api.clone();
        let id = id.into();
        self.driver.mutate(Mutation::new(
            "Service updated successfully.",
            "Failed to update service. Please try again.",
            Box::pin(async move { api.update_service(&id, &patch).await.map(|_| ()) }),
        ));
    }

    pub fn delete(&self, id: impl Into<String>) {
        let api = self.api.clone();
        let id = id.into();
        self.driver.mutate(Mutation::new(
            "The service has been successfully removed.",
            "Failed to delete service. Please try again.",
            Box::pin(async move { api.delete_service(&id).await }),
        ));
    }

    pub async fn shutdown(self) {
        self.driver.shutdown().await;
    }
}

//! In-memory `ServiceApi` used by the unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Semaphore;

use monito_state::{
    Service, ServiceDraft, ServiceEvent, ServicePatch, ServiceStatus, ServiceType,
};

use crate::error::{ClientError, ClientResult};
use crate::transport::{BoxFuture, ServiceApi};

pub(crate) struct MockApi {
    services: Mutex<Vec<Service>>,
    next_id: AtomicUsize,
    /// Every call fails with a transport error while set.
    pub fail: AtomicBool,
    /// Only the events route fails while set.
    pub fail_events: AtomicBool,
    pub list_calls: AtomicUsize,
    pub get_calls: AtomicUsize,
    pub event_calls: AtomicUsize,
    total_events: usize,
    /// When set, each events call waits for one permit.
    events_gate: Option<Arc<Semaphore>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            services: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            fail: AtomicBool::new(false),
            fail_events: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            get_calls: AtomicUsize::new(0),
            event_calls: AtomicUsize::new(0),
            total_events: 0,
            events_gate: None,
        }
    }

    /// Three services: one of each status.
    pub fn with_catalog() -> Self {
        let api = Self::new();
        for (name, kind, status) in [
            ("API Gateway", ServiceType::Api, ServiceStatus::Online),
            ("Message Queue", ServiceType::Queue, ServiceStatus::Degraded),
            ("Payment API", ServiceType::Api, ServiceStatus::Offline),
        ] {
            api.insert(ServiceDraft::new(name, kind, status)).unwrap();
        }
        api
    }

    pub fn with_events(mut self, total: usize) -> Self {
        self.total_events = total;
        self
    }

    pub fn with_events_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.events_gate = Some(gate);
        self
    }

    fn insert(&self, draft: ServiceDraft) -> ClientResult<Service> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        let service = draft
            .into_service(id, Utc::now())
            .map_err(|e| ClientError::Validation(e.to_string()))?;
        self.services.lock().unwrap().push(service.clone());
        Ok(service)
    }

    fn check(&self) -> ClientResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            Err(ClientError::Transport("connection refused".into()))
        } else {
            Ok(())
        }
    }

    fn events(&self, id: &str, page: usize, limit: usize) -> Vec<ServiceEvent> {
        let start = (page * limit).min(self.total_events);
        let end = (start + limit).min(self.total_events);
        let now = Utc::now();
        (start..end)
            .map(|i| ServiceEvent {
                id: format!("event-{id}-{i}"),
                service_id: id.to_string(),
                timestamp: now - ChronoDuration::minutes(i as i64),
                status: ServiceStatus::Online,
                message: "Service is operating normally".into(),
                details: None,
            })
            .collect()
    }
}

impl ServiceApi for MockApi {
    fn list_services(&self) -> BoxFuture<'_, ClientResult<Vec<Service>>> {
        Box::pin(async move {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            Ok(self.services.lock().unwrap().clone())
        })
    }

    fn get_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            self.get_calls.fetch_add(1, Ordering::SeqCst);
            self.check()?;
            self.services
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == id)
                .cloned()
                .ok_or_else(|| ClientError::NotFound("Service not found".into()))
        })
    }

    fn create_service<'a>(
        &'a self,
        draft: &'a ServiceDraft,
    ) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            self.check()?;
            self.insert(draft.clone())
        })
    }

    fn update_service<'a>(
        &'a self,
        id: &'a str,
        patch: &'a ServicePatch,
    ) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            self.check()?;
            patch
                .validate()
                .map_err(|e| ClientError::Validation(e.to_string()))?;
            let mut services = self.services.lock().unwrap();
            let service = services
                .iter_mut()
                .find(|s| s.id == id)
                .ok_or_else(|| ClientError::NotFound("Service not found".into()))?;
            patch.clone().apply(service, Utc::now());
            Ok(service.clone())
        })
    }

    fn delete_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(async move {
            self.check()?;
            let mut services = self.services.lock().unwrap();
            let before = services.len();
            services.retain(|s| s.id != id);
            if services.len() == before {
                return Err(ClientError::NotFound("Service not found".into()));
            }
            Ok(())
        })
    }

    fn list_events<'a>(
        &'a self,
        id: &'a str,
        page: usize,
        limit: usize,
    ) -> BoxFuture<'a, ClientResult<Vec<ServiceEvent>>> {
        Box::pin(async move {
            self.event_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.events_gate {
                gate.acquire().await.unwrap().forget();
            }
            self.check()?;
            if self.fail_events.load(Ordering::SeqCst) {
                return Err(ClientError::Transport("events backend timeout".into()));
            }
            if !self.services.lock().unwrap().iter().any(|s| s.id == id) {
                return Err(ClientError::NotFound("Not found".into()));
            }
            Ok(self.events(id, page, limit))
        })
    }
}

//! monito-api — REST API for the MonitoCorp status dashboard.
//!
//! Serves the service catalog through the status simulator and the
//! per-service event history. Every route is mounted both at the root and
//! under `/api` (the path the dashboard front end calls).
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/services` | List services (simulated view) |
//! | POST | `/services` | Create a service |
//! | GET | `/services/{id}` | Get one service (simulated view) |
//! | PUT | `/services/{id}` | Merge a partial update |
//! | DELETE | `/services/{id}` | Delete a service |
//! | GET | `/services/{id}/events?page&limit` | Page through event history |
//! | GET | `/healthz` | Liveness |

pub mod handlers;
pub mod latency;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use monito_sim::{EventLog, Simulator};
use monito_state::ServiceRepository;

pub use latency::Latency;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<dyn ServiceRepository>,
    pub simulator: Arc<Simulator>,
    pub events: Arc<EventLog>,
    pub latency: Latency,
}

impl ApiState {
    /// State over `store` with OS-seeded randomness and no artificial latency.
    pub fn new(store: impl ServiceRepository + 'static) -> Self {
        Self {
            store: Arc::new(store),
            simulator: Arc::new(Simulator::new()),
            events: Arc::new(EventLog::new()),
            latency: Latency::DISABLED,
        }
    }

    pub fn with_simulator(mut self, simulator: Simulator) -> Self {
        self.simulator = Arc::new(simulator);
        self
    }

    pub fn with_events(mut self, events: EventLog) -> Self {
        self.events = Arc::new(events);
        self
    }

    pub fn with_latency(mut self, latency: Latency) -> Self {
        self.latency = latency;
        self
    }
}

/// Build the complete API router.
pub fn build_router(state: ApiState) -> Router {
    let service_routes = Router::new()
        .route(
            "/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/services/",
            get(handlers::missing_id)
                .put(handlers::missing_id)
                .delete(handlers::missing_id),
        )
        .route(
            "/services/{id}",
            get(handlers::get_service)
                .put(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .route("/services/{id}/events", get(handlers::list_events))
        .with_state(state);

    Router::new()
        .merge(service_routes.clone())
        .nest("/api", service_routes)
        .route("/healthz", get(handlers::healthz))
}

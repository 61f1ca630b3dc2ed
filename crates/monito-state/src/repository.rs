//! Storage seam for service records.

use crate::error::StateResult;
use crate::types::{Service, ServiceDraft, ServicePatch};

/// CRUD over the service catalog.
///
/// Handlers and tests depend on this trait rather than on [`crate::StateStore`],
/// so the in-memory store can be swapped for a persistent one. Records come
/// back exactly as stored: `response_time` is always `None` and no status
/// simulation has been applied.
pub trait ServiceRepository: Send + Sync {
    /// All services in creation order.
    fn list_services(&self) -> StateResult<Vec<Service>>;

    /// Exact match on id. Unknown ids yield `StateError::NotFound`.
    fn get_service(&self, id: &str) -> StateResult<Service>;

    /// Assign a fresh id, stamp `last_checked`, set the initial uptime and
    /// append the record.
    fn create_service(&self, draft: ServiceDraft) -> StateResult<Service>;

    /// Merge `patch` over the stored record and refresh `last_checked`.
    fn update_service(&self, id: &str, patch: ServicePatch) -> StateResult<Service>;

    fn delete_service(&self, id: &str) -> StateResult<()>;
}

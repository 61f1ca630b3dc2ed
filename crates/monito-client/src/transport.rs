//! Transport seam between the data layer and the service API.

use std::future::Future;
use std::pin::Pin;

use monito_state::{Service, ServiceDraft, ServiceEvent, ServicePatch};

use crate::error::ClientResult;

/// Boxed `Send` future returned by [`ServiceApi`] methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Request/response surface of the service API.
pub trait ServiceApi: Send + Sync {
    /// `GET /services`
    fn list_services(&self) -> BoxFuture<'_, ClientResult<Vec<Service>>>;

    /// `GET /services/{id}`
    fn get_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<Service>>;

    /// `POST /services`
    fn create_service<'a>(&'a self, draft: &'a ServiceDraft)
    -> BoxFuture<'a, ClientResult<Service>>;

    /// `PUT /services/{id}`
    fn update_service<'a>(
        &'a self,
        id: &'a str,
        patch: &'a ServicePatch,
    ) -> BoxFuture<'a, ClientResult<Service>>;

    /// `DELETE /services/{id}`
    fn delete_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<()>>;

    /// `GET /services/{id}/events?page&limit`
    fn list_events<'a>(
        &'a self,
        id: &'a str,
        page: usize,
        limit: usize,
    ) -> BoxFuture<'a, ClientResult<Vec<ServiceEvent>>>;
}

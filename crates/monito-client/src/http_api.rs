//! HTTP implementation of [`ServiceApi`] over a hyper HTTP/1 connection.
//!
//! Opens one connection per request, like a browser fetch without keep-alive.
//! Status codes map onto [`ClientError`]: 400 → `Validation`, 404 →
//! `NotFound`, anything else non-2xx → `Transport`.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request, StatusCode, Uri};
use http_body_util::{BodyExt, Full};
use serde::de::DeserializeOwned;
use tracing::debug;

use monito_state::{Service, ServiceDraft, ServiceEvent, ServicePatch};

use crate::error::{ClientError, ClientResult};
use crate::transport::{BoxFuture, ServiceApi};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Service API client speaking JSON over HTTP.
#[derive(Debug, Clone)]
pub struct HttpServiceApi {
    /// `host:port` to connect to.
    address: String,
    /// Path prefix in front of `/services`, without trailing slash.
    base_path: String,
    timeout: Duration,
}

impl HttpServiceApi {
    /// Client for a server at `address` (`host:port`), routes at the root.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            base_path: String::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Parse `http://host[:port][/prefix]`.
    pub fn from_url(url: &str) -> ClientResult<Self> {
        let uri: Uri = url
            .parse()
            .map_err(|e| ClientError::Validation(format!("invalid server url {url}: {e}")))?;
        if uri.scheme_str() != Some("http") {
            return Err(ClientError::Validation(format!(
                "unsupported scheme in {url}, expected http"
            )));
        }
        let authority = uri
            .authority()
            .ok_or_else(|| ClientError::Validation(format!("missing host in {url}")))?;
        let address = format!("{}:{}", authority.host(), authority.port_u16().unwrap_or(80));
        Ok(Self::new(address).with_base_path(uri.path()))
    }

    pub fn with_base_path(mut self, base_path: &str) -> Self {
        self.base_path = base_path.trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Perform one exchange and decode a JSON response.
    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<T> {
        let (status, bytes) = self.exchange(method, path, body).await?;
        decode(status, &bytes)
    }

    async fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> ClientResult<(StatusCode, Bytes)> {
        let uri = format!("{}{}", self.base_path, path);

        let result = tokio::time::timeout(self.timeout, async {
            let stream = tokio::net::TcpStream::connect(&self.address)
                .await
                .map_err(|e| ClientError::Transport(format!("connect {}: {e}", self.address)))?;

            let io = hyper_util::rt::TokioIo::new(stream);
            let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
                .await
                .map_err(ClientError::transport)?;

            // Drive the connection in the background.
            tokio::spawn(async move {
                if let Err(e) = conn.await {
                    debug!(error = %e, "api connection closed with error");
                }
            });

            let mut builder = Request::builder()
                .method(method.clone())
                .uri(&uri)
                .header(HOST, &self.address)
                .header(USER_AGENT, "monito-client/0.1");
            let payload = match body {
                Some(bytes) => {
                    builder = builder.header(CONTENT_TYPE, "application/json");
                    Full::new(Bytes::from(bytes))
                }
                None => Full::new(Bytes::new()),
            };
            let req = builder.body(payload).map_err(ClientError::transport)?;

            let resp = sender.send_request(req).await.map_err(ClientError::transport)?;
            let status = resp.status();
            let bytes = resp
                .into_body()
                .collect()
                .await
                .map_err(ClientError::transport)?
                .to_bytes();
            Ok((status, bytes))
        })
        .await;

        match result {
            Ok(exchange) => {
                if let Ok((status, _)) = &exchange {
                    debug!(%method, %uri, %status, "api call");
                }
                exchange
            }
            Err(_) => {
                debug!(%method, %uri, "api call timed out");
                Err(ClientError::Transport(format!(
                    "{method} {uri} timed out after {:?}",
                    self.timeout
                )))
            }
        }
    }
}

/// Turn a status + body into a typed result.
fn decode<T: DeserializeOwned>(status: StatusCode, bytes: &[u8]) -> ClientResult<T> {
    if status.is_success() {
        return serde_json::from_slice(bytes)
            .map_err(|e| ClientError::Transport(format!("invalid response body: {e}")));
    }
    let message = serde_json::from_slice::<serde_json::Value>(bytes)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or_else(|| status.to_string());
    Err(match status {
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        _ => ClientError::Transport(format!("{status}: {message}")),
    })
}

fn to_json<T: serde::Serialize>(value: &T) -> ClientResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(ClientError::transport)
}

impl ServiceApi for HttpServiceApi {
    fn list_services(&self) -> BoxFuture<'_, ClientResult<Vec<Service>>> {
        Box::pin(self.call(Method::GET, "/services", None))
    }

    fn get_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            self.call(Method::GET, &format!("/services/{id}"), None)
                .await
        })
    }

    fn create_service<'a>(
        &'a self,
        draft: &'a ServiceDraft,
    ) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            let body = to_json(draft)?;
            self.call(Method::POST, "/services", Some(body)).await
        })
    }

    fn update_service<'a>(
        &'a self,
        id: &'a str,
        patch: &'a ServicePatch,
    ) -> BoxFuture<'a, ClientResult<Service>> {
        Box::pin(async move {
            let body = to_json(patch)?;
            self.call(Method::PUT, &format!("/services/{id}"), Some(body))
                .await
        })
    }

    fn delete_service<'a>(&'a self, id: &'a str) -> BoxFuture<'a, ClientResult<()>> {
        Box::pin(async move {
            let _: serde_json::Value = self
                .call(Method::DELETE, &format!("/services/{id}"), None)
                .await?;
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
            let path = format!("/services/{id}/events?page={page}&limit={limit}");
            self.call(Method::GET, &path, None).await
        })
    }
}

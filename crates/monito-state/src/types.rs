//! Domain types for the service store.
//!
//! These types are shared by the store, the HTTP surface and the client.
//! Field names serialize in camelCase to match the dashboard's JSON wire
//! format (`lastChecked`, `responseTime`, `serviceId`).

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{StateError, StateResult};

/// Opaque, process-unique identifier of a service.
pub type ServiceId = String;

/// Uptime percentage assigned to every newly created service.
pub const INITIAL_UPTIME: f64 = 100.0;

// ── Enums ─────────────────────────────────────────────────────────

/// Kind of monitored unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceType {
    #[serde(rename = "API")]
    Api,
    Database,
    Queue,
    Cache,
    Storage,
}

impl ServiceType {
    pub const ALL: [ServiceType; 5] = [
        ServiceType::Api,
        ServiceType::Database,
        ServiceType::Queue,
        ServiceType::Cache,
        ServiceType::Storage,
    ];

    /// Display name, identical to the wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Api => "API",
            ServiceType::Database => "Database",
            ServiceType::Queue => "Queue",
            ServiceType::Cache => "Cache",
            ServiceType::Storage => "Storage",
        }
    }
}

/// Health status of a service or event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceStatus {
    Online,
    Degraded,
    Offline,
}

impl ServiceStatus {
    pub const ALL: [ServiceStatus; 3] = [
        ServiceStatus::Online,
        ServiceStatus::Degraded,
        ServiceStatus::Offline,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Online => "Online",
            ServiceStatus::Degraded => "Degraded",
            ServiceStatus::Offline => "Offline",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceType {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceType::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StateError::Validation(format!("unknown service type: {s}")))
    }
}

impl FromStr for ServiceStatus {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| StateError::Validation(format!("unknown service status: {s}")))
    }
}

// ── Service ───────────────────────────────────────────────────────

/// A monitored service as stored and served.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: ServiceId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ServiceType,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub last_checked: DateTime<Utc>,
    /// Uptime percentage. Fixed at creation, never recomputed.
    pub uptime: f64,
    /// Milliseconds. Filled per read by the simulator, never stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_time: Option<u32>,
}

/// Body of a create request.
///
/// Required fields are optional here so that a missing field surfaces as a
/// [`StateError::Validation`] instead of an opaque decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServiceDraft {
    /// Convenience constructor with all required fields set.
    pub fn new(name: impl Into<String>, kind: ServiceType, status: ServiceStatus) -> Self {
        Self {
            name: Some(name.into()),
            kind: Some(kind),
            status: Some(status),
            url: None,
            description: None,
        }
    }

    /// Validate the draft and build the record to store.
    pub fn into_service(self, id: ServiceId, now: DateTime<Utc>) -> StateResult<Service> {
        let name = self
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| StateError::Validation("name is required".to_string()))?
            .to_string();
        let kind = self
            .kind
            .ok_or_else(|| StateError::Validation("type is required".to_string()))?;
        let status = self
            .status
            .ok_or_else(|| StateError::Validation("status is required".to_string()))?;

        Ok(Service {
            id,
            name,
            kind,
            status,
            url: normalize(self.url),
            description: normalize(self.description),
            last_checked: now,
            uptime: INITIAL_UPTIME,
            response_time: None,
        })
    }
}

/// Body of an update request. Absent fields are left untouched.
///
/// `id`, `uptime` and `lastChecked` are not patchable; unknown JSON fields
/// (including those) are ignored on decode.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServicePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<ServiceType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ServiceStatus>,
    /// A blank string clears the url.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// A blank string clears the description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ServicePatch {
    /// Patch that only changes the status.
    pub fn status(status: ServiceStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> StateResult<()> {
        match self.name.as_deref() {
            Some(name) if name.trim().is_empty() => {
                Err(StateError::Validation("name must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Merge the patch over `service` and refresh `last_checked`.
    pub fn apply(self, service: &mut Service, now: DateTime<Utc>) {
        if let Some(name) = self.name {
            service.name = name.trim().to_string();
        }
        if let Some(kind) = self.kind {
            service.kind = kind;
        }
        if let Some(status) = self.status {
            service.status = status;
        }
        if self.url.is_some() {
            service.url = normalize(self.url);
        }
        if self.description.is_some() {
            service.description = normalize(self.description);
        }
        service.last_checked = now;
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Events ────────────────────────────────────────────────────────

/// A synthesized status-change record. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEvent {
    pub id: String,
    pub service_id: ServiceId,
    pub timestamp: DateTime<Utc>,
    pub status: ServiceStatus,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

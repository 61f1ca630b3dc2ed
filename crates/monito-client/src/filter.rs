//! Client-side projection of the service list: status filter plus free-text search.
//!
//! Filtering never touches the cached list, it only decides what is shown.

use std::str::FromStr;

use monito_state::{Service, ServiceStatus, StateError};

/// Status selector; `All` disables the predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Only(ServiceStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: ServiceStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = StateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(StatusFilter::All);
        }
        s.parse().map(StatusFilter::Only)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceFilters {
    pub status: StatusFilter,
    pub search: String,
}

impl ServiceFilters {
    pub fn new(status: StatusFilter, search: impl Into<String>) -> Self {
        Self {
            status,
            search: search.into(),
        }
    }

    /// Case-insensitive substring match on name or type, AND the status filter.
    pub fn matches(&self, service: &Service) -> bool {
        if !self.status.matches(service.status) {
            return false;
        }
        let needle = self.search.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        service.name.to_lowercase().contains(&needle)
            || service.kind.as_str().to_lowercase().contains(&needle)
    }
}

/// Services passing `filters`, in list order.
pub fn filter_services(services: &[Service], filters: &ServiceFilters) -> Vec<Service> {
    services
        .iter()
        .filter(|s| filters.matches(s))
        .cloned()
        .collect()
}

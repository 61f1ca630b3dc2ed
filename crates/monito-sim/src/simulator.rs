//! Status simulator — view-level noise over stored service records.
//!
//! Applied on every read. Nothing here writes back to the store: a flapped
//! status and the response time exist only in the returned copy.

use std::ops::RangeInclusive;
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use monito_state::{Service, ServiceStatus};

/// Chance that a read shows a freshly drawn status instead of the stored one.
pub const FLAP_PROBABILITY: f64 = 0.1;

/// Response times reported for reachable services, in milliseconds.
pub const RESPONSE_TIME_MS: RangeInclusive<u32> = 50..=549;

/// Weighted status pool: 4/6 Online, 1/6 Degraded, 1/6 Offline.
const STATUS_WEIGHTS: [ServiceStatus; 6] = [
    ServiceStatus::Online,
    ServiceStatus::Online,
    ServiceStatus::Online,
    ServiceStatus::Online,
    ServiceStatus::Degraded,
    ServiceStatus::Offline,
];

/// Draw a status from the Online-heavy distribution.
pub fn random_status<R: Rng + ?Sized>(rng: &mut R) -> ServiceStatus {
    STATUS_WEIGHTS[rng.random_range(0..STATUS_WEIGHTS.len())]
}

/// Produce the observed view of `service` at `now`.
///
/// `response_time` is present iff the displayed status is not Offline.
pub fn simulate<R: Rng + ?Sized>(rng: &mut R, service: Service, now: DateTime<Utc>) -> Service {
    let status = if rng.random_bool(FLAP_PROBABILITY) {
        random_status(rng)
    } else {
        service.status
    };
    let response_time = match status {
        ServiceStatus::Offline => None,
        _ => Some(rng.random_range(RESPONSE_TIME_MS)),
    };
    Service {
        status,
        response_time,
        last_checked: now,
        ..service
    }
}

/// Shareable simulator owning its random source.
pub struct Simulator {
    rng: Mutex<StdRng>,
    flapping: bool,
}

impl Simulator {
    /// Simulator seeded from the OS.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
            flapping: true,
        }
    }

    /// Deterministic simulator for tests.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            flapping: true,
        }
    }

    /// Disable status flapping. Response times and `last_checked` are still
    /// filled in, so reads reflect the stored status exactly.
    pub fn without_flapping(mut self) -> Self {
        self.flapping = false;
        self
    }

    /// Observe a single service.
    pub fn observe(&self, service: Service) -> Service {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        self.observe_with(&mut *rng, service, Utc::now())
    }

    /// Observe a whole list with one timestamp.
    pub fn observe_all(&self, services: Vec<Service>) -> Vec<Service> {
        let now = Utc::now();
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        services
            .into_iter()
            .map(|svc| self.observe_with(&mut *rng, svc, now))
            .collect()
    }

    fn observe_with(&self, rng: &mut StdRng, service: Service, now: DateTime<Utc>) -> Service {
        if self.flapping {
            return simulate(rng, service, now);
        }
        let response_time = match service.status {
            ServiceStatus::Offline => None,
            _ => Some(rng.random_range(RESPONSE_TIME_MS)),
        };
        Service {
            response_time,
            last_checked: now,
            ..service
        }
    }
}

impl Default for Simulator {
    fn default() -> Self {
        Self::new()
    }
}

//! Synthetic status-change history.
//!
//! [`generate_events`] is the stateless generator: every call fabricates a
//! fresh 50-event batch and slices one page out of it, so two calls for the
//! same page disagree. [`EventLog`] builds each service's batch once and
//! pages over that stable sequence, which is what the HTTP surface serves.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use monito_state::{ServiceEvent, ServiceId, ServiceStatus};

/// Events fabricated per service.
pub const EVENT_POOL_SIZE: usize = 50;

/// Probability that an event carries `details`.
const DETAILS_PROBABILITY: f64 = 0.3;

const DETAILS: &str = "Additional diagnostic information available";

/// Largest spacing between consecutive events, in minutes.
const MAX_SPACING_MINUTES: f64 = 60.0;

fn messages(status: ServiceStatus) -> &'static [&'static str] {
    match status {
        ServiceStatus::Online => &[
            "Service restored",
            "Health check passed",
            "All systems operational",
        ],
        ServiceStatus::Degraded => &[
            "High response time detected",
            "Partial outage reported",
            "Performance issues detected",
        ],
        ServiceStatus::Offline => &[
            "Service unavailable",
            "Connection timeout",
            "Health check failed",
        ],
    }
}

/// Fabricate a full batch for `service_id`, newest first.
///
/// Event `i` is stamped `now - i * U(0, 60)` minutes. The jitter means
/// construction order is not timestamp order, so the batch is re-sorted;
/// the sort is stable, so equal timestamps keep construction order.
/// `base_index` only feeds the event ids.
pub fn generate_pool<R: Rng + ?Sized>(
    rng: &mut R,
    service_id: &str,
    base_index: usize,
    now: DateTime<Utc>,
) -> Vec<ServiceEvent> {
    let stamp = now.timestamp_millis();
    let mut events: Vec<ServiceEvent> = (0..EVENT_POOL_SIZE)
        .map(|i| {
            let status = ServiceStatus::ALL[rng.random_range(0..ServiceStatus::ALL.len())];
            let options = messages(status);
            let message = options[rng.random_range(0..options.len())];
            let spacing = rng.random::<f64>() * MAX_SPACING_MINUTES;
            let offset_ms = (i as f64 * spacing * 60_000.0) as i64;
            let details = rng
                .random_bool(DETAILS_PROBABILITY)
                .then(|| DETAILS.to_string());
            ServiceEvent {
                id: format!(
                    "event-{service_id}-{}-{stamp}-{}",
                    base_index + i,
                    rng.random_range(0..10_000u32)
                ),
                service_id: service_id.to_string(),
                timestamp: now - Duration::milliseconds(offset_ms),
                status,
                message: message.to_string(),
                details,
            }
        })
        .collect();
    events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    events
}

/// Regenerate a batch and return page `page` of it.
///
/// Returns at most `limit` events; fewer (possibly none) once the window
/// `[page*limit, page*limit + limit)` runs past the batch.
pub fn generate_events<R: Rng + ?Sized>(
    rng: &mut R,
    service_id: &str,
    page: usize,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<ServiceEvent> {
    let base = page.saturating_mul(limit);
    let pool = generate_pool(rng, service_id, base, now);
    slice_page(&pool, page, limit)
}

fn slice_page(pool: &[ServiceEvent], page: usize, limit: usize) -> Vec<ServiceEvent> {
    let start = page.saturating_mul(limit).min(pool.len());
    let end = start.saturating_add(limit).min(pool.len());
    pool[start..end].to_vec()
}

struct LogInner {
    rng: StdRng,
    pools: HashMap<ServiceId, Arc<[ServiceEvent]>>,
}

/// Per-service stable event history.
///
/// The first request for a service fabricates its batch; later requests page
/// over the same events, so page `n` is identical across calls and a short
/// page reliably marks the end.
pub struct EventLog {
    inner: Mutex<LogInner>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic log for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            inner: Mutex::new(LogInner {
                rng,
                pools: HashMap::new(),
            }),
        }
    }

    /// Page `page` (zero-based) of `limit` events for `service_id`.
    pub fn page(&self, service_id: &str, page: usize, limit: usize) -> Vec<ServiceEvent> {
        let pool = self.pool(service_id);
        slice_page(&pool, page, limit)
    }

    /// Drop a service's history. Returns whether one existed.
    pub fn forget(&self, service_id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let existed = inner.pools.remove(service_id).is_some();
        if existed {
            debug!(%service_id, "event history dropped");
        }
        existed
    }

    /// Number of services with a generated history.
    pub fn tracked(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.pools.len()
    }

    fn pool(&self, service_id: &str) -> Arc<[ServiceEvent]> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(pool) = inner.pools.get(service_id) {
            return Arc::clone(pool);
        }
        let pool: Arc<[ServiceEvent]> =
            generate_pool(&mut inner.rng, service_id, 0, Utc::now()).into();
        inner
            .pools
            .insert(service_id.to_string(), Arc::clone(&pool));
        debug!(%service_id, events = pool.len(), "event history generated");
        pool
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

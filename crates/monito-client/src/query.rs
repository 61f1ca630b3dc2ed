//! Refresh state machine shared by every dashboard query.
//!
//! ```text
//!          begin                 complete
//!   Idle ─────────▶ Loading ─────────────▶ Ready
//!                                          │  ▲
//!                                   begin  │  │ complete
//!                                          ▼  │
//!                                       Refreshing
//! ```
//!
//! At most one fetch is in flight per query. Triggers that arrive while a
//! fetch is running are coalesced into it, except `Invalidate`, which marks
//! the result stale so a follow-up fetch runs as soon as the current one
//! settles. The cached value is only ever replaced by a newer successful
//! fetch; errors sit next to it.

use chrono::{DateTime, Utc};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryPhase {
    /// Never fetched.
    Idle,
    /// First fetch in flight, nothing to show yet.
    Loading,
    /// Settled. Data and/or an error may be present.
    Ready,
    /// Background refetch with previous data still visible.
    Refreshing,
}

impl QueryPhase {
    pub fn is_fetching(&self) -> bool {
        matches!(self, QueryPhase::Loading | QueryPhase::Refreshing)
    }
}

/// What asked for a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTrigger {
    Mount,
    Interval,
    Focus,
    Manual,
    /// A mutation succeeded; whatever is cached is now suspect.
    Invalidate,
}

/// Point-in-time view of a query, what the UI renders.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySnapshot<T> {
    pub phase: QueryPhase,
    pub data: Option<T>,
    pub last_error: Option<ClientError>,
    /// When `data` was last replaced.
    pub updated_at: Option<DateTime<Utc>>,
    /// Bumped on every successful fetch.
    pub generation: u64,
}

impl<T> QuerySnapshot<T> {
    pub fn is_loading(&self) -> bool {
        self.phase == QueryPhase::Loading
    }

    pub fn is_refreshing(&self) -> bool {
        self.phase == QueryPhase::Refreshing
    }
}

impl<T> Default for QuerySnapshot<T> {
    fn default() -> Self {
        Self {
            phase: QueryPhase::Idle,
            data: None,
            last_error: None,
            updated_at: None,
            generation: 0,
        }
    }
}

#[derive(Debug)]
pub struct QueryState<T> {
    snapshot: QuerySnapshot<T>,
    stale: bool,
}

impl<T> Default for QueryState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> QueryState<T> {
    pub fn new() -> Self {
        Self {
            snapshot: QuerySnapshot::default(),
            stale: false,
        }
    }

    pub fn phase(&self) -> QueryPhase {
        self.snapshot.phase
    }

    pub fn snapshot(&self) -> &QuerySnapshot<T> {
        &self.snapshot
    }

    /// Handle a trigger. Returns `true` when the caller must start a fetch.
    pub fn begin(&mut self, trigger: RefreshTrigger) -> bool {
        match self.snapshot.phase {
            QueryPhase::Idle => {
                self.snapshot.phase = QueryPhase::Loading;
                true
            }
            QueryPhase::Ready => {
                self.snapshot.phase = QueryPhase::Refreshing;
                true
            }
            QueryPhase::Loading | QueryPhase::Refreshing => {
                if trigger == RefreshTrigger::Invalidate {
                    self.stale = true;
                }
                false
            }
        }
    }

    /// Settle the in-flight fetch. Returns `true` when an invalidation
    /// arrived mid-flight and another fetch is due.
    pub fn complete(&mut self, result: Result<T, ClientError>, now: DateTime<Utc>) -> bool {
        if !self.snapshot.phase.is_fetching() {
            return false;
        }
        match result {
            Ok(data) => {
                self.snapshot.data = Some(data);
                self.snapshot.last_error = None;
                self.snapshot.updated_at = Some(now);
                self.snapshot.generation += 1;
            }
            Err(e) => {
                self.snapshot.last_error = Some(e);
            }
        }
        self.snapshot.phase = QueryPhase::Ready;
        std::mem::take(&mut self.stale)
    }
}

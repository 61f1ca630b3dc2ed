//! monito-client — data layer of the MonitoCorp dashboard.
//!
//! Everything the dashboard needs between the HTTP API and the screen:
//!
//! - [`ServiceApi`]: transport seam, with [`HttpServiceApi`] over hyper.
//! - [`filter`]: the status/search projection over a fetched list.
//! - [`QueryState`] and [`QueryDriver`]: a single refresh state machine
//!   (`Idle → Loading → Ready ⇄ Refreshing`) fed by mount, poll interval,
//!   focus regained, manual refresh and post-mutation invalidation.
//! - [`ServiceListQuery`] and [`ServiceDetail`]: the two views built on it.
//! - [`EventPager`]: incremental event history with an in-flight guard.
//!
//! # Architecture
//!
//! ```text
//! ServiceListQuery ──┐
//!                    ├── QueryDriver<T> (background task)
//! ServiceDetail ─────┘     ├── QueryState<T> (pure FSM)
//!      └── EventPager      ├── fetch / mutation tasks (JoinSet)
//!                          └── watch::Sender<QuerySnapshot<T>>
//! ```
//!
//! Failed refreshes never clear data: the last good value stays visible
//! alongside the error (stale-while-revalidate). Shutting a view down
//! aborts its in-flight work, and late results are dropped.

pub mod detail;
pub mod driver;
pub mod error;
pub mod filter;
pub mod http_api;
pub mod list;
pub mod notice;
pub mod pager;
pub mod query;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use detail::{DEFAULT_DETAIL_POLL_INTERVAL, ServiceDetail};
pub use driver::{Fetcher, Mutation, QueryDriver};
pub use error::{ClientError, ClientResult};
pub use filter::{ServiceFilters, StatusFilter, filter_services};
pub use http_api::HttpServiceApi;
pub use list::{DEFAULT_LIST_POLL_INTERVAL, ServiceListQuery, ServiceListSnapshot};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use pager::{DEFAULT_PAGE_SIZE, EventPager, LoadOutcome, PagerSnapshot};
pub use query::{QueryPhase, QuerySnapshot, QueryState, RefreshTrigger};
pub use transport::{BoxFuture, ServiceApi};

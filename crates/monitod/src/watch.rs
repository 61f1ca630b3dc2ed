//! Watch mode: the dashboard's data layer, rendered as log lines.
//!
//! Polls the list (and optionally one service's detail view) against a
//! running server, logs every settled snapshot through the configured
//! filters, and relays user notices. Stops on Ctrl-C.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use monito_client::{
    DEFAULT_DETAIL_POLL_INTERVAL, DEFAULT_PAGE_SIZE, LoadOutcome, Notice, NoticeLevel, Notifier,
    QuerySnapshot, ServiceApi, ServiceDetail, ServiceFilters, ServiceListQuery,
    ServiceListSnapshot,
};
use monito_state::Service;

use crate::config::WatchConfig;

pub async fn run_watch(config: WatchConfig) -> anyhow::Result<()> {
    info!(
        server = %config.api.address(),
        base_path = %config.api.base_path(),
        poll_secs = config.poll_interval.as_secs(),
        "monitod starting in watch mode"
    );

    let api: Arc<dyn ServiceApi> = Arc::new(config.api.clone());
    let (notifier, mut notices) = Notifier::channel();

    let list = ServiceListQuery::with_interval(api.clone(), config.poll_interval, notifier.clone());
    let mut list_rx = list.subscribe();

    let detail = match config.service.as_deref() {
        Some(id) => Some(open_detail(api, id, notifier.clone()).await),
        None => None,
    };
    let mut detail_rx = detail.as_ref().map(ServiceDetail::subscribe);

    loop {
        tokio::select! {
            changed = list_rx.changed() => {
                if changed.is_err() {
                    warn!("list query stopped");
                    break;
                }
                let snapshot = list_rx.borrow_and_update().clone();
                log_list(&snapshot, &config.filters);
            }
            Some(snapshot) = detail_changed(&mut detail_rx) => log_detail(&snapshot),
            Some(notice) = notices.recv() => log_notice(&notice),
            signal = tokio::signal::ctrl_c() => {
                if let Err(e) = signal {
                    error!(error = %e, "failed to listen for Ctrl-C");
                }
                info!("shutdown signal received");
                break;
            }
        }
    }

    if let Some(detail) = detail {
        detail.close().await;
    }
    list.shutdown().await;
    info!("watch stopped");
    Ok(())
}

/// Open the detail view and walk the event history as far as the server allows.
async fn open_detail(api: Arc<dyn ServiceApi>, id: &str, notifier: Notifier) -> ServiceDetail {
    let detail = ServiceDetail::open_with(
        api,
        id,
        DEFAULT_DETAIL_POLL_INTERVAL,
        DEFAULT_PAGE_SIZE,
        notifier,
    )
    .await;

    let mut pages = usize::from(detail.events().snapshot().page.is_some());
    loop {
        match detail.load_more_events().await {
            Ok(LoadOutcome::Loaded { has_more: true, .. }) => pages += 1,
            Ok(LoadOutcome::Loaded { has_more: false, .. }) => {
                pages += 1;
                break;
            }
            Ok(LoadOutcome::Exhausted | LoadOutcome::Closed | LoadOutcome::Skipped) => break,
            Err(e) => {
                warn!(service_id = %id, error = %e, "event history incomplete");
                break;
            }
        }
    }

    let history = detail.events().snapshot();
    info!(service_id = %id, pages, events = history.events.len(), "event history loaded");
    for event in history.events.iter().take(DEFAULT_PAGE_SIZE) {
        info!(
            service_id = %id,
            at = %event.timestamp.to_rfc3339(),
            status = %event.status,
            message = %event.message,
            details = event.details.as_deref().unwrap_or(""),
            "event"
        );
    }
    detail
}

async fn detail_changed(
    rx: &mut Option<watch::Receiver<QuerySnapshot<Service>>>,
) -> Option<QuerySnapshot<Service>> {
    match rx {
        Some(rx) => {
            rx.changed().await.ok()?;
            Some(rx.borrow_and_update().clone())
        }
        None => std::future::pending().await,
    }
}

fn log_list(snapshot: &ServiceListSnapshot, filters: &ServiceFilters) {
    if snapshot.phase.is_fetching() {
        debug!(phase = ?snapshot.phase, "services refreshing");
        return;
    }
    if let Some(e) = &snapshot.last_error {
        warn!(error = %e, "showing last known services");
    }
    let shown = snapshot.filtered(filters);
    info!(
        generation = snapshot.generation,
        total = snapshot.services().len(),
        shown = shown.len(),
        "services"
    );
    for service in &shown {
        log_service(service);
    }
}

fn log_detail(snapshot: &QuerySnapshot<Service>) {
    if snapshot.phase.is_fetching() {
        return;
    }
    if let Some(e) = &snapshot.last_error {
        warn!(error = %e, "service detail unavailable");
    }
    if let Some(service) = &snapshot.data {
        log_service(service);
    }
}

fn log_service(service: &Service) {
    info!(
        id = %service.id,
        name = %service.name,
        kind = %service.kind,
        status = %service.status,
        uptime = service.uptime,
        response_time_ms = ?service.response_time,
        "service"
    );
}

fn log_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Info | NoticeLevel::Success => info!(message = %notice.message, "notice"),
        NoticeLevel::Error => warn!(message = %notice.message, "notice"),
    }
}

use axum::{
    extract::{ConnectInfo, Query, State},
    http::{header::HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;

use crate::clock::SystemClock;
use crate::config::RelayConfig;
use crate::context::RequestContext;
use crate::random::ThreadRngSource;
use crate::sender::BeaconSender;
use crate::store::VisitStore;
use crate::tracker::Tracker;

/// 1x1 transparent GIF served to the browser.
const PIXEL_GIF: &[u8] = &[
    0x47, 0x49, 0x46, 0x38, 0x39, 0x61, 0x01, 0x00, 0x01, 0x00, 0x80, 0x00, 0x00, 0x00, 0x00,
    0x00, 0xff, 0xff, 0xff, 0x21, 0xf9, 0x04, 0x01, 0x00, 0x00, 0x00, 0x00, 0x2c, 0x00, 0x00,
    0x00, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x02, 0x02, 0x44, 0x01, 0x00, 0x3b,
];

pub struct RelayState {
    pub config: RelayConfig,
    pub sender: Arc<dyn BeaconSender>,
    pub store: Option<Arc<dyn VisitStore>>,
}

/// Optional overrides carried on the pixel request.
#[derive(Debug, Default, Deserialize)]
pub struct TrackQuery {
    /// Tracked page path; defaults to the pixel request's own path.
    pub p: Option<String>,
    /// Page title.
    pub dt: Option<String>,
    /// Event category; presence switches the beacon to event mode.
    pub ec: Option<String>,
    pub ea: Option<String>,
    pub el: Option<String>,
    pub ev: Option<String>,
    /// Campaign name and source.
    pub cn: Option<String>,
    pub cs: Option<String>,
}

/// Track one request: build the beacon, persist the visit, deliver the
/// beacon, answer with a pixel.
pub async fn track(
    State(state): State<Arc<RelayState>>,
    Query(query): Query<TrackQuery>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let config = &state.config;

    let mut context = RequestContext::from_request(
        &headers,
        &uri,
        addr.ip(),
        config.server_name.as_deref(),
        config.trusted_proxy_mode,
        config.anonymize_ips,
    );
    if let Some(page) = query.p.as_deref() {
        context.path = page.to_string();
        context.full_url = format!("http://{}{}", context.server_name, page);
    }

    let mut tracker = match Tracker::with_collaborators(
        &config.account_id,
        config.is_external,
        &config.cookie_seed,
        config.debug,
        context,
        config.collector_endpoints(),
        Arc::new(SystemClock),
        Arc::new(ThreadRngSource),
    ) {
        Ok(tracker) => tracker,
        Err(err) => {
            tracing::error!(error = %err, "tracker construction failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "tracker misconfigured").into_response();
        }
    };

    if let Some(title) = query.dt.as_deref() {
        tracker.set_page_title(title);
    }
    if let Some(category) = query.ec.as_deref() {
        tracker.set_event_data(
            category,
            query.ea.as_deref().unwrap_or_default(),
            query.el.as_deref().unwrap_or_default(),
            query.ev.as_deref().unwrap_or_default(),
        );
    }
    if query.cn.is_some() || query.cs.is_some() {
        if let Err(err) = tracker.set_campaign_data(
            query.cn.as_deref().unwrap_or_default(),
            query.cs.as_deref().unwrap_or_default(),
        ) {
            tracing::error!(error = %err, "campaign cookie computation failed");
            return (StatusCode::INTERNAL_SERVER_ERROR, "tracker misconfigured").into_response();
        }
    }

    let beacon_url = tracker.build_beacon_url(config.secure_beacons);

    // Persistence and notification are independent: a store outage must not
    // block beacon delivery, and vice versa.
    if !config.debug {
        if let Some(store) = &state.store {
            let record = tracker.visit_record(tracker.context().path.as_str());
            if let Err(err) = store.record_visit(&record).await {
                tracing::warn!(error = %err, "failed to record visit");
            }
        }
    }

    match tracker
        .notify(state.sender.as_ref(), config.secure_beacons)
        .await
    {
        Ok(body) => {
            tracing::debug!(
                account = %config.account_id,
                bytes = body.len(),
                "beacon delivered"
            );
        }
        Err(err) => {
            tracing::warn!(error = %err, "beacon delivery failed");
            return (StatusCode::BAD_GATEWAY, "beacon delivery failed").into_response();
        }
    }

    let mut response_headers = HeaderMap::new();
    response_headers.insert("content-type", "image/gif".parse().unwrap());
    response_headers.insert(
        "cache-control",
        "no-cache, no-store, must-revalidate".parse().unwrap(),
    );
    if config.debug {
        if let Ok(value) = beacon_url.parse() {
            response_headers.insert("x-beacon-url", value);
        }
    }

    (response_headers, PIXEL_GIF).into_response()
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    #[derive(Serialize)]
    struct HealthResponse {
        status: String,
    }

    Json(HealthResponse {
        status: "OK".to_string(),
    })
}

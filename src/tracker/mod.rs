//! Per-request tracking orchestrator.
//!
//! One [`Tracker`] is built per inbound request, mutated only through the
//! operations below, and dropped when request handling ends. It owns the
//! state the beacon builders read and hands the finished URL to a
//! [`BeaconSender`].

use std::sync::Arc;

use tracing::debug;

use crate::beacon::{
    build_beacon_url, build_utm_cookie, format_event_payload, BeaconParams, Campaign,
    CollectorEndpoints,
};
use crate::clock::{Clock, SystemClock};
use crate::config::ConfigError;
use crate::context::RequestContext;
use crate::random::{RandomSource, ThreadRngSource};
use crate::sender::{BeaconSender, TransportResult};
use crate::store::VisitRecord;

/// Tracking mode, decided permanently by the first successful event-data
/// assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    PageView,
    /// Carries the pre-escaped `utme` payload.
    Event(String),
}

/// Orchestrates one inbound request's tracking state.
pub struct Tracker {
    account_id: String,
    is_external: bool,
    cookie_seed: String,
    debug: bool,
    context: RequestContext,
    endpoints: CollectorEndpoints,
    page_title: String,
    mode: Mode,
    cookie: String,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl std::fmt::Debug for Tracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tracker")
            .field("account_id", &self.account_id)
            .field("is_external", &self.is_external)
            .field("cookie_seed", &self.cookie_seed)
            .field("debug", &self.debug)
            .field("context", &self.context)
            .field("endpoints", &self.endpoints)
            .field("page_title", &self.page_title)
            .field("mode", &self.mode)
            .field("cookie", &self.cookie)
            .finish_non_exhaustive()
    }
}

impl Tracker {
    /// Create a tracker with production collaborators.
    pub fn new(
        account_id: &str,
        is_external: bool,
        cookie_seed: &str,
        debug: bool,
        context: RequestContext,
    ) -> Result<Self, ConfigError> {
        Self::with_collaborators(
            account_id,
            is_external,
            cookie_seed,
            debug,
            context,
            CollectorEndpoints::default(),
            Arc::new(SystemClock),
            Arc::new(ThreadRngSource),
        )
    }

    /// Create a tracker with injected collaborators, for deterministic tests
    /// and alternate collector endpoints.
    #[allow(clippy::too_many_arguments)]
    pub fn with_collaborators(
        account_id: &str,
        is_external: bool,
        cookie_seed: &str,
        debug: bool,
        context: RequestContext,
        endpoints: CollectorEndpoints,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        if account_id.is_empty() {
            return Err(ConfigError::MissingAccountId);
        }

        Ok(Self {
            account_id: account_id.to_string(),
            is_external,
            cookie_seed: cookie_seed.to_string(),
            debug,
            context,
            endpoints,
            page_title: "(not set)".to_string(),
            mode: Mode::PageView,
            cookie: String::new(),
            clock,
            random,
        })
    }

    pub fn is_external(&self) -> bool {
        self.is_external
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn context(&self) -> &RequestContext {
        &self.context
    }

    /// Switch to event mode and store the formatted payload.
    ///
    /// An empty category is a deliberate no-op: mode and payload are left
    /// exactly as they were. Once in event mode the tracker never returns to
    /// page-view mode; a later successful call replaces the payload.
    pub fn set_event_data(&mut self, category: &str, action: &str, label: &str, value: &str) {
        if category.is_empty() {
            return;
        }
        self.mode = Mode::Event(format_event_payload(category, action, label, value));
    }

    /// Record campaign attribution and recompute the visitor cookie.
    ///
    /// Empty name or source fall back to `(direct)`. Fails when no cookie
    /// seed was configured.
    pub fn set_campaign_data(&mut self, name: &str, source: &str) -> Result<(), ConfigError> {
        let campaign = Campaign::new(name, source);
        self.cookie = build_utm_cookie(
            &self.cookie_seed,
            &campaign,
            self.clock.now_unix(),
            self.random.as_ref(),
        )?;
        Ok(())
    }

    pub fn set_page_title(&mut self, title: &str) {
        self.page_title = title.to_string();
    }

    /// Build the beacon URL for the current state.
    pub fn build_beacon_url(&self, secure: bool) -> String {
        let params = BeaconParams {
            server_name: &self.context.server_name,
            referer: &self.context.referer,
            page_path: &self.context.path,
            page_title: &self.page_title,
            event_payload: match &self.mode {
                Mode::PageView => None,
                Mode::Event(payload) => Some(payload),
            },
            account_id: &self.account_id,
            client_address: &self.context.client_address,
            cookie: &self.cookie,
        };
        build_beacon_url(&self.endpoints, &params, secure, self.random.as_ref())
    }

    /// Build the URL and deliver it through `sender`.
    ///
    /// In debug mode nothing is sent; the computed URL comes back as the
    /// response body so callers can surface it.
    pub async fn notify(
        &self,
        sender: &dyn BeaconSender,
        secure: bool,
    ) -> TransportResult<Vec<u8>> {
        let url = self.build_beacon_url(secure);
        debug!(account = %self.account_id, external = self.is_external, url = %url, "built beacon url");

        if self.debug {
            return Ok(url.into_bytes());
        }
        sender.send(&url, &self.context).await
    }

    /// The visit record this request would persist.
    pub fn visit_record(&self, uri_to: &str) -> VisitRecord {
        VisitRecord {
            uri_to: uri_to.to_string(),
            uri_from: self.context.full_url.clone(),
            ip: self.context.client_address.clone(),
            host: self.context.server_name.clone(),
        }
    }
}

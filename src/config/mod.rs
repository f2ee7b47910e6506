use anyhow::Context;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::beacon::CollectorEndpoints;

/// Fatal tracker configuration problems.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("account id must not be empty")]
    MissingAccountId,
    #[error("cookie seed must not be empty")]
    MissingCookieSeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Collector account the beacons are attributed to.
    pub account_id: String,
    /// Visitor cookie bucket for this deployment.
    pub cookie_seed: String,
    pub is_external: bool,
    /// Debug mode computes beacons without delivering or persisting them.
    pub debug: bool,
    pub server: ServerConfig,
    /// Host name reported in `utmhn`; falls back to the request Host header.
    pub server_name: Option<String>,
    /// Deliver beacons over the secure collector endpoint.
    pub secure_beacons: bool,
    pub collector_plain: Option<String>,
    pub collector_secure: Option<String>,
    #[serde(default)]
    pub store: Option<StoreConfig>,
    pub anonymize_ips: bool,
    pub trusted_proxy_mode: TrustedProxyMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Sqlite,
    Postgres,
}

/// How much to trust proxy headers when picking the client address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    None,
    Cloudflare,
    Standard,
}

impl RelayConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let account_id =
            std::env::var("GA_ACCOUNT_ID").context("GA_ACCOUNT_ID must be set")?;
        let cookie_seed =
            std::env::var("GA_COOKIE_SEED").context("GA_COOKIE_SEED must be set")?;

        let is_external = env_bool("EXTERNAL_URLS");
        let debug = env_bool("DEBUG_MODE");

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let server_name = std::env::var("SERVER_NAME").ok();
        let secure_beacons = env_bool("BEACON_SECURE");
        let collector_plain = std::env::var("COLLECTOR_URL").ok();
        let collector_secure = std::env::var("COLLECTOR_URL_SECURE").ok();

        let store = match std::env::var("STORE_URL") {
            Ok(url) => {
                let backend_str =
                    std::env::var("STORE_BACKEND").unwrap_or_else(|_| "sqlite".to_string());
                let backend = match backend_str.to_lowercase().as_str() {
                    "postgres" | "postgresql" => StoreBackend::Postgres,
                    _ => StoreBackend::Sqlite,
                };
                Some(StoreConfig { backend, url })
            }
            Err(_) => None,
        };

        let anonymize_ips = env_bool("IP_ANONYMIZATION");

        let proxy_mode_str = std::env::var("TRUSTED_PROXY_MODE")
            .unwrap_or_else(|_| "none".to_string())
            .to_lowercase();
        let trusted_proxy_mode = match proxy_mode_str.as_str() {
            "cloudflare" => TrustedProxyMode::Cloudflare,
            "standard" => TrustedProxyMode::Standard,
            "none" => TrustedProxyMode::None,
            other => {
                tracing::warn!(
                    "Unknown TRUSTED_PROXY_MODE '{other}', falling back to 'none'. Supported values: none, cloudflare, standard"
                );
                TrustedProxyMode::None
            }
        };

        Ok(RelayConfig {
            account_id,
            cookie_seed,
            is_external,
            debug,
            server: ServerConfig { host, port },
            server_name,
            secure_beacons,
            collector_plain,
            collector_secure,
            store,
            anonymize_ips,
            trusted_proxy_mode,
        })
    }

    /// Collector endpoints, with env overrides applied over the legacy
    /// defaults.
    pub fn collector_endpoints(&self) -> CollectorEndpoints {
        let mut endpoints = CollectorEndpoints::default();
        if let Some(ref plain) = self.collector_plain {
            endpoints.plain = plain.clone();
        }
        if let Some(ref secure) = self.collector_secure {
            endpoints.secure = secure.clone();
        }
        endpoints
    }
}

fn env_bool(key: &str) -> bool {
    std::env::var(key)
        .map(|v| matches!(v.to_lowercase().as_str(), "true" | "1" | "yes"))
        .unwrap_or(false)
}

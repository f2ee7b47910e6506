use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use utmrelay::beacon::{build_utm_cookie, Campaign};
use utmrelay::clock::{Clock, SystemClock};
use utmrelay::config::{RelayConfig, StoreBackend};
use utmrelay::context::RequestContext;
use utmrelay::random::ThreadRngSource;
use utmrelay::store::{PostgresVisitStore, SqliteVisitStore, VisitStore};
use utmrelay::tracker::Tracker;

#[derive(Parser)]
#[command(name = "utmrelay-admin")]
#[command(about = "utmrelay management CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configured visit store
    InitStore,
    /// Count persisted visits
    Visits,
    /// Print the beacon URL the relay would compute for the given page
    Url {
        /// Tracked page path
        path: String,
        /// Page title
        #[arg(long)]
        title: Option<String>,
        /// Event category (switches the beacon to event mode)
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value = "")]
        action: String,
        #[arg(long, default_value = "")]
        label: String,
        #[arg(long, default_value = "")]
        value: String,
        /// Campaign name
        #[arg(long)]
        campaign: Option<String>,
        /// Campaign source
        #[arg(long, default_value = "")]
        source: String,
        /// Use the secure collector endpoint
        #[arg(long)]
        secure: bool,
    },
    /// Print a freshly computed visitor cookie
    Cookie {
        #[arg(long, default_value = "(direct)")]
        campaign: String,
        #[arg(long, default_value = "(direct)")]
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = RelayConfig::from_env()?;

    match cli.command {
        Commands::InitStore => {
            let store = open_store(&config).await?;
            store.init().await?;
            println!("✓ Visit store initialized");
        }
        Commands::Visits => {
            let store = open_store(&config).await?;
            let count = store.visit_count().await?;
            println!("{count} visits recorded");
        }
        Commands::Url {
            path,
            title,
            category,
            action,
            label,
            value,
            campaign,
            source,
            secure,
        } => {
            let server_name = config.server_name.clone().unwrap_or_default();
            let context = RequestContext {
                path: path.clone(),
                full_url: format!("http://{server_name}{path}"),
                client_address: "127.0.0.1".to_string(),
                server_name,
                referer: "-".to_string(),
                user_agent: String::new(),
                accept_language: String::new(),
            };
            let mut tracker = Tracker::new(
                &config.account_id,
                config.is_external,
                &config.cookie_seed,
                config.debug,
                context,
            )?;
            if let Some(title) = title {
                tracker.set_page_title(&title);
            }
            if let Some(category) = category {
                tracker.set_event_data(&category, &action, &label, &value);
            }
            if let Some(campaign) = campaign {
                tracker.set_campaign_data(&campaign, &source)?;
            }
            println!("{}", tracker.build_beacon_url(secure));
        }
        Commands::Cookie { campaign, source } => {
            let cookie = build_utm_cookie(
                &config.cookie_seed,
                &Campaign::new(&campaign, &source),
                SystemClock.now_unix(),
                &ThreadRngSource,
            )?;
            println!("{cookie}");
        }
    }

    Ok(())
}

async fn open_store(config: &RelayConfig) -> Result<Arc<dyn VisitStore>> {
    let store_config = config
        .store
        .as_ref()
        .context("STORE_URL is not configured")?;
    Ok(match store_config.backend {
        StoreBackend::Sqlite => Arc::new(SqliteVisitStore::new(&store_config.url, 5).await?),
        StoreBackend::Postgres => Arc::new(PostgresVisitStore::new(&store_config.url).await?),
    })
}

use std::sync::Arc;

use anyhow::Context;
use chrono::Duration;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use folio_ledger::app;
use folio_ledger::config::{AppConfig, LedgerBackend, QuoteProviderKind};
use folio_ledger::external::alphavantage::AlphaVantageProvider;
use folio_ledger::external::multi_provider::MultiProvider;
use folio_ledger::external::price_provider::{OfflineProvider, PriceProvider};
use folio_ledger::external::yahoofinance::YahooFinanceProvider;
use folio_ledger::logging::{self, LoggingConfig};
use folio_ledger::services::auth_service::AuthService;
use folio_ledger::services::failure_cache::FailureCache;
use folio_ledger::state::AppState;
use folio_ledger::store::{LedgerStore, MemoryLedgerStore, PgLedgerStore, SheetLedgerStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    logging::init_logging(LoggingConfig::from_env())
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    let config = AppConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    let store = build_store(&config).await?;
    let price_provider = build_provider(&config);

    let session_secret = match &config.session_secret {
        Some(secret) => secret.as_bytes().to_vec(),
        None => {
            tracing::warn!("SESSION_SECRET not set; sessions will not survive a restart");
            rand::random::<[u8; 32]>().to_vec()
        }
    };
    let auth = AuthService::new(
        &config.auth_username,
        &config.auth_password,
        &session_secret,
        Duration::hours(config.session_ttl_hours),
    )
    .context("Failed to set up authentication")?;

    let state = AppState {
        store,
        price_provider,
        failure_cache: FailureCache::new(Duration::minutes(config.quote_failure_ttl_minutes)),
        auth: Arc::new(auth),
    };
    let app = app::create_app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    tracing::info!("🚀 Folio ledger running at http://{}/", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_store(config: &AppConfig) -> anyhow::Result<Arc<dyn LedgerStore>> {
    match config.ledger_backend {
        LedgerBackend::Postgres => {
            let database_url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres ledger")?;
            let pool = PgPoolOptions::new()
                .max_connections(config.db_max_connections)
                .connect(database_url)
                .await
                .context("Failed to connect to the ledger database")?;
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run ledger migrations")?;
            tracing::info!("📒 Using ledger store: PostgreSQL");
            Ok(Arc::new(PgLedgerStore::new(pool)))
        }
        LedgerBackend::Sheet => {
            tracing::info!("📒 Using ledger store: sheet at {}", config.sheet_path.display());
            Ok(Arc::new(SheetLedgerStore::new(config.sheet_path.clone())))
        }
        LedgerBackend::Memory => {
            tracing::warn!("📒 Using ledger store: in-memory (entries are lost on restart)");
            Ok(Arc::new(MemoryLedgerStore::new()))
        }
    }
}

fn build_provider(config: &AppConfig) -> Arc<dyn PriceProvider> {
    match config.price_provider {
        QuoteProviderKind::Yahoo => {
            tracing::info!("📊 Using price provider: Yahoo Finance");
            Arc::new(YahooFinanceProvider::new(config.quote_symbol_suffix.clone()))
        }
        QuoteProviderKind::AlphaVantage => {
            tracing::info!("📊 Using price provider: Alpha Vantage only");
            let key = config.alphavantage_api_key.clone().unwrap_or_default();
            Arc::new(AlphaVantageProvider::new(key))
        }
        QuoteProviderKind::Multi => {
            let mut providers: Vec<Box<dyn PriceProvider>> = vec![Box::new(
                YahooFinanceProvider::new(config.quote_symbol_suffix.clone()),
            )];
            match &config.alphavantage_api_key {
                Some(key) => {
                    tracing::info!("📊 Using price provider: Multi-provider (Yahoo + Alpha Vantage fallback)");
                    providers.push(Box::new(AlphaVantageProvider::new(key.clone())));
                }
                None => tracing::info!("📊 Using price provider: Multi-provider (Yahoo only, no Alpha Vantage key)"),
            }
            Arc::new(MultiProvider::new(providers))
        }
        QuoteProviderKind::Offline => {
            tracing::warn!("📊 Quote source disabled; every position needs a manual price");
            Arc::new(OfflineProvider)
        }
    }
}

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerBackend {
    Postgres,
    Sheet,
    Memory,
}

impl std::str::FromStr for LedgerBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "postgres" | "sql" => Ok(LedgerBackend::Postgres),
            "sheet" | "csv" => Ok(LedgerBackend::Sheet),
            "memory" => Ok(LedgerBackend::Memory),
            other => Err(format!(
                "Invalid LEDGER_BACKEND: {}. Must be 'postgres', 'sheet', or 'memory'", other
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteProviderKind {
    Yahoo,
    AlphaVantage,
    Multi,
    Offline,
}

impl std::str::FromStr for QuoteProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "yahoo" => Ok(QuoteProviderKind::Yahoo),
            "alphavantage" => Ok(QuoteProviderKind::AlphaVantage),
            "multi" => Ok(QuoteProviderKind::Multi),
            "offline" | "none" => Ok(QuoteProviderKind::Offline),
            other => Err(format!(
                "Invalid PRICE_PROVIDER: {}. Must be 'yahoo', 'alphavantage', 'multi', or 'offline'", other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub ledger_backend: LedgerBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub sheet_path: PathBuf,
    pub price_provider: QuoteProviderKind,
    pub quote_symbol_suffix: String,
    pub alphavantage_api_key: Option<String>,
    pub quote_failure_ttl_minutes: i64,
    pub auth_username: String,
    pub auth_password: String,
    pub session_secret: Option<String>,
    pub session_ttl_hours: i64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, String> {
    match env_opt(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, String> {
        let config = Self {
            bind_addr: env_parse("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)))?,
            ledger_backend: env_or("LEDGER_BACKEND", "sheet").parse()?,
            database_url: env_opt("DATABASE_URL"),
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", 5)?,
            sheet_path: PathBuf::from(env_or("LEDGER_SHEET_PATH", "ledger.csv")),
            price_provider: env_or("PRICE_PROVIDER", "yahoo").parse()?,
            quote_symbol_suffix: env_or("QUOTE_SYMBOL_SUFFIX", ".IS"),
            alphavantage_api_key: env_opt("ALPHAVANTAGE_API_KEY"),
            quote_failure_ttl_minutes: env_parse("QUOTE_FAILURE_TTL_MINUTES", 60)?,
            auth_username: env_or("AUTH_USERNAME", "admin"),
            auth_password: env_or("AUTH_PASSWORD", "1234"),
            session_secret: env_opt("SESSION_SECRET"),
            session_ttl_hours: env_parse("SESSION_TTL_HOURS", 12)?,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.ledger_backend == LedgerBackend::Postgres && self.database_url.is_none() {
            return Err("LEDGER_BACKEND is postgres but DATABASE_URL is not set".to_string());
        }
        if self.price_provider == QuoteProviderKind::AlphaVantage && self.alphavantage_api_key.is_none() {
            return Err("PRICE_PROVIDER is alphavantage but ALPHAVANTAGE_API_KEY is not set".to_string());
        }
        if self.auth_username.trim().is_empty() || self.auth_password.is_empty() {
            return Err("AUTH_USERNAME and AUTH_PASSWORD must not be empty".to_string());
        }
        if self.db_max_connections == 0 {
            return Err("DB_MAX_CONNECTIONS must be at least 1".to_string());
        }
        if self.quote_failure_ttl_minutes < 0 {
            return Err("QUOTE_FAILURE_TTL_MINUTES cannot be negative".to_string());
        }
        if self.session_ttl_hours <= 0 {
            return Err("SESSION_TTL_HOURS must be positive".to_string());
        }
        Ok(())
    }
}

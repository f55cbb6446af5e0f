// Core structs: MarketEntry, MarketSnapshot, NicheStats, Gap
use crate::analyzer::market_indicators::PriceBand;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Parameter bag a service descriptor hands to a connector on connect.
pub type ConnectParams = HashMap<String, serde_json::Value>;

/// One product listed in a niche market, as returned by a market data API.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketEntry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub vendor: String,
    #[serde(default)]
    pub category: String,
    pub price: f64,
    #[serde(default = "Utc::now")]
    pub listed_at: DateTime<Utc>,
    /// Canonical niche tag, assigned by the normalizer after fetch.
    #[serde(skip)]
    pub niche: String,
}

#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub niche: String,
    pub entries: Vec<MarketEntry>,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NicheStats {
    pub niche: String,
    pub avg_price: f64,
    pub std_dev: f64,
    pub entry_count: u32,
    pub last_updated: DateTime<Utc>,
}

/// A market segment where historical supply collapsed while demand held up.
#[derive(Debug, Clone)]
pub struct Gap {
    pub id: String,
    pub niche: String,
    pub band: PriceBand,
    pub score: f64,
    pub current_supply: u32,
    pub historical_supply: f64,
    /// Mean historical price inside the band, the price point to target.
    pub avg_price: f64,
    pub detected_at: DateTime<Utc>,
}

/// Result of one market analysis pass over a niche.
#[derive(Debug, Clone)]
pub struct GapReport {
    pub niche: String,
    pub stats: NicheStats,
    pub rsi: f64,
    pub gaps: Vec<Gap>,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("no services defined in integration config")]
    NoServices,
    #[error("service descriptor missing field: {0}")]
    MissingField(String),
    #[error("connector {0} not found")]
    UnknownConnector(String),
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("missing connect parameter: {0}")]
    MissingParam(String),
    #[error("connector is not connected")]
    NotConnected,
    #[error("http error: {0}")]
    Http(String),
    #[error("request timed out")]
    Timeout,
    #[error("unexpected response status: {0}")]
    InvalidResponse(u16),
    #[error("response parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ConnectorError::Timeout
        } else if err.is_decode() {
            ConnectorError::Parse(err.to_string())
        } else {
            ConnectorError::Http(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(String),
    #[error("not found")]
    NotFound,
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

impl From<chrono::ParseError> for StorageError {
    fn from(err: chrono::ParseError) -> Self {
        StorageError::Database(format!("Invalid datetime: {}", err))
    }
}

/// Failure of the batch connection sequence. Callers can tell a bad config
/// from a connector that refused the connection.
#[derive(Debug, Error)]
pub enum IntegrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("connector {service} failed to connect: {source}")]
    Connector {
        service: String,
        #[source]
        source: ConnectorError,
    },
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

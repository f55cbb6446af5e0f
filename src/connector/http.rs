use crate::connector::traits::Connector;
use crate::model::{ConnectParams, ConnectorError, MarketEntry, MarketSnapshot};
use crate::utils::to_kebab_case;
use chrono::Utc;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;

/// Endpoint state captured by a successful connect call.
#[derive(Debug, Clone)]
struct Endpoint {
    base_url: String,
    api_key: String,
}

pub struct HttpConnector {
    client: Client,
    endpoint: RwLock<Option<Endpoint>>,
}

impl HttpConnector {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent("GapScout/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            endpoint: RwLock::new(None),
        }
    }

    fn string_param(params: &ConnectParams, key: &str) -> Result<String, ConnectorError> {
        params
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConnectorError::MissingParam(key.to_string()))
    }

    fn status_url(base_url: &str) -> String {
        format!("{}/v1/status", base_url.trim_end_matches('/'))
    }

    fn market_url(base_url: &str, niche: &str) -> String {
        format!(
            "{}/v1/markets/{}/products",
            base_url.trim_end_matches('/'),
            to_kebab_case(niche)
        )
    }
}

#[async_trait::async_trait]
impl Connector for HttpConnector {
    async fn connect(&self, params: &ConnectParams) -> Result<(), ConnectorError> {
        let base_url = Self::string_param(params, "base_url")?;
        let api_key = Self::string_param(params, "api_key")?;

        let response = self
            .client
            .get(Self::status_url(&base_url))
            .bearer_auth(&api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConnectorError::InvalidResponse(response.status().as_u16()));
        }

        info!("Connector authenticated against {}", base_url);
        *self.endpoint.write().await = Some(Endpoint { base_url, api_key });
        Ok(())
    }

    async fn get_market_data(&self, niche: &str) -> Result<MarketSnapshot, ConnectorError> {
        let endpoint = self
            .endpoint
            .read()
            .await
            .clone()
            .ok_or(ConnectorError::NotConnected)?;

        let response = self
            .client
            .get(Self::market_url(&endpoint.base_url, niche))
            .bearer_auth(&endpoint.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ConnectorError::InvalidResponse(response.status().as_u16()));
        }

        let entries: Vec<MarketEntry> = response.json().await?;

        Ok(MarketSnapshot {
            niche: niche.to_string(),
            entries,
            fetched_at: Utc::now(),
        })
    }
}

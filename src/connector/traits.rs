use crate::model::{ConnectParams, ConnectorError, MarketSnapshot};

#[async_trait::async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, params: &ConnectParams) -> Result<(), ConnectorError>;
    async fn get_market_data(&self, niche: &str) -> Result<MarketSnapshot, ConnectorError>;
}

use crate::model::{ConfigError, ConnectParams};
use serde::Deserialize;
use std::fs;

/// One service descriptor: the connector to drive and the parameters to
/// connect it with. `params` stays optional in the wire form so validation
/// can reject its absence explicitly.
#[derive(Debug, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub params: Option<ConnectParams>,
}

#[derive(Debug, Deserialize)]
pub struct IntegrationConfig {
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

#[derive(Debug, Deserialize)]
pub struct NicheConfig {
    pub niche: String,
    pub match_keywords: Vec<String>,
    pub min_price: f64,
    pub max_price: f64,
    #[serde(default = "default_supply_drop_ratio")]
    pub supply_drop_ratio: f64,
    #[serde(default)]
    pub min_gap_score: f64,
}

fn default_supply_drop_ratio() -> f64 {
    0.5
}

#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// Name of the registered connector that feeds market data.
    pub data_service: String,
    pub integration: IntegrationConfig,
    pub niches: Vec<NicheConfig>,
    pub check_interval_seconds: u64,
}

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: AppConfig = serde_json::from_str(&content)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL_CONFIG: &str = r#"{
        "data_service": "saasgrid",
        "check_interval_seconds": 3600,
        "integration": {
            "services": [
                { "name": "saasgrid", "params": { "base_url": "https://api.saasgrid.io", "api_key": "k" } }
            ]
        },
        "niches": [
            {
                "niche": "crm",
                "match_keywords": ["crm", "sales pipeline"],
                "min_price": 5.0,
                "max_price": 500.0,
                "supply_drop_ratio": 0.4,
                "min_gap_score": 10.0
            }
        ]
    }"#;

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = serde_json::from_str(FULL_CONFIG).unwrap();
        assert_eq!(config.data_service, "saasgrid");
        assert_eq!(config.integration.services.len(), 1);
        assert_eq!(config.integration.services[0].name, "saasgrid");
        assert!(config.integration.services[0].params.is_some());
        assert_eq!(config.niches[0].supply_drop_ratio, 0.4);
    }

    #[test]
    fn test_missing_services_key_defaults_to_empty() {
        let config: AppConfig = serde_json::from_str(
            r#"{
                "data_service": "saasgrid",
                "check_interval_seconds": 60,
                "integration": {},
                "niches": []
            }"#,
        )
        .unwrap();
        assert!(config.integration.services.is_empty());
    }

    #[test]
    fn test_descriptor_without_params_parses_as_none() {
        let integration: IntegrationConfig =
            serde_json::from_str(r#"{ "services": [ { "name": "stripe" } ] }"#).unwrap();
        assert!(integration.services[0].params.is_none());
    }

    #[test]
    fn test_niche_defaults() {
        let niche: NicheConfig = serde_json::from_str(
            r#"{ "niche": "crm", "match_keywords": ["crm"], "min_price": 0.0, "max_price": 100.0 }"#,
        )
        .unwrap();
        assert_eq!(niche.supply_drop_ratio, 0.5);
        assert_eq!(niche.min_gap_score, 0.0);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config("does-not-exist.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}

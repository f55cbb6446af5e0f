use crate::config::{IntegrationConfig, ServiceConfig};
use crate::connector::Connector;
use crate::model::{ConfigError, ConnectParams, IntegrationError};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// Named registry of API connectors, driven through a config-defined
/// connection sequence.
pub struct ConnectorRegistry {
    connectors: HashMap<String, Arc<dyn Connector>>,
}

impl ConnectorRegistry {
    pub fn new() -> Self {
        Self {
            connectors: HashMap::new(),
        }
    }

    /// Registers a connector under `name`. Re-registering a name replaces
    /// the previous handle; dispatch always uses the latest registration.
    pub fn register(&mut self, name: &str, connector: Arc<dyn Connector>) {
        self.connectors.insert(name.to_string(), connector);
        info!("Registered connector {}", name);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Connector>> {
        self.connectors.get(name).cloned()
    }

    /// Connects every configured service strictly in list order, stopping at
    /// the first failure. Services connected before a later failure stay
    /// connected; there is no rollback and no partial-success result.
    pub async fn connect_all(
        &self,
        config: &IntegrationConfig,
    ) -> Result<bool, IntegrationError> {
        info!("Starting API integration process");

        match self.try_connect_all(config).await {
            Ok(()) => Ok(true),
            Err(e) => {
                error!("API integration failed: {}", e);
                Err(e)
            }
        }
    }

    async fn try_connect_all(&self, config: &IntegrationConfig) -> Result<(), IntegrationError> {
        validate_config(config)?;

        for service in &config.services {
            let connector = self
                .get(&service.name)
                .ok_or_else(|| ConfigError::UnknownConnector(service.name.clone()))?;
            let params = service_params(service)?;

            info!("Connecting {}", service.name);
            if let Err(e) = connector.connect(params).await {
                return Err(IntegrationError::Connector {
                    service: service.name.clone(),
                    source: e,
                });
            }
        }

        Ok(())
    }
}

fn validate_config(config: &IntegrationConfig) -> Result<(), ConfigError> {
    if config.services.is_empty() {
        return Err(ConfigError::NoServices);
    }

    for service in &config.services {
        if service.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".to_string()));
        }
        if service.params.is_none() {
            return Err(ConfigError::MissingField(format!(
                "params for service {}",
                service.name
            )));
        }
    }

    Ok(())
}

fn service_params(service: &ServiceConfig) -> Result<&ConnectParams, ConfigError> {
    service.params.as_ref().ok_or_else(|| {
        ConfigError::MissingField(format!("params for service {}", service.name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectorError, MarketSnapshot};
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every connect call in a journal shared across connectors, so
    /// tests can assert dispatch order.
    struct MockConnector {
        label: &'static str,
        journal: Arc<Mutex<Vec<(String, ConnectParams)>>>,
        fail: bool,
    }

    impl MockConnector {
        fn new(label: &'static str, journal: Arc<Mutex<Vec<(String, ConnectParams)>>>) -> Self {
            Self {
                label,
                journal,
                fail: false,
            }
        }

        fn failing(label: &'static str, journal: Arc<Mutex<Vec<(String, ConnectParams)>>>) -> Self {
            Self {
                label,
                journal,
                fail: true,
            }
        }
    }

    #[async_trait::async_trait]
    impl Connector for MockConnector {
        async fn connect(&self, params: &ConnectParams) -> Result<(), ConnectorError> {
            self.journal
                .lock()
                .unwrap()
                .push((self.label.to_string(), params.clone()));
            if self.fail {
                Err(ConnectorError::Http("connection refused".to_string()))
            } else {
                Ok(())
            }
        }

        async fn get_market_data(&self, _niche: &str) -> Result<MarketSnapshot, ConnectorError> {
            Err(ConnectorError::NotConnected)
        }
    }

    fn journal() -> Arc<Mutex<Vec<(String, ConnectParams)>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn service(name: &str, params: ConnectParams) -> ServiceConfig {
        ServiceConfig {
            name: name.to_string(),
            params: Some(params),
        }
    }

    #[tokio::test]
    async fn test_empty_service_list_rejected() {
        let registry = ConnectorRegistry::new();
        let config = IntegrationConfig { services: vec![] };

        let err = registry.connect_all(&config).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Config(ConfigError::NoServices)
        ));
    }

    #[tokio::test]
    async fn test_descriptor_without_params_rejected_before_any_connect() {
        let log = journal();
        let mut registry = ConnectorRegistry::new();
        registry.register("stripe", Arc::new(MockConnector::new("stripe", log.clone())));

        let config = IntegrationConfig {
            services: vec![
                service("stripe", ConnectParams::new()),
                ServiceConfig {
                    name: "stripe".to_string(),
                    params: None,
                },
            ],
        };

        let err = registry.connect_all(&config).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Config(ConfigError::MissingField(_))
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_connector_stops_the_sequence() {
        let log = journal();
        let mut registry = ConnectorRegistry::new();
        registry.register("stripe", Arc::new(MockConnector::new("stripe", log.clone())));
        registry.register("hubspot", Arc::new(MockConnector::new("hubspot", log.clone())));

        let config = IntegrationConfig {
            services: vec![
                service("stripe", ConnectParams::new()),
                service("unknown_service", ConnectParams::new()),
                service("hubspot", ConnectParams::new()),
            ],
        };

        let err = registry.connect_all(&config).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Config(ConfigError::UnknownConnector(ref name)) if name == "unknown_service"
        ));

        // Only the descriptor before the unknown name ran.
        let calls = log.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "stripe");
    }

    #[tokio::test]
    async fn test_unknown_connector_alone_invokes_nothing() {
        let log = journal();
        let registry = ConnectorRegistry::new();

        let config = IntegrationConfig {
            services: vec![service("unknown_service", ConnectParams::new())],
        };

        let err = registry.connect_all(&config).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Config(ConfigError::UnknownConnector(_))
        ));
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_connect_all_runs_in_list_order_with_params() {
        let log = journal();
        let mut registry = ConnectorRegistry::new();
        registry.register("stripe", Arc::new(MockConnector::new("stripe", log.clone())));
        registry.register("hubspot", Arc::new(MockConnector::new("hubspot", log.clone())));

        let stripe_params =
            ConnectParams::from([("token".to_string(), json!("abc"))]);
        let config = IntegrationConfig {
            services: vec![
                service("stripe", stripe_params.clone()),
                service("hubspot", ConnectParams::new()),
            ],
        };

        let connected = registry.connect_all(&config).await.unwrap();
        assert!(connected);

        let calls = log.lock().unwrap();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].0, "stripe");
        assert_eq!(calls[0].1, stripe_params);
        assert_eq!(calls[1].0, "hubspot");
    }

    #[tokio::test]
    async fn test_connector_failure_propagates_and_stops() {
        let log = journal();
        let mut registry = ConnectorRegistry::new();
        registry.register("stripe", Arc::new(MockConnector::failing("stripe", log.clone())));
        registry.register("hubspot", Arc::new(MockConnector::new("hubspot", log.clone())));

        let config = IntegrationConfig {
            services: vec![
                service("stripe", ConnectParams::new()),
                service("hubspot", ConnectParams::new()),
            ],
        };

        let err = registry.connect_all(&config).await.unwrap_err();
        assert!(matches!(
            err,
            IntegrationError::Connector { ref service, .. } if service == "stripe"
        ));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_re_registration_replaces_the_handle() {
        let log = journal();
        let mut registry = ConnectorRegistry::new();
        registry.register("stripe", Arc::new(MockConnector::new("stripe-old", log.clone())));
        registry.register("stripe", Arc::new(MockConnector::new("stripe-new", log.clone())));

        let config = IntegrationConfig {
            services: vec![service("stripe", ConnectParams::new())],
        };

        registry.connect_all(&config).await.unwrap();

        let calls = log.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "stripe-new");
    }
}

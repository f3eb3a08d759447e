//! Upstream access strategies and their selection.
//!
//! Every strategy implements the same [`DataProvider`] port. Selection is a
//! registry of named factories: adding a strategy is a registration, not a
//! branch edit. In client mode every call routes through the remote gateway
//! proxy regardless of the configured strategy key; in server mode the key
//! picks a local strategy, falling back to direct fetch.

mod aggregate_api;
mod direct;
mod json_parser;
mod mock;
mod official_api;
mod remote_gateway;

pub use aggregate_api::AggregateApiProvider;
pub use direct::DirectFetchProvider;
pub use json_parser::JsonItemParser;
pub use mock::MockDataProvider;
pub use official_api::OfficialApiProvider;
pub use remote_gateway::RemoteGatewayProvider;

use secrecy::SecretString;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::catalog::Region;
use crate::ports::DataProvider;

/// Strategy key for the direct fetch-and-parse provider.
pub const DIRECT_STRATEGY: &str = "direct";
/// Strategy key for the third-party aggregation API provider.
pub const AGGREGATE_API_STRATEGY: &str = "aggregate_api";
/// Strategy key for the officially signed API provider.
pub const OFFICIAL_API_STRATEGY: &str = "official_api";

/// Where upstream calls are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeploymentMode {
    /// Calls run against a locally configured strategy.
    #[default]
    Server,
    /// Every call is forwarded to a remote gateway peer.
    Client,
}

impl DeploymentMode {
    /// Parses the configuration code; anything but "client" is server mode.
    pub fn from_code(code: &str) -> Self {
        if code.eq_ignore_ascii_case("client") {
            DeploymentMode::Client
        } else {
            DeploymentMode::Server
        }
    }
}

/// Everything the strategies need to construct themselves.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Deployment mode; decides between local strategies and the proxy.
    pub mode: DeploymentMode,
    /// Configured strategy key (server mode only).
    pub strategy: Option<String>,
    /// Marketplace region upstream calls target.
    pub region: Region,
    /// Host stem for direct retail-site fetches (region TLD is appended).
    pub site_root: String,
    /// Aggregation API base URL.
    pub aggregate_base_url: String,
    /// Aggregation API key.
    pub aggregate_api_key: Option<SecretString>,
    /// Seconds an aggregation API response stays cached.
    pub aggregate_cache_ttl_secs: u64,
    /// Official API endpoint.
    pub official_endpoint: String,
    /// Official API access key id.
    pub official_access_key: Option<String>,
    /// Official API signing secret.
    pub official_secret_key: Option<SecretString>,
    /// Partner tag sent with official API calls.
    pub official_partner_tag: Option<String>,
    /// Remote gateway peer base URL (client mode).
    pub gateway_base_url: String,
    /// License key presented to the remote gateway.
    pub gateway_license_key: Option<SecretString>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            mode: DeploymentMode::Server,
            strategy: None,
            region: Region::Us,
            site_root: "www.example-shop".to_string(),
            aggregate_base_url: "https://api.aggregator.example".to_string(),
            aggregate_api_key: None,
            aggregate_cache_ttl_secs: 900,
            official_endpoint: "https://api.partner.example".to_string(),
            official_access_key: None,
            official_secret_key: None,
            official_partner_tag: None,
            gateway_base_url: "https://gateway.example".to_string(),
            gateway_license_key: None,
        }
    }
}

/// Constructor for a named strategy.
pub type ProviderFactory = fn(&ProviderSettings) -> Arc<dyn DataProvider>;

/// Named strategy constructors.
pub struct ProviderRegistry {
    factories: HashMap<&'static str, ProviderFactory>,
}

impl ProviderRegistry {
    /// A registry with no strategies.
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// The built-in strategies.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register(DIRECT_STRATEGY, |s| {
            Arc::new(DirectFetchProvider::from_settings(s)) as Arc<dyn DataProvider>
        });
        registry.register(AGGREGATE_API_STRATEGY, |s| {
            Arc::new(AggregateApiProvider::from_settings(s)) as Arc<dyn DataProvider>
        });
        registry.register(OFFICIAL_API_STRATEGY, |s| {
            Arc::new(OfficialApiProvider::from_settings(s)) as Arc<dyn DataProvider>
        });
        registry
    }

    /// Registers (or replaces) a strategy under `name`.
    pub fn register(&mut self, name: &'static str, factory: ProviderFactory) {
        self.factories.insert(name, factory);
    }

    /// Looks up a strategy factory.
    pub fn get(&self, name: &str) -> Option<ProviderFactory> {
        self.factories.get(name).copied()
    }

    /// Registered strategy names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

/// Chooses the provider the rest of the system talks to.
pub struct ProviderSelector {
    settings: ProviderSettings,
    registry: ProviderRegistry,
}

impl ProviderSelector {
    /// Selector over the built-in registry.
    pub fn new(settings: ProviderSettings) -> Self {
        Self {
            settings,
            registry: ProviderRegistry::with_builtins(),
        }
    }

    /// Selector over a caller-supplied registry.
    pub fn with_registry(settings: ProviderSettings, registry: ProviderRegistry) -> Self {
        Self { settings, registry }
    }

    /// Resolves the provider for the current settings.
    pub fn select(&self) -> Arc<dyn DataProvider> {
        if self.settings.mode == DeploymentMode::Client {
            // Client mode overrides any locally configured strategy.
            return Arc::new(RemoteGatewayProvider::from_settings(&self.settings));
        }

        let key = self.settings.strategy.as_deref().unwrap_or(DIRECT_STRATEGY);
        let factory = match self.registry.get(key) {
            Some(factory) => factory,
            None => {
                debug!(strategy = key, "unknown provider strategy, using direct fetch");
                self.registry
                    .get(DIRECT_STRATEGY)
                    .unwrap_or(|s: &ProviderSettings| {
                        Arc::new(DirectFetchProvider::from_settings(s)) as Arc<dyn DataProvider>
                    })
            }
        };
        factory(&self.settings)
    }
}

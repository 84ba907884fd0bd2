/// Configuration management for the Savanna dashboard client
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::openstack::Session;
use crate::savanna::client::SERVICE_TYPE;

/// Catalog service type of the image service
pub const IMAGE_SERVICE_TYPE: &str = "image";

/// Catalog service type of the compute service
pub const COMPUTE_SERVICE_TYPE: &str = "compute";

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Session token, tenant and service catalog
    pub identity: IdentityConfig,

    /// Savanna service settings
    #[serde(default)]
    pub savanna: SavannaConfig,

    /// Image service endpoint override
    #[serde(default)]
    pub image: ServiceConfig,

    /// Compute service endpoint override
    #[serde(default)]
    pub compute: ServiceConfig,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Identity settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Auth token (can also be set via OS_AUTH_TOKEN env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Tenant id (can also be set via OS_TENANT_ID env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,

    /// Service type to public endpoint URL
    #[serde(default)]
    pub catalog: BTreeMap<String, String>,
}

/// Savanna service settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavannaConfig {
    /// Explicit service address; the tenant id is appended.
    /// Unset or "endpoints" means use the catalog's "mapreduce" entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Endpoint override for a collaborator service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl DashboardConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DashboardConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        if let Some(address) = self.savanna.address.as_deref() {
            if address != crate::savanna::client::ENDPOINTS_SENTINEL {
                validate_url(address)?;
            }
        }
        for endpoint in [&self.image.endpoint, &self.compute.endpoint]
            .into_iter()
            .flatten()
        {
            validate_url(endpoint)?;
        }
        for url in self.identity.catalog.values() {
            validate_url(url)?;
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the auth token from config or environment
    pub fn get_token(&self) -> anyhow::Result<String> {
        self.identity
            .token
            .clone()
            .or_else(|| std::env::var("OS_AUTH_TOKEN").ok())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Auth token not found. Set OS_AUTH_TOKEN environment variable or specify in config"
                )
            })
    }

    /// Get the tenant id from config or environment
    pub fn get_tenant_id(&self) -> anyhow::Result<String> {
        self.identity
            .tenant_id
            .clone()
            .or_else(|| std::env::var("OS_TENANT_ID").ok())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Tenant id not found. Set OS_TENANT_ID environment variable or specify in config"
                )
            })
    }

    /// Build the caller session from identity settings
    pub fn session(&self) -> anyhow::Result<Session> {
        let session = self.identity.catalog.iter().fold(
            Session::new(self.get_token()?, self.get_tenant_id()?),
            |session, (service_type, url)| session.with_endpoint(service_type, url),
        );
        Ok(session)
    }

    /// Image service endpoint: explicit override, else the catalog
    pub fn image_endpoint(&self, session: &Session) -> anyhow::Result<String> {
        service_endpoint(&self.image, session, IMAGE_SERVICE_TYPE)
    }

    /// Compute service endpoint: explicit override, else the catalog
    pub fn compute_endpoint(&self, session: &Session) -> anyhow::Result<String> {
        service_endpoint(&self.compute, session, COMPUTE_SERVICE_TYPE)
    }

    /// Generate an example configuration file
    pub fn example() -> Self {
        let mut catalog = BTreeMap::new();
        catalog.insert(
            SERVICE_TYPE.to_string(),
            "http://controller:8386/v0.2/<tenant-id>".to_string(),
        );
        catalog.insert(
            IMAGE_SERVICE_TYPE.to_string(),
            "http://controller:9292".to_string(),
        );
        catalog.insert(
            COMPUTE_SERVICE_TYPE.to_string(),
            "http://controller:8774/v2/<tenant-id>".to_string(),
        );

        Self {
            identity: IdentityConfig {
                token: None,
                tenant_id: None,
                catalog,
            },
            savanna: SavannaConfig { address: None },
            image: ServiceConfig::default(),
            compute: ServiceConfig::default(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn service_endpoint(
    config: &ServiceConfig,
    session: &Session,
    service_type: &str,
) -> anyhow::Result<String> {
    config
        .endpoint
        .clone()
        .or_else(|| session.endpoint(service_type).map(str::to_string))
        .ok_or_else(|| anyhow::anyhow!("No '{}' endpoint configured or in catalog", service_type))
}

fn validate_url(url: &str) -> anyhow::Result<()> {
    // Example catalogs carry a "<tenant-id>" placeholder
    let candidate = url.replace(['<', '>'], "");
    url::Url::parse(&candidate).map_err(|e| anyhow::anyhow!("Invalid URL '{}': {}", url, e))?;
    Ok(())
}

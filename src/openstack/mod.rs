/// Identity, image and compute collaborators of the Savanna client
pub mod glance;
pub mod models;
pub mod nova;
pub mod session;

use async_trait::async_trait;

use crate::error::{Result, SavannaError};
use models::{Flavor, Image, Server};

pub use glance::GlanceClient;
pub use nova::NovaClient;
pub use session::Session;

/// Resolves image ids to image metadata
#[async_trait]
pub trait ImageLookup: Send + Sync {
    async fn image_get(&self, id: &str) -> Result<Image>;

    async fn image_list(&self) -> Result<Vec<Image>>;
}

/// Resolves VM ids and lists flavors
#[async_trait]
pub trait ComputeLookup: Send + Sync {
    async fn server_get(&self, vm_id: &str) -> Result<Server>;

    async fn flavor_list(&self) -> Result<Vec<Flavor>>;
}

/// Stand-in for a collaborator service with no configured endpoint.
///
/// Commands that never resolve images or VMs still work; any lookup fails
/// with a configuration error naming the missing service.
#[derive(Debug, Clone)]
pub struct Unconfigured {
    service_type: &'static str,
}

impl Unconfigured {
    pub fn new(service_type: &'static str) -> Self {
        Self { service_type }
    }

    fn error(&self) -> SavannaError {
        SavannaError::Config(format!(
            "No '{}' endpoint configured or in catalog",
            self.service_type
        ))
    }
}

#[async_trait]
impl ImageLookup for Unconfigured {
    async fn image_get(&self, _id: &str) -> Result<Image> {
        Err(self.error())
    }

    async fn image_list(&self) -> Result<Vec<Image>> {
        Err(self.error())
    }
}

#[async_trait]
impl ComputeLookup for Unconfigured {
    async fn server_get(&self, _vm_id: &str) -> Result<Server> {
        Err(self.error())
    }

    async fn flavor_list(&self) -> Result<Vec<Flavor>> {
        Err(self.error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_lookups_fail_with_config_error() {
        let images = Unconfigured::new("image");
        let err = images.image_get("img1").await.unwrap_err();
        assert!(matches!(&err, SavannaError::Config(msg) if msg.contains("'image'")));

        let compute = Unconfigured::new("compute");
        assert!(matches!(
            compute.server_get("vm1").await,
            Err(SavannaError::Config(_))
        ));
        assert!(matches!(
            compute.flavor_list().await,
            Err(SavannaError::Config(_))
        ));
    }
}

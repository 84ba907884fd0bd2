/// Compute service client
use async_trait::async_trait;
use reqwest::StatusCode;

use super::models::{Flavor, FlavorListResponse, Server, ServerResponse};
use super::ComputeLookup;
use crate::api::{self, ApiClient};
use crate::error::{Result, SavannaError};

/// Compute service (v2 API) client
#[derive(Clone, Debug)]
pub struct NovaClient {
    api: ApiClient,
}

impl NovaClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ComputeLookup for NovaClient {
    async fn server_get(&self, vm_id: &str) -> Result<Server> {
        let path = api::resource_path("servers", vm_id)?;
        let response = self.api.get_raw(&path).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SavannaError::NotFound {
                what: "server",
                id: vm_id.to_string(),
            }),
            status if status.is_success() => {
                let response: ServerResponse = api::decode(response, &path).await?;
                Ok(response.server)
            }
            _ => Err(api::rejection(response).await),
        }
    }

    async fn flavor_list(&self) -> Result<Vec<Flavor>> {
        let response: FlavorListResponse = self.api.get("flavors/detail").await?;
        Ok(response.flavors)
    }
}

/// Image service client
use async_trait::async_trait;
use reqwest::StatusCode;

use super::models::{Image, ImageListResponse};
use super::ImageLookup;
use crate::api::{self, ApiClient};
use crate::error::{Result, SavannaError};

/// Image service (v2 API) client
#[derive(Clone, Debug)]
pub struct GlanceClient {
    api: ApiClient,
}

impl GlanceClient {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ImageLookup for GlanceClient {
    async fn image_get(&self, id: &str) -> Result<Image> {
        let path = api::resource_path("v2/images", id)?;
        let response = self.api.get_raw(&path).await?;
        match response.status() {
            StatusCode::NOT_FOUND => Err(SavannaError::NotFound {
                what: "image",
                id: id.to_string(),
            }),
            status if status.is_success() => api::decode(response, &path).await,
            _ => Err(api::rejection(response).await),
        }
    }

    async fn image_list(&self) -> Result<Vec<Image>> {
        let response: ImageListResponse = self.api.get("v2/images").await?;
        Ok(response.images)
    }
}

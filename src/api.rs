/// Token-authenticated JSON client shared by the Savanna, Glance and Nova APIs
use reqwest::header::HeaderValue;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::{Result, SavannaError};

/// Header carrying the caller's session token
pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";

/// Build the pooled HTTP client shared by every scoped API client.
///
/// No auth headers are installed here; tokens are attached per request so
/// the pool can be reused across sessions.
pub fn build_http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SavannaError::Config(format!("Failed to create HTTP client: {}", e)))
}

/// Client bound to one service base URL and one session token
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: HeaderValue,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(http: Client, base_url: &str, token: &str) -> Result<Self> {
        Url::parse(base_url)
            .map_err(|e| SavannaError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;

        let mut token = HeaderValue::from_str(token)
            .map_err(|_| SavannaError::Config("Invalid auth token format".to_string()))?;
        token.set_sensitive(true);

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response> {
        let url = self.url(path);
        debug!("{} {}", method, url);

        let mut request = self
            .http
            .request(method, &url)
            .header(AUTH_TOKEN_HEADER, self.token.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|source| SavannaError::Transport { url, source })
    }

    /// GET without any status check
    pub async fn get_raw(&self, path: &str) -> Result<Response> {
        self.send::<()>(Method::GET, path, None).await
    }

    /// GET and decode a JSON body, requiring a 2xx status
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.get_raw(path).await?;
        if !response.status().is_success() {
            return Err(rejection(response).await);
        }
        decode(response, path).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        self.send::<()>(Method::DELETE, path, None).await
    }
}

/// Path of one resource in a collection, e.g. `clusters/c1`.
///
/// The id must be a single opaque path segment: separators, query and
/// fragment markers, escapes and dot segments would address another resource.
pub fn resource_path(collection: &str, id: &str) -> Result<String> {
    let invalid = id.is_empty()
        || id == "."
        || id == ".."
        || id
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '?' | '#' | '%') || c.is_control());
    if invalid {
        return Err(SavannaError::InvalidResourceId(id.to_string()));
    }
    Ok(format!("{}/{}", collection, id))
}

/// Read a response body and parse it as JSON
pub async fn decode<T: DeserializeOwned>(response: Response, context: &str) -> Result<T> {
    let url = response.url().to_string();
    let text = response
        .text()
        .await
        .map_err(|source| SavannaError::Transport { url, source })?;
    serde_json::from_str(&text).map_err(|source| SavannaError::Decode {
        context: context.to_string(),
        source,
    })
}

/// Turn an unaccepted response into a status error carrying its body
pub async fn rejection(response: Response) -> SavannaError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    SavannaError::Status { status, body }
}

/// Caller session: auth token, tenant scope and service catalog
use std::collections::HashMap;
use std::fmt;

/// Per-caller identity used to scope every outbound request.
///
/// Each scoped client owns its session, so two tenants sharing one HTTP
/// pool never see each other's token.
#[derive(Clone)]
pub struct Session {
    token: String,
    tenant_id: String,
    catalog: HashMap<String, String>,
}

impl Session {
    pub fn new(token: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            tenant_id: tenant_id.into(),
            catalog: HashMap::new(),
        }
    }

    /// Register the public endpoint of a service type (e.g. "mapreduce")
    pub fn with_endpoint(mut self, service_type: impl Into<String>, url: impl Into<String>) -> Self {
        self.catalog.insert(service_type.into(), url.into());
        self
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    /// Look up a service endpoint in the catalog
    pub fn endpoint(&self, service_type: &str) -> Option<&str> {
        self.catalog.get(service_type).map(String::as_str)
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tenant_id", &self.tenant_id)
            .field("catalog", &self.catalog)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let session = Session::new("tok", "t1").with_endpoint("image", "http://glance:9292");
        assert_eq!(session.endpoint("image"), Some("http://glance:9292"));
        assert_eq!(session.endpoint("compute"), None);
        assert_eq!(session.tenant_id(), "t1");
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("very-secret", "t1");
        assert!(!format!("{:?}", session).contains("very-secret"));
    }
}

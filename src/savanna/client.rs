/// Savanna cluster-management API client
use futures::future::try_join_all;
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use super::models::*;
use crate::api::{self, ApiClient};
use crate::error::{Result, SavannaError};
use crate::openstack::models::Image;
use crate::openstack::{ComputeLookup, ImageLookup, Session};

/// Catalog service type under which Savanna registers its endpoint
pub const SERVICE_TYPE: &str = "mapreduce";

/// Configured address value meaning "use the service catalog"
pub const ENDPOINTS_SENTINEL: &str = "endpoints";

/// Substrings marking an image as a Hadoop base image
const HADOOP_IMAGE_MARKERS: [&str; 3] = ["image.final", "hadoop", "hdp"];

/// Resolve the Savanna base URL for a session.
///
/// An explicit address is scoped with the session's tenant id; the catalog
/// endpoint is used as-is since it is already tenant-scoped.
pub fn resolve_base_url(address: Option<&str>, session: &Session) -> Result<String> {
    match address.filter(|a| !a.is_empty() && *a != ENDPOINTS_SENTINEL) {
        Some(address) => Ok(format!(
            "{}/{}",
            address.trim_end_matches('/'),
            session.tenant_id()
        )),
        None => session
            .endpoint(SERVICE_TYPE)
            .map(str::to_string)
            .ok_or_else(|| {
                SavannaError::Config(format!(
                    "No '{}' endpoint in the service catalog",
                    SERVICE_TYPE
                ))
            }),
    }
}

/// Result of a mutation the service answered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    Rejected { status: StatusCode, body: String },
}

impl Outcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Outcome::Accepted)
    }

    async fn from_response(response: Response, expected: StatusCode) -> Self {
        let status = response.status();
        if status == expected {
            Outcome::Accepted
        } else {
            let body = response.text().await.unwrap_or_default();
            Outcome::Rejected { status, body }
        }
    }
}

/// Client for one session against the Savanna API
#[derive(Clone)]
pub struct SavannaClient {
    api: ApiClient,
    images: Arc<dyn ImageLookup>,
    compute: Arc<dyn ComputeLookup>,
}

impl SavannaClient {
    pub fn new(
        api: ApiClient,
        images: Arc<dyn ImageLookup>,
        compute: Arc<dyn ComputeLookup>,
    ) -> Self {
        Self {
            api,
            images,
            compute,
        }
    }

    /// Scope a client to `session`, sharing the given connection pool
    pub fn connect(
        http: Client,
        address: Option<&str>,
        session: &Session,
        images: Arc<dyn ImageLookup>,
        compute: Arc<dyn ComputeLookup>,
    ) -> Result<Self> {
        let base_url = resolve_base_url(address, session)?;
        let api = ApiClient::new(http, &base_url, session.token())?;
        Ok(Self::new(api, images, compute))
    }

    pub fn base_url(&self) -> &str {
        self.api.base_url()
    }

    /// List clusters with base images resolved to names
    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let response = self.api.get_raw("clusters").await?;
        if response.status() != StatusCode::OK {
            return Err(api::rejection(response).await);
        }
        let list: ClusterListResponse = api::decode(response, "clusters").await?;

        try_join_all(list.clusters.into_iter().map(|record| self.shape_cluster(record))).await
    }

    async fn shape_cluster(&self, record: ClusterRecord) -> Result<Cluster> {
        let image = self.resolve_image(&record.base_image_id).await?;
        Ok(Cluster::from_record(record, image))
    }

    async fn resolve_image(&self, image_id: &str) -> Result<Image> {
        self.images
            .image_get(image_id)
            .await
            .map_err(|e| SavannaError::lookup("image", image_id, e))
    }

    /// List node templates
    pub async fn list_templates(&self) -> Result<Vec<NodeTemplate>> {
        let response = self.api.get_raw("node-templates").await?;
        if response.status() != StatusCode::OK {
            return Err(api::rejection(response).await);
        }
        let list: NodeTemplateListResponse = api::decode(response, "node-templates").await?;
        Ok(list.node_templates.into_iter().map(NodeTemplate::from).collect())
    }

    /// Request a new cluster; provisioning continues asynchronously
    pub async fn create_cluster(
        &self,
        name: &str,
        base_image_id: &str,
        templates: &BTreeMap<String, u32>,
    ) -> Result<Outcome> {
        let request = CreateClusterRequest {
            cluster: NewCluster {
                name,
                base_image_id,
                node_templates: templates,
            },
        };
        let response = self.api.post("clusters", &request).await?;
        let outcome = Outcome::from_response(response, StatusCode::ACCEPTED).await;
        log_outcome("create cluster", name, &outcome);
        Ok(outcome)
    }

    /// Request a new node template
    pub async fn create_node_template(&self, template: &NewNodeTemplate) -> Result<Outcome> {
        let response = self
            .api
            .post("node-templates", &template.to_body())
            .await?;
        let outcome = Outcome::from_response(response, StatusCode::ACCEPTED).await;
        log_outcome("create node template", template.name(), &outcome);
        Ok(outcome)
    }

    pub async fn terminate_cluster(&self, cluster_id: &str) -> Result<Outcome> {
        let response = self
            .api
            .delete(&api::resource_path("clusters", cluster_id)?)
            .await?;
        let outcome = Outcome::from_response(response, StatusCode::NO_CONTENT).await;
        log_outcome("terminate cluster", cluster_id, &outcome);
        Ok(outcome)
    }

    pub async fn delete_template(&self, template_id: &str) -> Result<Outcome> {
        let response = self
            .api
            .delete(&api::resource_path("node-templates", template_id)?)
            .await?;
        let outcome = Outcome::from_response(response, StatusCode::NO_CONTENT).await;
        log_outcome("delete node template", template_id, &outcome);
        Ok(outcome)
    }

    /// Fetch the raw cluster object
    pub async fn get_cluster(&self, cluster_id: &str) -> Result<ClusterRecord> {
        let response: ClusterResponse = self
            .api
            .get(&api::resource_path("clusters", cluster_id)?)
            .await?;
        Ok(response.cluster)
    }

    /// Fetch the raw node template object
    pub async fn get_node_template(&self, template_id: &str) -> Result<NodeTemplateRecord> {
        let response: NodeTemplateResponse = self
            .api
            .get(&api::resource_path("node-templates", template_id)?)
            .await?;
        Ok(response.node_template)
    }

    /// Cluster record together with its base image name
    pub async fn cluster_details(&self, cluster_id: &str) -> Result<ClusterDetails> {
        let record = self.get_cluster(cluster_id).await?;
        let image = self.resolve_image(&record.base_image_id).await?;
        Ok(ClusterDetails {
            record,
            base_image_name: image.name,
        })
    }

    /// Members of a cluster joined with their VM names and addresses
    pub async fn get_cluster_nodes(&self, cluster_id: &str) -> Result<Vec<ClusterNode>> {
        let cluster = self.get_cluster(cluster_id).await?;

        let lookups = cluster.nodes.iter().map(|node| async move {
            let vm_id = node.vm_id(cluster_id)?;
            let template = node.template(cluster_id)?;
            let server = self
                .compute
                .server_get(vm_id)
                .await
                .map_err(|e| SavannaError::lookup("server", vm_id, e))?;
            Ok::<_, SavannaError>(ClusterNode::new(&server, template))
        });

        try_join_all(lookups).await
    }

    /// Flavor sizing line for each template, keyed by template name
    pub async fn template_flavor_summaries(&self) -> Result<BTreeMap<String, String>> {
        let templates = self.list_templates().await?;
        let flavors = self
            .compute
            .flavor_list()
            .await
            .map_err(|e| SavannaError::lookup("flavors", "*", e))?;

        templates
            .into_iter()
            .map(|template| {
                let flavor = flavors
                    .iter()
                    .find(|f| f.name == template.flavor_name)
                    .ok_or_else(|| {
                        SavannaError::lookup(
                            "flavor",
                            template.flavor_name.as_str(),
                            SavannaError::NotFound {
                                what: "flavor",
                                id: template.flavor_name.clone(),
                            },
                        )
                    })?;
                Ok::<_, SavannaError>((template.name, flavor.summary()))
            })
            .collect()
    }

    /// Images usable as a cluster base image
    pub async fn hadoop_images(&self) -> Result<Vec<Image>> {
        let images = self
            .images
            .image_list()
            .await
            .map_err(|e| SavannaError::lookup("images", "*", e))?;
        Ok(images
            .into_iter()
            .filter(|image| HADOOP_IMAGE_MARKERS.iter().any(|m| image.name.contains(m)))
            .collect())
    }
}

fn log_outcome(action: &str, target: &str, outcome: &Outcome) {
    match outcome {
        Outcome::Accepted => info!("{} '{}' accepted", action, target),
        Outcome::Rejected { status, body } => {
            warn!("{} '{}' rejected with {}: {}", action, target, status, body)
        }
    }
}

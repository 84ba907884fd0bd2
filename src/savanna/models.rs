/// Savanna API data models
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::roles::{NodeRoles, Role};
use crate::error::{Result, SavannaError};
use crate::openstack::models::{Image, Server};

/// Cluster object as returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRecord {
    pub id: String,
    pub name: String,
    pub base_image_id: String,
    #[serde(default)]
    pub node_templates: BTreeMap<String, u32>,
    pub status: String,
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cluster member as listed inside a cluster object
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_template: Option<TemplateRef>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Reference from a node to the template it was built from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateRef {
    pub id: String,
    pub name: String,
}

/// Node template object as returned by the service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTemplateRecord {
    pub id: String,
    pub name: String,
    pub flavor_id: String,
    pub node_type: NodeTypeRef,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeTypeRef {
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Cluster list response
#[derive(Debug, Deserialize)]
pub struct ClusterListResponse {
    pub clusters: Vec<ClusterRecord>,
}

/// Node template list response
#[derive(Debug, Deserialize)]
pub struct NodeTemplateListResponse {
    pub node_templates: Vec<NodeTemplateRecord>,
}

/// Single cluster response
#[derive(Debug, Deserialize)]
pub struct ClusterResponse {
    pub cluster: ClusterRecord,
}

/// Single node template response
#[derive(Debug, Deserialize)]
pub struct NodeTemplateResponse {
    pub node_template: NodeTemplateRecord,
}

/// Lifecycle state reported for a cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterStatus {
    Active,
    Starting,
    Stopping,
    Other(String),
}

impl ClusterStatus {
    /// `Some(true)` once active, `None` while starting or stopping
    pub fn is_settled(&self) -> Option<bool> {
        match self {
            ClusterStatus::Active => Some(true),
            ClusterStatus::Starting | ClusterStatus::Stopping => None,
            ClusterStatus::Other(_) => Some(false),
        }
    }
}

impl From<&str> for ClusterStatus {
    fn from(s: &str) -> Self {
        match s {
            "Active" => ClusterStatus::Active,
            "Starting" => ClusterStatus::Starting,
            "Stopping" => ClusterStatus::Stopping,
            other => ClusterStatus::Other(other.to_string()),
        }
    }
}

impl fmt::Display for ClusterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterStatus::Active => f.write_str("Active"),
            ClusterStatus::Starting => f.write_str("Starting"),
            ClusterStatus::Stopping => f.write_str("Stopping"),
            ClusterStatus::Other(s) => f.write_str(s),
        }
    }
}

/// Cluster shaped for display, with the base image resolved to its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub node_templates: Vec<String>,
    pub base_image: String,
    pub status: ClusterStatus,
    pub nodes_count: usize,
}

impl Cluster {
    pub fn from_record(record: ClusterRecord, base_image: Image) -> Self {
        Self {
            node_templates: format_templates(&record.node_templates),
            nodes_count: record.nodes.len(),
            status: ClusterStatus::from(record.status.as_str()),
            id: record.id,
            name: record.name,
            base_image: base_image.name,
        }
    }
}

/// Render a template-name to count mapping as "name: count" lines
pub fn format_templates(templates: &BTreeMap<String, u32>) -> Vec<String> {
    templates
        .iter()
        .map(|(name, count)| format!("{}: {}", name, count))
        .collect()
}

/// Node template shaped for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeTemplate {
    pub id: String,
    pub name: String,
    pub node_type: String,
    pub flavor_name: String,
}

impl NodeTemplate {
    /// Roles encoded in the node type tag
    pub fn roles(&self) -> Result<NodeRoles> {
        self.node_type.parse()
    }
}

impl From<NodeTemplateRecord> for NodeTemplate {
    fn from(record: NodeTemplateRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            node_type: record.node_type.name,
            flavor_name: record.flavor_id,
        }
    }
}

/// Cluster member joined with the VM it runs on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub id: String,
    pub vm: String,
    pub template_name: String,
    pub template_id: String,
}

impl ClusterNode {
    pub fn new(server: &Server, template: &TemplateRef) -> Self {
        Self {
            id: server.id.clone(),
            vm: format!("{} ({})", server.name, server.all_addresses().join(", ")),
            template_name: template.name.clone(),
            template_id: template.id.clone(),
        }
    }
}

/// Cluster detail view data
#[derive(Debug, Clone)]
pub struct ClusterDetails {
    pub record: ClusterRecord,
    pub base_image_name: String,
}

/// Body of a create-cluster request
#[derive(Debug, Serialize)]
pub struct CreateClusterRequest<'a> {
    pub cluster: NewCluster<'a>,
}

#[derive(Debug, Serialize)]
pub struct NewCluster<'a> {
    pub name: &'a str,
    pub base_image_id: &'a str,
    pub node_templates: &'a BTreeMap<String, u32>,
}

/// Node template to be created, with its roles resolved up front
#[derive(Debug, Clone)]
pub struct NewNodeTemplate {
    name: String,
    node_type: String,
    flavor_id: String,
    roles: NodeRoles,
    options: BTreeMap<Role, Value>,
}

impl NewNodeTemplate {
    pub fn new(
        name: impl Into<String>,
        node_type: impl Into<String>,
        flavor_id: impl Into<String>,
    ) -> Result<Self> {
        let node_type = node_type.into();
        let roles = node_type.parse()?;
        Ok(Self {
            name: name.into(),
            node_type,
            flavor_id: flavor_id.into(),
            roles,
            options: BTreeMap::new(),
        })
    }

    /// Set the option block for one role; ignored if the role is absent
    pub fn option(mut self, role: Role, options: Value) -> Self {
        self.options.insert(role, options);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn roles(&self) -> NodeRoles {
        self.roles
    }

    /// JSON body for POST /node-templates
    pub fn to_body(&self) -> Value {
        let mut template = Map::new();
        template.insert("name".into(), Value::String(self.name.clone()));
        template.insert("node_type".into(), Value::String(self.node_type.clone()));
        template.insert("flavor_id".into(), Value::String(self.flavor_id.clone()));
        for role in self.roles.iter() {
            let block = self
                .options
                .get(&role)
                .cloned()
                .unwrap_or_else(|| Value::Object(Map::new()));
            template.insert(role.options_key().into(), block);
        }

        let mut body = Map::new();
        body.insert("node_template".into(), Value::Object(template));
        Value::Object(body)
    }
}

impl NodeRecord {
    pub(crate) fn vm_id(&self, cluster_id: &str) -> Result<&str> {
        self.vm_id.as_deref().ok_or_else(|| SavannaError::MissingField {
            context: format!("node of cluster {}", cluster_id),
            field: "vm_id",
        })
    }

    pub(crate) fn template(&self, cluster_id: &str) -> Result<&TemplateRef> {
        self.node_template
            .as_ref()
            .ok_or_else(|| SavannaError::MissingField {
                context: format!("node of cluster {}", cluster_id),
                field: "node_template",
            })
    }
}

/// Templates whose role set is exactly `roles`
pub fn templates_by_roles(templates: &[NodeTemplate], roles: NodeRoles) -> Vec<&NodeTemplate> {
    templates
        .iter()
        .filter(|t| t.roles().map(|r| r == roles).unwrap_or(false))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image(name: &str) -> Image {
        Image {
            id: "img1".into(),
            name: name.into(),
        }
    }

    #[test]
    fn test_cluster_from_fixture() {
        let record: ClusterRecord = serde_json::from_value(json!({
            "id": "c1",
            "name": "demo",
            "base_image_id": "img1",
            "node_templates": {"worker": 3},
            "status": "Active",
            "nodes": [{}, {}, {}]
        }))
        .unwrap();

        let cluster = Cluster::from_record(record, image("hadoop-image"));
        assert_eq!(
            cluster,
            Cluster {
                id: "c1".into(),
                name: "demo".into(),
                node_templates: vec!["worker: 3".into()],
                base_image: "hadoop-image".into(),
                status: ClusterStatus::Active,
                nodes_count: 3,
            }
        );
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let record: ClusterRecord = serde_json::from_value(json!({
            "id": "c1",
            "name": "demo",
            "base_image_id": "img1",
            "status": "Starting",
            "tenant_id": "t1"
        }))
        .unwrap();
        assert_eq!(record.extra.get("tenant_id"), Some(&json!("t1")));
        assert!(record.nodes.is_empty());
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(ClusterStatus::from("Active").is_settled(), Some(true));
        assert_eq!(ClusterStatus::from("Stopping").is_settled(), None);
        let other = ClusterStatus::from("Error");
        assert_eq!(other.is_settled(), Some(false));
        assert_eq!(other.to_string(), "Error");
    }

    #[test]
    fn test_format_templates_covers_every_key() {
        let mut templates = BTreeMap::new();
        templates.insert("master".to_string(), 1);
        templates.insert("worker".to_string(), 5);
        let formatted = format_templates(&templates);
        assert_eq!(formatted.len(), 2);
        assert!(formatted.contains(&"master: 1".to_string()));
        assert!(formatted.contains(&"worker: 5".to_string()));
    }

    #[test]
    fn test_master_template_body() {
        let body = NewNodeTemplate::new("master", "JT+NN", "m1.medium")
            .unwrap()
            .option(Role::JobTracker, json!({"heap_size": "896"}))
            .option(Role::TaskTracker, json!({"heap_size": "1"}))
            .to_body();
        let template = &body["node_template"];
        assert_eq!(template["name"], "master");
        assert_eq!(template["node_type"], "JT+NN");
        assert_eq!(template["flavor_id"], "m1.medium");
        assert_eq!(template["job_tracker"], json!({"heap_size": "896"}));
        assert_eq!(template["name_node"], json!({}));
        assert!(template.get("task_tracker").is_none());
        assert!(template.get("data_node").is_none());
    }

    #[test]
    fn test_worker_template_body() {
        let body = NewNodeTemplate::new("worker", "TT+DN", "m1.small")
            .unwrap()
            .to_body();
        let template = &body["node_template"];
        assert!(template.get("task_tracker").is_some());
        assert!(template.get("data_node").is_some());
        assert!(template.get("job_tracker").is_none());
        assert!(template.get("name_node").is_none());
    }

    #[test]
    fn test_invalid_node_type_rejected() {
        let result = NewNodeTemplate::new("bad", "master", "m1.small");
        assert!(matches!(result, Err(SavannaError::InvalidNodeType(_))));
    }

    #[test]
    fn test_templates_by_roles() {
        let templates = vec![
            NodeTemplate {
                id: "1".into(),
                name: "master".into(),
                node_type: "JT+NN".into(),
                flavor_name: "m1.large".into(),
            },
            NodeTemplate {
                id: "2".into(),
                name: "worker".into(),
                node_type: "TT+DN".into(),
                flavor_name: "m1.small".into(),
            },
            NodeTemplate {
                id: "3".into(),
                name: "jt-only".into(),
                node_type: "JT".into(),
                flavor_name: "m1.small".into(),
            },
        ];
        let masters = templates_by_roles(&templates, "JT+NN".parse().unwrap());
        assert_eq!(masters.len(), 1);
        assert_eq!(masters[0].name, "master");
        let workers = templates_by_roles(&templates, "TT+DN".parse().unwrap());
        assert_eq!(workers[0].name, "worker");
    }
}

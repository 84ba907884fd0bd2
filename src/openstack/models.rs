/// Image and compute service data models
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Image metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
}

/// Image list response
#[derive(Debug, Deserialize)]
pub struct ImageListResponse {
    pub images: Vec<Image>,
}

/// Compute server (VM)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    /// Network name to the addresses attached on that network
    #[serde(default)]
    pub addresses: BTreeMap<String, Vec<ServerAddress>>,
}

/// Single address of a server on one network
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerAddress {
    pub addr: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
}

impl Server {
    /// Every address across all attached networks
    pub fn all_addresses(&self) -> Vec<&str> {
        self.addresses
            .values()
            .flatten()
            .map(|a| a.addr.as_str())
            .collect()
    }
}

/// Server get response
#[derive(Debug, Deserialize)]
pub struct ServerResponse {
    pub server: Server,
}

/// Compute sizing profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flavor {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub vcpus: u32,
    /// Memory in MB
    pub ram: u64,
    /// Root disk in GB
    pub disk: u64,
}

impl Flavor {
    pub fn summary(&self) -> String {
        format!(
            "{} vcpu, {} Mb RAM, {} Gb disk",
            self.vcpus, self.ram, self.disk
        )
    }
}

/// Flavor list response
#[derive(Debug, Deserialize)]
pub struct FlavorListResponse {
    pub flavors: Vec<Flavor>,
}

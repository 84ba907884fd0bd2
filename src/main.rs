/// savanna-dash - Hadoop clusters on OpenStack
///
/// Command-line front end for the Savanna cluster-management service:
/// list, inspect, create and terminate clusters and node templates.
mod api;
mod config;
mod error;
mod openstack;
mod savanna;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{build_http_client, ApiClient};
use crate::config::{DashboardConfig, COMPUTE_SERVICE_TYPE, IMAGE_SERVICE_TYPE};
use crate::error::OrEmptyWhenRejected;
use crate::openstack::{ComputeLookup, GlanceClient, ImageLookup, NovaClient, Unconfigured};
use crate::savanna::models::{templates_by_roles, NewNodeTemplate};
use crate::savanna::roles::{NodeRoles, Role};
use crate::savanna::{Outcome, SavannaClient};

#[derive(Parser)]
#[command(name = "savanna-dash")]
#[command(about = "Manage Hadoop clusters through the Savanna API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, default_value = "dashboard.yaml")]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate example configuration file
    Init,

    /// List clusters
    Clusters {
        /// Show an empty list when the service rejects the request
        #[arg(long)]
        empty_on_error: bool,
    },

    /// List node templates
    Templates {
        /// Only templates with exactly these roles, e.g. JT+NN
        #[arg(long)]
        roles: Option<String>,

        /// Show an empty list when the service rejects the request
        #[arg(long)]
        empty_on_error: bool,
    },

    /// Show cluster details
    Cluster { id: String },

    /// List the nodes of a cluster
    Nodes { id: String },

    /// Show a node template
    Template { id: String },

    /// Create a cluster
    CreateCluster {
        name: String,

        /// Base image id
        #[arg(long)]
        image: String,

        /// Node template and count, e.g. --template worker=3
        #[arg(long = "template", value_parser = parse_template_count, required = true)]
        templates: Vec<(String, u32)>,
    },

    /// Create a node template
    CreateTemplate {
        name: String,

        /// Role composition, e.g. JT+NN or TT+DN
        #[arg(long)]
        node_type: String,

        /// Flavor name
        #[arg(long)]
        flavor: String,

        /// JobTracker options as JSON
        #[arg(long, value_parser = parse_json)]
        jt_opts: Option<serde_json::Value>,

        /// NameNode options as JSON
        #[arg(long, value_parser = parse_json)]
        nn_opts: Option<serde_json::Value>,

        /// TaskTracker options as JSON
        #[arg(long, value_parser = parse_json)]
        tt_opts: Option<serde_json::Value>,

        /// DataNode options as JSON
        #[arg(long, value_parser = parse_json)]
        dn_opts: Option<serde_json::Value>,
    },

    /// Terminate a cluster
    Terminate { id: String },

    /// Delete a node template
    DeleteTemplate { id: String },

    /// List images usable as a cluster base image
    Images,

    /// Show the flavor sizing of every node template
    Flavors,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("savanna_dash={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let result = match &cli.command {
        Commands::Init => init_config(&cli).await,
        command => run(&cli, command).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Build a Savanna client scoped to the configured session.
///
/// Image and compute endpoints are optional; without them only the commands
/// that resolve images, VMs or flavors fail.
fn connect(config: &DashboardConfig) -> Result<SavannaClient> {
    let session = config.session()?;
    let http = build_http_client(config.timeout())?;

    let images: Arc<dyn ImageLookup> = match config.image_endpoint(&session) {
        Ok(endpoint) => Arc::new(GlanceClient::new(ApiClient::new(
            http.clone(),
            &endpoint,
            session.token(),
        )?)),
        Err(_) => Arc::new(Unconfigured::new(IMAGE_SERVICE_TYPE)),
    };
    let compute: Arc<dyn ComputeLookup> = match config.compute_endpoint(&session) {
        Ok(endpoint) => Arc::new(NovaClient::new(ApiClient::new(
            http.clone(),
            &endpoint,
            session.token(),
        )?)),
        Err(_) => Arc::new(Unconfigured::new(COMPUTE_SERVICE_TYPE)),
    };

    let client = SavannaClient::connect(
        http,
        config.savanna.address.as_deref(),
        &session,
        images,
        compute,
    )
    .context("Failed to create Savanna client")?;

    info!("Using Savanna API at {}", client.base_url());
    Ok(client)
}

async fn run(cli: &Cli, command: &Commands) -> Result<()> {
    let config = DashboardConfig::from_file(&cli.config).context("Failed to load configuration")?;
    let client = connect(&config)?;

    match command {
        Commands::Init => unreachable!("init is handled before loading configuration"),
        Commands::Clusters { empty_on_error } => list_clusters(&client, *empty_on_error).await,
        Commands::Templates {
            roles,
            empty_on_error,
        } => list_templates(&client, roles.as_deref(), *empty_on_error).await,
        Commands::Cluster { id } => show_cluster(&client, id).await,
        Commands::Nodes { id } => list_nodes(&client, id).await,
        Commands::Template { id } => show_template(&client, id).await,
        Commands::CreateCluster {
            name,
            image,
            templates,
        } => {
            let templates: BTreeMap<String, u32> = templates.iter().cloned().collect();
            let outcome = client.create_cluster(name, image, &templates).await?;
            report(outcome, &format!("Cluster '{}' is being provisioned", name))
        }
        Commands::CreateTemplate {
            name,
            node_type,
            flavor,
            jt_opts,
            nn_opts,
            tt_opts,
            dn_opts,
        } => {
            let mut template = NewNodeTemplate::new(name.as_str(), node_type.as_str(), flavor.as_str())?;
            for (role, opts) in [
                (Role::JobTracker, jt_opts),
                (Role::NameNode, nn_opts),
                (Role::TaskTracker, tt_opts),
                (Role::DataNode, dn_opts),
            ] {
                if let Some(opts) = opts {
                    template = template.option(role, opts.clone());
                }
            }
            info!("Creating {} node template '{}'", template.roles(), name);
            let outcome = client.create_node_template(&template).await?;
            report(outcome, &format!("Node template '{}' created", name))
        }
        Commands::Terminate { id } => {
            let outcome = client.terminate_cluster(id).await?;
            report(outcome, &format!("Cluster {} terminated", id))
        }
        Commands::DeleteTemplate { id } => {
            let outcome = client.delete_template(id).await?;
            report(outcome, &format!("Node template {} deleted", id))
        }
        Commands::Images => {
            for image in client.hadoop_images().await? {
                info!("  - {} (ID: {})", image.name, image.id);
            }
            Ok(())
        }
        Commands::Flavors => {
            for (template, summary) in client.template_flavor_summaries().await? {
                info!("  - {}: {}", template, summary);
            }
            Ok(())
        }
    }
}

fn report(outcome: Outcome, success: &str) -> Result<()> {
    match outcome {
        Outcome::Accepted => {
            info!("✓ {}", success);
            Ok(())
        }
        Outcome::Rejected { status, body } => {
            anyhow::bail!("Savanna rejected the request with status {}: {}", status, body)
        }
    }
}

async fn list_clusters(client: &SavannaClient, empty_on_error: bool) -> Result<()> {
    let mut clusters = client.list_clusters().await;
    if empty_on_error {
        clusters = clusters.or_empty_when_rejected();
    }
    let clusters = clusters.context("Unable to retrieve clusters")?;

    if clusters.is_empty() {
        info!("No clusters found");
        return Ok(());
    }

    info!("Clusters:");
    for cluster in clusters {
        let marker = match cluster.status.is_settled() {
            None => " (in progress)",
            _ => "",
        };
        info!(
            "  - {} (ID: {}, Status: {}{}, Image: {}, Nodes: {})",
            cluster.name,
            cluster.id,
            cluster.status,
            marker,
            cluster.base_image,
            cluster.nodes_count
        );
        for template in &cluster.node_templates {
            info!("      {}", template);
        }
    }

    Ok(())
}

async fn list_templates(
    client: &SavannaClient,
    roles: Option<&str>,
    empty_on_error: bool,
) -> Result<()> {
    let mut templates = client.list_templates().await;
    if empty_on_error {
        templates = templates.or_empty_when_rejected();
    }
    let mut templates = templates.context("Unable to retrieve node templates")?;

    if let Some(roles) = roles {
        let roles: NodeRoles = roles.parse()?;
        templates = templates_by_roles(&templates, roles)
            .into_iter()
            .cloned()
            .collect();
    }

    if templates.is_empty() {
        info!("No node templates found");
        return Ok(());
    }

    info!("Node templates:");
    for template in templates {
        info!(
            "  - {} (ID: {}, Type: {}, Flavor: {})",
            template.name, template.id, template.node_type, template.flavor_name
        );
    }

    Ok(())
}

async fn show_cluster(client: &SavannaClient, id: &str) -> Result<()> {
    let details = client.cluster_details(id).await?;
    let record = &details.record;

    info!("Cluster: {} (ID: {})", record.name, record.id);
    info!("  Status: {}", record.status);
    info!("  Base image: {}", details.base_image_name);
    info!("  Node templates:");
    for line in savanna::models::format_templates(&record.node_templates) {
        info!("    {}", line);
    }
    info!("  Nodes: {}", record.nodes.len());

    Ok(())
}

async fn list_nodes(client: &SavannaClient, id: &str) -> Result<()> {
    let nodes = client.get_cluster_nodes(id).await?;

    info!("Nodes of cluster {}:", id);
    for node in nodes {
        info!(
            "  - {} [{}] (template: {}, ID: {})",
            node.vm, node.id, node.template_name, node.template_id
        );
    }

    Ok(())
}

/// Print the raw node template as JSON on stdout so it can be piped,
/// unlike the other commands which report through the log.
async fn show_template(client: &SavannaClient, id: &str) -> Result<()> {
    let template = client.get_node_template(id).await?;
    println!("{}", serde_json::to_string_pretty(&template)?);
    Ok(())
}

/// Initialize example configuration file
async fn init_config(cli: &Cli) -> Result<()> {
    if cli.config.exists() {
        anyhow::bail!(
            "Configuration file already exists: {}",
            cli.config.display()
        );
    }

    let example_config = DashboardConfig::example();
    let yaml = serde_yaml::to_string(&example_config)?;

    tokio::fs::write(&cli.config, yaml)
        .await
        .context("Failed to write configuration file")?;

    info!("Example configuration created: {}", cli.config.display());
    info!("");
    info!("Next steps:");
    info!("  1. Replace the catalog endpoints with your deployment's URLs");
    info!("  2. Export your session credentials:");
    info!("     export OS_AUTH_TOKEN=your-token OS_TENANT_ID=your-tenant");
    info!("  3. List clusters:");
    info!("     savanna-dash clusters");

    Ok(())
}

fn parse_template_count(s: &str) -> Result<(String, u32), String> {
    let (name, count) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=COUNT, got '{}'", s))?;
    let count = count
        .parse()
        .map_err(|_| format!("invalid count '{}' for template '{}'", count, name))?;
    Ok((name.to_string(), count))
}

fn parse_json(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {}", e))
}

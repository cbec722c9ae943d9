//! Command-line tool for inspecting OPC UA servers.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::redundant_pub_crate)]

mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ua_client::ClientConfig;
use ua_client::logging::configure_logging;
use ua_client::ua_types::NodeId;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    configure_logging(&cli.log_level)?;

    let config = cli.client_config()?;

    match cli.command {
        Commands::Endpoints => commands::endpoints(config).await,
        Commands::Browse { node } => commands::browse(config, node).await,
        Commands::Read { nodes } => commands::read(config, nodes).await,
        Commands::Subscribe {
            nodes,
            interval_ms,
            duration_secs,
        } => commands::subscribe(config, nodes, interval_ms, duration_secs).await,
    }
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Server endpoint, for example `opc.tcp://localhost:4840`
    #[arg(long, global = true, env = "UA_ENDPOINT")]
    endpoint: Option<String>,

    /// Client configuration file (TOML)
    #[arg(long, global = true, env = "UA_CONFIG")]
    config: Option<PathBuf>,

    /// Default request timeout in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u32>,

    /// Log filter used when `RUST_LOG` is not set
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    /// The config file, if any, with command-line overrides applied.
    fn client_config(&self) -> Result<ClientConfig> {
        let mut config = match &self.config {
            Some(path) => ClientConfig::from_toml_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ClientConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            config.endpoint_url.clone_from(endpoint);
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.request_timeout_ms = timeout_ms;
        }

        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the endpoints of the server
    Endpoints,

    /// List the references of a node, following continuation points
    Browse {
        /// Node to browse, for example `i=85` or `ns=2;s=Line1`
        #[arg(default_value = "i=85")]
        node: NodeId,
    },

    /// Read the value of one or more nodes
    Read {
        /// Nodes to read
        #[arg(required = true)]
        nodes: Vec<NodeId>,
    },

    /// Print data changes of one or more nodes
    Subscribe {
        /// Nodes to monitor
        #[arg(required = true)]
        nodes: Vec<NodeId>,

        /// Publishing and sampling interval
        #[arg(long, default_value_t = 1000)]
        interval_ms: u32,

        /// How long to listen before exiting
        #[arg(long, default_value_t = 10)]
        duration_secs: u64,
    },
}

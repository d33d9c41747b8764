//! ClusterPulse CLI
//!
//! A command-line tool for querying cluster state through the agent API
//! and running operator scripts remotely.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cluster, tasks};

/// ClusterPulse CLI
#[derive(Parser)]
#[command(name = "cpulse")]
#[command(author, version, about = "CLI for the ClusterPulse operations agent", long_about = None)]
pub struct Cli {
    /// Agent API endpoint URL (can also be set via PULSE_API_URL env var)
    #[arg(long, env = "PULSE_API_URL", default_value = "http://localhost:8000")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Get cluster resources
    #[command(subcommand)]
    Get(GetCommands),

    /// Show the aggregated cluster overview
    Overview,

    /// Run a script on the agent
    Run {
        /// Script body to execute
        script: String,

        /// Script type: bash, python, or shell
        #[arg(long, default_value = "bash")]
        script_type: String,

        /// Wall-clock timeout in seconds
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Environment variables for the child process (KEY=VALUE, repeatable).
        /// The ambient environment is not inherited.
        #[arg(long = "env", value_parser = tasks::parse_env_pair)]
        env: Vec<(String, String)>,
    },

    /// List tasks currently running on the agent
    Running,
}

#[derive(Subcommand)]
pub enum GetCommands {
    /// Get cluster nodes
    Nodes,

    /// Get pods
    Pods {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Get services
    Services {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },

    /// Get namespaces
    Namespaces,

    /// Get deployments
    Deployments {
        /// Filter by namespace
        #[arg(long, short)]
        namespace: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Get(get_cmd) => match get_cmd {
            GetCommands::Nodes => {
                cluster::show_nodes(&client, cli.format).await?;
            }
            GetCommands::Pods { namespace } => {
                cluster::show_pods(&client, namespace.as_deref(), cli.format).await?;
            }
            GetCommands::Services { namespace } => {
                cluster::show_services(&client, namespace.as_deref(), cli.format).await?;
            }
            GetCommands::Namespaces => {
                cluster::show_namespaces(&client, cli.format).await?;
            }
            GetCommands::Deployments { namespace } => {
                cluster::show_deployments(&client, namespace.as_deref(), cli.format).await?;
            }
        },
        Commands::Overview => {
            cluster::show_overview(&client, cli.format).await?;
        }
        Commands::Run {
            script,
            script_type,
            timeout,
            env,
        } => {
            tasks::run_script(&client, &script, &script_type, timeout, &env, cli.format).await?;
        }
        Commands::Running => {
            tasks::show_running(&client, cli.format).await?;
        }
    }

    Ok(())
}

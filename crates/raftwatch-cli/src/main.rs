use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "raftwatch",
    about = "raftwatch — replication progress checks for Raft clusters",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Path to a raftwatch.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the health of the cluster.
    ///
    /// Locates the leader, samples its Raft status twice one interval
    /// apart, and reports whether the commit index and every follower's
    /// match index advanced.
    ClusterHealth {
        /// Check the health every 10 seconds until CTRL+C
        #[arg(long)]
        forever: bool,
        /// Comma-separated client URLs to probe, in order
        #[arg(long, value_delimiter = ',')]
        endpoints: Vec<String>,
        /// Comma-separated seeds to list members from
        #[arg(long, value_delimiter = ',')]
        seeds: Vec<String>,
        /// Reject conflicting leadership claims across endpoints
        #[arg(long)]
        strict_leader: bool,
        /// Verify https endpoints against this CA bundle
        #[arg(long)]
        ca_file: Option<PathBuf>,
        /// Client certificate for https endpoints
        #[arg(long)]
        cert_file: Option<PathBuf>,
        /// Client private key for https endpoints
        #[arg(long)]
        key_file: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // Logs go to stderr; stdout carries the report.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new("raftwatch=info,raftwatch_health=info")
                }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::ClusterHealth {
            forever,
            endpoints,
            seeds,
            strict_leader,
            ca_file,
            cert_file,
            key_file,
        } => {
            let args = commands::cluster_health::Args {
                config: cli.config,
                forever,
                endpoints,
                seeds,
                strict_leader,
                ca_file,
                cert_file,
                key_file,
            };
            commands::cluster_health::run(args).await
        }
    }
}

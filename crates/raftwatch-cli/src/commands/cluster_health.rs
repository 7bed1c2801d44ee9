use std::path::PathBuf;
use std::process::ExitCode;

use raftwatch_health::{
    client_config, ClusterHealthMonitor, HttpTransport, LeaderPolicy, MembersApiResolver,
    MembershipResolver, Mode, MonitorOutcome, RaftwatchConfig, StaticMembers,
};
use tokio::sync::watch;
use tracing::{error, info};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_UNHEALTHY: u8 = 1;
pub const EXIT_BAD_ARGS: u8 = 2;
pub const EXIT_SERVER_ERROR: u8 = 4;

pub struct Args {
    pub config: Option<PathBuf>,
    pub forever: bool,
    pub endpoints: Vec<String>,
    pub seeds: Vec<String>,
    pub strict_leader: bool,
    pub ca_file: Option<PathBuf>,
    pub cert_file: Option<PathBuf>,
    pub key_file: Option<PathBuf>,
}

pub async fn run(args: Args) -> anyhow::Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => match RaftwatchConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error: {e}");
                return Ok(ExitCode::from(EXIT_BAD_ARGS));
            }
        },
        None => RaftwatchConfig::default(),
    };
    apply_overrides(&mut config, &args);

    let (monitor_config, probe_timeout) = match (config.monitor_config(), config.probe_timeout()) {
        (Ok(m), Ok(t)) => (m, t),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(EXIT_BAD_ARGS));
        }
    };

    let tls = match client_config(&config.tls) {
        Ok(tls) => tls,
        Err(e) => {
            eprintln!("Error: {e}");
            return Ok(ExitCode::from(EXIT_BAD_ARGS));
        }
    };
    let transport = HttpTransport::new(probe_timeout).with_tls(tls);

    // Members are resolved once; a continuous run keeps this endpoint set.
    let resolved = if config.endpoints.is_empty() {
        MembersApiResolver::new(transport.clone(), config.seeds_or_default())
            .resolve()
            .await
    } else {
        StaticMembers::new(config.endpoints.clone()).resolve().await
    };
    let endpoints = match resolved {
        Ok(endpoints) => endpoints,
        Err(e) => {
            println!("cluster may be unhealthy: failed to list members");
            error!(error = %e, "member resolution failed");
            return Ok(ExitCode::from(EXIT_SERVER_ERROR));
        }
    };

    let mode = if args.forever { Mode::Continuous } else { Mode::OneShot };
    let monitor = ClusterHealthMonitor::new(transport, endpoints, mode).with_config(monitor_config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let _shutdown_guard = match mode {
        Mode::Continuous => {
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("interrupt received, stopping");
                    let _ = shutdown_tx.send(true);
                }
            });
            None
        }
        Mode::OneShot => Some(shutdown_tx),
    };

    let outcome = monitor.run(&mut std::io::stdout(), shutdown_rx).await?;
    Ok(ExitCode::from(exit_status(outcome)))
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut RaftwatchConfig, args: &Args) {
    if !args.endpoints.is_empty() {
        config.endpoints = args.endpoints.clone();
    }
    if !args.seeds.is_empty() {
        config.seeds = args.seeds.clone();
    }
    if args.strict_leader {
        config.monitor.leader_policy = Some(LeaderPolicy::CrossChecked);
    }
    if args.ca_file.is_some() {
        config.tls.ca_file = args.ca_file.clone();
    }
    if args.cert_file.is_some() {
        config.tls.cert_file = args.cert_file.clone();
    }
    if args.key_file.is_some() {
        config.tls.key_file = args.key_file.clone();
    }
}

pub fn exit_status(outcome: MonitorOutcome) -> u8 {
    match outcome {
        MonitorOutcome::Healthy | MonitorOutcome::Cancelled => EXIT_SUCCESS,
        MonitorOutcome::Unhealthy
        | MonitorOutcome::Unreachable
        | MonitorOutcome::ConfigurationChanged => EXIT_UNHEALTHY,
    }
}

//! Cluster health monitoring loop.
//!
//! One cycle probes every endpoint for the leader, pauses, probes the
//! leader's endpoint again and evaluates the two snapshots. One-shot mode
//! runs a single cycle; continuous mode repeats until the shutdown signal
//! fires. Every pause races the shutdown signal.

use std::io::{self, Write};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{format_endpoints, HealthError};
use crate::evaluator::{evaluate, HealthReport};
use crate::fetch::Transport;
use crate::locator::{locate_leader_with_policy, LeaderPolicy, LeaderStatus};

/// Whether to run a single cycle or repeat until cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    OneShot,
    Continuous,
}

/// Pause lengths and leader policy for the loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Pause between the two snapshots of one cycle.
    pub interval: Duration,
    /// Pause after a failed probe before retrying (continuous mode).
    pub backoff: Duration,
    /// Pause after a report before the next cycle (continuous mode).
    pub repeat: Duration,
    pub leader_policy: LeaderPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            backoff: Duration::from_secs(10),
            repeat: Duration::from_secs(10),
            leader_policy: LeaderPolicy::FirstResponder,
        }
    }
}

/// How a monitoring run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// One-shot report with an advancing commit index.
    Healthy,
    /// One-shot report with a stalled commit index.
    Unhealthy,
    /// One-shot run where no leader could be probed.
    Unreachable,
    /// Membership changed mid-measurement. Ends the run in either mode.
    ConfigurationChanged,
    /// The shutdown signal fired.
    Cancelled,
}

enum Cycle {
    Report(HealthReport),
    Unreachable,
    ConfigurationChanged,
    Cancelled,
}

/// Drives evaluation cycles against a fixed endpoint set.
pub struct ClusterHealthMonitor<T> {
    transport: T,
    endpoints: Vec<String>,
    mode: Mode,
    config: MonitorConfig,
}

impl<T: Transport> ClusterHealthMonitor<T> {
    /// Create a monitor with default pauses.
    pub fn new(transport: T, endpoints: Vec<String>, mode: Mode) -> Self {
        Self {
            transport,
            endpoints,
            mode,
            config: MonitorConfig::default(),
        }
    }

    /// Override pauses and leader policy.
    pub fn with_config(mut self, config: MonitorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Run until one-shot completion, a configuration change, or shutdown.
    ///
    /// Reports are written to `out`. Only write failures on `out` surface
    /// as errors.
    pub async fn run<W: Write>(
        &self,
        out: &mut W,
        mut shutdown: watch::Receiver<bool>,
    ) -> io::Result<MonitorOutcome> {
        info!(mode = ?self.mode, endpoints = self.endpoints.len(), "cluster health check starting");

        loop {
            if *shutdown.borrow_and_update() {
                return Ok(MonitorOutcome::Cancelled);
            }

            let pause_for = match self.run_cycle(out, &mut shutdown).await? {
                Cycle::Cancelled => return Ok(MonitorOutcome::Cancelled),
                Cycle::ConfigurationChanged => return Ok(MonitorOutcome::ConfigurationChanged),
                Cycle::Unreachable => match self.mode {
                    Mode::OneShot => return Ok(MonitorOutcome::Unreachable),
                    Mode::Continuous => self.config.backoff,
                },
                Cycle::Report(report) => match self.mode {
                    Mode::OneShot if report.is_healthy() => return Ok(MonitorOutcome::Healthy),
                    Mode::OneShot => return Ok(MonitorOutcome::Unhealthy),
                    Mode::Continuous => self.config.repeat,
                },
            };

            debug!(pause = ?pause_for, "waiting for next cycle");
            if pause(pause_for, &mut shutdown).await {
                return Ok(MonitorOutcome::Cancelled);
            }
        }
    }

    async fn run_cycle<W: Write>(
        &self,
        out: &mut W,
        shutdown: &mut watch::Receiver<bool>,
    ) -> io::Result<Cycle> {
        let initial = match self.locate(&self.endpoints).await {
            Ok(leader) => leader,
            Err(e) => {
                warn!(error = %e, "initial leader probe failed");
                match e {
                    HealthError::ConflictingLeaders { .. } => {
                        writeln!(out, "cluster may be unhealthy: {e}")?
                    }
                    _ => writeln!(
                        out,
                        "cluster may be unhealthy: failed to connect {}",
                        format_endpoints(&self.endpoints)
                    )?,
                }
                out.flush()?;
                return Ok(Cycle::Unreachable);
            }
        };

        debug!(
            endpoint = %initial.endpoint,
            leader = %initial.snapshot.member_id,
            commit = initial.snapshot.commit_index,
            "leader located"
        );

        if pause(self.config.interval, shutdown).await {
            return Ok(Cycle::Cancelled);
        }

        let followup = match self.locate(std::slice::from_ref(&initial.endpoint)).await {
            Ok(leader) => leader,
            Err(e) => {
                warn!(endpoint = %initial.endpoint, error = %e, "follow-up leader probe failed");
                writeln!(out, "cluster is unhealthy")?;
                out.flush()?;
                return Ok(Cycle::Unreachable);
            }
        };

        match evaluate(&initial.snapshot, &followup.snapshot) {
            Ok(report) => {
                write!(out, "{report}")?;
                out.flush()?;
                Ok(Cycle::Report(report))
            }
            // Evaluation only fails when membership changed.
            Err(e) => {
                writeln!(out, "{e}")?;
                out.flush()?;
                Ok(Cycle::ConfigurationChanged)
            }
        }
    }

    async fn locate(&self, endpoints: &[String]) -> Result<LeaderStatus, HealthError> {
        locate_leader_with_policy(&self.transport, endpoints, self.config.leader_policy).await
    }
}

/// Sleep for `duration` unless shutdown fires first. Returns `true` if
/// cancelled. A closed channel never cancels. Durations past the timer's
/// range sleep until cancelled.
async fn pause(duration: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    let sleep = tokio::time::sleep(duration);
    tokio::pin!(sleep);
    loop {
        if *shutdown.borrow_and_update() {
            debug!("shutdown signal received");
            return true;
        }
        tokio::select! {
            _ = &mut sleep => return false,
            changed = shutdown.changed() => {
                if changed.is_err() {
                    (&mut sleep).await;
                    return false;
                }
            }
        }
    }
}

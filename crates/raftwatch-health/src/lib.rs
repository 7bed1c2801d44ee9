//! raftwatch-health — replication progress checks for Raft clusters.
//!
//! Samples the leader's self-reported Raft status twice, a short interval
//! apart, and compares the two snapshots: the cluster is making progress
//! when the commit index advances, and a follower is catching up when its
//! match index advances.
//!
//! # Architecture
//!
//! ```text
//! ClusterHealthMonitor
//!   ├── locate_leader(all endpoints)      → LeaderStatus (S0)
//!   │     └── fetch_snapshot() per endpoint via Transport
//!   ├── pause(interval)
//!   ├── locate_leader([leader endpoint])  → LeaderStatus (S1)
//!   ├── evaluate(S0, S1)                  → HealthReport
//!   └── print report, then exit or pause(repeat) and go again
//! ```
//!
//! `https://` endpoints go through a rustls connection built from the
//! `[tls]` CA and client certificate files.
//!
//! Every pause races a `watch` shutdown signal, so an interrupt in
//! continuous mode stops the loop between any two probes.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod fetch;
pub mod locator;
pub mod members;
pub mod monitor;
pub mod tls;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RaftwatchConfig;
pub use error::{ConfigError, FetchError, HealthError, HealthResult, MembersError, TlsError};
pub use evaluator::{evaluate, HealthReport, MemberReport, Verdict};
pub use fetch::{fetch_snapshot, HttpTransport, Transport, TransportResponse};
pub use locator::{locate_leader, locate_leader_with_policy, LeaderPolicy, LeaderStatus};
pub use members::{MembersApiResolver, MembershipResolver, StaticMembers};
pub use monitor::{ClusterHealthMonitor, Mode, MonitorConfig, MonitorOutcome};
pub use tls::{client_config, TlsFiles};
pub use types::{ConsensusSnapshot, DiagnosticsVars, FollowerProgress};

//! Error types for raftwatch health checks.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Result type alias for leader discovery and evaluation.
pub type HealthResult<T> = Result<T, HealthError>;

/// Why a single endpoint could not produce a snapshot.
///
/// These never escalate on their own; the leader locator skips the
/// endpoint and moves on.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("failed to decode diagnostics: {0}")]
    Decode(String),

    #[error("tls handshake failed: {0}")]
    Tls(String),

    #[error("https endpoint {0} requires a TLS-enabled transport")]
    TlsNotConfigured(String),
}

/// Cycle-level failures reported to the operator.
#[derive(Debug, Error)]
pub enum HealthError {
    /// Every endpoint failed or none claimed leadership.
    #[error("no leader found among {}", format_endpoints(.endpoints))]
    NoLeader { endpoints: Vec<String> },

    /// A member tracked in the first snapshot vanished from the second.
    #[error("Cluster configuration changed during health checking. Please retry.")]
    ConfigurationChanged { member_id: String },

    /// Two responsive endpoints claim leadership as different members.
    #[error(
        "conflicting leadership claims: {first_endpoint} reports {first_leader}, \
         {second_endpoint} reports {second_leader}"
    )]
    ConflictingLeaders {
        first_endpoint: String,
        first_leader: String,
        second_endpoint: String,
        second_leader: String,
    },
}

/// Failures while building the endpoint set.
#[derive(Debug, Error)]
pub enum MembersError {
    #[error("no endpoints configured")]
    NoEndpoints,

    #[error("failed to list members from {}", format_endpoints(.seeds))]
    Unavailable { seeds: Vec<String> },

    #[error("member list contains no client URLs")]
    NoClientUrls,
}

/// Failures while loading `raftwatch.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid duration for {field}: {value:?}")]
    InvalidDuration { field: &'static str, value: String },
}

/// Failures while building the client TLS configuration.
#[derive(Debug, Error)]
pub enum TlsError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("no certificates found in {0}")]
    NoCertificates(PathBuf),

    #[error("no private key found in {0}")]
    NoPrivateKey(PathBuf),

    #[error("cert_file and key_file must be set together")]
    IncompleteClientAuth,

    #[error("tls configuration error: {0}")]
    Rustls(#[from] rustls::Error),
}

/// Render an endpoint list as `[a b c]`.
pub(crate) fn format_endpoints(endpoints: &[String]) -> String {
    format!("[{}]", endpoints.join(" "))
}

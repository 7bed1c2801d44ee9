//! Leader discovery across an ordered endpoint set.
//!
//! The default policy returns the first endpoint, in caller order, whose
//! snapshot self-reports leadership. It does not check that the claim is
//! unique: during a split-brain or stale-state window several endpoints
//! may claim leadership and the first one wins. `CrossChecked` probes
//! every endpoint and rejects distinct claims instead.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{FetchError, HealthError, HealthResult};
use crate::fetch::{fetch_snapshot, Transport};
use crate::types::ConsensusSnapshot;

/// How leadership claims are resolved across endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LeaderPolicy {
    /// First self-declared leader in endpoint order wins.
    #[default]
    FirstResponder,
    /// Probe all endpoints; fail if two claim leadership as different members.
    CrossChecked,
}

/// A located leader: where it answered and what it reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderStatus {
    pub endpoint: String,
    pub snapshot: ConsensusSnapshot,
}

/// Find the first endpoint whose snapshot claims leadership.
pub async fn locate_leader<T: Transport>(
    transport: &T,
    endpoints: &[String],
) -> HealthResult<LeaderStatus> {
    locate_leader_with_policy(transport, endpoints, LeaderPolicy::FirstResponder).await
}

/// Find the leader using an explicit policy.
pub async fn locate_leader_with_policy<T: Transport>(
    transport: &T,
    endpoints: &[String],
    policy: LeaderPolicy,
) -> HealthResult<LeaderStatus> {
    let mut found: Option<LeaderStatus> = None;

    for endpoint in endpoints {
        let snapshot = match fetch_snapshot(transport, endpoint).await {
            Ok(s) => s,
            Err(e @ (FetchError::Tls(_) | FetchError::TlsNotConfigured(_))) => {
                warn!(%endpoint, error = %e, "endpoint unavailable");
                continue;
            }
            Err(e) => {
                debug!(%endpoint, error = %e, "endpoint unavailable");
                continue;
            }
        };

        if !snapshot.is_leader() {
            debug!(
                %endpoint,
                member = %snapshot.member_id,
                leader = %snapshot.leader_id,
                "endpoint is not the leader"
            );
            continue;
        }

        if let Some(first) = found.as_ref() {
            // The same member may be listed under several client URLs.
            if first.snapshot.member_id != snapshot.member_id {
                warn!(
                    first = %first.endpoint,
                    second = %endpoint,
                    "multiple members claim leadership"
                );
                return Err(HealthError::ConflictingLeaders {
                    first_endpoint: first.endpoint.clone(),
                    first_leader: first.snapshot.member_id.clone(),
                    second_endpoint: endpoint.clone(),
                    second_leader: snapshot.member_id,
                });
            }
            continue;
        }

        let status = LeaderStatus {
            endpoint: endpoint.clone(),
            snapshot,
        };
        if policy == LeaderPolicy::FirstResponder {
            return Ok(status);
        }
        found = Some(status);
    }

    found.ok_or_else(|| HealthError::NoLeader {
        endpoints: endpoints.to_vec(),
    })
}

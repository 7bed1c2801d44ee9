//! Two-snapshot progress evaluation.
//!
//! Compares leader snapshots `S0` and `S1`, taken a short interval apart.
//! The cluster is healthy when the commit index advanced; each follower is
//! healthy when its match index advanced. A follower tracked in `S0` that
//! is missing from `S1` means membership changed mid-measurement and the
//! whole evaluation is abandoned.

use std::fmt;

use tracing::{debug, warn};

use crate::error::{HealthError, HealthResult};
use crate::types::ConsensusSnapshot;

/// Healthy or not, for the cluster or one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Healthy,
    Unhealthy,
}

impl Verdict {
    fn advanced(before: u64, after: u64) -> Self {
        if after > before {
            Verdict::Healthy
        } else {
            Verdict::Unhealthy
        }
    }
}

/// Match index movement of one member between the two snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberReport {
    pub member_id: String,
    pub match_before: u64,
    pub match_after: u64,
    pub verdict: Verdict,
}

impl MemberReport {
    /// Human-readable verdict line, without trailing newline.
    pub fn render(&self) -> String {
        match self.verdict {
            Verdict::Healthy => format!(
                "member {} is healthy: raft is making progress [match: {}->{}]",
                self.member_id, self.match_before, self.match_after
            ),
            Verdict::Unhealthy => format!(
                "member {} is unhealthy: raft is not making progress [match: {}->{}]",
                self.member_id, self.match_before, self.match_after
            ),
        }
    }
}

/// Outcome of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthReport {
    pub verdict: Verdict,
    pub commit_before: u64,
    pub commit_after: u64,
    pub leader_id: String,
    /// Ordered by rendered line, not by member ID.
    pub members: Vec<MemberReport>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.verdict == Verdict::Healthy
    }

    pub fn overall_line(&self) -> String {
        match self.verdict {
            Verdict::Healthy => format!(
                "cluster is healthy: raft is making progress [commit index: {}->{}]",
                self.commit_before, self.commit_after
            ),
            Verdict::Unhealthy => format!(
                "cluster is unhealthy: raft is not making progress [commit index: {}]",
                self.commit_before
            ),
        }
    }

    pub fn leader_line(&self) -> String {
        format!("leader is {}", self.leader_id)
    }

    pub fn member_lines(&self) -> Vec<String> {
        self.members.iter().map(MemberReport::render).collect()
    }
}

impl fmt::Display for HealthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.overall_line())?;
        writeln!(f, "{}", self.leader_line())?;
        for line in self.member_lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

/// Compare two snapshots of the same leader, `before` taken first.
pub fn evaluate(before: &ConsensusSnapshot, after: &ConsensusSnapshot) -> HealthResult<HealthReport> {
    if before.term != after.term {
        debug!(before = before.term, after = after.term, "leader term changed between snapshots");
    }

    let mut members = Vec::with_capacity(before.follower_progress.len());
    for (member_id, pr0) in &before.follower_progress {
        let Some(pr1) = after.follower_progress.get(member_id) else {
            warn!(%member_id, "member disappeared between snapshots");
            return Err(HealthError::ConfigurationChanged {
                member_id: member_id.clone(),
            });
        };

        members.push(MemberReport {
            member_id: member_id.clone(),
            match_before: pr0.match_index,
            match_after: pr1.match_index,
            verdict: Verdict::advanced(pr0.match_index, pr1.match_index),
        });
    }

    // Presentation order is the lexicographic order of the rendered lines.
    members.sort_by_cached_key(MemberReport::render);

    Ok(HealthReport {
        verdict: Verdict::advanced(before.commit_index, after.commit_index),
        commit_before: before.commit_index,
        commit_after: after.commit_index,
        leader_id: before.leader_id.clone(),
        members,
    })
}

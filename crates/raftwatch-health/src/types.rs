//! Wire types for the member diagnostics document.
//!
//! Each member serves `GET /debug/vars` with a JSON object holding many
//! runtime variables; only `raft.status` is decoded here. Unknown fields
//! are ignored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level diagnostics document served at `/debug/vars`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticsVars {
    #[serde(rename = "raft.status")]
    pub raft_status: ConsensusSnapshot,
}

/// Point-in-time Raft status as self-reported by one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsensusSnapshot {
    /// The reporting member's own ID.
    #[serde(rename = "id")]
    pub member_id: String,
    #[serde(default)]
    pub term: u64,
    /// Member this node voted for in the current term.
    #[serde(default)]
    pub vote: String,
    /// Highest log index known to be committed.
    #[serde(rename = "commit")]
    pub commit_index: u64,
    /// Member this node believes is leader.
    #[serde(rename = "lead")]
    pub leader_id: String,
    /// Role tag, e.g. `StateLeader`, `StateFollower`.
    #[serde(rename = "raftState", default)]
    pub role: String,
    /// Replication progress per member. Only leaders populate this.
    #[serde(rename = "progress", default)]
    pub follower_progress: BTreeMap<String, FollowerProgress>,
}

impl ConsensusSnapshot {
    /// Whether this member claims to be the leader (`lead == id`).
    pub fn is_leader(&self) -> bool {
        self.leader_id == self.member_id
    }
}

/// The leader's view of one follower's log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowerProgress {
    #[serde(rename = "match")]
    pub match_index: u64,
    #[serde(rename = "next", default)]
    pub next_index: u64,
    /// Replication state tag, e.g. `ProgressStateReplicate`.
    #[serde(default)]
    pub state: String,
}

//! In-memory transport and fixture builders for unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use bytes::Bytes;

use crate::error::FetchError;
use crate::fetch::{diagnostics_url, Transport, TransportResponse};

/// Serves scripted responses keyed by URL.
///
/// Each URL holds a queue of responses; the last one repeats once the
/// queue is drained. Unscripted URLs fail like a refused connection.
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<(u16, String)>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the diagnostics resource of `endpoint`.
    pub fn respond(self, endpoint: &str, status: u16, body: String) -> Self {
        self.respond_sequence(endpoint, vec![(status, body)])
    }

    /// Script successive diagnostics responses of `endpoint`.
    pub fn respond_sequence(self, endpoint: &str, responses: Vec<(u16, String)>) -> Self {
        self.respond_url(&diagnostics_url(endpoint), responses)
    }

    /// Script an arbitrary URL.
    pub fn respond_url(self, url: &str, responses: Vec<(u16, String)>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), responses.into_iter().collect());
        self
    }

    /// URLs requested so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        let mut routes = self.routes.lock().unwrap();
        let queue = routes
            .get_mut(url)
            .ok_or_else(|| FetchError::Request(format!("connection refused: {url}")))?;
        let (status, body) = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .ok_or_else(|| FetchError::Request(format!("connection refused: {url}")))?
        };
        Ok(TransportResponse {
            status,
            body: Bytes::from(body),
        })
    }
}

/// Diagnostics body for a leader with the given commit and match indices.
pub fn leader_vars(id: &str, commit: u64, progress: &[(&str, u64)]) -> String {
    let progress: serde_json::Map<String, serde_json::Value> = progress
        .iter()
        .map(|(member, matched)| {
            (
                member.to_string(),
                serde_json::json!({
                    "match": matched,
                    "next": matched + 1,
                    "state": "ProgressStateReplicate",
                }),
            )
        })
        .collect();

    serde_json::json!({
        "raft.status": {
            "id": id,
            "term": 2,
            "vote": id,
            "commit": commit,
            "lead": id,
            "raftState": "StateLeader",
            "progress": progress,
        }
    })
    .to_string()
}

/// Diagnostics body for a follower of `leader`.
pub fn follower_vars(id: &str, leader: &str, commit: u64) -> String {
    serde_json::json!({
        "raft.status": {
            "id": id,
            "term": 2,
            "vote": leader,
            "commit": commit,
            "lead": leader,
            "raftState": "StateFollower",
        }
    })
    .to_string()
}

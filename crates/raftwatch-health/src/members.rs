//! Endpoint set resolution.
//!
//! The monitor takes a fixed, ordered list of client URLs. It is resolved
//! once at startup and never refreshed, so membership changes during a
//! continuous run only show up as a configuration-change failure.

use std::future::Future;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::MembersError;
use crate::fetch::{endpoint_url, Transport};

/// Path of the members listing on every member.
pub const MEMBERS_PATH: &str = "/v2/members";

/// Produces the ordered client URL list to probe.
pub trait MembershipResolver {
    fn resolve(&self) -> impl Future<Output = Result<Vec<String>, MembersError>> + Send;
}

/// An explicit endpoint list.
#[derive(Debug, Clone)]
pub struct StaticMembers {
    endpoints: Vec<String>,
}

impl StaticMembers {
    pub fn new(endpoints: Vec<String>) -> Self {
        Self { endpoints }
    }
}

impl MembershipResolver for StaticMembers {
    async fn resolve(&self) -> Result<Vec<String>, MembersError> {
        if self.endpoints.is_empty() {
            return Err(MembersError::NoEndpoints);
        }
        Ok(self.endpoints.clone())
    }
}

#[derive(Debug, Deserialize)]
struct MemberList {
    #[serde(default)]
    members: Vec<MemberEntry>,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(rename = "clientURLs", default)]
    client_urls: Vec<String>,
}

/// Lists members through the v2 members API of the first seed that answers.
///
/// Every member's client URLs are flattened in listing order.
pub struct MembersApiResolver<T> {
    transport: T,
    seeds: Vec<String>,
}

impl<T: Transport + Sync> MembersApiResolver<T> {
    pub fn new(transport: T, seeds: Vec<String>) -> Self {
        Self { transport, seeds }
    }

    async fn list_from(&self, seed: &str) -> Option<MemberList> {
        let url = endpoint_url(seed, MEMBERS_PATH);

        let resp = match self.transport.get(&url).await {
            Ok(r) if r.is_success() => r,
            Ok(r) => {
                debug!(%url, status = r.status, "members listing returned non-2xx");
                return None;
            }
            Err(e) => {
                debug!(%url, error = %e, "members listing failed");
                return None;
            }
        };

        match serde_json::from_slice(&resp.body) {
            Ok(list) => Some(list),
            Err(e) => {
                debug!(%url, error = %e, "failed to decode members listing");
                None
            }
        }
    }
}

impl<T: Transport + Sync> MembershipResolver for MembersApiResolver<T> {
    async fn resolve(&self) -> Result<Vec<String>, MembersError> {
        if self.seeds.is_empty() {
            return Err(MembersError::NoEndpoints);
        }

        for seed in &self.seeds {
            let Some(list) = self.list_from(seed).await else {
                continue;
            };

            let mut endpoints = Vec::new();
            for member in list.members {
                debug!(id = %member.id, name = %member.name, urls = member.client_urls.len(), "member listed");
                endpoints.extend(member.client_urls);
            }
            if endpoints.is_empty() {
                return Err(MembersError::NoClientUrls);
            }

            info!(%seed, endpoints = endpoints.len(), "resolved cluster members");
            return Ok(endpoints);
        }

        Err(MembersError::Unavailable {
            seeds: self.seeds.clone(),
        })
    }
}

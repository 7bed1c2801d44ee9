//! End-to-end checks over real HTTP.
//!
//! Each test serves fixture diagnostics documents from an axum server on
//! an ephemeral port and drives `HttpTransport` against it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::watch;

use raftwatch_health::*;

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}")
}

/// A leader whose commit and match indices advance by `step` per request.
fn leader(id: &'static str, follower: &'static str, step: u64) -> Router {
    let commit = Arc::new(AtomicU64::new(100));
    Router::new().route(
        "/debug/vars",
        get(move || {
            let commit = commit.clone();
            async move {
                let c = commit.fetch_add(step, Ordering::SeqCst);
                Json(json!({
                    "cmdline": ["etcd"],
                    "raft.status": {
                        "id": id,
                        "term": 4,
                        "vote": id,
                        "commit": c,
                        "lead": id,
                        "raftState": "StateLeader",
                        "progress": {
                            id: {"match": c, "next": c + 1, "state": "ProgressStateReplicate"},
                            follower: {"match": c - 3, "next": c - 2, "state": "ProgressStateReplicate"}
                        }
                    }
                }))
            }
        }),
    )
}

fn follower(id: &'static str, lead: &'static str) -> Router {
    Router::new().route(
        "/debug/vars",
        get(move || async move {
            Json(json!({
                "raft.status": {
                    "id": id, "term": 4, "vote": lead, "commit": 100,
                    "lead": lead, "raftState": "StateFollower"
                }
            }))
        }),
    )
}

fn broken() -> Router {
    Router::new().route(
        "/debug/vars",
        get(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
    )
}

fn transport() -> HttpTransport {
    HttpTransport::new(Duration::from_secs(2))
}

fn fast() -> MonitorConfig {
    MonitorConfig {
        interval: Duration::from_millis(20),
        ..MonitorConfig::default()
    }
}

#[tokio::test]
async fn fetches_snapshot_over_http() {
    let url = serve(leader("8e9e05c52164694d", "91bc3c398fb3c146", 5)).await;

    let snapshot = fetch_snapshot(&transport(), &url).await.unwrap();
    assert!(snapshot.is_leader());
    assert_eq!(snapshot.commit_index, 100);
    assert_eq!(snapshot.follower_progress["91bc3c398fb3c146"].match_index, 97);
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let url = serve(broken()).await;

    let err = fetch_snapshot(&transport(), &url).await.unwrap_err();
    assert!(matches!(err, FetchError::Status(500)));
}

#[tokio::test]
async fn locator_skips_broken_and_follower_endpoints() {
    let bad = serve(broken()).await;
    let fol = serve(follower("b", "a")).await;
    let lead = serve(leader("a", "b", 5)).await;

    let found = locate_leader(&transport(), &[bad, fol, lead.clone()])
        .await
        .unwrap();
    assert_eq!(found.endpoint, lead);
    assert_eq!(found.snapshot.member_id, "a");
}

#[tokio::test]
async fn one_shot_against_progressing_cluster_is_healthy() {
    let fol = serve(follower("b", "a")).await;
    let lead = serve(leader("a", "b", 5)).await;

    let monitor = ClusterHealthMonitor::new(transport(), vec![fol, lead], Mode::OneShot)
        .with_config(fast());
    let (_tx, rx) = watch::channel(false);
    let mut out = Vec::new();

    let outcome = monitor.run(&mut out, rx).await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Healthy);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "cluster is healthy: raft is making progress [commit index: 100->105]\n\
         leader is a\n\
         member a is healthy: raft is making progress [match: 100->105]\n\
         member b is healthy: raft is making progress [match: 97->102]\n"
    );
}

#[tokio::test]
async fn one_shot_against_stalled_cluster_is_unhealthy() {
    let lead = serve(leader("a", "b", 0)).await;

    let monitor =
        ClusterHealthMonitor::new(transport(), vec![lead], Mode::OneShot).with_config(fast());
    let (_tx, rx) = watch::channel(false);
    let mut out = Vec::new();

    let outcome = monitor.run(&mut out, rx).await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Unhealthy);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("cluster is unhealthy: raft is not making progress [commit index: 100]"));
    assert!(text.contains("member b is unhealthy: raft is not making progress [match: 97->97]"));
}

#[tokio::test]
async fn one_shot_against_unreachable_cluster_fails() {
    let monitor = ClusterHealthMonitor::new(
        HttpTransport::new(Duration::from_millis(200)),
        vec!["http://127.0.0.1:1".to_string()],
        Mode::OneShot,
    )
    .with_config(fast());
    let (_tx, rx) = watch::channel(false);
    let mut out = Vec::new();

    let outcome = monitor.run(&mut out, rx).await.unwrap();

    assert_eq!(outcome, MonitorOutcome::Unreachable);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "cluster may be unhealthy: failed to connect [http://127.0.0.1:1]\n"
    );
}

#[tokio::test]
async fn members_api_resolves_client_urls() {
    let lead = serve(leader("a", "b", 5)).await;
    let lead_url = lead.clone();
    let seed = serve(Router::new().route(
        "/v2/members",
        get(move || {
            let lead_url = lead_url.clone();
            async move {
                Json::<Value>(json!({
                    "members": [
                        {"id": "a", "name": "infra1", "peerURLs": [], "clientURLs": [lead_url]},
                        {"id": "b", "name": "infra2", "peerURLs": [], "clientURLs": ["http://127.0.0.1:1"]}
                    ]
                }))
            }
        }),
    ))
    .await;

    let resolver = MembersApiResolver::new(transport(), vec![seed]);
    let endpoints = resolver.resolve().await.unwrap();
    assert_eq!(endpoints, vec![lead.clone(), "http://127.0.0.1:1".to_string()]);

    let found = locate_leader(&transport(), &endpoints).await.unwrap();
    assert_eq!(found.endpoint, lead);
}

//! Diagnostics snapshot fetcher.
//!
//! Issues a single `GET <endpoint>/debug/vars` through a [`Transport`] and
//! decodes the `raft.status` member. Every failure comes back as a
//! [`FetchError`]; deciding whether to skip the endpoint is up to the
//! caller. There are no retries here.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::{TokioExecutor, TokioIo};
use rustls::pki_types::ServerName;
use rustls::ClientConfig;
use tokio_rustls::TlsConnector;
use tracing::debug;

use crate::error::FetchError;
use crate::types::{ConsensusSnapshot, DiagnosticsVars};

/// Path of the diagnostics resource on every member.
pub const DIAGNOSTICS_PATH: &str = "/debug/vars";

/// Default bound on a single request.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Status and body of a completed GET.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Preconfigured HTTP transport shared by every probe.
///
/// TLS, auth and connection pooling live behind this seam; the fetcher
/// only sees status codes and bodies.
pub trait Transport {
    fn get(&self, url: &str) -> impl Future<Output = Result<TransportResponse, FetchError>> + Send;
}

/// HTTP transport backed by the hyper legacy client.
///
/// `https://` URLs need a TLS configuration from [`HttpTransport::with_tls`];
/// they are served over a dedicated rustls connection per request.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client<HttpConnector, Empty<Bytes>>,
    tls: Option<TlsConnector>,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build_http();
        Self {
            client,
            tls: None,
            timeout,
        }
    }

    /// Enable `https://` endpoints with the given client configuration.
    pub fn with_tls(mut self, config: Arc<ClientConfig>) -> Self {
        self.tls = Some(TlsConnector::from(config));
        self
    }

    async fn get_plain(&self, uri: http::Uri) -> Result<TransportResponse, FetchError> {
        let req = http::Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", USER_AGENT)
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let resp = self
            .client
            .request(req)
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        read_response(resp).await
    }

    async fn get_tls(
        &self,
        connector: &TlsConnector,
        uri: &http::Uri,
    ) -> Result<TransportResponse, FetchError> {
        let authority = uri
            .authority()
            .ok_or_else(|| FetchError::Request(format!("missing host in {uri}")))?;
        let host = authority.host().trim_start_matches('[').trim_end_matches(']');
        let port = authority.port_u16().unwrap_or(443);

        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| FetchError::Tls(format!("invalid server name {host}: {e}")))?;
        let stream = tokio::net::TcpStream::connect((host, port))
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        let stream = connector
            .connect(server_name, stream)
            .await
            .map_err(|e| FetchError::Tls(e.to_string()))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let path = uri.path_and_query().map(|p| p.as_str()).unwrap_or("/");
        let req = http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", authority.as_str())
            .header("user-agent", USER_AGENT)
            .body(Empty::<Bytes>::new())
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;
        read_response(resp).await
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_TIMEOUT)
    }
}

impl Transport for HttpTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, FetchError> {
        let uri: http::Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| FetchError::Request(e.to_string()))?;

        let exchange = async {
            if uri.scheme_str() == Some("https") {
                let connector = self
                    .tls
                    .as_ref()
                    .ok_or_else(|| FetchError::TlsNotConfigured(url.to_string()))?;
                self.get_tls(connector, &uri).await
            } else {
                self.get_plain(uri.clone()).await
            }
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}

const USER_AGENT: &str = "raftwatch/0.1";

async fn read_response(
    resp: http::Response<hyper::body::Incoming>,
) -> Result<TransportResponse, FetchError> {
    let status = resp.status().as_u16();
    let body = resp
        .into_body()
        .collect()
        .await
        .map_err(|e| FetchError::Request(e.to_string()))?
        .to_bytes();
    Ok(TransportResponse { status, body })
}

/// Join `path` onto an endpoint base URL, defaulting to `http://`.
pub(crate) fn endpoint_url(endpoint: &str, path: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.contains("://") {
        format!("{base}{path}")
    } else {
        format!("http://{base}{path}")
    }
}

/// Build the diagnostics URL for an endpoint, defaulting to `http://`.
pub fn diagnostics_url(endpoint: &str) -> String {
    endpoint_url(endpoint, DIAGNOSTICS_PATH)
}

/// Fetch and decode one member's Raft status.
pub async fn fetch_snapshot<T: Transport>(
    transport: &T,
    endpoint: &str,
) -> Result<ConsensusSnapshot, FetchError> {
    let url = diagnostics_url(endpoint);
    let resp = transport.get(&url).await?;

    if !resp.is_success() {
        debug!(status = resp.status, %url, "diagnostics returned non-2xx");
        return Err(FetchError::Status(resp.status));
    }

    let vars: DiagnosticsVars =
        serde_json::from_slice(&resp.body).map_err(|e| FetchError::Decode(e.to_string()))?;
    Ok(vars.raft_status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{leader_vars, ScriptedTransport};

    #[test]
    fn diagnostics_url_appends_path() {
        assert_eq!(
            diagnostics_url("http://10.0.0.1:2379"),
            "http://10.0.0.1:2379/debug/vars"
        );
        assert_eq!(
            diagnostics_url("http://10.0.0.1:2379/"),
            "http://10.0.0.1:2379/debug/vars"
        );
    }

    #[test]
    fn diagnostics_url_defaults_scheme() {
        assert_eq!(diagnostics_url("10.0.0.1:2379"), "http://10.0.0.1:2379/debug/vars");
    }

    #[tokio::test]
    async fn fetch_decodes_snapshot() {
        let transport = ScriptedTransport::new()
            .respond("http://a", 200, leader_vars("a", 10, &[("a", 10), ("b", 8)]));

        let snapshot = fetch_snapshot(&transport, "http://a").await.unwrap();
        assert_eq!(snapshot.member_id, "a");
        assert_eq!(snapshot.commit_index, 10);
        assert_eq!(snapshot.follower_progress["b"].match_index, 8);
    }

    #[tokio::test]
    async fn fetch_rejects_non_success_status() {
        let transport = ScriptedTransport::new().respond("http://a", 503, "{}".to_string());

        let err = fetch_snapshot(&transport, "http://a").await.unwrap_err();
        assert!(matches!(err, FetchError::Status(503)));
    }

    #[tokio::test]
    async fn fetch_rejects_garbage_body() {
        let transport = ScriptedTransport::new().respond("http://a", 200, "not json".to_string());

        let err = fetch_snapshot(&transport, "http://a").await.unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn fetch_surfaces_transport_errors() {
        let transport = ScriptedTransport::new();

        let err = fetch_snapshot(&transport, "http://nowhere").await.unwrap_err();
        assert!(matches!(err, FetchError::Request(_)));
    }

    #[tokio::test]
    async fn https_without_tls_config_is_reported() {
        let transport = HttpTransport::new(Duration::from_millis(200));

        let err = fetch_snapshot(&transport, "https://127.0.0.1:1").await.unwrap_err();
        match err {
            FetchError::TlsNotConfigured(url) => assert_eq!(url, "https://127.0.0.1:1/debug/vars"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn http_transport_to_closed_port_fails() {
        let transport = HttpTransport::new(Duration::from_millis(200));
        let result = fetch_snapshot(&transport, "http://127.0.0.1:1").await;
        assert!(matches!(
            result,
            Err(FetchError::Request(_)) | Err(FetchError::Timeout(_))
        ));
    }
}

// # HTTP Dispatcher
//
// This crate provides the production transport for the update multiplexer:
// one HTTP(S) GET per resolved provider URI.
//
// ## Contract
//
// - ✅ Exactly one request per call
// - ✅ Fixed timeout (60 seconds, covering connect, headers and body)
// - ✅ Any reply that arrives is returned, whatever its status code
// - ❌ NO retry, NO backoff
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - Resolved URIs may carry provider credentials in the userinfo or query
// - Error messages are built from `reqwest::Error::without_url`, so the URI
//   never reaches logs through an error
// - Request logging is the engine's job and uses the redacted URI

use async_trait::async_trait;
use ddns_mux_core::{DISPATCH_TIMEOUT, Dispatcher, Error, RawResponse, ResolvedUri, Result};
use std::time::Duration;

/// User agent sent upstream
const USER_AGENT: &str = concat!("ddns-mux/", env!("CARGO_PKG_VERSION"));

/// HTTP(S) GET dispatcher
///
/// Holds one `reqwest::Client`, so connections are pooled across requests.
#[derive(Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl std::fmt::Debug for HttpDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpDispatcher")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl HttpDispatcher {
    /// Create a dispatcher with the fixed 60 s timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(DISPATCH_TIMEOUT)
    }

    /// Create a dispatcher with a custom timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Configured per-call timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        let err = err.without_url();
        if err.is_timeout() {
            Error::transport(format!("timed out after {:?}", self.timeout))
        } else if err.is_connect() {
            Error::transport(format!("connection failed: {}", err))
        } else if err.is_builder() {
            Error::transport(format!("invalid request: {}", err))
        } else {
            Error::transport(err.to_string())
        }
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    /// Send one GET to the resolved URI
    ///
    /// Non-2xx replies are returned as `Ok`: DynDNS providers often report
    /// `badauth` and friends with error status codes, and the classifier
    /// needs to see them.
    async fn dispatch(&self, uri: &ResolvedUri) -> Result<RawResponse> {
        let response = self
            .client
            .get(uri.expose())
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        tracing::debug!("Received {} bytes from {}", body.len(), uri);

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ddns_mux_core::config::ProviderConfig;
    use ddns_mux_core::{IncomingRequest, ProviderSpec};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a random local port
    async fn serve_once(raw_response: &'static str) -> (u16, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap();
            socket.write_all(raw_response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf[..n]).into_owned()
        });

        (port, handle)
    }

    fn resolved(template: String) -> ResolvedUri {
        let provider = ProviderSpec::from_config(
            0,
            &ProviderConfig::new(template).with_credentials("alice", "hunter2"),
        )
        .unwrap();
        let request = IncomingRequest::from_query(
            "username=u&passwd=p&domain=d&ipaddr=198.51.100.7",
        )
        .unwrap();
        ddns_mux_core::template::resolve(&provider, &request).unwrap()
    }

    #[tokio::test]
    async fn returns_status_headers_and_body() {
        let (port, server) = serve_once(
            "HTTP/1.1 200 OK\r\nDDNSS-Response: good\r\nContent-Length: 17\r\nConnection: close\r\n\r\ngood 198.51.100.7",
        )
        .await;

        let dispatcher = HttpDispatcher::new().unwrap();
        let uri = resolved(format!(
            "http://127.0.0.1:{port}/nic/update?user=<username>&pw=<passwd>&myip=<ipaddr>"
        ));
        let response = dispatcher.dispatch(&uri).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(response.header("ddnss-response"), Some("good"));
        assert_eq!(response.body, "good 198.51.100.7");

        let request = server.await.unwrap();
        assert!(request.starts_with("GET /nic/update?user=alice&pw=hunter2&myip=198.51.100.7 HTTP/1.1"));
    }

    #[tokio::test]
    async fn error_status_is_still_a_response() {
        let (port, _server) = serve_once(
            "HTTP/1.1 401 Unauthorized\r\nContent-Length: 7\r\nConnection: close\r\n\r\nbadauth",
        )
        .await;

        let dispatcher = HttpDispatcher::new().unwrap();
        let response = dispatcher
            .dispatch(&resolved(format!("http://127.0.0.1:{port}/")))
            .await
            .unwrap();

        assert_eq!(response.status, 401);
        assert_eq!(response.body, "badauth");
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error_without_credentials() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let dispatcher = HttpDispatcher::new().unwrap();
        let err = dispatcher
            .dispatch(&resolved(format!("http://127.0.0.1:{port}/?pw=<passwd>")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn truncated_body_is_transport_error() {
        let (port, _server) = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 100\r\nConnection: close\r\n\r\ngood 1.2",
        )
        .await;

        let dispatcher = HttpDispatcher::new().unwrap();
        let err = dispatcher
            .dispatch(&resolved(format!("http://127.0.0.1:{port}/?pw=<passwd>")))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)), "{err:?}");
        assert!(!err.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn slow_upstream_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let _server = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let dispatcher = HttpDispatcher::with_timeout(Duration::from_millis(200)).unwrap();
        let err = dispatcher
            .dispatch(&resolved(format!("http://127.0.0.1:{port}/")))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("timed out"), "{err}");
    }

    #[tokio::test]
    async fn invalid_uri_is_transport_error() {
        let dispatcher = HttpDispatcher::new().unwrap();
        let err = dispatcher
            .dispatch(&resolved("not a url <passwd>".to_string()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        assert!(!err.to_string().contains("hunter2"));
    }

    #[test]
    fn default_timeout_is_sixty_seconds() {
        let dispatcher = HttpDispatcher::new().unwrap();
        assert_eq!(dispatcher.timeout(), Duration::from_secs(60));
        assert_eq!(dispatcher.name(), "http");
    }
}

// # Dispatcher Trait
//
// Defines the interface for sending one resolved update URI to an upstream
// provider.
//
// ## Implementations
//
// - HTTP(S) GET via reqwest: `ddns-mux-http` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Usage
//
// ```rust,ignore
// use ddns_mux_core::Dispatcher;
//
// let reply = dispatcher.dispatch(&resolved_uri).await?;
// let classification = ddns_mux_core::classify(&reply);
// ```

use async_trait::async_trait;

use crate::error::Result;
use crate::template::ResolvedUri;

/// Fixed per-call timeout for outbound update calls
pub const DISPATCH_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);

/// A provider's reply, independent of the transport that produced it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawResponse {
    /// HTTP status code
    pub status: u16,
    /// Headers in received order; names compare case-insensitively
    pub headers: Vec<(String, String)>,
    /// Body as text
    pub body: String,
}

impl RawResponse {
    /// Create a response with a status code and body
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Append a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of header `name`, compared case-insensitively
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Trait for outbound update transports
///
/// # Contract
///
/// - Exactly one attempt per call: no retry, no backoff
/// - Bounded by [`DISPATCH_TIMEOUT`]
/// - Any reply that arrived, whatever its HTTP status, is `Ok`
/// - Timeouts, connection and upstream DNS failures are
///   [`Error::Transport`](crate::Error::Transport)
/// - Error messages must not contain the URI; it may carry credentials
///
/// # Thread Safety
///
/// Implementations are shared across concurrent requests.
#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Send one update call
    async fn dispatch(&self, uri: &ResolvedUri) -> Result<RawResponse>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

#[async_trait]
impl<D: Dispatcher + ?Sized> Dispatcher for std::sync::Arc<D> {
    async fn dispatch(&self, uri: &ResolvedUri) -> Result<RawResponse> {
        (**self).dispatch(uri).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

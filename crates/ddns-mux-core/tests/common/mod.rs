//! Test doubles and common utilities for engine contract tests
//!
//! The scripted dispatcher replays one canned reply per call, in call
//! order, and records every URI it was asked to call.

#![allow(dead_code)]

use ddns_mux_core::config::{MuxConfig, ProviderConfig};
use ddns_mux_core::error::{Error, Result};
use ddns_mux_core::{Dispatcher, ProviderRegistry, RawResponse, ResolvedUri, UpdateEngine};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const USER: &str = "router";
pub const PASSWORD: &str = "s3cret";
pub const DOMAIN: &str = "home.example";

/// One canned reply
#[derive(Debug, Clone)]
pub enum Reply {
    Response(RawResponse),
    TransportFailure,
}

impl Reply {
    pub fn body(body: &str) -> Self {
        Reply::Response(RawResponse::new(200, body))
    }

    pub fn header(name: &str, value: &str) -> Self {
        Reply::Response(RawResponse::new(200, "").with_header(name, value))
    }
}

/// Dispatcher that replays scripted replies
pub struct ScriptedDispatcher {
    replies: Mutex<VecDeque<Reply>>,
    calls: AtomicUsize,
    exposed: Mutex<Vec<String>>,
    redacted: Mutex<Vec<String>>,
}

impl ScriptedDispatcher {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: AtomicUsize::new(0),
            exposed: Mutex::new(Vec::new()),
            redacted: Mutex::new(Vec::new()),
        })
    }

    /// Number of dispatch() calls so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Callable URIs in call order
    pub fn called_uris(&self) -> Vec<String> {
        self.exposed.lock().unwrap().clone()
    }

    /// Redacted URIs in call order
    pub fn redacted_uris(&self) -> Vec<String> {
        self.redacted.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Dispatcher for ScriptedDispatcher {
    async fn dispatch(&self, uri: &ResolvedUri) -> Result<RawResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.exposed.lock().unwrap().push(uri.expose().to_string());
        self.redacted.lock().unwrap().push(uri.redacted().to_string());

        match self.replies.lock().unwrap().pop_front() {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::TransportFailure) => Err(Error::transport("connection refused")),
            None => Err(Error::transport("no scripted reply left")),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Configuration expecting USER/PASSWORD/DOMAIN with the given providers
pub fn config_with(providers: Vec<ProviderConfig>) -> MuxConfig {
    providers.into_iter().fold(
        MuxConfig::new(PASSWORD).with_username(USER).with_domain(DOMAIN),
        MuxConfig::with_provider,
    )
}

/// Engine over `providers` and `dispatcher`
pub fn engine_with(
    providers: Vec<ProviderConfig>,
    dispatcher: Arc<ScriptedDispatcher>,
) -> UpdateEngine {
    let registry = ProviderRegistry::new(config_with(providers)).expect("valid test config");
    UpdateEngine::new(Arc::new(registry), dispatcher)
}

/// A plain provider whose URI records its name and the caller's IPv4
pub fn provider(name: &str) -> ProviderConfig {
    ProviderConfig::new(format!("https://{name}.example/nic/update?myip=<ipaddr>"))
        .with_credentials(format!("{name}-user"), format!("{name}-pass"))
        .with_domain(format!("{name}.dyn.example"))
}

/// Query string with valid credentials plus `extra`
pub fn query(extra: &str) -> String {
    format!("username={USER}&passwd={PASSWORD}&domain={DOMAIN}&{extra}")
}

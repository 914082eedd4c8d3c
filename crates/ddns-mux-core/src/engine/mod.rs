// # Update Engine
//
// The engine turns one inbound update request into one aggregated status
// line:
//
// 1. Validate the query and check the caller's identity
// 2. For each provider, in configured order:
//    resolve URI → dispatch → classify
// 3. Fold the outcomes into the final line
//
// ## Failure model
//
// Request-level failures (validation, identity mismatch) are returned as
// errors and no provider is contacted. Provider-level failures (address
// synthesis, transport) become an `administrative-error` outcome for that
// provider and the loop moves on. Every configured provider is visited
// exactly once; there is no retry.
//
// ## Ordering
//
// Providers are dispatched sequentially. The fold that follows breaks ties
// by configured order, so the result never depends on timing.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::aggregate::{ProviderOutcome, StatusAggregator};
use crate::classify::{Signal, classify_with_signal};
use crate::error::{Error, Result};
use crate::registry::{ProviderRegistry, ProviderSpec};
use crate::request::IncomingRequest;
use crate::status::Status;
use crate::template;
use crate::traits::Dispatcher;

/// Result of handling one update request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateReport {
    /// One outcome per configured provider, in configured order
    pub outcomes: Vec<ProviderOutcome>,
    /// The line returned to the caller
    pub final_text: String,
}

/// Update engine
///
/// Cheap to clone; clones share the registry and the dispatcher.
#[derive(Clone)]
pub struct UpdateEngine {
    registry: Arc<ProviderRegistry>,
    dispatcher: Arc<dyn Dispatcher>,
}

impl UpdateEngine {
    /// Create an engine over a registry and a transport
    pub fn new(registry: Arc<ProviderRegistry>, dispatcher: Arc<dyn Dispatcher>) -> Self {
        Self {
            registry,
            dispatcher,
        }
    }

    /// The registry this engine serves
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    /// Parse a raw query string and handle it
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateReport)`: every provider was visited
    /// - `Err(e)` with `e.is_validation()`: malformed request
    /// - `Err(Error::AuthMismatch)`: wrong username, password or domain
    pub async fn handle_query(&self, raw_query: &str) -> Result<UpdateReport> {
        let request = IncomingRequest::from_query(raw_query).inspect_err(|e| {
            error!("[ERROR] {}", e);
        })?;

        if let Some(network) = request.ipv6_lan_network {
            debug!("[REQUEST] Parsed Ip6LanNetwork: {}", network);
        }

        self.handle(&request).await
    }

    /// Handle an already parsed request
    pub async fn handle(&self, request: &IncomingRequest) -> Result<UpdateReport> {
        self.authorize(request)?;

        let mut outcomes = Vec::with_capacity(self.registry.len());
        for provider in self.registry.providers() {
            outcomes.push(self.update_provider(provider, request).await);
        }

        let final_text =
            StatusAggregator::fold(request.anchor_address(), &outcomes).into_final_text();
        info!("[RESULT] Providers={} Result={}", outcomes.len(), final_text);

        Ok(UpdateReport {
            outcomes,
            final_text,
        })
    }

    fn authorize(&self, request: &IncomingRequest) -> Result<()> {
        let registry = &self.registry;
        request
            .authorize(registry.username(), registry.password(), registry.domain())
            .inspect_err(|e| {
                error!("[ERROR] Query parameters do not match configuration");
                if let Error::AuthMismatch { field } = e {
                    debug!("Mismatching query parameter: {}", field);
                }
            })
    }

    /// Resolve, dispatch and classify for one provider
    ///
    /// Never fails: provider-local errors become an administrative error.
    async fn update_provider(
        &self,
        provider: &ProviderSpec,
        request: &IncomingRequest,
    ) -> ProviderOutcome {
        let index = provider.index;

        let uri = match template::resolve(provider, request) {
            Ok(uri) => uri,
            Err(e) => {
                error!(
                    "[ERROR] Index={} URL={} Error={}",
                    index,
                    template::redacted_template(provider, request),
                    e
                );
                return ProviderOutcome::administrative_error(index);
            }
        };

        info!("[REQUEST] Index={} URL={}", index, uri);

        let response = match self.dispatcher.dispatch(&uri).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    "[ERROR] Index={} URL={} Dispatcher={} Error={}",
                    index,
                    uri,
                    self.dispatcher.name(),
                    e
                );
                return ProviderOutcome::administrative_error(index);
            }
        };

        debug!("[HEADERS] Index={} URL={} Status={} Headers:", index, uri, response.status);
        for (name, value) in &response.headers {
            debug!("    {}: {}", name, value);
        }

        let (classification, signal) = classify_with_signal(&response);
        match signal {
            Signal::StatusHeader | Signal::SeverityHeader => info!(
                "[RESPONSE] Index={} URL={} Status={} Header={}",
                index, uri, response.status, classification.status
            ),
            Signal::Body => info!(
                "[RESPONSE] Index={} URL={} Status={} Body={}",
                index,
                uri,
                response.status,
                response.body.trim_end()
            ),
        }

        if !classification.exact_match && classification.status == Status::Unknown {
            warn!("Index={} reply did not contain a known return code", index);
        }
        info!("Matched return code: {}", classification.status);

        ProviderOutcome::new(index, classification.status, classification.exact_match)
    }
}

impl std::fmt::Debug for UpdateEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateEngine")
            .field("registry", &self.registry)
            .field("dispatcher", &self.dispatcher.name())
            .finish()
    }
}

// # ddns-mux-core
//
// Core library for the multi-provider DynDNS update multiplexer.
//
// ## Architecture Overview
//
// One inbound DynDNS v2 update request fans out to every configured
// upstream provider; the replies are folded back into one status line.
//
// - **ProviderRegistry**: immutable, ordered list of providers built once at startup
// - **address**: IPv6 synthesis from a LAN prefix and an interface identifier
// - **IncomingRequest**: inbound query validation
// - **template**: per-provider URI resolution with credential redaction
// - **Dispatcher**: trait for the outbound transport
// - **classify**: reply → canonical [`Status`]
// - **StatusAggregator**: severity-ranked fold of provider outcomes
// - **UpdateEngine**: orchestrates the above for one request
//
// ## Design Principles
//
// 1. **Library-First**: the daemon is a thin wrapper; all logic lives here
// 2. **Sequential and deterministic**: providers are visited in configured
//    order and ties are broken by that order
// 3. **Never leak credentials**: every loggable type redacts them

pub mod address;
pub mod aggregate;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod registry;
pub mod request;
pub mod status;
pub mod template;
pub mod traits;

// Re-export core types for convenience
pub use aggregate::{ProviderOutcome, StatusAggregator};
pub use classify::{Classification, classify};
pub use config::{MuxConfig, ProviderConfig};
pub use engine::{UpdateEngine, UpdateReport};
pub use error::{Error, Result};
pub use registry::{ProviderRegistry, ProviderSpec};
pub use request::IncomingRequest;
pub use status::Status;
pub use template::ResolvedUri;
pub use traits::{DISPATCH_TIMEOUT, Dispatcher, RawResponse};

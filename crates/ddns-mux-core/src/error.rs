//! Error types for the update multiplexer
//!
//! This module defines all error types used throughout the crate.

use std::net::Ipv6Addr;

use ipnetwork::Ipv6Network;
use thiserror::Error;

/// Result type alias for multiplexer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the update multiplexer
///
/// No variant ever carries a credential. Variants that describe a
/// mismatch name the offending field, not its value.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A mandatory query parameter is absent or empty
    #[error("missing mandatory query param: {0}")]
    MissingField(&'static str),

    /// Neither `ipaddr` nor `ip6addr` was supplied
    #[error("either ipaddr or ip6addr must be set")]
    MissingAddress,

    /// `ip6lanprefix` is not an IPv6 CIDR network
    #[error("invalid CIDR prefix '{prefix}': {reason}")]
    InvalidPrefix {
        /// The prefix as received
        prefix: String,
        /// Why it was rejected
        reason: String,
    },

    /// Inbound credentials or domain differ from the configured ones
    #[error("query parameters do not match configuration")]
    AuthMismatch {
        /// Which field mismatched first (diagnostics only)
        field: &'static str,
    },

    /// The interface identifier has bits inside the prefix's network part
    #[error("interface ID {interface_id} contains bits that overlap with the prefix {network}")]
    InterfaceIdOverlap {
        /// The provider's interface identifier
        interface_id: Ipv6Addr,
        /// The request's LAN network
        network: Ipv6Network,
    },

    /// Outbound call failed before a reply could be read
    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid prefix error
    pub fn invalid_prefix(prefix: impl Into<String>, reason: impl ToString) -> Self {
        Self::InvalidPrefix {
            prefix: prefix.into(),
            reason: reason.to_string(),
        }
    }

    /// Create an authentication mismatch error
    pub fn auth_mismatch(field: &'static str) -> Self {
        Self::AuthMismatch { field }
    }

    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    /// True for malformed or incomplete inbound requests
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingField(_) | Self::MissingAddress | Self::InvalidPrefix { .. }
        )
    }
}

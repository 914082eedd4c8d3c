//! Immutable provider registry
//!
//! The registry is built once at startup from a validated
//! [`MuxConfig`] and then shared read-only (usually behind an `Arc`)
//! by every request. It owns the expected inbound identity and the
//! ordered list of upstream providers.
//!
//! ## Usage
//!
//! ```rust
//! use ddns_mux_core::config::{MuxConfig, ProviderConfig};
//! use ddns_mux_core::ProviderRegistry;
//!
//! let config = MuxConfig::new("secret").with_provider(
//!     ProviderConfig::new("https://dyn.example/nic/update?hostname=<domain>&myip=<ipaddr>")
//!         .with_domain("home.example"),
//! );
//!
//! let registry = ProviderRegistry::new(config)?;
//! assert_eq!(registry.len(), 1);
//! # Ok::<(), ddns_mux_core::Error>(())
//! ```

use std::net::Ipv6Addr;

use crate::config::{MuxConfig, ProviderConfig};
use crate::error::Result;

/// One upstream provider, validated
#[derive(Clone)]
pub struct ProviderSpec {
    /// Position in the configured order
    pub index: usize,
    /// URI template
    pub uri: String,
    pub username: String,
    pub password: String,
    pub domain: String,
    /// Parsed `iid6`; overlap with a prefix is only checked per request
    pub interface_id: Option<Ipv6Addr>,
}

impl ProviderSpec {
    /// Validate and convert one configuration entry
    pub fn from_config(index: usize, config: &ProviderConfig) -> Result<Self> {
        config.require_uri(index)?;
        Ok(Self {
            index,
            uri: config.uri.clone(),
            username: config.username.clone(),
            password: config.password.clone(),
            domain: config.domain.clone(),
            interface_id: config.interface_id()?,
        })
    }
}

// Debug output is used in startup logs; keep credentials out.
impl std::fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("index", &self.index)
            .field("uri", &self.uri)
            .field("domain", &self.domain)
            .field("interface_id", &self.interface_id)
            .finish_non_exhaustive()
    }
}

/// Ordered, immutable set of providers plus the expected inbound identity
pub struct ProviderRegistry {
    username: String,
    password: String,
    domain: String,
    providers: Vec<ProviderSpec>,
}

impl ProviderRegistry {
    /// Validate `config` and build the registry
    ///
    /// # Returns
    ///
    /// - `Ok(ProviderRegistry)`: every provider entry is valid
    /// - `Err(Error::Config)`: empty password, no providers, a blank URI or
    ///   an unparseable `iid6`
    pub fn new(config: MuxConfig) -> Result<Self> {
        config.validate_identity()?;

        let providers = config
            .providers
            .iter()
            .enumerate()
            .map(|(index, provider)| ProviderSpec::from_config(index, provider))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            username: config.username,
            password: config.password,
            domain: config.domain,
            providers,
        })
    }

    /// Providers in configured order
    pub fn providers(&self) -> &[ProviderSpec] {
        &self.providers
    }

    /// Number of configured providers
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// True if no provider is configured (never the case after `new`)
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Expected inbound username
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Expected inbound password
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Expected inbound domain
    pub fn domain(&self) -> &str {
        &self.domain
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("domain", &self.domain)
            .field("providers", &self.providers)
            .finish_non_exhaustive()
    }
}

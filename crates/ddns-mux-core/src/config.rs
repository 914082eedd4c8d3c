//! Configuration types for the update multiplexer
//!
//! This module defines the configuration structures consumed by
//! [`ProviderRegistry`](crate::ProviderRegistry). Loading them from the
//! environment is the daemon's job.

use serde::{Deserialize, Serialize};
use std::net::Ipv6Addr;

/// Default inbound username when none is configured
pub const DEFAULT_USERNAME: &str = "user";

/// Default inbound domain when none is configured
pub const DEFAULT_DOMAIN: &str = "any.domain";

/// Main multiplexer configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct MuxConfig {
    /// Username the inbound client must present
    #[serde(default = "default_username")]
    pub username: String,

    /// Password the inbound client must present
    pub password: String,

    /// Domain the inbound client must present
    #[serde(default = "default_domain")]
    pub domain: String,

    /// Upstream providers, in the order they are contacted
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
}

impl MuxConfig {
    /// Create a new configuration with default username and domain
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            username: default_username(),
            password: password.into(),
            domain: default_domain(),
            providers: Vec::new(),
        }
    }

    /// Set the expected inbound username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the expected inbound domain
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Append an upstream provider
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.providers.push(provider);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.validate_identity()?;

        for (index, provider) in self.providers.iter().enumerate() {
            provider.validate(index)?;
        }

        Ok(())
    }

    /// Checks that do not look at individual provider entries
    pub(crate) fn validate_identity(&self) -> Result<(), crate::Error> {
        if self.password.is_empty() {
            return Err(crate::Error::config(
                "USER_PASSWORD is required and must not be empty",
            ));
        }

        if self.providers.is_empty() {
            return Err(crate::Error::config(
                "no provider defined (PROVIDERS is empty or missing)",
            ));
        }

        Ok(())
    }
}

// Credentials stay out of Debug output.
impl std::fmt::Debug for MuxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MuxConfig")
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("providers", &self.providers)
            .finish()
    }
}

/// One upstream provider as written in the `PROVIDERS` JSON array
///
/// Unknown fields are ignored.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// URI template with `<placeholder>` tokens
    pub uri: String,

    /// Username sent to this provider
    #[serde(default)]
    pub username: String,

    /// Password sent to this provider
    #[serde(default, rename = "passwd")]
    pub password: String,

    /// Domain updated at this provider
    #[serde(default)]
    pub domain: String,

    /// Interface identifier (host bits) for synthesized IPv6 addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iid6: Option<String>,
}

impl ProviderConfig {
    /// Create a provider configuration from a URI template
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Self::default()
        }
    }

    /// Set the credentials sent to this provider
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }

    /// Set the domain updated at this provider
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    /// Set the interface identifier
    pub fn with_iid6(mut self, iid6: impl Into<String>) -> Self {
        self.iid6 = Some(iid6.into());
        self
    }

    /// Validate this provider entry; `index` is only used in messages
    pub fn validate(&self, index: usize) -> Result<(), crate::Error> {
        self.require_uri(index)?;
        self.interface_id()?;
        Ok(())
    }

    pub(crate) fn require_uri(&self, index: usize) -> Result<(), crate::Error> {
        if self.uri.trim().is_empty() {
            return Err(crate::Error::config(format!(
                "provider at index {} is missing a URI",
                index
            )));
        }
        Ok(())
    }

    /// Parse `iid6` into a full IPv6 address
    ///
    /// Returns `Ok(None)` when no (or an empty) interface identifier is set.
    pub fn interface_id(&self) -> Result<Option<Ipv6Addr>, crate::Error> {
        match self.iid6.as_deref() {
            None | Some("") => Ok(None),
            Some(iid6) => parse_interface_id(iid6).map(Some),
        }
    }
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("uri", &self.uri)
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("iid6", &self.iid6)
            .finish()
    }
}

/// Parse an interface identifier
///
/// The identifier is read as `"::" + iid6`, so `"1"` and `"1:2:3:4"` name
/// host bits directly. A value that already is a complete IPv6 literal,
/// such as `"::1"`, is accepted as written.
pub fn parse_interface_id(iid6: &str) -> Result<Ipv6Addr, crate::Error> {
    let iid6 = iid6.trim();
    format!("::{}", iid6)
        .parse::<Ipv6Addr>()
        .or_else(|_| iid6.parse::<Ipv6Addr>())
        .map_err(|_| crate::Error::config(format!("invalid interface ID: {}", iid6)))
}

fn default_username() -> String {
    DEFAULT_USERNAME.to_string()
}

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

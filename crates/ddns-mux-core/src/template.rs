//! Provider URI template resolution
//!
//! A template is a string with `<placeholder>` tokens:
//!
//! | token | source |
//! |---|---|
//! | `<username>`, `<passwd>`, `<domain>` | the provider's own configuration |
//! | `<ipaddr>`, `<ip6lanprefix>`, `<dualstack>` | the inbound request |
//! | `<ip6addr>` | synthesized from the request prefix and the provider IID, or passed through |
//!
//! Credentials always come from the provider, never from the caller.

use std::fmt;

use tracing::warn;

use crate::address;
use crate::error::Result;
use crate::registry::ProviderSpec;
use crate::request::IncomingRequest;

/// Replacement for credentials in loggable URIs
pub const REDACTED: &str = "*****";

/// A fully substituted provider URI
///
/// `Debug` and `Display` print the redacted form only; the callable URI
/// is reachable through [`ResolvedUri::expose`].
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedUri {
    uri: String,
    redacted: String,
}

impl ResolvedUri {
    /// The URI to call, credentials included
    pub fn expose(&self) -> &str {
        &self.uri
    }

    /// The URI with username and password masked
    pub fn redacted(&self) -> &str {
        &self.redacted
    }
}

impl fmt::Display for ResolvedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.redacted)
    }
}

impl fmt::Debug for ResolvedUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ResolvedUri").field(&self.redacted).finish()
    }
}

/// Resolve `provider`'s template for `request`
///
/// Fails only when the provider's interface identifier overlaps the
/// request's LAN prefix; no outbound call must be made in that case.
/// A provider that wants a synthesized address from a request without
/// `ip6lanprefix` gets an empty `<ip6addr>` and a warning.
pub fn resolve(provider: &ProviderSpec, request: &IncomingRequest) -> Result<ResolvedUri> {
    let ip6addr = match (provider.interface_id, request.ipv6_lan_network) {
        (Some(iid), Some(network)) => address::combine(&network, iid)?.to_string(),
        (Some(_), None) => {
            warn!(
                "[WARNING] Index={} Provider requires IID6, but no ip6lanprefix was provided in the request. Using empty ip6addr for request.",
                provider.index
            );
            String::new()
        }
        (None, _) => request.ipv6_address.clone().unwrap_or_default(),
    };

    let values = Substitutions {
        provider,
        request,
        ip6addr: Some(&ip6addr),
    };

    Ok(ResolvedUri {
        uri: substitute(&provider.uri, |name| values.lookup(name, false)),
        redacted: substitute(&provider.uri, |name| values.lookup(name, true)),
    })
}

/// Redacted URI for a provider whose address could not be synthesized
///
/// Every placeholder except `<ip6addr>` is filled in; `<ip6addr>` stays
/// as written so the log line shows what was skipped.
pub fn redacted_template(provider: &ProviderSpec, request: &IncomingRequest) -> String {
    let values = Substitutions {
        provider,
        request,
        ip6addr: None,
    };
    substitute(&provider.uri, |name| values.lookup(name, true))
}

struct Substitutions<'a> {
    provider: &'a ProviderSpec,
    request: &'a IncomingRequest,
    ip6addr: Option<&'a str>,
}

impl<'a> Substitutions<'a> {
    fn lookup(&self, name: &str, redact: bool) -> Option<&'a str> {
        let value = match name {
            "username" | "passwd" if redact => REDACTED,
            "username" => self.provider.username.as_str(),
            "passwd" => self.provider.password.as_str(),
            "domain" => self.provider.domain.as_str(),
            "ipaddr" => self.request.ipv4_address.as_deref().unwrap_or_default(),
            "ip6addr" => self.ip6addr?,
            "ip6lanprefix" => self.request.ipv6_lan_prefix.as_deref().unwrap_or_default(),
            "dualstack" => self.request.dualstack.as_deref().unwrap_or_default(),
            _ => return None,
        };
        Some(value)
    }
}

/// Replace every known `<name>` token in one left-to-right pass
///
/// Substituted values are never rescanned. Unknown tokens and stray `<`
/// are copied through unchanged.
fn substitute<'a, F>(template: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<&'a str>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('>').and_then(|close| {
            lookup(&after[..close]).map(|value| (close, value))
        }) {
            Some((close, value)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('<');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

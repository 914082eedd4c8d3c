//! Inbound update request parsing and validation

use ipnetwork::Ipv6Network;

use crate::error::{Error, Result};

/// A validated inbound update request
///
/// Address fields are kept as received; they are echoed back to the
/// caller and substituted into provider URIs verbatim.
#[derive(Clone, PartialEq, Eq)]
pub struct IncomingRequest {
    pub username: String,
    pub password: String,
    pub domain: String,
    pub ipv4_address: Option<String>,
    pub ipv6_address: Option<String>,
    /// `ip6lanprefix` exactly as received
    pub ipv6_lan_prefix: Option<String>,
    /// Parsed form of `ipv6_lan_prefix`
    pub ipv6_lan_network: Option<Ipv6Network>,
    pub dualstack: Option<String>,
}

impl IncomingRequest {
    /// Parse a raw (still form-encoded) query string
    pub fn from_query(raw_query: &str) -> Result<Self> {
        Self::from_pairs(url::form_urlencoded::parse(raw_query.as_bytes()))
    }

    /// Parse decoded query pairs
    ///
    /// The first occurrence of a key wins; empty values count as absent.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut fields = QueryFields::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "username" => &mut fields.username,
                "passwd" => &mut fields.password,
                "domain" => &mut fields.domain,
                "ipaddr" => &mut fields.ipaddr,
                "ip6addr" => &mut fields.ip6addr,
                "ip6lanprefix" => &mut fields.ip6lanprefix,
                "dualstack" => &mut fields.dualstack,
                _ => continue,
            };
            if slot.is_none() && !value.as_ref().is_empty() {
                *slot = Some(value.as_ref().to_string());
            }
        }
        fields.validate()
    }

    /// The address echoed back in success-class results
    ///
    /// `ipaddr` if present, else `ip6addr`.
    pub fn anchor_address(&self) -> &str {
        self.ipv4_address
            .as_deref()
            .or(self.ipv6_address.as_deref())
            .unwrap_or_default()
    }

    /// Compare the presented identity against the expected one
    ///
    /// The returned error names the first mismatching field for
    /// diagnostics; its message does not.
    pub fn authorize(&self, username: &str, password: &str, domain: &str) -> Result<()> {
        if self.username != username {
            return Err(Error::auth_mismatch("username"));
        }
        if self.password != password {
            return Err(Error::auth_mismatch("passwd"));
        }
        if self.domain != domain {
            return Err(Error::auth_mismatch("domain"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for IncomingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IncomingRequest")
            .field("username", &"<REDACTED>")
            .field("password", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("ipv4_address", &self.ipv4_address)
            .field("ipv6_address", &self.ipv6_address)
            .field("ipv6_lan_prefix", &self.ipv6_lan_prefix)
            .field("dualstack", &self.dualstack)
            .finish()
    }
}

#[derive(Default)]
struct QueryFields {
    username: Option<String>,
    password: Option<String>,
    domain: Option<String>,
    ipaddr: Option<String>,
    ip6addr: Option<String>,
    ip6lanprefix: Option<String>,
    dualstack: Option<String>,
}

impl QueryFields {
    fn validate(self) -> Result<IncomingRequest> {
        let username = self.username.ok_or(Error::MissingField("username"))?;
        let password = self.password.ok_or(Error::MissingField("passwd"))?;
        let domain = self.domain.ok_or(Error::MissingField("domain"))?;

        if self.ipaddr.is_none() && self.ip6addr.is_none() {
            return Err(Error::MissingAddress);
        }

        let ipv6_lan_network = self
            .ip6lanprefix
            .as_deref()
            .map(parse_lan_prefix)
            .transpose()?;

        Ok(IncomingRequest {
            username,
            password,
            domain,
            ipv4_address: self.ipaddr,
            ipv6_address: self.ip6addr,
            ipv6_lan_prefix: self.ip6lanprefix,
            ipv6_lan_network,
            dualstack: self.dualstack,
        })
    }
}

/// Parse `ip6lanprefix`, e.g. `cafe:babe:dead:beef::/64`
fn parse_lan_prefix(prefix: &str) -> Result<Ipv6Network> {
    if !prefix.contains('/') {
        return Err(Error::invalid_prefix(prefix, "missing prefix length"));
    }
    prefix
        .parse::<Ipv6Network>()
        .map_err(|e| Error::invalid_prefix(prefix, e))
}

//! DynDNS v2 status codes and their severity ranks

use std::fmt;

/// Canonical status label of one provider's reply
///
/// Variants are declared from most to least severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    BadAuth,
    NotFqdn,
    NoHost,
    NumHost,
    Abuse,
    BadAgent,
    NotYours,
    NotDonator,
    /// Synthesized for transport and address-synthesis failures
    AdministrativeError,
    DnsErr,
    /// Synthesized when no recognized label was found
    Unknown,
    Good,
    Ok,
    NoChg,
}

impl Status {
    /// Labels an upstream provider may send, in matching priority order
    ///
    /// Header and body matching walk this list front to back and stop at
    /// the first hit, so the order decides which label wins when a body
    /// contains several.
    pub const UPSTREAM: [Status; 11] = [
        Status::BadAuth,
        Status::NotFqdn,
        Status::NoHost,
        Status::NumHost,
        Status::Abuse,
        Status::BadAgent,
        Status::NotYours,
        Status::NotDonator,
        Status::DnsErr,
        Status::Good,
        Status::NoChg,
    ];

    /// Severity rank; higher is worse
    pub fn rank(self) -> i8 {
        match self {
            Status::BadAuth => 12,
            Status::NotFqdn => 11,
            Status::NoHost => 10,
            Status::NumHost => 9,
            Status::Abuse => 8,
            Status::BadAgent => 7,
            Status::NotYours => 6,
            Status::NotDonator => 5,
            Status::AdministrativeError => 4,
            Status::DnsErr => 3,
            Status::Unknown => 2,
            Status::Good => 1,
            Status::Ok => 0,
            Status::NoChg => -1,
        }
    }

    /// Wire label
    pub fn label(self) -> &'static str {
        match self {
            Status::BadAuth => "badauth",
            Status::NotFqdn => "notfqdn",
            Status::NoHost => "nohost",
            Status::NumHost => "numhost",
            Status::Abuse => "abuse",
            Status::BadAgent => "badagent",
            Status::NotYours => "!yours",
            Status::NotDonator => "!donator",
            Status::AdministrativeError => "administrative-error",
            Status::DnsErr => "dnserr",
            Status::Unknown => "unknown",
            Status::Good => "good",
            Status::Ok => "ok",
            Status::NoChg => "nochg",
        }
    }

    /// Look up a label given verbatim
    ///
    /// `911`, the DynDNS server-error code, maps to
    /// [`Status::AdministrativeError`].
    pub fn from_label(label: &str) -> Option<Status> {
        let status = match label {
            "badauth" => Status::BadAuth,
            "notfqdn" => Status::NotFqdn,
            "nohost" => Status::NoHost,
            "numhost" => Status::NumHost,
            "abuse" => Status::Abuse,
            "badagent" => Status::BadAgent,
            "!yours" => Status::NotYours,
            "!donator" => Status::NotDonator,
            "administrative-error" | "911" => Status::AdministrativeError,
            "dnserr" => Status::DnsErr,
            "unknown" => Status::Unknown,
            "good" => Status::Good,
            "ok" => Status::Ok,
            "nochg" => Status::NoChg,
            _ => return None,
        };
        Some(status)
    }

    /// Whether the aggregated text echoes the anchor address
    pub fn echoes_address(self) -> bool {
        matches!(self, Status::Good | Status::NoChg)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

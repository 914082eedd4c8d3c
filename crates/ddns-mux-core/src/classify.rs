//! Provider reply classification
//!
//! Providers answer in different dialects: some send a dedicated status
//! header, some send the status code as a header name, most put it in the
//! body. [`classify`] reduces all of them to one [`Status`].

use tracing::info;

use crate::status::Status;
use crate::traits::RawResponse;

/// Structured status header (ddnss.de and compatible)
pub const STATUS_HEADER: &str = "DDNSS-Response";

/// Human-readable companion of [`STATUS_HEADER`]; logged only
pub const MESSAGE_HEADER: &str = "DDNSS-Message";

/// Result of classifying one reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub status: Status,
    /// True when taken from a structured signal, false for a body match
    pub exact_match: bool,
}

/// Which part of the reply produced the classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    StatusHeader,
    SeverityHeader,
    Body,
}

/// Classify a reply; first match wins
///
/// 1. [`STATUS_HEADER`], taken verbatim (unrecognized → `unknown`)
/// 2. a header named after a recognized label with a non-empty value
/// 3. the first recognized label contained in the body, in
///    [`Status::UPSTREAM`] order (none → `unknown`)
pub fn classify(response: &RawResponse) -> Classification {
    classify_with_signal(response).0
}

/// Like [`classify`], also reporting where the status was found
pub fn classify_with_signal(response: &RawResponse) -> (Classification, Signal) {
    if let Some(value) = response.header(STATUS_HEADER).filter(|v| !v.is_empty()) {
        if let Some(message) = response.header(MESSAGE_HEADER).filter(|m| !m.is_empty()) {
            info!("[DDNSS-Message] Message={}", message);
        }
        let status = Status::from_label(value.trim()).unwrap_or(Status::Unknown);
        return (exact(status), Signal::StatusHeader);
    }

    if let Some(status) = Status::UPSTREAM
        .into_iter()
        .find(|s| response.header(s.label()).is_some_and(|v| !v.is_empty()))
    {
        return (exact(status), Signal::SeverityHeader);
    }

    let status = Status::UPSTREAM
        .into_iter()
        .find(|s| response.body.contains(s.label()))
        .unwrap_or(Status::Unknown);

    (
        Classification {
            status,
            exact_match: false,
        },
        Signal::Body,
    )
}

fn exact(status: Status) -> Classification {
    Classification {
        status,
        exact_match: true,
    }
}

//! Request, rule and verdict types shared by the filter components.

use serde::{Deserialize, Serialize};

/// A network request to be filtered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    /// Address the request originates from
    pub source_address: String,
    /// Address the request is headed to
    pub dest_address: String,
    /// Transport protocol, e.g. "TCP" or "UDP"
    pub protocol: String,
    /// Destination port
    pub port: u16,
}

impl Request {
    pub fn new(
        source_address: impl Into<String>,
        dest_address: impl Into<String>,
        protocol: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            source_address: source_address.into(),
            dest_address: dest_address.into(),
            protocol: protocol.into(),
            port,
        }
    }
}

/// A user-managed rule. Any request it matches is denied.
///
/// An empty `source_address` is a wildcard matching every source. All other
/// fields must match exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique rule identifier
    pub id: String,
    /// Source address to match, empty for any source
    #[serde(default)]
    pub source_address: String,
    /// Destination address to match
    pub dest_address: String,
    /// Protocol to match
    pub protocol: String,
    /// Destination port to match
    pub port: u16,
}

impl Rule {
    /// Check whether this rule matches the request.
    pub fn matches(&self, request: &Request) -> bool {
        (self.source_address.is_empty() || self.source_address == request.source_address)
            && self.dest_address == request.dest_address
            && self.protocol == request.protocol
            && self.port == request.port
    }
}

/// Outcome of a filtering pass, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allowed,
    RateLimited,
    BlockedAddress,
    BlockedByRule,
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    /// Human-readable reason reported to callers.
    pub fn message(&self) -> &'static str {
        match self {
            Decision::Allowed => "Request allowed",
            Decision::RateLimited => "Rate limit exceeded",
            Decision::BlockedAddress => "Blocked IP",
            Decision::BlockedByRule => "Blocked by custom rule",
        }
    }
}

/// The rendered verdict returned to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub allowed: bool,
    pub message: String,
}

impl From<Decision> for Response {
    fn from(decision: Decision) -> Self {
        Self {
            allowed: decision.is_allowed(),
            message: decision.message().to_string(),
        }
    }
}

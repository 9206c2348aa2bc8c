//! Error types for the integration crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `ConnectorError`: Errors from the channel connector client
//!
//! Callers going through [`ReplySender`](coffeebot_conversation::ReplySender)
//! see these wrapped in a `DeliveryError` context.

use std::fmt;

/// Errors from connector operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectorError {
    /// The HTTP client could not be built.
    ClientBuildFailed { reason: String },
    /// The activity's service URL cannot be used as a base URL.
    InvalidServiceUrl { url: String, reason: String },
    /// The request could not be sent or no response was received.
    RequestFailed { reason: String },
    /// The connector answered with a non-success status.
    Rejected { status: u16 },
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClientBuildFailed { reason } => {
                write!(f, "failed to build connector client: {reason}")
            }
            Self::InvalidServiceUrl { url, reason } => {
                write!(f, "invalid service url '{url}': {reason}")
            }
            Self::RequestFailed { reason } => write!(f, "connector request failed: {reason}"),
            Self::Rejected { status } => write!(f, "connector rejected activity with status {status}"),
        }
    }
}

impl std::error::Error for ConnectorError {}

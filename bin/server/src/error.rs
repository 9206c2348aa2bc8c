//! Error types for server startup.
//!
//! Request handling never fails outward (the webhook always answers 200), so
//! these only describe what can stop the server from starting or serving.

use std::fmt;

/// Server lifecycle errors.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration could not be loaded.
    Config { details: String },
    /// The connector client could not be created (use as context wrapper).
    Connector,
    /// The listen address could not be bound.
    Bind { addr: String, details: String },
    /// The server stopped with an I/O error.
    Serve { details: String },
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config { details } => write!(f, "failed to load configuration: {details}"),
            Self::Connector => write!(f, "failed to create connector client"),
            Self::Bind { addr, details } => write!(f, "failed to bind {addr}: {details}"),
            Self::Serve { details } => write!(f, "server error: {details}"),
        }
    }
}

impl std::error::Error for ServerError {}

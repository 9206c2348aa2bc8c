//! Channel integration for coffeebot.
//!
//! This crate provides:
//!
//! - **Connector client**: Delivers reply activities to the channel's
//!   connector service over HTTP

pub mod connector;
pub mod error;

pub use connector::{ConnectorConfig, HttpConnector, activities_url};
pub use error::ConnectorError;

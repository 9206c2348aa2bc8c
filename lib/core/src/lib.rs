//! Core types and utilities for coffeebot.
//!
//! This crate provides the identifier types and error handling shared by the
//! conversation, integration and server crates.

pub mod error;
pub mod id;

pub use error::Result;
pub use id::{AccountId, ActivityId, ChannelId, ConversationId};

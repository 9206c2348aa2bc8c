//! Error types for the conversation crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StateStoreError`: Errors from conversation state storage
//! - `DeliveryError`: Errors from sending replies back to a conversation
//! - `RouterError`: High-level wrapper for context while routing an activity

use crate::state::ConversationKey;
use coffeebot_core::ConversationId;
use std::fmt;

/// Errors from conversation state storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateStoreError {
    /// A value could not be serialized for storage.
    SerializationFailed { key: String, reason: String },
    /// A stored value could not be read back.
    DeserializationFailed { key: String, reason: String },
}

impl fmt::Display for StateStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SerializationFailed { key, reason } => {
                write!(f, "failed to serialize '{key}': {reason}")
            }
            Self::DeserializationFailed { key, reason } => {
                write!(f, "failed to deserialize '{key}': {reason}")
            }
        }
    }
}

impl std::error::Error for StateStoreError {}

/// Errors from reply delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryError {
    /// The reply could not be delivered to the conversation.
    SendFailed { conversation_id: ConversationId },
    /// The reply has no service URL to deliver to.
    MissingServiceUrl { conversation_id: ConversationId },
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed { conversation_id } => {
                write!(f, "failed to send reply to conversation {conversation_id}")
            }
            Self::MissingServiceUrl { conversation_id } => {
                write!(f, "reply to conversation {conversation_id} has no service url")
            }
        }
    }
}

impl std::error::Error for DeliveryError {}

/// High-level routing errors.
///
/// Use these to add context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouterError {
    /// Loading the conversation state failed (use as context wrapper).
    LoadState { key: ConversationKey },
    /// Advancing the dialog failed (use as context wrapper).
    DialogTurn { key: ConversationKey },
    /// Saving the conversation state failed (use as context wrapper).
    SaveState { key: ConversationKey },
    /// Delivering a reply failed (use as context wrapper).
    Delivery { key: ConversationKey },
}

impl fmt::Display for RouterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LoadState { key } => write!(f, "failed to load state for {key}"),
            Self::DialogTurn { key } => write!(f, "dialog turn failed for {key}"),
            Self::SaveState { key } => write!(f, "failed to save state for {key}"),
            Self::Delivery { key } => write!(f, "failed to deliver replies for {key}"),
        }
    }
}

impl std::error::Error for RouterError {}

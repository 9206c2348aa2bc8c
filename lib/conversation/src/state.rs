//! Conversation session state.
//!
//! Each conversation (channel id + conversation id) owns one
//! [`ConversationState`]: the bot's private dialog state plus a JSON
//! key-value bag of conversation data. Storage is behind the
//! [`ConversationStateStore`] trait so routing can be exercised without a
//! real backend.

use crate::dialog::RootDialog;
use crate::error::StateStoreError;
use async_trait::async_trait;
use coffeebot_core::{ChannelId, ConversationId};
use rootcause::prelude::Report;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;
use tokio::sync::RwLock;

/// Identifies a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub channel_id: ChannelId,
    pub conversation_id: ConversationId,
}

impl ConversationKey {
    /// Creates a key.
    #[must_use]
    pub fn new(channel_id: impl Into<ChannelId>, conversation_id: impl Into<ConversationId>) -> Self {
        Self {
            channel_id: channel_id.into(),
            conversation_id: conversation_id.into(),
        }
    }
}

impl fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.channel_id, self.conversation_id)
    }
}

/// Arbitrary JSON values attached to a conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationData(Map<String, JsonValue>);

impl ConversationData {
    /// Reads a typed value.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value does not deserialize as `T`.
    pub fn get_value<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<T>, Report<StateStoreError>> {
        let Some(value) = self.0.get(key) else {
            return Ok(None);
        };
        let typed = serde_json::from_value(value.clone()).map_err(|e| {
            StateStoreError::DeserializationFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(Some(typed))
    }

    /// Stores a typed value, replacing any previous value under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` cannot be represented as JSON.
    pub fn set_value<T: Serialize>(
        &mut self,
        key: &str,
        value: &T,
    ) -> Result<(), Report<StateStoreError>> {
        let json = serde_json::to_value(value).map_err(|e| StateStoreError::SerializationFailed {
            key: key.to_string(),
            reason: e.to_string(),
        })?;
        self.0.insert(key.to_string(), json);
        Ok(())
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Renders the stored data as compact JSON.
    #[must_use]
    pub fn to_json_string(&self) -> String {
        JsonValue::Object(self.0.clone()).to_string()
    }
}

/// Everything persisted for one conversation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    /// Dialog position; `None` until the first message arrives.
    #[serde(default)]
    pub dialog: Option<RootDialog>,
    /// Conversation data shared with diagnostics.
    #[serde(default)]
    pub data: ConversationData,
}

/// Trait for conversation state storage.
///
/// Loading a key that was never saved yields an empty state.
#[async_trait]
pub trait ConversationStateStore: Send + Sync {
    /// Loads the state of a conversation.
    async fn load(&self, key: &ConversationKey) -> Result<ConversationState, Report<StateStoreError>>;

    /// Replaces the state of a conversation.
    async fn save(
        &self,
        key: &ConversationKey,
        state: &ConversationState,
    ) -> Result<(), Report<StateStoreError>>;
}

/// Process-local state store.
///
/// States are kept as serialized snapshots, so nothing handed out by
/// [`load`](ConversationStateStore::load) aliases the stored copy.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<ConversationKey, String>>,
}

impl InMemoryStateStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of conversations with saved state.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Returns true if no conversation has saved state.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl ConversationStateStore for InMemoryStateStore {
    async fn load(&self, key: &ConversationKey) -> Result<ConversationState, Report<StateStoreError>> {
        let entries = self.entries.read().await;
        let Some(snapshot) = entries.get(key) else {
            return Ok(ConversationState::default());
        };

        let state = serde_json::from_str(snapshot).map_err(|e| {
            StateStoreError::DeserializationFailed {
                key: key.to_string(),
                reason: e.to_string(),
            }
        })?;
        Ok(state)
    }

    async fn save(
        &self,
        key: &ConversationKey,
        state: &ConversationState,
    ) -> Result<(), Report<StateStoreError>> {
        let snapshot =
            serde_json::to_string(state).map_err(|e| StateStoreError::SerializationFailed {
                key: key.to_string(),
                reason: e.to_string(),
            })?;
        self.entries.write().await.insert(key.clone(), snapshot);
        Ok(())
    }
}

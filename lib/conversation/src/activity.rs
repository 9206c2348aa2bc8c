//! Activity types exchanged with a chat channel.
//!
//! Only the subset of the activity schema that the bot reads or writes is
//! modeled here. Unknown JSON fields are ignored on the way in.

use crate::state::ConversationKey;
use chrono::{DateTime, Utc};
use coffeebot_core::{AccountId, ActivityId, ChannelId, ConversationId};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account id used as the sender of replies when the inbound activity does
/// not name a recipient.
pub const BOT_ACCOUNT_ID: &str = "coffeebot";

/// The kind of an activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityType {
    /// A user or bot message.
    Message,
    /// Members joined or left, or conversation metadata changed.
    ConversationUpdate,
    /// The user asked for their data to be deleted.
    DeleteUserData,
    /// The bot was added to or removed from a contact list.
    ContactRelationUpdate,
    /// The user is typing.
    Typing,
    /// Channel liveness check.
    Ping,
    /// A type this bot does not know about.
    Unknown(String),
}

impl ActivityType {
    /// Returns the wire name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Message => "message",
            Self::ConversationUpdate => "conversationUpdate",
            Self::DeleteUserData => "deleteUserData",
            Self::ContactRelationUpdate => "contactRelationUpdate",
            Self::Typing => "typing",
            Self::Ping => "ping",
            Self::Unknown(other) => other,
        }
    }
}

impl From<String> for ActivityType {
    fn from(raw: String) -> Self {
        // Channels are not consistent about casing.
        match raw.to_ascii_lowercase().as_str() {
            "message" => Self::Message,
            "conversationupdate" => Self::ConversationUpdate,
            "deleteuserdata" => Self::DeleteUserData,
            "contactrelationupdate" => Self::ContactRelationUpdate,
            "typing" => Self::Typing,
            "ping" => Self::Ping,
            _ => Self::Unknown(raw),
        }
    }
}

impl From<ActivityType> for String {
    fn from(activity_type: ActivityType) -> Self {
        activity_type.as_str().to_string()
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user or bot account on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAccount {
    /// Channel-assigned account id.
    pub id: AccountId,
    /// Display name, if the channel provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ChannelAccount {
    /// Creates an account.
    #[must_use]
    pub fn new(id: impl Into<AccountId>, name: Option<String>) -> Self {
        Self {
            id: id.into(),
            name,
        }
    }

    /// Returns the display name, falling back to the account id.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.id.as_str())
    }
}

/// The conversation an activity belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationAccount {
    /// Channel-assigned conversation id.
    pub id: ConversationId,
    /// Conversation display name, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Whether this is a group conversation.
    #[serde(default)]
    pub is_group: bool,
}

impl ConversationAccount {
    /// Creates a one-to-one conversation reference.
    #[must_use]
    pub fn new(id: impl Into<ConversationId>) -> Self {
        Self {
            id: id.into(),
            name: None,
            is_group: false,
        }
    }
}

/// A single inbound or outbound chat event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// What kind of event this is.
    #[serde(rename = "type")]
    pub activity_type: ActivityType,
    /// Activity id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ActivityId>,
    /// When the activity was sent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
    /// Base URL of the channel connector that replies are posted to.
    #[serde(default)]
    pub service_url: String,
    /// The channel the activity came from.
    pub channel_id: ChannelId,
    /// Sender.
    pub from: ChannelAccount,
    /// Addressee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recipient: Option<ChannelAccount>,
    /// The conversation the activity belongs to.
    pub conversation: ConversationAccount,
    /// Message text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Members added (conversation updates only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_added: Vec<ChannelAccount>,
    /// Members removed (conversation updates only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub members_removed: Vec<ChannelAccount>,
    /// The activity this one replies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_id: Option<ActivityId>,
}

impl Activity {
    /// Creates an inbound-style activity of the given type.
    #[must_use]
    pub fn new(
        activity_type: ActivityType,
        channel_id: impl Into<ChannelId>,
        conversation: ConversationAccount,
        from: ChannelAccount,
    ) -> Self {
        Self {
            activity_type,
            id: None,
            timestamp: None,
            service_url: String::new(),
            channel_id: channel_id.into(),
            from,
            recipient: None,
            conversation,
            text: None,
            members_added: Vec::new(),
            members_removed: Vec::new(),
            reply_to_id: None,
        }
    }

    /// Creates a message activity.
    #[must_use]
    pub fn message(
        channel_id: impl Into<ChannelId>,
        conversation: ConversationAccount,
        from: ChannelAccount,
        text: impl Into<String>,
    ) -> Self {
        Self::new(ActivityType::Message, channel_id, conversation, from).with_text(text)
    }

    /// Sets the message text.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the connector service URL.
    #[must_use]
    pub fn with_service_url(mut self, service_url: impl Into<String>) -> Self {
        self.service_url = service_url.into();
        self
    }

    /// Returns the message text, or an empty string for text-less activities.
    #[must_use]
    pub fn message_text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Returns the key of the conversation session this activity belongs to.
    #[must_use]
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey {
            channel_id: self.channel_id.clone(),
            conversation_id: self.conversation.id.clone(),
        }
    }

    /// Builds a new bot message in this activity's conversation.
    ///
    /// The message is addressed back to this activity's sender, stays in the
    /// same channel and conversation and is posted to the same service URL,
    /// but does not reference this activity.
    #[must_use]
    pub fn create_message(&self, text: impl Into<String>) -> Activity {
        let from = self
            .recipient
            .clone()
            .unwrap_or_else(|| ChannelAccount::new(BOT_ACCOUNT_ID, None));

        Activity {
            activity_type: ActivityType::Message,
            id: Some(ActivityId::generate()),
            timestamp: Some(Utc::now()),
            service_url: self.service_url.clone(),
            channel_id: self.channel_id.clone(),
            from,
            recipient: Some(self.from.clone()),
            conversation: self.conversation.clone(),
            text: Some(text.into()),
            members_added: Vec::new(),
            members_removed: Vec::new(),
            reply_to_id: None,
        }
    }

    /// Builds a reply to this activity.
    ///
    /// Same as [`create_message`](Self::create_message), linked to this
    /// activity through `replyToId`.
    #[must_use]
    pub fn create_reply(&self, text: impl Into<String>) -> Activity {
        Activity {
            reply_to_id: self.id.clone(),
            ..self.create_message(text)
        }
    }
}

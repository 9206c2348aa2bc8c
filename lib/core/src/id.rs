//! Strongly-typed identifiers for chat entities.
//!
//! Channels assign their own identifiers, so these wrap opaque strings rather
//! than parsing a fixed format. Only IDs minted by the bot itself (outbound
//! activity ids) are generated locally, as ULIDs.

use serde::{Deserialize, Serialize};
use std::fmt;
use ulid::Ulid;

/// Macro to generate a strongly-typed wrapper around a channel-assigned string.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier.
            #[must_use]
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_string())
            }
        }

        impl From<String> for $name {
            fn from(raw: String) -> Self {
                Self(raw)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a chat channel (e.g. `skype`, `msteams`, `emulator`).
    ChannelId
);

define_id!(
    /// Identifier of a conversation, unique within its channel.
    ConversationId
);

define_id!(
    /// Identifier of a channel account (a user or the bot).
    AccountId
);

define_id!(
    /// Identifier of a single activity.
    ActivityId
);

impl ActivityId {
    /// Mints a fresh identifier for an activity sent by the bot.
    #[must_use]
    pub fn generate() -> Self {
        Self(Ulid::new().to_string())
    }
}

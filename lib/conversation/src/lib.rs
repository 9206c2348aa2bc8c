//! Conversation handling for coffeebot.
//!
//! This crate provides:
//!
//! - **Activities**: The inbound/outbound chat event model
//! - **Ordering Form**: Field-by-field collection of a coffee order
//! - **Root Dialog**: Greeting plus an endless ordering loop
//! - **State Store**: Per-conversation dialog state and data
//! - **Activity Router**: Classifies activities and posts replies

pub mod activity;
pub mod dialog;
pub mod error;
pub mod form;
pub mod order;
pub mod outbound;
pub mod router;
pub mod state;

pub use activity::{Activity, ActivityType, ChannelAccount, ConversationAccount};
pub use dialog::{DialogTurn, ORDER_KEY, RootDialog};
pub use error::{DeliveryError, RouterError, StateStoreError};
pub use form::{DISMISSAL_MESSAGE, FormStep, FormTurn, OrderField, OrderForm};
pub use order::{Choice, Coffee, CoffeeOrder, Milk, Size, Sugar};
pub use outbound::ReplySender;
pub use router::{ActivityRouter, Route, classify};
pub use state::{
    ConversationData, ConversationKey, ConversationState, ConversationStateStore,
    InMemoryStateStore,
};

//! Shared application state.

use coffeebot_conversation::{
    ActivityRouter, ConversationStateStore, InMemoryStateStore, ReplySender,
};
use coffeebot_integration::HttpConnector;
use std::sync::Arc;

/// Shared application state.
pub struct AppState {
    /// Routes inbound activities and posts replies.
    pub activity_router: ActivityRouter,
}

impl AppState {
    /// Creates application state over the given store and reply sender.
    pub fn new(store: Arc<dyn ConversationStateStore>, sender: Arc<dyn ReplySender>) -> Self {
        Self {
            activity_router: ActivityRouter::new(store, sender),
        }
    }

    /// Creates the production state: in-process session storage and HTTP
    /// reply delivery.
    pub fn with_connector(connector: HttpConnector) -> Self {
        Self::new(Arc::new(InMemoryStateStore::new()), Arc::new(connector))
    }
}

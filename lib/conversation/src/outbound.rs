//! Outbound reply delivery.

use crate::activity::Activity;
use crate::error::DeliveryError;
use async_trait::async_trait;
use rootcause::prelude::Report;

/// Trait for posting reply activities back to their conversation.
///
/// Implementations deliver one activity per call and do not retry.
#[async_trait]
pub trait ReplySender: Send + Sync {
    /// Sends a reply to the conversation named in `reply`.
    async fn send_to_conversation(&self, reply: &Activity) -> Result<(), Report<DeliveryError>>;
}

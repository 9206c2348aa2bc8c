//! HTTP client for the channel connector.
//!
//! Replies are posted to the connector at the service URL carried by the
//! inbound activity:
//!
//! ```text
//! POST {serviceUrl}/v3/conversations/{conversationId}/activities
//! ```

use crate::error::ConnectorError;
use async_trait::async_trait;
use coffeebot_conversation::{Activity, DeliveryError, ReplySender};
use coffeebot_core::ConversationId;
use reqwest::Url;
use rootcause::prelude::{Report, ResultExt};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Connector client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ConnectorConfig {
    /// Per-request timeout, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("coffeebot/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

/// Builds the URL a reply to `conversation_id` is posted to.
///
/// # Errors
///
/// Returns an error if `service_url` is not an absolute base URL.
pub fn activities_url(
    service_url: &str,
    conversation_id: &ConversationId,
) -> Result<Url, ConnectorError> {
    let invalid = |reason: String| ConnectorError::InvalidServiceUrl {
        url: service_url.to_string(),
        reason,
    };

    let mut url = Url::parse(service_url).map_err(|e| invalid(e.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| invalid("cannot be a base url".to_string()))?;
        segments.pop_if_empty().extend([
            "v3",
            "conversations",
            conversation_id.as_str(),
            "activities",
        ]);
    }
    Ok(url)
}

/// Connector client that delivers replies over HTTP.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    client: reqwest::Client,
}

impl HttpConnector {
    /// Creates a connector client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ConnectorConfig) -> Result<Self, Report<ConnectorError>> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ConnectorError::ClientBuildFailed {
                reason: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Posts an activity to its conversation.
    ///
    /// # Errors
    ///
    /// Returns an error if the service URL is invalid, the request fails, or
    /// the connector answers with a non-success status.
    #[instrument(skip(self, activity), fields(conversation_id = %activity.conversation.id))]
    pub async fn post_activity(&self, activity: &Activity) -> Result<(), Report<ConnectorError>> {
        let url = activities_url(&activity.service_url, &activity.conversation.id)?;

        let response = self
            .client
            .post(url)
            .json(activity)
            .send()
            .await
            .map_err(|e| ConnectorError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConnectorError::Rejected {
                status: status.as_u16(),
            }
            .into());
        }

        debug!(%status, "activity posted");
        Ok(())
    }
}

#[async_trait]
impl ReplySender for HttpConnector {
    async fn send_to_conversation(&self, reply: &Activity) -> Result<(), Report<DeliveryError>> {
        if reply.service_url.is_empty() {
            return Err(DeliveryError::MissingServiceUrl {
                conversation_id: reply.conversation.id.clone(),
            }
            .into());
        }

        self.post_activity(reply)
            .await
            .context(DeliveryError::SendFailed {
                conversation_id: reply.conversation.id.clone(),
            })
    }
}

use crate::entities::newsletter_sub_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubscribeRequest {
    pub email: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriberResponse {
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

impl From<newsletter_sub_entity::Model> for SubscriberResponse {
    fn from(m: newsletter_sub_entity::Model) -> Self {
        Self {
            email: m.email,
            subscribed_at: m.subscribed_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SendNewsletterRequest {
    pub subject: String,
    #[serde(alias = "htmlContent")]
    pub html_content: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SendNewsletterResponse {
    pub recipients: usize,
    pub message_id: Option<String>,
}

use super::{NewsletterEmail, NewsletterMailer};
use crate::config::BrevoConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Brevo 单次请求最多 1000 个 messageVersions
const MAX_VERSIONS_PER_REQUEST: usize = 1000;

#[derive(Debug, Serialize)]
struct Contact<'a> {
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct MessageVersion<'a> {
    to: Vec<Contact<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailRequest<'a> {
    sender: Contact<'a>,
    subject: &'a str,
    html_content: &'a str,
    message_versions: Vec<MessageVersion<'a>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendEmailResponse {
    message_id: Option<String>,
    #[serde(default)]
    message_ids: Vec<String>,
}

#[derive(Clone)]
pub struct BrevoService {
    client: Client,
    config: BrevoConfig,
}

impl BrevoService {
    pub fn new(config: BrevoConfig, timeout: Duration) -> AppResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, config })
    }

    /// 每个订阅者一个 message version，收件人之间互不可见
    fn build_requests<'a>(&'a self, email: &'a NewsletterEmail) -> Vec<SendEmailRequest<'a>> {
        email
            .recipients
            .chunks(MAX_VERSIONS_PER_REQUEST)
            .map(|chunk| SendEmailRequest {
                sender: Contact {
                    email: &self.config.sender_email,
                    name: Some(&self.config.sender_name),
                },
                subject: &email.subject,
                html_content: &email.html_content,
                message_versions: chunk
                    .iter()
                    .map(|recipient| MessageVersion {
                        to: vec![Contact {
                            email: recipient,
                            name: None,
                        }],
                    })
                    .collect(),
            })
            .collect()
    }
}

impl NewsletterMailer for BrevoService {
    async fn send_newsletter(&self, email: NewsletterEmail) -> AppResult<Option<String>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| AppError::ConfigError("Brevo API key not configured".to_string()))?;

        let url = format!("{}/smtp/email", self.config.base_url.trim_end_matches('/'));
        let mut first_message_id = None;

        for request in self.build_requests(&email) {
            let response = self
                .client
                .post(&url)
                .header("api-key", api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        AppError::ExternalApiError("Brevo request timed out".to_string())
                    } else {
                        AppError::ReqwestError(e)
                    }
                })?;

            if !response.status().is_success() {
                let status = response.status();
                let error_text = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                log::error!("Brevo rejected newsletter batch: {status} {error_text}");
                return Err(AppError::ExternalApiError(format!(
                    "Newsletter sending failed: {status}"
                )));
            }

            let body: SendEmailResponse = response.json().await?;
            if first_message_id.is_none() {
                first_message_id = body.message_id.or_else(|| body.message_ids.into_iter().next());
            }
        }

        log::info!(
            "Newsletter \"{}\" sent to {} subscribers",
            email.subject,
            email.recipients.len()
        );
        Ok(first_message_id)
    }
}

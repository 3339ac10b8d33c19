use super::{CheckoutSessionRef, CheckoutSessionRequest, PaymentGateway};
use crate::config::StripeConfig;
use crate::error::{AppError, AppResult};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::collections::HashMap;
use std::time::Duration;
use stripe::{
    CheckoutSession, CheckoutSessionMode, Client, CreateCheckoutSession,
    CreateCheckoutSessionLineItems, CreateCheckoutSessionLineItemsPriceData,
    CreateCheckoutSessionLineItemsPriceDataProductData, CreateCheckoutSessionPaymentMethodTypes,
    Currency,
};

type HmacSha256 = Hmac<Sha256>;

/// 签名时间戳允许的偏差（秒）
pub const WEBHOOK_TOLERANCE_SECS: i64 = 300;

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_CHECKOUT_ASYNC_SUCCEEDED: &str = "checkout.session.async_payment_succeeded";

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookEventData,
}

#[derive(Debug, Deserialize)]
pub struct WebhookEventData {
    pub object: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerDetails {
    pub email: Option<String>,
}

/// checkout.session.* 事件里我们关心的字段
#[derive(Debug, Deserialize)]
pub struct CheckoutSessionObject {
    pub id: String,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    pub amount_total: Option<i64>,
    pub payment_status: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl CheckoutSessionObject {
    pub fn purchaser_email(&self) -> Option<&str> {
        self.customer_email
            .as_deref()
            .or_else(|| self.customer_details.as_ref()?.email.as_deref())
    }

    /// 延迟支付方式会先以 unpaid 状态完成会话
    pub fn is_paid(&self) -> bool {
        matches!(
            self.payment_status.as_deref(),
            None | Some("paid") | Some("no_payment_required")
        )
    }
}

#[derive(Clone)]
pub struct StripeService {
    client: Client,
    config: StripeConfig,
    timeout: Duration,
}

impl StripeService {
    pub fn new(config: StripeConfig, timeout: Duration) -> Self {
        Self {
            client: Client::new(config.secret_key.clone()),
            config,
            timeout,
        }
    }

    pub fn publishable_key(&self) -> &str {
        &self.config.publishable_key
    }

    fn currency(&self) -> AppResult<Currency> {
        serde_json::from_value(serde_json::Value::String(self.config.currency.to_lowercase()))
            .map_err(|_| {
                AppError::ConfigError(format!("Unsupported currency: {}", self.config.currency))
            })
    }

    /// 校验 `Stripe-Signature` 头并解析事件。
    ///
    /// 头格式为 `t=<unix>,v1=<hex>[,v1=<hex>...]`，签名内容为 `"{t}.{payload}"`。
    pub fn verify_webhook_signature(
        &self,
        payload: &[u8],
        signature_header: &str,
        now: i64,
    ) -> AppResult<WebhookEvent> {
        verify_signature(
            payload,
            signature_header,
            &self.config.webhook_secret,
            now,
        )?;
        Ok(serde_json::from_slice(payload)?)
    }
}

pub fn verify_signature(
    payload: &[u8],
    signature_header: &str,
    secret: &str,
    now: i64,
) -> AppResult<()> {
    let invalid = |reason: &str| AppError::ValidationError(format!("Invalid webhook signature: {reason}"));

    if secret.is_empty() {
        return Err(AppError::ConfigError(
            "Stripe webhook secret is not configured".to_string(),
        ));
    }

    let mut raw_timestamp: Option<&str> = None;
    let mut signatures: Vec<Vec<u8>> = Vec::new();
    for part in signature_header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => raw_timestamp = Some(value),
            Some(("v1", value)) => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    let raw_timestamp = raw_timestamp.ok_or_else(|| invalid("missing timestamp"))?;
    let timestamp: i64 = raw_timestamp
        .parse()
        .map_err(|_| invalid("malformed timestamp"))?;
    if signatures.is_empty() {
        return Err(invalid("missing v1 signature"));
    }
    if (now - timestamp).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err(invalid("timestamp outside tolerance"));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::InternalError(format!("HMAC init failed: {e}")))?;
    mac.update(raw_timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // verify_slice 为常数时间比较
    if signatures
        .iter()
        .any(|sig| mac.clone().verify_slice(sig).is_ok())
    {
        Ok(())
    } else {
        Err(invalid("no matching signature"))
    }
}

impl PaymentGateway for StripeService {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AppResult<CheckoutSessionRef> {
        let currency = self.currency()?;

        let line_items = request
            .line_items
            .iter()
            .map(|item| CreateCheckoutSessionLineItems {
                quantity: Some(item.quantity),
                price_data: Some(CreateCheckoutSessionLineItemsPriceData {
                    currency,
                    unit_amount: Some(item.unit_amount),
                    product_data: Some(CreateCheckoutSessionLineItemsPriceDataProductData {
                        name: item.name.clone(),
                        description: (!item.description.is_empty())
                            .then(|| item.description.clone()),
                        // Stripe 只接受绝对地址的图片
                        images: Some(
                            item.images
                                .iter()
                                .filter(|url| url.starts_with("https://") || url.starts_with("http://"))
                                .cloned()
                                .collect(),
                        ),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            })
            .collect::<Vec<_>>();

        let mut params = CreateCheckoutSession::new();
        params.mode = Some(CheckoutSessionMode::Payment);
        params.payment_method_types = Some(vec![CreateCheckoutSessionPaymentMethodTypes::Card]);
        params.success_url = Some(self.config.success_url.as_str());
        params.cancel_url = Some(self.config.cancel_url.as_str());
        params.customer_email = Some(request.customer_email.as_str());
        params.line_items = Some(line_items);
        params.metadata = Some(request.metadata.clone());

        let session = tokio::time::timeout(
            self.timeout,
            CheckoutSession::create(&self.client, params),
        )
        .await
        .map_err(|_| AppError::ExternalApiError("Stripe request timed out".to_string()))??;

        log::info!("Created Stripe checkout session {}", session.id);

        Ok(CheckoutSessionRef {
            id: session.id.to_string(),
            url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test123secret456";

    fn sign(payload: &[u8], secret: &str, timestamp: i64) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(payload);
        format!(
            "t={timestamp},v1={}",
            hex::encode(mac.finalize().into_bytes())
        )
    }

    fn service() -> StripeService {
        StripeService::new(
            StripeConfig {
                secret_key: "sk_test_123".to_string(),
                publishable_key: "pk_test_123".to_string(),
                webhook_secret: SECRET.to_string(),
                currency: "usd".to_string(),
                success_url: "http://localhost/success.html".to_string(),
                cancel_url: "http://localhost/cancel.html".to_string(),
            },
            Duration::from_secs(5),
        )
    }

    #[test]
    fn test_valid_signature_parses_event() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed","data":{"object":{"id":"cs_1"}}}"#;
        let now = 1_700_000_000;
        let header = sign(payload, SECRET, now);
        let event = service()
            .verify_webhook_signature(payload, &header, now)
            .unwrap();
        assert_eq!(event.id, "evt_1");
        assert_eq!(event.event_type, EVENT_CHECKOUT_COMPLETED);
    }

    #[test]
    fn test_signature_with_wrong_secret_is_rejected() {
        let payload = br#"{"type":"checkout.session.completed"}"#;
        let now = 1_700_000_000;
        let header = sign(payload, "wrong_secret", now);
        assert!(verify_signature(payload, &header, SECRET, now).is_err());
    }

    #[test]
    fn test_modified_payload_is_rejected() {
        let now = 1_700_000_000;
        let header = sign(br#"{"amount":1}"#, SECRET, now);
        assert!(verify_signature(br#"{"amount":9}"#, &header, SECRET, now).is_err());
    }

    #[test]
    fn test_stale_timestamp_is_rejected() {
        let payload = b"{}";
        let signed_at = 1_700_000_000;
        let header = sign(payload, SECRET, signed_at);
        assert!(verify_signature(payload, &header, SECRET, signed_at + 600).is_err());
        assert!(verify_signature(payload, &header, SECRET, signed_at + 299).is_ok());
    }

    #[test]
    fn test_any_matching_v1_is_accepted() {
        let payload = b"{}";
        let now = 1_700_000_000;
        let good = sign(payload, SECRET, now);
        let good_sig = good.split_once(",v1=").unwrap().1;
        let header = format!("t={now},v1={},v1={good_sig}", "00".repeat(32));
        assert!(verify_signature(payload, &header, SECRET, now).is_ok());
    }

    #[test]
    fn test_malformed_headers_are_rejected() {
        let payload = b"{}";
        assert!(verify_signature(payload, "", SECRET, 0).is_err());
        assert!(verify_signature(payload, "v1=abcd", SECRET, 0).is_err());
        assert!(verify_signature(payload, "t=0", SECRET, 0).is_err());
        assert!(matches!(
            verify_signature(payload, "t=0,v1=00", "", 0),
            Err(AppError::ConfigError(_))
        ));
    }

    #[test]
    fn test_session_object_email_fallback_and_paid_state() {
        let object: CheckoutSessionObject = serde_json::from_str(
            r#"{"id":"cs_1","customer_email":null,"customer_details":{"email":"fan@example.com"},
                "amount_total":5000,"payment_status":"unpaid","metadata":{"items":"[]"}}"#,
        )
        .unwrap();
        assert_eq!(object.purchaser_email(), Some("fan@example.com"));
        assert!(!object.is_paid());
    }

    #[test]
    fn test_currency_from_config() {
        assert_eq!(service().currency().unwrap(), Currency::USD);
    }
}

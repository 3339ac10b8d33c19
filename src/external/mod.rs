pub mod brevo;
pub mod stripe;

pub use self::brevo::*;
pub use self::stripe::*;

use crate::error::AppResult;
use std::collections::HashMap;
use std::future::Future;

/// 一条结账行，价格已由服务端解析
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutLineItem {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub unit_amount: i64,
    pub quantity: u64,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub customer_email: String,
    pub line_items: Vec<CheckoutLineItem>,
    pub metadata: HashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionRef {
    pub id: String,
    pub url: Option<String>,
}

/// 支付处理方：只负责创建托管的结账会话
pub trait PaymentGateway: Clone + Send + Sync + 'static {
    fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> impl Future<Output = AppResult<CheckoutSessionRef>> + Send;
}

#[derive(Debug, Clone)]
pub struct NewsletterEmail {
    pub subject: String,
    pub html_content: String,
    pub recipients: Vec<String>,
}

/// 群发邮件通道，返回服务商的 message id（如有）
pub trait NewsletterMailer: Clone + Send + Sync + 'static {
    fn send_newsletter(
        &self,
        email: NewsletterEmail,
    ) -> impl Future<Output = AppResult<Option<String>>> + Send;
}

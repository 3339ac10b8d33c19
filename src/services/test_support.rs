//! 服务层测试用的种子数据
use crate::database::DbPool;
use crate::entities::{
    drop_entity as drops, drop_product_entity as allocations, product_entity as products,
    product_variant_entity as variants,
};
use crate::external::{CheckoutSessionRef, CheckoutSessionRequest, NewsletterEmail};
use crate::external::{NewsletterMailer, PaymentGateway};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use std::sync::{Arc, Mutex};

pub const DROP_KEY: &str = "FREAK-2026";

pub fn product_model(id: i64, title: &str) -> products::Model {
    products::Model {
        id,
        title: title.to_string(),
        description: None,
        images: "[]".to_string(),
        category: "streetwear".to_string(),
        created_at: Utc::now(),
    }
}

/// 插入一个商品及其规格 (size, price, stock_total)
pub async fn seed_product(
    pool: &DbPool,
    title: &str,
    sizes: &[(&str, i64, i64)],
) -> (products::Model, Vec<variants::Model>) {
    let image = format!("/images/{}.jpg", title.to_lowercase().replace(' ', "-"));
    let product = products::ActiveModel {
        title: Set(title.to_string()),
        description: Set(Some(format!("{title} description"))),
        images: Set(serde_json::to_string(&vec![image]).unwrap()),
        category: Set("streetwear".to_string()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap();

    let mut list = Vec::new();
    for (size, price, stock) in sizes {
        let variant = variants::ActiveModel {
            product_id: Set(product.id),
            size: Set(size.to_string()),
            price: Set(*price),
            stock_total: Set(*stock),
            stock_for_drop: Set(None),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap();
        list.push(variant);
    }
    (product, list)
}

pub async fn seed_drop(pool: &DbPool, start_at: DateTime<Utc>, end_at: DateTime<Utc>) -> drops::Model {
    drops::ActiveModel {
        title: Set("Night Drop".to_string()),
        description: Set(None),
        start_at: Set(start_at),
        end_at: Set(end_at),
        key_hash: Set(bcrypt::hash(DROP_KEY, 4).unwrap()),
        is_active: Set(true),
        processed: Set(false),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap()
}

pub async fn seed_allocation(pool: &DbPool, drop_id: i64, variant_id: i64, allocated: i64) {
    allocations::ActiveModel {
        drop_id: Set(drop_id),
        product_variant_id: Set(variant_id),
        allocated_stock: Set(allocated),
        ..Default::default()
    }
    .insert(pool)
    .await
    .unwrap();
}

pub async fn variant_stock(pool: &DbPool, variant_id: i64) -> i64 {
    variants::Entity::find_by_id(variant_id)
        .one(pool)
        .await
        .unwrap()
        .unwrap()
        .stock_total
}

/// 记录请求的假支付网关
#[derive(Clone, Default)]
pub struct MockGateway {
    pub requests: Arc<Mutex<Vec<CheckoutSessionRequest>>>,
    pub fail: bool,
}

impl PaymentGateway for MockGateway {
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> AppResult<CheckoutSessionRef> {
        if self.fail {
            return Err(AppError::ExternalApiError("stripe down".to_string()));
        }
        let mut requests = self.requests.lock().unwrap();
        requests.push(request);
        let id = format!("cs_test_{}", requests.len());
        Ok(CheckoutSessionRef {
            url: Some(format!("https://checkout.stripe.test/{id}")),
            id,
        })
    }
}

#[derive(Clone, Default)]
pub struct MockMailer {
    pub sent: Arc<Mutex<Vec<NewsletterEmail>>>,
}

impl NewsletterMailer for MockMailer {
    async fn send_newsletter(&self, email: NewsletterEmail) -> AppResult<Option<String>> {
        self.sent.lock().unwrap().push(email);
        Ok(Some("<msg-1@brevo>".to_string()))
    }
}

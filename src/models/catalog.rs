use crate::entities::{product_entity, product_variant_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 对外展示的规格；stock 在 drop 场景下为配额，在常规商店为总库存
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct VariantResponse {
    pub id: i64,
    pub size: String,
    pub price: i64,
    pub stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub category: String,
    pub variants: Vec<VariantResponse>,
}

impl ProductResponse {
    pub fn from_model(m: &product_entity::Model) -> Self {
        Self {
            id: m.id,
            title: m.title.clone(),
            description: m.description.clone(),
            images: m.image_list(),
            category: m.category.clone(),
            variants: Vec::new(),
        }
    }
}

/// 管理端规格视图，包含总库存与 drop 镜像字段
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminVariantResponse {
    pub id: i64,
    pub product_id: i64,
    pub size: String,
    pub price: i64,
    pub stock_total: i64,
    pub stock_for_drop: Option<i64>,
}

impl From<product_variant_entity::Model> for AdminVariantResponse {
    fn from(m: product_variant_entity::Model) -> Self {
        Self {
            id: m.id,
            product_id: m.product_id,
            size: m.size,
            price: m.price,
            stock_total: m.stock_total,
            stock_for_drop: m.stock_for_drop,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AdminProductResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub category: String,
    pub created_at: DateTime<Utc>,
    pub variants: Vec<AdminVariantResponse>,
}

impl AdminProductResponse {
    pub fn new(
        product: product_entity::Model,
        variants: Vec<product_variant_entity::Model>,
    ) -> Self {
        let images = product.image_list();
        Self {
            id: product.id,
            title: product.title,
            description: product.description,
            images,
            category: product.category,
            created_at: product.created_at,
            variants: variants.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub category: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub category: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateVariantRequest {
    pub size: String,
    pub price: i64,
    #[serde(default, alias = "stockTotal")]
    pub stock_total: i64,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateVariantRequest {
    pub size: Option<String>,
    pub price: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RestockRequest {
    pub quantity: i64,
}

use crate::entities::{drop_entity, drop_product_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Drop 元数据（不含 key_hash）
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DropResponse {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub is_active: bool,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

impl DropResponse {
    /// is_active 反映查询时刻是否处于开放窗口
    pub fn at(m: drop_entity::Model, now: DateTime<Utc>) -> Self {
        let is_active = m.is_open_at(now);
        Self {
            id: m.id,
            title: m.title,
            description: m.description,
            start_at: m.start_at,
            end_at: m.end_at,
            is_active,
            processed: m.processed,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UnlockDropRequest {
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UnlockDropResponse {
    pub unlocked: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateDropRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(alias = "startAt")]
    pub start_at: DateTime<Utc>,
    #[serde(alias = "endAt")]
    pub end_at: DateTime<Utc>,
    pub key: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AllocateVariantRequest {
    #[serde(alias = "variantId")]
    pub variant_id: i64,
    #[serde(alias = "allocatedStock")]
    pub allocated_stock: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AllocationResponse {
    pub id: i64,
    pub drop_id: i64,
    pub variant_id: i64,
    pub allocated_stock: i64,
}

impl From<drop_product_entity::Model> for AllocationResponse {
    fn from(m: drop_product_entity::Model) -> Self {
        Self {
            id: m.id,
            drop_id: m.drop_id,
            variant_id: m.product_variant_id,
            allocated_stock: m.allocated_stock,
        }
    }
}

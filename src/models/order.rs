use crate::entities::{OrderStatus, order_entity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 订单行：价格为结算时从规格表解析的单价
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub variant_id: i64,
    pub quantity: i64,
    pub price: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderResponse {
    pub id: i64,
    pub user_email: String,
    pub items: Vec<OrderItem>,
    pub total_amount: i64,
    pub stripe_session_id: String,
    pub drop_id: Option<i64>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl From<order_entity::Model> for OrderResponse {
    fn from(m: order_entity::Model) -> Self {
        Self {
            id: m.id,
            user_email: m.user_email,
            items: serde_json::from_str(&m.items).unwrap_or_default(),
            total_amount: m.total_amount,
            stripe_session_id: m.stripe_session_id,
            drop_id: m.drop_id,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

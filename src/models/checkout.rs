use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use utoipa::ToSchema;

pub const METADATA_ITEMS: &str = "items";
pub const METADATA_DROP_ID: &str = "drop_id";
/// 单个规格合并后的数量上限
pub const MAX_LINE_QUANTITY: i64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ManifestItem {
    #[serde(alias = "variantId")]
    pub variant_id: i64,
    pub quantity: i64,
}

/// 客户端附带的 title/price 等字段被忽略，价格一律由服务端解析
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCheckoutRequest {
    pub items: Vec<ManifestItem>,
    pub email: String,
    #[serde(default, alias = "dropId")]
    pub drop_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutResponse {
    pub session_id: String,
    pub url: Option<String>,
}

/// 写入 Checkout Session metadata 的最小清单：只有规格 id、数量和可选 drop id。
/// 结算时据此在服务端重新解析价格。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutManifest {
    pub items: Vec<ManifestItem>,
    pub drop_id: Option<i64>,
}

impl CheckoutManifest {
    /// 校验数量并合并重复规格（保持首次出现顺序），合并后每行不超过 MAX_LINE_QUANTITY
    pub fn new(items: Vec<ManifestItem>, drop_id: Option<i64>) -> AppResult<Self> {
        if items.is_empty() {
            return Err(AppError::ValidationError(
                "At least one item is required".to_string(),
            ));
        }

        let mut merged: Vec<ManifestItem> = Vec::with_capacity(items.len());
        for item in items {
            if item.quantity < 1 {
                return Err(AppError::ValidationError(format!(
                    "Quantity for variant {} must be at least 1",
                    item.variant_id
                )));
            }
            let line = match merged.iter_mut().find(|m| m.variant_id == item.variant_id) {
                Some(existing) => {
                    existing.quantity = existing.quantity.saturating_add(item.quantity);
                    *existing
                }
                None => {
                    merged.push(item);
                    item
                }
            };
            if line.quantity > MAX_LINE_QUANTITY {
                return Err(AppError::ValidationError(format!(
                    "Quantity for variant {} exceeds {}",
                    line.variant_id, MAX_LINE_QUANTITY
                )));
            }
        }

        Ok(Self {
            items: merged,
            drop_id,
        })
    }

    pub fn to_metadata(&self) -> AppResult<HashMap<String, String>> {
        let mut metadata = HashMap::new();
        metadata.insert(
            METADATA_ITEMS.to_string(),
            serde_json::to_string(&self.items)?,
        );
        metadata.insert(
            METADATA_DROP_ID.to_string(),
            self.drop_id.map(|id| id.to_string()).unwrap_or_default(),
        );
        Ok(metadata)
    }

    /// 兼容旧 metadata 键名 `dropId` 与驼峰 `variantId`
    pub fn from_metadata(metadata: &HashMap<String, String>) -> AppResult<Self> {
        let raw_items = metadata.get(METADATA_ITEMS).ok_or_else(|| {
            AppError::ValidationError("Missing items in session metadata".to_string())
        })?;
        let items: Vec<ManifestItem> = serde_json::from_str(raw_items).map_err(|e| {
            AppError::ValidationError(format!("Malformed items in session metadata: {e}"))
        })?;

        let drop_id = match metadata
            .get(METADATA_DROP_ID)
            .or_else(|| metadata.get("dropId"))
            .map(|s| s.trim())
        {
            None | Some("") => None,
            Some(raw) => Some(raw.parse::<i64>().map_err(|_| {
                AppError::ValidationError(format!("Malformed drop id in session metadata: {raw}"))
            })?),
        };

        Self::new(items, drop_id)
    }
}

use crate::entities::{
    drop_entity as drops, drop_product_entity as allocations, product_entity as products,
    product_variant_entity as variants,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::catalog_service::group_by_product;
use crate::utils::{hash_password, verify_password};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct DropService {
    pool: DatabaseConnection,
}

impl DropService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 当前开放的 drop；窗口重叠时取 start_at 最晚、id 最大的一个
    pub async fn get_active_drop(&self, now: DateTime<Utc>) -> AppResult<DropResponse> {
        let drop = drops::Entity::find()
            .filter(drops::Column::StartAt.lte(now))
            .filter(drops::Column::EndAt.gte(now))
            .filter(drops::Column::Processed.eq(false))
            .order_by_desc(drops::Column::StartAt)
            .order_by_desc(drops::Column::Id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("No active drop".to_string()))?;

        Ok(DropResponse::at(drop, now))
    }

    /// 校验访问密钥。服务端不保存解锁状态
    pub async fn verify_key(&self, drop_id: i64, candidate: &str) -> AppResult<()> {
        let drop = drops::Entity::find_by_id(drop_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Drop not found".to_string()))?;

        if candidate.is_empty() {
            return Err(AppError::InvalidDropKey);
        }

        // 存储的哈希损坏属于内部错误
        if verify_password(candidate, &drop.key_hash)? {
            log::info!("Drop {drop_id} unlocked");
            Ok(())
        } else {
            log::warn!("Invalid key attempt for drop {drop_id}");
            Err(AppError::InvalidDropKey)
        }
    }

    /// drop 商品列表，stock 为配额，按配额 id 顺序分组
    pub async fn list_drop_products(&self, drop_id: i64) -> AppResult<Vec<ProductResponse>> {
        drops::Entity::find_by_id(drop_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Drop not found".to_string()))?;

        let rows = allocations::Entity::find()
            .filter(allocations::Column::DropId.eq(drop_id))
            .order_by_asc(allocations::Column::Id)
            .find_also_related(variants::Entity)
            .all(&self.pool)
            .await?;

        let product_ids: Vec<i64> = rows
            .iter()
            .filter_map(|(_, variant)| variant.as_ref().map(|v| v.product_id))
            .collect();
        let product_map: HashMap<i64, products::Model> = products::Entity::find()
            .filter(products::Column::Id.is_in(product_ids))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let rows = rows
            .into_iter()
            .filter_map(|(allocation, variant)| {
                let variant = variant?;
                let product = product_map.get(&variant.product_id)?.clone();
                Some((
                    product,
                    VariantResponse {
                        id: variant.id,
                        size: variant.size,
                        price: variant.price,
                        stock: allocation.allocated_stock,
                    },
                ))
            })
            .collect();

        Ok(group_by_product(rows))
    }

    /// 管理端：全部 drop，最新创建在前
    pub async fn list_drops(&self, now: DateTime<Utc>) -> AppResult<Vec<DropResponse>> {
        let list = drops::Entity::find()
            .order_by_desc(drops::Column::CreatedAt)
            .order_by_desc(drops::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(list.into_iter().map(|d| DropResponse::at(d, now)).collect())
    }

    pub async fn create_drop(&self, request: CreateDropRequest) -> AppResult<i64> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".to_string()));
        }
        if request.start_at >= request.end_at {
            return Err(AppError::ValidationError(
                "start_at must be before end_at".to_string(),
            ));
        }
        if request.key.is_empty() {
            return Err(AppError::ValidationError("Access key is required".to_string()));
        }

        let key_hash = hash_password(&request.key)?;
        let drop = drops::ActiveModel {
            title: Set(title.to_string()),
            description: Set(request.description),
            start_at: Set(request.start_at),
            end_at: Set(request.end_at),
            key_hash: Set(key_hash),
            is_active: Set(true),
            processed: Set(false),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "Created drop {} ({} .. {})",
            drop.id,
            drop.start_at,
            drop.end_at
        );
        Ok(drop.id)
    }

    /// 为 drop 分配规格配额 (存在则覆盖)，同时写入 stock_for_drop 镜像
    pub async fn allocate_variant(
        &self,
        drop_id: i64,
        request: AllocateVariantRequest,
    ) -> AppResult<AllocationResponse> {
        let txn = self.pool.begin().await?;

        let drop = drops::Entity::find_by_id(drop_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Drop not found".to_string()))?;
        if drop.processed {
            return Err(AppError::ValidationError(
                "Drop has already been processed".to_string(),
            ));
        }

        let variant = variants::Entity::find_by_id(request.variant_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Variant not found".to_string()))?;

        if request.allocated_stock < 0 || request.allocated_stock > variant.stock_total {
            return Err(AppError::ValidationError(format!(
                "Allocation must be between 0 and {}",
                variant.stock_total
            )));
        }

        let existing = allocations::Entity::find()
            .filter(allocations::Column::DropId.eq(drop_id))
            .filter(allocations::Column::ProductVariantId.eq(variant.id))
            .one(&txn)
            .await?;

        let allocation = match existing {
            Some(row) => {
                let mut am = row.into_active_model();
                am.allocated_stock = Set(request.allocated_stock);
                am.update(&txn).await?
            }
            None => {
                allocations::ActiveModel {
                    drop_id: Set(drop_id),
                    product_variant_id: Set(variant.id),
                    allocated_stock: Set(request.allocated_stock),
                    ..Default::default()
                }
                .insert(&txn)
                .await?
            }
        };

        let mut am = variant.into_active_model();
        am.stock_for_drop = Set(Some(request.allocated_stock));
        am.update(&txn).await?;

        txn.commit().await?;
        Ok(allocation.into())
    }

    /// 结束 drop：标记 processed 并清空其规格的 stock_for_drop
    pub async fn process_drop(&self, drop_id: i64, now: DateTime<Utc>) -> AppResult<DropResponse> {
        let txn = self.pool.begin().await?;

        let drop = drops::Entity::find_by_id(drop_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Drop not found".to_string()))?;
        if drop.processed {
            return Err(AppError::Conflict("Drop already processed".to_string()));
        }

        let variant_ids: Vec<i64> = allocations::Entity::find()
            .filter(allocations::Column::DropId.eq(drop_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|a| a.product_variant_id)
            .collect();

        if !variant_ids.is_empty() {
            variants::Entity::update_many()
                .col_expr(variants::Column::StockForDrop, Expr::value(Option::<i64>::None))
                .filter(variants::Column::Id.is_in(variant_ids))
                .exec(&txn)
                .await?;
        }

        let mut am = drop.into_active_model();
        am.processed = Set(true);
        am.is_active = Set(false);
        let drop = am.update(&txn).await?;

        txn.commit().await?;
        log::info!("Drop {drop_id} processed");
        Ok(DropResponse::at(drop, now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::test_support::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 18, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_active_drop_window() {
        let pool = test_pool().await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let service = DropService::new(pool);

        assert!(matches!(
            service.get_active_drop(t0() - Duration::seconds(1)).await,
            Err(AppError::NotFound(_))
        ));

        let active = service.get_active_drop(t0() + Duration::days(1)).await.unwrap();
        assert_eq!(active.id, drop.id);
        assert!(active.is_active);
        let json = serde_json::to_value(&active).unwrap();
        assert!(json.get("key_hash").is_none());

        assert!(matches!(
            service.get_active_drop(t0() + Duration::days(8)).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_overlapping_drops_prefer_latest_start() {
        let pool = test_pool().await;
        seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let later = seed_drop(&pool, t0() + Duration::days(2), t0() + Duration::days(5)).await;

        let active = DropService::new(pool)
            .get_active_drop(t0() + Duration::days(3))
            .await
            .unwrap();
        assert_eq!(active.id, later.id);
    }

    #[tokio::test]
    async fn test_processed_drop_is_not_active() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Hoodie", &[("M", 9000, 5)]).await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let service = DropService::new(pool.clone());
        service
            .allocate_variant(
                drop.id,
                AllocateVariantRequest {
                    variant_id: list[0].id,
                    allocated_stock: 3,
                },
            )
            .await
            .unwrap();

        let processed = service
            .process_drop(drop.id, t0() + Duration::days(1))
            .await
            .unwrap();
        assert!(processed.processed);
        assert!(!processed.is_active);

        assert!(matches!(
            service.get_active_drop(t0() + Duration::days(1)).await,
            Err(AppError::NotFound(_))
        ));
        let variant = variants::Entity::find_by_id(list[0].id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(variant.stock_for_drop, None);
        assert!(matches!(
            service.process_drop(drop.id, t0()).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_verify_key_is_exact() {
        let pool = test_pool().await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let service = DropService::new(pool);

        assert!(service.verify_key(drop.id, DROP_KEY).await.is_ok());
        assert!(matches!(
            service.verify_key(drop.id, "").await,
            Err(AppError::InvalidDropKey)
        ));
        assert!(matches!(
            service.verify_key(drop.id, &DROP_KEY.to_lowercase()).await,
            Err(AppError::InvalidDropKey)
        ));
        assert!(matches!(
            service.verify_key(drop.id, &format!("{DROP_KEY} ")).await,
            Err(AppError::InvalidDropKey)
        ));
        assert!(matches!(
            service.verify_key(drop.id + 1, DROP_KEY).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_malformed_key_hash_is_internal_error() {
        let pool = test_pool().await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let mut am = drop.clone().into_active_model();
        am.key_hash = Set("not-a-bcrypt-hash".to_string());
        am.update(&pool).await.unwrap();

        let result = DropService::new(pool).verify_key(drop.id, DROP_KEY).await;
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }

    #[tokio::test]
    async fn test_drop_products_use_allocation_as_stock() {
        let pool = test_pool().await;
        let (_, hoodie) = seed_product(&pool, "Hoodie", &[("M", 9000, 10), ("L", 9000, 10)]).await;
        let (_, tee) = seed_product(&pool, "Tee", &[("S", 3000, 4)]).await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        seed_allocation(&pool, drop.id, hoodie[1].id, 2).await;
        seed_allocation(&pool, drop.id, tee[0].id, 1).await;
        seed_allocation(&pool, drop.id, hoodie[0].id, 5).await;

        let service = DropService::new(pool);
        let listing = service.list_drop_products(drop.id).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].title, "Hoodie");
        assert_eq!(
            listing[0]
                .variants
                .iter()
                .map(|v| (v.size.as_str(), v.stock))
                .collect::<Vec<_>>(),
            vec![("L", 2), ("M", 5)]
        );
        assert_eq!(listing[1].title, "Tee");
        assert_eq!(listing[1].variants[0].stock, 1);

        assert!(matches!(
            service.list_drop_products(drop.id + 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_allocation_is_bounded_and_upserted() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Hoodie", &[("M", 9000, 4)]).await;
        let drop = seed_drop(&pool, t0(), t0() + Duration::days(7)).await;
        let service = DropService::new(pool.clone());

        let request = |allocated_stock| AllocateVariantRequest {
            variant_id: list[0].id,
            allocated_stock,
        };
        assert!(matches!(
            service.allocate_variant(drop.id, request(5)).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.allocate_variant(drop.id, request(-1)).await,
            Err(AppError::ValidationError(_))
        ));

        let first = service.allocate_variant(drop.id, request(4)).await.unwrap();
        let second = service.allocate_variant(drop.id, request(2)).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(second.allocated_stock, 2);

        let variant = variants::Entity::find_by_id(list[0].id)
            .one(&pool)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(variant.stock_for_drop, Some(2));
    }

    #[tokio::test]
    async fn test_create_drop_hashes_key() {
        let pool = test_pool().await;
        let service = DropService::new(pool.clone());

        let invalid = service
            .create_drop(CreateDropRequest {
                title: "Backwards".to_string(),
                description: None,
                start_at: t0(),
                end_at: t0(),
                key: "k".to_string(),
            })
            .await;
        assert!(matches!(invalid, Err(AppError::ValidationError(_))));

        let id = service
            .create_drop(CreateDropRequest {
                title: "Winter".to_string(),
                description: Some("cold".to_string()),
                start_at: t0(),
                end_at: t0() + Duration::days(1),
                key: "snow".to_string(),
            })
            .await
            .unwrap();

        let stored = drops::Entity::find_by_id(id).one(&pool).await.unwrap().unwrap();
        assert_ne!(stored.key_hash, "snow");
        assert!(service.verify_key(id, "snow").await.is_ok());

        let listed = service.list_drops(t0()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].is_active);
    }
}

use crate::entities::{
    drop_entity as drops, drop_product_entity as allocations, product_entity as products,
    product_variant_entity as variants,
};
use crate::error::{AppError, AppResult};
use crate::external::{CheckoutLineItem, CheckoutSessionRequest, PaymentGateway, StripeService};
use crate::models::*;
use crate::utils::validate_email;
use chrono::{DateTime, Utc};
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};

/// 库存校验 + 创建支付会话。
/// 这里不扣库存也不占用库存，超卖由结算时的条件扣减兜底。
#[derive(Clone)]
pub struct CheckoutService<G: PaymentGateway = StripeService> {
    pool: DatabaseConnection,
    gateway: G,
}

impl<G: PaymentGateway> CheckoutService<G> {
    pub fn new(pool: DatabaseConnection, gateway: G) -> Self {
        Self { pool, gateway }
    }

    pub async fn create_checkout(
        &self,
        request: CreateCheckoutRequest,
        now: DateTime<Utc>,
    ) -> AppResult<CheckoutResponse> {
        let email = validate_email(&request.email)?;
        let manifest = CheckoutManifest::new(request.items, request.drop_id)?;

        let txn = self.pool.begin().await?;
        let line_items = self.check_availability(&txn, &manifest, now).await?;
        txn.commit().await?;

        let session = self
            .gateway
            .create_checkout_session(CheckoutSessionRequest {
                customer_email: email,
                line_items,
                metadata: manifest.to_metadata()?,
            })
            .await?;

        log::info!(
            "Checkout session {} created ({} items, drop={:?})",
            session.id,
            manifest.items.len(),
            manifest.drop_id
        );
        Ok(CheckoutResponse {
            session_id: session.id,
            url: session.url,
        })
    }

    /// 逐项比对可售数量，并从库里解析名称与单价
    async fn check_availability(
        &self,
        txn: &DatabaseTransaction,
        manifest: &CheckoutManifest,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<CheckoutLineItem>> {
        if let Some(drop_id) = manifest.drop_id {
            let drop = drops::Entity::find_by_id(drop_id)
                .one(txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Drop not found".to_string()))?;
            if !drop.is_open_at(now) {
                return Err(AppError::ValidationError("Drop is not active".to_string()));
            }
        }

        let mut line_items = Vec::with_capacity(manifest.items.len());
        for item in &manifest.items {
            let (variant, product) = variants::Entity::find_by_id(item.variant_id)
                .find_also_related(products::Entity)
                .one(txn)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Variant {} not found", item.variant_id))
                })?;
            let product = product.ok_or_else(|| {
                AppError::NotFound(format!("Product for variant {} not found", variant.id))
            })?;

            let available = match manifest.drop_id {
                Some(drop_id) => allocations::Entity::find()
                    .filter(allocations::Column::DropId.eq(drop_id))
                    .filter(allocations::Column::ProductVariantId.eq(variant.id))
                    .one(txn)
                    .await?
                    .map(|a| a.allocated_stock)
                    .unwrap_or(0),
                None => variant.stock_total,
            };

            if available < item.quantity {
                log::warn!(
                    "Insufficient stock for variant {}: requested {}, available {}",
                    variant.id,
                    item.quantity,
                    available
                );
                return Err(AppError::InsufficientStock(format!(
                    "{} ({})",
                    product.title, variant.size
                )));
            }

            let images = product.image_list();
            line_items.push(CheckoutLineItem {
                name: format!("{} - {}", product.title, variant.size),
                description: product.description.clone().unwrap_or_default(),
                images,
                unit_amount: variant.price,
                quantity: item.quantity as u64,
            });
        }

        Ok(line_items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::services::test_support::*;
    use chrono::Duration;

    fn request(items: Vec<(i64, i64)>, drop_id: Option<i64>) -> CreateCheckoutRequest {
        CreateCheckoutRequest {
            items: items
                .into_iter()
                .map(|(variant_id, quantity)| ManifestItem {
                    variant_id,
                    quantity,
                })
                .collect(),
            email: " Buyer@Example.com ".to_string(),
            drop_id,
        }
    }

    #[tokio::test]
    async fn test_checkout_resolves_prices_server_side() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 5)]).await;
        let gateway = MockGateway::default();
        let service = CheckoutService::new(pool.clone(), gateway.clone());

        let response = service
            .create_checkout(request(vec![(list[0].id, 1), (list[0].id, 1)], None), Utc::now())
            .await
            .unwrap();
        assert_eq!(response.session_id, "cs_test_1");

        let sent = gateway.requests.lock().unwrap();
        assert_eq!(sent[0].customer_email, "buyer@example.com");
        assert_eq!(sent[0].line_items.len(), 1);
        assert_eq!(sent[0].line_items[0].unit_amount, 3000);
        assert_eq!(sent[0].line_items[0].quantity, 2);
        assert_eq!(sent[0].line_items[0].name, "Tee - M");
        let manifest = CheckoutManifest::from_metadata(&sent[0].metadata).unwrap();
        assert_eq!(manifest.items[0].quantity, 2);
        assert_eq!(manifest.drop_id, None);

        // 校验不扣库存
        assert_eq!(variant_stock(&pool, list[0].id).await, 5);
    }

    #[tokio::test]
    async fn test_checkout_rejects_over_stock_with_item_name() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 1)]).await;
        let gateway = MockGateway::default();
        let service = CheckoutService::new(pool, gateway.clone());

        let result = service
            .create_checkout(request(vec![(list[0].id, 2)], None), Utc::now())
            .await;
        match result {
            Err(AppError::InsufficientStock(item)) => assert_eq!(item, "Tee (M)"),
            other => panic!("unexpected: {other:?}"),
        }
        assert!(gateway.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drop_checkout_uses_allocation() {
        let pool = test_pool().await;
        let now = Utc::now();
        let (_, list) = seed_product(&pool, "Hoodie", &[("M", 9000, 10), ("L", 9000, 10)]).await;
        let drop = seed_drop(&pool, now - Duration::hours(1), now + Duration::days(1)).await;
        seed_allocation(&pool, drop.id, list[0].id, 2).await;
        let service = CheckoutService::new(pool, MockGateway::default());

        assert!(
            service
                .create_checkout(request(vec![(list[0].id, 2)], Some(drop.id)), now)
                .await
                .is_ok()
        );
        assert!(matches!(
            service
                .create_checkout(request(vec![(list[0].id, 3)], Some(drop.id)), now)
                .await,
            Err(AppError::InsufficientStock(_))
        ));
        // 未分配到 drop 的规格可售数量为 0
        assert!(matches!(
            service
                .create_checkout(request(vec![(list[1].id, 1)], Some(drop.id)), now)
                .await,
            Err(AppError::InsufficientStock(_))
        ));
        assert!(matches!(
            service
                .create_checkout(
                    request(vec![(list[0].id, 1)], Some(drop.id)),
                    now + Duration::days(2)
                )
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_checkout_validation() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 5)]).await;
        let service = CheckoutService::new(pool, MockGateway::default());

        let mut bad_email = request(vec![(list[0].id, 1)], None);
        bad_email.email = "not-an-email".to_string();
        assert!(matches!(
            service.create_checkout(bad_email, Utc::now()).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service.create_checkout(request(vec![], None), Utc::now()).await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service
                .create_checkout(request(vec![(list[0].id, 0)], None), Utc::now())
                .await,
            Err(AppError::ValidationError(_))
        ));
        assert!(matches!(
            service
                .create_checkout(request(vec![(9999, 1)], None), Utc::now())
                .await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service
                .create_checkout(
                    request(vec![(list[0].id, i64::MAX), (list[0].id, i64::MAX)], None),
                    Utc::now()
                )
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_gateway_failure_surfaces_as_external_error() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 5)]).await;
        let gateway = MockGateway {
            fail: true,
            ..Default::default()
        };
        let result = CheckoutService::new(pool, gateway)
            .create_checkout(request(vec![(list[0].id, 1)], None), Utc::now())
            .await;
        assert!(matches!(result, Err(AppError::ExternalApiError(_))));
    }
}

use crate::entities::{
    OrderStatus, drop_product_entity as allocations, order_entity as orders,
    product_variant_entity as variants,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, Set, TransactionTrait,
};

/// 一次已支付会话的结算输入
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    pub session_id: String,
    pub email: String,
    pub manifest: CheckoutManifest,
    /// Stripe 侧的实付金额，仅用于对账日志
    pub amount_total: Option<i64>,
}

#[derive(Debug)]
pub enum SettlementOutcome {
    Settled(OrderResponse),
    AlreadySettled(OrderResponse),
}

#[derive(Clone)]
pub struct SettlementService {
    pool: DatabaseConnection,
}

impl SettlementService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 幂等结算：同一个 session 只会落一张订单、只扣一次库存。
    ///
    /// 扣减在 savepoint 内进行，任一规格不足则整体回滚，库存保持原样；
    /// 订单以 failed 状态提交后返回 InsufficientStock，重投递直接得到 AlreadySettled。
    pub async fn settle(&self, request: SettlementRequest) -> AppResult<SettlementOutcome> {
        let txn = self.pool.begin().await?;

        let pending = orders::ActiveModel {
            user_email: Set(request.email.clone()),
            items: Set(serde_json::to_string(&request.manifest.items)?),
            total_amount: Set(0),
            stripe_session_id: Set(request.session_id.clone()),
            drop_id: Set(request.manifest.drop_id),
            status: Set(OrderStatus::Pending),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        let order = match pending.insert(&txn).await {
            Ok(order) => order,
            Err(e) if AppError::is_unique_violation(&e) => {
                txn.rollback().await?;
                let existing = orders::Entity::find()
                    .filter(orders::Column::StripeSessionId.eq(request.session_id.as_str()))
                    .one(&self.pool)
                    .await?
                    .ok_or_else(|| {
                        AppError::InternalError(format!(
                            "Order for session {} vanished",
                            request.session_id
                        ))
                    })?;
                log::info!("Session {} already settled", request.session_id);
                return Ok(SettlementOutcome::AlreadySettled(existing.into()));
            }
            Err(e) => return Err(e.into()),
        };

        let stock_txn = txn.begin().await?;
        let mut short_items: Vec<String> = Vec::new();
        let mut order_items = Vec::with_capacity(request.manifest.items.len());
        for item in &request.manifest.items {
            let Some(variant) = variants::Entity::find_by_id(item.variant_id)
                .one(&stock_txn)
                .await?
            else {
                log::error!(
                    "Settlement anomaly: session {} references missing variant {}",
                    request.session_id,
                    item.variant_id
                );
                short_items.push(format!("variant {}", item.variant_id));
                continue;
            };

            let fulfilled = match request.manifest.drop_id {
                Some(drop_id) => {
                    decrement_allocation(&stock_txn, drop_id, &variant, item.quantity).await?
                }
                None => decrement_stock_total(&stock_txn, &variant, item.quantity).await?,
            };
            if !fulfilled {
                log::error!(
                    "Settlement anomaly: session {} paid for {} units of variant {} beyond stock",
                    request.session_id,
                    item.quantity,
                    variant.id
                );
                short_items.push(format!("variant {} ({})", variant.id, variant.size));
            }

            order_items.push(OrderItem {
                variant_id: variant.id,
                quantity: item.quantity,
                price: variant.price,
            });
        }

        if short_items.is_empty() {
            stock_txn.commit().await?;
        } else {
            stock_txn.rollback().await?;
        }

        let total = order_items
            .iter()
            .try_fold(0i64, |acc, i| {
                i.price
                    .checked_mul(i.quantity)
                    .and_then(|line| acc.checked_add(line))
            })
            .ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Order total overflows for session {}",
                    request.session_id
                ))
            })?;
        if let Some(paid) = request.amount_total
            && paid != total
        {
            log::warn!(
                "Session {} paid {} but resolved total is {}",
                request.session_id,
                paid,
                total
            );
        }

        let status = if short_items.is_empty() {
            OrderStatus::Completed
        } else {
            OrderStatus::Failed
        };
        let mut am = order.into_active_model();
        am.items = Set(serde_json::to_string(&order_items)?);
        am.total_amount = Set(total);
        am.status = Set(status);
        let order = am.update(&txn).await?;

        txn.commit().await?;

        if !short_items.is_empty() {
            return Err(AppError::InsufficientStock(short_items.join(", ")));
        }

        log::info!(
            "Settled session {} as order {} (total {})",
            request.session_id,
            order.id,
            total
        );
        Ok(SettlementOutcome::Settled(order.into()))
    }
}

/// 条件扣减 stock_total，库存不足时不改动并返回 false
async fn decrement_stock_total(
    txn: &DatabaseTransaction,
    variant: &variants::Model,
    quantity: i64,
) -> AppResult<bool> {
    let result = variants::Entity::update_many()
        .col_expr(
            variants::Column::StockTotal,
            Expr::col(variants::Column::StockTotal).sub(quantity),
        )
        .filter(variants::Column::Id.eq(variant.id))
        .filter(variants::Column::StockTotal.gte(quantity))
        .exec(txn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// drop 场景以配额为准；总库存同步扣减，stock_for_drop 跟随配额
async fn decrement_allocation(
    txn: &DatabaseTransaction,
    drop_id: i64,
    variant: &variants::Model,
    quantity: i64,
) -> AppResult<bool> {
    let result = allocations::Entity::update_many()
        .col_expr(
            allocations::Column::AllocatedStock,
            Expr::col(allocations::Column::AllocatedStock).sub(quantity),
        )
        .filter(allocations::Column::DropId.eq(drop_id))
        .filter(allocations::Column::ProductVariantId.eq(variant.id))
        .filter(allocations::Column::AllocatedStock.gte(quantity))
        .exec(txn)
        .await?;
    if result.rows_affected == 0 {
        return Ok(false);
    }

    // 配额已售出，总库存被常规销售吃掉时只能清零
    if !decrement_stock_total(txn, variant, quantity).await? {
        log::warn!(
            "Variant {} total stock fell below drop {} sales, clamped to 0",
            variant.id,
            drop_id
        );
        variants::Entity::update_many()
            .col_expr(variants::Column::StockTotal, Expr::value(0i64))
            .filter(variants::Column::Id.eq(variant.id))
            .exec(txn)
            .await?;
    }

    let remaining = allocations::Entity::find()
        .filter(allocations::Column::DropId.eq(drop_id))
        .filter(allocations::Column::ProductVariantId.eq(variant.id))
        .one(txn)
        .await?
        .map(|a| a.allocated_stock)
        .unwrap_or(0);
    variants::Entity::update_many()
        .col_expr(variants::Column::StockForDrop, Expr::value(Some(remaining)))
        .filter(variants::Column::Id.eq(variant.id))
        .exec(txn)
        .await?;

    Ok(true)
}

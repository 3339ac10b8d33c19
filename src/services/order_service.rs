use crate::entities::order_entity as orders;
use crate::error::AppResult;
use crate::models::*;
use crate::utils::{PaginatedResponse, PaginationParams};
use sea_orm::{DatabaseConnection, EntityTrait, PaginatorTrait, QueryOrder};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 管理端订单列表，最新在前
    pub async fn list_orders(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let paginator = orders::Entity::find()
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .paginate(&self.pool, params.get_per_page());

        let total = paginator.num_items().await?;
        let list = paginator.fetch_page(params.get_page() - 1).await?;

        Ok(PaginatedResponse::new(
            list.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }
}

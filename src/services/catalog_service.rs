use crate::entities::{
    drop_product_entity as allocations, product_entity as products,
    product_variant_entity as variants,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};

const DEFAULT_CATEGORY: &str = "streetwear";

/// 把 (商品, 规格) 行按商品分组，保持商品首次出现的顺序
pub fn group_by_product(rows: Vec<(products::Model, VariantResponse)>) -> Vec<ProductResponse> {
    let mut grouped: Vec<ProductResponse> = Vec::new();
    for (product, variant) in rows {
        match grouped.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => existing.variants.push(variant),
            None => {
                let mut entry = ProductResponse::from_model(&product);
                entry.variants.push(variant);
                grouped.push(entry);
            }
        }
    }
    grouped
}

#[derive(Clone)]
pub struct CatalogService {
    pool: DatabaseConnection,
}

impl CatalogService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 常规商店：只列出仍有库存的规格
    pub async fn list_shop_products(&self) -> AppResult<Vec<ProductResponse>> {
        let rows = variants::Entity::find()
            .filter(variants::Column::StockTotal.gt(0))
            .order_by_asc(variants::Column::ProductId)
            .order_by_asc(variants::Column::Id)
            .find_also_related(products::Entity)
            .all(&self.pool)
            .await?;

        let rows = rows
            .into_iter()
            .filter_map(|(variant, product)| {
                let product = product?;
                Some((
                    product,
                    VariantResponse {
                        id: variant.id,
                        size: variant.size,
                        price: variant.price,
                        stock: variant.stock_total,
                    },
                ))
            })
            .collect();

        Ok(group_by_product(rows))
    }

    pub async fn list_products(&self) -> AppResult<Vec<AdminProductResponse>> {
        let list = products::Entity::find()
            .order_by_asc(products::Column::Id)
            .find_with_related(variants::Entity)
            .all(&self.pool)
            .await?;

        Ok(list
            .into_iter()
            .map(|(product, variants)| AdminProductResponse::new(product, variants))
            .collect())
    }

    pub async fn create_product(&self, request: CreateProductRequest) -> AppResult<i64> {
        let title = request.title.trim();
        if title.is_empty() {
            return Err(AppError::ValidationError("Title is required".to_string()));
        }

        let category = request
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let product = products::ActiveModel {
            title: Set(title.to_string()),
            description: Set(request.description),
            images: Set(serde_json::to_string(&request.images)?),
            category: Set(category.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created product {} ({})", product.id, product.title);
        Ok(product.id)
    }

    pub async fn update_product(
        &self,
        product_id: i64,
        request: UpdateProductRequest,
    ) -> AppResult<AdminProductResponse> {
        let product = products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let mut am = product.into_active_model();
        if let Some(title) = request.title {
            let title = title.trim();
            if title.is_empty() {
                return Err(AppError::ValidationError("Title is required".to_string()));
            }
            am.title = Set(title.to_string());
        }
        if let Some(description) = request.description {
            am.description = Set(Some(description));
        }
        if let Some(images) = request.images {
            am.images = Set(serde_json::to_string(&images)?);
        }
        if let Some(category) = request.category {
            am.category = Set(category);
        }
        let updated = am.update(&self.pool).await?;

        let variant_list = variants::Entity::find()
            .filter(variants::Column::ProductId.eq(product_id))
            .order_by_asc(variants::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(AdminProductResponse::new(updated, variant_list))
    }

    /// 删除商品及其规格、drop 配额
    pub async fn delete_product(&self, product_id: i64) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        let variant_ids: Vec<i64> = variants::Entity::find()
            .filter(variants::Column::ProductId.eq(product_id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|v| v.id)
            .collect();

        if !variant_ids.is_empty() {
            allocations::Entity::delete_many()
                .filter(allocations::Column::ProductVariantId.is_in(variant_ids))
                .exec(&txn)
                .await?;
            variants::Entity::delete_many()
                .filter(variants::Column::ProductId.eq(product_id))
                .exec(&txn)
                .await?;
        }

        let result = products::Entity::delete_by_id(product_id).exec(&txn).await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Product not found".to_string()));
        }

        txn.commit().await?;
        log::info!("Deleted product {product_id}");
        Ok(())
    }

    pub async fn create_variant(
        &self,
        product_id: i64,
        request: CreateVariantRequest,
    ) -> AppResult<AdminVariantResponse> {
        let size = request.size.trim();
        if size.is_empty() {
            return Err(AppError::ValidationError("Size is required".to_string()));
        }
        validate_price(request.price)?;
        if request.stock_total < 0 {
            return Err(AppError::ValidationError(
                "Stock cannot be negative".to_string(),
            ));
        }

        products::Entity::find_by_id(product_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_string()))?;

        let variant = variants::ActiveModel {
            product_id: Set(product_id),
            size: Set(size.to_string()),
            price: Set(request.price),
            stock_total: Set(request.stock_total),
            stock_for_drop: Set(None),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(variant.into())
    }

    pub async fn update_variant(
        &self,
        variant_id: i64,
        request: UpdateVariantRequest,
    ) -> AppResult<AdminVariantResponse> {
        let variant = variants::Entity::find_by_id(variant_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Variant not found".to_string()))?;

        let mut am = variant.into_active_model();
        if let Some(size) = request.size {
            let size = size.trim();
            if size.is_empty() {
                return Err(AppError::ValidationError("Size is required".to_string()));
            }
            am.size = Set(size.to_string());
        }
        if let Some(price) = request.price {
            validate_price(price)?;
            am.price = Set(price);
        }

        Ok(am.update(&self.pool).await?.into())
    }

    /// 管理员补货：只增不减
    pub async fn restock_variant(
        &self,
        variant_id: i64,
        quantity: i64,
    ) -> AppResult<AdminVariantResponse> {
        if quantity <= 0 {
            return Err(AppError::ValidationError(
                "Restock quantity must be positive".to_string(),
            ));
        }

        let result = variants::Entity::update_many()
            .col_expr(
                variants::Column::StockTotal,
                Expr::col(variants::Column::StockTotal).add(quantity),
            )
            .filter(variants::Column::Id.eq(variant_id))
            .exec(&self.pool)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Variant not found".to_string()));
        }

        let variant = variants::Entity::find_by_id(variant_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Variant not found".to_string()))?;
        log::info!(
            "Restocked variant {variant_id} by {quantity}, stock_total={}",
            variant.stock_total
        );
        Ok(variant.into())
    }
}

fn validate_price(price: i64) -> AppResult<()> {
    if price < 0 {
        return Err(AppError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(())
}

use crate::external::StripeService;
use crate::models::*;
use crate::services::CatalogService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/api/shop",
    tag = "shop",
    responses(
        (status = 200, description = "常规商店中有货的商品", body = [ProductResponse])
    )
)]
pub async fn get_shop_products(catalog_service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog_service.list_shop_products().await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/config",
    tag = "shop",
    responses(
        (status = 200, description = "前端需要的 Stripe 公钥", body = PublicConfigResponse)
    )
)]
pub async fn get_public_config(stripe_service: web::Data<StripeService>) -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(ApiResponse::success(PublicConfigResponse {
        publishable_key: stripe_service.publishable_key().to_string(),
    })))
}

pub fn shop_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/shop", web::get().to(get_shop_products))
        .route("/config", web::get().to(get_public_config));
}

use crate::models::*;
use crate::services::DropService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    get,
    path = "/api/drops/active",
    tag = "drops",
    responses(
        (status = 200, description = "当前开放的 drop", body = DropResponse),
        (status = 404, description = "没有开放中的 drop")
    )
)]
pub async fn get_active_drop(drop_service: web::Data<DropService>) -> Result<HttpResponse> {
    match drop_service.get_active_drop(Utc::now()).await {
        Ok(drop) => Ok(HttpResponse::Ok().json(ApiResponse::success(drop))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/drops/{id}/unlock",
    tag = "drops",
    params(("id" = i64, Path, description = "Drop ID")),
    request_body = UnlockDropRequest,
    responses(
        (status = 200, description = "密钥正确", body = UnlockDropResponse),
        (status = 401, description = "密钥错误"),
        (status = 404, description = "Drop 不存在")
    )
)]
pub async fn unlock_drop(
    drop_service: web::Data<DropService>,
    path: web::Path<i64>,
    request: web::Json<UnlockDropRequest>,
) -> Result<HttpResponse> {
    match drop_service.verify_key(path.into_inner(), &request.key).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            UnlockDropResponse { unlocked: true },
            "Drop unlocked successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/drops/{id}/products",
    tag = "drops",
    params(("id" = i64, Path, description = "Drop ID")),
    responses(
        (status = 200, description = "drop 商品，库存为配额", body = [ProductResponse]),
        (status = 404, description = "Drop 不存在")
    )
)]
pub async fn get_drop_products(
    drop_service: web::Data<DropService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match drop_service.list_drop_products(path.into_inner()).await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn drop_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/drops")
            .route("/active", web::get().to(get_active_drop))
            .route("/{id}/unlock", web::post().to(unlock_drop))
            .route("/{id}/products", web::get().to(get_drop_products)),
    );
}

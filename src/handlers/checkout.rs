use crate::models::*;
use crate::services::CheckoutService;
use actix_web::{HttpResponse, ResponseError, Result, web};
use chrono::Utc;

#[utoipa::path(
    post,
    path = "/api/checkout",
    tag = "checkout",
    request_body = CreateCheckoutRequest,
    responses(
        (status = 200, description = "Stripe Checkout 会话已创建", body = CheckoutResponse),
        (status = 400, description = "参数错误或库存不足"),
        (status = 404, description = "规格或 drop 不存在"),
        (status = 502, description = "支付服务不可用")
    )
)]
pub async fn create_checkout(
    checkout_service: web::Data<CheckoutService>,
    request: web::Json<CreateCheckoutRequest>,
) -> Result<HttpResponse> {
    match checkout_service
        .create_checkout(request.into_inner(), Utc::now())
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn checkout_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/checkout", web::post().to(create_checkout));
}

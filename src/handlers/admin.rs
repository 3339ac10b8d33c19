use crate::middlewares::current_claims;
use crate::models::*;
use crate::services::{CatalogService, DropService, NewsletterService, OrderService};
use crate::utils::{PaginatedOrderResponse, PaginationParams};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;

/// 审计日志里的操作人
fn operator(req: &HttpRequest) -> String {
    current_claims(req)
        .map(|c| c.email)
        .unwrap_or_else(|| "unknown".to_string())
}

// ---- 商品 / 规格 ----

#[utoipa::path(
    get,
    path = "/api/admin/products",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "全部商品及规格", body = [AdminProductResponse]),
        (status = 401, description = "未授权"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_products(catalog_service: web::Data<CatalogService>) -> Result<HttpResponse> {
    match catalog_service.list_products().await {
        Ok(products) => Ok(HttpResponse::Ok().json(ApiResponse::success(products))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/products",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateProductRequest,
    responses(
        (status = 200, description = "商品已创建", body = CreatedResponse),
        (status = 400, description = "请求参数错误")
    )
)]
pub async fn create_product(
    catalog_service: web::Data<CatalogService>,
    request: web::Json<CreateProductRequest>,
) -> Result<HttpResponse> {
    match catalog_service.create_product(request.into_inner()).await {
        Ok(id) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            CreatedResponse { id },
            "Product created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/products/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "商品 ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "商品已更新", body = AdminProductResponse),
        (status = 404, description = "商品不存在")
    )
)]
pub async fn update_product(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<UpdateProductRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .update_product(path.into_inner(), request.into_inner())
        .await
    {
        Ok(product) => Ok(HttpResponse::Ok().json(ApiResponse::success(product))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/admin/products/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "商品 ID")),
    responses(
        (status = 200, description = "商品已删除"),
        (status = 404, description = "商品不存在")
    )
)]
pub async fn delete_product(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match catalog_service.delete_product(path.into_inner()).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Product deleted"))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/products/{id}/variants",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "商品 ID")),
    request_body = CreateVariantRequest,
    responses(
        (status = 200, description = "规格已创建", body = AdminVariantResponse),
        (status = 404, description = "商品不存在")
    )
)]
pub async fn create_variant(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<CreateVariantRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .create_variant(path.into_inner(), request.into_inner())
        .await
    {
        Ok(variant) => Ok(HttpResponse::Ok().json(ApiResponse::success(variant))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    put,
    path = "/api/admin/variants/{id}",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "规格 ID")),
    request_body = UpdateVariantRequest,
    responses(
        (status = 200, description = "规格已更新", body = AdminVariantResponse),
        (status = 404, description = "规格不存在")
    )
)]
pub async fn update_variant(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<UpdateVariantRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .update_variant(path.into_inner(), request.into_inner())
        .await
    {
        Ok(variant) => Ok(HttpResponse::Ok().json(ApiResponse::success(variant))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/variants/{id}/restock",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "规格 ID")),
    request_body = RestockRequest,
    responses(
        (status = 200, description = "补货成功", body = AdminVariantResponse),
        (status = 400, description = "数量必须为正"),
        (status = 404, description = "规格不存在")
    )
)]
pub async fn restock_variant(
    catalog_service: web::Data<CatalogService>,
    path: web::Path<i64>,
    request: web::Json<RestockRequest>,
) -> Result<HttpResponse> {
    match catalog_service
        .restock_variant(path.into_inner(), request.quantity)
        .await
    {
        Ok(variant) => Ok(HttpResponse::Ok().json(ApiResponse::success(variant))),
        Err(e) => Ok(e.error_response()),
    }
}

// ---- Drop ----

#[utoipa::path(
    get,
    path = "/api/admin/drops",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "全部 drop，最新在前", body = [DropResponse])
    )
)]
pub async fn list_drops(drop_service: web::Data<DropService>) -> Result<HttpResponse> {
    match drop_service.list_drops(Utc::now()).await {
        Ok(drops) => Ok(HttpResponse::Ok().json(ApiResponse::success(drops))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/drops",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = CreateDropRequest,
    responses(
        (status = 200, description = "Drop 已创建", body = CreatedResponse),
        (status = 400, description = "时间窗口或密钥无效")
    )
)]
pub async fn create_drop(
    drop_service: web::Data<DropService>,
    request: web::Json<CreateDropRequest>,
) -> Result<HttpResponse> {
    match drop_service.create_drop(request.into_inner()).await {
        Ok(id) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            CreatedResponse { id },
            "Drop created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/drops/{id}/allocations",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Drop ID")),
    request_body = AllocateVariantRequest,
    responses(
        (status = 200, description = "配额已设置", body = AllocationResponse),
        (status = 400, description = "配额超出总库存"),
        (status = 404, description = "Drop 或规格不存在")
    )
)]
pub async fn allocate_variant(
    drop_service: web::Data<DropService>,
    path: web::Path<i64>,
    request: web::Json<AllocateVariantRequest>,
) -> Result<HttpResponse> {
    match drop_service
        .allocate_variant(path.into_inner(), request.into_inner())
        .await
    {
        Ok(allocation) => Ok(HttpResponse::Ok().json(ApiResponse::success(allocation))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/drops/{id}/process",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(("id" = i64, Path, description = "Drop ID")),
    responses(
        (status = 200, description = "Drop 已结束", body = DropResponse),
        (status = 404, description = "Drop 不存在"),
        (status = 409, description = "已处理过")
    )
)]
pub async fn process_drop(
    req: HttpRequest,
    drop_service: web::Data<DropService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let drop_id = path.into_inner();
    log::info!("Drop {} processing requested by {}", drop_id, operator(&req));
    match drop_service.process_drop(drop_id, Utc::now()).await {
        Ok(drop) => Ok(HttpResponse::Ok().json(ApiResponse::success(drop))),
        Err(e) => Ok(e.error_response()),
    }
}

// ---- 订单 / 邮件 ----

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    tag = "admin",
    security(("bearer_auth" = [])),
    params(PaginationParams),
    responses(
        (status = 200, description = "订单分页列表", body = PaginatedOrderResponse)
    )
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match order_service.list_orders(&query.into_inner()).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/admin/newsletter/subscribers",
    tag = "admin",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "订阅者列表，最新在前", body = [SubscriberResponse])
    )
)]
pub async fn list_subscribers(
    newsletter_service: web::Data<NewsletterService>,
) -> Result<HttpResponse> {
    match newsletter_service.list_subscribers().await {
        Ok(list) => Ok(HttpResponse::Ok().json(ApiResponse::success(list))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/admin/newsletter/send",
    tag = "admin",
    security(("bearer_auth" = [])),
    request_body = SendNewsletterRequest,
    responses(
        (status = 200, description = "已提交给 Brevo", body = SendNewsletterResponse),
        (status = 400, description = "没有订阅者或内容为空"),
        (status = 502, description = "邮件服务失败")
    )
)]
pub async fn send_newsletter(
    req: HttpRequest,
    newsletter_service: web::Data<NewsletterService>,
    request: web::Json<SendNewsletterRequest>,
) -> Result<HttpResponse> {
    log::info!("Newsletter broadcast requested by {}", operator(&req));
    match newsletter_service.send_newsletter(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
            response,
            "Newsletter sent",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/products", web::get().to(list_products))
            .route("/products", web::post().to(create_product))
            .route("/products/{id}", web::put().to(update_product))
            .route("/products/{id}", web::delete().to(delete_product))
            .route("/products/{id}/variants", web::post().to(create_variant))
            .route("/variants/{id}", web::put().to(update_variant))
            .route("/variants/{id}/restock", web::post().to(restock_variant))
            .route("/drops", web::get().to(list_drops))
            .route("/drops", web::post().to(create_drop))
            .route("/drops/{id}/allocations", web::post().to(allocate_variant))
            .route("/drops/{id}/process", web::post().to(process_drop))
            .route("/orders", web::get().to(list_orders))
            .route("/newsletter/subscribers", web::get().to(list_subscribers))
            .route("/newsletter/send", web::post().to(send_newsletter)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_pool;
    use crate::middlewares::AuthMiddleware;
    use crate::utils::{JwtService, ROLE_ADMIN};
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn test_admin_catalog_flow_behind_middleware() {
        let pool = test_pool().await;
        let jwt = JwtService::new("test_secret", 3600);
        let token = jwt.generate_token(1, "admin@freak.local", ROLE_ADMIN).unwrap();
        let auth = ("Authorization", format!("Bearer {token}"));

        let app = test::init_service(
            App::new()
                .wrap(AuthMiddleware::new(jwt))
                .app_data(web::Data::new(CatalogService::new(pool.clone())))
                .app_data(web::Data::new(DropService::new(pool.clone())))
                .app_data(web::Data::new(OrderService::new(pool)))
                .service(web::scope("/api").configure(admin_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/admin/products")
            .insert_header(auth.clone())
            .set_json(json!({ "title": "Hoodie", "images": ["/images/hoodie.jpg"] }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let product_id = body["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/products/{product_id}/variants"))
            .insert_header(auth.clone())
            .set_json(json!({ "size": "M", "price": 9000, "stockTotal": 5 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let variant_id = body["data"]["id"].as_i64().unwrap();
        assert_eq!(body["data"]["stock_total"], 5);

        let req = test::TestRequest::post()
            .uri("/api/admin/drops")
            .insert_header(auth.clone())
            .set_json(json!({
                "title": "Night Drop",
                "startAt": "2026-10-01T18:00:00Z",
                "endAt": "2026-10-08T18:00:00Z",
                "key": "FREAK"
            }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let drop_id = body["data"]["id"].as_i64().unwrap();

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/drops/{drop_id}/allocations"))
            .insert_header(auth.clone())
            .set_json(json!({ "variantId": variant_id, "allocatedStock": 6 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/drops/{drop_id}/allocations"))
            .insert_header(auth.clone())
            .set_json(json!({ "variantId": variant_id, "allocatedStock": 3 }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["allocated_stock"], 3);

        let req = test::TestRequest::get()
            .uri("/api/admin/drops")
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert!(body["data"][0].get("key_hash").is_none());

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/drops/{drop_id}/process"))
            .insert_header(auth.clone())
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["processed"], true);

        let req = test::TestRequest::post()
            .uri(&format!("/api/admin/drops/{drop_id}/process"))
            .insert_header(auth.clone())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::get()
            .uri("/api/admin/orders?page=1&per_page=10")
            .insert_header(auth)
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["pagination"]["total"], 0);

        let req = test::TestRequest::get().uri("/api/admin/products").to_request();
        let err = test::try_call_service(&app, req).await.unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_operator_reads_claims_from_middleware() {
        let jwt = JwtService::new("test_secret", 3600);
        let token = jwt.generate_token(7, "ops@freak.local", ROLE_ADMIN).unwrap();
        let app = test::init_service(
            App::new().wrap(AuthMiddleware::new(jwt)).route(
                "/api/admin/whoami",
                web::get().to(|req: HttpRequest| async move { operator(&req) }),
            ),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/admin/whoami")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body = test::call_and_read_body(&app, req).await;
        assert_eq!(body, "ops@freak.local");

        let bare = test::TestRequest::default().to_http_request();
        assert_eq!(operator(&bare), "unknown");
    }
}

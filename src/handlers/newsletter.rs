use crate::models::*;
use crate::services::NewsletterService;
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/api/newsletter",
    tag = "newsletter",
    request_body = SubscribeRequest,
    responses(
        (status = 200, description = "订阅成功"),
        (status = 400, description = "邮箱格式错误"),
        (status = 409, description = "已订阅")
    )
)]
pub async fn subscribe(
    newsletter_service: web::Data<NewsletterService>,
    request: web::Json<SubscribeRequest>,
) -> Result<HttpResponse> {
    match newsletter_service.subscribe(&request.email).await {
        Ok(()) => Ok(HttpResponse::Ok().json(ApiResponse::message("Subscribed successfully"))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn newsletter_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/newsletter", web::post().to(subscribe));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrevoConfig;
    use crate::database::test_pool;
    use crate::external::BrevoService;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use serde_json::{Value, json};
    use std::time::Duration;

    #[actix_web::test]
    async fn test_subscribe_twice_conflicts() {
        let pool = test_pool().await;
        let brevo = BrevoService::new(BrevoConfig::default(), Duration::from_secs(1)).unwrap();
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(NewsletterService::new(pool, brevo)))
                .service(web::scope("/api").configure(newsletter_config)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(json!({ "email": "Fan@Example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(json!({ "email": "fan@example.com" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "CONFLICT");

        let req = test::TestRequest::post()
            .uri("/api/newsletter")
            .set_json(json!({ "email": "nope" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

use crate::error::{AppError, AppResult};
use crate::external::stripe::{
    CheckoutSessionObject, EVENT_CHECKOUT_ASYNC_SUCCEEDED, EVENT_CHECKOUT_COMPLETED,
    StripeService, WebhookEvent,
};
use crate::models::CheckoutManifest;
use crate::services::{SettlementOutcome, SettlementRequest, SettlementService};
use crate::utils::normalize_email;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use chrono::Utc;
use log::{error, info, warn};
use serde_json::json;

/// Stripe webhook 处理器
///
/// 只有签名校验失败返回 4xx。已验证事件里无法修复的问题（坏的 metadata、
/// 库存不足）记录日志后确认收到，存储故障返回 500 让 Stripe 重投。
pub async fn stripe_webhook(
    req: HttpRequest,
    body: web::Bytes,
    stripe_service: web::Data<StripeService>,
    settlement_service: web::Data<SettlementService>,
) -> Result<HttpResponse> {
    let Some(signature) = req
        .headers()
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        warn!("Missing Stripe-Signature header");
        return Ok(AppError::ValidationError("Missing Stripe-Signature header".to_string())
            .error_response());
    };

    let event = match stripe_service.verify_webhook_signature(&body, signature, Utc::now().timestamp())
    {
        Ok(event) => event,
        Err(e) => {
            error!("Webhook signature verification failed: {e}");
            return Ok(e.error_response());
        }
    };

    info!("Received Stripe webhook event: {} ({})", event.event_type, event.id);

    match handle_event(event, &settlement_service).await {
        Ok(()) => Ok(HttpResponse::Ok().json(json!({ "received": true }))),
        Err(e @ (AppError::DatabaseError(_) | AppError::InternalError(_))) => {
            error!("Failed to process webhook event: {e}");
            Ok(e.error_response())
        }
        Err(e) => {
            error!("Webhook event acknowledged with error: {e}");
            Ok(HttpResponse::Ok().json(json!({
                "received": true,
                "error": e.to_string()
            })))
        }
    }
}

async fn handle_event(event: WebhookEvent, settlement_service: &SettlementService) -> AppResult<()> {
    if event.event_type != EVENT_CHECKOUT_COMPLETED
        && event.event_type != EVENT_CHECKOUT_ASYNC_SUCCEEDED
    {
        info!("Ignoring event type {}", event.event_type);
        return Ok(());
    }

    let session: CheckoutSessionObject = serde_json::from_value(event.data.object)?;
    if !session.is_paid() {
        // 延迟支付成功后会再收到 async_payment_succeeded
        info!("Session {} completed but not paid yet", session.id);
        return Ok(());
    }

    let manifest = CheckoutManifest::from_metadata(&session.metadata)?;
    let email = session.purchaser_email().map(normalize_email).unwrap_or_default();

    match settlement_service
        .settle(SettlementRequest {
            session_id: session.id.clone(),
            email,
            manifest,
            amount_total: session.amount_total,
        })
        .await?
    {
        SettlementOutcome::Settled(order) => {
            info!("Order {} created for session {}", order.id, session.id)
        }
        SettlementOutcome::AlreadySettled(order) => {
            info!("Duplicate delivery for session {} (order {})", session.id, order.id)
        }
    }
    Ok(())
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/webhook", web::post().to(stripe_webhook));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StripeConfig;
    use crate::database::test_pool;
    use crate::entities::order_entity as orders;
    use crate::services::test_support::*;
    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use hmac::{Hmac, Mac};
    use sea_orm::{EntityTrait, PaginatorTrait};
    use sha2::Sha256;
    use std::time::Duration;

    const SECRET: &str = "whsec_test";

    fn stripe() -> StripeService {
        StripeService::new(
            StripeConfig {
                secret_key: "sk_test_x".to_string(),
                publishable_key: "pk_test_x".to_string(),
                webhook_secret: SECRET.to_string(),
                currency: "usd".to_string(),
                success_url: "http://localhost/success.html".to_string(),
                cancel_url: "http://localhost/cancel.html".to_string(),
            },
            Duration::from_secs(1),
        )
    }

    fn sign(payload: &str) -> String {
        let t = Utc::now().timestamp();
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{t}.{payload}").as_bytes());
        format!("t={t},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    fn completed_event(session_id: &str, variant_id: i64) -> String {
        json!({
            "id": "evt_1",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": session_id,
                "customer_email": "Buyer@Example.com",
                "amount_total": 3000,
                "payment_status": "paid",
                "metadata": {
                    "items": format!(r#"[{{"variant_id":{variant_id},"quantity":1}}]"#),
                    "drop_id": ""
                }
            }}
        })
        .to_string()
    }

    #[actix_web::test]
    async fn test_webhook_settles_once() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 2)]).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(stripe()))
                .app_data(web::Data::new(SettlementService::new(pool.clone())))
                .configure(webhook_config),
        )
        .await;

        let payload = completed_event("cs_hook", list[0].id);
        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/webhook")
                .insert_header(("stripe-signature", sign(&payload)))
                .set_payload(payload.clone())
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);
        }

        assert_eq!(variant_stock(&pool, list[0].id).await, 1);
        let all = orders::Entity::find().all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].user_email, "buyer@example.com");
    }

    #[actix_web::test]
    async fn test_bad_signature_is_rejected() {
        let pool = test_pool().await;
        let (_, list) = seed_product(&pool, "Tee", &[("M", 3000, 2)]).await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(stripe()))
                .app_data(web::Data::new(SettlementService::new(pool.clone())))
                .configure(webhook_config),
        )
        .await;

        let payload = completed_event("cs_forged", list[0].id);
        let req = test::TestRequest::post()
            .uri("/webhook")
            .insert_header(("stripe-signature", "t=1,v1=deadbeef"))
            .set_payload(payload.clone())
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        let req = test::TestRequest::post()
            .uri("/webhook")
            .set_payload(payload)
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );

        assert_eq!(variant_stock(&pool, list[0].id).await, 2);
        assert_eq!(orders::Entity::find().count(&pool).await.unwrap(), 0);
    }

    #[actix_web::test]
    async fn test_malformed_manifest_is_acknowledged() {
        let pool = test_pool().await;
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(stripe()))
                .app_data(web::Data::new(SettlementService::new(pool.clone())))
                .configure(webhook_config),
        )
        .await;

        let payload = json!({
            "id": "evt_2",
            "type": "checkout.session.completed",
            "data": { "object": {
                "id": "cs_bad",
                "payment_status": "paid",
                "metadata": { "items": "not json" }
            }}
        })
        .to_string();
        let req = test::TestRequest::post()
            .uri("/webhook")
            .insert_header(("stripe-signature", sign(&payload)))
            .set_payload(payload)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert_eq!(orders::Entity::find().count(&pool).await.unwrap(), 0);
    }
}

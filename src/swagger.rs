use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::OrderStatus;
use crate::handlers;
use crate::models::*;
use crate::utils::{PaginatedOrderResponse, PaginationInfo, PaginationParams};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::shop::get_shop_products,
        handlers::shop::get_public_config,
        handlers::drop::get_active_drop,
        handlers::drop::unlock_drop,
        handlers::drop::get_drop_products,
        handlers::checkout::create_checkout,
        handlers::newsletter::subscribe,
        handlers::admin::list_products,
        handlers::admin::create_product,
        handlers::admin::update_product,
        handlers::admin::delete_product,
        handlers::admin::create_variant,
        handlers::admin::update_variant,
        handlers::admin::restock_variant,
        handlers::admin::list_drops,
        handlers::admin::create_drop,
        handlers::admin::allocate_variant,
        handlers::admin::process_drop,
        handlers::admin::list_orders,
        handlers::admin::list_subscribers,
        handlers::admin::send_newsletter,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            UserInfo,
            PublicConfigResponse,
            CreatedResponse,
            VariantResponse,
            ProductResponse,
            AdminVariantResponse,
            AdminProductResponse,
            CreateProductRequest,
            UpdateProductRequest,
            CreateVariantRequest,
            UpdateVariantRequest,
            RestockRequest,
            DropResponse,
            UnlockDropRequest,
            UnlockDropResponse,
            CreateDropRequest,
            AllocateVariantRequest,
            AllocationResponse,
            ManifestItem,
            CreateCheckoutRequest,
            CheckoutResponse,
            OrderItem,
            OrderResponse,
            OrderStatus,
            PaginationParams,
            PaginationInfo,
            PaginatedOrderResponse,
            SubscribeRequest,
            SubscriberResponse,
            SendNewsletterRequest,
            SendNewsletterResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Admin login"),
        (name = "shop", description = "Regular storefront"),
        (name = "drops", description = "Time-boxed, key-gated drops"),
        (name = "checkout", description = "Stripe Checkout sessions"),
        (name = "newsletter", description = "Newsletter subscription"),
        (name = "admin", description = "Catalog, drop, order and newsletter administration"),
    ),
    info(
        title = "FREAK Backend API",
        version = "1.0.0",
        description = "Streetwear drop storefront REST API"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

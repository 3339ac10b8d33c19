use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use std::time::Duration;

use freak_backend::{
    config::Config,
    database::{create_pool, run_migrations},
    external::{BrevoService, StripeService},
    handlers,
    middlewares::{AuthMiddleware, create_cors},
    services::*,
    swagger::swagger_config,
    utils::JwtService,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml().expect("Failed to load configuration");

    // 创建数据库连接池并迁移
    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");
    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.expires_in);

    // 外部服务
    let timeout = Duration::from_secs(config.http.timeout_secs);
    let stripe_service = StripeService::new(config.stripe.clone(), timeout);
    let brevo_service =
        BrevoService::new(config.brevo.clone(), timeout).expect("Failed to build Brevo client");
    if config.stripe.webhook_secret.is_empty() {
        log::warn!("STRIPE_WEBHOOK_SECRET is not set, webhooks will be rejected");
    }

    // 业务服务
    let auth_service = AuthService::new(pool.clone(), jwt_service.clone());
    auth_service
        .ensure_admin(&config.admin)
        .await
        .expect("Failed to bootstrap admin account");

    let catalog_service = CatalogService::new(pool.clone());
    let drop_service = DropService::new(pool.clone());
    let checkout_service = CheckoutService::new(pool.clone(), stripe_service.clone());
    let settlement_service = SettlementService::new(pool.clone());
    let newsletter_service = NewsletterService::new(pool.clone(), brevo_service);
    let order_service = OrderService::new(pool.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        App::new()
            .wrap(AuthMiddleware::new(jwt_service.clone()))
            .wrap(create_cors())
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(catalog_service.clone()))
            .app_data(web::Data::new(drop_service.clone()))
            .app_data(web::Data::new(checkout_service.clone()))
            .app_data(web::Data::new(settlement_service.clone()))
            .app_data(web::Data::new(newsletter_service.clone()))
            .app_data(web::Data::new(order_service.clone()))
            .app_data(web::Data::new(stripe_service.clone()))
            .configure(swagger_config)
            .configure(handlers::webhook_config)
            .service(
                web::scope("/api")
                    .configure(handlers::auth_config)
                    .configure(handlers::shop_config)
                    .configure(handlers::drop_config)
                    .configure(handlers::checkout_config)
                    .configure(handlers::newsletter_config)
                    .configure(handlers::admin_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}

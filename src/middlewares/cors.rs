use actix_cors::Cors;

/// 允许任意来源；不携带凭据，管理端令牌走 Authorization 头
pub fn create_cors() -> Cors {
    Cors::default()
        .allow_any_origin()
        .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
        .allow_any_header()
        .max_age(3600)
}

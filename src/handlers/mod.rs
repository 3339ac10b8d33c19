pub mod admin;
pub mod auth;
pub mod checkout;
pub mod drop;
pub mod newsletter;
pub mod shop;
pub mod webhook;

pub use admin::admin_config;
pub use auth::auth_config;
pub use checkout::checkout_config;
pub use drop::drop_config;
pub use newsletter::newsletter_config;
pub use shop::shop_config;
pub use webhook::webhook_config;

pub mod auth_service;
pub mod catalog_service;
pub mod checkout_service;
pub mod drop_service;
pub mod newsletter_service;
pub mod order_service;
pub mod settlement_service;

#[cfg(test)]
pub(crate) mod test_support;

pub use auth_service::*;
pub use catalog_service::*;
pub use checkout_service::*;
pub use drop_service::*;
pub use newsletter_service::*;
pub use order_service::*;
pub use settlement_service::*;

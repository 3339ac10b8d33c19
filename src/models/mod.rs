pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod common;
pub mod drop;
pub mod newsletter;
pub mod order;

pub use auth::*;
pub use catalog::*;
pub use checkout::*;
pub use common::*;
pub use drop::*;
pub use newsletter::*;
pub use order::*;

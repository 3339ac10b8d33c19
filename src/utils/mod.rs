pub mod email;
pub mod jwt;
pub mod pagination;
pub mod password;

pub use email::*;
pub use jwt::*;
pub use pagination::*;
pub use password::*;

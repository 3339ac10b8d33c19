pub mod drop_products;
pub mod drops;
pub mod newsletter_subs;
pub mod orders;
pub mod product_variants;
pub mod products;
pub mod users;

pub use drop_products as drop_product_entity;
pub use drops as drop_entity;
pub use newsletter_subs as newsletter_sub_entity;
pub use orders::OrderStatus;
pub use orders as order_entity;
pub use product_variants as product_variant_entity;
pub use products as product_entity;
pub use users as user_entity;

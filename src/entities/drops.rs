use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "drops")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    /// bcrypt(访问密钥)，永远不能出现在响应中
    pub key_hash: String,
    pub is_active: bool,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// `now` 是否落在 [start_at, end_at] 窗口内
    pub fn is_open_at(&self, now: DateTime<Utc>) -> bool {
        !self.processed && self.start_at <= now && now <= self.end_at
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::drop_products::Entity")]
    Allocations,
}

impl Related<super::drop_products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Allocations.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

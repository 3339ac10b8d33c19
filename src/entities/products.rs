use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// 图片地址的 JSON 数组 (按展示顺序)
    #[sea_orm(column_type = "Text")]
    pub images: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

impl Model {
    /// 解析图片列表；存量脏数据按空列表处理
    pub fn image_list(&self) -> Vec<String> {
        serde_json::from_str(&self.images).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_variants::Entity")]
    Variants,
}

impl Related<super::product_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variants.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

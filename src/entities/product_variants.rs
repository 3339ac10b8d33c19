use sea_orm::entity::prelude::*;

/// 商品规格 (尺码 / 价格 / 库存)
/// - price: 最小货币单位 (美分)
/// - stock_total: 常规库存，只能被结算扣减或管理员补货增加
/// - stock_for_drop: 当前 drop 配额的镜像 (NULL=不属于任何 drop)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "product_variants")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub product_id: i64,
    pub size: String,
    pub price: i64,
    pub stock_total: i64,
    pub stock_for_drop: Option<i64>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm::entity::prelude::*;

/// Drop 配额：从规格总库存中划出的、drop 期间唯一可售的数量
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "drop_products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub drop_id: i64,
    pub product_variant_id: i64,
    pub allocated_stock: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::drops::Entity",
        from = "Column::DropId",
        to = "super::drops::Column::Id",
        on_delete = "Cascade"
    )]
    Drop,
    #[sea_orm(
        belongs_to = "super::product_variants::Entity",
        from = "Column::ProductVariantId",
        to = "super::product_variants::Column::Id",
        on_delete = "Cascade"
    )]
    Variant,
}

impl Related<super::drops::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Drop.def()
    }
}

impl Related<super::product_variants::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Variant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

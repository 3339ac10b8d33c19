use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    StripeSessionId,
}

#[derive(DeriveIden)]
enum DropProducts {
    Table,
    DropId,
    ProductVariantId,
}

#[derive(DeriveIden)]
enum Drops {
    Table,
    StartAt,
    EndAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 结算幂等键：同一个 Checkout Session 只能产生一条订单
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_stripe_session_unique")
                    .table(Orders::Table)
                    .col(Orders::StripeSessionId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 同一 drop 内每个规格只有一条配额
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_drop_products_drop_variant_unique")
                    .table(DropProducts::Table)
                    .col(DropProducts::DropId)
                    .col(DropProducts::ProductVariantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_drops_window")
                    .table(Drops::Table)
                    .col(Drops::StartAt)
                    .col(Drops::EndAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_drops_window")
                    .table(Drops::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_drop_products_drop_variant_unique")
                    .table(DropProducts::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_stripe_session_unique")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

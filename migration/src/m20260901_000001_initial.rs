use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Email,
    PasswordHash,
    Role,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
    Title,
    Description,
    Images,
    Category,
    CreatedAt,
}

#[derive(DeriveIden)]
enum ProductVariants {
    Table,
    Id,
    ProductId,
    Size,
    Price,
    StockTotal,
    StockForDrop,
}

#[derive(DeriveIden)]
enum Drops {
    Table,
    Id,
    Title,
    Description,
    StartAt,
    EndAt,
    KeyHash,
    IsActive,
    Processed,
    CreatedAt,
}

#[derive(DeriveIden)]
enum DropProducts {
    Table,
    Id,
    DropId,
    ProductVariantId,
    AllocatedStock,
}

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    UserEmail,
    Items,
    TotalAmount,
    StripeSessionId,
    DropId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum NewsletterSubs {
    Table,
    Id,
    Email,
    SubscribedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 管理员账号
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Users::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Users::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(
                        ColumnDef::new(Users::Role)
                            .string()
                            .not_null()
                            .default("admin"),
                    )
                    .col(
                        ColumnDef::new(Users::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Title).string().not_null())
                    .col(ColumnDef::new(Products::Description).text().null())
                    // JSON 数组字符串
                    .col(
                        ColumnDef::new(Products::Images)
                            .text()
                            .not_null()
                            .default("[]"),
                    )
                    .col(
                        ColumnDef::new(Products::Category)
                            .string()
                            .not_null()
                            .default("streetwear"),
                    )
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductVariants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductVariants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProductVariants::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductVariants::Size).string().not_null())
                    .col(ColumnDef::new(ProductVariants::Price).big_integer().not_null())
                    .col(
                        ColumnDef::new(ProductVariants::StockTotal)
                            .big_integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(ProductVariants::StockTotal).gte(0)),
                    )
                    .col(
                        ColumnDef::new(ProductVariants::StockForDrop)
                            .big_integer()
                            .null(), // NULL = 不属于任何 drop
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_variants_product")
                            .from(ProductVariants::Table, ProductVariants::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Drops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Drops::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Drops::Title).string().not_null())
                    .col(ColumnDef::new(Drops::Description).text().null())
                    .col(
                        ColumnDef::new(Drops::StartAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Drops::EndAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Drops::KeyHash).string().not_null())
                    .col(
                        ColumnDef::new(Drops::IsActive)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Drops::Processed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Drops::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(DropProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DropProducts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DropProducts::DropId).integer().not_null())
                    .col(
                        ColumnDef::new(DropProducts::ProductVariantId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DropProducts::AllocatedStock)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(DropProducts::AllocatedStock).gte(0)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_drop_products_drop")
                            .from(DropProducts::Table, DropProducts::DropId)
                            .to(Drops::Table, Drops::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_drop_products_variant")
                            .from(DropProducts::Table, DropProducts::ProductVariantId)
                            .to(ProductVariants::Table, ProductVariants::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::UserEmail).string().not_null())
                    .col(ColumnDef::new(Orders::Items).text().not_null())
                    .col(
                        ColumnDef::new(Orders::TotalAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Orders::StripeSessionId).string().not_null())
                    .col(ColumnDef::new(Orders::DropId).integer().null())
                    .col(
                        ColumnDef::new(Orders::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(NewsletterSubs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(NewsletterSubs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(NewsletterSubs::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(NewsletterSubs::SubscribedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(NewsletterSubs::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(DropProducts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Drops::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductVariants::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Vouchers {
    Table,
    Id,
    Code,
    Name,
    Description,
    Discount,
    MaxUsage,
    UsedCount,
    ValidFrom,
    ValidUntil,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Vouchers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Vouchers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::Code)
                            .string_len(50)
                            .not_null()
                            .check(Expr::cust("char_length(code) >= 3")),
                    )
                    .col(
                        ColumnDef::new(Vouchers::Name)
                            .string_len(255)
                            .not_null()
                            .check(Expr::cust("char_length(name) >= 3")),
                    )
                    .col(
                        ColumnDef::new(Vouchers::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Vouchers::Discount)
                            .double()
                            .not_null()
                            .check(Expr::col(Vouchers::Discount).between(0, 100)),
                    )
                    .col(
                        ColumnDef::new(Vouchers::MaxUsage)
                            .integer()
                            .not_null()
                            .default(1)
                            .check(Expr::col(Vouchers::MaxUsage).gte(1)),
                    )
                    .col(
                        ColumnDef::new(Vouchers::UsedCount)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(Vouchers::UsedCount).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Vouchers::ValidFrom)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::ValidUntil)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Vouchers::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Vouchers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Vouchers::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::cust("NOW()")),
                    )
                    .col(
                        ColumnDef::new(Vouchers::DeletedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 唯一约束是重复券码的最终判定
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vouchers_code")
                    .table(Vouchers::Table)
                    .col(Vouchers::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_vouchers_deleted_at")
                    .table(Vouchers::Table)
                    .col(Vouchers::DeletedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().if_exists().table(Vouchers::Table).to_owned())
            .await
    }
}

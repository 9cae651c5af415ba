//! Initial schema migration.
//!
//! Creates the ledger tables of the shop:
//!
//! - `accounts`: identity, credential hash and coin balance
//! - `merchandise`: the catalog, keyed by item name
//! - `purchases`: one row per successful purchase
//! - `transfers`: one row per successful coin transfer
//!
//! Balance non-negativity and positive prices/quantities/amounts are enforced
//! by CHECK constraints, so the store rejects them even if a caller bypasses
//! the engine.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
enum Accounts {
    Table,
    Id,
    Username,
    Credential,
    Balance,
    CreatedAt,
}

#[derive(Iden)]
enum Merchandise {
    Table,
    Name,
    Price,
}

#[derive(Iden)]
enum Purchases {
    Table,
    Id,
    AccountId,
    ItemName,
    Quantity,
    TotalPrice,
    CreatedAt,
}

#[derive(Iden)]
enum Transfers {
    Table,
    Id,
    SenderId,
    ReceiverId,
    Amount,
    CreatedAt,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Accounts
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Accounts::Username)
                            .string_len(50)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Accounts::Credential).text().not_null())
                    .col(
                        ColumnDef::new(Accounts::Balance)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Accounts::Balance).gte(0)),
                    )
                    .col(
                        ColumnDef::new(Accounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Merchandise
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Merchandise::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Merchandise::Name)
                            .string_len(50)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Merchandise::Price)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Merchandise::Price).gt(0)),
                    )
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Purchases
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::AccountId).integer().not_null())
                    .col(ColumnDef::new(Purchases::ItemName).string_len(50).not_null())
                    .col(
                        ColumnDef::new(Purchases::Quantity)
                            .integer()
                            .not_null()
                            .check(Expr::col(Purchases::Quantity).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Purchases::TotalPrice)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Purchases::TotalPrice).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-account_id")
                            .from(Purchases::Table, Purchases::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchases-item_name")
                            .from(Purchases::Table, Purchases::ItemName)
                            .to(Merchandise::Table, Merchandise::Name),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchases-account_id")
                    .table(Purchases::Table)
                    .col(Purchases::AccountId)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Transfers
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Transfers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transfers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transfers::SenderId).integer().not_null())
                    .col(ColumnDef::new(Transfers::ReceiverId).integer().not_null())
                    .col(
                        ColumnDef::new(Transfers::Amount)
                            .big_integer()
                            .not_null()
                            .check(Expr::col(Transfers::Amount).gt(0)),
                    )
                    .col(
                        ColumnDef::new(Transfers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-sender_id")
                            .from(Transfers::Table, Transfers::SenderId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-transfers-receiver_id")
                            .from(Transfers::Table, Transfers::ReceiverId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-sender_id")
                    .table(Transfers::Table)
                    .col(Transfers::SenderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-transfers-receiver_id")
                    .table(Transfers::Table)
                    .col(Transfers::ReceiverId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop in reverse order of creation (respecting FK dependencies)
        manager
            .drop_table(Table::drop().table(Transfers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Merchandise::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await?;
        Ok(())
    }
}

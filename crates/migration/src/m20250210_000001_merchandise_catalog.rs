//! Seeds the merchandise catalog.
//!
//! Prices are in coins. The catalog is static reference data: no engine
//! operation mutates it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum Merchandise {
    Table,
    Name,
    Price,
}

const CATALOG: [(&str, i64); 10] = [
    ("t-shirt", 80),
    ("cup", 20),
    ("book", 50),
    ("pen", 10),
    ("powerbank", 200),
    ("hoody", 300),
    ("umbrella", 200),
    ("socks", 10),
    ("wallet", 50),
    ("pink-hoody", 500),
];

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let mut insert = Query::insert();
        insert
            .into_table(Merchandise::Table)
            .columns([Merchandise::Name, Merchandise::Price]);
        for (name, price) in CATALOG {
            insert
                .values([name.into(), price.into()])
                .map_err(|err| DbErr::Migration(err.to_string()))?;
        }

        manager.exec_stmt(insert).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let delete = Query::delete()
            .from_table(Merchandise::Table)
            .and_where(Expr::col(Merchandise::Name).is_in(CATALOG.map(|(name, _)| name)))
            .to_owned();

        manager.exec_stmt(delete).await
    }
}

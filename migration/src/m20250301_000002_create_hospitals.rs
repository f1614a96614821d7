use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Hospital::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Hospital::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(string_len(Hospital::Name, 100).not_null())
                    .col(string_len(Hospital::Address, 255).not_null())
                    .col(string_len(Hospital::Phone, 30).not_null())
                    .to_owned(),
            )
            .await?;

        // Seed a small directory so the API is usable out of the box
        let insert = Query::insert()
            .into_table(Hospital::Table)
            .columns([Hospital::Name, Hospital::Address, Hospital::Phone])
            .values_panic([
                "Seoul General Hospital".into(),
                "12 Jongno-gu, Seoul".into(),
                "02-1234-5678".into(),
            ])
            .values_panic([
                "Hangang Medical Center".into(),
                "88 Mapo-gu, Seoul".into(),
                "02-8765-4321".into(),
            ])
            .values_panic([
                "Busan Central Clinic".into(),
                "5 Haeundae-gu, Busan".into(),
                "051-222-3333".into(),
            ])
            .to_owned();

        manager.exec_stmt(insert).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Hospital::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Hospital {
    Table,
    Id,
    Name,
    Address,
    Phone,
}

//! Create `service_type` table.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceType::Table)
                    .if_not_exists()
                    .col(uuid(ServiceType::Id).primary_key())
                    .col(string_len(ServiceType::Name, 128).unique_key().not_null())
                    .col(text(ServiceType::Description).not_null())
                    .col(boolean(ServiceType::IsActive).not_null().default(true))
                    .col(timestamp_with_time_zone(ServiceType::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ServiceType::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceType::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceType { Table, Id, Name, Description, IsActive, CreatedAt, UpdatedAt }

//! Create `service_order` table.
//!
//! No foreign keys to `user` or `service_type`: deleting either leaves the
//! order in place with a dangling reference.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceOrder::Table)
                    .if_not_exists()
                    .col(uuid(ServiceOrder::Id).primary_key())
                    .col(uuid(ServiceOrder::CustomerId).not_null())
                    .col(ColumnDef::new(ServiceOrder::WorkerId).uuid().null())
                    .col(uuid(ServiceOrder::ServiceTypeId).not_null())
                    .col(text(ServiceOrder::Description).not_null())
                    .col(string_len(ServiceOrder::Location, 255).not_null())
                    .col(string_len(ServiceOrder::Status, 16).not_null())
                    .col(timestamp_with_time_zone(ServiceOrder::ScheduledTime).not_null())
                    .col(ColumnDef::new(ServiceOrder::Rating).small_integer().null())
                    .col(ColumnDef::new(ServiceOrder::Notes).text().null())
                    .col(timestamp_with_time_zone(ServiceOrder::CreatedAt).not_null())
                    .col(timestamp_with_time_zone(ServiceOrder::UpdatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(ServiceOrder::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum ServiceOrder {
    Table,
    Id,
    CustomerId,
    WorkerId,
    ServiceTypeId,
    Description,
    Location,
    Status,
    ScheduledTime,
    Rating,
    Notes,
    CreatedAt,
    UpdatedAt,
}

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Orders: the three listing scopes
        manager
            .create_index(
                Index::create()
                    .name("idx_order_customer_status")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::CustomerId)
                    .col(ServiceOrder::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_worker_status")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::WorkerId)
                    .col(ServiceOrder::Status)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_order_service_type_status")
                    .table(ServiceOrder::Table)
                    .col(ServiceOrder::ServiceTypeId)
                    .col(ServiceOrder::Status)
                    .to_owned(),
            )
            .await?;

        // Ratings: per-worker lookup
        manager
            .create_index(
                Index::create()
                    .name("idx_rating_worker")
                    .table(UserRating::Table)
                    .col(UserRating::WorkerId)
                    .to_owned(),
            )
            .await?;

        // Service types: active listing
        manager
            .create_index(
                Index::create()
                    .name("idx_service_type_active")
                    .table(ServiceType::Table)
                    .col(ServiceType::IsActive)
                    .to_owned(),
            )
            .await?;

        // Users: role filter
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_order_customer_status").table(ServiceOrder::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_worker_status").table(ServiceOrder::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_order_service_type_status").table(ServiceOrder::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_rating_worker").table(UserRating::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_service_type_active").table(ServiceType::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_user_role").table(User::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceOrder { Table, CustomerId, WorkerId, ServiceTypeId, Status }

#[derive(DeriveIden)]
enum UserRating { Table, WorkerId }

#[derive(DeriveIden)]
enum ServiceType { Table, IsActive }

#[derive(DeriveIden)]
enum User { Table, Role }

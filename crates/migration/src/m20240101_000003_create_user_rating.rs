//! Create `user_rating` table.
//!
//! One row per rating a worker received; the worker's rating sequence is
//! these rows ordered by `created_at`.
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(UserRating::Table)
                    .if_not_exists()
                    .col(uuid(UserRating::Id).primary_key())
                    .col(uuid(UserRating::WorkerId).not_null())
                    .col(uuid(UserRating::OrderId).not_null())
                    .col(small_integer(UserRating::Value).not_null().check(
                        Expr::col(UserRating::Value).between(1, 5),
                    ))
                    .col(timestamp_with_time_zone(UserRating::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_rating_worker")
                            .from(UserRating::Table, UserRating::WorkerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(UserRating::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum UserRating { Table, Id, WorkerId, OrderId, Value, CreatedAt }

#[derive(DeriveIden)]
enum User { Table, Id }

//! Entity helper tests against a live PostgreSQL.
//!
//! Skipped when `SKIP_DB_TESTS` is set or the database is unreachable.

use crate::db::connect;
use crate::{order, service_type, user, user_credentials, user_rating};
use sea_orm::{DatabaseConnection, EntityTrait};
use migration::MigratorTrait;
use anyhow::Result;
use uuid::Uuid;

async fn setup_test_db() -> Option<DatabaseConnection> {
    if std::env::var("SKIP_DB_TESTS").is_ok() {
        return None;
    }
    let db = match connect().await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("skip: cannot connect to db: {}", e);
            return None;
        }
    };
    if let Err(e) = migration::Migrator::up(&db, None).await {
        eprintln!("skip: migrate up failed: {}", e);
        return None;
    }
    Some(db)
}

fn worker_row(email: &str) -> user::NewUserRow {
    user::NewUserRow {
        name: "John Plumber".into(),
        email: email.into(),
        phone: "2345678901".into(),
        role: "worker".into(),
        location: "New York".into(),
        specialization: Some("Plumbing".into()),
    }
}

#[tokio::test]
async fn test_user_credentials_and_ratings() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = format!("Worker_{}@Example.com", Uuid::new_v4());
    let created = user::create(&db, worker_row(&email)).await?;
    assert_eq!(created.email, email.to_lowercase());
    assert!(created.is_active);

    let found = user::find_by_email(&db, &email.to_uppercase()).await?;
    assert_eq!(found.map(|u| u.id), Some(created.id));

    user_credentials::upsert_password(&db, created.id, "$argon2id$v=19$dummy".into(), "argon2id").await?;
    let updated = user_credentials::upsert_password(&db, created.id, "$argon2id$v=19$other".into(), "argon2id").await?;
    assert_eq!(updated.password_hash, "$argon2id$v=19$other");

    user_rating::append(&db, created.id, Uuid::new_v4(), 3).await?;
    user_rating::append(&db, created.id, Uuid::new_v4(), 5).await?;
    assert_eq!(user_rating::values_for(&db, created.id).await?, vec![3, 5]);
    assert!(user_rating::append(&db, created.id, Uuid::new_v4(), 6).await.is_err());

    // credentials and ratings go with the user
    assert!(user::hard_delete(&db, created.id).await?);
    assert!(user_credentials::find_by_user(&db, created.id).await?.is_none());
    assert!(user_rating::values_for(&db, created.id).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_duplicate_email_rejected_by_unique_key() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let email = format!("dup_{}@example.com", Uuid::new_v4());
    let first = user::create(&db, worker_row(&email)).await?;
    let second = user::create(&db, worker_row(&email.to_uppercase())).await;
    assert!(matches!(second, Err(crate::errors::ModelError::Conflict(_))));

    user::hard_delete(&db, first.id).await?;
    Ok(())
}

#[tokio::test]
async fn test_service_type_delete_leaves_orders() -> Result<()> {
    let Some(db) = setup_test_db().await else { return Ok(()) };

    let st = service_type::create(&db, &format!("Plumbing {}", Uuid::new_v4()), "Plumbing services").await?;
    let o = order::create(&db, order::NewOrderRow {
        customer_id: Uuid::new_v4(),
        service_type_id: st.id,
        description: "Leaking faucet in kitchen".into(),
        location: "123 Main St, New York".into(),
        scheduled_time: chrono::Utc::now().into(),
        notes: None,
    }).await?;
    assert_eq!(o.status, order::STATUS_PENDING);
    assert!(o.worker_id.is_none());

    service_type::Entity::delete_by_id(st.id).exec(&db).await?;
    let still_there = order::Entity::find_by_id(o.id).one(&db).await?;
    assert_eq!(still_there.map(|m| m.service_type_id), Some(st.id));

    order::Entity::delete_by_id(o.id).exec(&db).await?;
    Ok(())
}

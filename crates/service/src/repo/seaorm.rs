use std::collections::HashMap;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use uuid::Uuid;

use models::{order, service_type, user, user_credentials, user_rating};

use crate::domain::{
    Credentials, NewOrder, NewUser, Order, OrderFilter, OrderScope, OrderStatus, ServiceType, ServiceTypePatch, User,
    UserFilter, UserPatch,
};
use crate::errors::ServiceError;
use crate::repository::{OrderRepository, ServiceTypeRepository, UserRepository};

/// Repositories over a PostgreSQL connection pool.
#[derive(Clone)]
pub struct SeaOrmRepository {
    pub db: DatabaseConnection,
}

impl SeaOrmRepository {
    pub fn new(db: DatabaseConnection) -> Self { Self { db } }

    async fn ratings_for(&self, worker_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<i16>>, ServiceError> {
        let mut out: HashMap<Uuid, Vec<i16>> = HashMap::new();
        if worker_ids.is_empty() {
            return Ok(out);
        }
        let rows = user_rating::Entity::find()
            .filter(user_rating::Column::WorkerId.is_in(worker_ids.to_vec()))
            .order_by_asc(user_rating::Column::CreatedAt)
            .all(&self.db)
            .await?;
        for r in rows {
            out.entry(r.worker_id).or_default().push(r.value);
        }
        Ok(out)
    }

    async fn with_ratings(&self, models: Vec<user::Model>) -> Result<Vec<User>, ServiceError> {
        let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
        let mut ratings = self.ratings_for(&ids).await?;
        models
            .into_iter()
            .map(|m| {
                let r = ratings.remove(&m.id).unwrap_or_default();
                to_user(m, r)
            })
            .collect()
    }

    async fn one_with_ratings(&self, model: Option<user::Model>) -> Result<Option<User>, ServiceError> {
        match model {
            Some(m) => Ok(self.with_ratings(vec![m]).await?.pop()),
            None => Ok(None),
        }
    }
}

fn to_user(m: user::Model, ratings: Vec<i16>) -> Result<User, ServiceError> {
    Ok(User {
        id: m.id,
        name: m.name,
        email: m.email,
        phone: m.phone,
        role: m.role.parse()?,
        location: m.location,
        specialization: m.specialization,
        image: m.image,
        ratings,
        is_active: m.is_active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

fn to_service_type(m: service_type::Model) -> ServiceType {
    ServiceType {
        id: m.id,
        name: m.name,
        description: m.description,
        is_active: m.is_active,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    }
}

fn to_order(m: order::Model) -> Result<Order, ServiceError> {
    Ok(Order {
        id: m.id,
        customer_id: m.customer_id,
        worker_id: m.worker_id,
        service_type_id: m.service_type_id,
        description: m.description,
        location: m.location,
        status: m.status.parse()?,
        scheduled_time: m.scheduled_time.with_timezone(&Utc),
        rating: m.rating,
        notes: m.notes,
        created_at: m.created_at.with_timezone(&Utc),
        updated_at: m.updated_at.with_timezone(&Utc),
    })
}

/// `lower(col) LIKE %needle%`
fn contains_ci<C: sea_orm::ColumnTrait>(col: C, needle: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::expr(Func::lower(Expr::col(col))).like(format!("%{}%", needle.to_lowercase()))
}

#[async_trait::async_trait]
impl UserRepository for SeaOrmRepository {
    async fn insert_user(&self, new: NewUser, password_hash: String, password_algorithm: &str) -> Result<User, ServiceError> {
        let txn = self.db.begin().await?;
        let created = user::create(
            &txn,
            user::NewUserRow {
                name: new.name,
                email: new.email,
                phone: new.phone,
                role: new.role.as_str().to_string(),
                location: new.location,
                specialization: new.specialization,
            },
        )
        .await
        .map_err(|e| match e {
            models::errors::ModelError::Conflict(_) => ServiceError::Conflict("email already registered".into()),
            other => other.into(),
        })?;
        user_credentials::upsert_password(&txn, created.id, password_hash, password_algorithm).await?;
        txn.commit().await?;
        to_user(created, Vec::new())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        let found = user::Entity::find_by_id(id).one(&self.db).await?;
        self.one_with_ratings(found).await
    }

    async fn find_users(&self, ids: &[Uuid]) -> Result<Vec<User>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = user::Entity::find().filter(user::Column::Id.is_in(ids.to_vec())).all(&self.db).await?;
        self.with_ratings(rows).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        let found = user::find_by_email(&self.db, email).await?;
        self.one_with_ratings(found).await
    }

    async fn get_credentials(&self, user_id: Uuid) -> Result<Option<Credentials>, ServiceError> {
        let res = user_credentials::find_by_user(&self.db, user_id).await?;
        Ok(res.map(|c| Credentials { user_id: c.user_id, password_hash: c.password_hash, password_algorithm: c.password_algorithm }))
    }

    async fn list_users(&self, filter: &UserFilter) -> Result<Vec<User>, ServiceError> {
        let mut q = user::Entity::find();
        if let Some(role) = filter.role {
            q = q.filter(user::Column::Role.eq(role.as_str()));
        }
        if let Some(name) = filter.name.as_deref() {
            q = q.filter(contains_ci(user::Column::Name, name));
        }
        let rows = q.order_by_desc(user::Column::CreatedAt).all(&self.db).await?;
        self.with_ratings(rows).await
    }

    async fn update_user(&self, id: Uuid, patch: UserPatch) -> Result<Option<User>, ServiceError> {
        let Some(existing) = user::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let mut am: user::ActiveModel = existing.into();
        if let Some(name) = patch.name { am.name = Set(name); }
        if let Some(phone) = patch.phone { am.phone = Set(phone); }
        if let Some(location) = patch.location { am.location = Set(location); }
        if let Some(spec) = patch.specialization { am.specialization = Set(Some(spec)); }
        if let Some(active) = patch.is_active { am.is_active = Set(active); }
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&self.db).await?;
        self.one_with_ratings(Some(updated)).await
    }

    async fn set_image(&self, id: Uuid, filename: &str) -> Result<Option<User>, ServiceError> {
        let Some(existing) = user::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let mut am: user::ActiveModel = existing.into();
        am.image = Set(Some(filename.to_string()));
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&self.db).await?;
        self.one_with_ratings(Some(updated)).await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, ServiceError> {
        // credentials and ratings cascade
        Ok(user::hard_delete(&self.db, id).await?)
    }
}

#[async_trait::async_trait]
impl ServiceTypeRepository for SeaOrmRepository {
    async fn insert_service_type(&self, name: &str, description: &str) -> Result<ServiceType, ServiceError> {
        let created = service_type::create(&self.db, name, description).await.map_err(|e| match e {
            models::errors::ModelError::Conflict(_) => ServiceError::Conflict("service type already exists".into()),
            other => other.into(),
        })?;
        Ok(to_service_type(created))
    }

    async fn find_service_type(&self, id: Uuid) -> Result<Option<ServiceType>, ServiceError> {
        Ok(service_type::Entity::find_by_id(id).one(&self.db).await?.map(to_service_type))
    }

    async fn find_service_types(&self, ids: &[Uuid]) -> Result<Vec<ServiceType>, ServiceError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = service_type::Entity::find()
            .filter(service_type::Column::Id.is_in(ids.to_vec()))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(to_service_type).collect())
    }

    async fn list_service_types(&self, include_inactive: bool) -> Result<Vec<ServiceType>, ServiceError> {
        let mut q = service_type::Entity::find();
        if !include_inactive {
            q = q.filter(service_type::Column::IsActive.eq(true));
        }
        let rows = q.order_by_asc(service_type::Column::Name).all(&self.db).await?;
        Ok(rows.into_iter().map(to_service_type).collect())
    }

    async fn service_type_ids_matching(&self, needle: &str) -> Result<Vec<Uuid>, ServiceError> {
        let rows = service_type::Entity::find()
            .filter(contains_ci(service_type::Column::Name, needle))
            .all(&self.db)
            .await?;
        Ok(rows.into_iter().map(|m| m.id).collect())
    }

    async fn update_service_type(&self, id: Uuid, patch: ServiceTypePatch) -> Result<Option<ServiceType>, ServiceError> {
        let Some(existing) = service_type::Entity::find_by_id(id).one(&self.db).await? else { return Ok(None) };
        let mut am: service_type::ActiveModel = existing.into();
        if let Some(name) = patch.name { am.name = Set(name); }
        if let Some(description) = patch.description { am.description = Set(description); }
        if let Some(active) = patch.is_active { am.is_active = Set(active); }
        am.updated_at = Set(Utc::now().into());
        let updated = am.update(&self.db).await.map_err(|e| match ServiceError::from(e) {
            ServiceError::Conflict(_) => ServiceError::Conflict("service type already exists".into()),
            other => other,
        })?;
        Ok(Some(to_service_type(updated)))
    }

    async fn delete_service_type(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = service_type::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

#[async_trait::async_trait]
impl OrderRepository for SeaOrmRepository {
    async fn insert_order(&self, new: NewOrder) -> Result<Order, ServiceError> {
        let created = order::create(
            &self.db,
            order::NewOrderRow {
                customer_id: new.customer_id,
                service_type_id: new.service_type_id,
                description: new.description,
                location: new.location,
                scheduled_time: new.scheduled_time.into(),
                notes: new.notes,
            },
        )
        .await?;
        to_order(created)
    }

    async fn find_order(&self, id: Uuid) -> Result<Option<Order>, ServiceError> {
        order::Entity::find_by_id(id).one(&self.db).await?.map(to_order).transpose()
    }

    async fn list_orders(&self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let mut cond = Condition::all();
        match filter.scope {
            OrderScope::All => {}
            OrderScope::Customer(id) => cond = cond.add(order::Column::CustomerId.eq(id)),
            OrderScope::Worker(id) => {
                cond = cond.add(
                    Condition::any()
                        .add(order::Column::WorkerId.eq(id))
                        .add(order::Column::Status.eq(OrderStatus::Pending.as_str())),
                )
            }
        }
        if let Some(location) = filter.location.as_deref() {
            cond = cond.add(contains_ci(order::Column::Location, location));
        }
        if let Some(ids) = &filter.service_type_ids {
            if ids.is_empty() {
                return Ok(Vec::new());
            }
            cond = cond.add(order::Column::ServiceTypeId.is_in(ids.clone()));
        }
        let rows = order::Entity::find()
            .filter(cond)
            .order_by_desc(order::Column::CreatedAt)
            .all(&self.db)
            .await?;
        rows.into_iter().map(to_order).collect()
    }

    async fn assign_worker(&self, id: Uuid, worker_id: Uuid) -> Result<Option<Order>, ServiceError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let res = order::Entity::update_many()
            .col_expr(order::Column::WorkerId, Expr::value(worker_id))
            .col_expr(order::Column::Status, Expr::value(OrderStatus::Accepted.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::Status.eq(OrderStatus::Pending.as_str()))
            .exec(&self.db)
            .await?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_order(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: Option<OrderStatus>,
        assigned_to: Option<Uuid>,
        next: OrderStatus,
    ) -> Result<Option<Order>, ServiceError> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut q = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(next.as_str()))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id));
        if let Some(current) = expected {
            q = q.filter(order::Column::Status.eq(current.as_str()));
        }
        if let Some(worker_id) = assigned_to {
            q = q.filter(order::Column::WorkerId.eq(worker_id));
        }
        let res = q.exec(&self.db).await?;
        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_order(id).await
    }

    async fn rate(&self, id: Uuid, customer_id: Uuid, value: i16) -> Result<Option<Order>, ServiceError> {
        let txn = self.db.begin().await?;
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let res = order::Entity::update_many()
            .col_expr(order::Column::Rating, Expr::value(value))
            .col_expr(order::Column::UpdatedAt, Expr::value(now))
            .filter(order::Column::Id.eq(id))
            .filter(order::Column::CustomerId.eq(customer_id))
            .filter(order::Column::Status.eq(OrderStatus::Completed.as_str()))
            .exec(&txn)
            .await?;
        if res.rows_affected == 0 {
            txn.rollback().await?;
            return Ok(None);
        }
        let Some(rated) = order::Entity::find_by_id(id).one(&txn).await? else {
            txn.rollback().await?;
            return Ok(None);
        };
        if let Some(worker_id) = rated.worker_id {
            // a deleted worker keeps no rating sequence
            if user::Entity::find_by_id(worker_id).one(&txn).await?.is_some() {
                user_rating::append(&txn, worker_id, id, value).await?;
            }
        }
        txn.commit().await?;
        to_order(rated).map(Some)
    }

    async fn delete_order(&self, id: Uuid) -> Result<bool, ServiceError> {
        let res = order::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(res.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use migration::MigratorTrait;

    async fn setup() -> Option<SeaOrmRepository> {
        if std::env::var("SKIP_DB_TESTS").is_ok() {
            return None;
        }
        let db = match models::db::connect().await {
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
        Some(SeaOrmRepository::new(db))
    }

    fn new_user(role: Role) -> NewUser {
        NewUser {
            name: "Repo Test".into(),
            email: format!("repo_{}@example.com", Uuid::new_v4()),
            phone: "1234567890".into(),
            role,
            location: "New York".into(),
            specialization: (role == Role::Worker).then(|| "Plumbing".to_string()),
        }
    }

    #[tokio::test]
    async fn duplicate_email_is_conflict() -> anyhow::Result<()> {
        let Some(repo) = setup().await else { return Ok(()) };
        let nu = new_user(Role::Customer);
        let first = repo.insert_user(nu.clone(), "$argon2id$x".into(), "argon2id").await?;
        let second = repo.insert_user(nu, "$argon2id$y".into(), "argon2id").await;
        assert!(matches!(second, Err(ServiceError::Conflict(_))));
        repo.delete_user(first.id).await?;
        Ok(())
    }

    #[tokio::test]
    async fn assign_is_single_shot_and_rating_appends() -> anyhow::Result<()> {
        let Some(repo) = setup().await else { return Ok(()) };
        let customer = repo.insert_user(new_user(Role::Customer), "$argon2id$x".into(), "argon2id").await?;
        let worker = repo.insert_user(new_user(Role::Worker), "$argon2id$x".into(), "argon2id").await?;
        let st = repo.insert_service_type(&format!("Plumbing {}", Uuid::new_v4()), "Pipes").await?;
        let o = repo
            .insert_order(NewOrder {
                customer_id: customer.id,
                service_type_id: st.id,
                description: "Leaking faucet".into(),
                location: "New York".into(),
                scheduled_time: Utc::now(),
                notes: None,
            })
            .await?;

        let (a, b) = tokio::join!(repo.assign_worker(o.id, worker.id), repo.assign_worker(o.id, worker.id));
        assert_eq!([a?.is_some(), b?.is_some()].iter().filter(|x| **x).count(), 1);

        assert!(repo.rate(o.id, customer.id, 5).await?.is_none());
        let stranger = Uuid::new_v4();
        assert!(repo
            .compare_and_set_status(o.id, None, Some(stranger), OrderStatus::Cancelled)
            .await?
            .is_none());
        repo.compare_and_set_status(o.id, Some(OrderStatus::Accepted), Some(worker.id), OrderStatus::Completed).await?;
        let rated = repo.rate(o.id, customer.id, 5).await?;
        assert_eq!(rated.and_then(|r| r.rating), Some(5));
        assert_eq!(repo.find_user(worker.id).await?.map(|u| u.ratings), Some(vec![5]));

        repo.delete_order(o.id).await?;
        repo.delete_service_type(st.id).await?;
        repo.delete_user(customer.id).await?;
        repo.delete_user(worker.id).await?;
        Ok(())
    }
}

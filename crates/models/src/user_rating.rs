use sea_orm::{entity::prelude::*, Set, ConnectionTrait, QueryOrder};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{errors, user};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_rating")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub worker_id: Uuid,
    pub order_id: Uuid,
    pub value: i16,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter)]
pub enum Relation { Worker }

impl RelationTrait for Relation {
    fn def(&self) -> RelationDef {
        match self {
            Relation::Worker => Entity::belongs_to(user::Entity)
                .from(Column::WorkerId)
                .to(user::Column::Id)
                .into(),
        }
    }
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef { Relation::Worker.def() }
}

impl ActiveModelBehavior for ActiveModel {}

pub fn validate_value(value: i16) -> Result<(), errors::ModelError> {
    if !(1..=5).contains(&value) {
        return Err(errors::ModelError::Validation("rating must be 1-5".into()));
    }
    Ok(())
}

/// Append one rating to a worker's sequence.
pub async fn append<C: ConnectionTrait>(db: &C, worker_id: Uuid, order_id: Uuid, value: i16) -> Result<Model, errors::ModelError> {
    validate_value(value)?;
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        worker_id: Set(worker_id),
        order_id: Set(order_id),
        value: Set(value),
        created_at: Set(Utc::now().into()),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

/// The worker's ratings in the order they were received.
pub async fn values_for<C: ConnectionTrait>(db: &C, worker_id: Uuid) -> Result<Vec<i16>, errors::ModelError> {
    let rows = Entity::find()
        .filter(Column::WorkerId.eq(worker_id))
        .order_by_asc(Column::CreatedAt)
        .all(db)
        .await?;
    Ok(rows.into_iter().map(|r| r.value).collect())
}

use sea_orm::{entity::prelude::*, Set, ConnectionTrait};
use uuid::Uuid;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors;

pub const STATUS_PENDING: &str = "pending";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_order")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub worker_id: Option<Uuid>,
    pub service_type_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub location: String,
    pub status: String,
    pub scheduled_time: DateTimeWithTimeZone,
    pub rating: Option<i16>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

// Customer, worker and service type are soft references: no FK, no relation.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Column values for a new order; always starts `pending` with no worker.
#[derive(Clone, Debug)]
pub struct NewOrderRow {
    pub customer_id: Uuid,
    pub service_type_id: Uuid,
    pub description: String,
    pub location: String,
    pub scheduled_time: DateTimeWithTimeZone,
    pub notes: Option<String>,
}

pub async fn create<C: ConnectionTrait>(db: &C, row: NewOrderRow) -> Result<Model, errors::ModelError> {
    if row.description.trim().is_empty() { return Err(errors::ModelError::Validation("description is required".into())); }
    if row.location.trim().is_empty() { return Err(errors::ModelError::Validation("location is required".into())); }
    let now = Utc::now().into();
    let am = ActiveModel {
        id: Set(Uuid::new_v4()),
        customer_id: Set(row.customer_id),
        worker_id: Set(None),
        service_type_id: Set(row.service_type_id),
        description: Set(row.description.trim().to_string()),
        location: Set(row.location.trim().to_string()),
        status: Set(STATUS_PENDING.to_string()),
        scheduled_time: Set(row.scheduled_time),
        rating: Set(None),
        notes: Set(row.notes),
        created_at: Set(now),
        updated_at: Set(now),
    };
    am.insert(db).await.map_err(|e| errors::ModelError::Db(e.to_string()))
}

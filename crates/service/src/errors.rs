use thiserror::Error;

/// Error taxonomy shared by every service operation.
///
/// The HTTP layer maps each variant onto one status code; nothing here is retried.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn not_found(entity: &str) -> Self { Self::NotFound(format!("{} not found", entity)) }

    pub fn access_denied() -> Self { Self::Forbidden("access denied".into()) }

    pub fn db(e: impl std::fmt::Display) -> Self { Self::Internal(format!("database error: {}", e)) }

    /// Stable numeric code for external mapping/logging
    pub fn code(&self) -> u16 {
        match self {
            ServiceError::Validation(_) => 1001,
            ServiceError::Conflict(_) => 1002,
            ServiceError::NotFound(_) => 1003,
            ServiceError::Unauthenticated(_) => 1004,
            ServiceError::Forbidden(_) => 1005,
            ServiceError::Internal(_) => 1200,
        }
    }
}

impl From<models::errors::ModelError> for ServiceError {
    fn from(e: models::errors::ModelError) -> Self {
        match e {
            models::errors::ModelError::Validation(msg) => ServiceError::Validation(msg),
            models::errors::ModelError::Conflict(msg) => ServiceError::Conflict(msg),
            models::errors::ModelError::Db(msg) => ServiceError::Internal(format!("database error: {}", msg)),
        }
    }
}

impl From<sea_orm::DbErr> for ServiceError {
    fn from(e: sea_orm::DbErr) -> Self {
        models::errors::ModelError::from(e).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use models::errors::ModelError;

    #[test]
    fn model_validation_stays_validation() {
        let e: ServiceError = ModelError::Validation("invalid email".into()).into();
        assert!(matches!(e, ServiceError::Validation(ref m) if m == "invalid email"));
        assert_eq!(e.code(), 1001);
    }

    #[test]
    fn model_db_error_becomes_internal() {
        let e: ServiceError = ModelError::Db("connection reset".into()).into();
        assert!(matches!(e, ServiceError::Internal(_)));
    }
}

use sea_orm::DbErr;
use thiserror::Error;

/// Domain-terminal errors. None of these are retried here; they propagate to
/// the handler, which maps them onto HTTP statuses. Storage-level failures
/// ride along in `Db` and surface as 500s without being masked as domain
/// outcomes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No {0} with the given id was found")]
    NotFound(&'static str),
    #[error("The cart is empty")]
    EmptyCart,
    #[error("No profile exists for this principal")]
    UnknownPrincipal,
    #[error("Insufficient privilege for this operation")]
    Forbidden,
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Database error: {0}")]
    Db(#[from] DbErr),
}

impl StoreError {
    /// Stable machine-readable kind, independent of the human message.
    pub fn kind(&self) -> &'static str {
        match self {
            StoreError::NotFound(_) => "not_found",
            StoreError::EmptyCart => "empty_cart",
            StoreError::UnknownPrincipal => "unknown_principal",
            StoreError::Forbidden => "forbidden",
            StoreError::Validation(_) => "validation_error",
            StoreError::Conflict(_) => "conflict",
            StoreError::Db(_) => "internal",
        }
    }
}

pub mod admin;
pub mod public;
pub mod user;

use axum::{http::StatusCode, response::Response, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;

use crate::entities::user::Role;
use crate::events::EventProducers;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{logging_middleware, to_response, ApiError};
use crate::store::orders::Requestor;
use crate::store::StoreError;

use admin::admin_api_router;
use public::public_api_router;
use user::user_api_router;

pub fn create_api_router(
    shared_db: Arc<DatabaseConnection>,
    producers: EventProducers,
) -> Router {
    Router::new()
        .nest("/api", public_api_router(shared_db.clone()))
        .nest("/api", user_api_router(shared_db.clone(), producers))
        .nest("/api/admin", admin_api_router(shared_db.clone()))
        .layer(axum::middleware::from_fn(logging_middleware))
}

/// One mapping from the store taxonomy onto HTTP. Database failures keep
/// their detail in the log extension but reach the client as a plain 500.
pub(crate) fn store_error_response(err: StoreError) -> Response {
    let status = match &err {
        StoreError::NotFound(_) => StatusCode::NOT_FOUND,
        StoreError::EmptyCart => StatusCode::BAD_REQUEST,
        StoreError::UnknownPrincipal => StatusCode::FORBIDDEN,
        StoreError::Forbidden => StatusCode::FORBIDDEN,
        StoreError::Validation(_) => StatusCode::BAD_REQUEST,
        StoreError::Conflict(_) => StatusCode::CONFLICT,
        StoreError::Db(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let kind = err.kind();
    let (message, ext) = match &err {
        StoreError::Db(db_err) => (
            "Internal server error".to_owned(),
            ApiError::DbError(db_err.to_string()),
        ),
        other => (other.to_string(), ApiError::Domain(other.to_string())),
    };
    to_response(
        (
            status,
            Json(json!({
                "error": message,
                "kind": kind
            })),
        ),
        Err(ext),
    )
}

pub(crate) fn validation_error_response(err: validator::ValidationErrors) -> Response {
    let message = err.to_string();
    to_response(
        (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": message,
                "kind": "validation_error"
            })),
        ),
        Err(ApiError::ValidationFail(err.to_string())),
    )
}

pub(crate) fn internal_error_response(ext: ApiError) -> Response {
    to_response(
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": "Internal server error",
                "kind": "internal"
            })),
        ),
        Err(ext),
    )
}

/// The auth middleware validated the role string against the database, so a
/// parse failure here means a token minted before a role rename; treat it
/// as a plain user.
pub(crate) fn requestor_from_claims(claims: &Claims) -> Requestor {
    Requestor {
        user_id: claims.user_id,
        role: Role::from_str(&claims.role).unwrap_or(Role::User),
    }
}

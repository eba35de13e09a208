use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{internal_error_response, store_error_response};
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};
use crate::store::{identity, StoreError};

//ROUTERS
pub fn profile_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/profile", get(get_profile).patch(patch_profile))
        .layer(Extension(db))
}

//ROUTES
async fn get_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    match identity::resolve_profile(&*db, claims.user_id).await {
        Ok(Some(profile)) => to_response((StatusCode::OK, Json(profile)), Ok(())),
        Ok(None) => store_error_response(StoreError::NotFound("profile")),
        Err(err) => store_error_response(err),
    }
}

async fn patch_profile(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchProfilePayload>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let profile = match identity::resolve_profile(&txn, claims.user_id).await {
        Ok(Some(profile)) => profile,
        Ok(None) => return store_error_response(StoreError::NotFound("profile")),
        Err(err) => return store_error_response(err),
    };

    let mut profile: crate::entities::profile::ActiveModel = profile.into();
    if let Some(bio) = payload.bio {
        profile.bio = Set(Some(bio));
    }
    if let Some(phone) = payload.phone {
        profile.phone = Set(Some(phone));
    }
    if let Some(is_seller) = payload.is_seller {
        profile.is_seller = Set(is_seller);
    }

    match profile.update(&txn).await {
        Ok(updated) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::OK, Json(updated)), Ok(())),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(StoreError::Db(err))
        }
    }
}

//Structs
#[derive(Deserialize)]
struct PatchProfilePayload {
    bio: Option<String>,
    phone: Option<String>,
    is_seller: Option<bool>,
}

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use axum::{
    extract::Extension,
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use sea_orm::{DatabaseConnection, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::{internal_error_response, validation_error_response};
use crate::entities::user::{self, Entity as UserEntity, Role};
use crate::entities::profile;
use crate::middleware::auth::generate_token;
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn auth_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/register", post(register_user))
        .route("/login", post(login))
        .layer(Extension(db))
}

//ROUTES
/// Registration creates the login user and its marketplace profile in one
/// transaction; an order can be placed the moment the token arrives.
async fn register_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<RegisterPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(_) => return internal_error_response(ApiError::PasswordHashFailed),
    };

    let new_user = user::ActiveModel {
        username: Set(payload.username),
        password: Set(password),
        role: Set(Role::User),
        ..Default::default()
    };

    let user_id = match user::Entity::insert(new_user).exec(&txn).await {
        Ok(result) => result.last_insert_id,
        Err(_) => {
            let _ = txn.rollback().await;
            return to_response(
                (
                    StatusCode::CONFLICT,
                    Json(json!({
                        "error": "Username already exists",
                        "kind": "conflict"
                    })),
                ),
                Err(ApiError::Domain("Username already exists".to_owned())),
            );
        }
    };

    let new_profile = profile::ActiveModel {
        user_id: Set(user_id),
        bio: Set(payload.bio),
        phone: Set(payload.phone),
        is_seller: Set(payload.is_seller.unwrap_or(false)),
        ..Default::default()
    };

    match profile::Entity::insert(new_profile).exec(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "User registered successfully"
                    })),
                ),
                Ok(()),
            ),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            internal_error_response(ApiError::DbError(err.to_string()))
        }
    }
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<LoginPayload>,
) -> Response {
    let result = UserEntity::find()
        .filter(user::Column::Username.eq(&*payload.username))
        .one(&*db)
        .await;

    match result {
        Ok(Some(model)) => match model.check_hash(&payload.password) {
            Ok(()) => match generate_token(model.id, model.role.to_string()).await {
                Ok(token) => to_response(
                    (
                        StatusCode::OK,
                        Json(json!({
                            "token": token
                        })),
                    ),
                    Ok(()),
                ),
                Err(err) => {
                    internal_error_response(ApiError::TokenGenerationFailed(err.to_string()))
                }
            },
            Err(_) => to_response(
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({
                        "error": "Invalid username or password"
                    })),
                ),
                Err(ApiError::Domain("Invalid username or password".to_owned())),
            ),
        },
        Ok(None) => to_response(
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({
                    "error": "Invalid username or password"
                })),
            ),
            Err(ApiError::Domain("Invalid username or password".to_owned())),
        ),
        Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
    }
}

//utilities
fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

//Structs
#[derive(Deserialize, Validate, Clone, Debug)]
struct RegisterPayload {
    #[validate(length(min = 3, max = 64))]
    username: String,
    #[validate(length(min = 8, max = 128))]
    password: String,
    bio: Option<String>,
    phone: Option<String>,
    is_seller: Option<bool>,
}

#[derive(Deserialize, Clone)]
struct LoginPayload {
    username: String,
    password: String,
}

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, patch, post},
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::api::{internal_error_response, store_error_response, validation_error_response};
use crate::middleware::logging::{to_response, ApiError};
use crate::store::cart as cart_store;

//ROUTERS
pub fn cart_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/cart", post(create_cart))
        .route("/cart/:token", get(get_cart).delete(delete_cart))
        .route("/cart/:token/item", post(add_item))
        .route("/cart/:token/item/:id", patch(patch_item).delete(remove_item))
        .layer(Extension(db))
}

//ROUTES
async fn create_cart(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match cart_store::create_cart(&txn).await {
        Ok(cart) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::CREATED, Json(cart)), Ok(())),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn get_cart(
    Path(token): Path<Uuid>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match cart_store::load_cart(&*db, token).await {
        Ok(view) => to_response((StatusCode::OK, Json(view)), Ok(())),
        Err(err) => store_error_response(err),
    }
}

async fn delete_cart(
    Path(token): Path<Uuid>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match cart_store::delete_cart(&txn, token).await {
        Ok(()) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Resource deleted successfully"
                    })),
                ),
                Ok(()),
            ),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn add_item(
    Path(token): Path<Uuid>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<AddItemPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match cart_store::add_item(&txn, token, payload.post_id, payload.quantity).await {
        Ok(item) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::CREATED, Json(item)), Ok(())),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn patch_item(
    Path((token, id)): Path<(Uuid, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchItemPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match cart_store::update_item_quantity(&txn, token, id, payload.quantity).await {
        Ok(item) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::OK, Json(item)), Ok(())),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

async fn remove_item(
    Path((token, id)): Path<(Uuid, i32)>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match cart_store::remove_item(&txn, token, id).await {
        Ok(()) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Resource deleted successfully"
                    })),
                ),
                Ok(()),
            ),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

//Structs
#[derive(Deserialize, Validate, Debug)]
struct AddItemPayload {
    post_id: i32,
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}

#[derive(Deserialize, Validate)]
struct PatchItemPayload {
    #[validate(range(min = 1, message = "Quantity must be at least 1"))]
    quantity: i32,
}

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::{internal_error_response, store_error_response, validation_error_response};
use crate::entities::{category, category::Entity as CategoryEntity, post_category};
use crate::middleware::logging::{to_response, ApiError};
use crate::store::StoreError;

//ROUTERS
pub fn admin_category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/category", post(create_category))
        .route(
            "/category/:id",
            axum::routing::patch(patch_category).delete(delete_category),
        )
        .layer(Extension(db))
}

//ROUTES
async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CategoryPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let new_category = category::ActiveModel {
        title: Set(payload.title),
        ..Default::default()
    };

    match category::Entity::insert(new_category).exec(&txn).await {
        Ok(result) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::CREATED,
                    Json(json!({
                        "message": "Category created successfully",
                        "id": result.last_insert_id
                    })),
                ),
                Ok(()),
            ),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(_) => {
            let _ = txn.rollback().await;
            store_error_response(StoreError::Conflict("Category already exists".to_owned()))
        }
    }
}

async fn patch_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CategoryPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let found = match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("category"));
        }
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    };

    let mut found: category::ActiveModel = found.into();
    found.title = Set(payload.title);

    match found.update(&txn).await {
        Ok(_) => match txn.commit().await {
            Ok(_) => to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Resource patched successfully"
                    })),
                ),
                Ok(()),
            ),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(_) => {
            let _ = txn.rollback().await;
            store_error_response(StoreError::Conflict("Category already exists".to_owned()))
        }
    }
}

async fn delete_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let found = match CategoryEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("category"));
        }
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    };

    if let Err(err) = post_category::Entity::delete_many()
        .filter(post_category::Column::CategoryId.eq(id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return store_error_response(StoreError::Db(err));
    }

    let found: category::ActiveModel = found.into();
    match found.delete(&txn).await {
        Ok(_) => match txn.commit().await {
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
            store_error_response(StoreError::Db(err))
        }
    }
}

//Structs
#[derive(Deserialize, Validate, Clone, Debug)]
struct CategoryPayload {
    #[validate(length(min = 1, max = 255))]
    title: String,
}

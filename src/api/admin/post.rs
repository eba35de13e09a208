use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{patch, post as post_route},
    Json, Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::{internal_error_response, store_error_response, validation_error_response};
use crate::entities::{
    cart_item, post, post::Entity as PostEntity, post_category, profile,
};
use crate::middleware::logging::{to_response, ApiError};
use crate::store::{catalog, StoreError};

//ROUTERS
pub fn admin_post_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/post", post_route(create_post))
        .route("/post/:id", patch(patch_post).delete(delete_post))
        .layer(Extension(db))
}

//ROUTES
async fn create_post(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreatePostPayload>,
) -> Response {
    if let Err(err) = payload.validate() {
        return validation_error_response(err);
    }
    if payload.price < Decimal::ZERO {
        return store_error_response(StoreError::Validation(
            "Price must not be negative".to_owned(),
        ));
    }

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match profile::Entity::find_by_id(payload.profile_id).one(&txn).await {
        Ok(Some(_)) => {}
        Ok(None) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("profile"));
        }
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    }

    let now = Utc::now();
    let new_post = post::ActiveModel {
        title: Set(payload.title),
        description: Set(payload.description),
        delivery: Set(payload.delivery),
        pick_up: Set(payload.pick_up),
        price: Set(payload.price),
        ready_date_time: Set(payload.ready_date_time),
        servings_available: Set(payload.servings_available),
        location: Set(payload.location),
        latitude: Set(payload.latitude),
        longitude: Set(payload.longitude),
        last_update: Set(now),
        profile_id: Set(payload.profile_id),
        ..Default::default()
    };

    let post_id = match post::Entity::insert(new_post).exec(&txn).await {
        Ok(result) => result.last_insert_id,
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    };

    for category_id in payload.category_ids.unwrap_or_default() {
        let link = post_category::ActiveModel {
            post_id: Set(post_id),
            category_id: Set(category_id),
            ..Default::default()
        };
        if post_category::Entity::insert(link).exec(&txn).await.is_err() {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("category"));
        }
    }

    match txn.commit().await {
        Ok(_) => to_response(
            (
                StatusCode::CREATED,
                Json(json!({
                    "message": "Post created successfully",
                    "id": post_id
                })),
            ),
            Ok(()),
        ),
        Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
    }
}

async fn patch_post(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<PatchPostPayload>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    let found = match PostEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("post"));
        }
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    };

    let mut found: post::ActiveModel = found.into();

    if let Some(title) = payload.title {
        found.title = Set(title);
    }
    if let Some(description) = payload.description {
        found.description = Set(description);
    }
    if let Some(delivery) = payload.delivery {
        found.delivery = Set(delivery);
    }
    if let Some(pick_up) = payload.pick_up {
        found.pick_up = Set(pick_up);
    }
    if let Some(price) = payload.price {
        if price < Decimal::ZERO {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Validation(
                "Price must not be negative".to_owned(),
            ));
        }
        //Live price only: existing order items keep their snapshot.
        found.price = Set(price);
    }
    if let Some(ready_date_time) = payload.ready_date_time {
        found.ready_date_time = Set(ready_date_time);
    }
    if let Some(servings_available) = payload.servings_available {
        found.servings_available = Set(servings_available);
    }
    if let Some(location) = payload.location {
        found.location = Set(location);
    }
    if let Some(latitude) = payload.latitude {
        found.latitude = Set(latitude);
    }
    if let Some(longitude) = payload.longitude {
        found.longitude = Set(longitude);
    }
    found.last_update = Set(Utc::now());

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
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(StoreError::Db(err))
        }
    }
}

/// Deletion is refused while any order item references the listing; the
/// price snapshot in old orders must stay resolvable.
async fn delete_post(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match catalog::referenced_by_order(&txn, id).await {
        Ok(true) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Conflict(
                "Post cannot be deleted because it is referenced by an order".to_owned(),
            ));
        }
        Ok(false) => {}
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(err);
        }
    }

    let found = match PostEntity::find_by_id(id).one(&txn).await {
        Ok(Some(found)) => found,
        Ok(None) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::NotFound("post"));
        }
        Err(err) => {
            let _ = txn.rollback().await;
            return store_error_response(StoreError::Db(err));
        }
    };

    //Cart lines and category links referencing the listing go with it.
    if let Err(err) = cart_item::Entity::delete_many()
        .filter(cart_item::Column::PostId.eq(id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return store_error_response(StoreError::Db(err));
    }
    if let Err(err) = post_category::Entity::delete_many()
        .filter(post_category::Column::PostId.eq(id))
        .exec(&txn)
        .await
    {
        let _ = txn.rollback().await;
        return store_error_response(StoreError::Db(err));
    }

    let found: post::ActiveModel = found.into();
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
struct CreatePostPayload {
    #[validate(length(min = 1, max = 255))]
    title: String,
    description: String,
    delivery: bool,
    pick_up: bool,
    price: Decimal,
    ready_date_time: sea_orm::prelude::DateTimeUtc,
    #[validate(range(min = 0))]
    servings_available: i32,
    location: String,
    #[validate(range(min = -90.0, max = 90.0))]
    latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    longitude: f64,
    profile_id: i32,
    category_ids: Option<Vec<i32>>,
}

#[derive(Deserialize)]
struct PatchPostPayload {
    title: Option<String>,
    description: Option<String>,
    delivery: Option<bool>,
    pick_up: Option<bool>,
    price: Option<Decimal>,
    ready_date_time: Option<sea_orm::prelude::DateTimeUtc>,
    servings_available: Option<i32>,
    location: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

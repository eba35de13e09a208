use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait};
use serde::Serialize;
use std::sync::Arc;

use crate::api::store_error_response;
use crate::entities::{category, category::Entity as CategoryEntity, post};
use crate::middleware::logging::to_response;
use crate::store::StoreError;

//ROUTERS
pub fn category_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/category", get(get_categories))
        .route("/category/:id", get(get_category))
        .layer(Extension(db))
}

//ROUTES
async fn get_categories(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match CategoryEntity::find().all(&*db).await {
        Ok(categories) => to_response((StatusCode::OK, Json(categories)), Ok(())),
        Err(err) => store_error_response(StoreError::Db(err)),
    }
}

async fn get_category(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let found = match CategoryEntity::find_by_id(id).one(&*db).await {
        Ok(Some(found)) => found,
        Ok(None) => return store_error_response(StoreError::NotFound("category")),
        Err(err) => return store_error_response(StoreError::Db(err)),
    };

    match found.find_related(post::Entity).all(&*db).await {
        Ok(posts) => to_response(
            (
                StatusCode::OK,
                Json(CategoryResponse {
                    id: found.id,
                    title: found.title,
                    post_ids: posts.into_iter().map(|p| p.id).collect(),
                }),
            ),
            Ok(()),
        ),
        Err(err) => store_error_response(StoreError::Db(err)),
    }
}

//Structs
#[derive(Serialize)]
struct CategoryResponse {
    id: i32,
    title: String,
    post_ids: Vec<i32>,
}

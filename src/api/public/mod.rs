pub mod auth;
pub mod cart;
pub mod category;
pub mod post;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use auth::auth_router;
use cart::cart_router;
use category::category_router;
use post::post_router;

pub fn public_api_router(db: Arc<DatabaseConnection>) -> Router {
    let auth_router = auth_router(db.clone());
    let cart_router = cart_router(db.clone());
    let category_router = category_router(db.clone());
    let post_router = post_router(db.clone());

    Router::new()
        .merge(auth_router)
        .merge(cart_router)
        .merge(category_router)
        .merge(post_router)
}

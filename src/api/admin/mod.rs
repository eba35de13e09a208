pub mod category;
pub mod order;
pub mod post;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use category::admin_category_router;
use order::admin_order_router;
use post::admin_post_router;

use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};

pub fn admin_api_router(db: Arc<DatabaseConnection>) -> Router {
    let admin_category_router = admin_category_router(db.clone());
    let admin_order_router = admin_order_router(db.clone());
    let admin_post_router = admin_post_router(db.clone());

    Router::new()
        .merge(admin_category_router)
        .merge(admin_order_router)
        .merge(admin_post_router)
        .layer(from_fn_with_state(
            AuthState {
                db: db.clone(),
                role: Role::Admin,
            },
            auth_middleware,
        ))
}

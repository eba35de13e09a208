pub mod order;
pub mod profile;

use axum::{middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::entities::user::Role;
use crate::events::EventProducers;
use crate::middleware::auth::{auth_middleware, AuthState};
use order::order_router;
use profile::profile_router;

pub fn user_api_router(db: Arc<DatabaseConnection>, producers: EventProducers) -> Router {
    Router::new()
        .merge(order_router(db.clone(), producers))
        .merge(profile_router(db.clone()))
        .layer(from_fn_with_state(
            AuthState {
                db: db.clone(),
                role: Role::User,
            },
            auth_middleware,
        ))
}

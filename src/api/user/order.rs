use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::api::{requestor_from_claims, store_error_response};
use crate::events::EventProducers;
use crate::middleware::auth::Claims;
use crate::middleware::logging::to_response;
use crate::store::{checkout, orders};

//ROUTERS
pub fn order_router(db: Arc<DatabaseConnection>, producers: EventProducers) -> Router {
    Router::new()
        .route("/order", post(create_order).get(list_orders))
        .route("/order/:id", get(get_order))
        .layer(Extension(db))
        .layer(Extension(producers))
}

//ROUTES
/// Cart-to-order conversion. The engine owns the transaction; this handler
/// only maps the outcome.
async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Extension(producers): Extension<EventProducers>,
    Json(payload): Json<CreateOrderPayload>,
) -> Response {
    match checkout::convert(&db, payload.cart_token, claims.user_id, &producers).await {
        Ok(order) => to_response((StatusCode::CREATED, Json(order)), Ok(())),
        Err(err) => store_error_response(err),
    }
}

async fn list_orders(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let requestor = requestor_from_claims(&claims);
    match orders::list_orders(&*db, &requestor).await {
        Ok(views) => to_response((StatusCode::OK, Json(views)), Ok(())),
        Err(err) => store_error_response(err),
    }
}

async fn get_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
) -> Response {
    let requestor = requestor_from_claims(&claims);
    match orders::get_order(&*db, id, &requestor).await {
        Ok(view) => to_response((StatusCode::OK, Json(view)), Ok(())),
        Err(err) => store_error_response(err),
    }
}

//Structs
#[derive(Deserialize, Debug)]
struct CreateOrderPayload {
    cart_token: Uuid,
}

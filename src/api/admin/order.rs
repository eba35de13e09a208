use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::Response,
    routing::patch,
    Json, Router,
};
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::{internal_error_response, requestor_from_claims, store_error_response};
use crate::entities::order::PaymentStatus;
use crate::middleware::auth::Claims;
use crate::middleware::logging::{to_response, ApiError};
use crate::store::orders;

//ROUTERS
pub fn admin_order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/order/:id", patch(patch_order))
        .layer(Extension(db))
}

//ROUTES
/// Payment status is a passive field: no gateway, no transition graph, just
/// an admin writing one of the three values.
async fn patch_order(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PatchOrderPayload>,
) -> Response {
    let requestor = requestor_from_claims(&claims);

    let txn = match db.begin().await {
        Ok(txn) => txn,
        Err(_) => return internal_error_response(ApiError::TransactionCreationFailed),
    };

    match orders::set_payment_status(&txn, id, payload.payment_status, &requestor).await {
        Ok(updated) => match txn.commit().await {
            Ok(_) => to_response((StatusCode::OK, Json(updated)), Ok(())),
            Err(err) => internal_error_response(ApiError::DbError(err.to_string())),
        },
        Err(err) => {
            let _ = txn.rollback().await;
            store_error_response(err)
        }
    }
}

//Structs
#[derive(Deserialize, Debug)]
struct PatchOrderPayload {
    payment_status: PaymentStatus,
}

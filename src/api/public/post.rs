use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, QueryFilter, QueryOrder, QuerySelect,
    RelationTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::api::store_error_response;
use crate::entities::{post, post::Entity as PostEntity, post_category};
use crate::middleware::logging::to_response;
use crate::store::StoreError;

//ROUTERS
pub fn post_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route("/post", get(get_posts))
        .route("/post/:id", get(get_post))
        .layer(Extension(db))
}

//ROUTES
async fn get_posts(
    Query(params): Query<GetPostsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    let mut finder = PostEntity::find();

    //Filter zone
    if let Some(min) = params.min {
        finder = finder.filter(post::Column::Price.gte(min));
    }
    if let Some(max) = params.max {
        finder = finder.filter(post::Column::Price.lte(max));
    }
    if let Some(delivery) = params.delivery {
        finder = finder.filter(post::Column::Delivery.eq(delivery));
    }
    if let Some(pick_up) = params.pick_up {
        finder = finder.filter(post::Column::PickUp.eq(pick_up));
    }
    if let Some(category_id) = params.category_id {
        finder = finder
            .join(JoinType::InnerJoin, post::Relation::PostCategory.def())
            .filter(post_category::Column::CategoryId.eq(category_id));
    }
    if let (Some(lat), Some(lon), Some(radius_km)) = (params.lat, params.lon, params.radius_km) {
        let bbox = bounding_box(lat, lon, radius_km);
        finder = finder
            .filter(post::Column::Latitude.between(bbox.min_lat, bbox.max_lat))
            .filter(post::Column::Longitude.between(bbox.min_lon, bbox.max_lon));
    }

    //Sorting zone
    let order = match params.order.as_deref() {
        Some("desc") => sea_orm::Order::Desc,
        _ => sea_orm::Order::Asc,
    };
    let sort_column = match params.sort_by.as_deref() {
        Some("price") => post::Column::Price,
        Some("ready_date_time") => post::Column::ReadyDateTime,
        Some("last_update") => post::Column::LastUpdate,
        _ => post::Column::Title,
    };

    //Pagination zone
    let page: u64 = params.page.unwrap_or(1).max(1);
    let page_size: u64 = params.page_size.unwrap_or(10).clamp(1, 100);

    let result = finder
        .order_by(sort_column, order)
        .offset((page - 1) * page_size)
        .limit(page_size)
        .all(&*db)
        .await;

    match result {
        Ok(posts) => {
            let response: Vec<PublicPostResponse> =
                posts.into_iter().map(PublicPostResponse::new).collect();
            to_response((StatusCode::OK, Json(response)), Ok(()))
        }
        Err(err) => store_error_response(StoreError::Db(err)),
    }
}

async fn get_post(
    Path(id): Path<i32>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Response {
    match PostEntity::find_by_id(id).one(&*db).await {
        Ok(Some(found)) => to_response(
            (StatusCode::OK, Json(PublicPostResponse::new(found))),
            Ok(()),
        ),
        Ok(None) => store_error_response(StoreError::NotFound("post")),
        Err(err) => store_error_response(StoreError::Db(err)),
    }
}

//utilities
struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
}

//Pure box approximation, deliberately outside any cart/order logic. One
//degree of latitude is ~110.574 km; longitude degrees shrink with the
//cosine of the latitude.
fn bounding_box(lat: f64, lon: f64, radius_km: f64) -> BoundingBox {
    let lat_delta = radius_km / 110.574;
    let lon_scale = (111.320 * lat.to_radians().cos()).abs().max(f64::EPSILON);
    let lon_delta = radius_km / lon_scale;
    BoundingBox {
        min_lat: lat - lat_delta,
        max_lat: lat + lat_delta,
        min_lon: lon - lon_delta,
        max_lon: lon + lon_delta,
    }
}

//Structs
#[derive(Deserialize)]
struct GetPostsQuery {
    //filter zone
    min: Option<Decimal>,
    max: Option<Decimal>,
    delivery: Option<bool>,
    pick_up: Option<bool>,
    category_id: Option<i32>,
    lat: Option<f64>,
    lon: Option<f64>,
    radius_km: Option<f64>,
    //sort zone
    sort_by: Option<String>,
    order: Option<String>,
    //pagination
    page: Option<u64>,
    page_size: Option<u64>,
}

#[derive(Serialize)]
struct PublicPostResponse {
    id: i32,
    title: String,
    description: String,
    delivery: bool,
    pick_up: bool,
    price: Decimal,
    ready_date_time: sea_orm::prelude::DateTimeUtc,
    servings_available: i32,
    location: String,
    latitude: f64,
    longitude: f64,
    profile_id: i32,
}

impl PublicPostResponse {
    fn new(value: post::Model) -> PublicPostResponse {
        PublicPostResponse {
            id: value.id,
            title: value.title,
            description: value.description,
            delivery: value.delivery,
            pick_up: value.pick_up,
            price: value.price,
            ready_date_time: value.ready_date_time,
            servings_available: value.servings_available,
            location: value.location,
            latitude: value.latitude,
            longitude: value.longitude,
            profile_id: value.profile_id,
        }
    }
}

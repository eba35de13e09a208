use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use hungry_backend::api::create_api_router;
use hungry_backend::entities::{primary_setup, setup_schema};
use hungry_backend::events::{EventHandlers, EventHooks};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    dotenvy::dotenv().ok();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let db: DatabaseConnection = Database::connect(&database_url)
        .await
        .expect("Failed to connect to the database");
    setup_schema(&db).await;

    let shared_db = Arc::new(db);

    primary_setup(shared_db.clone()).await;

    let mut hooks = EventHooks::default();
    hooks.on_order_created(|event| {
        Box::pin(async move {
            info!(
                order_id = event.order_id,
                profile_id = event.profile_id,
                total = %event.total,
                "Order created"
            );
        })
    });
    let handlers = EventHandlers::new(32, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let app = create_api_router(shared_db, producers).layer(TraceLayer::new_for_http());

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_owned());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .expect("Failed to bind listener");
    info!("Running at {bind_addr}");
    axum::serve(listener, app).await.expect("Server error");
}

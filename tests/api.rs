use std::str::FromStr;
use std::sync::Arc;

use reqwest::StatusCode;
use rust_decimal::Decimal;
use sea_orm::{ConnectOptions, Database};
use serde_json::json;

use hungry_backend::api::create_api_router;
use hungry_backend::entities::{primary_setup, setup_schema};
use hungry_backend::events::EventProducers;

/// Boots the full router on an ephemeral port over a fresh in-memory
/// database, seeded exactly like a first production boot.
static INIT: std::sync::Once = std::sync::Once::new();

async fn spawn_server() -> String {
    INIT.call_once(|| std::env::set_var("SECRET", "integration-test-secret"));

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);
    let db = Database::connect(options)
        .await
        .expect("Failed to open in-memory database");
    setup_schema(&db).await;
    let shared_db = Arc::new(db);
    primary_setup(shared_db.clone()).await;

    let app = create_api_router(shared_db, EventProducers::default());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server died");
    });
    format!("http://{addr}")
}

async fn login(client: &reqwest::Client, base: &str, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{base}/api/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");
    assert_eq!(response.status(), StatusCode::OK);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login response JSON");
    body["token"]
        .as_str()
        .expect("Token not found in login response")
        .to_owned()
}

fn decimal(value: &serde_json::Value) -> Decimal {
    Decimal::from_str(value.as_str().expect("Expected a decimal string"))
        .expect("Failed to parse decimal")
}

async fn new_cart(client: &reqwest::Client, base: &str) -> String {
    let response = client
        .post(format!("{base}/api/cart"))
        .send()
        .await
        .expect("Failed to create cart");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse cart response JSON");
    body["token"].as_str().expect("Cart token missing").to_owned()
}

#[tokio::test]
async fn adding_the_same_post_twice_merges_into_one_line() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let token = new_cart(&client, &base).await;

    for quantity in [2, 3] {
        let response = client
            .post(format!("{base}/api/cart/{token}/item"))
            .json(&json!({ "post_id": 1, "quantity": quantity }))
            .send()
            .await
            .expect("Failed to add item");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let cart = client
        .get(format!("{base}/api/cart/{token}"))
        .send()
        .await
        .expect("Failed to read cart")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse cart JSON");

    let items = cart["items"].as_array().expect("Expected items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 5);
    //Seeded sourdough is 8.99; derived total follows the live price.
    assert_eq!(
        decimal(&cart["total_price"]),
        Decimal::from_str("44.95").unwrap()
    );
}

#[tokio::test]
async fn cart_add_rejects_bad_input() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let token = new_cart(&client, &base).await;

    let zero_quantity = client
        .post(format!("{base}/api/cart/{token}/item"))
        .json(&json!({ "post_id": 1, "quantity": 0 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(zero_quantity.status(), StatusCode::BAD_REQUEST);

    let unknown_post = client
        .post(format!("{base}/api/cart/{token}/item"))
        .json(&json!({ "post_id": 999, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(unknown_post.status(), StatusCode::NOT_FOUND);

    let unknown_cart = client
        .post(format!(
            "{base}/api/cart/00000000-0000-4000-8000-000000000000/item"
        ))
        .json(&json!({ "post_id": 1, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(unknown_cart.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn conversion_snapshots_the_price_at_checkout_time() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let user_token = login(&client, &base, "user", "Secret15").await;
    let admin_token = login(&client, &base, "admin", "Secret15").await;

    let cart = new_cart(&client, &base).await;
    let added = client
        .post(format!("{base}/api/cart/{cart}/item"))
        .json(&json!({ "post_id": 1, "quantity": 2 }))
        .send()
        .await
        .expect("Failed to add item");
    assert_eq!(added.status(), StatusCode::CREATED);

    //Price changes between add-to-cart and checkout; the order must carry
    //the checkout-time price.
    let repriced = client
        .patch(format!("{base}/api/admin/post/1"))
        .bearer_auth(&admin_token)
        .json(&json!({ "price": "10.50" }))
        .send()
        .await
        .expect("Failed to patch price");
    assert_eq!(repriced.status(), StatusCode::OK);

    let response = client
        .post(format!("{base}/api/order"))
        .bearer_auth(&user_token)
        .json(&json!({ "cart_token": cart }))
        .send()
        .await
        .expect("Failed to create order");
    assert_eq!(response.status(), StatusCode::CREATED);
    let order = response
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse order JSON");

    assert_eq!(order["payment_status"], "pending");
    let items = order["items"].as_array().expect("Expected items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(
        decimal(&items[0]["unit_price"]),
        Decimal::from_str("10.50").unwrap()
    );
    assert_eq!(decimal(&order["total"]), Decimal::from_str("21.00").unwrap());

    //The cart is gone and cannot convert a second time.
    let gone = client
        .get(format!("{base}/api/cart/{cart}"))
        .send()
        .await
        .expect("Failed to read cart");
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);

    let again = client
        .post(format!("{base}/api/order"))
        .bearer_auth(&user_token)
        .json(&json!({ "cart_token": cart }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(again.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn converting_an_empty_cart_is_a_bad_request() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let user_token = login(&client, &base, "user", "Secret15").await;
    let cart = new_cart(&client, &base).await;

    let response = client
        .post(format!("{base}/api/order"))
        .bearer_auth(&user_token)
        .json(&json!({ "cart_token": cart }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn orders_are_invisible_across_profiles() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let user_token = login(&client, &base, "user", "Secret15").await;
    let admin_token = login(&client, &base, "admin", "Secret15").await;

    let cart = new_cart(&client, &base).await;
    client
        .post(format!("{base}/api/cart/{cart}/item"))
        .json(&json!({ "post_id": 1, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add item");
    let order = client
        .post(format!("{base}/api/order"))
        .bearer_auth(&user_token)
        .json(&json!({ "cart_token": cart }))
        .send()
        .await
        .expect("Failed to create order")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse order JSON");
    let order_id = order["id"].as_i64().expect("Order id missing");

    let registered = client
        .post(format!("{base}/api/register"))
        .json(&json!({ "username": "intruder", "password": "Sneaky15pass" }))
        .send()
        .await
        .expect("Failed to register");
    assert_eq!(registered.status(), StatusCode::CREATED);
    let intruder_token = login(&client, &base, "intruder", "Sneaky15pass").await;

    let listed = client
        .get(format!("{base}/api/order"))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .expect("Failed to list orders")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse orders JSON");
    assert_eq!(listed.as_array().expect("Expected array").len(), 0);

    //A foreign order reads exactly like a missing one.
    let hidden = client
        .get(format!("{base}/api/order/{order_id}"))
        .bearer_auth(&intruder_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(hidden.status(), StatusCode::NOT_FOUND);

    let all = client
        .get(format!("{base}/api/order"))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("Failed to list orders")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse orders JSON");
    assert_eq!(all.as_array().expect("Expected array").len(), 1);

    let mine = client
        .get(format!("{base}/api/order/{order_id}"))
        .bearer_auth(&user_token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(mine.status(), StatusCode::OK);
}

#[tokio::test]
async fn payment_status_requires_the_admin_role() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();
    let user_token = login(&client, &base, "user", "Secret15").await;
    let admin_token = login(&client, &base, "admin", "Secret15").await;

    let cart = new_cart(&client, &base).await;
    client
        .post(format!("{base}/api/cart/{cart}/item"))
        .json(&json!({ "post_id": 1, "quantity": 1 }))
        .send()
        .await
        .expect("Failed to add item");
    let order = client
        .post(format!("{base}/api/order"))
        .bearer_auth(&user_token)
        .json(&json!({ "cart_token": cart }))
        .send()
        .await
        .expect("Failed to create order")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse order JSON");
    let order_id = order["id"].as_i64().expect("Order id missing");

    let denied = client
        .patch(format!("{base}/api/admin/order/{order_id}"))
        .bearer_auth(&user_token)
        .json(&json!({ "payment_status": "complete" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let updated = client
        .patch(format!("{base}/api/admin/order/{order_id}"))
        .bearer_auth(&admin_token)
        .json(&json!({ "payment_status": "complete" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(updated.status(), StatusCode::OK);
    let body = updated
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse order JSON");
    assert_eq!(body["payment_status"], "complete");

    let missing = client
        .patch(format!("{base}/api/admin/order/999"))
        .bearer_auth(&admin_token)
        .json(&json!({ "payment_status": "failed" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn order_endpoints_need_a_bearer_token() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{base}/api/order"))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

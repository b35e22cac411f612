use reqwest::StatusCode;
use serde_json::json;

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = stockroom_api::app::build_app();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(
    client: &reqwest::Client,
    base_url: &str,
    name: &str,
    price: i64,
    quantity: i64,
) -> serde_json::Value {
    let res = client
        .post(format!("{}/products", base_url))
        .json(&json!({
            "name": name,
            "description": format!("{} description", name),
            "price": price,
            "quantity": quantity,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

async fn product_quantity(
    client: &reqwest::Client,
    base_url: &str,
    id: &str,
) -> u64 {
    let res = client
        .get(format!("{}/products/{}", base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    body["quantity"].as_u64().unwrap()
}

#[tokio::test]
async fn health_endpoint_responds() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/health", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn product_crud_lifecycle() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let created = create_product(&client, &srv.base_url, "Keyboard", 7500, 10).await;
    let id = created["id"].as_str().unwrap();
    assert_eq!(created["price"], 7500);
    assert_eq!(created["quantity"], 10);

    // Partial update touches only the supplied field.
    let res = client
        .put(format!("{}/products/{}", srv.base_url, id))
        .json(&json!({"price": 8000}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let updated: serde_json::Value = res.json().await.unwrap();
    assert_eq!(updated["price"], 8000);
    assert_eq!(updated["name"], "Keyboard");
    assert_eq!(updated["quantity"], 10);

    let res = client
        .get(format!("{}/products", srv.base_url))
        .send()
        .await
        .unwrap();
    let listed: serde_json::Value = res.json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let res = client
        .delete(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/products/{}", srv.base_url, id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_price_is_rejected_with_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/products", srv.base_url))
        .json(&json!({"name": "Mouse", "price": -1, "quantity": 5}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn malformed_product_id_is_rejected_with_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/products/not-a-uuid", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

// Scenario: order two keyboards and one mouse; the response carries the
// derived total and both stocks are decremented.
#[tokio::test]
async fn create_order_decrements_stock_and_returns_total() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let keyboard = create_product(&client, &srv.base_url, "Keyboard", 7500, 10).await;
    let mouse = create_product(&client, &srv.base_url, "Mouse", 3000, 5).await;
    let keyboard_id = keyboard["id"].as_str().unwrap();
    let mouse_id = mouse["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [
            {"product_id": keyboard_id, "quantity": 2},
            {"product_id": mouse_id, "quantity": 1},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let created: serde_json::Value = res.json().await.unwrap();
    assert_eq!(created["total"], 2 * 7500 + 3000);

    assert_eq!(product_quantity(&client, &srv.base_url, keyboard_id).await, 8);
    assert_eq!(product_quantity(&client, &srv.base_url, mouse_id).await, 4);

    // The stored order carries line snapshots in request order.
    let order_id = created["id"].as_str().unwrap();
    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let order: serde_json::Value = res.json().await.unwrap();
    assert_eq!(order["status"], "pending");
    let items = order["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["product_id"], keyboard_id);
    assert_eq!(items[0]["price"], 7500);
    assert_eq!(items[1]["product_id"], mouse_id);
    assert_eq!(items[1]["price"], 3000);
}

// Scenario: out-of-stock product; 400 names the product, nothing changes.
#[tokio::test]
async fn out_of_stock_order_is_rejected_without_mutation() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let gone = create_product(&client, &srv.base_url, "Sold out", 1000, 0).await;
    let gone_id = gone["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [{"product_id": gone_id, "quantity": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "insufficient_stock");
    assert!(body["message"].as_str().unwrap().contains(gone_id));

    assert_eq!(product_quantity(&client, &srv.base_url, gone_id).await, 0);
}

// Scenario: unknown product in the second line; the first line's decrement
// is rolled back and no order is persisted.
#[tokio::test]
async fn unknown_product_mid_order_rolls_back_earlier_lines() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let keyboard = create_product(&client, &srv.base_url, "Keyboard", 7500, 10).await;
    let keyboard_id = keyboard["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [
            {"product_id": keyboard_id, "quantity": 2},
            {"product_id": uuid::Uuid::now_v7().to_string(), "quantity": 1},
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    assert_eq!(product_quantity(&client, &srv.base_url, keyboard_id).await, 10);

    let res = client
        .get(format!("{}/orders", srv.base_url))
        .send()
        .await
        .unwrap();
    let orders: serde_json::Value = res.json().await.unwrap();
    assert!(orders.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn empty_order_is_rejected_with_400() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": []}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_update_is_validated_and_idempotent() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mouse = create_product(&client, &srv.base_url, "Mouse", 3000, 5).await;
    let mouse_id = mouse["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [{"product_id": mouse_id, "quantity": 1}]}))
        .send()
        .await
        .unwrap();
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();

    // Unknown status value is a 400.
    let res = client
        .patch(format!("{}/orders/{}", srv.base_url, order_id))
        .json(&json!({"status": "shipped"}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Setting the same valid status twice yields the same order state.
    let mut seen = Vec::new();
    for _ in 0..2 {
        let res = client
            .patch(format!("{}/orders/{}", srv.base_url, order_id))
            .json(&json!({"status": "completed"}))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        seen.push(res.json::<serde_json::Value>().await.unwrap());
    }
    assert_eq!(seen[0], seen[1]);
    assert_eq!(seen[1]["status"], "completed");

    // A status update never touches the derived total.
    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["total"], 3000);
    assert_eq!(fetched["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_a_referenced_product_is_a_conflict() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mouse = create_product(&client, &srv.base_url, "Mouse", 3000, 5).await;
    let mouse_id = mouse["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [{"product_id": mouse_id, "quantity": 1}]}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = client
        .delete(format!("{}/products/{}", srv.base_url, mouse_id))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // The product survives the rejected delete.
    assert_eq!(product_quantity(&client, &srv.base_url, mouse_id).await, 4);
}

#[tokio::test]
async fn price_change_after_order_keeps_line_snapshot() {
    let srv = TestServer::spawn().await;
    let client = reqwest::Client::new();

    let mouse = create_product(&client, &srv.base_url, "Mouse", 3000, 5).await;
    let mouse_id = mouse["id"].as_str().unwrap();

    let res = client
        .post(format!("{}/orders", srv.base_url))
        .json(&json!({"items": [{"product_id": mouse_id, "quantity": 1}]}))
        .send()
        .await
        .unwrap();
    let order: serde_json::Value = res.json().await.unwrap();
    let order_id = order["id"].as_str().unwrap();

    let res = client
        .put(format!("{}/products/{}", srv.base_url, mouse_id))
        .json(&json!({"price": 9999}))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .get(format!("{}/orders/{}", srv.base_url, order_id))
        .send()
        .await
        .unwrap();
    let fetched: serde_json::Value = res.json().await.unwrap();
    assert_eq!(fetched["items"][0]["price"], 3000);
    assert_eq!(fetched["total"], 3000);
}

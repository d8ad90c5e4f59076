mod common;

use common::TestApp;
use serde_json::json;

async fn setup_partner_and_product(app: &TestApp) -> (String, String) {
    let response = app
        .post("/partners", &json!({ "name": "Orders Kft", "currency": "EUR" }))
        .await;
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/products",
            &json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
        )
        .await;
    let product: serde_json::Value = response.json().await.unwrap();
    let product_id = product["product_id"].as_str().unwrap().to_string();

    (partner_id, product_id)
}

fn num(value: &serde_json::Value) -> f64 {
    value.as_str().map(|s| s.parse().unwrap()).unwrap_or_else(|| value.as_f64().unwrap())
}

#[tokio::test]
async fn order_defaults_unit_price_to_sales_price() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, product_id) = setup_partner_and_product(&app).await;

    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "items": [
                    { "product_id": product_id, "quantity": 2 },
                    { "product_id": product_id, "quantity": 1, "unit_price": "750" }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let order: serde_json::Value = response.json().await.unwrap();

    assert_eq!(order["status"], "new");
    assert_eq!(num(&order["items"][0]["unit_price"]), 1000.0);
    assert_eq!(num(&order["items"][1]["unit_price"]), 750.0);
    assert_eq!(num(&order["total_amount"]), 2750.0);
}

#[tokio::test]
async fn order_requires_at_least_one_item() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, _) = setup_partner_and_product(&app).await;

    let response = app
        .post("/orders", &json!({ "partner_id": partner_id, "items": [] }))
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn order_status_follows_allowed_transitions() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, product_id) = setup_partner_and_product(&app).await;

    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    let order: serde_json::Value = response.json().await.unwrap();
    let order_id = order["order_id"].as_str().unwrap().to_string();

    // new -> shipped skips confirmation and is rejected
    let response = app
        .put(&format!("/orders/{}", order_id), &json!({ "status": "shipped" }))
        .await;
    assert_eq!(response.status(), 400);

    let response = app
        .put(&format!("/orders/{}", order_id), &json!({ "status": "confirmed" }))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .put(&format!("/orders/{}", order_id), &json!({ "status": "shipped" }))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .put(&format!("/orders/{}", order_id), &json!({ "status": "closed" }))
        .await;
    assert_eq!(response.status(), 200);

    // closed is terminal
    let response = app
        .request(
            reqwest::Method::POST,
            &format!("/orders/{}/cancel", order_id),
            Some(&json!({})),
            "admin",
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn only_admins_cancel_orders() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, product_id) = setup_partner_and_product(&app).await;

    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    let order: serde_json::Value = response.json().await.unwrap();
    let order_id = order["order_id"].as_str().unwrap().to_string();

    let response = app
        .post(&format!("/orders/{}/cancel", order_id), &json!({}))
        .await;
    assert_eq!(response.status(), 403);

    let response = app
        .request(
            reqwest::Method::POST,
            &format!("/orders/{}/cancel", order_id),
            Some(&json!({})),
            "admin",
        )
        .await;
    assert_eq!(response.status(), 200);
    let cancelled: serde_json::Value = response.json().await.unwrap();
    assert_eq!(cancelled["status"], "cancelled");
}

#[tokio::test]
async fn accepted_quote_can_become_an_order() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, product_id) = setup_partner_and_product(&app).await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    let quote: serde_json::Value = response.json().await.unwrap();
    let quote_id = quote["quote_id"].as_str().unwrap().to_string();

    // A draft quote cannot back an order.
    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "quote_id": quote_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    app.post(&format!("/quotes/{}/send", quote_id), &json!({})).await;
    app.post(&format!("/quotes/{}/accept", quote_id), &json!({})).await;

    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "quote_id": quote_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let order: serde_json::Value = response.json().await.unwrap();
    assert_eq!(order["quote_id"].as_str().unwrap(), quote_id);
}

#[tokio::test]
async fn inactive_partner_cannot_order() {
    let Some(app) = common::spawn_app().await else {
        return;
    };
    let (partner_id, product_id) = setup_partner_and_product(&app).await;

    let response = app.delete(&format!("/partners/{}", partner_id)).await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            "/orders",
            &json!({
                "partner_id": partner_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

mod common;

use common::TestApp;
use serde_json::json;

async fn create_partner(app: &TestApp, name: &str) -> String {
    let response = app
        .post("/partners", &json!({ "name": name, "currency": "EUR" }))
        .await;
    assert_eq!(response.status(), 201);
    let partner: serde_json::Value = response.json().await.unwrap();
    partner["partner_id"].as_str().unwrap().to_string()
}

async fn create_product(app: &TestApp, body: serde_json::Value) -> String {
    let response = app.post("/products", &body).await;
    assert_eq!(response.status(), 201);
    let product: serde_json::Value = response.json().await.unwrap();
    product["product_id"].as_str().unwrap().to_string()
}

fn num(value: &serde_json::Value) -> f64 {
    value.as_str().map(|s| s.parse().unwrap()).unwrap_or_else(|| value.as_f64().unwrap())
}

#[tokio::test]
async fn percentage_discount_prices_the_line() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Percentage Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 3,
                    "discount": { "kind": "custom_percentage", "percentage": "10" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();

    let item = &quote["items"][0];
    assert_eq!(num(&item["unit_price"]), 900.0);
    assert_eq!(num(&item["total_price"]), 2700.0);
    assert_eq!(num(&item["discount"]["discount_amount"]), 300.0);
    assert_eq!(item["discount"]["kind"], "custom_percentage");

    assert_eq!(num(&quote["item_total"]), 3000.0);
    assert_eq!(num(&quote["total_item_discounts"]), 300.0);
    assert_eq!(num(&quote["total_amount"]), 2700.0);
}

#[tokio::test]
async fn volume_tier_picks_highest_qualifying_threshold() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Tiered Kft").await;
    let product_id = create_product(
        &app,
        json!({
            "name": "Gadget",
            "sales_price": "1000",
            "currency": "EUR",
            "tier1_qty": 3, "tier1_price": "950",
            "tier2_qty": 5, "tier2_price": "900",
            "tier3_qty": 10, "tier3_price": "850"
        }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 5,
                    "discount": { "kind": "volume_tier" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();

    let item = &quote["items"][0];
    assert_eq!(num(&item["unit_price"]), 900.0);
    assert_eq!(num(&item["total_price"]), 4500.0);
    assert_eq!(num(&item["discount"]["discount_amount"]), 500.0);
    assert_eq!(item["discount"]["tier_qty"], 5);
}

#[tokio::test]
async fn partner_price_falls_back_to_list_price() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Fallback Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Sprocket", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    // No override configured, so the list price applies.
    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 2,
                    "discount": { "kind": "partner_price" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();
    let item = &quote["items"][0];
    assert_eq!(num(&item["unit_price"]), 1000.0);
    assert_eq!(item["discount"]["kind"], "list_price");

    // Configure the override and re-quote.
    let response = app
        .put(
            &format!("/partners/{}/prices", partner_id),
            &json!({ "product_id": product_id, "price": "800" }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 2,
                    "discount": { "kind": "partner_price" }
                }]
            }),
        )
        .await;
    let quote: serde_json::Value = response.json().await.unwrap();
    let item = &quote["items"][0];
    assert_eq!(num(&item["unit_price"]), 800.0);
    assert_eq!(item["discount"]["kind"], "partner_price");
    assert_eq!(num(&item["discount"]["discount_amount"]), 400.0);
}

#[tokio::test]
async fn header_percentage_applies_after_line_discounts() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Header Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "discount_percentage": "10",
                "items": [{
                    "product_id": product_id,
                    "quantity": 3,
                    "discount": { "kind": "custom_percentage", "percentage": "10" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();

    // (3000 - 300) * 0.9
    assert_eq!(num(&quote["total_amount"]), 2430.0);
}

#[tokio::test]
async fn explicit_null_clears_the_header_discount() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Clearable Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "discount_percentage": "10",
                "items": [{ "product_id": product_id, "quantity": 3 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();
    let quote_id = quote["quote_id"].as_str().unwrap().to_string();
    assert_eq!(num(&quote["total_amount"]), 2700.0);

    // Leaving the field out keeps the stored discount.
    let response = app
        .put(&format!("/quotes/{}", quote_id), &json!({ "notes": "rev 2" }))
        .await;
    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(num(&updated["discount_percentage"]), 10.0);
    assert_eq!(num(&updated["total_amount"]), 2700.0);

    // An explicit null removes it and the totals revert.
    let response = app
        .put(
            &format!("/quotes/{}", quote_id),
            &json!({ "discount_percentage": null }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let cleared: serde_json::Value = response.json().await.unwrap();
    assert!(cleared["discount_percentage"].is_null());
    assert_eq!(num(&cleared["total_amount"]), 3000.0);
}

#[tokio::test]
async fn amount_discount_cannot_reach_the_line_value() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Clamp Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Cheap", "sales_price": "100", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 1,
                    "discount": { "kind": "custom_amount", "amount": "250" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // An amount below the line value is fine.
    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 2,
                    "discount": { "kind": "custom_amount", "amount": "50" }
                }]
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();
    let item = &quote["items"][0];
    assert_eq!(num(&item["unit_price"]), 75.0);
    assert_eq!(num(&quote["total_amount"]), 150.0);
}

#[tokio::test]
async fn invalid_line_rejects_the_whole_quote() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Atomic Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [
                    { "product_id": product_id, "quantity": 1 },
                    {
                        "product_id": product_id,
                        "quantity": 1,
                        "discount": { "kind": "custom_percentage", "percentage": "150" }
                    }
                ]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // Nothing was persisted.
    let response = app.get(&format!("/quotes?partner_id={}", partner_id)).await;
    let quotes: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(quotes.is_empty());
}

#[tokio::test]
async fn line_mutations_keep_totals_consistent() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Mutation Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{
                    "product_id": product_id,
                    "quantity": 3,
                    "discount": { "kind": "custom_percentage", "percentage": "10" }
                }]
            }),
        )
        .await;
    let quote: serde_json::Value = response.json().await.unwrap();
    let quote_id = quote["quote_id"].as_str().unwrap().to_string();
    let item_id = quote["items"][0]["quote_item_id"].as_str().unwrap().to_string();
    assert_eq!(num(&quote["total_amount"]), 2700.0);

    // Add an undiscounted line.
    let response = app
        .post(
            &format!("/quotes/{}/items", quote_id),
            &json!({ "product_id": product_id, "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let quote: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quote["items"].as_array().unwrap().len(), 2);
    assert_eq!(num(&quote["total_amount"]), 3700.0);

    // Remove the discounted line; its discount row disappears with it.
    let response = app
        .delete(&format!("/quotes/{}/items/{}", quote_id, item_id))
        .await;
    assert_eq!(response.status(), 200);
    let quote: serde_json::Value = response.json().await.unwrap();
    assert_eq!(quote["items"].as_array().unwrap().len(), 1);
    assert_eq!(num(&quote["total_amount"]), 1000.0);
    assert_eq!(num(&quote["total_item_discounts"]), 0.0);
}

#[tokio::test]
async fn sent_quotes_are_immutable() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Lifecycle Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Widget", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

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

    let response = app
        .post(&format!("/quotes/{}/send", quote_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);

    // Line mutations are rejected once sent.
    let response = app
        .post(
            &format!("/quotes/{}/items", quote_id),
            &json!({ "product_id": product_id, "quantity": 1 }),
        )
        .await;
    assert_eq!(response.status(), 400);

    // accept is allowed from sent; declining afterwards is not.
    let response = app
        .post(&format!("/quotes/{}/accept", quote_id), &json!({}))
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(&format!("/quotes/{}/decline", quote_id), &json!({}))
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn inactive_product_cannot_be_quoted() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let partner_id = create_partner(&app, "Inactive Kft").await;
    let product_id = create_product(
        &app,
        json!({ "name": "Retired", "sales_price": "1000", "currency": "EUR" }),
    )
    .await;

    let response = app
        .put(
            &format!("/products/{}", product_id),
            &json!({ "active": false }),
        )
        .await;
    assert_eq!(response.status(), 200);

    let response = app
        .post(
            "/quotes",
            &json!({
                "partner_id": partner_id,
                "items": [{ "product_id": product_id, "quantity": 1 }]
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

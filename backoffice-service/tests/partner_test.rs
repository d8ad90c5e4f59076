mod common;

use serde_json::json;

#[tokio::test]
async fn partner_crud_lifecycle() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    // Create
    let response = app
        .post(
            "/partners",
            &json!({
                "name": "Acme Kft",
                "currency": "EUR",
                "email": "office@acme.example",
                "city": "Budapest"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap().to_string();
    assert_eq!(partner["name"], "Acme Kft");
    assert_eq!(partner["active"], true);

    // Get
    let response = app.get(&format!("/partners/{}", partner_id)).await;
    assert_eq!(response.status(), 200);

    // Update leaves absent fields unchanged
    let response = app
        .put(
            &format!("/partners/{}", partner_id),
            &json!({ "phone": "+36 1 234 5678" }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let updated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(updated["phone"], "+36 1 234 5678");
    assert_eq!(updated["city"], "Budapest");

    // Deactivate is a soft delete
    let response = app.delete(&format!("/partners/{}", partner_id)).await;
    assert_eq!(response.status(), 200);
    let deactivated: serde_json::Value = response.json().await.unwrap();
    assert_eq!(deactivated["active"], false);

    // Deactivating again succeeds without touching the record
    let response = app.delete(&format!("/partners/{}", partner_id)).await;
    assert_eq!(response.status(), 200);
    let again: serde_json::Value = response.json().await.unwrap();
    assert_eq!(again["active"], false);
    assert_eq!(again["modified_utc"], deactivated["modified_utc"]);

    // The record is still readable
    let response = app.get(&format!("/partners/{}", partner_id)).await;
    assert_eq!(response.status(), 200);

    // but hidden from the default listing
    let response = app.get("/partners?search=acme").await;
    let listed: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(listed.iter().all(|p| p["partner_id"] != partner_id.as_str()));

    let response = app.get("/partners?search=acme&include_inactive=true").await;
    let listed: Vec<serde_json::Value> = response.json().await.unwrap();
    assert!(listed.iter().any(|p| p["partner_id"] == partner_id.as_str()));
}

#[tokio::test]
async fn listing_pages_through_all_partners() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    for i in 0..5 {
        let response = app
            .post(
                "/partners",
                &json!({ "name": format!("Partner {}", i), "currency": "EUR" }),
            )
            .await;
        assert_eq!(response.status(), 201);
    }

    let mut seen = Vec::new();
    let mut page_token: Option<String> = None;
    loop {
        let path = match &page_token {
            Some(token) => format!("/partners?page_size=2&page_token={}", token),
            None => "/partners?page_size=2".to_string(),
        };
        let response = app.get(&path).await;
        assert_eq!(response.status(), 200);
        let page: Vec<serde_json::Value> = response.json().await.unwrap();
        assert!(page.len() <= 2);
        if page.is_empty() {
            break;
        }
        for partner in &page {
            seen.push(partner["partner_id"].as_str().unwrap().to_string());
        }
        page_token = Some(seen.last().unwrap().clone());
    }

    assert_eq!(seen.len(), 5);
    let mut deduped = seen.clone();
    deduped.sort();
    deduped.dedup();
    assert_eq!(deduped.len(), 5, "pages must not overlap");
}

#[tokio::test]
async fn create_partner_rejects_invalid_input() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .post("/partners", &json!({ "name": "", "currency": "EUR" }))
        .await;
    assert_eq!(response.status(), 422);

    let response = app
        .post("/partners", &json!({ "name": "Acme", "currency": "EURO" }))
        .await;
    assert_eq!(response.status(), 422);
}

#[tokio::test]
async fn viewer_cannot_mutate() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .request(
            reqwest::Method::POST,
            "/partners",
            Some(&json!({ "name": "Acme", "currency": "EUR" })),
            "viewer",
        )
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn missing_identity_headers_are_unauthorized() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .client
        .get(app.api("/partners"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn editor_cannot_deactivate() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .post("/partners", &json!({ "name": "Acme", "currency": "EUR" }))
        .await;
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap();

    let response = app
        .request(
            reqwest::Method::DELETE,
            &format!("/partners/{}", partner_id),
            None,
            "editor",
        )
        .await;
    assert_eq!(response.status(), 403);
}

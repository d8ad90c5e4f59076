mod common;

use serde_json::json;

#[tokio::test]
async fn outbound_email_is_logged_with_sent_status() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .post("/partners", &json!({ "name": "Comms Kft", "currency": "EUR" }))
        .await;
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/contacts",
            &json!({
                "partner_id": partner_id,
                "first_name": "Anna",
                "last_name": "Kovacs",
                "email": "anna@comms.example"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let contact: serde_json::Value = response.json().await.unwrap();
    let contact_id = contact["contact_id"].as_str().unwrap().to_string();

    // SMTP is disabled in tests, so the mock transport reports success.
    let response = app
        .post(
            "/communications",
            &json!({
                "partner_id": partner_id,
                "contact_id": contact_id,
                "channel": "email",
                "direction": "outbound",
                "subject": "Your quote",
                "body": "Please find the quote attached.",
                "send_email": true
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let communication: serde_json::Value = response.json().await.unwrap();
    assert_eq!(communication["status"], "sent");
    assert!(communication["sent_utc"].is_string());
}

#[tokio::test]
async fn sending_requires_a_contact_email() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .post("/partners", &json!({ "name": "NoEmail Kft", "currency": "EUR" }))
        .await;
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/communications",
            &json!({
                "partner_id": partner_id,
                "channel": "email",
                "direction": "outbound",
                "subject": "Hello",
                "send_email": true
            }),
        )
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn phone_calls_are_logged_without_delivery() {
    let Some(app) = common::spawn_app().await else {
        return;
    };

    let response = app
        .post("/partners", &json!({ "name": "Phone Kft", "currency": "EUR" }))
        .await;
    let partner: serde_json::Value = response.json().await.unwrap();
    let partner_id = partner["partner_id"].as_str().unwrap().to_string();

    let response = app
        .post(
            "/communications",
            &json!({
                "partner_id": partner_id,
                "channel": "phone",
                "direction": "inbound",
                "subject": "Delivery question"
            }),
        )
        .await;
    assert_eq!(response.status(), 201);
    let communication: serde_json::Value = response.json().await.unwrap();
    assert_eq!(communication["status"], "logged");
    assert!(communication["sent_utc"].is_null());

    let response = app
        .get(&format!("/communications?partner_id={}", partner_id))
        .await;
    let listed: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(listed.len(), 1);
}

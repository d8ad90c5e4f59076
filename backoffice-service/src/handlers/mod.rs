//! HTTP handlers. All business routes live under `/api/v1` and require the
//! caller identity headers; `/health`, `/ready`, and `/metrics` are open.

mod communications;
mod contacts;
mod documents;
mod orders;
mod partners;
mod products;
mod quotes;
mod resources;
mod sites;
mod tasks;

use crate::startup::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Router,
};
use serde_json::json;

pub fn api_router(state: AppState) -> Router {
    let api = Router::new()
        // Partners
        .route("/partners", post(partners::create).get(partners::list))
        .route(
            "/partners/:partner_id",
            get(partners::get).put(partners::update).delete(partners::deactivate),
        )
        .route(
            "/partners/:partner_id/prices",
            put(products::set_partner_price),
        )
        .route(
            "/partners/:partner_id/prices/:product_id",
            delete(products::delete_partner_price),
        )
        // Contacts
        .route("/contacts", post(contacts::create).get(contacts::list))
        .route(
            "/contacts/:contact_id",
            get(contacts::get).put(contacts::update).delete(contacts::remove),
        )
        // Sites
        .route("/sites", post(sites::create).get(sites::list))
        .route(
            "/sites/:site_id",
            get(sites::get).put(sites::update).delete(sites::deactivate),
        )
        // Product prices and VAT types
        .route("/products", post(products::create).get(products::list))
        .route(
            "/products/:product_id",
            get(products::get).put(products::update),
        )
        .route("/vat-types", post(products::create_vat_type).get(products::list_vat_types))
        .route(
            "/vat-types/:vat_type_id",
            put(products::update_vat_type).delete(products::delete_vat_type),
        )
        // Quotes
        .route("/quotes", post(quotes::create).get(quotes::list))
        .route(
            "/quotes/:quote_id",
            get(quotes::get).put(quotes::update).delete(quotes::remove),
        )
        .route("/quotes/:quote_id/items", post(quotes::add_item))
        .route(
            "/quotes/:quote_id/items/:quote_item_id",
            put(quotes::update_item).delete(quotes::remove_item),
        )
        .route("/quotes/:quote_id/send", post(quotes::send))
        .route("/quotes/:quote_id/accept", post(quotes::accept))
        .route("/quotes/:quote_id/decline", post(quotes::decline))
        // Orders
        .route("/orders", post(orders::create).get(orders::list))
        .route("/orders/:order_id", get(orders::get).put(orders::update))
        .route("/orders/:order_id/cancel", post(orders::cancel))
        // Documents
        .route("/documents", post(documents::create).get(documents::list))
        .route(
            "/documents/:document_id",
            get(documents::get).put(documents::update).delete(documents::remove),
        )
        // Resources
        .route("/resources", post(resources::create).get(resources::list))
        .route(
            "/resources/:resource_id",
            get(resources::get).put(resources::update).delete(resources::remove),
        )
        // Tasks
        .route("/tasks", post(tasks::create).get(tasks::list))
        .route(
            "/tasks/:task_id",
            get(tasks::get).put(tasks::update).delete(tasks::remove),
        )
        // Communications
        .route(
            "/communications",
            post(communications::create).get(communications::list),
        )
        .route("/communications/:communication_id", get(communications::get));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/metrics", get(metrics))
        .nest("/api/v1", api)
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    axum::Json(json!({ "status": "healthy" }))
}

async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.health_check().await {
        Ok(()) => (StatusCode::OK, axum::Json(json!({ "status": "ready" }))),
        Err(e) => {
            tracing::error!(error = %e, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                axum::Json(json!({ "status": "not ready" })),
            )
        }
    }
}

async fn metrics() -> impl IntoResponse {
    crate::services::get_metrics()
}

//! Shared integration-test harness.
//!
//! Tests need a PostgreSQL server reachable through `TEST_DATABASE_URL`;
//! when the variable is unset, `spawn_app` returns `None` and the test
//! skips itself. Each spawned app gets its own freshly created database so
//! tests never see each other's rows.

use backoffice_service::config::{BackofficeConfig, DatabaseConfig, SmtpConfig};
use backoffice_service::services::Database;
use backoffice_service::startup::Application;
use sqlx::{Connection, Executor, PgConnection};
use uuid::Uuid;

pub struct TestApp {
    pub address: String,
    pub client: reqwest::Client,
    pub user_id: Uuid,
}

impl TestApp {
    pub fn api(&self, path: &str) -> String {
        format!("{}/api/v1{}", self.address, path)
    }

    /// POST JSON with editor credentials.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.request(reqwest::Method::POST, path, Some(body), "editor")
            .await
    }

    /// PUT JSON with editor credentials.
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> reqwest::Response {
        self.request(reqwest::Method::PUT, path, Some(body), "editor")
            .await
    }

    /// GET with viewer credentials.
    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.request(reqwest::Method::GET, path, None, "viewer")
            .await
    }

    /// DELETE with admin credentials.
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.request(reqwest::Method::DELETE, path, None, "admin")
            .await
    }

    pub async fn request(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&serde_json::Value>,
        role: &str,
    ) -> reqwest::Response {
        let mut req = self
            .client
            .request(method, self.api(path))
            .header("x-user-id", self.user_id.to_string())
            .header("x-user-role", role);
        if let Some(body) = body {
            req = req.json(body);
        }
        req.send().await.expect("Failed to execute request")
    }
}

/// Spawn the application against a fresh database, or `None` when no test
/// database is configured.
pub async fn spawn_app() -> Option<TestApp> {
    let base_url = match std::env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping integration test");
            return None;
        }
    };

    let db_name = format!("backoffice_test_{}", Uuid::new_v4().simple());
    let mut conn = PgConnection::connect(&base_url)
        .await
        .expect("Failed to connect to test PostgreSQL");
    conn.execute(format!(r#"CREATE DATABASE "{}";"#, db_name).as_str())
        .await
        .expect("Failed to create test database");

    let (server, _) = base_url
        .rsplit_once('/')
        .expect("TEST_DATABASE_URL must contain a database path");
    let db_url = format!("{}/{}", server, db_name);

    let db = Database::new(&db_url, 5, 1)
        .await
        .expect("Failed to connect to test database");
    db.run_migrations().await.expect("Failed to run migrations");

    let config = BackofficeConfig {
        service_name: "backoffice-service-test".to_string(),
        port: 0,
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: db_url,
            max_connections: 5,
            min_connections: 1,
        },
        smtp: SmtpConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 587,
            username: String::new(),
            password: String::new(),
            from_email: "noreply@example.com".to_string(),
            from_name: "Back Office".to_string(),
        },
    };

    let application = Application::build_with_database(config, db)
        .await
        .expect("Failed to build application");
    let port = application.port();
    tokio::spawn(application.run_until_stopped());

    Some(TestApp {
        address: format!("http://127.0.0.1:{}", port),
        client: reqwest::Client::new(),
        user_id: Uuid::new_v4(),
    })
}

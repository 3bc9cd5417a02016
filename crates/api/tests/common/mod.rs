//! Common test utilities for integration tests.
//!
//! These tests run against a real PostgreSQL database named by
//! `TEST_DATABASE_URL`. When the variable is unset every test returns
//! early, so the suite passes on machines without a database.

// Allow dead code in this module - these are helper utilities that may not be
// used by all integration tests but are intentionally available.
#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request},
    Router,
};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use domain::services::email::{EmailSender, MockEmailSender};
use testimonial_flow_api::{app::create_app, config::Config, services::EmailService};

/// Connect to the test database, or `None` when `TEST_DATABASE_URL` is
/// not set.
pub async fn try_create_test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("TEST_DATABASE_URL") else {
        eprintln!("TEST_DATABASE_URL not set, skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&database_url)
        .await
        .expect("Failed to connect to test database");

    Some(pool)
}

/// Run migrations on the test database.
pub async fn run_migrations(pool: &PgPool) {
    let migration_dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .join("persistence/src/migrations");

    let mut entries: Vec<_> = std::fs::read_dir(&migration_dir)
        .expect("Failed to read migrations directory")
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|ext| ext == "sql").unwrap_or(false))
        .collect();

    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let sql = std::fs::read_to_string(entry.path()).expect("Failed to read migration file");

        // Migrations are idempotent DDL; a concurrent test may already
        // have applied them
        sqlx::raw_sql(&sql).execute(pool).await.ok();
    }
}

/// Test configuration: no rate limiting, email disabled, console logs.
pub fn test_config() -> Config {
    Config {
        server: testimonial_flow_api::config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            request_timeout_secs: 30,
            max_body_size: 1048576,
        },
        database: testimonial_flow_api::config::DatabaseConfig {
            url: std::env::var("TEST_DATABASE_URL").unwrap_or_default(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout_secs: 10,
            idle_timeout_secs: 600,
            max_lifetime_secs: 1800,
        },
        logging: testimonial_flow_api::config::LoggingConfig {
            level: "debug".to_string(),
            format: "pretty".to_string(),
        },
        security: testimonial_flow_api::config::SecurityConfig {
            cors_origins: vec![],
            rate_limit_per_minute: 0,
        },
        limits: testimonial_flow_api::config::LimitsConfig {
            testimonial_text_min_chars: 10,
            testimonial_text_max_chars: 500,
            author_name_max_chars: 100,
        },
        automation: testimonial_flow_api::config::AutomationConfig {
            max_rules_per_owner: 50,
            pass_budget_ms: 5000,
        },
        notifications: testimonial_flow_api::config::NotificationsConfig {
            weekly_summary_check_interval_minutes: 1440,
            pending_reminder_check_interval_minutes: 1440,
        },
        email: testimonial_flow_api::config::EmailConfig {
            enabled: false,
            provider: "console".to_string(),
            sender_email: "test@example.com".to_string(),
            sender_name: "Test".to_string(),
            base_url: "https://test.example.com".to_string(),
            template_style: "html".to_string(),
            ..testimonial_flow_api::config::EmailConfig::default()
        },
        metrics: testimonial_flow_api::config::MetricsConfig { enabled: false },
    }
}

/// Create a test application router with a disabled email transport.
pub fn create_test_app(config: Config, pool: PgPool) -> Router {
    let email: Arc<dyn EmailSender> = Arc::new(EmailService::new(config.email.clone()));
    create_app(config, pool, email)
}

/// Create a test application router with an injected email sender, so
/// tests can observe delivery attempts.
pub fn create_test_app_with_email(
    config: Config,
    pool: PgPool,
    email: Arc<dyn EmailSender>,
) -> Router {
    create_app(config, pool, email)
}

/// Mock sender plus the app wired to it.
pub fn create_test_app_with_mock(config: Config, pool: PgPool) -> (Router, MockEmailSender) {
    let mock = MockEmailSender::new();
    let app = create_test_app_with_email(config, pool, Arc::new(mock.clone()));
    (app, mock)
}

/// Clean up ALL test data from the database.
///
/// Do not call this from tests that may run in parallel with others;
/// tests isolate through unique owner ids instead.
pub async fn cleanup_all_test_data(pool: &PgPool) {
    let tables = [
        "notification_logs",
        "notification_preferences",
        "automation_logs",
        "automation_rules",
        "personal_messages",
        "testimonials",
    ];

    for table in tables {
        sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
            .execute(pool)
            .await
            .ok();
    }
}

/// Test testimonial payload builder.
#[derive(Debug, Clone)]
pub struct TestTestimonial {
    pub owner_id: Uuid,
    pub name: String,
    pub text: String,
    pub rating: Option<i32>,
    pub email: Option<String>,
}

impl TestTestimonial {
    pub fn new(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            name: "Alex Morgan".to_string(),
            text: "Absolutely wonderful service, highly recommended".to_string(),
            rating: Some(5),
            email: None,
        }
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn body(&self) -> serde_json::Value {
        serde_json::json!({
            "owner_id": self.owner_id,
            "name": self.name,
            "text": self.text,
            "rating": self.rating,
            "email": self.email,
        })
    }
}

/// Build a JSON request.
pub fn json_request(method: Method, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

/// Build a GET request.
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a PUT request with an empty body.
pub fn put_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Build a DELETE request.
pub fn delete_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Helper to parse JSON response body.
pub async fn parse_response_body(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
}

/// Submit a testimonial through the API and return the parsed response.
pub async fn submit_testimonial(app: &Router, testimonial: &TestTestimonial) -> serde_json::Value {
    use tower::ServiceExt;

    let request = json_request(Method::POST, "/api/v1/testimonials", testimonial.body());
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = parse_response_body(response).await;
    assert!(
        status.is_success(),
        "Submission failed with status {}: {}",
        status,
        body
    );
    body
}

/// Create an automation rule through the API and return the parsed
/// response.
pub async fn create_rule(app: &Router, rule: serde_json::Value) -> serde_json::Value {
    use tower::ServiceExt;

    let request = json_request(Method::POST, "/api/v1/automation/rules", rule);
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = parse_response_body(response).await;
    assert!(
        status.is_success(),
        "Rule creation failed with status {}: {}",
        status,
        body
    );
    body
}

/// Store notification preferences for an owner through the API.
pub async fn set_preferences(
    app: &Router,
    owner_id: Uuid,
    body: serde_json::Value,
) -> serde_json::Value {
    use tower::ServiceExt;

    let request = json_request(
        Method::PUT,
        &format!("/api/v1/notifications/preferences/{}", owner_id),
        body,
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = parse_response_body(response).await;
    assert!(
        status.is_success(),
        "Preferences update failed with status {}: {}",
        status,
        body
    );
    body
}

/// The documented example rule set, with `owner_id` substituted in.
pub fn default_rule_fixtures(owner_id: Uuid) -> Vec<serde_json::Value> {
    let raw = include_str!("../fixtures/default_rules.json");
    let mut rules: Vec<serde_json::Value> =
        serde_json::from_str(raw).expect("default_rules.json is valid JSON");
    for rule in &mut rules {
        rule["owner_id"] = serde_json::json!(owner_id);
    }
    rules
}

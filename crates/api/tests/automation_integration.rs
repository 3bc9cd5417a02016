//! Integration tests for the automation rule engine and its endpoints.
//!
//! These tests require a running PostgreSQL instance. Set the
//! TEST_DATABASE_URL environment variable; without it every test
//! returns early.

mod common;

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use common::{
    create_rule, create_test_app, create_test_app_with_email, default_rule_fixtures, get_request,
    json_request, parse_response_body, run_migrations, set_preferences, submit_testimonial,
    test_config, try_create_test_pool, TestTestimonial,
};
use domain::services::email::MockEmailSender;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_list_rules_priority_order() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    for fixture in default_rule_fixtures(owner_id) {
        create_rule(&app, fixture).await;
    }

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/rules?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    let rules = body.as_array().unwrap();
    assert_eq!(rules.len(), 3);
    // Highest priority first
    assert_eq!(rules[0]["name"], "Auto-approve 5 star reviews");
    assert_eq!(rules[0]["priority"], 10);
    assert_eq!(rules[1]["name"], "Flag promotional language");
    assert_eq!(rules[2]["name"], "Categorize positive reviews");
    assert!(rules.iter().all(|r| r["enabled"] == true));
}

#[tokio::test]
async fn test_create_rule_rejects_unknown_operator() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        "/api/v1/automation/rules",
        json!({
            "owner_id": Uuid::new_v4(),
            "name": "Bad operator",
            "rule_type": "spam_detection",
            "conditions": [{"field": "text", "operator": "resembles", "value": "spam"}],
            "actions": [{"type": "reject"}]
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
}

#[tokio::test]
async fn test_create_rule_rejects_invalid_regex() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        "/api/v1/automation/rules",
        json!({
            "owner_id": Uuid::new_v4(),
            "name": "Broken regex",
            "rule_type": "spam_detection",
            "conditions": [{"field": "text", "operator": "regex", "value": "(unclosed"}],
            "actions": [{"type": "flag", "value": "spam"}]
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_rule_rejects_flag_without_label() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        "/api/v1/automation/rules",
        json!({
            "owner_id": Uuid::new_v4(),
            "name": "Unlabeled flag",
            "rule_type": "spam_detection",
            "conditions": [{"field": "text", "operator": "contains", "value": "spam"}],
            "actions": [{"type": "flag"}]
        }),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_rule_limit_per_owner() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let mut config = test_config();
    config.automation.max_rules_per_owner = 1;
    let app = create_test_app(config, pool.clone());
    let owner_id = Uuid::new_v4();

    let fixtures = default_rule_fixtures(owner_id);
    create_rule(&app, fixtures[0].clone()).await;

    let request = json_request(
        Method::POST,
        "/api/v1/automation/rules",
        fixtures[1].clone(),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "conflict");
}

#[tokio::test]
async fn test_update_rule_partial() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    let created = create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;
    let id = created["id"].as_str().unwrap();

    let request = json_request(
        Method::PUT,
        &format!("/api/v1/automation/rules/{}", id),
        json!({"name": "Renamed rule", "priority": 3}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "Renamed rule");
    assert_eq!(body["priority"], 3);
    // Untouched fields survive a partial update
    assert_eq!(body["rule_type"], "auto_approval");
    assert_eq!(body["conditions"].as_array().unwrap().len(), 1);
    assert_eq!(body["enabled"], true);
}

#[tokio::test]
async fn test_auto_approval_on_submission() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;
    assert_eq!(body["automation"]["rules_evaluated"], 1);
    assert_eq!(body["automation"]["rules_matched"], 1);
    assert_eq!(body["automation"]["final_status"], "approved");
    assert_eq!(body["testimonial"]["status"], "approved");

    // The new status is persisted, not just reported
    let id = body["testimonial"]["id"].as_str().unwrap();
    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/v1/testimonials/{}", id)))
        .await
        .unwrap();
    let stored = parse_response_body(response).await;
    assert_eq!(stored["status"], "approved");
}

#[tokio::test]
async fn test_unmatched_rule_leaves_pending() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(3)).await;
    assert_eq!(body["automation"]["rules_evaluated"], 1);
    assert_eq!(body["automation"]["rules_matched"], 0);
    assert_eq!(body["testimonial"]["status"], "pending");
}

#[tokio::test]
async fn test_spam_flag_and_categorization_chain() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    for fixture in default_rule_fixtures(owner_id) {
        create_rule(&app, fixture).await;
    }

    let testimonial = TestTestimonial::new(owner_id)
        .with_rating(4)
        .with_text("You should buy now while this amazing offer lasts");
    let body = submit_testimonial(&app, &testimonial).await;

    assert_eq!(body["automation"]["rules_evaluated"], 3);
    assert_eq!(body["automation"]["rules_matched"], 2);
    let flags = body["automation"]["flags"].as_array().unwrap();
    assert!(flags.contains(&json!("potential_spam")));
    // Rating 4 misses auto-approval, so the status stays pending
    assert_eq!(body["testimonial"]["status"], "pending");
    assert_eq!(body["testimonial"]["category"], "positive_reviews");
}

#[tokio::test]
async fn test_rule_effects_visible_to_later_rules() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    create_rule(
        &app,
        json!({
            "owner_id": owner_id,
            "name": "Tag VIPs",
            "rule_type": "categorization",
            "conditions": [{"field": "rating", "operator": "greater_than", "value": "0"}],
            "actions": [{"type": "categorize", "value": "vip"}],
            "priority": 10
        }),
    )
    .await;
    create_rule(
        &app,
        json!({
            "owner_id": owner_id,
            "name": "Confirm VIP tag",
            "rule_type": "spam_detection",
            "conditions": [{"field": "category", "operator": "equals", "value": "vip"}],
            "actions": [{"type": "flag", "value": "vip_confirmed"}],
            "priority": 1
        }),
    )
    .await;

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id)).await;

    // The second rule saw the category written by the first
    assert_eq!(body["automation"]["rules_matched"], 2);
    let flags = body["automation"]["flags"].as_array().unwrap();
    assert!(flags.contains(&json!("vip_confirmed")));
    assert_eq!(body["testimonial"]["category"], "vip");
}

#[tokio::test]
async fn test_notify_failure_logged_and_pass_continues() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app_with_email(
        test_config(),
        pool.clone(),
        Arc::new(MockEmailSender::failing()),
    );
    let owner_id = Uuid::new_v4();

    set_preferences(&app, owner_id, json!({"email": "owner@example.com"})).await;
    create_rule(
        &app,
        json!({
            "owner_id": owner_id,
            "name": "Announce arrivals",
            "rule_type": "auto_approval",
            "conditions": [],
            "actions": [{"type": "notify", "value": "A testimonial arrived"}],
            "priority": 10
        }),
    )
    .await;
    create_rule(
        &app,
        json!({
            "owner_id": owner_id,
            "name": "Tag everything",
            "rule_type": "categorization",
            "conditions": [],
            "actions": [{"type": "categorize", "value": "general"}],
            "priority": 1
        }),
    )
    .await;

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id)).await;

    // The broken notify did not stop the lower-priority rule
    assert_eq!(body["automation"]["rules_matched"], 2);
    assert_eq!(body["testimonial"]["category"], "general");

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/logs?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    let logs = parse_response_body(response).await;
    let notify_log = logs["data"]
        .as_array()
        .unwrap()
        .iter()
        .find(|log| log["rule_name"] == "Announce arrivals")
        .expect("no log row for the notify rule");
    let error_message = notify_log["error_message"].as_str().unwrap();
    assert!(error_message.starts_with("Notify action failed:"));
}

#[tokio::test]
async fn test_toggle_rule_disables_evaluation() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    let created = create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;
    let id = created["id"].as_str().unwrap();

    let request = json_request(
        Method::PUT,
        &format!("/api/v1/automation/rules/{}/toggle", id),
        json!({"enabled": false}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["enabled"], false);

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;
    assert_eq!(body["automation"]["rules_evaluated"], 0);
    assert_eq!(body["testimonial"]["status"], "pending");

    let request = json_request(
        Method::PUT,
        &format!("/api/v1/automation/rules/{}/toggle", id),
        json!({"enabled": true}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;
    assert_eq!(body["automation"]["rules_evaluated"], 1);
    assert_eq!(body["testimonial"]["status"], "approved");
}

#[tokio::test]
async fn test_list_rules_enabled_filter() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    let fixtures = default_rule_fixtures(owner_id);
    let first = create_rule(&app, fixtures[0].clone()).await;
    create_rule(&app, fixtures[1].clone()).await;

    let request = json_request(
        Method::PUT,
        &format!(
            "/api/v1/automation/rules/{}/toggle",
            first["id"].as_str().unwrap()
        ),
        json!({"enabled": false}),
    );
    app.clone().oneshot(request).await.unwrap();

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/rules?owner_id={}&enabled=true",
            owner_id
        )))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    let rules = body.as_array().unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0]["name"], "Flag promotional language");
}

#[tokio::test]
async fn test_dry_run_matches_without_side_effects() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    let created = create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;
    let id = created["id"].as_str().unwrap();

    let request = json_request(
        Method::POST,
        &format!("/api/v1/automation/rules/{}/test", id),
        json!({"testimonial": {"rating": 5}}),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["matched"], true);
    let checks = body["checks"].as_array().unwrap();
    assert_eq!(checks.len(), 1);
    assert_eq!(checks[0]["passed"], true);
    assert_eq!(body["planned_actions"][0]["type"], "approve");

    // Dry runs write nothing
    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/logs?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    let logs = parse_response_body(response).await;
    assert_eq!(logs["pagination"]["total"], 0);
}

#[tokio::test]
async fn test_dry_run_unknown_rule_returns_404() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        &format!("/api/v1/automation/rules/{}/test", Uuid::new_v4()),
        json!({"testimonial": {"rating": 5}}),
    );
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_draft_dry_run() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());

    let request = json_request(
        Method::POST,
        "/api/v1/automation/test",
        json!({
            "conditions": [{"field": "text", "operator": "contains", "value": "excellent"}],
            "actions": [{"type": "flag", "value": "praise"}],
            "testimonial": {"text": "An excellent experience from start to finish"}
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["matched"], true);
    assert_eq!(body["planned_actions"][0]["type"], "flag");
    assert_eq!(body["planned_actions"][0]["value"], "praise");

    let request = json_request(
        Method::POST,
        "/api/v1/automation/test",
        json!({
            "conditions": [{"field": "text", "operator": "contains", "value": "excellent"}],
            "actions": [{"type": "flag", "value": "praise"}],
            "testimonial": {"text": "A mediocre visit"}
        }),
    );
    let response = app.clone().oneshot(request).await.unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["matched"], false);
    assert_eq!(body["checks"][0]["passed"], false);
}

#[tokio::test]
async fn test_each_evaluated_rule_logged() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    for fixture in default_rule_fixtures(owner_id) {
        create_rule(&app, fixture).await;
    }

    let testimonial = TestTestimonial::new(owner_id)
        .with_rating(4)
        .with_text("You should buy now while this amazing offer lasts");
    submit_testimonial(&app, &testimonial).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/logs?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["pagination"]["total"], 3);
    let logs = body["data"].as_array().unwrap();

    let by_name = |name: &str| {
        logs.iter()
            .find(|log| log["rule_name"] == name)
            .unwrap_or_else(|| panic!("no log row for rule {}", name))
    };
    assert_eq!(by_name("Auto-approve 5 star reviews")["conditions_met"], false);
    assert_eq!(by_name("Flag promotional language")["conditions_met"], true);
    assert_eq!(by_name("Categorize positive reviews")["conditions_met"], true);

    let spam_log = by_name("Flag promotional language");
    assert_eq!(spam_log["actions_executed"][0]["type"], "flag");
    assert!(spam_log["execution_time_ms"].is_number());
    assert!(spam_log["error_message"].is_null());
}

#[tokio::test]
async fn test_logs_filtered_by_conditions_met() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    for fixture in default_rule_fixtures(owner_id) {
        create_rule(&app, fixture).await;
    }
    submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/logs?owner_id={}&conditions_met=true",
            owner_id
        )))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    // Auto-approval and categorization match a 5-star review, spam does not
    assert_eq!(body["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_stats_aggregate() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    for fixture in default_rule_fixtures(owner_id) {
        create_rule(&app, fixture).await;
    }
    submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;

    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/stats?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = parse_response_body(response).await;
    assert_eq!(body["total_executions"], 3);
    assert_eq!(body["matched"], 2);
    assert_eq!(body["actions_executed"], 2);
    assert_eq!(body["failed"], 0);
    let match_rate = body["match_rate"].as_f64().unwrap();
    assert!((match_rate - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(body["by_rule"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_delete_rule_preserves_logs() {
    let Some(pool) = try_create_test_pool().await else {
        return;
    };
    run_migrations(&pool).await;

    let app = create_test_app(test_config(), pool.clone());
    let owner_id = Uuid::new_v4();

    let created = create_rule(&app, default_rule_fixtures(owner_id)[0].clone()).await;
    let id = created["id"].as_str().unwrap();

    submit_testimonial(&app, &TestTestimonial::new(owner_id).with_rating(5)).await;

    let response = app
        .clone()
        .oneshot(common::delete_request(&format!(
            "/api/v1/automation/rules/{}",
            id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .clone()
        .oneshot(get_request(&format!("/api/v1/automation/rules/{}", id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // History survives the rule with its id detached
    let response = app
        .clone()
        .oneshot(get_request(&format!(
            "/api/v1/automation/logs?owner_id={}",
            owner_id
        )))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    assert_eq!(body["pagination"]["total"], 1);
    assert!(body["data"][0]["rule_id"].is_null());
    assert_eq!(body["data"][0]["rule_name"], "Auto-approve 5 star reviews");
}

/// End-to-end tests for the proxy in mock mode.
/// Drives the proxy handler directly against the repository fixture,
/// without a backend and without binding a socket.
use axum::body::{to_bytes, Bytes};
use axum::extract::{Path, RawQuery, State};
use axum::http::{HeaderMap, Method, StatusCode};
use b2b_moderator_gateway::auth;
use b2b_moderator_gateway::backend_client::BackendClient;
use b2b_moderator_gateway::config::Config;
use b2b_moderator_gateway::handlers::AppState;
use b2b_moderator_gateway::proxy;
use serde_json::Value;
use std::sync::Arc;

const FIXTURE: &str = "public/mock-data.json";

fn mock_state(fixture_path: &str) -> Arc<AppState> {
    let config = Config {
        backend_url: "http://127.0.0.1:8000".to_string(),
        port: 3000,
        mock_mode: true,
        mock_data_path: fixture_path.to_string(),
        environment: "test".to_string(),
    };
    let backend = BackendClient::new(config.backend_url.clone());
    Arc::new(AppState { config, backend })
}

async fn call_proxy(
    state: Arc<AppState>,
    method: Method,
    path: &str,
    query: Option<&str>,
) -> (StatusCode, Bytes) {
    let response = proxy::handle(
        State(state),
        method,
        Path(path.to_string()),
        RawQuery(query.map(str::to_string)),
        HeaderMap::new(),
        Bytes::new(),
    )
    .await;
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body)
}

fn as_json(body: &Bytes) -> Value {
    serde_json::from_slice(body).expect("mock response body must be JSON")
}

#[tokio::test]
async fn suppliers_are_paginated_with_pre_slice_total() {
    let (status, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "moderator/suppliers",
        Some("limit=2&offset=0"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json = as_json(&body);
    assert_eq!(json["suppliers"].as_array().unwrap().len(), 2);
    assert_eq!(json["total"], Value::from(5));
    assert_eq!(json["limit"], Value::from(2));
    assert_eq!(json["offset"], Value::from(0));
}

#[tokio::test]
async fn suppliers_filter_by_type_before_pagination() {
    let (status, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "moderator/suppliers",
        Some("type=reseller&limit=1"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let json = as_json(&body);
    assert_eq!(json["suppliers"].as_array().unwrap().len(), 1);
    assert_eq!(json["total"], Value::from(2));
    assert_eq!(json["suppliers"][0]["type"], Value::from("reseller"));
}

#[tokio::test]
async fn suppliers_keyword_search_is_case_insensitive() {
    let (_, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "moderator/suppliers",
        Some("search=%D0%A0%D0%9E%D0%9C%D0%90%D0%A8%D0%9A%D0%90"),
    )
    .await;

    // "РОМАШКА" upper-cased in the query, lower-case in the fixture.
    let json = as_json(&body);
    assert_eq!(json["total"], Value::from(1));
    assert_eq!(json["suppliers"][0]["name"], Value::from("ООО Ромашка"));
}

#[tokio::test]
async fn parsing_run_lookup_succeeds_for_both_id_spellings() {
    let (status, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "parsing/runs/run-003",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body)["status"], Value::from("failed"));
}

#[tokio::test]
async fn unknown_parsing_run_is_404_with_detail() {
    let (status, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "parsing/runs/run-does-not-exist",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        as_json(&body),
        serde_json::json!({"detail": "Parsing run not found"})
    );
}

#[tokio::test]
async fn domains_queue_filters_compose() {
    let (_, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "domains/queue",
        Some("parsingRunId=run-002&status=pending"),
    )
    .await;

    let json = as_json(&body);
    assert_eq!(json["total"], Value::from(2));
    for entry in json["entries"].as_array().unwrap() {
        assert_eq!(entry["status"], Value::from("pending"));
    }
}

#[tokio::test]
async fn moderator_tasks_return_a_bare_array() {
    let (status, body) = call_proxy(mock_state(FIXTURE), Method::GET, "moderator/tasks", None).await;

    assert_eq!(status, StatusCode::OK);
    let json = as_json(&body);
    assert!(json.is_array());
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn unprocessed_runs_summarize_the_runs_list() {
    let (_, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "moderator/unprocessed-runs",
        None,
    )
    .await;

    let json = as_json(&body);
    assert_eq!(json["total"], Value::from(3));
    let runs = json["runs"].as_array().unwrap();
    assert_eq!(runs[0]["run_id"], Value::from("run-001"));
    assert_eq!(runs[0]["total_domains"], Value::from(120));
    assert_eq!(runs[0]["parser_active"], Value::from(false));
    // camelCase fixture fields are picked up too, and the string count coerces.
    assert_eq!(runs[2]["run_id"], Value::from("run-003"));
    assert_eq!(runs[2]["total_domains"], Value::from(0));
    assert_eq!(runs[2]["created_at"], Value::from("2025-07-16T08:00:00Z"));
}

#[tokio::test]
async fn run_domains_reshape_queue_entries() {
    let (_, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "moderator/run-domains/run-001",
        None,
    )
    .await;

    let json = as_json(&body);
    assert_eq!(json["run_id"], Value::from("run-001"));
    assert_eq!(json["total"], Value::from(3));
    let domains = json["domains"].as_array().unwrap();
    assert_eq!(domains[0]["id"], Value::from(1));
    assert_eq!(
        domains[0]["attempted_urls"],
        serde_json::json!(["https://romashka.ru/contacts"])
    );
    // Entry without a status defaults to pending.
    assert_eq!(domains[2]["domain"], Value::from("nezabudka-opt.ru"));
    assert_eq!(domains[2]["status"], Value::from("pending"));
}

#[tokio::test]
async fn unknown_mock_path_answers_empty_object() {
    let (status, body) = call_proxy(
        mock_state(FIXTURE),
        Method::GET,
        "some/unknown/endpoint",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), serde_json::json!({}));
}

#[tokio::test]
async fn mutating_methods_answer_canned_success_without_touching_the_fixture() {
    // A nonexistent fixture path proves the mutating branch never reads it.
    let state = mock_state("public/no-such-fixture.json");

    let (status, body) =
        call_proxy(state.clone(), Method::POST, "moderator/users", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), serde_json::json!({"ok": true}));

    let (status, body) = call_proxy(state.clone(), Method::PUT, "moderator/users/1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(as_json(&body), serde_json::json!({"ok": true}));

    let (status, body) = call_proxy(state, Method::DELETE, "moderator/users/1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(body.is_empty());
}

#[tokio::test]
async fn missing_fixture_surfaces_as_structured_error() {
    let (status, body) = call_proxy(
        mock_state("public/no-such-fixture.json"),
        Method::GET,
        "moderator/suppliers",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(as_json(&body)["error"].is_string());
}

#[tokio::test]
async fn auth_status_in_mock_mode_reports_fixed_admin() {
    let response = auth::auth_status(State(mock_state(FIXTURE)), HeaderMap::new()).await;
    let json = response.0;

    assert_eq!(json["authenticated"], Value::from(true));
    assert_eq!(json["user"]["email"], Value::from("mock@b2b.local"));
    assert_eq!(json["user"]["role"], Value::from("admin"));
    assert_eq!(json["user"]["can_access_moderator"], Value::from(true));
}

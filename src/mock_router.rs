//! Mock-mode dispatch for the dashboard proxy.
//!
//! When mock mode is enabled the proxy answers every GET from a static
//! fixture file instead of the backend. The fixture is re-read from disk on
//! every request so demo data can be edited without a restart. Dispatch is
//! a flat table of exact and prefix path matches; an unknown path returns
//! an empty object so the dashboard never sees a hard failure just because
//! a fixture section is missing.

use crate::errors::AppError;
use axum::http::StatusCode;
use serde_json::{json, Value};
use std::collections::HashMap;

/// Pagination contract shared by every paginated mock endpoint.
const DEFAULT_LIMIT: i64 = 100;
const MIN_LIMIT: i64 = 1;
const MAX_LIMIT: i64 = 1000;

/// The unprocessed-runs summary covers only the head of the runs list.
const UNPROCESSED_RUNS_CAP: usize = 25;
/// Per-run domain listings are capped.
const RUN_DOMAINS_CAP: usize = 200;

/// Parsed query string; the last value wins per key.
#[derive(Debug, Default)]
pub struct QueryParams(HashMap<String, String>);

impl QueryParams {
    pub fn parse(raw: Option<&str>) -> Self {
        let mut map = HashMap::new();
        if let Some(raw) = raw {
            for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
                map.insert(key.into_owned(), value.into_owned());
            }
        }
        Self(map)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

/// A synthesized mock response.
#[derive(Debug)]
pub struct MockReply {
    pub status: StatusCode,
    pub body: Value,
}

impl MockReply {
    fn ok(body: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }
}

/// Reads and parses the mock fixture. Called per request, never cached.
pub async fn read_mock(path: &str) -> Result<Value, AppError> {
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read mock fixture {}: {}", path, e))
    })?;
    serde_json::from_str(&raw)
        .map_err(|e| AppError::InternalError(format!("Mock fixture is not valid JSON: {}", e)))
}

/// `limit` clamped into `[1, 1000]` (default 100), `offset` clamped to be
/// non-negative (default 0). Unparseable values fall back to the defaults.
pub fn parse_limit_offset(params: &QueryParams) -> (usize, usize) {
    let limit = parse_index(params.get("limit"))
        .unwrap_or(DEFAULT_LIMIT)
        .clamp(MIN_LIMIT, MAX_LIMIT);
    let offset = parse_index(params.get("offset")).unwrap_or(0).max(0);
    (limit as usize, offset as usize)
}

/// Case-insensitive substring match against the serialized JSON form of the
/// candidate. An empty or whitespace-only keyword matches everything, and a
/// serialization failure matches too (fail-open).
pub fn matches_keyword(candidate: &Value, keyword: Option<&str>) -> bool {
    let query = keyword.unwrap_or("").trim().to_lowercase();
    if query.is_empty() {
        return true;
    }
    match serde_json::to_string(candidate) {
        Ok(serialized) => serialized.to_lowercase().contains(&query),
        Err(_) => true,
    }
}

/// Dispatches one mock GET over the fixture document.
pub fn dispatch_get(mock: &Value, target_path: &str, params: &QueryParams) -> MockReply {
    if target_path == "/moderator/dashboard-stats" {
        return MockReply::ok(section(mock, "dashboard_stats"));
    }

    if target_path == "/moderator/suppliers" {
        let (limit, offset) = parse_limit_offset(params);
        let type_filter = params.get("type");
        let search = params.get("search");
        let filtered: Vec<&Value> = array_section(mock, "suppliers")
            .iter()
            .filter(|s| type_filter.map_or(true, |t| text_field(s, &["type"]) == t))
            .filter(|s| matches_keyword(s, search))
            .collect();
        return MockReply::ok(json!({
            "suppliers": page_slice(&filtered, limit, offset),
            "total": filtered.len(),
            "limit": limit,
            "offset": offset,
        }));
    }

    if target_path == "/parsing/runs" {
        let (limit, offset) = parse_limit_offset(params);
        let keyword = params.get("keyword");
        let filtered: Vec<&Value> = array_section(mock, "parsing_runs")
            .iter()
            .filter(|r| matches_keyword(r, keyword))
            .collect();
        return MockReply::ok(json!({
            "runs": page_slice(&filtered, limit, offset),
            "total": filtered.len(),
            "limit": limit,
            "offset": offset,
        }));
    }

    if let Some(rest) = target_path.strip_prefix("/parsing/runs/") {
        let run_id = rest.split('/').next().unwrap_or("");
        return match array_section(mock, "parsing_runs")
            .iter()
            .find(|r| text_field(r, &["run_id", "runId"]) == run_id)
        {
            Some(run) => MockReply::ok(run.clone()),
            None => MockReply {
                status: StatusCode::NOT_FOUND,
                body: json!({"detail": "Parsing run not found"}),
            },
        };
    }

    if target_path == "/domains/queue" {
        let (limit, offset) = parse_limit_offset(params);
        let keyword = params.get("keyword");
        let run_filter = params.get("parsingRunId");
        let status_filter = params.get("status");
        let filtered: Vec<&Value> = array_section(mock, "domains_queue")
            .iter()
            .filter(|d| {
                run_filter.map_or(true, |id| {
                    text_field(d, &["parsingRunId", "parsing_run_id"]) == id
                })
            })
            .filter(|d| status_filter.map_or(true, |s| text_field(d, &["status"]) == s))
            .filter(|d| matches_keyword(d, keyword))
            .collect();
        return MockReply::ok(json!({
            "entries": page_slice(&filtered, limit, offset),
            "total": filtered.len(),
            "limit": limit,
            "offset": offset,
        }));
    }

    if target_path == "/moderator/tasks" {
        let (limit, offset) = parse_limit_offset(params);
        let all: Vec<&Value> = array_section(mock, "moderator_tasks").iter().collect();
        // Historical contract: a bare page array, no envelope.
        return MockReply::ok(Value::Array(page_slice(&all, limit, offset)));
    }

    if target_path == "/cabinet/stats" {
        return MockReply::ok(section(mock, "cabinet_stats"));
    }
    if target_path == "/cabinet/requests" {
        return MockReply::ok(Value::Array(array_section(mock, "cabinet_requests").to_vec()));
    }
    if target_path == "/cabinet/messages" {
        return MockReply::ok(Value::Array(array_section(mock, "cabinet_messages").to_vec()));
    }
    if target_path == "/moderator/users" {
        return MockReply::ok(Value::Array(array_section(mock, "users").to_vec()));
    }

    if target_path == "/learning/statistics" {
        return MockReply::ok(learning_statistics_stub());
    }

    if target_path == "/learning/learned-summary" {
        return MockReply::ok(json!({
            "total_patterns": 0,
            "inn_url_patterns": [],
            "email_url_patterns": [],
            "domains_learned": 0,
            "statistics": learning_statistics_stub(),
        }));
    }

    if target_path == "/moderator/current-task" {
        return MockReply::ok(json!({
            "task_id": null,
            "task_title": null,
            "task_created_at": null,
            "run_id": null,
            "run_status": null,
            "run_started_at": null,
            "run_finished_at": null,
            "run_error_message": null,
            "domains": [],
            "total_domains": 0,
            "pending_count": 0,
            "processing_count": 0,
            "supplier_count": 0,
            "reseller_count": 0,
            "moderation_count": 0,
            "parser_active": false,
        }));
    }

    if target_path == "/moderator/unprocessed-runs" {
        let runs: Vec<Value> = array_section(mock, "parsing_runs")
            .iter()
            .take(UNPROCESSED_RUNS_CAP)
            .map(|r| {
                json!({
                    "run_id": text_field(r, &["run_id", "runId"]),
                    "status": text_field(r, &["status"]),
                    "created_at": r.get("created_at")
                        .or_else(|| r.get("createdAt"))
                        .cloned()
                        .unwrap_or(Value::Null),
                    "keyword": text_field(r, &["keyword"]),
                    "total_domains": num_field(r, &["resultsCount"]) as i64,
                    "pending_count": 0,
                    "processing_count": 0,
                    "supplier_count": 0,
                    "reseller_count": 0,
                    "moderation_count": 0,
                    "parser_active": false,
                })
            })
            .collect();
        return MockReply::ok(json!({"runs": runs, "total": runs.len()}));
    }

    if let Some(rest) = target_path.strip_prefix("/moderator/run-domains/") {
        let run_id = rest.split('/').next().unwrap_or("");
        let domains: Vec<Value> = array_section(mock, "domains_queue")
            .iter()
            .filter(|d| text_field(d, &["parsingRunId", "parsing_run_id"]) == run_id)
            .take(RUN_DOMAINS_CAP)
            .enumerate()
            .map(|(idx, d)| {
                let status = text_field(d, &["status"]);
                let url = text_field(d, &["url"]);
                json!({
                    "id": idx + 1,
                    "run_id": run_id,
                    "domain": text_field(d, &["domain"]),
                    "status": if status.is_empty() { "pending".to_string() } else { status },
                    "reason": null,
                    "attempted_urls": if url.is_empty() { vec![] } else { vec![url] },
                    "inn_source_url": null,
                    "email_source_url": null,
                    "supplier_id": null,
                    "checko_ok": false,
                    "global_requires_moderation": false,
                })
            })
            .collect();
        return MockReply::ok(json!({
            "run_id": run_id,
            "domains": domains,
            "total": domains.len(),
        }));
    }

    tracing::warn!(
        "Mock mode has no fixture for GET {}, returning empty object",
        target_path
    );
    MockReply::ok(json!({}))
}

fn learning_statistics_stub() -> Value {
    json!({
        "total_patterns": 0,
        "patterns": [],
        "domains_learned": 0,
        "last_updated": null,
    })
}

/// Top-level fixture section, `null` when absent.
fn section(mock: &Value, key: &str) -> Value {
    mock.get(key).cloned().unwrap_or(Value::Null)
}

/// Top-level fixture array, empty when absent or not an array.
fn array_section<'a>(mock: &'a Value, key: &str) -> &'a [Value] {
    mock.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn page_slice(items: &[&Value], limit: usize, offset: usize) -> Vec<Value> {
    items
        .iter()
        .skip(offset)
        .take(limit)
        .map(|v| (*v).clone())
        .collect()
}

/// First non-empty scalar among the given keys, coerced to a string.
/// Mirrors the loose `record.a || record.b || ""` access the fixtures were
/// written against.
fn text_field(obj: &Value, keys: &[&str]) -> String {
    for key in keys {
        match obj.get(key) {
            Some(Value::String(s)) if !s.is_empty() => return s.clone(),
            Some(Value::Number(n)) => return n.to_string(),
            _ => {}
        }
    }
    String::new()
}

/// First numeric scalar among the given keys; numeric strings parse,
/// everything else counts as 0.
fn num_field(obj: &Value, keys: &[&str]) -> f64 {
    for key in keys {
        match obj.get(key) {
            Some(Value::Number(n)) => return n.as_f64().unwrap_or(0.0),
            Some(Value::String(s)) => {
                if let Ok(n) = s.trim().parse() {
                    return n;
                }
            }
            _ => {}
        }
    }
    0.0
}

/// Mirrors the clamp contract: floats floor, garbage falls back to the
/// caller's default.
fn parse_index(raw: Option<&str>) -> Option<i64> {
    let parsed: f64 = raw?.trim().parse().ok()?;
    Some(parsed.floor() as i64)
}

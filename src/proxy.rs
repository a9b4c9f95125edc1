use crate::auth::{cookie_value, AUTH_TOKEN_COOKIE};
use crate::backend_client::PASS_HEADERS;
use crate::errors::{AppError, ResultExt};
use crate::handlers::AppState;
use crate::mock_router::{self, QueryParams};
use axum::{
    body::Bytes,
    extract::{Path, RawQuery, State},
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// ANY /api/proxy/{...path}
///
/// Generic dashboard proxy. In mock mode the response is synthesized from
/// the static fixture; otherwise the request is forwarded once to the
/// backend origin and the backend's status, JSON body and allow-listed
/// diagnostic headers are relayed.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `method` - Inbound HTTP method (GET, POST, PUT, DELETE or PATCH).
/// * `path` - Wildcard path segments after `/api/proxy/`.
/// * `query` - Raw query string, forwarded unmodified.
/// * `headers` - Inbound headers; `content-type`, `accept` and the auth
///   cookie are the only parts consulted.
/// * `body` - Raw body bytes, passed through for mutating methods.
pub async fn handle(
    State(state): State<Arc<AppState>>,
    method: Method,
    Path(path): Path<String>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target_path = format!("/{}", path);

    let result = if state.config.mock_mode {
        mock_response(&state, &method, &target_path, query.as_deref()).await
    } else {
        forward_response(&state, method, &target_path, query.as_deref(), &headers, body).await
    };

    match result {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Mock-mode half of the router. Mutating methods never touch the fixture
/// and always answer with a canned success.
async fn mock_response(
    state: &Arc<AppState>,
    method: &Method,
    target_path: &str,
    raw_query: Option<&str>,
) -> Result<Response, AppError> {
    if *method == Method::DELETE {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    if *method == Method::POST || *method == Method::PUT || *method == Method::PATCH {
        return Ok((StatusCode::OK, Json(json!({"ok": true}))).into_response());
    }

    let mock = mock_router::read_mock(&state.config.mock_data_path)
        .await
        .context("mock fixture unavailable")?;
    let params = QueryParams::parse(raw_query);
    let reply = mock_router::dispatch_get(&mock, target_path, &params);

    Ok((reply.status, Json(reply.body)).into_response())
}

/// Forwarding-mode half of the router.
async fn forward_response(
    state: &Arc<AppState>,
    method: Method,
    target_path: &str,
    raw_query: Option<&str>,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    let token = cookie_value(headers, AUTH_TOKEN_COOKIE);
    let is_delete = method == Method::DELETE;

    let response = state
        .backend
        .forward(method, target_path, raw_query, headers, body, token.as_deref())
        .await?;

    // DELETE with an empty 204 passes through unwrapped.
    if is_delete && response.status() == StatusCode::NO_CONTENT {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Ok((status, Json(json!({"error": error_text}))).into_response());
    }

    let pass_headers = collect_pass_headers(response.headers());
    let data: Value = response.json().await.map_err(|e| {
        tracing::error!("Backend returned a non-JSON success body: {}", e);
        AppError::BackendUnreachable
    })?;

    let mut relayed = (status, Json(data)).into_response();
    for (name, value) in pass_headers {
        relayed.headers_mut().insert(name, value);
    }
    Ok(relayed)
}

/// Pulls the allow-listed diagnostic headers off a backend response.
fn collect_pass_headers(from: &HeaderMap) -> Vec<(HeaderName, HeaderValue)> {
    PASS_HEADERS
        .iter()
        .filter_map(|name| {
            from.get(*name)
                .map(|value| (HeaderName::from_static(name), value.clone()))
        })
        .collect()
}

use crate::handlers::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// Cookie carrying the bearer token issued by the login stub. Http-only,
/// same-site-lax, path `/`; the proxy translates it to an outbound
/// `Authorization: Bearer` header.
pub const AUTH_TOKEN_COOKIE: &str = "auth_token";

/// Reads one cookie value out of the inbound `Cookie` header(s).
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header_value in headers.get_all(header::COOKIE) {
        let Ok(raw) = header_value.to_str() else {
            continue;
        };
        for pair in raw.split(';') {
            if let Some((key, value)) = pair.trim().split_once('=') {
                if key == name {
                    return Some(value.to_string());
                }
            }
        }
    }
    None
}

/// GET /api/auth/status
///
/// In mock mode this always reports a fixed authenticated admin identity.
/// Otherwise the auth cookie is relayed to the backend and its JSON answer
/// is returned as-is; any failure degrades to an unauthenticated response
/// instead of an error, with diagnostic detail attached outside production.
pub async fn auth_status(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Json<Value> {
    if state.config.mock_mode {
        return Json(json!({
            "authenticated": true,
            "user": {
                "id": 1,
                "email": "mock@b2b.local",
                "role": "admin",
                "can_access_moderator": true,
                "name": "Mock Admin",
            },
        }));
    }

    let token = cookie_value(&headers, AUTH_TOKEN_COOKIE);
    match state.backend.fetch_auth_identity(token.as_deref()).await {
        Ok(identity) => Json(identity),
        Err(err) => {
            tracing::warn!("Auth status check failed: {}", err);
            let mut body = json!({"authenticated": false, "user": null});
            if !state.config.is_production() {
                body["detail"] = Value::String(err.to_string());
            }
            Json(body)
        }
    }
}

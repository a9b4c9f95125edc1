use crate::errors::AppError;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, Method};
use reqwest::Client;
use serde_json::Value;

/// Diagnostic headers relayed verbatim from backend responses onto proxy
/// responses. Dashboard tooling depends on the exact membership of this
/// list.
pub const PASS_HEADERS: [&str; 7] = [
    "x-groq-used",
    "x-groq-key-source",
    "x-groq-key-source-initial",
    "x-groq-error",
    "x-groq-total-tokens",
    "x-groq-prompt-tokens",
    "x-groq-completion-tokens",
];

/// Client for the moderation backend behind the proxy.
#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    /// Creates a new `BackendClient`.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The origin of the moderation backend.
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Forwards one inbound request to the backend.
    ///
    /// Copies `content-type` and `accept` from the inbound headers when
    /// present (`content-type` only for methods that carry a body),
    /// attaches `Authorization: Bearer <token>` when a token is given and
    /// passes the body bytes through unmodified. Exactly one attempt, no
    /// retries; a transport failure maps to `AppError::BackendUnreachable`.
    pub async fn forward(
        &self,
        method: Method,
        target_path: &str,
        raw_query: Option<&str>,
        inbound: &HeaderMap,
        body: Bytes,
        auth_token: Option<&str>,
    ) -> Result<reqwest::Response, AppError> {
        let url = match raw_query {
            Some(query) if !query.is_empty() => {
                format!("{}{}?{}", self.base_url, target_path, query)
            }
            _ => format!("{}{}", self.base_url, target_path),
        };

        let has_body = method != Method::GET && method != Method::HEAD;
        let mut request = self.client.request(method.clone(), &url);

        if has_body {
            if let Some(content_type) = inbound.get(header::CONTENT_TYPE) {
                request = request.header(header::CONTENT_TYPE, content_type);
            }
        }
        if let Some(accept) = inbound.get(header::ACCEPT) {
            request = request.header(header::ACCEPT, accept);
        }
        if let Some(token) = auth_token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if has_body && !body.is_empty() {
            request = request.body(body);
        }

        tracing::debug!("Forwarding {} {}", method, url);

        request.send().await.map_err(|e| {
            tracing::error!("Backend request failed: {}", e);
            AppError::BackendUnreachable
        })
    }

    /// Resolves the caller's identity for the auth-status endpoint.
    ///
    /// With a token, asks the backend's `/api/auth/me` with a bearer
    /// header; without one, asks `/api/auth/status`. Relays the backend
    /// JSON on success.
    pub async fn fetch_auth_identity(&self, token: Option<&str>) -> Result<Value, AppError> {
        let path = if token.is_some() {
            "/api/auth/me"
        } else {
            "/api/auth/status"
        };
        let mut request = self.client.get(format!("{}{}", self.base_url, path));
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalApiError(format!("Auth request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Auth backend returned status {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalApiError(format!("Failed to parse auth response: {}", e))
        })
    }
}

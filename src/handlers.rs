use crate::backend_client::BackendClient;
use crate::config::Config;
use crate::models::SupplierRecord;
use crate::reliability::{derive_reliability, ReliabilityAssessment};
use axum::{http::StatusCode, Json};
use chrono::Utc;
use serde_json::json;

/// Shared application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Client for the moderation backend.
    pub backend: BackendClient,
}

/// Health check endpoint.
///
/// Returns the service status, version, and health information.
///
/// # Returns
///
/// * `(StatusCode, Json<serde_json::Value>)` - HTTP 200 OK with health status JSON.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "b2b-moderator-gateway",
            "version": "0.1.0",
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// POST /api/reliability/assess
///
/// Derives the reliability assessment for one supplier record: score,
/// categorized facts, finance series and activity codes. Recomputed on
/// every call; nothing is cached or persisted.
///
/// # Arguments
///
/// * `record` - JSON body with the supplier record, including the optional
///   registry blob.
pub async fn assess_reliability(
    Json(record): Json<SupplierRecord>,
) -> Json<ReliabilityAssessment> {
    let assessment = derive_reliability(&record);
    tracing::debug!(
        "Derived reliability score {} from {} facts",
        assessment.score,
        assessment.facts.len()
    );
    Json(assessment)
}

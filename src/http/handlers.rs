//! HTTP handlers exposing the filter engine.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::error::RuleError;
use crate::filter::{FilterEngine, Request, Rule};

/// Shared handler state.
pub type SharedEngine = Arc<FilterEngine>;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Error body returned for rejected rule mutations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Rule payload accepted by `POST /rules`. A missing id is generated.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRule {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub source_address: String,
    pub dest_address: String,
    pub protocol: String,
    pub port: u16,
}

impl From<NewRule> for Rule {
    fn from(new: NewRule) -> Self {
        let id = new
            .id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        Rule {
            id,
            source_address: new.source_address,
            dest_address: new.dest_address,
            protocol: new.protocol,
            port: new.port,
        }
    }
}

impl IntoResponse for RuleError {
    fn into_response(self) -> Response {
        let status = match self {
            RuleError::DuplicateId(_) => StatusCode::CONFLICT,
            RuleError::NotFound(_) => StatusCode::NOT_FOUND,
        };
        (status, Json(ErrorResponse { error: self.to_string() })).into_response()
    }
}

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Evaluate a request against the engine.
#[instrument(
    skip(engine, request),
    fields(
        source = %request.source_address,
        dest = %request.dest_address,
        protocol = %request.protocol,
        port = request.port
    )
)]
pub async fn filter_handler(
    State(engine): State<SharedEngine>,
    Json(request): Json<Request>,
) -> Json<crate::filter::Response> {
    Json(engine.filter(&request))
}

/// List the current rules.
pub async fn list_rules_handler(State(engine): State<SharedEngine>) -> Json<Vec<Rule>> {
    Json(engine.rules())
}

/// Add a rule.
#[instrument(skip(engine, new_rule), fields(rule_id = ?new_rule.id))]
pub async fn add_rule_handler(
    State(engine): State<SharedEngine>,
    Json(new_rule): Json<NewRule>,
) -> Result<(StatusCode, Json<Rule>), RuleError> {
    let rule = Rule::from(new_rule);

    engine.add_rule(rule.clone()).map_err(|e| {
        warn!(error = %e, "Rejected rule addition");
        e
    })?;

    info!(rule_id = %rule.id, "Rule created via HTTP");
    Ok((StatusCode::CREATED, Json(rule)))
}

/// Remove a rule by id.
#[instrument(skip(engine))]
pub async fn remove_rule_handler(
    State(engine): State<SharedEngine>,
    Path(id): Path<String>,
) -> Result<StatusCode, RuleError> {
    engine.remove_rule(&id).map_err(|e| {
        warn!(error = %e, "Rejected rule removal");
        e
    })?;

    Ok(StatusCode::NO_CONTENT)
}

//! Registry introspection endpoints.
//!
//! GET /api/v1/providers - registered providers with a live health probe.
//! GET /api/v1/roles     - loaded role definitions.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ProviderStatus {
    pub name: String,
    pub model: String,
    pub healthy: bool,
}

#[derive(Debug, Serialize)]
pub struct RoleSummary {
    pub name: String,
    pub description: String,
    pub api_type: String,
    pub concurrent: bool,
}

pub async fn list_providers(State(state): State<AppState>) -> Json<ApiResponse<Vec<ProviderStatus>>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let mut statuses = Vec::with_capacity(state.apis.len());
    for (name, healthy) in state.apis.health_report().await {
        let model = state
            .apis
            .get_api(&name)
            .map(|p| p.model().to_string())
            .unwrap_or_default();
        statuses.push(ProviderStatus { name, model, healthy });
    }

    Json(ApiResponse::success(
        statuses,
        request_id,
        start.elapsed().as_millis() as u64,
    ))
}

pub async fn list_roles(State(state): State<AppState>) -> Json<ApiResponse<Vec<RoleSummary>>> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let roles = state
        .roles
        .role_names()
        .into_iter()
        .filter_map(|key| state.roles.get_role(key).map(|role| (key, role)))
        .map(|(key, role)| RoleSummary {
            name: key.to_string(),
            description: role.description.clone(),
            api_type: role.api_type.clone(),
            concurrent: role.concurrent,
        })
        .collect();

    Json(ApiResponse::success(
        roles,
        request_id,
        start.elapsed().as_millis() as u64,
    ))
}

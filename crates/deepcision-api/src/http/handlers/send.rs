//! POST /api/v1/send - one role-composed chat turn.
//!
//! Each request gets a fresh agent for the named role; the agent is
//! terminated once the provider call returns.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use deepcision_core::agent::{AgentId, RoleManager};
use deepcision_observe::genai_attrs;
use deepcision_types::llm::ChatOverrides;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub provider: String,
    pub role: String,
    pub prompt: String,
    #[serde(default)]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub provider: String,
    pub role: String,
    pub agent_id: String,
    pub content: String,
}

/// Terminates the request's agent when dropped, including when the handler
/// future is cancelled mid-call.
struct AgentLease {
    roles: Arc<RoleManager>,
    id: AgentId,
}

impl Drop for AgentLease {
    fn drop(&mut self) {
        self.roles.terminate_agent(&self.id);
    }
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(request): Json<SendRequest>,
) -> Result<Json<ApiResponse<SendResponse>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    if request.prompt.trim().is_empty() {
        return Err(AppError::Validation("prompt must not be empty".into()));
    }

    let provider = state
        .apis
        .get_api(&request.provider)
        .ok_or_else(|| AppError::UnknownProvider(request.provider.clone()))?;
    let agent = state
        .roles
        .create_agent(&request.role)
        .ok_or_else(|| AppError::UnknownRole(request.role.clone()))?;
    let _lease = AgentLease {
        roles: state.roles.clone(),
        id: agent.id(),
    };

    let overrides = ChatOverrides {
        temperature: request.temperature,
        max_tokens: request.max_tokens,
        model: request.model.clone(),
    };

    let span = tracing::info_span!(
        "gen_ai.invoke",
        gen_ai.operation.name = genai_attrs::OP_CHAT,
        gen_ai.system = provider.name(),
        gen_ai.request.model = tracing::field::Empty,
        gen_ai.agent.id = %agent.id(),
        gen_ai.agent.name = %agent.role().name,
    );
    span.record(
        genai_attrs::GEN_AI_REQUEST_MODEL,
        overrides.model.as_deref().unwrap_or(provider.model()),
    );

    let content = provider
        .chat(&request.prompt, &agent, &overrides)
        .instrument(span)
        .await?;

    let data = SendResponse {
        provider: request.provider,
        role: request.role,
        agent_id: agent.id().to_string(),
        content,
    };
    Ok(Json(ApiResponse::success(
        data,
        request_id,
        start.elapsed().as_millis() as u64,
    )))
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use super::*;
    use deepcision_core::agent::manager::RoleManager;
    use deepcision_core::llm::manager::ApiManager;
    use deepcision_core::tokenizer::TokenizerService;
    use deepcision_infra::llm::DefaultProviderFactory;
    use deepcision_types::config::{ApiConfig, AppConfig};
    use deepcision_types::role::{PromptTemplate, RoleConfig};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn state_for(server: &MockServer) -> AppState {
        let mut providers = BTreeMap::new();
        providers.insert(
            "deepseek".to_string(),
            ApiConfig {
                api_key: Some("sk-ds".into()),
                base_url: Some(server.uri()),
                ..Default::default()
            },
        );
        let mut apis = ApiManager::new();
        apis.initialize(
            &providers,
            &DefaultProviderFactory::with_env(HashMap::<String, String>::new()),
        );

        let mut roles_map = HashMap::new();
        roles_map.insert(
            "analyst".to_string(),
            RoleConfig {
                name: "Analyst".into(),
                description: "reviews data".into(),
                api_type: "deepseek".into(),
                prompt_template: PromptTemplate::parse("Question: {question}").unwrap(),
                concurrent: false,
                temperature: Some(0.2),
                max_tokens: Some(300),
            },
        );
        let mut roles = RoleManager::new();
        assert!(roles.load_templates(&roles_map).await);

        AppState::from_parts(AppConfig::default(), apis, roles, TokenizerService::new())
    }

    fn send(provider: &str, role: &str, prompt: &str) -> SendRequest {
        SendRequest {
            provider: provider.into(),
            role: role.into(),
            prompt: prompt.into(),
            temperature: None,
            max_tokens: Some(100),
            model: None,
        }
    }

    #[tokio::test]
    async fn test_send_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(body_partial_json(json!({
                "messages": [
                    { "role": "system", "content": "You are Analyst reviews data" },
                    { "role": "user", "content": "Question: What is X?" }
                ],
                "temperature": 0.2,
                "max_tokens": 100
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{ "message": { "role": "assistant", "content": "X is Y" } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let state = state_for(&server).await;
        let Json(response) = send_message(State(state.clone()), Json(send("deepseek", "analyst", "What is X?")))
            .await
            .unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.content, "X is Y");
        assert_eq!(data.role, "analyst");
        assert_eq!(state.roles.active_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_provider_and_role() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;

        let err = send_message(State(state.clone()), Json(send("gemini", "analyst", "hi")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UnknownProvider(_)));

        let err = send_message(State(state), Json(send("deepseek", "poet", "hi")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::UnknownRole(_)));
    }

    #[tokio::test]
    async fn test_provider_error_terminates_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": {"message": "bad key"}})))
            .mount(&server)
            .await;

        let state = state_for(&server).await;
        let err = send_message(State(state.clone()), Json(send("deepseek", "analyst", "hi")))
            .await
            .err()
            .unwrap();
        assert_eq!(err.status(), axum::http::StatusCode::UNAUTHORIZED);
        assert_eq!(state.roles.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_request_terminates_agent() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "choices": [{ "message": { "role": "assistant", "content": "late" } }]
                    }))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let state = state_for(&server).await;
        let outcome = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            send_message(State(state.clone()), Json(send("deepseek", "analyst", "hi"))),
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(state.roles.active_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_prompt_rejected() {
        let server = MockServer::start().await;
        let state = state_for(&server).await;
        let err = send_message(State(state), Json(send("deepseek", "analyst", "  ")))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

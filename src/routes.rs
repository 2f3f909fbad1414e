use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

use crate::agent::output_types::ResponseValue;
use crate::state::AppState;

type ApiError = (StatusCode, Json<Value>);

pub fn create_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/api/health", get(health_check))
        // Sessions
        .route("/api/sessions", post(create_session))
        .route("/api/sessions/:session_id", delete(delete_session))
        .route("/api/sessions/:session_id/query", post(query_session))
        .route("/api/sessions/:session_id/history", get(session_history))
}

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(json!({ "error": message.into() })))
}

#[derive(Debug, Deserialize)]
struct HealthParams {
    #[serde(default)]
    probe: bool,
}

async fn health_check(
    State(state): State<AppState>,
    Query(params): Query<HealthParams>,
) -> Json<Value> {
    let system = &state.config.system_config;
    let mut body = json!({
        "status": "ok",
        "database": system.database_path,
        "table": system.table_name,
        "sessions": state.sessions.len(),
    });

    if params.probe {
        let (main, sql) = tokio::join!(state.main_llm.probe(), state.sql_llm.probe());
        let describe = |result: Result<String, crate::error::CompletionError>| match result {
            Ok(reply) => json!({ "ok": true, "reply": reply.trim() }),
            Err(e) => json!({ "ok": false, "error": e.to_string() }),
        };
        body["probe"] = json!({ "main": describe(main), "sql": describe(sql) });
    }

    Json(body)
}

async fn create_session(State(state): State<AppState>) -> Result<(StatusCode, Json<Value>), ApiError> {
    match state.create_session().await {
        Ok(session_id) => Ok((StatusCode::CREATED, Json(json!({ "session_id": session_id })))),
        Err(e) => {
            error!("Failed to create session: {}", e);
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
        }
    }
}

async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.remove_session(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "session not found"))
    }
}

#[derive(Debug, Deserialize)]
struct QueryRequest {
    query: String,
}

async fn query_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<ResponseValue>, ApiError> {
    let query = payload.query.trim();
    if query.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "query is required"));
    }

    let session = state
        .get_session(&session_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "session not found"))?;

    // Holding the lock for the whole turn keeps one session's turns strictly sequential
    let mut session = session.lock().await;
    info!("Session {} received query", session_id);
    Ok(Json(session.handle_turn(query).await))
}

async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = state
        .get_session(&session_id)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "session not found"))?;
    let session = session.lock().await;
    let entries: Vec<_> = session.transcript.iter().collect();
    Ok(Json(json!({
        "session_id": session_id,
        "entries": entries,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::agents::DatabaseAgent;
    use crate::agent::input_types::CompletionRequest;
    use crate::agent::stateless_llm::StatelessLLMInterface;
    use crate::config::Config;
    use crate::conversations::classifier::CLASSIFIER_SYSTEM_PROMPT;
    use crate::error::{AgentError, CompletionError};
    use crate::schema::tests::sample_db;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct MainLlm;

    #[async_trait]
    impl StatelessLLMInterface for MainLlm {
        async fn chat_completion(&self, request: CompletionRequest) -> Result<String, CompletionError> {
            if request.messages[0].content == CLASSIFIER_SYSTEM_PROMPT {
                let q = request.messages[1].content.to_lowercase();
                return Ok(if q.contains("arsenal") { "sql_required" } else { "general" }.to_string());
            }
            Ok("Three Arsenal forwards.".to_string())
        }
    }

    struct DownLlm;

    #[async_trait]
    impl StatelessLLMInterface for DownLlm {
        async fn chat_completion(&self, _request: CompletionRequest) -> Result<String, CompletionError> {
            Err(CompletionError::Http {
                status: 503,
                body: "maintenance".to_string(),
            })
        }
    }

    struct ForwardsAgent;

    #[async_trait]
    impl DatabaseAgent for ForwardsAgent {
        async fn invoke(&self, _prompt: &str) -> Result<Value, AgentError> {
            Ok(json!({"output": r#"{"forwards": ["Saka", "Jesus", "Havertz"]}"#}))
        }
    }

    fn app(db_path: &std::path::Path) -> (Router, AppState) {
        let mut config = Config::default();
        config.system_config.database_path = db_path.to_string_lossy().into_owned();
        let state = AppState::new(config, Arc::new(MainLlm), Arc::new(DownLlm), Arc::new(ForwardsAgent));
        (create_routes().with_state(state.clone()), state)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_session_query_and_history() {
        let db = sample_db();
        let (router, _state) = app(db.path());

        let created = router
            .clone()
            .oneshot(Request::builder().method("POST").uri("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
        let session_id = body_json(created).await["session_id"].as_str().unwrap().to_string();

        let answered = router
            .clone()
            .oneshot(post_json(
                &format!("/api/sessions/{}/query", session_id),
                json!({"query": "Show me all Arsenal forwards"}),
            ))
            .await
            .unwrap();
        assert_eq!(answered.status(), StatusCode::OK);
        assert_eq!(
            body_json(answered).await,
            json!({
                "type": "structured",
                "summary": "Three Arsenal forwards.",
                "data": {"forwards": ["Saka", "Jesus", "Havertz"]}
            })
        );

        let history = router
            .oneshot(
                Request::builder()
                    .uri(format!("/api/sessions/{}/history", session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        let history = body_json(history).await;
        assert_eq!(history["entries"].as_array().unwrap().len(), 1);
        assert_eq!(history["entries"][0]["user_query"], "Show me all Arsenal forwards");
    }

    #[tokio::test]
    async fn test_unknown_session_and_empty_query() {
        let db = sample_db();
        let (router, state) = app(db.path());

        let missing = router
            .clone()
            .oneshot(post_json("/api/sessions/nope/query", json!({"query": "hi"})))
            .await
            .unwrap();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let session_id = state.create_session().await.unwrap();
        let empty = router
            .oneshot(post_json(&format!("/api/sessions/{}/query", session_id), json!({"query": "  "})))
            .await
            .unwrap();
        assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_session_creation_fails_without_database() {
        let (router, _state) = app(std::path::Path::new("/nonexistent/league.db"));
        let response = router
            .oneshot(Request::builder().method("POST").uri("/api/sessions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_probe_reports_each_profile() {
        let db = sample_db();
        let (router, _state) = app(db.path());
        let response = router
            .oneshot(Request::builder().uri("/api/health?probe=true").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["probe"]["main"]["ok"], true);
        assert_eq!(body["probe"]["sql"]["ok"], false);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let db = sample_db();
        let (router, state) = app(db.path());
        let session_id = state.create_session().await.unwrap();

        let deleted = router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(format!("/api/sessions/{}", session_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
        assert!(state.get_session(&session_id).is_none());
    }
}

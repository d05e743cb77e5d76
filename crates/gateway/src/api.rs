//! The `/api` routes: knowledge CRUD and chat.
//!
//! Every error leaves as `{ "error": <message>, "kind": <tag> }` with the
//! status given by [`status_for`].

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use kbdesk_core::auth::Credential;
use kbdesk_core::error::{Error, ProviderError};
use kbdesk_core::knowledge::{KnowledgeEntry, NewKnowledge};
use kbdesk_core::message::ChatTurn;

use crate::SharedState;

/// Build the `/api` router.
pub fn api_router(state: SharedState) -> Router {
    Router::new()
        .route("/knowledge", get(list_handler).post(create_handler))
        .route("/knowledge/bulk", post(bulk_handler))
        .route("/knowledge/clear", post(clear_handler))
        .route("/knowledge/{id}", delete(delete_handler))
        .route("/chat", post(chat_handler))
        .with_state(state)
}

// ── DTOs ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
}

#[derive(Deserialize)]
struct CreateRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    answer: String,
    password: Option<String>,
}

#[derive(Deserialize, Default)]
struct PasswordRequest {
    password: Option<String>,
}

#[derive(Deserialize)]
struct BulkRequest {
    data: Vec<NewKnowledge>,
    password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CountResponse {
    pub success: bool,
    pub count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    /// The client's knowledge snapshot. The stored list is used when absent.
    #[serde(default)]
    pub knowledge: Option<Vec<NewKnowledge>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub text: String,
    pub format: String,
    pub indices: Vec<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<T, ApiError>;

// ── Error mapping ─────────────────────────────────────────────────────────

/// HTTP status for each error kind.
pub fn status_for(err: &Error) -> StatusCode {
    match err {
        Error::Validation(_) => StatusCode::BAD_REQUEST,
        Error::Unauthorized => StatusCode::UNAUTHORIZED,
        Error::Provider(ProviderError::NotConfigured(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        Error::Provider(_) => StatusCode::BAD_GATEWAY,
        Error::Import(_) => StatusCode::BAD_REQUEST,
        Error::Store(_) | Error::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: Error) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(kind = err.kind(), error = %err, "Request failed");
    } else {
        warn!(kind = err.kind(), error = %err, "Request rejected");
    }
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }),
    )
}

/// Unwrap a JSON body, turning a malformed one into a validation error.
fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let (status, Json(body)) = api_error(Error::Validation(rejection.body_text()));
            // Keep 413 for oversized bodies.
            let status = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
                StatusCode::PAYLOAD_TOO_LARGE
            } else {
                status
            };
            Err((status, Json(body)))
        }
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn list_handler(State(state): State<SharedState>) -> ApiResult<Json<Vec<KnowledgeEntry>>> {
    state.knowledge.list().await.map(Json).map_err(api_error)
}

async fn create_handler(
    State(state): State<SharedState>,
    payload: Result<Json<CreateRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<KnowledgeEntry>)> {
    let req = json_body(payload)?;
    let entry = state
        .knowledge
        .create(
            Credential::from_option(req.password.as_deref()),
            &req.question,
            &req.answer,
        )
        .await
        .map_err(api_error)?;
    Ok((StatusCode::CREATED, Json(entry)))
}

async fn delete_handler(
    State(state): State<SharedState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> ApiResult<Json<SuccessResponse>> {
    let Path(id) = id.map_err(|r| api_error(Error::Validation(r.body_text())))?;
    // A missing body is just a missing password.
    let req = payload.map(|Json(r)| r).unwrap_or_default();

    state
        .knowledge
        .delete_by_id(Credential::from_option(req.password.as_deref()), id)
        .await
        .map_err(api_error)?;
    Ok(Json(SuccessResponse { success: true }))
}

async fn bulk_handler(
    State(state): State<SharedState>,
    payload: Result<Json<BulkRequest>, JsonRejection>,
) -> ApiResult<Json<CountResponse>> {
    let req = json_body(payload)?;
    let submitted = req.data.len();
    let count = state
        .knowledge
        .bulk_create(Credential::from_option(req.password.as_deref()), &req.data)
        .await
        .map_err(api_error)?;
    info!(submitted, inserted = count, "Bulk import");
    Ok(Json(CountResponse {
        success: true,
        count: count as u64,
    }))
}

async fn clear_handler(
    State(state): State<SharedState>,
    payload: Result<Json<PasswordRequest>, JsonRejection>,
) -> ApiResult<Json<CountResponse>> {
    let req = payload.map(|Json(r)| r).unwrap_or_default();
    let count = state
        .knowledge
        .clear_all(Credential::from_option(req.password.as_deref()))
        .await
        .map_err(api_error)?;
    Ok(Json(CountResponse { success: true, count }))
}

async fn chat_handler(
    State(state): State<SharedState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let req = json_body(payload)?;
    info!(history = req.history.len(), client_snapshot = req.knowledge.is_some(), "Chat request");

    let reply = match &req.knowledge {
        Some(snapshot) => state.chat.respond(snapshot.as_slice(), &req.history, &req.message).await,
        None => {
            let entries = state.knowledge.list().await.map_err(api_error)?;
            state.chat.respond(entries.as_slice(), &req.history, &req.message).await
        }
    }
    .map_err(api_error)?;

    Ok(Json(ChatResponse {
        indices: reply.format.indices(),
        format: reply.format.as_str().to_string(),
        text: reply.text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayState;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use kbdesk_agent::testing::ScriptedProvider;
    use kbdesk_agent::{ChatService, KnowledgeService, PromptAssembler};
    use kbdesk_core::message::Role;
    use kbdesk_security::SharedSecretPolicy;
    use kbdesk_store::InMemoryStore;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;

    const PASSWORD: &str = "s3cret";

    fn state_with(provider: Arc<ScriptedProvider>) -> SharedState {
        Arc::new(GatewayState {
            knowledge: KnowledgeService::new(
                Arc::new(InMemoryStore::new()),
                Arc::new(SharedSecretPolicy::new(Some(PASSWORD.into()))),
            ),
            chat: ChatService::new(provider, PromptAssembler::default()),
        })
    }

    fn test_state() -> SharedState {
        state_with(Arc::new(ScriptedProvider::replies(Vec::<String>::new())))
    }

    async fn call(
        state: &SharedState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                req = req.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = api_router(state.clone())
            .oneshot(req.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn create_then_list() {
        let state = test_state();
        let (status, created) = call(
            &state,
            "POST",
            "/knowledge",
            Some(json!({
                "question": " Erro de login ",
                "answer": "Resetar senha no portal",
                "password": PASSWORD
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["question"], "Erro de login");

        let (status, list) = call(&state, "GET", "/knowledge", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], created["id"]);
    }

    #[tokio::test]
    async fn create_with_wrong_password_is_401() {
        let state = test_state();
        let (status, body) = call(
            &state,
            "POST",
            "/knowledge",
            Some(json!({"question": "q", "answer": "a", "password": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["kind"], "unauthorized");
    }

    #[tokio::test]
    async fn create_with_blank_answer_is_400() {
        let state = test_state();
        let (status, body) = call(
            &state,
            "POST",
            "/knowledge",
            Some(json!({"question": "q", "answer": "  ", "password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn bulk_reports_inserted_count() {
        let state = test_state();
        let (status, body) = call(
            &state,
            "POST",
            "/knowledge/bulk",
            Some(json!({
                "data": [
                    {"question": "q1", "answer": "a1"},
                    {"question": "", "answer": "a2"},
                    {"question": "q3", "answer": "a3"}
                ],
                "password": PASSWORD
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "count": 2}));
    }

    #[tokio::test]
    async fn bulk_with_non_array_data_is_400() {
        let state = test_state();
        let (status, body) = call(
            &state,
            "POST",
            "/knowledge/bulk",
            Some(json!({"data": "not a list", "password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn delete_is_idempotent_and_gated() {
        let state = test_state();
        let (_, created) = call(
            &state,
            "POST",
            "/knowledge",
            Some(json!({"question": "q", "answer": "a", "password": PASSWORD})),
        )
        .await;
        let uri = format!("/knowledge/{}", created["id"]);

        let (status, _) = call(&state, "DELETE", &uri, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            call(&state, "DELETE", &uri, Some(json!({"password": PASSWORD}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);

        let (status, _) = call(&state, "DELETE", &uri, Some(json!({"password": PASSWORD}))).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn delete_with_bad_id_is_400() {
        let state = test_state();
        let (status, body) = call(
            &state,
            "DELETE",
            "/knowledge/abc",
            Some(json!({"password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["kind"], "validation");
    }

    #[tokio::test]
    async fn clear_returns_count() {
        let state = test_state();
        call(
            &state,
            "POST",
            "/knowledge/bulk",
            Some(json!({
                "data": [{"question": "q1", "answer": "a1"}, {"question": "q2", "answer": "a2"}],
                "password": PASSWORD
            })),
        )
        .await;

        let (status, body) = call(
            &state,
            "POST",
            "/knowledge/clear",
            Some(json!({"password": PASSWORD})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"success": true, "count": 2}));
    }

    #[tokio::test]
    async fn chat_uses_client_snapshot() {
        let provider = Arc::new(ScriptedProvider::replies(["1 - Resetar senha no portal"]));
        let state = state_with(provider.clone());

        let (status, body) = call(
            &state,
            "POST",
            "/chat",
            Some(json!({
                "message": "não consigo logar",
                "history": [],
                "knowledge": [{"question": "Erro de login", "answer": "Resetar senha no portal"}]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["text"], "1 - Resetar senha no portal");
        assert_eq!(body["format"], "indexed");
        assert_eq!(body["indices"], json!([1]));

        let sent = &provider.calls().await[0];
        assert!(sent[0].content.contains("KNOWLEDGE BASE (1 entries):"));
    }

    #[tokio::test]
    async fn chat_falls_back_to_stored_list() {
        let provider = Arc::new(ScriptedProvider::replies(["1 - Limpar cache\n2 - Resetar senha"]));
        let state = state_with(provider.clone());
        call(
            &state,
            "POST",
            "/knowledge/bulk",
            Some(json!({
                "data": [
                    {"question": "Erro de login", "answer": "Resetar senha"},
                    {"question": "Tela branca", "answer": "Limpar cache"}
                ],
                "password": PASSWORD
            })),
        )
        .await;

        let (status, body) = call(
            &state,
            "POST",
            "/chat",
            Some(json!({
                "message": "liste tudo",
                "history": [
                    {"role": "user", "text": "oi"},
                    {"role": "model", "text": "1 - Resetar senha"}
                ]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["format"], "listing");
        assert_eq!(body["text"], "1 - Limpar cache\n\n2 - Resetar senha");

        let sent = &provider.calls().await[0];
        assert_eq!(sent.len(), 4);
        assert_eq!(sent[2].role, Role::Assistant);
        // Newest first: the second bulk item is Index 1.
        assert!(sent[0].content.contains("Index: 1\nQuestion: Tela branca"));
    }

    #[tokio::test]
    async fn chat_upstream_failure_is_502() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::Upstream {
            status: Some(500),
            body: "boom".into(),
        })]));
        let state = state_with(provider);

        let (status, body) =
            call(&state, "POST", "/chat", Some(json!({"message": "oi", "knowledge": []}))).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["kind"], "upstream");
    }

    #[tokio::test]
    async fn chat_missing_provider_config_is_500() {
        let provider = Arc::new(ScriptedProvider::new(vec![Err(ProviderError::NotConfigured(
            "no API key configured".into(),
        ))]));
        let state = state_with(provider);

        let (status, body) =
            call(&state, "POST", "/chat", Some(json!({"message": "oi", "knowledge": []}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["kind"], "config");
    }

    #[tokio::test]
    async fn chat_empty_message_is_400() {
        let state = test_state();
        let (status, _) = call(&state, "POST", "/chat", Some(json!({"message": " "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_for(&Error::Provider(ProviderError::EmptyResponse)),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_for(&Error::Store(kbdesk_core::error::StoreError::Storage("x".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

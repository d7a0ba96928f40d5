use crate::chat::compose::AttachmentError;
use crate::chat::{ ChatAssistant, SendError };
use crate::models::language::{ language_options, ParseLanguageError };
use crate::models::Language;
use crate::reader::{ Reader, ReaderError, ReaderView, TranslationJob };
use axum::{
    routing::{ get, post },
    Router,
    Json,
    extract::{ DefaultBodyLimit, State, Query, rejection::{ JsonRejection, QueryRejection } },
    response::{ IntoResponse, Response },
    http::StatusCode,
};
use serde::{ Deserialize, Serialize };
use std::sync::Arc;
use tower_http::cors::{ Any, CorsLayer };
use log::{ info, warn };

#[derive(Clone)]
pub struct AppState {
    pub reader: Arc<Reader>,
    pub chat: Arc<ChatAssistant>,
}

#[derive(Deserialize)]
pub struct SelectChapterRequest {
    pub id: String,
}

#[derive(Deserialize)]
pub struct SelectLanguageRequest {
    pub code: String,
}

#[derive(Deserialize)]
pub struct AttachmentPayload {
    pub name: String,
    pub content: String,
}

#[derive(Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub text: String,
    pub attachment: Option<AttachmentPayload>,
}

#[derive(Deserialize)]
pub struct ClearQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self { status, message: message.into() }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!("API error {}: {}", self.status, self.message);
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<ReaderError> for ApiError {
    fn from(err: ReaderError) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, err.to_string())
    }
}

impl From<ParseLanguageError> for ApiError {
    fn from(err: ParseLanguageError) -> Self {
        ApiError::new(StatusCode::NOT_FOUND, err.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(err: JsonRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, err.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(err: QueryRejection) -> Self {
        ApiError::new(StatusCode::BAD_REQUEST, err.body_text())
    }
}

impl From<SendError> for ApiError {
    fn from(err: SendError) -> Self {
        let status = match err {
            SendError::Empty => StatusCode::BAD_REQUEST,
            SendError::Busy => StatusCode::CONFLICT,
        };
        ApiError::new(status, err.to_string())
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        let status = match err {
            AttachmentError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            _ => StatusCode::BAD_REQUEST,
        };
        ApiError::new(status, err.to_string())
    }
}

/// Request body limit for a chat send carrying an attachment of up to
/// `max_attachment_bytes`. JSON escaping can grow each byte to six
/// (`\u0001`), plus room for the message text.
pub fn body_limit(max_attachment_bytes: u64) -> usize {
    let escaped = max_attachment_bytes.saturating_mul(6).saturating_add(64 * 1024);
    usize::try_from(escaped).unwrap_or(usize::MAX)
}

pub fn router(state: AppState) -> Router {
    let limit = body_limit(state.chat.max_attachment_bytes());
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chapters", get(chapters_handler))
        .route("/api/languages", get(languages_handler))
        .route("/api/reader", get(reader_handler))
        .route("/api/reader/chapter", post(select_chapter_handler))
        .route("/api/reader/language", post(select_language_handler))
        .route("/api/chat", get(chat_state_handler).post(send_handler).delete(clear_handler))
        .route("/api/chat/open", post(open_chat_handler))
        .route("/api/chat/close", post(close_chat_handler))
        .layer(DefaultBodyLimit::max(limit))
        .layer(cors)
        .with_state(state)
}

pub async fn start_http_server(
    addr: &str,
    state: AppState
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        format!("Failed to bind HTTP server to {}: {}. Try a different address.", addr, e)
    })?;
    info!("Starting HTTP API server on: http://{}", addr);
    axum::serve(listener, router(state).into_make_service()).await?;
    Ok(())
}

/// Runs the translation in the background so the caller gets the
/// "translating" view immediately.
fn spawn_translation(reader: &Arc<Reader>, job: Option<TranslationJob>) {
    if let Some(job) = job {
        let reader = Arc::clone(reader);
        tokio::spawn(async move {
            reader.complete(job).await;
        });
    }
}

async fn chapters_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.reader.library().sections())
}

async fn languages_handler() -> impl IntoResponse {
    Json(language_options())
}

async fn reader_handler(State(state): State<AppState>) -> Json<ReaderView> {
    Json(state.reader.view())
}

async fn select_chapter_handler(
    State(state): State<AppState>,
    payload: Result<Json<SelectChapterRequest>, JsonRejection>
) -> Result<Json<ReaderView>, ApiError> {
    let Json(req) = payload?;
    let job = state.reader.select_chapter(&req.id)?;
    spawn_translation(&state.reader, job);
    Ok(Json(state.reader.view()))
}

async fn select_language_handler(
    State(state): State<AppState>,
    payload: Result<Json<SelectLanguageRequest>, JsonRejection>
) -> Result<Json<ReaderView>, ApiError> {
    let Json(req) = payload?;
    let language: Language = req.code.parse()?;
    let job = state.reader.select_language(language);
    spawn_translation(&state.reader, job);
    Ok(Json(state.reader.view()))
}

async fn chat_state_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chat.state())
}

async fn open_chat_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.chat.set_open(true);
    Json(state.chat.state())
}

async fn close_chat_handler(State(state): State<AppState>) -> impl IntoResponse {
    state.chat.set_open(false);
    Json(state.chat.state())
}

async fn send_handler(
    State(state): State<AppState>,
    payload: Result<Json<SendRequest>, JsonRejection>
) -> Result<impl IntoResponse, ApiError> {
    let Json(req) = payload?;
    let attachment = match req.attachment {
        Some(file) => Some(state.chat.attach_content(&file.name, &file.content)?),
        None => None,
    };
    let language = state.reader.language();
    let exchange = state.chat.send(&req.text, attachment, language).await?;
    Ok(Json(exchange))
}

async fn clear_handler(
    State(state): State<AppState>,
    query: Result<Query<ClearQuery>, QueryRejection>
) -> Result<impl IntoResponse, ApiError> {
    let Query(query) = query?;
    if !state.chat.clear(query.confirm) {
        return Err(
            ApiError::new(
                StatusCode::BAD_REQUEST,
                "Clearing the chat history needs confirmation (?confirm=true)"
            )
        );
    }
    Ok(Json(state.chat.state()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::compose::DEFAULT_MAX_ATTACHMENT_BYTES;
    use crate::chat::store::STORAGE_KEY;
    use crate::content::Library;
    use crate::llm::testing::FakeGenerator;
    use crate::llm::AiClient;
    use crate::storage::{ KeyValueStorage, MemoryStorage };
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{ json, Value };
    use std::time::Duration;
    use tower::ServiceExt;

    struct Fixture {
        app: Router,
        fake: Arc<FakeGenerator>,
        storage: Arc<MemoryStorage>,
    }

    fn fixture() -> Fixture {
        fixture_with_limit(32)
    }

    fn fixture_with_limit(max_attachment_bytes: u64) -> Fixture {
        let fake = Arc::new(FakeGenerator::new());
        let storage = Arc::new(MemoryStorage::new());
        let client = Arc::new(AiClient::with_generator(fake.clone()));
        let library = Arc::new(Library::builtin().unwrap());
        let state = AppState {
            reader: Arc::new(Reader::new(library, client.clone())),
            chat: Arc::new(ChatAssistant::new(storage.clone(), &client, max_attachment_bytes)),
        };
        Fixture { app: router(state), fake, storage }
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    async fn call_raw(app: &Router, method: &str, uri: &str, body: &str) -> (StatusCode, Value) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let resp = app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn lists_chapters_and_languages() {
        let f = fixture();
        let (status, sections) = call(&f.app, "GET", "/api/chapters", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(sections[0]["category"], "Foundation");
        assert_eq!(sections[2]["chapters"][1]["id"], "build-bench");

        let (_, languages) = call(&f.app, "GET", "/api/languages", None).await;
        assert_eq!(languages.as_array().unwrap().len(), 4);
        assert_eq!(languages[1]["code"], "es");
    }

    #[tokio::test]
    async fn chapter_selection_in_english_is_immediate() {
        let f = fixture();
        let (status, view) = call(
            &f.app,
            "POST",
            "/api/reader/chapter",
            Some(json!({ "id": "build-sawhorse" }))
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["title"], "Build 1: The Stackable Sawhorse");
        assert_eq!(view["translating"], false);
        assert_eq!(f.fake.calls(), 0);

        let (status, _) = call(&f.app, "POST", "/api/reader/chapter", Some(json!({ "id": "x" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn language_selection_translates_in_background() {
        let f = fixture();
        let (status, view) = call(
            &f.app,
            "POST",
            "/api/reader/language",
            Some(json!({ "code": "de" }))
        ).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["translating"], true);
        assert_eq!(view["title"], "Understanding Wood Grain");

        let mut view = Value::Null;
        for _ in 0..50 {
            let (_, current) = call(&f.app, "GET", "/api/reader", None).await;
            if current["translating"] == false {
                view = current;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(view["language"], "de");
        assert!(view["title"].as_str().unwrap().contains("German"));

        let (status, _) = call(&f.app, "POST", "/api/reader/language", Some(json!({ "code": "xx" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn chat_round_trip_and_clear() {
        let f = fixture();
        let (_, state) = call(&f.app, "POST", "/api/chat/open", None).await;
        assert_eq!(state["isOpen"], true);

        let (status, exchange) = call(&f.app, "POST", "/api/chat", Some(json!({ "text": "Hi" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exchange["question"]["role"], "user");
        assert_eq!(exchange["reply"]["text"], "echo: Hi");

        let (_, state) = call(&f.app, "GET", "/api/chat", None).await;
        assert_eq!(state["messages"].as_array().unwrap().len(), 3);

        let (status, _) = call(&f.app, "DELETE", "/api/chat", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, state) = call(&f.app, "DELETE", "/api/chat?confirm=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(state["messages"].as_array().unwrap().len(), 1);
        assert!(f.storage.get(STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_empty_and_oversized_sends() {
        let f = fixture();
        let (status, body) = call(&f.app, "POST", "/api/chat", Some(json!({ "text": "  " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let big = json!({ "text": "look", "attachment": { "name": "a.txt", "content": "x".repeat(33) } });
        let (status, body) = call(&f.app, "POST", "/api/chat", Some(big)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert!(body["error"].as_str().unwrap().starts_with("File is too large"));

        assert_eq!(f.fake.calls(), 0);
        assert!(f.storage.get(STORAGE_KEY).unwrap().is_none());
    }

    #[tokio::test]
    async fn malformed_requests_get_json_errors() {
        let f = fixture();
        let (status, body) = call(&f.app, "POST", "/api/reader/chapter", Some(json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("id"));

        let (status, body) = call_raw(&f.app, "POST", "/api/chat", "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(&f.app, "DELETE", "/api/chat?confirm=yes", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert_eq!(f.fake.calls(), 0);
    }

    #[tokio::test]
    async fn accepts_attachment_at_the_default_limit() {
        let f = fixture_with_limit(DEFAULT_MAX_ATTACHMENT_BYTES);
        let content = "\n".repeat(DEFAULT_MAX_ATTACHMENT_BYTES as usize);
        let body = json!({ "text": "", "attachment": { "name": "cuts.txt", "content": content } });
        let (status, exchange) = call(&f.app, "POST", "/api/chat", Some(body)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(exchange["question"]["text"], "[Attached File: cuts.txt]");
        assert_eq!(f.fake.calls(), 1);
    }
}

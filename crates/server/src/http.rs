//! HTTP Endpoints
//!
//! REST API for the chat relay.

use axum::{
    extract::{
        multipart::MultipartRejection, rejection::JsonRejection, DefaultBodyLimit, Json, Multipart,
        State,
    },
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use pragna_agent::RelayReply;
use pragna_core::{preview, Language};
use pragna_pipeline::AudioUpload;

use crate::metrics::{metrics_handler, record_request};
use crate::state::AppState;
use crate::ServerError;

/// User id assumed when a request names none
pub const DEFAULT_USER_ID: &str = "default";

/// Origin of the bundled Vite web client
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    let config = &state.config.server;
    let cors_layer = build_cors_layer(&config.cors_origins, config.cors_enabled);
    let body_limit = DefaultBodyLimit::max(config.max_upload_bytes);
    let static_files = ServeDir::new(&config.static_dir);

    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/clear_history", post(clear_history))
        .route("/api/status", get(status))
        .route("/api/process_text", post(process_text))
        .route("/api/process_audio", post(process_audio))
        .route("/api/tts_only", post(tts_only))
        // Prometheus metrics
        .route("/metrics", get(metrics_handler))
        // Web client
        .fallback_service(static_files)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors_layer)
                .layer(body_limit),
        )
        .with_state(state)
}

/// Build CORS layer from configured origins
///
/// - If cors_enabled is false, returns permissive layer
/// - If cors_origins is empty, allows only the local web client
/// - Otherwise, uses the configured origins
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled - allowing all origins");
        return CorsLayer::permissive();
    }

    let mut parsed_origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| {
            origin.parse::<HeaderValue>().ok().or_else(|| {
                tracing::warn!("Invalid CORS origin: {}", origin);
                None
            })
        })
        .collect();

    if parsed_origins.is_empty() {
        tracing::info!("No usable CORS origins configured, defaulting to {}", DEFAULT_CORS_ORIGIN);
        parsed_origins.push(HeaderValue::from_static(DEFAULT_CORS_ORIGIN));
    } else {
        tracing::info!("CORS configured with {} origins", parsed_origins.len());
    }

    CorsLayer::new()
        .allow_origin(parsed_origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

fn user_or_default(user_id: Option<String>) -> String {
    user_id.unwrap_or_else(|| DEFAULT_USER_ID.to_string())
}

/// Chat request
#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: Option<String>,
    language: Option<String>,
    user_id: Option<String>,
}

/// Chat response
#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
    language: &'static str,
}

/// `POST /api/chat`
async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<ChatResponse>, ServerError> {
    record_request("chat");

    let Ok(Json(request)) = payload else {
        return Err(ServerError::invalid("Message is required"));
    };
    let message = request
        .message
        .ok_or_else(|| ServerError::invalid("Message is required"))?;
    let message = message.trim();
    if message.is_empty() {
        return Err(ServerError::invalid("Message cannot be empty"));
    }

    let language = Language::normalize(request.language.as_deref().unwrap_or_default());
    let user_id = user_or_default(request.user_id);

    tracing::info!(
        user_id = %user_id,
        language = language.code(),
        "Received message: {}...",
        preview(message, 50)
    );

    let response = state.relay.chat(message, language, &user_id).await;

    Ok(Json(ChatResponse {
        response,
        language: language.code(),
    }))
}

#[derive(Debug, Default, Deserialize)]
struct ClearHistoryRequest {
    user_id: Option<String>,
}

/// `POST /api/clear_history`; the body is optional
async fn clear_history(
    State(state): State<AppState>,
    payload: Result<Json<ClearHistoryRequest>, JsonRejection>,
) -> Json<serde_json::Value> {
    record_request("clear_history");

    let request = payload.map(|Json(r)| r).unwrap_or_default();
    state.relay.clear_history(&user_or_default(request.user_id));

    Json(serde_json::json!({ "message": "History cleared" }))
}

#[derive(Debug, Serialize)]
struct LanguageInfo {
    code: &'static str,
    name: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    status: &'static str,
    /// Whether the chat service accepted the configured credentials
    models_loaded: bool,
    model: String,
    stt_model: String,
    languages: Vec<LanguageInfo>,
    active_users: usize,
}

/// `GET /api/status`
async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    let orchestrator = state.relay.orchestrator();
    let models_loaded = orchestrator.is_available().await;
    if !models_loaded {
        tracing::warn!(model = orchestrator.model_name(), "Chat service unavailable");
    }

    Json(StatusResponse {
        status: "healthy",
        models_loaded,
        model: orchestrator.model_name().to_string(),
        stt_model: state.relay.stt_model().to_string(),
        languages: Language::all()
            .iter()
            .map(|l| LanguageInfo {
                code: l.code(),
                name: l.name(),
            })
            .collect(),
        active_users: state.active_users(),
    })
}

#[derive(Debug, Deserialize)]
struct ProcessTextRequest {
    text: Option<String>,
    language: Option<String>,
    user_id: Option<String>,
}

/// Reply shape shared by the text and audio endpoints
#[derive(Debug, Serialize)]
struct ProcessResponse {
    response_text: String,
    detected_language: &'static str,
    user_language: &'static str,
    audio_response: Option<String>,
    audio_mime: Option<String>,
    /// Always empty; kept for the web client
    web_search_sources: Vec<serde_json::Value>,
}

impl From<RelayReply> for ProcessResponse {
    fn from(reply: RelayReply) -> Self {
        let (audio_response, audio_mime) = match reply.audio {
            Some(audio) => (Some(audio.to_base64()), Some(audio.mime)),
            None => (None, None),
        };
        Self {
            response_text: reply.response_text,
            detected_language: reply.language.code(),
            user_language: reply.language.code(),
            audio_response,
            audio_mime,
            web_search_sources: Vec::new(),
        }
    }
}

/// `POST /api/process_text`
async fn process_text(
    State(state): State<AppState>,
    payload: Result<Json<ProcessTextRequest>, JsonRejection>,
) -> Result<Json<ProcessResponse>, ServerError> {
    record_request("process_text");

    let Ok(Json(request)) = payload else {
        return Err(ServerError::invalid("Message is required"));
    };
    let text = request.text.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(ServerError::invalid("Message is required"));
    }
    let user_id = user_or_default(request.user_id);

    tracing::info!(
        user_id = %user_id,
        language = request.language.as_deref().unwrap_or("en"),
        "Received text request: {}...",
        preview(text, 50)
    );

    let reply = state
        .relay
        .process_text(text, request.language.as_deref().unwrap_or_default(), &user_id)
        .await;

    Ok(Json(reply.into()))
}

/// `POST /api/process_audio` (multipart: `audio`, `language`, `user_id`)
async fn process_audio(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ProcessResponse>, ServerError> {
    record_request("process_audio");

    let mut multipart = multipart.map_err(|_| ServerError::invalid("No audio file provided"))?;

    let mut upload: Option<AudioUpload> = None;
    let mut language: Option<String> = None;
    let mut user_id: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::invalid(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "audio" => {
                // A plain form value named `audio` is not a file
                let Some(filename) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field
                    .content_type()
                    .unwrap_or(AudioUpload::DEFAULT_CONTENT_TYPE)
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::invalid(format!("Invalid multipart body: {}", e)))?;
                upload = Some(
                    AudioUpload::new(bytes.to_vec())
                        .with_filename(filename)
                        .with_content_type(content_type),
                );
            }
            "language" => {
                language = field.text().await.ok();
            }
            "user_id" => {
                user_id = field.text().await.ok();
            }
            _ => {}
        }
    }

    let upload = upload.ok_or_else(|| ServerError::invalid("No audio file provided"))?;
    if upload.filename.is_empty() {
        return Err(ServerError::invalid("Empty audio file"));
    }
    let user_id = user_or_default(user_id);

    tracing::info!(
        user_id = %user_id,
        filename = %upload.filename,
        bytes = upload.bytes.len(),
        hint = ?language,
        "Received audio file"
    );

    let reply = state
        .relay
        .process_audio(&upload, language.as_deref(), &user_id)
        .await
        .map_err(|_| ServerError::invalid("Could not transcribe audio"))?;

    Ok(Json(reply.into()))
}

#[derive(Debug, Deserialize)]
struct TtsRequest {
    text: Option<String>,
    language: Option<String>,
    speed: Option<f32>,
}

#[derive(Debug, Serialize)]
struct TtsResponse {
    audio_response: String,
    audio_mime: String,
}

/// `POST /api/tts_only`
async fn tts_only(
    State(state): State<AppState>,
    payload: Result<Json<TtsRequest>, JsonRejection>,
) -> Result<Json<TtsResponse>, ServerError> {
    record_request("tts_only");

    let Ok(Json(request)) = payload else {
        return Err(ServerError::invalid("Text is required"));
    };
    let text = request.text.unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(ServerError::invalid("Text is required"));
    }
    let language = request.language.as_deref().unwrap_or_default();

    tracing::info!(
        language,
        speed = ?request.speed,
        "TTS request: {}...",
        preview(text, 50)
    );

    let audio = state
        .relay
        .synthesize(text, language, request.speed)
        .await
        .map_err(|e| ServerError::Synthesis(e.to_string()))?;

    Ok(Json(TtsResponse {
        audio_response: audio.to_base64(),
        audio_mime: audio.mime,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use pragna_config::Settings;
    use pragna_llm::{FinishReason, GenerateRequest, GenerationResult, LlmBackend, LlmError};
    use pragna_pipeline::{SttBackend, SttError, SynthesizedAudio, TtsBackend, TtsError};
    use tower::ServiceExt;

    struct EchoLlm {
        available: bool,
    }

    #[async_trait]
    impl LlmBackend for EchoLlm {
        async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult, LlmError> {
            let last = request.messages.last().map(|m| m.content()).unwrap_or_default();
            Ok(GenerationResult {
                text: format!("echo: {}", last),
                tokens: 2,
                total_time_ms: 1,
                finish_reason: FinishReason::Stop,
            })
        }

        async fn is_available(&self) -> bool {
            self.available
        }

        fn model_name(&self) -> &str {
            "echo-model"
        }
    }

    struct FixedStt(Option<&'static str>);

    #[async_trait]
    impl SttBackend for FixedStt {
        async fn transcribe(
            &self,
            audio: &AudioUpload,
            _language: Option<Language>,
        ) -> Result<String, SttError> {
            if audio.is_empty() {
                return Err(SttError::EmptyAudio);
            }
            self.0.map(str::to_string).ok_or(SttError::EmptyTranscription)
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    struct FixedTts {
        fail: bool,
    }

    #[async_trait]
    impl TtsBackend for FixedTts {
        async fn synthesize(
            &self,
            _text: &str,
            _language: Language,
            _speed: f32,
        ) -> Result<SynthesizedAudio, TtsError> {
            if self.fail {
                Err(TtsError::Api {
                    status: 503,
                    message: "unavailable".into(),
                })
            } else {
                Ok(SynthesizedAudio::mpeg(b"ID3".to_vec()))
            }
        }
    }

    fn app_with(transcript: Option<&'static str>, tts_fails: bool) -> Router {
        let state = AppState::with_backends(
            Settings::default(),
            Arc::new(EchoLlm { available: true }),
            Arc::new(FixedStt(transcript)),
            Arc::new(FixedTts { fail: tts_fails }),
        );
        create_router(state)
    }

    fn app() -> Router {
        app_with(Some("नमस्ते"), false)
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn multipart_request(parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
        let boundary = "pragna-test-boundary";
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
            match filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: audio/webm\r\n\r\n",
                        name, filename
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n", name).as_bytes(),
                ),
            }
            body.extend_from_slice(data.as_bytes());
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        Request::builder()
            .method("POST")
            .uri("/api/process_audio")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_chat() {
        let (status, json) = send(
            app(),
            json_request("/api/chat", serde_json::json!({"message": "  hi  ", "language": "kn"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response"], "echo: hi");
        assert_eq!(json["language"], "kn");
    }

    #[tokio::test]
    async fn test_chat_unknown_language_falls_back_to_english() {
        let (_, json) = send(
            app(),
            json_request("/api/chat", serde_json::json!({"message": "hi", "language": "fr"})),
        )
        .await;
        assert_eq!(json["language"], "en");

        let (_, json) = send(
            app(),
            json_request("/api/chat", serde_json::json!({"message": "hi", "language": "HI"})),
        )
        .await;
        assert_eq!(json["language"], "en");
    }

    #[tokio::test]
    async fn test_chat_validation() {
        let (status, json) = send(app(), json_request("/api/chat", serde_json::json!({}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message is required");

        let (status, json) = send(
            app(),
            json_request("/api/chat", serde_json::json!({"message": "   "})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message cannot be empty");

        let request = Request::builder()
            .method("POST")
            .uri("/api/chat")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_clear_history_without_body() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/clear_history")
            .body(Body::empty())
            .unwrap();
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "History cleared");
    }

    #[tokio::test]
    async fn test_history_flow_through_status() {
        let app = app();
        send(
            app.clone(),
            json_request("/api/chat", serde_json::json!({"message": "hi", "user_id": "u1"})),
        )
        .await;

        let status_request = || Request::builder().uri("/api/status").body(Body::empty()).unwrap();
        let (status, json) = send(app.clone(), status_request()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["models_loaded"], true);
        assert_eq!(json["model"], "echo-model");
        assert_eq!(json["stt_model"], "fixed");
        assert_eq!(json["languages"].as_array().map(|l| l.len()), Some(10));
        assert_eq!(json["active_users"], 1);

        send(
            app.clone(),
            json_request("/api/clear_history", serde_json::json!({"user_id": "u1"})),
        )
        .await;
        let (_, json) = send(app, status_request()).await;
        assert_eq!(json["active_users"], 0);
    }

    #[tokio::test]
    async fn test_status_reports_unavailable_chat_service() {
        let state = AppState::with_backends(
            Settings::default(),
            Arc::new(EchoLlm { available: false }),
            Arc::new(FixedStt(None)),
            Arc::new(FixedTts { fail: false }),
        );
        let request = Request::builder().uri("/api/status").body(Body::empty()).unwrap();
        let (status, json) = send(create_router(state), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["models_loaded"], false);
    }

    #[tokio::test]
    async fn test_process_text() {
        let (status, json) = send(
            app(),
            json_request(
                "/api/process_text",
                serde_json::json!({"text": "hello", "language": "ta"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["response_text"], "echo: hello");
        assert_eq!(json["detected_language"], "ta");
        assert_eq!(json["user_language"], "ta");
        assert_eq!(json["audio_response"], "SUQz");
        assert_eq!(json["audio_mime"], "audio/mpeg");
        assert_eq!(json["web_search_sources"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_process_text_without_audio() {
        let (status, json) = send(
            app_with(None, true),
            json_request("/api/process_text", serde_json::json!({"text": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["audio_response"].is_null());
        assert!(json["audio_mime"].is_null());
    }

    #[tokio::test]
    async fn test_process_text_requires_text() {
        let (status, json) = send(
            app(),
            json_request("/api/process_text", serde_json::json!({"text": ""})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Message is required");
    }

    #[tokio::test]
    async fn test_process_audio() {
        let request = multipart_request(&[
            ("audio", Some("audio.webm"), "webm-bytes"),
            ("user_id", None, "u9"),
        ]);
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["detected_language"], "hi");
        assert_eq!(json["response_text"], "echo: नमस्ते");
    }

    #[tokio::test]
    async fn test_process_audio_hint_wins() {
        let request = multipart_request(&[
            ("audio", Some("audio.webm"), "webm-bytes"),
            ("language", None, "mr"),
        ]);
        let (_, json) = send(app(), request).await;
        assert_eq!(json["detected_language"], "mr");
    }

    #[tokio::test]
    async fn test_process_audio_missing_file() {
        let request = multipart_request(&[("language", None, "hi")]);
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No audio file provided");

        let request = json_request("/api/process_audio", serde_json::json!({}));
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "No audio file provided");
    }

    #[tokio::test]
    async fn test_process_audio_empty_filename() {
        let request = multipart_request(&[("audio", Some(""), "webm-bytes")]);
        let (status, json) = send(app(), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Empty audio file");
    }

    #[tokio::test]
    async fn test_process_audio_untranscribable() {
        let request = multipart_request(&[("audio", Some("audio.webm"), "noise")]);
        let (status, json) = send(app_with(None, false), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Could not transcribe audio");
    }

    #[tokio::test]
    async fn test_tts_only() {
        let (status, json) = send(
            app(),
            json_request(
                "/api/tts_only",
                serde_json::json!({"text": "ਸਤ ਸ੍ਰੀ ਅਕਾਲ", "language": "pa", "speed": 1.25}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["audio_response"], "SUQz");
        assert_eq!(json["audio_mime"], "audio/mpeg");
    }

    #[tokio::test]
    async fn test_tts_only_errors() {
        let (status, json) = send(
            app(),
            json_request("/api/tts_only", serde_json::json!({"language": "hi"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "Text is required");

        let (status, json) = send(
            app_with(None, true),
            json_request("/api/tts_only", serde_json::json!({"text": "hello"})),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["error"], "Speech synthesis failed");
    }

    #[tokio::test]
    async fn test_metrics_disabled_without_recorder() {
        let request = Request::builder().uri("/metrics").body(Body::empty()).unwrap();
        let (status, _) = send(app(), request).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_cors_layers_build() {
        build_cors_layer(&[], true);
        build_cors_layer(&["http://example.com".to_string(), "bad\nvalue".to_string()], true);
        build_cors_layer(&[], false);
    }
}

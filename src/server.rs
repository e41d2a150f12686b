//! HTTP surface: the analyze endpoint and health check.
//!
//! One linear pipeline per request: validate -> build prompt -> one upstream
//! completion call -> parse -> respond. Two failure branches: an upstream
//! failure is a hard 500, an unparseable completion degrades to a sentinel
//! result that still reports success. Handlers are stateless; the shared
//! state is the read-only upstream client.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;

use crate::ai_client::OpenRouterClient;
use crate::analysis::{build_prompt, parse_analysis, AnalysisResult};

/// Request bodies above this are rejected at the transport layer
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub client: OpenRouterClient,
    pub start_time: Instant,
}

// ============================================================================
// Error type
// ============================================================================

struct AppError(StatusCode, String);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (
            self.0,
            Json(serde_json::json!({"success": false, "error": self.1})),
        )
            .into_response()
    }
}

fn bad_request(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::BAD_REQUEST, msg.into())
}

fn upstream_error(msg: impl Into<String>) -> AppError {
    AppError(StatusCode::INTERNAL_SERVER_ERROR, msg.into())
}

// ============================================================================
// Request / Response types
// ============================================================================

#[derive(Deserialize)]
struct AnalyzeRequest {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
struct AnalyzeResponse {
    success: bool,
    analysis: AnalysisResult,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
    uptime_secs: u64,
}

// ============================================================================
// Handlers
// ============================================================================

// POST /api/analyze
async fn analyze_handler(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    if req.text.trim().is_empty() {
        return Err(bad_request("Missing or empty 'text' field"));
    }

    // Short id for log correlation; the document text itself is never logged
    let request_id = uuid::Uuid::new_v4().to_string();
    println!(
        "[Analyze] {} received document ({} bytes)",
        &request_id[..8],
        req.text.len()
    );

    let started = Instant::now();
    let completion = state
        .client
        .complete(&build_prompt(&req.text))
        .await
        .map_err(|e| {
            eprintln!("[Analyze] {} upstream call failed: {}", &request_id[..8], e);
            upstream_error(e.to_string())
        })?;

    let analysis = parse_analysis(&completion);
    println!(
        "[Analyze] {} done in {:.1}s: {} critical, {} medium, {} low",
        &request_id[..8],
        started.elapsed().as_secs_f64(),
        analysis.critical.len(),
        analysis.medium.len(),
        analysis.low.len()
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis,
    }))
}

// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

/// Build the router with permissive CORS and a request body cap
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .route("/health", get(health_handler))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Config;

    /// Serve canned responses on an ephemeral port, tiny_http in a background
    /// thread. Returns the base URL to hand the client as its api_base.
    fn fake_upstream(status: u16, body: String) -> String {
        let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();
        std::thread::spawn(move || {
            for request in server.incoming_requests() {
                let response = tiny_http::Response::from_string(body.clone())
                    .with_status_code(status)
                    .with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"application/json"[..],
                        )
                        .unwrap(),
                    );
                let _ = request.respond(response);
            }
        });
        format!("http://127.0.0.1:{}", port)
    }

    /// Wrap a completion text in the chat-completions envelope
    fn completion_envelope(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}],
            "usage": {"prompt_tokens": 100, "completion_tokens": 50}
        })
        .to_string()
    }

    /// Spawn the real router on an ephemeral port against the given upstream
    async fn serve_app(api_base: String) -> String {
        let config = Config {
            api_key: Some("test-key".to_string()),
            site_url: "http://localhost:3000".to_string(),
            model: "test-model".to_string(),
            api_base,
        };
        let state = AppState {
            client: OpenRouterClient::new(&config),
            start_time: Instant::now(),
        };
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn post_analyze(app: &str, body: serde_json::Value) -> (u16, serde_json::Value) {
        let res = reqwest::Client::new()
            .post(format!("{}/api/analyze", app))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status().as_u16();
        (status, res.json().await.unwrap())
    }

    #[tokio::test]
    async fn test_well_formed_completion_round_trips() {
        let analysis = serde_json::json!({
            "critical": [
                {"term": "Data Selling", "meaning": "Your data may be sold.", "example": "A broker buys your history."}
            ],
            "medium": [
                {"term": "Mandatory Arbitration", "meaning": "Disputes skip the courts.", "example": "No class actions."},
                {"term": "Limited Refunds", "meaning": "Refunds only within 14 days.", "example": "Day 15 means no refund."}
            ],
            "low": []
        });
        let upstream = fake_upstream(200, completion_envelope(&analysis.to_string()));
        let app = serve_app(upstream).await;

        let (status, body) = post_analyze(&app, serde_json::json!({"text": "Some terms"})).await;
        assert_eq!(status, 200);
        assert_eq!(
            body,
            serde_json::json!({"success": true, "analysis": analysis})
        );
    }

    #[tokio::test]
    async fn test_malformed_completion_degrades_to_sentinel() {
        let upstream = fake_upstream(200, completion_envelope("not json at all"));
        let app = serve_app(upstream).await;

        let (status, body) = post_analyze(&app, serde_json::json!({"text": "Some terms"})).await;
        assert_eq!(status, 200);
        assert_eq!(body["success"], serde_json::json!(true));
        let critical = body["analysis"]["critical"].as_array().unwrap();
        assert_eq!(critical.len(), 1);
        assert_eq!(critical[0]["term"], serde_json::json!("Parsing Error"));
        assert_eq!(body["analysis"]["medium"], serde_json::json!([]));
        assert_eq!(body["analysis"]["low"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_upstream_error_surfaces_as_500() {
        let upstream = fake_upstream(401, r#"{"error": {"message": "invalid key"}}"#.to_string());
        let app = serve_app(upstream).await;

        let (status, body) = post_analyze(&app, serde_json::json!({"text": "Some terms"})).await;
        assert_eq!(status, 500);
        assert_eq!(body["success"], serde_json::json!(false));
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("401"));
        assert!(error.contains("invalid key"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_surfaces_as_500() {
        // Nothing listens on the upstream port
        let app = serve_app("http://127.0.0.1:9".to_string()).await;

        let (status, body) = post_analyze(&app, serde_json::json!({"text": "Some terms"})).await;
        assert_eq!(status, 500);
        assert_eq!(body["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_empty_text_is_rejected() {
        let app = serve_app("http://127.0.0.1:9".to_string()).await;

        let (status, body) = post_analyze(&app, serde_json::json!({"text": "   \n"})).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], serde_json::json!(false));

        let (status, body) = post_analyze(&app, serde_json::json!({})).await;
        assert_eq!(status, 400);
        assert_eq!(body["success"], serde_json::json!(false));
    }

    #[tokio::test]
    async fn test_health_reports_ok() {
        let app = serve_app("http://127.0.0.1:9".to_string()).await;

        let res = reqwest::get(format!("{}/health", app)).await.unwrap();
        assert_eq!(res.status().as_u16(), 200);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["status"], serde_json::json!("ok"));
    }
}

//! HTTP request handlers.

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::state::AppState;
use crate::codec::{CustomRules, StrategyKind};
use crate::proxy::MetricsSummary;
use crate::schema::SchemaId;

/// Create the admin API router
pub fn create_router(state: Arc<AppState>) -> Router {
    let logging = state.config.logging;
    let cors = state.config.cors_enabled;

    let mut router = Router::new()
        // Health and status
        .route("/health", get(health_check))
        .route("/api/status", get(status))
        .route("/api/metrics", get(metrics))
        .route("/api/metrics/reset", post(reset_metrics))
        // Settings
        .route("/api/settings/compression", post(set_compression))
        .route("/api/settings/learned", post(set_learned))
        .route("/api/settings/strategy", post(set_strategy))
        // Custom rules
        .route(
            "/api/custom_rules",
            get(get_custom_rules).post(save_custom_rules),
        )
        .route("/api/custom_rules/reload", post(reload_custom_rules))
        // Direct text operations
        .route("/api/compress", post(compress))
        .route("/api/decompress", post(decompress))
        .with_state(state);

    if cors {
        router = router.layer(CorsLayer::permissive());
    }
    if logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    router
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> (StatusCode, Json<serde_json::Value>) {
    (status, Json(serde_json::json!({"error": message.to_string()})))
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Status response
#[derive(Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub compression_enabled: bool,
    pub learned_enabled: bool,
    pub decompress_responses: bool,
    pub strategy: String,
    pub active_strategy: StrategyKind,
    pub rule_count: usize,
    pub schemas: Vec<SchemaId>,
    pub metrics: MetricsSummary,
}

async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let interceptor = &state.interceptor;
    let snapshot = state.engine().snapshot();

    Json(StatusResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.uptime().as_secs(),
        compression_enabled: interceptor.compression_enabled(),
        learned_enabled: snapshot.learned_enabled(),
        decompress_responses: interceptor.decompress_responses(),
        strategy: snapshot.requested.clone(),
        active_strategy: snapshot.kind,
        rule_count: snapshot.table.len(),
        schemas: interceptor.registry().schemas(),
        metrics: interceptor.metrics(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.interceptor.metrics())
}

async fn reset_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.interceptor.stats().reset();
    tracing::info!("Metrics reset");
    Json(state.interceptor.metrics())
}

/// Toggle request
#[derive(Deserialize)]
pub struct ToggleRequest {
    pub enabled: bool,
}

async fn set_compression(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> impl IntoResponse {
    state.interceptor.set_compression_enabled(req.enabled);
    Json(serde_json::json!({"compression_enabled": req.enabled}))
}

async fn set_learned(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ToggleRequest>,
) -> impl IntoResponse {
    state.engine().set_learned_enabled(req.enabled);
    Json(serde_json::json!({"learned_enabled": req.enabled}))
}

/// Strategy change request
#[derive(Deserialize)]
pub struct StrategyRequest {
    pub strategy: String,
}

async fn set_strategy(
    State(state): State<Arc<AppState>>,
    Json(req): Json<StrategyRequest>,
) -> impl IntoResponse {
    let active = state.engine().select_strategy(&req.strategy);
    Json(serde_json::json!({
        "strategy": req.strategy,
        "active_strategy": active,
    }))
}

/// Custom rules update response
#[derive(Serialize)]
pub struct RulesResponse {
    pub saved: bool,
    pub custom_entries: usize,
    pub rule_count: usize,
}

/// Saved custom rules; empty when no file has been saved yet
async fn get_custom_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let path = match &state.config.custom_rules_path {
        Some(path) if path.exists() => path,
        _ => return Json(CustomRules::default()).into_response(),
    };

    match CustomRules::from_file(path) {
        Ok(rules) => Json(rules).into_response(),
        Err(e) => {
            tracing::warn!("Reading custom rules failed: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e).into_response()
        },
    }
}

async fn save_custom_rules(
    State(state): State<Arc<AppState>>,
    Json(rules): Json<CustomRules>,
) -> impl IntoResponse {
    let saved = match &state.config.custom_rules_path {
        Some(path) => match rules.save(path) {
            Ok(()) => {
                tracing::info!("Custom rules saved to {}", path.display());
                true
            },
            Err(e) => {
                tracing::warn!("Saving custom rules failed: {}", e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, e).into_response();
            },
        },
        None => false,
    };

    let custom_entries = rules.len();
    match state.engine().reload_dictionary(rules) {
        Ok(rule_count) => Json(RulesResponse {
            saved,
            custom_entries,
            rule_count,
        })
        .into_response(),
        Err(e) => error_response(StatusCode::BAD_REQUEST, e).into_response(),
    }
}

async fn reload_custom_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let Some(path) = state.config.custom_rules_path.clone() else {
        return error_response(StatusCode::BAD_REQUEST, "No custom rules path configured")
            .into_response();
    };

    match state.engine().reload_dictionary(path) {
        Ok(rule_count) => Json(serde_json::json!({"rule_count": rule_count})).into_response(),
        Err(e) => error_response(StatusCode::UNPROCESSABLE_ENTITY, e).into_response(),
    }
}

/// Text request
#[derive(Deserialize)]
pub struct TextRequest {
    pub text: String,
}

/// Text response
#[derive(Debug, Serialize, Deserialize)]
pub struct TextResponse {
    pub text: String,
    pub original_bytes: usize,
    pub result_bytes: usize,
}

async fn compress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    let text = state.engine().compress(&req.text);
    Json(TextResponse {
        original_bytes: req.text.len(),
        result_bytes: text.len(),
        text,
    })
}

async fn decompress(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TextRequest>,
) -> impl IntoResponse {
    let text = state.engine().decompress(&req.text);
    Json(TextResponse {
        original_bytes: req.text.len(),
        result_bytes: text.len(),
        text,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::StegoEngine;
    use crate::proxy::Interceptor;
    use crate::server::ServerConfig;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app_with(config: ServerConfig) -> (Router, Arc<AppState>) {
        let interceptor = Arc::new(Interceptor::new(Arc::new(StegoEngine::new())));
        let state = Arc::new(AppState::new(config, interceptor));
        (create_router(Arc::clone(&state)), state)
    }

    fn app() -> (Router, Arc<AppState>) {
        app_with(ServerConfig::default().without_logging())
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = router.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let (router, _) = app();
        let (status, body) = send(router, "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_and_metrics() {
        let (router, state) = app();
        state
            .interceptor
            .on_request("https://api.openai.com/v1/completions", r#"{"prompt":"Write a function"}"#);

        let (status, body) = send(router.clone(), "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["compression_enabled"], true);
        assert_eq!(body["strategy"], "dictionary");
        assert_eq!(body["metrics"]["request_count"], 1);

        let (_, body) = send(router.clone(), "GET", "/api/metrics", None).await;
        assert_eq!(body["total_original_bytes"], 16);
        assert_eq!(body["total_compressed_bytes"], 3);

        let (_, body) = send(router, "POST", "/api/metrics/reset", None).await;
        assert_eq!(body["request_count"], 0);
    }

    #[tokio::test]
    async fn test_settings() {
        let (router, state) = app();

        let (status, _) = send(
            router.clone(),
            "POST",
            "/api/settings/compression",
            Some(json!({"enabled": false})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!state.interceptor.compression_enabled());

        send(router.clone(), "POST", "/api/settings/learned", Some(json!({"enabled": true}))).await;
        assert!(state.engine().learned_enabled());

        let (status, body) = send(
            router,
            "POST",
            "/api/settings/strategy",
            Some(json!({"strategy": "invalid_strategy"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["strategy"], "invalid_strategy");
        assert_eq!(body["active_strategy"], "dictionary");
        assert_eq!(state.engine().strategy_name(), "invalid_strategy");
    }

    #[tokio::test]
    async fn test_compress_decompress() {
        let (router, _) = app();

        let (_, body) = send(
            router.clone(),
            "POST",
            "/api/compress",
            Some(json!({"text": "Write a function in Python"})),
        )
        .await;
        assert_eq!(body["text"], "WF: in PY");
        assert_eq!(body["original_bytes"], 26);
        assert_eq!(body["result_bytes"], 9);

        let (_, body) = send(router, "POST", "/api/decompress", Some(json!({"text": "WF: in PY"}))).await;
        assert_eq!(body["text"], "Write a function in Python");
    }

    #[tokio::test]
    async fn test_custom_rules_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom_rules.json");
        let (router, _) = app_with(
            ServerConfig::default()
                .without_logging()
                .with_custom_rules_path(&path),
        );

        let (status, body) = send(router.clone(), "GET", "/api/custom_rules", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"rules": [], "dictionaries": []}));

        let rules = json!({
            "rules": [{"pattern": "pull request", "replacement": "PR"}],
            "dictionaries": [{"name": "git", "entries": {"rebase": "RB", "merge conflict": "MC"}}]
        });
        let (status, _) = send(router.clone(), "POST", "/api/custom_rules", Some(rules.clone())).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(router, "GET", "/api/custom_rules", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, rules);
    }

    #[tokio::test]
    async fn test_custom_rules_read_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom_rules.json");
        std::fs::write(&path, "{not json").unwrap();
        let (router, _) = app_with(
            ServerConfig::default()
                .without_logging()
                .with_custom_rules_path(&path),
        );

        let (status, body) = send(router, "GET", "/api/custom_rules", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn test_custom_rules_saved_and_merged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stego").join("custom_rules.json");
        let (router, state) = app_with(
            ServerConfig::default()
                .without_logging()
                .with_custom_rules_path(&path),
        );

        let rules = json!({"rules": [{"pattern": "custom pattern", "replacement": "CP:"}]});
        let (status, body) = send(router.clone(), "POST", "/api/custom_rules", Some(rules)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["saved"], true);
        assert_eq!(body["custom_entries"], 1);
        assert!(path.exists());
        assert_eq!(
            state.engine().compress("This is a custom pattern test"),
            "This is a CP: test"
        );

        let (status, body) = send(router, "POST", "/api/custom_rules/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["rule_count"], state.engine().table().len());
    }

    #[tokio::test]
    async fn test_reload_without_path() {
        let (router, _) = app();
        let (status, body) = send(router, "POST", "/api/custom_rules/reload", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

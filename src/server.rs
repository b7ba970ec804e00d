// 🌐 HTTP API - upload a CSV, download the annotated CSV
// Every request gets its own table and context; the only shared state is read-only config

use crate::assembler::{Assembler, AuditOutcome};
use crate::config::{AuditConfig, LabelStyle};
use crate::dates::parse_audit_date;
use crate::error::AuditError;
use crate::io::{output_file_name, parse_delimiter, read_table, table_to_bytes};
use crate::rules::AuditContext;
use crate::summary::AuditSummary;
use crate::VERSION;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

// ============================================================================
// STATE & OPTIONS
// ============================================================================

#[derive(Clone)]
struct AppState {
    config: Arc<AuditConfig>,
}

#[derive(Debug, Clone, Copy)]
pub struct ServerOptions {
    /// Requests running longer are abandoned with 408
    pub request_timeout: Duration,
    /// Maximum upload size in bytes
    pub body_limit: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        ServerOptions {
            request_timeout: Duration::from_secs(30),
            body_limit: 32 * 1024 * 1024,
        }
    }
}

// ============================================================================
// RESPONSES
// ============================================================================

/// API Response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    fn err(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl From<AuditError> for ApiError {
    fn from(err: AuditError) -> Self {
        let status = match err {
            AuditError::MissingColumns { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AuditError::EmptyInput
            | AuditError::Decode(_)
            | AuditError::RaggedRow { .. }
            | AuditError::InvalidAuditDate(_)
            | AuditError::Config(_) => StatusCode::BAD_REQUEST,
            AuditError::Encode(_) | AuditError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        ApiError {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        warn!(status = %self.status, error = %self.message, "request failed");
        (self.status, Json(ApiResponse::<()>::err(self.message))).into_response()
    }
}

// ============================================================================
// API Handlers
// ============================================================================

#[derive(Debug, Deserialize)]
struct AuditParams {
    audit_date: String,
    labels: Option<LabelStyle>,
    delimiter: Option<String>,
}

/// Decode and annotate one upload; runs off the async runtime
fn run_audit(
    config: &AuditConfig,
    params: &AuditParams,
    body: &[u8],
) -> Result<(AuditOutcome, u8), AuditError> {
    let delimiter = match params.delimiter.as_deref() {
        Some(raw) => parse_delimiter(raw)?,
        None => b',',
    };
    let audit_date = parse_audit_date(&params.audit_date, config.day_first)?;

    let mut config = config.clone();
    if let Some(labels) = params.labels {
        config.labels = labels;
    }

    let table = read_table(body, delimiter)?;
    let outcome = Assembler::new(config).annotate(&table, &AuditContext::new(audit_date))?;
    Ok((outcome, delimiter))
}

async fn spawn_audit(
    state: AppState,
    params: AuditParams,
    body: Bytes,
) -> Result<(AuditOutcome, u8), ApiError> {
    tokio::task::spawn_blocking(move || run_audit(&state.config, &params, &body))
        .await
        .map_err(|e| ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("audit task failed: {e}"),
        })?
        .map_err(ApiError::from)
}

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok(HealthResponse {
        status: "ok".to_string(),
        version: VERSION.to_string(),
    }))
}

/// GET /api/config - Active configuration
async fn get_config(State(state): State<AppState>) -> impl IntoResponse {
    Json(ApiResponse::ok(state.config.as_ref().clone()))
}

/// POST /api/analyze?audit_date=YYYY-MM-DD - Annotated CSV as a download
async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let (outcome, delimiter) = spawn_audit(state, params, body).await?;
    info!(summary = %outcome.summary, "analyze request served");

    let bytes = table_to_bytes(&outcome.table, delimiter)?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        output_file_name(outcome.summary.audit_date)
    );

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response())
}

/// POST /api/summary?audit_date=YYYY-MM-DD - Flag counts only
async fn summarize(
    State(state): State<AppState>,
    Query(params): Query<AuditParams>,
    body: Bytes,
) -> Result<Json<ApiResponse<AuditSummary>>, ApiError> {
    let (outcome, _) = spawn_audit(state, params, body).await?;
    Ok(Json(ApiResponse::ok(outcome.summary)))
}

// ============================================================================
// ROUTER
// ============================================================================

pub fn router(config: AuditConfig, options: ServerOptions) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };

    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/config", get(get_config))
        .route("/analyze", post(analyze))
        .route("/summary", post(summarize))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(options.body_limit))
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    const SAMPLE: &str = "ID,DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,DECLARATION_REF_NO\n\
                          1,2025-01-01,,TK-001\n\
                          2,,2025-02-01,TK-GIA HAN-002\n";

    fn app() -> Router {
        router(AuditConfig::default(), ServerOptions::default())
    }

    fn post_csv(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["version"], VERSION);
    }

    #[tokio::test]
    async fn test_analyze_returns_annotated_csv() {
        let response = app()
            .oneshot(post_csv("/api/analyze?audit_date=2025-05-31", SAMPLE))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"ket_qua_TKHQ_31052025.csv\""
        );

        let text = body_text(response).await;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "ID,DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE,DECLARATION_REF_NO,\
             missing_due_date_flag,overdue_days,overdue_unfiled_flag,overdue_over_90_flag,extension_flag"
        );
        assert_eq!(lines[1], "1,2025-01-01,,TK-001,,150,X,X,");
        assert_eq!(lines[2], "2,,2025-02-01,TK-GIA HAN-002,X,,,,X");
    }

    #[tokio::test]
    async fn test_analyze_with_vietnamese_labels() {
        let response = app()
            .oneshot(post_csv(
                "/api/analyze?audit_date=2025-05-31&labels=vietnamese",
                SAMPLE,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.lines().next().unwrap().ends_with("CÓ PHÁT SINH GIA HẠN TKHQ"));
    }

    #[tokio::test]
    async fn test_missing_columns_is_unprocessable() {
        let response = app()
            .oneshot(post_csv("/api/analyze?audit_date=2025-05-31", "ID,NOTE\n1,x\n"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["success"], false);
        assert!(json["error"]
            .as_str()
            .unwrap()
            .contains("DECLARATION_DUE_DATE, DECLARATION_RECEIVED_DATE"));
    }

    #[tokio::test]
    async fn test_bad_audit_date_is_bad_request() {
        let response = app()
            .oneshot(post_csv("/api/analyze?audit_date=soon", SAMPLE))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_over_long_record_is_bad_request() {
        let body = "DECLARATION_DUE_DATE,DECLARATION_RECEIVED_DATE\n2025-01-01,,EXTRA,MORE\n";
        let response = app()
            .oneshot(post_csv("/api/analyze?audit_date=2025-05-31", body))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(json["error"].as_str().unwrap().starts_with("line 2:"));
    }

    #[tokio::test]
    async fn test_summary_endpoint() {
        let response = app()
            .oneshot(post_csv("/api/summary?audit_date=2025-05-31", SAMPLE))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["data"]["total_rows"], 2);
        assert_eq!(json["data"]["missing_due_date"], 1);
        assert_eq!(json["data"]["overdue_over_threshold"], 1);
        assert_eq!(json["data"]["extension"], 1);
        assert_eq!(json["data"]["max_overdue_days"], 150);
    }
}

use analysis_orchestrator::{AnalysisConfig, RemoteAnalysisOrchestrator};
use analysis_core::TextGenerator;
use anyhow::Context;
use axum::{
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use company_directory::CompanyDirectory;
use dart_client::DartClient;
use llm_client::{DisabledGenerator, GeminiClient, LlmConfig};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod company_routes;
mod statement_routes;

pub use company_routes::company_routes;
pub use statement_routes::statement_routes;

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub dart_api_key: String,
    pub port: u16,
    pub database_url: String,
    pub corp_codes_json: String,
    pub llm: Option<LlmConfig>,
    pub analysis: AnalysisConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let dart_api_key = std::env::var("OPEN_DART_API_KEY")
            .context("OPEN_DART_API_KEY must be set")?;
        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        Ok(Self {
            dart_api_key,
            port,
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:corp_codes.db".to_string()),
            corp_codes_json: std::env::var("CORP_CODES_JSON")
                .unwrap_or_else(|_| "corp_codes.json".to_string()),
            llm: LlmConfig::from_env()?,
            analysis: AnalysisConfig::from_env()?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub dart: DartClient,
    pub orchestrator: Arc<RemoteAnalysisOrchestrator>,
    pub directory: CompanyDirectory,
}

impl AppState {
    /// Wire up clients from configuration and make sure the company
    /// directory is populated.
    pub async fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let generator: Arc<dyn TextGenerator> = match &config.llm {
            Some(llm) => {
                tracing::info!("Using {} for financial analysis", llm.model);
                Arc::new(GeminiClient::new(llm.clone()))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, analysis will use rule-based fallback only");
                Arc::new(DisabledGenerator)
            }
        };

        let directory = CompanyDirectory::new(&config.database_url).await?;
        if directory.count().await? == 0 {
            if Path::new(&config.corp_codes_json).exists() {
                tracing::info!("Company directory empty, loading {}", config.corp_codes_json);
                directory.rebuild_from_json(&config.corp_codes_json).await?;
            } else {
                tracing::warn!(
                    "Company directory empty and {} not found; search will return no results",
                    config.corp_codes_json
                );
            }
        }

        Ok(Self {
            dart: DartClient::new(config.dart_api_key.clone()),
            orchestrator: Arc::new(RemoteAnalysisOrchestrator::new(generator, config.analysis.clone())),
            directory,
        })
    }
}

/// Standard JSON envelope for every endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error: an HTTP status plus the underlying cause.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::BAD_REQUEST, anyhow::anyhow!(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::with_status(StatusCode::NOT_FOUND, anyhow::anyhow!(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, err.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("{:#}", self.error);
        } else {
            tracing::debug!("{} {}", self.status, self.error);
        }
        (self.status, Json(ApiResponse::error(self.error.to_string()))).into_response()
    }
}

async fn health(axum::extract::State(state): axum::extract::State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "model": state.orchestrator.model_name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .merge(company_routes())
        .merge(statement_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

pub fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
    };
    if json_logging {
        tracing_subscriber::fmt().json().with_env_filter(filter()).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let state = AppState::from_config(&config).await?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("API server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope() {
        let value = serde_json::to_value(ApiResponse::success(vec![1, 2])).unwrap();
        assert_eq!(value["success"], true);
        assert_eq!(value["data"], serde_json::json!([1, 2]));
        assert!(value["error"].is_null());
    }

    #[test]
    fn test_error_status_preserved() {
        let err = AppError::bad_request("모든 필수 항목을 입력해주세요.");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_anyhow_errors_are_internal() {
        let err: AppError = anyhow::anyhow!("boom").into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

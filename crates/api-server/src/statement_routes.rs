//! Financial Statement API Routes
//!
//! Charts and narrative analysis for one DART filing.

use analysis_core::{AnalysisSource, ReportCode, StatementPayload};
use axum::{extract::State, http::StatusCode, routing::post, Form, Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use statement_charts::{render_charts, ChartSet};

use crate::{ApiResponse, AppError, AppState};

const MISSING_FIELDS: &str = "모든 필수 항목을 입력해주세요.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatementForm {
    pub corp_code: Option<String>,
    pub corp_name: Option<String>,
    pub bsns_year: Option<String>,
    pub reprt_code: Option<String>,
}

/// Validated filing request.
#[derive(Debug, Clone, PartialEq, Eq)]
struct FilingRequest {
    corp_code: String,
    corp_name: String,
    bsns_year: String,
    report_code: ReportCode,
}

impl StatementForm {
    fn validate(self) -> Result<FilingRequest, AppError> {
        fn required(value: Option<String>) -> Result<String, AppError> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| AppError::bad_request(MISSING_FIELDS))
        }

        let corp_code = required(self.corp_code)?;
        let corp_name = required(self.corp_name)?;
        let bsns_year = required(self.bsns_year)?;
        let reprt_code = required(self.reprt_code)?;

        let report_code = ReportCode::from_code(&reprt_code).ok_or_else(|| {
            AppError::bad_request(format!("지원하지 않는 보고서 코드입니다: {}", reprt_code))
        })?;

        Ok(FilingRequest {
            corp_code,
            corp_name,
            bsns_year,
            report_code,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct VisualizeData {
    #[serde(flatten)]
    pub charts: ChartSet,
    pub corp_name: String,
    pub bsns_year: String,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeData {
    pub analysis: String,
    pub source: AnalysisSource,
    pub attempts: u32,
    pub model: String,
    pub generated_at: DateTime<Utc>,
    pub corp_name: String,
    pub bsns_year: String,
}

pub fn statement_routes() -> Router<AppState> {
    Router::new()
        .route("/api/visualize", post(visualize))
        .route("/api/analyze", post(analyze))
}

async fn fetch_statements(state: &AppState, request: &FilingRequest) -> Result<StatementPayload, AppError> {
    let payload = state
        .dart
        .get_financial_statements(&request.corp_code, &request.bsns_year, request.report_code)
        .await
        .map_err(|e| {
            tracing::error!(
                "DART fetch failed for {} ({}): {}",
                request.corp_code,
                request.bsns_year,
                e
            );
            AppError::with_status(
                StatusCode::BAD_GATEWAY,
                anyhow::anyhow!("재무제표 데이터를 가져오는데 실패했습니다."),
            )
        })?;

    payload.ok_or_else(|| {
        AppError::not_found(format!(
            "{} {}년 {} 재무제표 데이터가 없습니다.",
            request.corp_name,
            request.bsns_year,
            request.report_code.label()
        ))
    })
}

async fn visualize(
    State(state): State<AppState>,
    Form(form): Form<StatementForm>,
) -> Result<Json<ApiResponse<VisualizeData>>, AppError> {
    let request = form.validate()?;
    let payload = fetch_statements(&state, &request).await?;

    let charts = tokio::task::spawn_blocking(move || render_charts(&payload)).await?;

    Ok(Json(ApiResponse::success(VisualizeData {
        charts,
        corp_name: request.corp_name,
        bsns_year: request.bsns_year,
    })))
}

async fn analyze(
    State(state): State<AppState>,
    Form(form): Form<StatementForm>,
) -> Result<Json<ApiResponse<AnalyzeData>>, AppError> {
    let request = form.validate()?;
    let payload = fetch_statements(&state, &request).await?;

    let report = state.orchestrator.analyze(&payload).await;
    tracing::info!(
        "Analysis for {} ({}) served from {:?} after {} attempt(s)",
        request.corp_name,
        request.bsns_year,
        report.source,
        report.attempts
    );

    Ok(Json(ApiResponse::success(AnalyzeData {
        analysis: report.text,
        source: report.source,
        attempts: report.attempts,
        model: state.orchestrator.model_name().to_string(),
        generated_at: report.generated_at,
        corp_name: request.corp_name,
        bsns_year: request.bsns_year,
    })))
}

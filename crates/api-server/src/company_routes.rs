//! Company Search API Routes
//!
//! Looks up DART corp codes by company name.

use axum::{extract::State, routing::post, Form, Json, Router};
use company_directory::{Company, DEFAULT_SEARCH_LIMIT};
use serde::{Deserialize, Serialize};

use crate::{ApiResponse, AppError, AppState};

#[derive(Debug, Deserialize)]
pub struct SearchForm {
    #[serde(default)]
    pub company_name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub companies: Vec<Company>,
}

pub fn company_routes() -> Router<AppState> {
    Router::new().route("/api/search", post(search_companies))
}

async fn search_companies(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> Result<Json<ApiResponse<SearchResults>>, AppError> {
    let name = form.company_name.as_deref().map(str::trim).unwrap_or("");
    if name.is_empty() {
        return Err(AppError::bad_request("회사명을 입력해주세요."));
    }

    let companies = state.directory.search(name, DEFAULT_SEARCH_LIMIT).await?;
    if companies.is_empty() {
        return Err(AppError::not_found(format!(
            "'{}'에 해당하는 회사를 찾을 수 없습니다.",
            name
        )));
    }

    tracing::debug!("Search '{}' matched {} companies", name, companies.len());
    Ok(Json(ApiResponse::success(SearchResults { companies })))
}

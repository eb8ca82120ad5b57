mod corp_codes;

pub use corp_codes::{parse_corp_code_response, CorpCode};

use analysis_core::{AnalysisError, ReportCode, StatementPayload};
use reqwest::Client;
use std::time::Duration;

const BASE_URL: &str = "https://opendart.fss.or.kr";
const STATEMENT_PATH: &str = "/api/fnlttSinglAcnt.json";

pub const STATUS_OK: &str = "000";
/// DART status meaning the request was valid but nothing is on file.
pub const STATUS_NO_DATA: &str = "013";

const MAX_RETRIES: u32 = 3;

/// Client for the Open DART key-account and corp code endpoints.
#[derive(Clone)]
pub struct DartClient {
    api_key: String,
    base_url: String,
    client: Client,
    retry_delay: Duration,
}

impl DartClient {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            api_key,
            base_url: BASE_URL.to_string(),
            client,
            retry_delay: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Wait between attempts when DART answers 429.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Send a request with automatic 429 retry.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, AnalysisError> {
        let request = builder.build().map_err(|e| AnalysisError::ApiError(e.to_string()))?;

        for attempt in 0..MAX_RETRIES {
            let req_clone = request.try_clone()
                .ok_or_else(|| AnalysisError::ApiError("Cannot clone request".to_string()))?;
            let response = self.client.execute(req_clone).await
                .map_err(|e| AnalysisError::ApiError(e.to_string()))?;

            if response.status().as_u16() != 429 {
                return Ok(response);
            }

            tracing::warn!(
                "DART 429 rate limited, waiting {:?} before retry {}/{}",
                self.retry_delay,
                attempt + 1,
                MAX_RETRIES
            );
            tokio::time::sleep(self.retry_delay).await;
        }

        Err(AnalysisError::ApiError(format!("Rate limited by DART after {} retries", MAX_RETRIES)))
    }

    /// Fetch the key accounts of one filing.
    ///
    /// `Ok(None)` when DART has no statements for the combination (status 013).
    pub async fn get_financial_statements(
        &self,
        corp_code: &str,
        bsns_year: &str,
        report_code: ReportCode,
    ) -> Result<Option<StatementPayload>, AnalysisError> {
        let url = format!("{}{}", self.base_url, STATEMENT_PATH);

        tracing::debug!(
            "Fetching {} statements for corp {} ({})",
            bsns_year,
            corp_code,
            report_code.label()
        );

        let response = self.send_request(
            self.client.get(&url).query(&[
                ("crtfc_key", self.api_key.as_str()),
                ("corp_code", corp_code),
                ("bsns_year", bsns_year),
                ("reprt_code", report_code.code()),
            ])
        ).await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let payload: StatementPayload = response
            .json()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Failed to parse DART response: {}", e)))?;

        match payload.status.as_str() {
            STATUS_OK => {
                tracing::info!(
                    "Loaded {} statement lines for corp {} ({})",
                    payload.list.len(),
                    corp_code,
                    bsns_year
                );
                Ok(Some(payload))
            }
            STATUS_NO_DATA => {
                tracing::info!("No statements on file for corp {} ({})", corp_code, bsns_year);
                Ok(None)
            }
            _ => Err(AnalysisError::DartStatus {
                status: payload.status,
                message: payload.message,
            }),
        }
    }
}

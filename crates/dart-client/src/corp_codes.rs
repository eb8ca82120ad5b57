//! Corporation code list (`corpCode.xml`).
//!
//! DART serves the list as a ZIP archive holding a single `CORPCODE.xml`.
//! A rejected request comes back as a bare XML status document instead.

use analysis_core::AnalysisError;
use serde::Deserialize;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::{DartClient, STATUS_OK};

const CORP_CODE_PATH: &str = "/api/corpCode.xml";
const CORP_CODE_FILE: &str = "CORPCODE.xml";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// One `<list>` entry of `CORPCODE.xml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CorpCode {
    pub corp_code: String,
    pub corp_name: String,
    pub stock_code: String,
    pub modify_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CorpCodeList {
    list: Vec<CorpCode>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatusDocument {
    status: String,
    message: String,
}

impl DartClient {
    /// Download and unpack the full corporation code list.
    pub async fn download_corp_codes(&self) -> Result<Vec<CorpCode>, AnalysisError> {
        let url = format!("{}{}", self.base_url, CORP_CODE_PATH);
        tracing::info!("Downloading corp code archive from DART");

        let response = self
            .send_request(self.client.get(&url).query(&[("crtfc_key", self.api_key.as_str())]))
            .await?;

        if !response.status().is_success() {
            return Err(AnalysisError::ApiError(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| AnalysisError::ApiError(format!("Failed to read corp code archive: {}", e)))?;
        tracing::debug!("Corp code archive is {} bytes", body.len());

        let entries = tokio::task::spawn_blocking(move || parse_corp_code_response(&body))
            .await
            .map_err(|e| AnalysisError::ApiError(e.to_string()))??;

        tracing::info!("Parsed {} corp codes", entries.len());
        Ok(entries)
    }
}

/// Decode a `corpCode.xml` response body: either the ZIP archive or a
/// DART status document.
pub fn parse_corp_code_response(body: &[u8]) -> Result<Vec<CorpCode>, AnalysisError> {
    if !body.starts_with(ZIP_MAGIC) {
        let text = String::from_utf8_lossy(body);
        let document: StatusDocument = quick_xml::de::from_str(&text).map_err(|e| {
            AnalysisError::ApiError(format!("Unexpected corp code response: {}", e))
        })?;
        if document.status != STATUS_OK {
            return Err(AnalysisError::DartStatus {
                status: document.status,
                message: document.message,
            });
        }
        return Err(AnalysisError::ApiError(
            "DART returned a status document instead of the corp code archive".to_string(),
        ));
    }

    let mut archive = ZipArchive::new(Cursor::new(body))
        .map_err(|e| AnalysisError::ApiError(format!("Invalid corp code archive: {}", e)))?;

    let mut xml = String::new();
    archive
        .by_name(CORP_CODE_FILE)
        .map_err(|e| AnalysisError::ApiError(format!("{} missing from archive: {}", CORP_CODE_FILE, e)))?
        .read_to_string(&mut xml)
        .map_err(|e| AnalysisError::ApiError(format!("Failed to read {}: {}", CORP_CODE_FILE, e)))?;

    let document: CorpCodeList = quick_xml::de::from_str(&xml)
        .map_err(|e| AnalysisError::ApiError(format!("Failed to parse {}: {}", CORP_CODE_FILE, e)))?;

    Ok(document
        .list
        .into_iter()
        .map(|entry| CorpCode {
            corp_code: entry.corp_code.trim().to_string(),
            corp_name: entry.corp_name.trim().to_string(),
            stock_code: entry.stock_code.trim().to_string(),
            modify_date: entry.modify_date.trim().to_string(),
        })
        .collect())
}

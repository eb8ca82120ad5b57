use analysis_core::{GenerationError, TextGenerator};
use analysis_orchestrator::{AnalysisConfig, RemoteAnalysisOrchestrator, CANNOT_ANALYZE};
use api_server::{build_router, AppState};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use company_directory::{CompanyDirectory, CorpRecord};
use dart_client::DartClient;
use llm_client::DisabledGenerator;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FILING_FORM: &str =
    "corp_code=00126380&corp_name=%EC%82%BC%EC%84%B1%EC%A0%84%EC%9E%90&bsns_year=2023&reprt_code=11011";

struct CannedGenerator;

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok("안정적인 재무 구조를 갖추고 있습니다.".to_string())
    }

    fn model_name(&self) -> &str {
        "canned"
    }
}

fn record(code: &str, name: &str, stock: &str) -> CorpRecord {
    CorpRecord {
        corp_code: code.to_string(),
        corp_name: name.to_string(),
        stock_code: stock.to_string(),
        modify_date: "20240101".to_string(),
    }
}

fn statement_line(account: &str, current: &str, prior: &str) -> Value {
    json!({
        "corp_code": "00126380",
        "corp_name": "삼성전자",
        "stock_code": "005930",
        "reprt_code": "11011",
        "bsns_year": "2023",
        "fs_div": "CFS",
        "account_nm": account,
        "thstrm_amount": current,
        "frmtrm_amount": prior
    })
}

fn statements_body() -> Value {
    json!({
        "status": "000",
        "message": "정상",
        "list": [
            statement_line("유동자산", "195,936,557,000,000", "218,470,581,000,000"),
            statement_line("비유동자산", "259,969,423,000,000", "229,953,926,000,000"),
            statement_line("자산총계", "455,905,980,000,000", "448,424,507,000,000"),
            statement_line("유동부채", "75,719,452,000,000", "78,344,852,000,000"),
            statement_line("비유동부채", "16,508,663,000,000", "15,330,051,000,000"),
            statement_line("부채총계", "92,228,115,000,000", "93,674,903,000,000"),
            statement_line("자본총계", "363,677,865,000,000", "354,749,604,000,000"),
            statement_line("매출액", "258,935,494,000,000", "302,231,360,000,000"),
            statement_line("영업이익", "6,566,976,000,000", "43,376,630,000,000"),
            statement_line("당기순이익", "15,487,100,000,000", "55,654,077,000,000")
        ]
    })
}

async fn app(dart_server: &MockServer, generator: Arc<dyn TextGenerator>) -> Router {
    let directory = CompanyDirectory::new("sqlite::memory:").await.unwrap();
    directory
        .rebuild_from_records(&[
            record("00126380", "삼성전자", "005930"),
            record("00000002", "삼성물산", "028260"),
            record("00000003", "삼성전자서비스", ""),
        ])
        .await
        .unwrap();

    let orchestrator = RemoteAnalysisOrchestrator::new(
        generator,
        AnalysisConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        },
    );

    build_router(AppState {
        dart: DartClient::new("test-key".to_string())
            .with_base_url(dart_server.uri())
            .with_retry_delay(Duration::from_millis(1)),
        orchestrator: Arc::new(orchestrator),
        directory,
    })
}

async fn mount_statements(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/api/fnlttSinglAcnt.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn post_form(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_health() {
    let dart = MockServer::start().await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_search_lists_listed_companies_first() {
    let dart = MockServer::start().await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/search", "company_name=%EC%82%BC%EC%84%B1").await;
    assert_eq!(status, StatusCode::OK);
    let companies = body["data"]["companies"].as_array().unwrap();
    assert_eq!(companies.len(), 3);
    assert_eq!(companies[0]["corp_name"], "삼성물산");
    assert_eq!(companies[2]["corp_name"], "삼성전자서비스");
}

#[tokio::test]
async fn test_search_requires_name() {
    let dart = MockServer::start().await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/search", "company_name=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "회사명을 입력해주세요.");
}

#[tokio::test]
async fn test_search_without_match_is_not_found() {
    let dart = MockServer::start().await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/search", "company_name=%ED%98%84%EB%8C%80").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "'현대'에 해당하는 회사를 찾을 수 없습니다.");
}

#[tokio::test]
async fn test_analyze_requires_every_field() {
    let dart = MockServer::start().await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/analyze", "corp_code=00126380&bsns_year=2023").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "모든 필수 항목을 입력해주세요.");
}

#[tokio::test]
async fn test_analyze_returns_model_text() {
    let dart = MockServer::start().await;
    mount_statements(&dart, statements_body()).await;
    let app = app(&dart, Arc::new(CannedGenerator)).await;

    let (status, body) = post_form(app, "/api/analyze", FILING_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["analysis"], "안정적인 재무 구조를 갖추고 있습니다.");
    assert_eq!(body["data"]["source"], "model");
    assert_eq!(body["data"]["attempts"], 1);
    assert_eq!(body["data"]["corp_name"], "삼성전자");
    assert_eq!(body["data"]["bsns_year"], "2023");
}

#[tokio::test]
async fn test_analyze_without_model_serves_fallback() {
    let dart = MockServer::start().await;
    mount_statements(&dart, statements_body()).await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/analyze", FILING_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["source"], "fallback");
    let text = body["data"]["analysis"].as_str().unwrap();
    assert!(text.starts_with("삼성전자 (005930) 2023년 사업보고서 재무 분석"));
    assert!(text.contains("■ 종합 평가"));
}

#[tokio::test]
async fn test_analyze_unrecognised_accounts_cannot_be_analyzed() {
    let dart = MockServer::start().await;
    mount_statements(
        &dart,
        json!({
            "status": "000",
            "message": "정상",
            "list": [statement_line("이익잉여금", "1,000", "900")]
        }),
    )
    .await;
    let app = app(&dart, Arc::new(CannedGenerator)).await;

    let (status, body) = post_form(app, "/api/analyze", FILING_FORM).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["analysis"], CANNOT_ANALYZE);
    assert_eq!(body["data"]["source"], "no_data");
    assert_eq!(body["data"]["attempts"], 0);
}

#[tokio::test]
async fn test_missing_filing_is_not_found() {
    let dart = MockServer::start().await;
    mount_statements(&dart, json!({ "status": "013", "message": "조회된 데이타가 없습니다." })).await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/analyze", FILING_FORM).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_dart_failure_is_bad_gateway() {
    let dart = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/fnlttSinglAcnt.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&dart)
        .await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/visualize", FILING_FORM).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "재무제표 데이터를 가져오는데 실패했습니다.");
}

#[tokio::test]
async fn test_visualize_returns_svg_charts() {
    let dart = MockServer::start().await;
    mount_statements(&dart, statements_body()).await;
    let app = app(&dart, Arc::new(DisabledGenerator)).await;

    let (status, body) = post_form(app, "/api/visualize", FILING_FORM).await;
    assert_eq!(status, StatusCode::OK);
    let data = &body["data"];
    for chart in ["balance_sheet", "income_statement", "ratios", "balance_identity"] {
        assert!(
            data[chart].as_str().map(|svg| svg.contains("<svg")).unwrap_or(false),
            "missing {chart}"
        );
    }
    assert_eq!(data["corp_name"], "삼성전자");
}

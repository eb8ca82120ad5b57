use analysis_core::{AnalysisReport, AnalysisSource, GenerationError, Highlights, StatementPayload, TextGenerator};
use anyhow::Context;
use fundamental_analysis::{compose_summary, extract_highlights, generate_fallback_analysis};
use std::sync::Arc;
use std::time::Duration;

/// Returned when the statements yield no highlights at all.
pub const CANNOT_ANALYZE: &str = "재무 데이터를 분석할 수 없습니다.";

/// Retry policy for the remote model call.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
        }
    }
}

impl AnalysisConfig {
    /// Reads `ANALYSIS_MAX_ATTEMPTS` and `ANALYSIS_BASE_DELAY_MS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let max_attempts: u32 = std::env::var("ANALYSIS_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("ANALYSIS_MAX_ATTEMPTS must be a positive integer")?;
        let base_delay_ms: u64 = std::env::var("ANALYSIS_BASE_DELAY_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .context("ANALYSIS_BASE_DELAY_MS must be a whole number of milliseconds")?;

        Ok(Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(base_delay_ms),
        })
    }

    /// Pause after failed attempt `attempt` (1-based): base, 2×base, 4×base, ...
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1u32 << exponent)
    }
}

/// Drives one analysis: extract, compose, prompt the model with bounded
/// retry, and fall back to the rule-based text when the model cannot answer.
///
/// Always produces text. Model failures never surface to the caller.
pub struct RemoteAnalysisOrchestrator {
    generator: Arc<dyn TextGenerator>,
    config: AnalysisConfig,
}

impl RemoteAnalysisOrchestrator {
    pub fn new(generator: Arc<dyn TextGenerator>, config: AnalysisConfig) -> Self {
        Self { generator, config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn model_name(&self) -> &str {
        self.generator.model_name()
    }

    pub async fn analyze(&self, payload: &StatementPayload) -> AnalysisReport {
        let highlights = extract_highlights(payload);
        self.analyze_highlights(highlights.as_ref()).await
    }

    pub async fn analyze_highlights(&self, highlights: Option<&Highlights>) -> AnalysisReport {
        let Some(highlights) = highlights else {
            tracing::info!("No financial highlights available, skipping model call");
            return AnalysisReport::new(CANNOT_ANALYZE.to_string(), AnalysisSource::NoData, 0);
        };

        let prompt = build_prompt(&compose_summary(highlights));
        let max_attempts = self.config.max_attempts.max(1);

        tracing::info!(
            "Requesting analysis of {} ({}) from {}",
            highlights.company.name,
            highlights.company.business_year,
            self.generator.model_name()
        );

        let mut attempt = 1;
        loop {
            match self.generator.generate(&prompt).await {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::info!("Model analysis succeeded on attempt {}/{}", attempt, max_attempts);
                    return AnalysisReport::new(text, AnalysisSource::Model, attempt);
                }
                Ok(_) => {
                    tracing::warn!("Model returned an empty reply, using fallback analysis");
                    return self.fallback(highlights, attempt);
                }
                Err(err @ GenerationError::RateLimited(_)) if attempt < max_attempts => {
                    let delay = self.config.backoff_delay(attempt);
                    tracing::warn!(
                        "{} (attempt {}/{}), retrying in {:?}",
                        err,
                        attempt,
                        max_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) if err.is_retryable() => {
                    tracing::warn!("{} after {} attempts, using fallback analysis", err, attempt);
                    return self.fallback(highlights, attempt);
                }
                Err(err) => {
                    tracing::error!("Model analysis failed: {}, using fallback analysis", err);
                    return self.fallback(highlights, attempt);
                }
            }
        }
    }

    fn fallback(&self, highlights: &Highlights, attempts: u32) -> AnalysisReport {
        AnalysisReport::new(
            generate_fallback_analysis(Some(highlights)),
            AnalysisSource::Fallback,
            attempts,
        )
    }
}

/// Instruction block sent to the model around the composed summary.
pub fn build_prompt(summary: &str) -> String {
    format!(
        "다음은 한국 기업의 재무제표 정보입니다. 이 정보를 바탕으로 재무 상태와 성과를 일반인도 쉽게 이해할 수 있도록 분석해주세요.

{summary}

다음 내용을 포함해주세요:
1. 회사의 전반적인 재무 건전성 평가
2. 전년 대비 주요 변화와 그 의미
3. 수익성, 안정성, 성장성 관점에서의 분석
4. 투자자 관점에서 주목할 만한 점
5. 쉬운 용어와 비유를 사용하여 설명

결과는 일반인이 이해하기 쉽도록 전문 용어를 최소화하고, 간결하면서도 인사이트 있게 작성해주세요."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::StatementLine;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Replays a scripted sequence of replies; the last one repeats.
    struct ScriptedGenerator {
        replies: Vec<Result<String, GenerationError>>,
        calls: AtomicU32,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<Result<String, GenerationError>>) -> Arc<Self> {
            Arc::new(Self {
                replies,
                calls: AtomicU32::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.prompts.lock().unwrap().push(prompt.to_string());
            let idx = n.min(self.replies.len() - 1);
            self.replies[idx].clone()
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn fast_config() -> AnalysisConfig {
        AnalysisConfig {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    fn line(account: &str, current: &str, prior: &str) -> StatementLine {
        StatementLine {
            corp_name: Some("테스트전자".to_string()),
            stock_code: Some("000001".to_string()),
            reprt_code: Some("11011".to_string()),
            bsns_year: Some("2023".to_string()),
            fs_div: Some("CFS".to_string()),
            account_nm: Some(account.to_string()),
            thstrm_amount: Some(current.to_string()),
            frmtrm_amount: Some(prior.to_string()),
            ..Default::default()
        }
    }

    fn payload() -> StatementPayload {
        StatementPayload::from_lines(vec![
            line("자산총계", "1,000,000", "800,000"),
            line("부채총계", "600,000", "500,000"),
            line("자본총계", "400,000", "300,000"),
            line("매출액", "500,000", "400,000"),
            line("영업이익", "50,000", "40,000"),
            line("당기순이익", "40,000", "30,000"),
        ])
    }

    fn rate_limited() -> Result<String, GenerationError> {
        Err(GenerationError::RateLimited("quota exceeded".to_string()))
    }

    #[tokio::test]
    async fn test_model_text_returned_on_success() {
        let generator = ScriptedGenerator::new(vec![Ok("양호합니다.".to_string())]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(report.text, "양호합니다.");
        assert_eq!(report.source, AnalysisSource::Model);
        assert_eq!(report.attempts, 1);
        assert_eq!(generator.calls(), 1);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("회사명: 테스트전자"));
        assert!(prompts[0].contains("1. 회사의 전반적인 재무 건전성 평가"));
    }

    #[tokio::test]
    async fn test_persistent_rate_limit_stops_at_three_attempts() {
        let generator = ScriptedGenerator::new(vec![rate_limited()]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 3);
        assert_eq!(report.source, AnalysisSource::Fallback);
        assert_eq!(report.attempts, 3);
        assert!(report.text.contains("■ 종합 평가"));
    }

    #[tokio::test]
    async fn test_recovers_after_rate_limit() {
        let generator = ScriptedGenerator::new(vec![rate_limited(), Ok("두 번째 시도 성공".to_string())]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(report.text, "두 번째 시도 성공");
        assert_eq!(report.attempts, 2);
        assert_eq!(generator.calls(), 2);
    }

    #[tokio::test]
    async fn test_other_error_short_circuits_to_fallback() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationError::Other("invalid key".to_string()))]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(report.source, AnalysisSource::Fallback);
        assert_eq!(
            report.text,
            generate_fallback_analysis(extract_highlights(&payload()).as_ref())
        );
    }

    #[tokio::test]
    async fn test_empty_reply_is_terminal() {
        let generator = ScriptedGenerator::new(vec![Ok("   ".to_string())]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(report.source, AnalysisSource::Fallback);
    }

    #[tokio::test]
    async fn test_no_highlights_skips_model() {
        let generator = ScriptedGenerator::new(vec![Ok("unused".to_string())]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), fast_config());

        let report = orchestrator.analyze(&StatementPayload::from_lines(Vec::new())).await;
        assert_eq!(report.text, CANNOT_ANALYZE);
        assert_eq!(report.source, AnalysisSource::NoData);
        assert_eq!(report.attempts, 0);
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_attempt_config_never_sleeps() {
        let generator = ScriptedGenerator::new(vec![rate_limited()]);
        let config = AnalysisConfig {
            max_attempts: 1,
            base_delay: Duration::from_secs(3600),
        };
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), config);

        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(report.source, AnalysisSource::Fallback);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_attempts_wait_between_calls() {
        let generator = ScriptedGenerator::new(vec![rate_limited()]);
        let config = AnalysisConfig::default();
        let base = config.base_delay;
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), config);

        let started = tokio::time::Instant::now();
        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 3);
        assert_eq!(report.source, AnalysisSource::Fallback);
        assert_eq!(started.elapsed(), base + base * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_does_not_wait() {
        let generator = ScriptedGenerator::new(vec![Err(GenerationError::Other("invalid key".to_string()))]);
        let orchestrator = RemoteAnalysisOrchestrator::new(generator.clone(), AnalysisConfig::default());

        let started = tokio::time::Instant::now();
        let report = orchestrator.analyze(&payload()).await;
        assert_eq!(generator.calls(), 1);
        assert_eq!(report.source, AnalysisSource::Fallback);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_backoff_doubles_per_attempt() {
        let config = AnalysisConfig::default();
        assert_eq!(config.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(config.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(config.backoff_delay(3), Duration::from_secs(8));
    }

    #[test]
    fn test_prompt_wraps_summary() {
        let prompt = build_prompt("SUMMARY");
        assert!(prompt.starts_with("다음은 한국 기업의 재무제표 정보입니다."));
        assert!(prompt.contains("\n\nSUMMARY\n\n"));
        assert!(prompt.ends_with("인사이트 있게 작성해주세요."));
    }
}

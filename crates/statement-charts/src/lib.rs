//! SVG charts for a single DART filing.
//!
//! Every chart is optional: a chart without the accounts it needs, or one
//! that fails to render, is logged and left out without affecting the rest.

mod bars;
mod canvas;
mod identity;
mod radar;

pub use bars::{render_grouped_bars, BarGroup};
pub use identity::{render_balance_identity, BalanceIdentity};
pub use radar::render_radar;

use analysis_core::{parse_amount, Account, Highlights, PeriodAmounts, RatioKind, StatementLine, StatementPayload};
use fundamental_analysis::extract_highlights;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const BILLION: f64 = 1_000_000_000.0;
const BAR_UNIT: &str = "10억원";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Not enough data for chart: {0}")]
    NoData(String),

    #[error("Chart rendering failed: {0}")]
    Render(String),
}

/// The four statement charts as SVG documents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChartSet {
    pub balance_sheet: Option<String>,
    pub income_statement: Option<String>,
    pub ratios: Option<String>,
    pub balance_identity: Option<String>,
}

impl ChartSet {
    pub fn rendered(&self) -> usize {
        [&self.balance_sheet, &self.income_statement, &self.ratios, &self.balance_identity]
            .iter()
            .filter(|chart| chart.is_some())
            .count()
    }
}

pub fn render_charts(payload: &StatementPayload) -> ChartSet {
    let highlights = extract_highlights(payload);
    let Some(highlights) = highlights.as_ref() else {
        tracing::debug!("No highlights in payload, skipping charts");
        return ChartSet::default();
    };

    let charts = ChartSet {
        balance_sheet: keep("balance sheet", balance_sheet_chart(highlights)),
        income_statement: keep("income statement", income_statement_chart(highlights)),
        ratios: keep("ratios", ratio_chart(highlights)),
        balance_identity: keep(
            "balance identity",
            balance_identity(&payload.primary_division())
                .ok_or_else(|| ChartError::NoData("balance totals".to_string()))
                .and_then(|identity| render_balance_identity(&identity)),
        ),
    };

    tracing::info!(
        "Rendered {}/4 charts for {} ({})",
        charts.rendered(),
        highlights.company.name,
        highlights.company.business_year
    );
    charts
}

fn keep(name: &str, result: Result<String, ChartError>) -> Option<String> {
    match result {
        Ok(svg) => Some(svg),
        Err(ChartError::NoData(what)) => {
            tracing::debug!("Skipping {} chart: {}", name, what);
            None
        }
        Err(e) => {
            tracing::warn!("Failed to render {} chart: {}", name, e);
            None
        }
    }
}

fn bar_groups(entries: Vec<(Account, &PeriodAmounts)>) -> Vec<BarGroup> {
    entries
        .into_iter()
        .map(|(account, amounts)| BarGroup {
            label: account.name().to_string(),
            current: amounts.current as f64 / BILLION,
            prior: amounts.prior as f64 / BILLION,
        })
        .collect()
}

fn balance_sheet_chart(highlights: &Highlights) -> Result<String, ChartError> {
    render_grouped_bars("재무상태표", BAR_UNIT, &bar_groups(highlights.balance_sheet.entries()))
}

fn income_statement_chart(highlights: &Highlights) -> Result<String, ChartError> {
    render_grouped_bars("손익계산서", BAR_UNIT, &bar_groups(highlights.income_statement.entries()))
}

fn ratio_chart(highlights: &Highlights) -> Result<String, ChartError> {
    let axes = [
        ("부채비율", RatioKind::DebtRatio),
        ("ROE", RatioKind::Roe),
        ("ROA", RatioKind::Roa),
        ("영업이익률", RatioKind::OperatingMargin),
        ("순이익률", RatioKind::NetMargin),
    ];

    let mut values = Vec::with_capacity(axes.len());
    for (label, kind) in axes {
        let value = highlights
            .ratios
            .get(kind)
            .ok_or_else(|| ChartError::NoData(format!("{} unavailable", kind.label())))?;
        values.push((label, value));
    }
    render_radar("주요 재무비율", &values)
}

/// Current-period amount of the first line named `account`.
fn current_amount(lines: &[&StatementLine], account: &str) -> Option<i64> {
    lines
        .iter()
        .find(|line| line.account_name() == account)
        .map(|line| parse_amount(line.thstrm_amount.as_deref()))
}

/// Totals are required; the current/non-current split defaults to zero.
fn balance_identity(lines: &[&StatementLine]) -> Option<BalanceIdentity> {
    let detail = |account: &str| current_amount(lines, account).unwrap_or(0);
    Some(BalanceIdentity {
        total_assets: current_amount(lines, Account::TotalAssets.name())?,
        total_liabilities: current_amount(lines, Account::TotalLiabilities.name())?,
        total_equity: current_amount(lines, Account::TotalEquity.name())?,
        current_assets: detail("유동자산"),
        non_current_assets: detail("비유동자산"),
        current_liabilities: detail("유동부채"),
        non_current_liabilities: detail("비유동부채"),
    })
}

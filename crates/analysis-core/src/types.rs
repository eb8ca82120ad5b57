use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::UNKNOWN;

/// Statement division tag reported by DART in `fs_div`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Division {
    /// Consolidated statements (`CFS`)
    #[serde(rename = "CFS")]
    Consolidated,
    /// Separate, non-consolidated statements (`OFS`)
    #[serde(rename = "OFS")]
    Separate,
}

impl Division {
    pub fn code(&self) -> &'static str {
        match self {
            Division::Consolidated => "CFS",
            Division::Separate => "OFS",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "CFS" => Some(Division::Consolidated),
            "OFS" => Some(Division::Separate),
            _ => None,
        }
    }
}

/// One reported line item of `fnlttSinglAcnt.json`.
///
/// DART drops columns freely, so every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatementLine {
    pub rcept_no: Option<String>,
    pub bsns_year: Option<String>,
    pub corp_code: Option<String>,
    pub corp_name: Option<String>,
    pub stock_code: Option<String>,
    pub reprt_code: Option<String>,
    pub account_nm: Option<String>,
    pub fs_div: Option<String>,
    pub fs_nm: Option<String>,
    pub sj_div: Option<String>,
    pub sj_nm: Option<String>,
    pub thstrm_nm: Option<String>,
    pub thstrm_dt: Option<String>,
    pub thstrm_amount: Option<String>,
    pub frmtrm_nm: Option<String>,
    pub frmtrm_dt: Option<String>,
    pub frmtrm_amount: Option<String>,
    pub bfefrmtrm_nm: Option<String>,
    pub bfefrmtrm_dt: Option<String>,
    pub bfefrmtrm_amount: Option<String>,
    pub ord: Option<String>,
    pub currency: Option<String>,
}

impl StatementLine {
    pub fn division(&self) -> Option<Division> {
        self.fs_div.as_deref().and_then(Division::from_code)
    }

    pub fn account_name(&self) -> &str {
        self.account_nm.as_deref().map(str::trim).unwrap_or("")
    }

    pub fn account(&self) -> Option<Account> {
        Account::from_name(self.account_name())
    }
}

/// DART response envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatementPayload {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub list: Vec<StatementLine>,
}

impl StatementPayload {
    pub fn from_lines(list: Vec<StatementLine>) -> Self {
        Self {
            status: "000".to_string(),
            message: "정상".to_string(),
            list,
        }
    }

    /// Lines of the consolidated division, or the separate division when the
    /// filing has no consolidated statements. Empty when neither exists.
    pub fn primary_division(&self) -> Vec<&StatementLine> {
        for division in [Division::Consolidated, Division::Separate] {
            let lines: Vec<&StatementLine> = self
                .list
                .iter()
                .filter(|line| line.division() == Some(division))
                .collect();
            if !lines.is_empty() {
                return lines;
            }
        }
        Vec::new()
    }
}

/// DART report type (`reprt_code`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReportCode {
    #[serde(rename = "11011")]
    Annual,
    #[serde(rename = "11012")]
    HalfYear,
    #[serde(rename = "11013")]
    FirstQuarter,
    #[serde(rename = "11014")]
    ThirdQuarter,
}

impl ReportCode {
    pub fn code(&self) -> &'static str {
        match self {
            ReportCode::Annual => "11011",
            ReportCode::HalfYear => "11012",
            ReportCode::FirstQuarter => "11013",
            ReportCode::ThirdQuarter => "11014",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ReportCode::Annual => "사업보고서",
            ReportCode::HalfYear => "반기보고서",
            ReportCode::FirstQuarter => "1분기보고서",
            ReportCode::ThirdQuarter => "3분기보고서",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim() {
            "11011" => Some(ReportCode::Annual),
            "11012" => Some(ReportCode::HalfYear),
            "11013" => Some(ReportCode::FirstQuarter),
            "11014" => Some(ReportCode::ThirdQuarter),
            _ => None,
        }
    }
}

/// The six canonical accounts the analysis pipeline understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Account {
    TotalAssets,
    TotalLiabilities,
    TotalEquity,
    Revenue,
    OperatingProfit,
    NetIncome,
}

impl Account {
    pub const BALANCE_SHEET: [Account; 3] = [
        Account::TotalAssets,
        Account::TotalLiabilities,
        Account::TotalEquity,
    ];

    pub const INCOME_STATEMENT: [Account; 3] = [
        Account::Revenue,
        Account::OperatingProfit,
        Account::NetIncome,
    ];

    /// Korean account name as it appears in `account_nm`.
    pub fn name(&self) -> &'static str {
        match self {
            Account::TotalAssets => "자산총계",
            Account::TotalLiabilities => "부채총계",
            Account::TotalEquity => "자본총계",
            Account::Revenue => "매출액",
            Account::OperatingProfit => "영업이익",
            Account::NetIncome => "당기순이익",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::BALANCE_SHEET
            .iter()
            .chain(Self::INCOME_STATEMENT.iter())
            .copied()
            .find(|account| account.name() == name)
    }
}

/// Current, prior and prior-prior period amounts in won.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodAmounts {
    pub current: i64,
    pub prior: i64,
    pub prior_prior: i64,
}

impl PeriodAmounts {
    pub fn new(current: i64, prior: i64, prior_prior: i64) -> Self {
        Self { current, prior, prior_prior }
    }

    /// Year-over-year change (current - prior).
    pub fn change(&self) -> i64 {
        self.current.saturating_sub(self.prior)
    }

    /// Year-over-year change in percent; `None` when the prior period is zero.
    pub fn change_percent(&self) -> Option<f64> {
        if self.prior == 0 {
            return None;
        }
        Some(self.change() as f64 / self.prior as f64 * 100.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub stock_code: String,
    pub report_code: String,
    pub business_year: String,
}

impl Default for CompanyInfo {
    fn default() -> Self {
        Self {
            name: UNKNOWN.to_string(),
            stock_code: UNKNOWN.to_string(),
            report_code: UNKNOWN.to_string(),
            business_year: UNKNOWN.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    pub total_assets: Option<PeriodAmounts>,
    pub total_liabilities: Option<PeriodAmounts>,
    pub total_equity: Option<PeriodAmounts>,
}

impl BalanceSheet {
    pub fn get(&self, account: Account) -> Option<&PeriodAmounts> {
        match account {
            Account::TotalAssets => self.total_assets.as_ref(),
            Account::TotalLiabilities => self.total_liabilities.as_ref(),
            Account::TotalEquity => self.total_equity.as_ref(),
            _ => None,
        }
    }

    /// Present accounts in canonical order.
    pub fn entries(&self) -> Vec<(Account, &PeriodAmounts)> {
        Account::BALANCE_SHEET
            .iter()
            .filter_map(|&account| self.get(account).map(|amounts| (account, amounts)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Option<PeriodAmounts>,
    pub operating_profit: Option<PeriodAmounts>,
    pub net_income: Option<PeriodAmounts>,
}

impl IncomeStatement {
    pub fn get(&self, account: Account) -> Option<&PeriodAmounts> {
        match account {
            Account::Revenue => self.revenue.as_ref(),
            Account::OperatingProfit => self.operating_profit.as_ref(),
            Account::NetIncome => self.net_income.as_ref(),
            _ => None,
        }
    }

    /// Present accounts in canonical order.
    pub fn entries(&self) -> Vec<(Account, &PeriodAmounts)> {
        Account::INCOME_STATEMENT
            .iter()
            .filter_map(|&account| self.get(account).map(|amounts| (account, amounts)))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioKind {
    DebtRatio,
    DebtToAssets,
    Roe,
    Roa,
    OperatingMargin,
    NetMargin,
}

impl RatioKind {
    pub const ALL: [RatioKind; 6] = [
        RatioKind::DebtRatio,
        RatioKind::DebtToAssets,
        RatioKind::Roe,
        RatioKind::Roa,
        RatioKind::OperatingMargin,
        RatioKind::NetMargin,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            RatioKind::DebtRatio => "부채비율",
            RatioKind::DebtToAssets => "부채비율(부채/자산)",
            RatioKind::Roe => "ROE(자기자본이익률)",
            RatioKind::Roa => "ROA(총자산이익률)",
            RatioKind::OperatingMargin => "영업이익률",
            RatioKind::NetMargin => "순이익률",
        }
    }
}

/// Derived ratios in percent. `None` marks a ratio as unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ratios {
    pub debt_ratio: Option<f64>,
    pub debt_to_assets: Option<f64>,
    pub roe: Option<f64>,
    pub roa: Option<f64>,
    pub operating_margin: Option<f64>,
    pub net_margin: Option<f64>,
}

impl Ratios {
    pub fn get(&self, kind: RatioKind) -> Option<f64> {
        match kind {
            RatioKind::DebtRatio => self.debt_ratio,
            RatioKind::DebtToAssets => self.debt_to_assets,
            RatioKind::Roe => self.roe,
            RatioKind::Roa => self.roa,
            RatioKind::OperatingMargin => self.operating_margin,
            RatioKind::NetMargin => self.net_margin,
        }
    }

    /// All ratios in fixed display order, available or not.
    pub fn entries(&self) -> Vec<(RatioKind, Option<f64>)> {
        RatioKind::ALL.iter().map(|&kind| (kind, self.get(kind))).collect()
    }
}

/// Whitelisted summary of one filing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Highlights {
    pub company: CompanyInfo,
    pub balance_sheet: BalanceSheet,
    pub income_statement: IncomeStatement,
    pub ratios: Ratios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisSource {
    /// Prose returned by the remote model
    Model,
    /// Rule-based text used after the model failed
    Fallback,
    /// No usable statement lines; the text is the fixed sentinel
    NoData,
}

/// Final text of an analysis request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub text: String,
    pub source: AnalysisSource,
    /// Number of remote model calls made
    pub attempts: u32,
    pub generated_at: DateTime<Utc>,
}

impl AnalysisReport {
    pub fn new(text: impl Into<String>, source: AnalysisSource, attempts: u32) -> Self {
        Self {
            text: text.into(),
            source,
            attempts,
            generated_at: Utc::now(),
        }
    }
}

use analysis_core::{
    parse_amount, Account, BalanceSheet, CompanyInfo, Highlights, IncomeStatement, PeriodAmounts,
    Ratios, StatementLine, StatementPayload, UNKNOWN,
};

/// Reduces a DART key-account payload to the six whitelisted accounts and
/// the ratios derived from them.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighlightExtractor;

impl HighlightExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Returns `None` when the payload has no CFS/OFS lines or none of the
    /// whitelisted accounts.
    pub fn extract(&self, payload: &StatementPayload) -> Option<Highlights> {
        let selected = payload.primary_division();
        let Some(first) = selected.first() else {
            tracing::debug!("No CFS or OFS lines among {} statement lines", payload.list.len());
            return None;
        };

        let matched: Vec<(Account, &StatementLine)> = selected
            .iter()
            .filter_map(|line| line.account().map(|account| (account, *line)))
            .collect();
        if matched.is_empty() {
            tracing::debug!("None of {} selected lines matched a known account", selected.len());
            return None;
        }

        let mut highlights = Highlights {
            company: company_info(first),
            ..Default::default()
        };

        for (account, line) in matched {
            let slot = match account {
                Account::TotalAssets => &mut highlights.balance_sheet.total_assets,
                Account::TotalLiabilities => &mut highlights.balance_sheet.total_liabilities,
                Account::TotalEquity => &mut highlights.balance_sheet.total_equity,
                Account::Revenue => &mut highlights.income_statement.revenue,
                Account::OperatingProfit => &mut highlights.income_statement.operating_profit,
                Account::NetIncome => &mut highlights.income_statement.net_income,
            };
            // First occurrence wins
            if slot.is_none() {
                *slot = Some(period_amounts(line));
            }
        }

        highlights.ratios = self.calculate_ratios(&highlights.balance_sheet, &highlights.income_statement);
        Some(highlights)
    }

    /// Each ratio only needs its own accounts; a missing account or a
    /// non-positive denominator leaves that ratio unavailable.
    pub fn calculate_ratios(&self, balance_sheet: &BalanceSheet, income: &IncomeStatement) -> Ratios {
        let assets = balance_sheet.total_assets.as_ref();
        let liabilities = balance_sheet.total_liabilities.as_ref();
        let equity = balance_sheet.total_equity.as_ref();
        let revenue = income.revenue.as_ref();
        let operating_profit = income.operating_profit.as_ref();
        let net_income = income.net_income.as_ref();

        Ratios {
            debt_ratio: current_percentage(liabilities, equity),
            debt_to_assets: current_percentage(liabilities, assets),
            roe: current_percentage(net_income, equity),
            roa: current_percentage(net_income, assets),
            operating_margin: current_percentage(operating_profit, revenue),
            net_margin: current_percentage(net_income, revenue),
        }
    }
}

/// Convenience wrapper around [`HighlightExtractor::extract`].
pub fn extract_highlights(payload: &StatementPayload) -> Option<Highlights> {
    HighlightExtractor::new().extract(payload)
}

fn company_info(line: &StatementLine) -> CompanyInfo {
    fn column(value: &Option<String>) -> String {
        value
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    CompanyInfo {
        name: column(&line.corp_name),
        stock_code: column(&line.stock_code),
        report_code: column(&line.reprt_code),
        business_year: column(&line.bsns_year),
    }
}

fn period_amounts(line: &StatementLine) -> PeriodAmounts {
    PeriodAmounts::new(
        parse_amount(line.thstrm_amount.as_deref()),
        parse_amount(line.frmtrm_amount.as_deref()),
        parse_amount(line.bfefrmtrm_amount.as_deref()),
    )
}

fn current_percentage(numerator: Option<&PeriodAmounts>, denominator: Option<&PeriodAmounts>) -> Option<f64> {
    percentage(numerator?.current, denominator?.current)
}

fn percentage(numerator: i64, denominator: i64) -> Option<f64> {
    if denominator <= 0 {
        return None;
    }
    let value = numerator as f64 / denominator as f64 * 100.0;
    if !value.is_finite() {
        tracing::warn!("Discarding non-finite ratio {}/{}", numerator, denominator);
        return None;
    }
    Some((value * 100.0).round() / 100.0)
}

use analysis_core::{format_currency, Account, Highlights, PeriodAmounts, UNKNOWN};

const RULE_WIDTH: usize = 50;

/// Flat text block describing the highlights, used as the body of the model prompt.
pub fn compose_summary(highlights: &Highlights) -> String {
    let mut lines: Vec<String> = Vec::new();
    let rule = "-".repeat(RULE_WIDTH);

    let company = &highlights.company;
    lines.push(format!("회사명: {}", company.name));
    lines.push(format!("종목코드: {}", company.stock_code));
    lines.push(format!("사업연도: {}", company.business_year));
    lines.push(String::new());

    lines.push("재무상태표 (단위: 원)".to_string());
    lines.push(rule.clone());
    for (account, amounts) in highlights.balance_sheet.entries() {
        lines.push(account_line(account, amounts));
    }
    lines.push(String::new());

    lines.push("손익계산서 (단위: 원)".to_string());
    lines.push(rule.clone());
    for (account, amounts) in highlights.income_statement.entries() {
        lines.push(account_line(account, amounts));
    }
    lines.push(String::new());

    lines.push("주요 재무비율".to_string());
    lines.push(rule);
    for (kind, value) in highlights.ratios.entries() {
        match value {
            Some(v) => lines.push(format!("{}: {:.2}%", kind.label(), v)),
            None => lines.push(format!("{}: {}", kind.label(), UNKNOWN)),
        }
    }

    lines.join("\n")
}

fn account_line(account: Account, amounts: &PeriodAmounts) -> String {
    let current = format_currency(Some(amounts.current));
    match amounts.change_percent() {
        Some(pct) => format!(
            "{}: {} (전년대비 {}, {:.2}%)",
            account.name(),
            current,
            format_currency(Some(amounts.change())),
            pct
        ),
        None => format!("{}: {}", account.name(), current),
    }
}

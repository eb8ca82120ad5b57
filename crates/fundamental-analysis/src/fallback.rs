use analysis_core::{
    format_currency, Account, Highlights, PeriodAmounts, RatioKind, Ratios, ReportCode, UNKNOWN,
};

/// Returned instead of an analysis when there are no highlights at all.
pub const NO_FINANCIAL_DATA: &str = "재무 데이터가 없습니다.";

const DEBT_RATIO_RISK: f64 = 200.0;
const DEBT_RATIO_STABLE: f64 = 100.0;
const OPERATING_MARGIN_STRONG: f64 = 10.0;
const OPERATING_MARGIN_WEAK: f64 = 5.0;
const ROE_STRONG: f64 = 15.0;
const ROE_ADEQUATE: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Positive,
    Neutral,
    Negative,
}

/// Rule-based analysis used when the remote model cannot answer.
///
/// Sections always appear in the same order: header, balance sheet, income
/// statement, ratios, verdict. Output depends only on the input.
pub fn generate_fallback_analysis(highlights: Option<&Highlights>) -> String {
    let Some(highlights) = highlights else {
        return NO_FINANCIAL_DATA.to_string();
    };

    let mut lines: Vec<String> = Vec::new();

    let company = &highlights.company;
    let report = ReportCode::from_code(&company.report_code)
        .map(|code| code.label())
        .unwrap_or(UNKNOWN);
    lines.push(format!(
        "{} ({}) {}년 {} 재무 분석",
        company.name, company.stock_code, company.business_year, report
    ));
    lines.push("※ AI 분석을 사용할 수 없어 규칙 기반 기본 분석을 제공합니다.".to_string());
    lines.push(String::new());

    lines.push("■ 재무상태표".to_string());
    push_accounts(&mut lines, &highlights.balance_sheet.entries());
    lines.push(String::new());

    lines.push("■ 손익계산서".to_string());
    push_accounts(&mut lines, &highlights.income_statement.entries());
    lines.push(String::new());

    lines.push("■ 주요 재무비율".to_string());
    for (kind, value) in highlights.ratios.entries() {
        match value {
            Some(v) => lines.push(format!("- {}: {:.2}%", kind.label(), v)),
            None => lines.push(format!("- {}: {}", kind.label(), UNKNOWN)),
        }
    }
    lines.push(String::new());

    lines.push("■ 종합 평가".to_string());
    let annotations = annotate(&highlights.ratios);
    for (text, _) in &annotations {
        lines.push(format!("- {}", text));
    }
    lines.push(format!("- 종합: {}", verdict(&annotations)));

    lines.join("\n")
}

fn push_accounts(lines: &mut Vec<String>, entries: &[(Account, &PeriodAmounts)]) {
    if entries.is_empty() {
        lines.push(format!("- {}", UNKNOWN));
        return;
    }
    for (account, amounts) in entries {
        lines.push(account_line(*account, amounts));
    }
}

fn account_line(account: Account, amounts: &PeriodAmounts) -> String {
    let current = format_currency(Some(amounts.current));
    let Some(pct) = amounts.change_percent() else {
        return format!("- {}: {}", account.name(), current);
    };
    let change = amounts.change();
    let movement = match change.signum() {
        1 => format!("▲ {} 증가, {:+.2}%", format_currency(Some(change)), pct),
        -1 => format!("▼ {} 감소, {:+.2}%", format_currency(Some(change.saturating_abs())), pct),
        _ => "― 변동 없음".to_string(),
    };
    format!("- {}: {} (전년 대비 {})", account.name(), current, movement)
}

fn annotate(ratios: &Ratios) -> Vec<(String, Tone)> {
    let mut annotations = Vec::new();

    if let Some(debt) = ratios.get(RatioKind::DebtRatio) {
        if debt > DEBT_RATIO_RISK {
            annotations.push((
                format!("부채비율이 {:.2}%로 200%를 넘어 재무 위험에 주의가 필요합니다.", debt),
                Tone::Negative,
            ));
        } else if debt < DEBT_RATIO_STABLE {
            annotations.push((
                format!("부채비율이 {:.2}%로 100% 미만이어서 재무 구조가 안정적입니다.", debt),
                Tone::Positive,
            ));
        }
    }

    if let Some(margin) = ratios.get(RatioKind::OperatingMargin) {
        if margin > OPERATING_MARGIN_STRONG {
            annotations.push((
                format!("영업이익률이 {:.2}%로 본업의 수익성이 우수합니다.", margin),
                Tone::Positive,
            ));
        } else if margin < OPERATING_MARGIN_WEAK {
            annotations.push((
                format!("영업이익률이 {:.2}%로 낮아 수익성 개선이 필요합니다.", margin),
                Tone::Negative,
            ));
        }
    }

    if let Some(roe) = ratios.get(RatioKind::Roe) {
        if roe > ROE_STRONG {
            annotations.push((
                format!("ROE가 {:.2}%로 자기자본을 활용한 가치 창출 능력이 뛰어납니다.", roe),
                Tone::Positive,
            ));
        } else if roe >= ROE_ADEQUATE {
            annotations.push((
                format!("ROE가 {:.2}%로 적정 수준의 자본 효율성을 보이고 있습니다.", roe),
                Tone::Neutral,
            ));
        } else {
            annotations.push((
                format!("ROE가 {:.2}%로 자본 효율성 개선이 필요합니다.", roe),
                Tone::Negative,
            ));
        }
    }

    annotations
}

fn verdict(annotations: &[(String, Tone)]) -> &'static str {
    if annotations.is_empty() {
        return "판단에 필요한 지표가 부족하여 추가 자료 확인이 필요합니다.";
    }
    let positives = annotations.iter().filter(|(_, t)| *t == Tone::Positive).count();
    let negatives = annotations.iter().filter(|(_, t)| *t == Tone::Negative).count();
    if positives > negatives {
        "전반적으로 양호한 재무 상태로 평가됩니다."
    } else if negatives > positives {
        "재무 건전성과 수익성 측면에서 주의 깊은 관찰이 필요합니다."
    } else {
        "강점과 약점이 혼재되어 있어 세부 지표를 함께 살펴볼 필요가 있습니다."
    }
}

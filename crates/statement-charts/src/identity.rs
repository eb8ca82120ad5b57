use analysis_core::format::group_thousands;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use crate::canvas::{
    draw_box, draw_text, render_svg, text_style, CURRENT_COLOR, EQUITY_COLOR, MUTED_COLOR,
    PRIOR_COLOR, TEXT_COLOR,
};
use crate::ChartError;

const WIDTH: u32 = 900;
const HEIGHT: u32 = 600;
const COLUMN_TOP: i32 = 140;
const COLUMN_HEIGHT: i32 = 420;
const LEFT_COLUMN: (i32, i32) = (60, 400);
const RIGHT_COLUMN: (i32, i32) = (500, 840);
const MIN_LABELLED_HEIGHT: i32 = 40;
const MIN_INLINE_HEIGHT: i32 = 12;

const HUNDRED_MILLION: f64 = 100_000_000.0;

/// Current-period amounts (in won) behind the assets = liabilities + equity diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BalanceIdentity {
    pub total_assets: i64,
    pub total_liabilities: i64,
    pub total_equity: i64,
    pub current_assets: i64,
    pub non_current_assets: i64,
    pub current_liabilities: i64,
    pub non_current_liabilities: i64,
}

fn eok(amount: i64) -> String {
    format!("{}억원", group_thousands((amount as f64 / HUNDRED_MILLION).round() as i64))
}

struct Segment {
    label: &'static str,
    amount: i64,
    color: RGBColor,
}

impl BalanceIdentity {
    fn asset_segments(&self) -> Vec<Segment> {
        if self.current_assets + self.non_current_assets > 0 {
            vec![
                Segment { label: "유동자산", amount: self.current_assets, color: CURRENT_COLOR },
                Segment { label: "비유동자산", amount: self.non_current_assets, color: RGBColor(41, 128, 185) },
            ]
        } else {
            vec![Segment { label: "자산총계", amount: self.total_assets, color: CURRENT_COLOR }]
        }
    }

    fn claim_segments(&self) -> Vec<Segment> {
        let mut segments = if self.current_liabilities + self.non_current_liabilities > 0 {
            vec![
                Segment { label: "유동부채", amount: self.current_liabilities, color: PRIOR_COLOR },
                Segment { label: "비유동부채", amount: self.non_current_liabilities, color: RGBColor(192, 57, 43) },
            ]
        } else {
            vec![Segment { label: "부채총계", amount: self.total_liabilities, color: PRIOR_COLOR }]
        };
        segments.push(Segment { label: "자본총계", amount: self.total_equity, color: EQUITY_COLOR });
        segments
    }

    /// Stacked boxes need positive totals and no negative parts.
    fn is_drawable(&self) -> bool {
        self.total_assets > 0
            && [
                self.total_liabilities,
                self.total_equity,
                self.current_assets,
                self.non_current_assets,
                self.current_liabilities,
                self.non_current_liabilities,
            ]
            .iter()
            .all(|v| *v >= 0)
    }
}

fn draw_column(
    canvas: &crate::canvas::Canvas<'_>,
    (x0, x1): (i32, i32),
    segments: &[Segment],
    scale: f64,
) -> Result<(), ChartError> {
    let mut y = COLUMN_TOP;
    for segment in segments {
        let height = (segment.amount as f64 / scale * COLUMN_HEIGHT as f64).round() as i32;
        if height <= 0 {
            continue;
        }
        draw_box(canvas, (x0, y), (x1, y + height), segment.color.filled())?;
        draw_box(canvas, (x0, y), (x1, y + height), WHITE.stroke_width(2))?;
        let cx = (x0 + x1) / 2;
        let cy = y + height / 2;
        if height >= MIN_LABELLED_HEIGHT {
            draw_text(
                canvas,
                segment.label,
                (cx, cy - 10),
                text_style(16, &WHITE, HPos::Center, VPos::Center),
            )?;
            draw_text(
                canvas,
                eok(segment.amount),
                (cx, cy + 12),
                text_style(13, &WHITE, HPos::Center, VPos::Center),
            )?;
        } else if height >= MIN_INLINE_HEIGHT {
            draw_text(
                canvas,
                format!("{} {}", segment.label, eok(segment.amount)),
                (cx, cy),
                text_style(11, &WHITE, HPos::Center, VPos::Center),
            )?;
        }
        y += height;
    }
    Ok(())
}

/// Two stacked columns: assets on the left, liabilities and equity on the right.
pub fn render_balance_identity(identity: &BalanceIdentity) -> Result<String, ChartError> {
    if !identity.is_drawable() {
        return Err(ChartError::NoData("자산 = 부채 + 자본".to_string()));
    }

    let claims = identity.total_liabilities + identity.total_equity;
    let scale = identity.total_assets.max(claims) as f64;

    render_svg((WIDTH, HEIGHT), |canvas| {
        draw_text(
            canvas,
            "자산 = 부채 + 자본",
            (WIDTH as i32 / 2, 40),
            text_style(26, &TEXT_COLOR, HPos::Center, VPos::Center),
        )?;
        draw_text(
            canvas,
            "회사의 모든 자산은 부채와 자본으로 구성됩니다",
            (WIDTH as i32 / 2, 76),
            text_style(15, &MUTED_COLOR, HPos::Center, VPos::Center),
        )?;

        draw_text(
            canvas,
            format!("자산 {}", eok(identity.total_assets)),
            ((LEFT_COLUMN.0 + LEFT_COLUMN.1) / 2, COLUMN_TOP - 12),
            text_style(18, &CURRENT_COLOR, HPos::Center, VPos::Bottom),
        )?;
        draw_text(
            canvas,
            format!("부채 + 자본 {}", eok(claims)),
            ((RIGHT_COLUMN.0 + RIGHT_COLUMN.1) / 2, COLUMN_TOP - 12),
            text_style(18, &PRIOR_COLOR, HPos::Center, VPos::Bottom),
        )?;
        draw_text(
            canvas,
            "=",
            ((LEFT_COLUMN.1 + RIGHT_COLUMN.0) / 2, COLUMN_TOP + COLUMN_HEIGHT / 2),
            text_style(40, &TEXT_COLOR, HPos::Center, VPos::Center),
        )?;

        draw_column(canvas, LEFT_COLUMN, &identity.asset_segments(), scale)?;
        draw_column(canvas, RIGHT_COLUMN, &identity.claim_segments(), scale)?;
        Ok(())
    })
}

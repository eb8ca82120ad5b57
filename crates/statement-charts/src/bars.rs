use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};

use crate::canvas::{
    draw_box, draw_line, draw_text, render_svg, text_style, CURRENT_COLOR, GRID_COLOR,
    MUTED_COLOR, PRIOR_COLOR, TEXT_COLOR,
};
use crate::ChartError;

const WIDTH: u32 = 800;
const HEIGHT: u32 = 500;
const LEFT: i32 = 90;
const RIGHT: i32 = 30;
const TOP: i32 = 80;
const BOTTOM: i32 = 60;
const TICKS: i32 = 5;

/// One account shown as a current/prior pair of bars.
#[derive(Debug, Clone, PartialEq)]
pub struct BarGroup {
    pub label: String,
    pub current: f64,
    pub prior: f64,
}

/// Vertical value range including zero, padded by a tenth on the open side(s).
fn value_range(groups: &[BarGroup]) -> (f64, f64) {
    let values = groups.iter().flat_map(|g| [g.current, g.prior]);
    let (mut lo, mut hi) = values.fold((0.0f64, 0.0f64), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if (hi - lo).abs() < f64::EPSILON {
        hi = lo + 1.0;
    }
    let span = hi - lo;
    if hi > 0.0 {
        hi += span * 0.1;
    }
    if lo < 0.0 {
        lo -= span * 0.1;
    }
    (lo, hi)
}

/// Grouped bar chart of current vs prior period amounts.
pub fn render_grouped_bars(title: &str, unit: &str, groups: &[BarGroup]) -> Result<String, ChartError> {
    if groups.is_empty() {
        return Err(ChartError::NoData(title.to_string()));
    }

    let plot_w = WIDTH as i32 - LEFT - RIGHT;
    let plot_h = HEIGHT as i32 - TOP - BOTTOM;
    let (lo, hi) = value_range(groups);
    let y_px = |v: f64| TOP + ((hi - v) / (hi - lo) * plot_h as f64).round() as i32;

    render_svg((WIDTH, HEIGHT), |canvas| {
        draw_text(
            canvas,
            title,
            (WIDTH as i32 / 2, 30),
            text_style(22, &TEXT_COLOR, HPos::Center, VPos::Center),
        )?;
        draw_text(
            canvas,
            format!("(단위: {})", unit),
            (LEFT, TOP - 14),
            text_style(13, &MUTED_COLOR, HPos::Left, VPos::Bottom),
        )?;

        for i in 0..=TICKS {
            let value = lo + (hi - lo) * i as f64 / TICKS as f64;
            let y = y_px(value);
            draw_line(canvas, vec![(LEFT, y), (LEFT + plot_w, y)], GRID_COLOR.stroke_width(1))?;
            draw_text(
                canvas,
                format!("{:.0}", value),
                (LEFT - 8, y),
                text_style(12, &MUTED_COLOR, HPos::Right, VPos::Center),
            )?;
        }

        let zero = y_px(0.0);
        draw_line(canvas, vec![(LEFT, zero), (LEFT + plot_w, zero)], BLACK.stroke_width(1))?;
        draw_line(canvas, vec![(LEFT, TOP), (LEFT, TOP + plot_h)], BLACK.stroke_width(1))?;

        let group_w = plot_w / groups.len() as i32;
        let bar_w = (group_w as f64 * 0.3) as i32;
        for (i, group) in groups.iter().enumerate() {
            let center = LEFT + group_w * i as i32 + group_w / 2;
            let bars = [
                (group.current, center - bar_w - 2, CURRENT_COLOR),
                (group.prior, center + 2, PRIOR_COLOR),
            ];
            for (value, x, color) in bars {
                let y = y_px(value);
                draw_box(canvas, (x, zero), (x + bar_w, y), color.filled())?;
                let (label_y, anchor) = if value >= 0.0 { (y - 4, VPos::Bottom) } else { (y + 4, VPos::Top) };
                draw_text(
                    canvas,
                    format!("{:.1}", value),
                    (x + bar_w / 2, label_y),
                    text_style(11, &TEXT_COLOR, HPos::Center, anchor),
                )?;
            }
            draw_text(
                canvas,
                group.label.as_str(),
                (center, TOP + plot_h + 12),
                text_style(14, &TEXT_COLOR, HPos::Center, VPos::Top),
            )?;
        }

        let legend_x = LEFT + plot_w - 140;
        for (i, (name, color)) in [("당기", CURRENT_COLOR), ("전기", PRIOR_COLOR)].into_iter().enumerate() {
            let x = legend_x + i as i32 * 70;
            draw_box(canvas, (x, 48), (x + 14, 62), color.filled())?;
            draw_text(
                canvas,
                name,
                (x + 20, 55),
                text_style(13, &TEXT_COLOR, HPos::Left, VPos::Center),
            )?;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn groups() -> Vec<BarGroup> {
        vec![
            BarGroup { label: "자산총계".to_string(), current: 455.9, prior: 448.4 },
            BarGroup { label: "자본총계".to_string(), current: -12.5, prior: 30.0 },
        ]
    }

    #[test]
    fn test_range_includes_zero_and_padding() {
        let (lo, hi) = value_range(&groups());
        assert!(lo < -12.5);
        assert!(hi > 455.9);
    }

    #[test]
    fn test_flat_zero_range_is_not_degenerate() {
        let zeros = vec![BarGroup { label: "매출액".to_string(), current: 0.0, prior: 0.0 }];
        let (lo, hi) = value_range(&zeros);
        assert!(hi > lo);
    }

    #[test]
    fn test_renders_svg_with_labels() {
        let svg = render_grouped_bars("재무상태표", "10억원", &groups()).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("자산총계"));
        assert!(svg.contains("455.9"));
        assert!(svg.contains("-12.5"));
        assert!(svg.contains("<rect"));
    }

    #[test]
    fn test_empty_groups_are_rejected() {
        assert!(matches!(render_grouped_bars("손익계산서", "10억원", &[]), Err(ChartError::NoData(_))));
    }
}

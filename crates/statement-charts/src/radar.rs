use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, VPos};
use std::f64::consts::PI;

use crate::canvas::{
    draw_line, draw_text, render_error, render_svg, text_style, CURRENT_COLOR, GRID_COLOR,
    MUTED_COLOR, TEXT_COLOR,
};
use crate::ChartError;

const SIZE: u32 = 600;
const CENTER: (i32, i32) = (300, 320);
const RADIUS: f64 = 200.0;
const RINGS: usize = 5;

/// Angle of axis `index` out of `count`, starting at twelve o'clock and turning clockwise.
fn axis_angle(index: usize, count: usize) -> f64 {
    -PI / 2.0 + 2.0 * PI * index as f64 / count as f64
}

fn point_at(angle: f64, radius: f64) -> (i32, i32) {
    (
        CENTER.0 + (radius * angle.cos()).round() as i32,
        CENTER.1 + (radius * angle.sin()).round() as i32,
    )
}

/// Outer edge of the scale. Negative values are drawn at the centre.
fn scale_max(values: &[f64]) -> f64 {
    let max = values.iter().cloned().fold(0.0f64, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.15 }
}

/// Closed polygon of percentage values, one axis per entry.
pub fn render_radar(title: &str, axes: &[(&str, f64)]) -> Result<String, ChartError> {
    if axes.len() < 3 {
        return Err(ChartError::NoData(title.to_string()));
    }

    let count = axes.len();
    let values: Vec<f64> = axes.iter().map(|(_, v)| *v).collect();
    let max = scale_max(&values);
    let radius_of = |v: f64| (v.max(0.0) / max).min(1.0) * RADIUS;

    render_svg((SIZE, SIZE), |canvas| {
        draw_text(
            canvas,
            title,
            (SIZE as i32 / 2, 36),
            text_style(22, &TEXT_COLOR, HPos::Center, VPos::Center),
        )?;

        for ring in 1..=RINGS {
            let r = RADIUS * ring as f64 / RINGS as f64;
            let mut outline: Vec<(i32, i32)> = (0..count).map(|i| point_at(axis_angle(i, count), r)).collect();
            outline.push(outline[0]);
            draw_line(canvas, outline, GRID_COLOR.stroke_width(1))?;
        }

        for (i, (label, _)) in axes.iter().enumerate() {
            let angle = axis_angle(i, count);
            draw_line(canvas, vec![CENTER, point_at(angle, RADIUS)], GRID_COLOR.stroke_width(1))?;

            let h = if angle.cos() > 0.2 {
                HPos::Left
            } else if angle.cos() < -0.2 {
                HPos::Right
            } else {
                HPos::Center
            };
            draw_text(
                canvas,
                *label,
                point_at(angle, RADIUS + 22.0),
                text_style(15, &TEXT_COLOR, h, VPos::Center),
            )?;
        }

        let shape: Vec<(i32, i32)> = values
            .iter()
            .enumerate()
            .map(|(i, v)| point_at(axis_angle(i, count), radius_of(*v)))
            .collect();

        canvas
            .draw(&Polygon::new(shape.clone(), CURRENT_COLOR.mix(0.25).filled()))
            .map_err(render_error)?;

        let mut outline = shape.clone();
        outline.push(shape[0]);
        draw_line(canvas, outline, CURRENT_COLOR.stroke_width(2))?;

        for (i, (point, value)) in shape.iter().zip(values.iter()).enumerate() {
            canvas
                .draw(&Circle::new(*point, 4, CURRENT_COLOR.filled()))
                .map_err(render_error)?;
            let label_at = point_at(axis_angle(i, count), radius_of(*value) + 14.0);
            draw_text(
                canvas,
                format!("{:.2}%", value),
                label_at,
                text_style(12, &MUTED_COLOR, HPos::Center, VPos::Center),
            )?;
        }

        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_axis_points_up() {
        let (x, y) = point_at(axis_angle(0, 5), 100.0);
        assert_eq!(x, CENTER.0);
        assert_eq!(y, CENTER.1 - 100);
    }

    #[test]
    fn test_scale_handles_non_positive_values() {
        assert_eq!(scale_max(&[-5.0, 0.0]), 1.0);
        assert!(scale_max(&[150.0, 10.0]) > 150.0);
    }

    #[test]
    fn test_renders_every_axis_and_value() {
        let axes = [
            ("부채비율", 150.0),
            ("ROE", 10.0),
            ("ROA", 4.0),
            ("영업이익률", 10.0),
            ("순이익률", -8.0),
        ];
        let svg = render_radar("주요 재무비율", &axes).unwrap();
        for (label, _) in axes {
            assert!(svg.contains(label));
        }
        assert!(svg.contains("150.00%"));
        assert!(svg.contains("-8.00%"));
        assert!(svg.contains("<polygon"));
    }

    #[test]
    fn test_too_few_axes_rejected() {
        assert!(render_radar("비율", &[("ROE", 1.0), ("ROA", 2.0)]).is_err());
    }
}

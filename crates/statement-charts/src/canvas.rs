use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::ChartError;

pub(crate) const FONT: &str = "sans-serif";

pub(crate) const CURRENT_COLOR: RGBColor = RGBColor(52, 152, 219);
pub(crate) const PRIOR_COLOR: RGBColor = RGBColor(231, 76, 60);
pub(crate) const EQUITY_COLOR: RGBColor = RGBColor(46, 204, 113);
pub(crate) const GRID_COLOR: RGBColor = RGBColor(220, 220, 220);
pub(crate) const TEXT_COLOR: RGBColor = RGBColor(44, 62, 80);
pub(crate) const MUTED_COLOR: RGBColor = RGBColor(127, 140, 141);

pub(crate) type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Render onto a fresh white SVG canvas and return the document.
pub(crate) fn render_svg<F>(size: (u32, u32), draw: F) -> Result<String, ChartError>
where
    F: FnOnce(&Canvas<'_>) -> Result<(), ChartError>,
{
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, size).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;
        draw(&root)?;
        root.present().map_err(render_error)?;
    }
    Ok(svg)
}

pub(crate) fn render_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

pub(crate) fn text_style(size: u32, color: &RGBColor, h: HPos, v: VPos) -> TextStyle<'static> {
    (FONT, size).into_font().color(color).pos(Pos::new(h, v))
}

pub(crate) fn draw_text(
    canvas: &Canvas<'_>,
    text: impl Into<String>,
    at: (i32, i32),
    style: TextStyle<'static>,
) -> Result<(), ChartError> {
    canvas
        .draw(&Text::new(text.into(), at, style))
        .map_err(render_error)
}

/// Axis-aligned box; corners may be given in any order.
pub(crate) fn draw_box(
    canvas: &Canvas<'_>,
    a: (i32, i32),
    b: (i32, i32),
    style: ShapeStyle,
) -> Result<(), ChartError> {
    let upper_left = (a.0.min(b.0), a.1.min(b.1));
    let lower_right = (a.0.max(b.0), a.1.max(b.1));
    canvas
        .draw(&Rectangle::new([upper_left, lower_right], style))
        .map_err(render_error)
}

pub(crate) fn draw_line(
    canvas: &Canvas<'_>,
    points: Vec<(i32, i32)>,
    style: ShapeStyle,
) -> Result<(), ChartError> {
    canvas
        .draw(&PathElement::new(points, style))
        .map_err(render_error)
}

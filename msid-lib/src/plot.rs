use std::path::Path;
use std::str::FromStr;

use hifitime::efmt::Format;
use plotters::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::style::PlotStyle;
use crate::time::Time;

const COLORBAR_WIDTH: i32 = 140;
const COLORBAR_STEPS: usize = 256;
const NAN_COLOR: RGBColor = RGBColor(128, 128, 128);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlotKind {
    Line,
    #[default]
    Scatter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Colormap {
    /// Diverging red (low) to blue (high).
    #[default]
    RdBu,
    Plasma,
    Viridis,
}

const RDBU: [u32; 11] = [
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];
const PLASMA: [u32; 10] = [
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
    0xf0f921,
];
const VIRIDIS: [u32; 10] = [
    0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b,
    0xfde725,
];

fn rgb(hex: u32) -> (f64, f64, f64) {
    (
        f64::from((hex >> 16) & 0xff),
        f64::from((hex >> 8) & 0xff),
        f64::from(hex & 0xff),
    )
}

impl Colormap {
    fn stops(self) -> &'static [u32] {
        match self {
            Colormap::RdBu => &RDBU,
            Colormap::Plasma => &PLASMA,
            Colormap::Viridis => &VIRIDIS,
        }
    }

    /// Color at `t` in `[0, 1]`, linearly interpolated between stops. Out of range values are
    /// clamped and NaN is grey.
    pub fn color(self, t: f64) -> RGBColor {
        if t.is_nan() {
            return NAN_COLOR;
        }
        let stops = self.stops();
        let pos = t.clamp(0.0, 1.0) * (stops.len() - 1) as f64;
        let idx = (pos.floor() as usize).min(stops.len() - 2);
        let frac = pos - idx as f64;
        let (r0, g0, b0) = rgb(stops[idx]);
        let (r1, g1, b1) = rgb(stops[idx + 1]);
        let mix = |a: f64, b: f64| (a + (b - a) * frac).round() as u8;
        RGBColor(mix(r0, r1), mix(g0, g1), mix(b0, b1))
    }

    /// Color for `value` normalized to `[min, max]`.
    pub fn color_for(self, value: f64, min: f64, max: f64) -> RGBColor {
        let span = max - min;
        if span <= 0.0 {
            return self.color(0.5);
        }
        self.color((value - min) / span)
    }
}

/// How x values are interpreted and labeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    /// Plot day numbers, labeled as UTC dates.
    Date,
    /// Fractional years.
    Years,
    Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub label: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    /// Per point values mapped through the figure colormap.
    pub color_values: Option<Vec<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Colorbar {
    pub colormap: Colormap,
    pub min: f64,
    pub max: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventMarkers {
    pub label: String,
    pub x: Vec<f64>,
}

/// Fully resolved plot data.
#[derive(Debug, Clone, PartialEq)]
pub struct Figure {
    pub name: String,
    pub title: Option<String>,
    pub kind: PlotKind,
    pub x_axis: AxisKind,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<Series>,
    pub colorbar: Option<Colorbar>,
    pub x_range: Option<(f64, f64)>,
    pub y_range: Option<(f64, f64)>,
    pub events: Vec<EventMarkers>,
}

/// Min and max of the finite values, if any.
pub fn finite_bounds<'a, I: IntoIterator<Item = &'a f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((*v, *v)),
            Some((lo, hi)) => Some((lo.min(*v), hi.max(*v))),
        })
}

fn padded((lo, hi): (f64, f64)) -> (f64, f64) {
    if hi > lo {
        let pad = (hi - lo) * 0.02;
        (lo - pad, hi + pad)
    } else {
        (lo - 1.0, hi + 1.0)
    }
}

impl Figure {
    pub fn num_points(&self) -> usize {
        self.series.iter().map(|s| s.x.len()).sum()
    }

    pub fn x_bounds(&self) -> (f64, f64) {
        if let Some(range) = self.x_range {
            return range;
        }
        let xs = self
            .series
            .iter()
            .flat_map(|s| s.x.iter())
            .chain(self.events.iter().flat_map(|e| e.x.iter()));
        finite_bounds(xs).map_or((0.0, 1.0), padded)
    }

    pub fn y_bounds(&self) -> (f64, f64) {
        if let Some(range) = self.y_range {
            return range;
        }
        finite_bounds(self.series.iter().flat_map(|s| s.y.iter())).map_or((0.0, 1.0), padded)
    }
}

/// Render a [Figure] to a PNG file.
pub fn render_png<P: AsRef<Path>>(figure: &Figure, style: &PlotStyle, path: P) -> Result<()> {
    let path = path.as_ref();
    debug!(
        "rendering {} ({} points) to {path:?}",
        figure.name,
        figure.num_points()
    );
    let background = style.background_color()?;
    let grid = style.grid_color()?;
    let date_fmt = Format::from_str("%Y-%m-%d").map_err(|e| Error::Time(e.to_string()))?;

    let root = BitMapBackend::new(path, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE)?;
    let (plot_area, bar_area) = match figure.colorbar {
        Some(_) => {
            let (left, right) = root.split_horizontally(style.width as i32 - COLORBAR_WIDTH);
            (left, Some(right))
        }
        None => (root.clone(), None),
    };

    let (x0, x1) = figure.x_bounds();
    let (y0, y1) = figure.y_bounds();
    let mut builder = ChartBuilder::on(&plot_area);
    builder
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(70);
    if let Some(title) = &figure.title {
        builder.caption(title, ("sans-serif", style.title_size * 1.5).into_font());
    }
    let mut chart = builder.build_cartesian_2d(x0..x1, y0..y1)?;
    chart.plotting_area().fill(&background)?;

    let x_formatter = |x: &f64| match figure.x_axis {
        AxisKind::Date => Time::from_plot_day(*x).format_with(date_fmt.clone()),
        AxisKind::Years => format!("{x:.1}"),
        AxisKind::Value => format!("{x}"),
    };
    chart
        .configure_mesh()
        .bold_line_style(&grid)
        .light_line_style(&grid.mix(0.5))
        .x_desc(figure.x_label.as_str())
        .y_desc(figure.y_label.as_str())
        .x_labels(8)
        .x_label_formatter(&x_formatter)
        .label_style(("sans-serif", style.tick_size).into_font())
        .axis_desc_style(("sans-serif", style.label_size).into_font())
        .draw()?;

    for marker in &figure.events {
        let color = BLACK.mix(0.35);
        chart
            .draw_series(marker.x.iter().map(|x| {
                PathElement::new(vec![(*x, y0), (*x, y1)], color.stroke_width(1))
            }))?
            .label(marker.label.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(1))
            });
    }

    let radius = style.marker_size.max(1);
    for (idx, series) in figure.series.iter().enumerate() {
        let color = style.series_color(idx)?;
        match figure.kind {
            PlotKind::Line => {
                let points = series.x.iter().copied().zip(series.y.iter().copied());
                chart
                    .draw_series(LineSeries::new(
                        points,
                        color.stroke_width(style.line_width),
                    ))?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| {
                        PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                    });
            }
            PlotKind::Scatter => {
                let colors: Vec<RGBColor> = match (&series.color_values, &figure.colorbar) {
                    (Some(values), Some(bar)) => values
                        .iter()
                        .map(|v| bar.colormap.color_for(*v, bar.min, bar.max))
                        .collect(),
                    _ => vec![color; series.x.len()],
                };
                chart
                    .draw_series(
                        series
                            .x
                            .iter()
                            .zip(series.y.iter())
                            .zip(colors)
                            .filter(|((x, y), _)| x.is_finite() && y.is_finite())
                            .map(|((x, y), c)| Circle::new((*x, *y), radius, c.filled())),
                    )?
                    .label(series.label.as_str())
                    .legend(move |(x, y)| Circle::new((x + 10, y), 4, color.filled()));
            }
        }
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperLeft)
        .label_font(("sans-serif", style.font_size).into_font())
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .draw()?;

    if let (Some(bar), Some(area)) = (&figure.colorbar, bar_area) {
        draw_colorbar(&area, bar, style)?;
    }

    root.present()?;
    Ok(())
}

fn draw_colorbar(
    area: &DrawingArea<BitMapBackend<'_>, plotters::coord::Shift>,
    bar: &Colorbar,
    style: &PlotStyle,
) -> Result<()> {
    let (lo, hi) = if bar.max > bar.min {
        (bar.min, bar.max)
    } else {
        (bar.min - 1.0, bar.min + 1.0)
    };
    let mut chart = ChartBuilder::on(area)
        .margin_top(60)
        .margin_bottom(65)
        .margin_left(10)
        .margin_right(50)
        .x_label_area_size(0)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0f64..1.0f64, lo..hi)?;
    chart
        .configure_mesh()
        .x_labels(0)
        .disable_x_mesh()
        .disable_y_mesh()
        .y_desc(bar.label.as_str())
        .label_style(("sans-serif", style.tick_size).into_font())
        .axis_desc_style(("sans-serif", style.label_size).into_font())
        .draw()?;

    let step = (hi - lo) / COLORBAR_STEPS as f64;
    chart.draw_series((0..COLORBAR_STEPS).map(|i| {
        let v0 = lo + step * i as f64;
        let color = bar.colormap.color_for(v0 + step * 0.5, lo, hi);
        Rectangle::new([(0.0, v0), (1.0, v0 + step)], color.filled())
    }))?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_colormap_endpoints() {
        assert_eq!(Colormap::RdBu.color(0.0), RGBColor(0x67, 0x00, 0x1f));
        assert_eq!(Colormap::RdBu.color(1.0), RGBColor(0x05, 0x30, 0x61));
        assert_eq!(Colormap::RdBu.color(0.5), RGBColor(0xf7, 0xf7, 0xf7));
        assert_eq!(Colormap::Plasma.color(-3.0), Colormap::Plasma.color(0.0));
        assert_eq!(Colormap::Plasma.color(7.0), RGBColor(0xf0, 0xf9, 0x21));
        assert_eq!(Colormap::Viridis.color(f64::NAN), NAN_COLOR);
    }

    #[test]
    fn test_color_for() {
        assert_eq!(
            Colormap::RdBu.color_for(90.0, 0.0, 180.0),
            Colormap::RdBu.color(0.5)
        );
        assert_eq!(
            Colormap::RdBu.color_for(3.0, 3.0, 3.0),
            Colormap::RdBu.color(0.5)
        );
    }

    #[test]
    fn test_colormap_yaml() {
        let cmap: Colormap = serde_yaml::from_str("plasma").unwrap();
        assert_eq!(cmap, Colormap::Plasma);
        let kind: PlotKind = serde_yaml::from_str("line").unwrap();
        assert_eq!(kind, PlotKind::Line);
    }

    fn figure(x: Vec<f64>, y: Vec<f64>) -> Figure {
        Figure {
            name: "test".to_string(),
            title: None,
            kind: PlotKind::Scatter,
            x_axis: AxisKind::Value,
            x_label: String::default(),
            y_label: String::default(),
            series: vec![Series {
                label: "s".to_string(),
                x,
                y,
                color_values: None,
            }],
            colorbar: None,
            x_range: None,
            y_range: None,
            events: Vec::default(),
        }
    }

    #[test]
    fn test_bounds() {
        let mut fig = figure(vec![0.0, 100.0, f64::NAN], vec![5.0, 5.0, f64::INFINITY]);
        assert_eq!(fig.x_bounds(), (-2.0, 102.0));
        assert_eq!(fig.y_bounds(), (4.0, 6.0));

        fig.y_range = Some((20.0, 42.0));
        assert_eq!(fig.y_bounds(), (20.0, 42.0));
        assert_eq!(fig.num_points(), 3);
    }

    #[test]
    fn test_bounds_empty() {
        let fig = figure(Vec::default(), Vec::default());
        assert_eq!(fig.x_bounds(), (0.0, 1.0));
    }
}

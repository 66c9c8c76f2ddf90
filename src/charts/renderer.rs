//! Static Dashboard Renderer
//! Draws every aggregate view into one PNG with plotters' bitmap backend.
//!
//! Layout (3x3 grid):
//! 1. Price distribution | Room types | Listings per area
//! 2. Reviews vs price | Availability | Average price by area
//! 3. Top 10 neighbourhoods | Correlations | Minimum nights

use crate::charts::style::{ChartStyle, ResolvedStyle, StyleError};
use crate::stats::{CategoryCount, CorrelationMatrix, GroupPrice, Histogram};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

const FONT: &str = "sans-serif";
const GRID: RGBColor = RGBColor(220, 220, 220);
const MISSING: RGBColor = RGBColor(200, 200, 200);

// Diverging red-yellow-green scale for correlations
const HEAT_LOW: RGBColor = RGBColor(215, 48, 39);
const HEAT_MID: RGBColor = RGBColor(255, 255, 191);
const HEAT_HIGH: RGBColor = RGBColor(26, 152, 80);

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Invalid chart style: {0}")]
    Style(#[from] StyleError),
}

type Result<T> = core::result::Result<T, PlotError>;
type Panel<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

/// Everything the dashboard shows, already aggregated.
#[derive(Debug, Clone)]
pub struct DashboardData {
    pub price_histogram: Histogram,
    pub room_types: Vec<CategoryCount>,
    /// Ranked by listing count.
    pub listings_per_group: Vec<GroupPrice>,
    /// (number_of_reviews, price) pairs.
    pub reviews_vs_price: Vec<(f64, f64)>,
    pub availability_histogram: Histogram,
    /// Ranked by mean price.
    pub price_by_group: Vec<GroupPrice>,
    pub top_neighbourhoods: Vec<GroupPrice>,
    pub correlations: CorrelationMatrix,
    pub minimum_nights_histogram: Histogram,
}

pub struct DashboardRenderer;

impl DashboardRenderer {
    /// Render the dashboard to `output_path`, replacing any existing file.
    pub fn render(data: &DashboardData, style: &ChartStyle, output_path: &Path) -> Result<()> {
        let style = style.resolve()?;

        let root = BitMapBackend::new(output_path, (style.width, style.height)).into_drawing_area();
        root.fill(&style.figure_background)
            .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
        let body = root
            .titled(&style.title, (FONT, 44.0).into_font())
            .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

        let panels = body.split_evenly((3, 3));
        for panel in &panels {
            panel
                .fill(&style.panel_background)
                .map_err(|e| PlotError::DrawingArea(e.to_string()))?;
        }

        Self::draw_histogram(&panels[0], "Price Distribution", "Price ($)", &data.price_histogram, style.color(0))?;

        let room_labels: Vec<String> = data.room_types.iter().map(|c| c.category.clone()).collect();
        let room_counts: Vec<f64> = data.room_types.iter().map(|c| c.count as f64).collect();
        Self::draw_bars(&panels[1], "Room Types", &room_labels, &room_counts, &style.palette)?;

        let (area_labels, area_counts) = split_groups(&data.listings_per_group, |g| g.count as f64);
        Self::draw_bars(&panels[2], "Neighbourhood Groups", &area_labels, &area_counts, &style.palette)?;

        Self::draw_scatter(&panels[3], "Reviews vs Price", &data.reviews_vs_price, &style)?;

        Self::draw_histogram(
            &panels[4],
            "Availability",
            "Days Available",
            &data.availability_histogram,
            style.color(4),
        )?;

        let (price_labels, mean_prices) = split_groups(&data.price_by_group, |g| g.mean_price);
        Self::draw_bars(&panels[5], "Avg Price by Area", &price_labels, &mean_prices, &style.palette)?;

        Self::draw_ranked_bars(&panels[6], "Top 10 Neighbourhoods", &data.top_neighbourhoods, &style.reversed())?;

        Self::draw_heatmap(&panels[7], "Correlations", &data.correlations)?;

        Self::draw_histogram(
            &panels[8],
            "Minimum Nights",
            "Nights",
            &data.minimum_nights_histogram,
            style.color(2),
        )?;

        root.present()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        info!(path = %output_path.display(), "Dashboard saved");
        Ok(())
    }

    fn draw_histogram(area: &Panel, title: &str, x_desc: &str, histogram: &Histogram, color: RGBColor) -> Result<()> {
        let y_max = (histogram.max_count() as f64 * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(histogram.start..histogram.end(), 0f64..y_max)
            .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc(x_desc)
            .y_desc("Listings")
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        chart
            .draw_series(histogram_bars(histogram).map(|corners| Rectangle::new(corners, color.mix(0.85).filled())))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        chart
            .draw_series(histogram_bars(histogram).map(|corners| Rectangle::new(corners, WHITE.stroke_width(1))))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        Ok(())
    }

    fn draw_bars(area: &Panel, title: &str, labels: &[String], values: &[f64], palette: &[RGBColor]) -> Result<()> {
        let n = labels.len().max(1);
        let y_max = (values.iter().copied().filter(|v| v.is_finite()).fold(0.0, f64::max) * 1.1).max(1.0);

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(-0.5f64..(n as f64 - 0.5), 0f64..y_max)
            .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .light_line_style(GRID)
            .x_labels(n)
            .x_label_formatter(&|x| label_at(labels, *x))
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        chart
            .draw_series(values.iter().enumerate().filter(|(_, v)| v.is_finite()).map(|(i, v)| {
                let x = i as f64;
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, *v)], palette[i % palette.len()].filled())
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        Ok(())
    }

    fn draw_ranked_bars(area: &Panel, title: &str, ranked: &[GroupPrice], palette: &[RGBColor]) -> Result<()> {
        let n = ranked.len().max(1);
        let x_max = (ranked.iter().map(|g| g.mean_price).filter(|v| v.is_finite()).fold(0.0, f64::max) * 1.1).max(1.0);
        // Highest mean at the top.
        let labels: Vec<String> = ranked.iter().rev().map(|g| g.group.clone()).collect();

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(160)
            .build_cartesian_2d(0f64..x_max, -0.5f64..(n as f64 - 0.5))
            .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .disable_y_mesh()
            .light_line_style(GRID)
            .y_labels(n)
            .y_label_formatter(&|y| label_at(&labels, *y))
            .x_desc("Mean price ($)")
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let last = ranked.len().saturating_sub(1);
        chart
            .draw_series(ranked.iter().enumerate().map(|(rank, group)| {
                let y = (last - rank) as f64;
                Rectangle::new(
                    [(0.0, y - 0.4), (group.mean_price, y + 0.4)],
                    palette[rank % palette.len()].filled(),
                )
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        Ok(())
    }

    fn draw_scatter(area: &Panel, title: &str, points: &[(f64, f64)], style: &ResolvedStyle) -> Result<()> {
        let x_max = points.iter().map(|p| p.0).fold(0.0, f64::max).max(1.0) * 1.05;
        let y_max = points.iter().map(|p| p.1).fold(0.0, f64::max).max(1.0) * 1.05;

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)
            .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .light_line_style(GRID)
            .x_desc("Reviews")
            .y_desc("Price ($)")
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let color = style.color(1);
        chart
            .draw_series(
                points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 3, color.mix(0.6).filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        Ok(())
    }

    fn draw_heatmap(area: &Panel, title: &str, matrix: &CorrelationMatrix) -> Result<()> {
        let n = matrix.columns.len().max(1);
        let size = n as f64;

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 26))
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(140)
            .build_cartesian_2d(0f64..size, 0f64..size)
            .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

        // Row 0 is drawn at the top.
        let row_labels: Vec<String> = matrix.columns.iter().rev().cloned().collect();
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n)
            .y_labels(n)
            .x_label_formatter(&|x| cell_label(&matrix.columns, *x))
            .y_label_formatter(&|y| cell_label(&row_labels, *y))
            .draw()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let cells: Vec<(f64, f64, f64)> = matrix
            .values
            .iter()
            .enumerate()
            .flat_map(|(i, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(j, r)| (j as f64, (n - 1 - i) as f64, *r))
            })
            .collect();

        chart
            .draw_series(
                cells
                    .iter()
                    .map(|&(x, y, r)| Rectangle::new([(x, y), (x + 1.0, y + 1.0)], heat_color(r).filled())),
            )
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        let text = TextStyle::from((FONT, 22.0).into_font()).pos(Pos::new(HPos::Center, VPos::Center));
        chart
            .draw_series(cells.iter().map(|&(x, y, r)| {
                let value = if r.is_nan() { "nan".to_string() } else { format!("{r:.2}") };
                Text::new(value, (x + 0.5, y + 0.5), text.clone())
            }))
            .map_err(|e| PlotError::Drawing(e.to_string()))?;

        debug!(columns = n, "Correlation heatmap drawn");
        Ok(())
    }
}

fn split_groups(groups: &[GroupPrice], value: impl Fn(&GroupPrice) -> f64) -> (Vec<String>, Vec<f64>) {
    groups.iter().map(|g| (g.group.clone(), value(g))).unzip()
}

/// Label for a bar centred on an integer coordinate.
fn label_at(labels: &[String], position: f64) -> String {
    let rounded = position.round();
    if (position - rounded).abs() > 0.25 || rounded < 0.0 {
        return String::new();
    }
    labels.get(rounded as usize).cloned().unwrap_or_default()
}

/// Label for a unit cell spanning `[i, i + 1)`.
fn cell_label(labels: &[String], position: f64) -> String {
    if position < 0.0 {
        return String::new();
    }
    labels.get(position.floor() as usize).cloned().unwrap_or_default()
}

/// Map a correlation in [-1, 1] onto the red-yellow-green scale.
fn heat_color(r: f64) -> RGBColor {
    if r.is_nan() {
        return MISSING;
    }
    let r = r.clamp(-1.0, 1.0);
    if r < 0.0 {
        blend(HEAT_MID, HEAT_LOW, -r)
    } else {
        blend(HEAT_MID, HEAT_HIGH, r)
    }
}

fn blend(from: RGBColor, to: RGBColor, t: f64) -> RGBColor {
    let channel = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(channel(from.0, to.0), channel(from.1, to.1), channel(from.2, to.2))
}

/// Corners of each non-empty histogram bar, drawn filled and then outlined.
fn histogram_bars(histogram: &Histogram) -> impl Iterator<Item = [(f64, f64); 2]> + '_ {
    histogram
        .counts
        .iter()
        .enumerate()
        .filter(|(_, count)| **count > 0)
        .map(|(bin, count)| {
            let (low, high) = histogram.bin_range(bin);
            [(low, 0.0), (high, *count as f64)]
        })
}

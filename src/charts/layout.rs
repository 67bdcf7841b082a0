//! Static Chart Layout
//! Page geometry shared by the PDF and PNG encoders.
//!
//! All values are in points with the origin at the top-left corner.
//!
//! ```text
//! +--------------------------------------------------------------+
//! |                          Title                               |
//! | pathway labels | plot area           | colorbar | legend     |
//! |                | x ticks / axis title|          |            |
//! +--------------------------------------------------------------+
//! ```

use crate::charts::bubble::{format_tick, marker_radius, ticks, RenderedChart};

pub const TITLE_SIZE: f64 = 16.0;
pub const LABEL_SIZE: f64 = 12.0;
pub const TICK_SIZE: f64 = 11.0;
pub const AXIS_TITLE_SIZE: f64 = 13.0;
pub const LEGEND_SIZE: f64 = 10.0;

const MARGIN: f64 = 36.0;
const TITLE_BAND: f64 = 44.0;
const ROW_PITCH: f64 = 30.0;
const MIN_PLOT_HEIGHT: f64 = 260.0;
const PLOT_WIDTH: f64 = 480.0;
const COLORBAR_WIDTH: f64 = 14.0;
const COLORBAR_GAP: f64 = 28.0;
const LEGEND_GAP: f64 = 96.0;
const LEGEND_WIDTH: f64 = 150.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    /// Position along the axis (x for the plot axis, y for the colorbar).
    pub pos: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LegendSlot {
    pub center: (f64, f64),
    pub radius: f64,
    pub label: String,
    pub label_pos: (f64, f64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChartLayout {
    pub page_width: f64,
    pub page_height: f64,
    /// Title center x and baseline y.
    pub title_pos: (f64, f64),
    pub plot: Rect,
    pub row_pitch: f64,
    pub x_range: (f64, f64),
    pub x_ticks: Vec<AxisTick>,
    /// Axis title center x and baseline y.
    pub x_label_pos: (f64, f64),
    pub colorbar: Rect,
    pub colorbar_ticks: Vec<AxisTick>,
    /// Rotated colorbar label anchor (baseline start after rotating 90 degrees).
    pub colorbar_label_pos: (f64, f64),
    pub legend_title_pos: (f64, f64),
    pub legend_slots: Vec<LegendSlot>,
}

impl ChartLayout {
    pub fn compute(chart: &RenderedChart) -> Self {
        let rows = chart.row_count();

        let gutter = chart
            .row_labels()
            .iter()
            .map(|label| text_width(label, LABEL_SIZE, true))
            .fold(0.0, f64::max)
            + 12.0;

        let plot_top = MARGIN + TITLE_BAND;
        let plot_h = ((rows + 1) as f64 * ROW_PITCH).max(MIN_PLOT_HEIGHT);
        let plot = Rect {
            x: MARGIN + gutter,
            y: plot_top,
            w: PLOT_WIDTH,
            h: plot_h,
        };
        let row_pitch = plot_h / (rows + 1) as f64;

        let x_range = chart.x_range;
        let x_ticks = chart
            .x_ticks
            .iter()
            .map(|&v| AxisTick {
                pos: map_linear(v, x_range, plot.x, plot.w),
                label: format_tick(v, &chart.x_ticks),
            })
            .collect();

        let colorbar_h = (plot_h * 0.4).clamp(120.0, 300.0);
        let colorbar = Rect {
            x: plot.right() + COLORBAR_GAP,
            y: plot_top,
            w: COLORBAR_WIDTH,
            h: colorbar_h,
        };
        let colorbar_ticks = colorbar_ticks(chart, &colorbar);

        let legend_x = colorbar.right() + LEGEND_GAP;
        let legend_title_pos = (legend_x, plot_top + LEGEND_SIZE + 2.0);
        let mut cursor = legend_title_pos.1 + 10.0;
        let legend_slots = chart
            .size_legend
            .iter()
            .map(|entry| {
                let radius = marker_radius(entry.area);
                let slot_h = (radius * 2.0).max(LEGEND_SIZE + 4.0) + 8.0;
                let center_y = cursor + slot_h / 2.0;
                let center_x = legend_x + 30.0;
                cursor += slot_h;
                LegendSlot {
                    center: (center_x, center_y),
                    radius,
                    label: format!("Gene Count: {}", entry.count),
                    label_pos: (center_x + radius.max(6.0) + 8.0, center_y + LEGEND_SIZE * 0.35),
                }
            })
            .collect();

        let page_width = legend_x + LEGEND_WIDTH + MARGIN;
        let content_bottom = (plot.bottom() + 56.0).max(cursor).max(colorbar.bottom());
        let page_height = content_bottom + MARGIN;

        Self {
            page_width,
            page_height,
            title_pos: (page_width / 2.0, MARGIN + TITLE_SIZE),
            plot,
            row_pitch,
            x_range,
            x_ticks,
            x_label_pos: (plot.x + plot.w / 2.0, plot.bottom() + 44.0),
            colorbar,
            colorbar_ticks,
            colorbar_label_pos: (colorbar.right() + 52.0, colorbar.y + colorbar.h / 2.0),
            legend_title_pos,
            legend_slots,
        }
    }

    pub fn map_x(&self, value: f64) -> f64 {
        map_linear(value, self.x_range, self.plot.x, self.plot.w)
    }

    /// Vertical center of a categorical row (row 0 sits at the bottom).
    pub fn map_row(&self, row: usize) -> f64 {
        self.plot.bottom() - (row + 1) as f64 * self.row_pitch
    }
}

fn map_linear(value: f64, (lo, hi): (f64, f64), start: f64, len: f64) -> f64 {
    if hi - lo <= f64::EPSILON {
        return start + len / 2.0;
    }
    start + (value - lo) / (hi - lo) * len
}

fn colorbar_ticks(chart: &RenderedChart, bar: &Rect) -> Vec<AxisTick> {
    let (lo, hi) = chart.color_range;
    let y_of = |v: f64| bar.bottom() - chart.color_position(v) * bar.h;

    if hi - lo <= f64::EPSILON {
        return vec![AxisTick {
            pos: y_of(lo),
            label: format!("{:.2}", lo),
        }];
    }

    let values: Vec<f64> = ticks((lo, hi), 4)
        .into_iter()
        .filter(|v| *v >= lo - 1e-9 && *v <= hi + 1e-9)
        .collect();
    values
        .iter()
        .map(|&v| AxisTick {
            pos: y_of(v),
            label: format_tick(v, &values),
        })
        .collect()
}

/// Approximate Helvetica advance width of `text` at `size` points.
pub fn text_width(text: &str, size: f64, bold: bool) -> f64 {
    let em: f64 = text
        .chars()
        .map(|c| match c {
            'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
            ' ' | 'f' | 't' | 'r' | '-' | '(' | ')' | '[' | ']' | '/' => 0.33,
            'm' | 'w' | 'M' | 'W' => 0.85,
            '0'..='9' => 0.556,
            c if c.is_ascii_uppercase() => 0.68,
            _ => 0.54,
        })
        .sum();
    em * size * if bold { 1.06 } else { 1.0 }
}

//! Bubble Chart Renderer
//! Turns pathway records and a plot configuration into a drawable chart description.
//!
//! Layout rules:
//! - X-axis: -log10(p-value)
//! - Y-axis: one row per selected pathway, most significant at the top
//! - Bubble area: gene count * bubble scale (points squared)
//! - Bubble fill: color map sampled by -log10(p-value)

use crate::charts::config::LEGEND_COUNTS;
use crate::charts::{ColorMap, PlotConfig, Rgb};
use crate::data::PathwayRecord;
use thiserror::Error;
use tracing::debug;

pub const X_AXIS_LABEL: &str = "-log10 (p-value)";
pub const LEGEND_TITLE: &str = "Gene Counts";

#[derive(Error, Debug, PartialEq)]
pub enum RenderError {
    #[error("Nothing to plot: no pathway rows after filtering")]
    EmptyDataset,
    #[error("Bubble scale must be a positive number, got {0}")]
    InvalidBubbleScale(f64),
}

/// One bubble on the chart.
#[derive(Debug, Clone, PartialEq)]
pub struct BubblePoint {
    pub pathway: String,
    pub p_value: f64,
    pub count: u64,
    /// -log10(p-value)
    pub x: f64,
    /// Categorical row, 0 at the bottom.
    pub row: usize,
    /// Marker area in points squared.
    pub area: f64,
    pub color: Rgb,
}

impl BubblePoint {
    /// Marker radius in points (area is the square of the diameter).
    pub fn radius(&self) -> f64 {
        marker_radius(self.area)
    }
}

/// Radius in points for a marker of `area` points squared.
pub fn marker_radius(area: f64) -> f64 {
    area.max(0.0).sqrt() / 2.0
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeLegendEntry {
    pub count: u64,
    pub area: f64,
}

/// Everything needed to draw the chart, independent of the output surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedChart {
    pub title: String,
    pub x_label: &'static str,
    /// Bubbles ordered by row, bottom first.
    pub points: Vec<BubblePoint>,
    pub x_range: (f64, f64),
    pub x_ticks: Vec<f64>,
    /// -log10(p) values at the color map's ends.
    pub color_range: (f64, f64),
    pub color_map: ColorMap,
    pub show_grid: bool,
    pub size_legend: Vec<SizeLegendEntry>,
    /// Selected records, most significant first.
    pub selection: Vec<PathwayRecord>,
}

impl RenderedChart {
    pub fn row_count(&self) -> usize {
        self.points.len()
    }

    /// Pathway names by row, bottom first.
    pub fn row_labels(&self) -> Vec<&str> {
        self.points.iter().map(|p| p.pathway.as_str()).collect()
    }

    /// Position of `value` inside the color range, 0.0..=1.0.
    pub fn color_position(&self, value: f64) -> f64 {
        normalize(value, self.color_range)
    }
}

/// Stable selection of the `top_n` most significant records.
pub fn select_top(records: &[PathwayRecord], top_n: usize) -> Vec<PathwayRecord> {
    let mut ranked: Vec<&PathwayRecord> = records.iter().collect();
    // sort_by is stable, so equal p-values keep input order
    ranked.sort_by(|a, b| a.p_value.total_cmp(&b.p_value));
    ranked.into_iter().take(top_n).cloned().collect()
}

/// Render records into a chart description. Pure; no I/O.
pub fn render(records: &[PathwayRecord], config: &PlotConfig) -> Result<RenderedChart, RenderError> {
    if !config.bubble_scale.is_finite() || config.bubble_scale <= 0.0 {
        return Err(RenderError::InvalidBubbleScale(config.bubble_scale));
    }

    let effective = config.top_n.min(records.len());
    if effective == 0 {
        return Err(RenderError::EmptyDataset);
    }

    let selection = select_top(records, effective);

    let xs: Vec<f64> = selection.iter().map(PathwayRecord::neg_log_p).collect();
    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let color_range = (x_min, x_max);

    // Least significant at the bottom row, so walk the selection backwards.
    let points: Vec<BubblePoint> = selection
        .iter()
        .zip(xs.iter())
        .rev()
        .enumerate()
        .map(|(row, (record, &x))| BubblePoint {
            pathway: record.name.clone(),
            p_value: record.p_value,
            count: record.count,
            x,
            row,
            area: record.count as f64 * config.bubble_scale,
            color: config.color_map.sample(normalize(x, color_range)),
        })
        .collect();

    let x_range = padded_range(x_min, x_max);
    let x_ticks = ticks(x_range, 6);

    let size_legend = LEGEND_COUNTS
        .iter()
        .map(|&count| SizeLegendEntry {
            count,
            area: count as f64 * config.bubble_scale,
        })
        .collect();

    debug!(
        records = records.len(),
        selected = selection.len(),
        color_map = %config.color_map,
        "bubble chart rendered"
    );

    Ok(RenderedChart {
        title: config.title.clone(),
        x_label: X_AXIS_LABEL,
        points,
        x_range,
        x_ticks,
        color_range,
        color_map: config.color_map,
        show_grid: config.show_grid,
        size_legend,
        selection,
    })
}

fn normalize(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi - lo <= f64::EPSILON {
        0.5
    } else {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

/// Data range padded by 5% per side, never below zero.
pub fn padded_range(min: f64, max: f64) -> (f64, f64) {
    let span = max - min;
    let pad = if span > f64::EPSILON { span * 0.05 } else { 0.5 };
    ((min - pad).max(0.0), max + pad)
}

/// Tick positions at a "nice" step inside `range`.
pub fn ticks((lo, hi): (f64, f64), target_steps: usize) -> Vec<f64> {
    let step = nice_step(hi - lo, target_steps);
    if !step.is_finite() || step <= 0.0 {
        return vec![lo];
    }

    let first = (lo / step).ceil() * step;
    let mut out = Vec::new();
    let mut i = 0;
    loop {
        let v = first + i as f64 * step;
        if v > hi + step * 1e-9 {
            break;
        }
        // snap away float noise like 0.30000000000000004
        out.push((v / step).round() * step);
        i += 1;
    }
    out
}

fn nice_step(range: f64, target_steps: usize) -> f64 {
    let raw_step = range / target_steps.max(1) as f64;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;

    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };

    nice * magnitude
}

/// Tick label with as few decimals as the step needs.
pub fn format_tick(value: f64, ticks: &[f64]) -> String {
    let step = match ticks {
        [a, b, ..] => (b - a).abs(),
        _ => 1.0,
    };
    let decimals = if step >= 1.0 {
        0
    } else {
        (-step.log10().floor()) as usize
    };
    format!("{:.*}", decimals, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn sample_records() -> Vec<PathwayRecord> {
        vec![
            PathwayRecord::new("A", 0.0023, 25),
            PathwayRecord::new("B", 0.0081, 40),
            PathwayRecord::new("C", 0.0150, 60),
        ]
    }

    fn config(top_n: usize) -> PlotConfig {
        PlotConfig {
            top_n,
            ..PlotConfig::default()
        }
    }

    fn names(records: &[PathwayRecord]) -> Vec<&str> {
        records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn selects_two_most_significant() {
        let chart = render(&sample_records(), &config(2)).expect("render");
        assert_eq!(names(&chart.selection), vec!["A", "B"]);
    }

    #[test]
    fn top_n_above_record_count_keeps_everything() {
        let mut records = sample_records();
        records.reverse();
        let chart = render(&records, &config(10)).expect("render");
        assert_eq!(names(&chart.selection), vec!["A", "B", "C"]);
        assert_eq!(chart.row_count(), 3);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(render(&[], &config(5)), Err(RenderError::EmptyDataset));
    }

    #[test]
    fn zero_top_n_is_an_error() {
        assert_eq!(
            render(&sample_records(), &config(0)),
            Err(RenderError::EmptyDataset)
        );
    }

    #[test]
    fn rejects_non_positive_bubble_scale() {
        let cfg = PlotConfig {
            bubble_scale: 0.0,
            ..PlotConfig::default()
        };
        assert_eq!(
            render(&sample_records(), &cfg),
            Err(RenderError::InvalidBubbleScale(0.0))
        );
    }

    #[test]
    fn most_significant_pathway_is_top_row() {
        let chart = render(&sample_records(), &config(3)).expect("render");
        assert_eq!(chart.row_labels(), vec!["C", "B", "A"]);
        let top = chart.points.last().expect("points");
        assert_eq!(top.row, 2);
        assert_relative_eq!(top.x, -(0.0023f64).log10());
    }

    #[test]
    fn bubble_area_scales_with_count() {
        let cfg = PlotConfig {
            bubble_scale: 35.0,
            ..config(3)
        };
        let chart = render(&sample_records(), &cfg).expect("render");
        let a = chart.points.iter().find(|p| p.pathway == "A").expect("A");
        assert_relative_eq!(a.area, 25.0 * 35.0);
        assert_relative_eq!(a.radius(), (875.0f64).sqrt() / 2.0);
        assert_eq!(chart.size_legend[2].count, 50);
        assert_relative_eq!(chart.size_legend[2].area, 50.0 * 35.0);
    }

    #[test]
    fn colors_span_the_map() {
        let cfg = PlotConfig {
            color_map: ColorMap::Viridis,
            ..config(3)
        };
        let chart = render(&sample_records(), &cfg).expect("render");
        let a = chart.points.iter().find(|p| p.pathway == "A").expect("A");
        let c = chart.points.iter().find(|p| p.pathway == "C").expect("C");
        assert_eq!(a.color, ColorMap::Viridis.sample(1.0));
        assert_eq!(c.color, ColorMap::Viridis.sample(0.0));
    }

    #[test]
    fn single_record_samples_map_middle() {
        let records = vec![PathwayRecord::new("only", 0.01, 5)];
        let chart = render(&records, &config(3)).expect("render");
        assert_eq!(chart.points[0].color, ColorMap::RdBuR.sample(0.5));
        assert_relative_eq!(chart.x_range.0, 1.5);
        assert_relative_eq!(chart.x_range.1, 2.5);
    }

    #[test]
    fn x_range_covers_all_points() {
        let chart = render(&sample_records(), &config(3)).expect("render");
        for p in &chart.points {
            assert!(p.x >= chart.x_range.0 && p.x <= chart.x_range.1);
        }
        assert!(chart.x_range.0 >= 0.0);
        assert!(!chart.x_ticks.is_empty());
    }

    #[test]
    fn ticks_use_nice_steps() {
        assert_eq!(ticks((0.0, 10.0), 5), vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
        let t = ticks((1.7, 2.6), 6);
        assert_eq!(t.len(), 5);
        assert_relative_eq!(t[0], 1.8);
        assert_eq!(format_tick(t[0], &t), "1.8");
        assert_eq!(format_tick(4.0, &[0.0, 2.0]), "4");
    }

    #[test]
    fn ties_keep_input_order() {
        let records = vec![
            PathwayRecord::new("late", 0.05, 1),
            PathwayRecord::new("first", 0.01, 1),
            PathwayRecord::new("second", 0.01, 1),
            PathwayRecord::new("third", 0.01, 1),
        ];
        assert_eq!(
            names(&select_top(&records, 3)),
            vec!["first", "second", "third"]
        );
    }

    fn arb_records() -> impl Strategy<Value = Vec<PathwayRecord>> {
        // a small set of p-values forces plenty of ties
        let p = prop::sample::select(vec![0.001, 0.005, 0.01, 0.05, 0.2, 1.0]);
        prop::collection::vec((p, 0u64..200), 1..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(i, (p, c))| PathwayRecord::new(format!("pw{}", i), p, c))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn selection_size_is_min_of_top_n_and_len(records in arb_records(), top_n in 1usize..60) {
            let chart = render(&records, &config(top_n)).expect("render");
            prop_assert_eq!(chart.selection.len(), top_n.min(records.len()));
            prop_assert_eq!(chart.points.len(), chart.selection.len());
        }

        #[test]
        fn selected_never_less_significant_than_rejected(records in arb_records(), top_n in 1usize..60) {
            let chart = render(&records, &config(top_n)).expect("render");
            let selected: Vec<&str> = chart.selection.iter().map(|r| r.name.as_str()).collect();
            let worst_selected = chart.selection.iter().map(|r| r.p_value).fold(0.0, f64::max);
            for r in records.iter().filter(|r| !selected.contains(&r.name.as_str())) {
                prop_assert!(worst_selected <= r.p_value);
            }
        }

        #[test]
        fn equal_p_values_keep_input_order(records in arb_records(), top_n in 1usize..60) {
            let chart = render(&records, &config(top_n)).expect("render");
            let index_of = |name: &str| records.iter().position(|r| r.name == name).unwrap();
            for pair in chart.selection.windows(2) {
                prop_assert!(pair[0].p_value <= pair[1].p_value);
                if pair[0].p_value == pair[1].p_value {
                    prop_assert!(index_of(&pair[0].name) < index_of(&pair[1].name));
                }
            }
        }
    }
}

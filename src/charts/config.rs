//! Plot configuration and its defaults.

use crate::charts::ColorMap;

pub const DEFAULT_TOP_N: usize = 30;
pub const DEFAULT_BUBBLE_SCALE: f64 = 20.0;
pub const DEFAULT_TITLE: &str = "Pathway Analysis Bubble Plot";

/// Bubble scale slider bounds.
pub const BUBBLE_SCALE_RANGE: std::ops::RangeInclusive<f64> = 10.0..=100.0;

/// Gene counts drawn in the size legend.
pub const LEGEND_COUNTS: [u64; 3] = [10, 30, 50];

/// Display parameters for one render. Built fresh from the UI state each frame.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotConfig {
    /// Number of most significant pathways to show.
    pub top_n: usize,
    /// Multiplier on bubble area (points squared per gene).
    pub bubble_scale: f64,
    pub color_map: ColorMap,
    pub show_grid: bool,
    pub title: String,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            bubble_scale: DEFAULT_BUBBLE_SCALE,
            color_map: ColorMap::default(),
            show_grid: true,
            title: DEFAULT_TITLE.to_string(),
        }
    }
}

impl PlotConfig {
    /// Clamp `top_n` into `[1, record_count]` the way the slider does.
    pub fn clamp_top_n(top_n: usize, record_count: usize) -> usize {
        top_n.clamp(1, record_count.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = PlotConfig::default();
        assert_eq!(cfg.top_n, 30);
        assert_eq!(cfg.bubble_scale, 20.0);
        assert_eq!(cfg.color_map, ColorMap::RdBuR);
        assert!(cfg.show_grid);
        assert_eq!(cfg.title, "Pathway Analysis Bubble Plot");
    }

    #[test]
    fn top_n_clamps_to_record_count() {
        assert_eq!(PlotConfig::clamp_top_n(30, 12), 12);
        assert_eq!(PlotConfig::clamp_top_n(0, 12), 1);
        assert_eq!(PlotConfig::clamp_top_n(5, 0), 1);
        assert_eq!(PlotConfig::clamp_top_n(5, 12), 5);
    }
}

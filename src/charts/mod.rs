//! Charts module - bubble chart rendering

pub mod bubble;
mod colormap;
pub mod config;
pub mod layout;
mod plotter;
mod renderer;

pub use bubble::{render, RenderedChart, LEGEND_TITLE};
pub use colormap::{ColorMap, Rgb};
pub use config::PlotConfig;
pub use plotter::ChartPlotter;
pub use renderer::StaticChartRenderer;

//! Pathway Bubble - Enrichment Bubble Plot Generator
//!
//! A Rust application for plotting pathway enrichment results (pathway name,
//! p-value, gene count) as a bubble chart and exporting it to PDF or PNG.

mod charts;
mod data;
mod export;
mod gui;
mod pdf;

use anyhow::{anyhow, Context, Result};
use charts::{render, ColorMap, PlotConfig};
use clap::Parser;
use data::{ColumnMapping, DataLoader, RecordExtractor};
use eframe::egui;
use gui::{LaunchOptions, PathwayBubbleApp};
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "pathway-bubble", version, about = "Pathway enrichment bubble plot generator")]
struct Cli {
    /// Enrichment table to open (csv, tsv, txt, xlsx, xlsm, xls, ods).
    file: Option<PathBuf>,

    /// Column holding pathway names.
    #[arg(long)]
    pathway_col: Option<String>,

    /// Column holding p-values.
    #[arg(long)]
    pvalue_col: Option<String>,

    /// Column holding gene counts.
    #[arg(long)]
    count_col: Option<String>,

    /// Number of most significant pathways to plot.
    #[arg(long, default_value_t = charts::config::DEFAULT_TOP_N)]
    top_n: usize,

    /// Bubble area per gene, in points squared.
    #[arg(long, default_value_t = charts::config::DEFAULT_BUBBLE_SCALE)]
    bubble_scale: f64,

    /// Color map: RdBu_r, viridis, plasma, coolwarm or magma.
    #[arg(long, default_value_t = ColorMap::default())]
    cmap: ColorMap,

    /// Hide grid lines.
    #[arg(long)]
    no_grid: bool,

    /// Chart title.
    #[arg(long, default_value = charts::config::DEFAULT_TITLE)]
    title: String,

    /// Write the chart to this .pdf or .png file and exit without a window.
    #[arg(long, requires = "file")]
    export: Option<PathBuf>,
}

impl Cli {
    fn plot_config(&self) -> PlotConfig {
        PlotConfig {
            top_n: self.top_n,
            bubble_scale: self.bubble_scale,
            color_map: self.cmap,
            show_grid: !self.no_grid,
            title: self.title.clone(),
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    if let (Some(input), Some(output)) = (cli.file.as_deref(), cli.export.as_deref()) {
        return export_headless(&cli, input, output);
    }
    run_gui(cli)
}

/// Load, extract, render and write one chart without opening a window.
fn export_headless(cli: &Cli, input: &Path, output: &Path) -> Result<()> {
    let mut loader = DataLoader::new();
    loader
        .load(input)
        .with_context(|| format!("failed to load {}", input.display()))?;

    let mapping = ColumnMapping::guess(&loader.get_columns(), &loader.get_numeric_columns())
        .override_with(
            cli.pathway_col.as_deref(),
            cli.pvalue_col.as_deref(),
            cli.count_col.as_deref(),
        );
    info!(
        pathway = %mapping.pathway,
        p_value = %mapping.p_value,
        count = %mapping.count,
        "column mapping"
    );

    let df = loader.get_dataframe().context("no table loaded")?;
    let records = RecordExtractor::extract(df, &mapping).context("failed to read pathway rows")?;
    let mut config = cli.plot_config();
    config.top_n = PlotConfig::clamp_top_n(config.top_n, records.len());

    let chart = render(&records, &config).context("failed to render chart")?;
    let bytes = export::export_chart(&chart, output)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} pathways plotted, {} bytes written to {}",
        chart.row_count(),
        bytes,
        output.display()
    );
    Ok(())
}

fn run_gui(cli: Cli) -> Result<()> {
    let options = LaunchOptions {
        config: cli.plot_config(),
        file: cli.file,
        pathway_col: cli.pathway_col,
        pvalue_col: cli.pvalue_col,
        count_col: cli.count_col,
    };

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Pathway Bubble"),
        ..Default::default()
    };

    eframe::run_native(
        "Pathway Bubble",
        native_options,
        Box::new(|cc| Ok(Box::new(PathwayBubbleApp::new(cc, options)))),
    )
    .map_err(|e| anyhow!("window error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headless_export_flags() {
        let cli = Cli::try_parse_from([
            "pathway-bubble",
            "kegg.csv",
            "--top-n",
            "10",
            "--cmap",
            "viridis",
            "--no-grid",
            "--export",
            "out.pdf",
        ])
        .expect("parse");

        let config = cli.plot_config();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.color_map, ColorMap::Viridis);
        assert!(!config.show_grid);
        assert_eq!(cli.export, Some(PathBuf::from("out.pdf")));
    }

    #[test]
    fn defaults_seed_plot_config() {
        let cli = Cli::try_parse_from(["pathway-bubble"]).expect("parse");
        assert_eq!(cli.plot_config(), PlotConfig::default());
    }

    #[test]
    fn export_requires_input_file() {
        assert!(Cli::try_parse_from(["pathway-bubble", "--export", "out.pdf"]).is_err());
    }

    #[test]
    fn rejects_unknown_color_map() {
        assert!(Cli::try_parse_from(["pathway-bubble", "--cmap", "jet"]).is_err());
    }
}

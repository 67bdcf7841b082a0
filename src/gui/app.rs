//! Pathway Bubble Main Application
//! Main window with control panel and chart viewer.

use crate::charts::{render, PlotConfig};
use crate::data::{ColumnMapping, DataLoader, PathwayRecord, RecordExtractor, SUPPORTED_EXTENSIONS};
use crate::export::{self, ExportFormat};
use crate::gui::chart_viewer::PREVIEW_ROWS;
use crate::gui::control_panel::UserSettings;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use polars::prelude::*;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{debug, error, info, warn};

/// Table loading result from background thread
enum LoadResult {
    Complete { df: DataFrame, path: PathBuf },
    Error(String),
}

/// Startup settings, usually taken from the command line.
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub file: Option<PathBuf>,
    pub pathway_col: Option<String>,
    pub pvalue_col: Option<String>,
    pub count_col: Option<String>,
    pub config: PlotConfig,
}

/// Column names requested up front; applied to the first table loaded.
#[derive(Debug, Clone, Default)]
struct ColumnOverrides {
    pathway: Option<String>,
    p_value: Option<String>,
    count: Option<String>,
}

/// Main application window.
pub struct PathwayBubbleApp {
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    records: Vec<PathwayRecord>,

    // Settings behind the chart currently shown
    rendered_mapping: Option<ColumnMapping>,
    rendered_config: Option<PlotConfig>,
    extract_failed: bool,
    overrides: Option<ColumnOverrides>,

    // Async table loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl PathwayBubbleApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, options: LaunchOptions) -> Self {
        Self::with_options(options)
    }

    fn with_options(options: LaunchOptions) -> Self {
        let mut app = Self {
            loader: DataLoader::new(),
            control_panel: ControlPanel::new(UserSettings::from_config(&options.config)),
            chart_viewer: ChartViewer::new(),
            records: Vec::new(),
            rendered_mapping: None,
            rendered_config: None,
            extract_failed: false,
            overrides: Some(ColumnOverrides {
                pathway: options.pathway_col,
                p_value: options.pvalue_col,
                count: options.count_col,
            }),
            load_rx: None,
            is_loading: false,
        };

        if let Some(path) = options.file {
            app.start_loading(path);
        }
        app
    }

    /// Handle file selection
    fn handle_browse_file(&mut self) {
        if self.is_loading {
            return;
        }

        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Tables", &SUPPORTED_EXTENSIONS)
            .add_filter("CSV / TSV", &["csv", "tsv", "txt"])
            .add_filter("Spreadsheets", &["xlsx", "xlsm", "xls", "ods"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    /// Read the table in a background thread
    fn start_loading(&mut self, path: PathBuf) {
        // the previous table must not be re-rendered under the new file's name
        self.loader = DataLoader::new();
        self.chart_viewer.clear();
        self.records.clear();
        self.rendered_mapping = None;
        self.rendered_config = None;
        self.control_panel.columns.clear();
        self.control_panel.record_count = 0;
        self.control_panel.export_enabled = false;
        self.control_panel.settings.file_path = Some(path.clone());
        self.control_panel.set_status("Loading file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);

        thread::spawn(move || {
            let result = match DataLoader::read_table(&path) {
                Ok(df) => LoadResult::Complete { df, path },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for table loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { df, path }) => {
                self.is_loading = false;
                self.on_table_loaded(df, path);
            }
            Ok(LoadResult::Error(message)) => {
                self.is_loading = false;
                error!(%message, "table load failed");
                self.control_panel.set_error(&message);
            }
            Err(std::sync::mpsc::TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                self.is_loading = false;
                self.control_panel.set_error("loader thread stopped unexpectedly");
            }
        }
    }

    fn on_table_loaded(&mut self, df: DataFrame, path: PathBuf) {
        self.loader.set_dataframe(df, path);
        self.records.clear();
        self.rendered_mapping = None;
        self.rendered_config = None;
        self.extract_failed = false;
        let columns = self.loader.get_columns();
        let mut mapping = ColumnMapping::guess(&columns, &self.loader.get_numeric_columns());
        if let Some(o) = self.overrides.take() {
            mapping = mapping.override_with(
                o.pathway.as_deref(),
                o.p_value.as_deref(),
                o.count.as_deref(),
            );
        }
        debug!(
            path = ?self.loader.get_file_path(),
            ?mapping,
            "initial column mapping"
        );

        let row_count = self.loader.get_row_count();
        self.chart_viewer
            .set_preview(columns.clone(), self.loader.preview_rows(PREVIEW_ROWS));
        self.control_panel.update_columns(columns, mapping);
        self.control_panel.set_status(&format!(
            "Loaded {} rows, {} columns",
            row_count,
            self.control_panel.columns.len()
        ));
    }

    /// Re-extract records after the column mapping changed
    fn extract_records(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            return;
        };
        let mapping = self.control_panel.settings.mapping.clone();
        self.rendered_mapping = Some(mapping.clone());
        self.rendered_config = None;

        match RecordExtractor::extract(df, &mapping) {
            Ok(records) => {
                self.extract_failed = false;
                self.control_panel.record_count = records.len();
                self.records = records;
            }
            Err(e) => {
                self.extract_failed = true;
                self.control_panel.record_count = 0;
                self.records.clear();
                self.chart_viewer.set_error(e.to_string());
                self.control_panel.export_enabled = false;
                self.control_panel.set_error(&e.to_string());
            }
        }
    }

    /// Render again when the mapping or any plot setting differs from the chart shown
    fn refresh_chart(&mut self) {
        if self.loader.get_dataframe().is_none() || self.is_loading {
            return;
        }

        if self.rendered_mapping.as_ref() != Some(&self.control_panel.settings.mapping) {
            self.extract_records();
        }
        if self.extract_failed {
            return;
        }

        let config = self
            .control_panel
            .settings
            .plot_config(self.control_panel.record_count);
        if self.rendered_config.as_ref() == Some(&config) {
            return;
        }

        match render(&self.records, &config) {
            Ok(chart) => {
                let lead = chart
                    .selection
                    .first()
                    .map(|r| format!(" (most significant: {}, p = {:.2e})", r.name, r.p_value))
                    .unwrap_or_default();
                self.control_panel.set_status(&format!(
                    "Showing top {} of {} pathways{}",
                    chart.selection.len(),
                    self.records.len(),
                    lead
                ));
                self.chart_viewer.set_chart(chart);
                self.control_panel.export_enabled = true;
            }
            Err(e) => {
                warn!(error = %e, "render failed");
                self.chart_viewer.set_error(e.to_string());
                self.control_panel.export_enabled = false;
                self.control_panel.set_error(&e.to_string());
            }
        }
        self.rendered_config = Some(config);
    }

    /// Ask for a destination and write the current chart
    fn handle_export(&mut self, format: ExportFormat) {
        let Some(chart) = self.chart_viewer.chart() else {
            self.control_panel.set_error("No chart to export");
            return;
        };

        let Some(output_path) = rfd::FileDialog::new()
            .add_filter(format.extension().to_uppercase(), &[format.extension()])
            .set_file_name(format.default_file_name())
            .save_file()
        else {
            return;
        };
        let output_path = if output_path.extension().is_none() {
            output_path.with_extension(format.extension())
        } else {
            output_path
        };

        match export::export_chart(chart, &output_path) {
            Ok(bytes) => {
                self.control_panel.set_status(&format!(
                    "Exported {} ({} KB)",
                    output_path.display(),
                    bytes.div_ceil(1024)
                ));
                self.control_panel.last_export = Some(output_path);
            }
            Err(e) => {
                error!(error = %e, path = %output_path.display(), "export failed");
                self.control_panel.set_error(&e.to_string());
            }
        }
    }

    /// Open the last export with the system viewer
    fn handle_open_export(&mut self) {
        let Some(path) = self.control_panel.last_export.clone() else {
            return;
        };
        info!(path = %path.display(), "opening export");
        if let Err(e) = open::that(&path) {
            self.control_panel
                .set_error(&format!("Could not open {}: {}", path.display(), e));
        }
    }
}

impl eframe::App for PathwayBubbleApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseFile => self.handle_browse_file(),
                        ControlPanelAction::MappingChanged => {
                            self.rendered_mapping = None;
                        }
                        ControlPanelAction::ExportPdf => self.handle_export(ExportFormat::Pdf),
                        ControlPanelAction::ExportPng => self.handle_export(ExportFormat::Png),
                        ControlPanelAction::OpenExport => self.handle_open_export(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        self.refresh_chart();

        // Central panel - Chart Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> DataFrame {
        let names: Vec<String> = (0..rows).map(|i| format!("P{}", i)).collect();
        let p_values: Vec<f64> = (0..rows).map(|i| 1e-4 * (i + 1) as f64).collect();
        let counts: Vec<i64> = (0..rows).map(|i| 5 + i as i64).collect();
        df!(
            "Term" => names,
            "PValue" => p_values,
            "Count" => counts
        )
        .expect("frame")
    }

    fn app() -> PathwayBubbleApp {
        PathwayBubbleApp::with_options(LaunchOptions::default())
    }

    fn rows_shown(app: &PathwayBubbleApp) -> Option<usize> {
        app.chart_viewer.chart().map(|c| c.row_count())
    }

    #[test]
    fn failed_reload_reports_error_instead_of_previous_chart() {
        let mut app = app();
        app.on_table_loaded(table(3), PathBuf::from("kegg.csv"));
        app.refresh_chart();
        assert_eq!(rows_shown(&app), Some(3));

        app.start_loading(PathBuf::from("broken.xlsx"));
        let (tx, rx) = channel();
        tx.send(LoadResult::Error("Failed to read workbook: bad zip".to_string()))
            .expect("send");
        app.load_rx = Some(rx);

        app.check_load_results();
        app.refresh_chart();

        assert!(app.control_panel.status_is_error);
        assert_eq!(app.control_panel.status, "Error: Failed to read workbook: bad zip");
        assert_eq!(rows_shown(&app), None);
        assert!(app.control_panel.columns.is_empty());
        assert!(!app.control_panel.export_enabled);
    }

    #[test]
    fn small_table_does_not_lower_requested_top_n() {
        let mut app = app();
        app.on_table_loaded(table(3), PathBuf::from("small.csv"));
        app.refresh_chart();
        assert_eq!(rows_shown(&app), Some(3));

        app.on_table_loaded(table(100), PathBuf::from("large.csv"));
        app.refresh_chart();
        assert_eq!(app.control_panel.settings.top_n, 30);
        assert_eq!(rows_shown(&app), Some(30));
    }

    #[test]
    fn top_n_recovers_after_wrong_count_column() {
        let mut app = app();
        app.on_table_loaded(table(50), PathBuf::from("kegg.csv"));
        app.refresh_chart();
        assert_eq!(rows_shown(&app), Some(30));

        // every row fails the count check
        app.control_panel.settings.mapping.count = "Term".to_string();
        app.refresh_chart();
        assert_eq!(rows_shown(&app), None);

        app.control_panel.settings.mapping.count = "Count".to_string();
        app.refresh_chart();
        assert_eq!(rows_shown(&app), Some(30));
    }
}

//! Chart export - format selection and shared error type.

use crate::charts::{RenderedChart, StaticChartRenderer};
use crate::pdf::PdfGenerator;
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Default download name, as offered by the save dialog.
pub const DEFAULT_PDF_NAME: &str = "Pathway_BubblePlot.pdf";
pub const DEFAULT_PNG_NAME: &str = "Pathway_BubblePlot.png";

/// Pixels per point for PNG export (144 dpi).
pub const PNG_SCALE: f64 = 2.0;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Raster drawing failed: {0}")]
    Raster(String),
    #[error("PNG encoding failed: {0}")]
    Image(#[from] image::ImageError),
    #[error("Unsupported export type '{0}' (use .pdf or .png)")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Pdf,
    Png,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Result<Self, ExportError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(ExportFormat::Pdf),
            "png" => Ok(ExportFormat::Png),
            _ => Err(ExportError::UnsupportedFormat(ext)),
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Png => "png",
        }
    }

    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Pdf => DEFAULT_PDF_NAME,
            ExportFormat::Png => DEFAULT_PNG_NAME,
        }
    }
}

/// Encode `chart` in the given format.
pub fn encode(chart: &RenderedChart, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Pdf => PdfGenerator::encode(chart),
        ExportFormat::Png => StaticChartRenderer::render_png(chart, PNG_SCALE),
    }
}

/// Encode `chart` according to the extension of `output_path` and write it.
pub fn export_chart(chart: &RenderedChart, output_path: &Path) -> Result<usize, ExportError> {
    let format = ExportFormat::from_path(output_path)?;
    let bytes = encode(chart, format)?;
    std::fs::write(output_path, &bytes)?;
    info!(
        path = %output_path.display(),
        format = format.extension(),
        bytes = bytes.len(),
        "chart exported"
    );
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{render, PlotConfig};
    use crate::data::PathwayRecord;

    #[test]
    fn format_follows_extension() {
        assert_eq!(
            ExportFormat::from_path(Path::new("out/Plot.PDF")).expect("pdf"),
            ExportFormat::Pdf
        );
        assert_eq!(
            ExportFormat::from_path(Path::new("plot.png")).expect("png"),
            ExportFormat::Png
        );
        assert!(matches!(
            ExportFormat::from_path(Path::new("plot.svg")),
            Err(ExportError::UnsupportedFormat(ext)) if ext == "svg"
        ));
    }

    #[test]
    fn exports_pdf_by_extension() {
        let records = vec![PathwayRecord::new("A", 0.01, 12)];
        let chart = render(&records, &PlotConfig::default()).expect("render");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(DEFAULT_PDF_NAME);

        let written = export_chart(&chart, &path).expect("export");
        let bytes = std::fs::read(&path).expect("read back");
        assert_eq!(bytes.len(), written);
        assert!(bytes.starts_with(b"%PDF"));
    }
}

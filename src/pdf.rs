//! PDF Export Module
//! Writes a bubble chart as a single-page vector PDF.
//!
//! Uses direct PDF object generation: a catalog, one page, one uncompressed
//! content stream and the built-in Helvetica fonts. Nothing time- or
//! environment-dependent is written, so identical charts encode to identical bytes.

use crate::charts::layout::{
    text_width, ChartLayout, AXIS_TITLE_SIZE, LABEL_SIZE, LEGEND_SIZE, TICK_SIZE, TITLE_SIZE,
};
use crate::charts::{RenderedChart, Rgb};
use crate::export::ExportError;
use std::fmt::Write as _;
use std::io::Write;
use tracing::debug;

/// Bezier handle length for a quarter circle.
const KAPPA: f64 = 0.552_284_749_8;
/// Number of bands used to draw the colorbar gradient.
const COLORBAR_STEPS: usize = 64;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

/// PDF generator for bubble charts
pub struct PdfGenerator;

impl PdfGenerator {
    /// Encode a chart to PDF bytes.
    pub fn encode(chart: &RenderedChart) -> Result<Vec<u8>, ExportError> {
        let layout = ChartLayout::compute(chart);
        let content = Self::content_stream(chart, &layout);

        let mut pdf: Vec<u8> = Vec::with_capacity(content.len() + 2048);
        let mut offsets: Vec<usize> = Vec::new();

        pdf.write_all(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n")?;

        // 1. Catalog
        offsets.push(pdf.len());
        pdf.write_all(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n")?;

        // 2. Page tree
        offsets.push(pdf.len());
        pdf.write_all(b"2 0 obj\n<< /Type /Pages /Kids [3 0 R] /Count 1 >>\nendobj\n")?;

        // 3. Page
        offsets.push(pdf.len());
        write!(
            pdf,
            "3 0 obj\n<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
             /Resources << /Font << /{} 5 0 R /{} 6 0 R >> \
             /ExtGState << /GS0 << /Type /ExtGState /ca 0.8 /CA 0.8 >> \
             /GS1 << /Type /ExtGState /CA 0.7 >> \
             /GS2 << /Type /ExtGState /ca 0.6 /CA 0.6 >> >> >> \
             /Contents 4 0 R >>\nendobj\n",
            num(layout.page_width),
            num(layout.page_height),
            FONT_REGULAR,
            FONT_BOLD,
        )?;

        // 4. Content stream
        offsets.push(pdf.len());
        write!(pdf, "4 0 obj\n<< /Length {} >>\nstream\n", content.len())?;
        pdf.write_all(content.as_bytes())?;
        pdf.write_all(b"\nendstream\nendobj\n")?;

        // 5-6. Fonts
        offsets.push(pdf.len());
        pdf.write_all(
            b"5 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica \
              /Encoding /WinAnsiEncoding >>\nendobj\n",
        )?;
        offsets.push(pdf.len());
        pdf.write_all(
            b"6 0 obj\n<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold \
              /Encoding /WinAnsiEncoding >>\nendobj\n",
        )?;

        // 7. Document info
        offsets.push(pdf.len());
        pdf.write_all(b"7 0 obj\n<< /Producer (pathway-bubble) /Title (")?;
        pdf.write_all(&pdf_string(&chart.title))?;
        pdf.write_all(b") >>\nendobj\n")?;

        // Cross-reference table and trailer
        let xref_offset = pdf.len();
        write!(pdf, "xref\n0 {}\n", offsets.len() + 1)?;
        pdf.write_all(b"0000000000 65535 f \n")?;
        for offset in &offsets {
            write!(pdf, "{:010} 00000 n \n", offset)?;
        }
        write!(
            pdf,
            "trailer\n<< /Size {} /Root 1 0 R /Info 7 0 R >>\nstartxref\n{}\n%%EOF\n",
            offsets.len() + 1,
            xref_offset
        )?;

        debug!(objects = offsets.len(), bytes = pdf.len(), "pdf encoded");
        Ok(pdf)
    }

    fn content_stream(chart: &RenderedChart, layout: &ChartLayout) -> String {
        let mut c = Content::new(layout.page_height);
        let plot = layout.plot;

        // Grid (dashed, behind everything)
        if chart.show_grid {
            c.push("q /GS1 gs");
            c.stroke_color(Rgb::GRID);
            c.line_width(0.5);
            c.push("[3 3] 0 d");
            for tick in &layout.x_ticks {
                c.line((tick.pos, plot.y), (tick.pos, plot.bottom()));
            }
            for row in 0..chart.row_count() {
                let y = layout.map_row(row);
                c.line((plot.x, y), (plot.right(), y));
            }
            c.push("Q");
        }

        // Bubbles, clipped to the plot frame
        c.push("q");
        c.clip_rect(plot.x, plot.y, plot.w, plot.h);
        c.push("/GS0 gs");
        c.stroke_color(Rgb::BLACK);
        c.line_width(0.6);
        for point in &chart.points {
            c.fill_color(point.color);
            c.circle(layout.map_x(point.x), layout.map_row(point.row), point.radius(), "B");
        }
        c.push("Q");

        // Frame
        c.stroke_color(Rgb::BLACK);
        c.line_width(0.8);
        c.stroke_rect(plot.x, plot.y, plot.w, plot.h);

        // X ticks
        c.fill_color(Rgb::BLACK);
        for tick in &layout.x_ticks {
            c.line((tick.pos, plot.bottom()), (tick.pos, plot.bottom() + 4.0));
            c.text_centered(FONT_BOLD, TICK_SIZE, tick.pos, plot.bottom() + 6.0 + TICK_SIZE, &tick.label);
        }

        // Row ticks and pathway labels
        for point in &chart.points {
            let y = layout.map_row(point.row);
            c.line((plot.x - 4.0, y), (plot.x, y));
            let w = text_width(&point.pathway, LABEL_SIZE, true);
            c.text(FONT_BOLD, LABEL_SIZE, plot.x - 7.0 - w, y + LABEL_SIZE * 0.35, &point.pathway);
        }

        // Titles
        c.text_centered(FONT_BOLD, TITLE_SIZE, layout.title_pos.0, layout.title_pos.1, &chart.title);
        c.text_centered(
            FONT_BOLD,
            AXIS_TITLE_SIZE,
            layout.x_label_pos.0,
            layout.x_label_pos.1,
            chart.x_label,
        );

        Self::colorbar(&mut c, chart, layout);
        Self::size_legend(&mut c, layout);

        c.finish()
    }

    fn colorbar(c: &mut Content, chart: &RenderedChart, layout: &ChartLayout) {
        let bar = layout.colorbar;
        let band = bar.h / COLORBAR_STEPS as f64;

        for i in 0..COLORBAR_STEPS {
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            c.fill_color(chart.color_map.sample(t));
            // bands overlap slightly to avoid hairline gaps in viewers
            let top = bar.bottom() - (i + 1) as f64 * band;
            c.fill_rect(bar.x, top, bar.w, band + 0.3);
        }

        c.stroke_color(Rgb::BLACK);
        c.line_width(0.6);
        c.stroke_rect(bar.x, bar.y, bar.w, bar.h);

        c.fill_color(Rgb::BLACK);
        for tick in &layout.colorbar_ticks {
            c.line((bar.right(), tick.pos), (bar.right() + 3.0, tick.pos));
            c.text(FONT_REGULAR, TICK_SIZE - 1.0, bar.right() + 5.0, tick.pos + 3.5, &tick.label);
        }

        let label_w = text_width(chart.x_label, AXIS_TITLE_SIZE, true);
        let (x, center_y) = layout.colorbar_label_pos;
        c.text_rotated(FONT_BOLD, AXIS_TITLE_SIZE, x, center_y + label_w / 2.0, chart.x_label);
    }

    fn size_legend(c: &mut Content, layout: &ChartLayout) {
        c.fill_color(Rgb::BLACK);
        c.text(
            FONT_BOLD,
            LEGEND_SIZE + 1.0,
            layout.legend_title_pos.0,
            layout.legend_title_pos.1,
            crate::charts::LEGEND_TITLE,
        );

        c.push("q /GS2 gs");
        c.fill_color(Rgb::GRAY);
        for slot in &layout.legend_slots {
            c.circle(slot.center.0, slot.center.1, slot.radius, "f");
        }
        c.push("Q");

        c.fill_color(Rgb::BLACK);
        for slot in &layout.legend_slots {
            c.text(FONT_REGULAR, LEGEND_SIZE, slot.label_pos.0, slot.label_pos.1, &slot.label);
        }
    }
}

/// Content stream builder. Takes top-left coordinates and flips them to PDF space.
struct Content {
    ops: String,
    page_height: f64,
}

impl Content {
    fn new(page_height: f64) -> Self {
        Self {
            ops: String::new(),
            page_height,
        }
    }

    fn y(&self, y: f64) -> f64 {
        self.page_height - y
    }

    fn push(&mut self, op: &str) {
        self.ops.push_str(op);
        self.ops.push('\n');
    }

    fn fill_color(&mut self, color: Rgb) {
        let [r, g, b] = color.unit();
        let _ = writeln!(self.ops, "{} {} {} rg", num(r), num(g), num(b));
    }

    fn stroke_color(&mut self, color: Rgb) {
        let [r, g, b] = color.unit();
        let _ = writeln!(self.ops, "{} {} {} RG", num(r), num(g), num(b));
    }

    fn line_width(&mut self, w: f64) {
        let _ = writeln!(self.ops, "{} w", num(w));
    }

    fn line(&mut self, from: (f64, f64), to: (f64, f64)) {
        let (y0, y1) = (self.y(from.1), self.y(to.1));
        let _ = writeln!(
            self.ops,
            "{} {} m {} {} l S",
            num(from.0),
            num(y0),
            num(to.0),
            num(y1)
        );
    }

    fn rect_path(&mut self, x: f64, y: f64, w: f64, h: f64) {
        // PDF rectangles are anchored at their lower-left corner
        let bottom = self.y(y + h);
        let _ = write!(self.ops, "{} {} {} {} re", num(x), num(bottom), num(w), num(h));
    }

    fn fill_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.rect_path(x, y, w, h);
        self.push(" f");
    }

    fn stroke_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.rect_path(x, y, w, h);
        self.push(" S");
    }

    fn clip_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        self.rect_path(x, y, w, h);
        self.push(" W n");
    }

    /// Circle from four Bezier quarters, finished with `paint` (f, S or B).
    fn circle(&mut self, cx: f64, cy: f64, r: f64, paint: &str) {
        if r <= 0.0 {
            return;
        }
        let cy = self.y(cy);
        let k = r * KAPPA;
        let _ = writeln!(
            self.ops,
            "{} {} m\n\
             {} {} {} {} {} {} c\n\
             {} {} {} {} {} {} c\n\
             {} {} {} {} {} {} c\n\
             {} {} {} {} {} {} c\n\
             {}",
            num(cx + r),
            num(cy),
            num(cx + r),
            num(cy + k),
            num(cx + k),
            num(cy + r),
            num(cx),
            num(cy + r),
            num(cx - k),
            num(cy + r),
            num(cx - r),
            num(cy + k),
            num(cx - r),
            num(cy),
            num(cx - r),
            num(cy - k),
            num(cx - k),
            num(cy - r),
            num(cx),
            num(cy - r),
            num(cx + k),
            num(cy - r),
            num(cx + r),
            num(cy - k),
            num(cx + r),
            num(cy),
            paint
        );
    }

    /// Text with its baseline starting at (x, y).
    fn text(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) {
        let baseline = self.y(y);
        let _ = write!(
            self.ops,
            "BT /{} {} Tf {} {} Td (",
            font,
            num(size),
            num(x),
            num(baseline)
        );
        self.ops.push_str(&escape_text(text));
        self.push(") Tj ET");
    }

    fn text_centered(&mut self, font: &str, size: f64, cx: f64, y: f64, text: &str) {
        let w = text_width(text, size, font == FONT_BOLD);
        self.text(font, size, cx - w / 2.0, y, text);
    }

    /// Text rotated 90 degrees counter-clockwise, reading upwards from (x, y).
    fn text_rotated(&mut self, font: &str, size: f64, x: f64, y: f64, text: &str) {
        let baseline = self.y(y);
        let _ = write!(
            self.ops,
            "BT /{} {} Tf 0 1 -1 0 {} {} Tm (",
            font,
            num(size),
            num(x),
            num(baseline)
        );
        self.ops.push_str(&escape_text(text));
        self.push(") Tj ET");
    }

    fn finish(self) -> String {
        self.ops
    }
}

/// Compact number formatting: two decimals, trailing zeros dropped.
fn num(v: f64) -> String {
    let s = format!("{:.2}", v);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        other => other.to_string(),
    }
}

/// Escape a string for a PDF literal inside a content stream.
///
/// Latin-1 characters become octal escapes (WinAnsi agrees with Latin-1 there);
/// anything else is replaced with '?'.
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(ch);
            }
            ' '..='~' => out.push(ch),
            '\u{a0}'..='\u{ff}' => {
                let _ = write!(out, "\\{:03o}", ch as u32);
            }
            _ => out.push('?'),
        }
    }
    out
}

fn pdf_string(text: &str) -> Vec<u8> {
    escape_text(text).into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{render, ColorMap, PlotConfig};
    use crate::data::PathwayRecord;

    fn chart(config: &PlotConfig) -> RenderedChart {
        let records = vec![
            PathwayRecord::new("A", 0.0023, 25),
            PathwayRecord::new("B", 0.0081, 40),
            PathwayRecord::new("C (Ca2+ signaling)", 0.0150, 60),
        ];
        render(&records, config).expect("render")
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn produces_a_complete_pdf_document() {
        let bytes = PdfGenerator::encode(&chart(&PlotConfig::default())).expect("encode");
        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(find(&bytes, b"/BaseFont /Helvetica-Bold").is_some());
        assert!(find(&bytes, b"(Pathway Analysis Bubble Plot) Tj").is_some());
        assert!(find(&bytes, b"(C \\(Ca2+ signaling\\)) Tj").is_some());
    }

    #[test]
    fn encoding_is_deterministic() {
        let cfg = PlotConfig::default();
        let first = PdfGenerator::encode(&chart(&cfg)).expect("encode");
        let second = PdfGenerator::encode(&chart(&cfg)).expect("encode");
        assert_eq!(first, second);
    }

    #[test]
    fn different_settings_change_the_output() {
        let base = PdfGenerator::encode(&chart(&PlotConfig::default())).expect("encode");
        let other = PdfGenerator::encode(&chart(&PlotConfig {
            color_map: ColorMap::Magma,
            ..PlotConfig::default()
        }))
        .expect("encode");
        assert_ne!(base, other);
    }

    #[test]
    fn xref_offsets_point_at_objects() {
        let bytes = PdfGenerator::encode(&chart(&PlotConfig::default())).expect("encode");

        // the binary comment in the header is not UTF-8, so index bytes only
        let marker = b"startxref\n";
        let startxref = bytes
            .windows(marker.len())
            .rposition(|w| w == marker)
            .expect("startxref")
            + marker.len();
        let tail = std::str::from_utf8(&bytes[startxref..]).expect("ascii trailer");
        let xref_offset: usize = tail
            .lines()
            .next()
            .and_then(|l| l.trim().parse().ok())
            .expect("xref offset");
        assert!(bytes[xref_offset..].starts_with(b"xref"));

        let xref = std::str::from_utf8(&bytes[xref_offset..]).expect("ascii xref");
        let entries: Vec<usize> = xref
            .lines()
            .skip(3)
            .take_while(|l| l.ends_with(" n "))
            .map(|l| l[..10].parse().expect("offset"))
            .collect();
        assert_eq!(entries.len(), 7);
        for (i, offset) in entries.iter().enumerate() {
            let header = format!("{} 0 obj", i + 1);
            assert!(bytes[*offset..].starts_with(header.as_bytes()), "object {}", i + 1);
        }
    }

    #[test]
    fn content_length_matches_stream() {
        let bytes = PdfGenerator::encode(&chart(&PlotConfig::default())).expect("encode");
        let text = String::from_utf8_lossy(&bytes);
        let start = text.find("/Length ").expect("length") + "/Length ".len();
        let len: usize = text[start..]
            .split_whitespace()
            .next()
            .and_then(|v| v.parse().ok())
            .expect("length value");
        let stream_start = find(&bytes, b"stream\n").expect("stream") + "stream\n".len();
        assert!(bytes[stream_start + len..].starts_with(b"\nendstream"));
    }

    #[test]
    fn grid_toggle_controls_dash_pattern() {
        let with_grid = PdfGenerator::encode(&chart(&PlotConfig::default())).expect("encode");
        let without = PdfGenerator::encode(&chart(&PlotConfig {
            show_grid: false,
            ..PlotConfig::default()
        }))
        .expect("encode");
        assert!(find(&with_grid, b"[3 3] 0 d").is_some());
        assert!(find(&without, b"[3 3] 0 d").is_none());
    }

    #[test]
    fn escapes_special_and_non_ascii_text() {
        assert_eq!(escape_text("a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_text("Ä"), "\\304");
        assert_eq!(escape_text("α"), "?");
    }

    #[test]
    fn numbers_are_compact() {
        assert_eq!(num(1.0), "1");
        assert_eq!(num(0.5), "0.5");
        assert_eq!(num(-0.001), "0");
        assert_eq!(num(12.3456), "12.35");
    }
}

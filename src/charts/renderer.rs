//! Static Chart Renderer
//! Draws the bubble chart into a bitmap with plotters and encodes it as PNG.
//!
//! Uses the same page layout as the PDF export, scaled from points to pixels:
//! 1. Title centered on top
//! 2. Pathway labels left of the plot, one row per pathway
//! 3. Bubbles (80% opacity, black outline) over an optional grid
//! 4. Colorbar for -log10(p-value) and the gene count size legend on the right

use crate::charts::layout::{
    ChartLayout, AXIS_TITLE_SIZE, LABEL_SIZE, LEGEND_SIZE, TICK_SIZE, TITLE_SIZE,
};
use crate::charts::{RenderedChart, Rgb, LEGEND_TITLE};
use crate::export::ExportError;
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::io::Cursor;
use tracing::{debug, warn};

const FONT_FAMILY: &str = "sans-serif";
const COLORBAR_STEPS: usize = 64;
/// Upper bound on the RGB buffer, about 120 MB.
const MAX_PIXELS: f64 = 40_000_000.0;
/// Below this many pixels per point labels stop being legible.
const MIN_SCALE: f64 = 0.5;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

fn raster<E: std::fmt::Display>(e: E) -> ExportError {
    ExportError::Raster(e.to_string())
}

fn rgb(c: Rgb) -> RGBColor {
    RGBColor(c.0, c.1, c.2)
}

/// Point-to-pixel mapping for one render.
#[derive(Clone, Copy)]
struct Px(f64);

impl Px {
    fn v(self, pt: f64) -> i32 {
        (pt * self.0).round() as i32
    }

    fn p(self, (x, y): (f64, f64)) -> (i32, i32) {
        (self.v(x), self.v(y))
    }

    fn size(self, pt: f64) -> f64 {
        pt * self.0
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Pixel dimensions of the PNG for `chart` at `scale` pixels per point.
    pub fn image_size(layout: &ChartLayout, scale: f64) -> (u32, u32) {
        (
            (layout.page_width * scale).ceil() as u32,
            (layout.page_height * scale).ceil() as u32,
        )
    }

    /// Largest scale up to `requested` whose bitmap stays under the pixel budget.
    pub fn fit_scale(layout: &ChartLayout, requested: f64) -> Result<f64, ExportError> {
        let area = layout.page_width * layout.page_height;
        let limit = (MAX_PIXELS / area).sqrt() * 0.99;
        if requested <= limit {
            return Ok(requested);
        }
        if limit < MIN_SCALE {
            return Err(ExportError::Raster(format!(
                "chart of {:.0} x {:.0} pt is too large for PNG; reduce the number of pathways or export PDF",
                layout.page_width, layout.page_height
            )));
        }
        warn!(requested, scale = limit, "png scale reduced to fit pixel budget");
        Ok(limit)
    }

    /// Render the chart to PNG bytes.
    pub fn render_png(chart: &RenderedChart, scale: f64) -> Result<Vec<u8>, ExportError> {
        let layout = ChartLayout::compute(chart);
        let scale = Self::fit_scale(&layout, scale)?;
        let (width, height) = Self::image_size(&layout, scale);
        let px = Px(scale);

        let mut buffer = vec![255u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut buffer, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(raster)?;

            if chart.show_grid {
                Self::draw_grid(&root, chart, &layout, px)?;
            }
            Self::draw_bubbles(&root, chart, &layout, px)?;
            Self::draw_axes(&root, chart, &layout, px)?;
            Self::draw_colorbar(&root, chart, &layout, px)?;
            Self::draw_legend(&root, &layout, px)?;

            root.present().map_err(raster)?;
        }

        let img = RgbImage::from_raw(width, height, buffer)
            .ok_or_else(|| ExportError::Raster("pixel buffer size mismatch".to_string()))?;
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)?;

        debug!(width, height, bytes = out.len(), "png rendered");
        Ok(out)
    }

    fn draw_grid(
        root: &Area,
        chart: &RenderedChart,
        layout: &ChartLayout,
        px: Px,
    ) -> Result<(), ExportError> {
        let plot = layout.plot;
        let style = rgb(Rgb::GRID).mix(0.7).stroke_width(1);

        for tick in &layout.x_ticks {
            root.draw(&PathElement::new(
                vec![px.p((tick.pos, plot.y)), px.p((tick.pos, plot.bottom()))],
                style,
            ))
            .map_err(raster)?;
        }
        for row in 0..chart.row_count() {
            let y = layout.map_row(row);
            root.draw(&PathElement::new(
                vec![px.p((plot.x, y)), px.p((plot.right(), y))],
                style,
            ))
            .map_err(raster)?;
        }
        Ok(())
    }

    fn draw_bubbles(
        root: &Area,
        chart: &RenderedChart,
        layout: &ChartLayout,
        px: Px,
    ) -> Result<(), ExportError> {
        for point in &chart.points {
            let center = px.p((layout.map_x(point.x), layout.map_row(point.row)));
            let radius = px.size(point.radius()).round().max(1.0) as u32;

            root.draw(&Circle::new(center, radius, rgb(point.color).mix(0.8).filled()))
                .map_err(raster)?;
            root.draw(&Circle::new(center, radius, BLACK.mix(0.8).stroke_width(1)))
                .map_err(raster)?;
        }
        Ok(())
    }

    fn draw_axes(
        root: &Area,
        chart: &RenderedChart,
        layout: &ChartLayout,
        px: Px,
    ) -> Result<(), ExportError> {
        let plot = layout.plot;
        let frame = BLACK.stroke_width(px.v(0.8).max(1) as u32);
        root.draw(&Rectangle::new(
            [px.p((plot.x, plot.y)), px.p((plot.right(), plot.bottom()))],
            frame,
        ))
        .map_err(raster)?;

        let tick_font = (FONT_FAMILY, px.size(TICK_SIZE), FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Top));
        for tick in &layout.x_ticks {
            root.draw(&PathElement::new(
                vec![px.p((tick.pos, plot.bottom())), px.p((tick.pos, plot.bottom() + 4.0))],
                &BLACK,
            ))
            .map_err(raster)?;
            root.draw(&Text::new(
                tick.label.clone(),
                px.p((tick.pos, plot.bottom() + 6.0)),
                tick_font.clone(),
            ))
            .map_err(raster)?;
        }

        let label_font = (FONT_FAMILY, px.size(LABEL_SIZE), FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Right, VPos::Center));
        for point in &chart.points {
            let y = layout.map_row(point.row);
            root.draw(&PathElement::new(
                vec![px.p((plot.x - 4.0, y)), px.p((plot.x, y))],
                &BLACK,
            ))
            .map_err(raster)?;
            root.draw(&Text::new(
                point.pathway.clone(),
                px.p((plot.x - 7.0, y)),
                label_font.clone(),
            ))
            .map_err(raster)?;
        }

        let title_font = (FONT_FAMILY, px.size(TITLE_SIZE), FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        root.draw(&Text::new(chart.title.clone(), px.p(layout.title_pos), title_font))
            .map_err(raster)?;

        let axis_font = (FONT_FAMILY, px.size(AXIS_TITLE_SIZE), FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        root.draw(&Text::new(chart.x_label, px.p(layout.x_label_pos), axis_font))
            .map_err(raster)?;

        Ok(())
    }

    fn draw_colorbar(
        root: &Area,
        chart: &RenderedChart,
        layout: &ChartLayout,
        px: Px,
    ) -> Result<(), ExportError> {
        let bar = layout.colorbar;
        let band = bar.h / COLORBAR_STEPS as f64;

        for i in 0..COLORBAR_STEPS {
            let t = (i as f64 + 0.5) / COLORBAR_STEPS as f64;
            let bottom = bar.bottom() - i as f64 * band;
            let top = bottom - band;
            root.draw(&Rectangle::new(
                [px.p((bar.x, top)), px.p((bar.right(), bottom))],
                rgb(chart.color_map.sample(t)).filled(),
            ))
            .map_err(raster)?;
        }
        root.draw(&Rectangle::new(
            [px.p((bar.x, bar.y)), px.p((bar.right(), bar.bottom()))],
            BLACK.stroke_width(1),
        ))
        .map_err(raster)?;

        let tick_font = (FONT_FAMILY, px.size(TICK_SIZE - 1.0))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Center));
        for tick in &layout.colorbar_ticks {
            root.draw(&PathElement::new(
                vec![px.p((bar.right(), tick.pos)), px.p((bar.right() + 3.0, tick.pos))],
                &BLACK,
            ))
            .map_err(raster)?;
            root.draw(&Text::new(
                tick.label.clone(),
                px.p((bar.right() + 5.0, tick.pos)),
                tick_font.clone(),
            ))
            .map_err(raster)?;
        }

        let label_font = (FONT_FAMILY, px.size(AXIS_TITLE_SIZE), FontStyle::Bold)
            .into_font()
            .transform(FontTransform::Rotate270)
            .color(&BLACK)
            .pos(Pos::new(HPos::Center, VPos::Bottom));
        root.draw(&Text::new(
            chart.x_label,
            px.p(layout.colorbar_label_pos),
            label_font,
        ))
        .map_err(raster)?;

        Ok(())
    }

    fn draw_legend(root: &Area, layout: &ChartLayout, px: Px) -> Result<(), ExportError> {
        let title_font = (FONT_FAMILY, px.size(LEGEND_SIZE + 1.0), FontStyle::Bold)
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        root.draw(&Text::new(LEGEND_TITLE, px.p(layout.legend_title_pos), title_font))
            .map_err(raster)?;

        let entry_font = (FONT_FAMILY, px.size(LEGEND_SIZE))
            .into_font()
            .color(&BLACK)
            .pos(Pos::new(HPos::Left, VPos::Bottom));
        for slot in &layout.legend_slots {
            let radius = px.size(slot.radius).round().max(1.0) as u32;
            root.draw(&Circle::new(
                px.p(slot.center),
                radius,
                rgb(Rgb::GRAY).mix(0.6).filled(),
            ))
            .map_err(raster)?;
            root.draw(&Text::new(
                slot.label.clone(),
                px.p(slot.label_pos),
                entry_font.clone(),
            ))
            .map_err(raster)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::{render, PlotConfig};
    use crate::data::PathwayRecord;

    fn chart() -> RenderedChart {
        let records = vec![
            PathwayRecord::new("Glycolysis", 0.0023, 25),
            PathwayRecord::new("TCA cycle", 0.0081, 40),
        ];
        render(&records, &PlotConfig::default()).expect("render")
    }

    #[test]
    fn image_size_scales_page() {
        let layout = ChartLayout::compute(&chart());
        let (w1, h1) = StaticChartRenderer::image_size(&layout, 1.0);
        let (w2, h2) = StaticChartRenderer::image_size(&layout, 2.0);
        assert!(w2 >= 2 * w1 - 2 && w2 <= 2 * w1);
        assert!(h2 >= 2 * h1 - 2 && h2 <= 2 * h1);
    }

    #[test]
    fn keeps_requested_scale_for_small_charts() {
        let layout = ChartLayout::compute(&chart());
        assert_eq!(StaticChartRenderer::fit_scale(&layout, 2.0).expect("fits"), 2.0);
    }

    #[test]
    fn large_charts_are_scaled_under_pixel_budget() {
        let records: Vec<PathwayRecord> = (0..3000)
            .map(|i| PathwayRecord::new(format!("GO term {}", i), 1e-6 * (i + 1) as f64, 5))
            .collect();
        let config = PlotConfig {
            top_n: records.len(),
            ..PlotConfig::default()
        };
        let layout = ChartLayout::compute(&render(&records, &config).expect("render"));

        let scale = StaticChartRenderer::fit_scale(&layout, 2.0).expect("fits");
        assert!(scale < 2.0);
        let (w, h) = StaticChartRenderer::image_size(&layout, scale);
        assert!((w as f64) * (h as f64) <= MAX_PIXELS);
    }

    #[test]
    fn oversized_charts_are_rejected() {
        let mut layout = ChartLayout::compute(&chart());
        layout.page_height = 5_000_000.0;
        assert!(matches!(
            StaticChartRenderer::fit_scale(&layout, 2.0),
            Err(ExportError::Raster(_))
        ));
    }

    #[test]
    fn renders_png_or_reports_missing_fonts() {
        // Text needs a system sans-serif font; headless hosts may lack one.
        match StaticChartRenderer::render_png(&chart(), 1.0) {
            Ok(bytes) => {
                let img = image::load_from_memory(&bytes).expect("decodable png");
                let layout = ChartLayout::compute(&chart());
                assert_eq!(
                    (img.width(), img.height()),
                    StaticChartRenderer::image_size(&layout, 1.0)
                );
            }
            Err(ExportError::Raster(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

use printpdf::image_crate::{self, DynamicImage};
use printpdf::{
    BuiltinFont, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference,
    PdfLayerReference,
};

use crate::config::DEFAULT_REPORT_TITLE;
use crate::error::ExportError;
use crate::models::{ChartArtifact, ReportDocument};
use crate::services::charts::ReportCharts;

pub const REPORT_FILE_NAME: &str = "Sales_Report.pdf";

// A4 portrait, all lengths in millimetres measured from the top edge.
const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN_LEFT: f32 = 10.0;
const MARGIN_TOP: f32 = 10.0;
const MARGIN_BOTTOM: f32 = 15.0;
const LINE_HEIGHT: f32 = 10.0;
const IMAGE_WIDTH: f32 = 180.0;
const HEADER_SIZE: f32 = 16.0;
const TITLE_SIZE: f32 = 12.0;
const PT_TO_MM: f32 = 0.3528;

#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub title: String,
    pub file_name: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            title: DEFAULT_REPORT_TITLE.to_string(),
            file_name: REPORT_FILE_NAME.to_string(),
        }
    }
}

struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    y: f32,
    pages: usize,
}

impl<'a> PageWriter<'a> {
    fn new(doc: &'a PdfDocumentReference, layer: PdfLayerReference) -> Self {
        Self {
            doc,
            layer,
            y: MARGIN_TOP,
            pages: 1,
        }
    }

    /// Starts a new page when `height` would run into the bottom margin.
    fn ensure_room(&mut self, height: f32) {
        if self.y + height > PAGE_HEIGHT - MARGIN_BOTTOM && self.y > MARGIN_TOP {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = MARGIN_TOP;
            self.pages += 1;
        }
    }

    fn baseline(&self) -> Mm {
        Mm(PAGE_HEIGHT - (self.y + LINE_HEIGHT * 0.7))
    }

    fn centered_line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.ensure_room(LINE_HEIGHT);
        // Helvetica averages a little over half an em per glyph
        let width = text.chars().count() as f32 * size * 0.55 * PT_TO_MM;
        let x = ((PAGE_WIDTH - width) / 2.0).max(MARGIN_LEFT);
        self.layer.use_text(text, size, Mm(x), self.baseline(), font);
        self.y += LINE_HEIGHT;
    }

    fn line(&mut self, text: &str, size: f32, font: &IndirectFontRef) {
        self.ensure_room(LINE_HEIGHT);
        self.layer.use_text(text, size, Mm(MARGIN_LEFT), self.baseline(), font);
        self.y += LINE_HEIGHT;
    }

    fn gap(&mut self, height: f32) {
        self.y += height;
    }

    fn image(&mut self, artifact: &ChartArtifact) -> Result<(), ExportError> {
        let failure = |reason: String| ExportError::RenderFailure {
            title: artifact.title.clone(),
            reason,
        };

        let decoded = image_crate::load_from_memory(&artifact.png).map_err(|e| failure(e.to_string()))?;
        let (px_width, px_height) = (decoded.width(), decoded.height());
        if px_width == 0 || px_height == 0 {
            return Err(failure("image has no pixels".to_string()));
        }

        let height = px_height as f32 * IMAGE_WIDTH / px_width as f32;
        let dpi = px_width as f32 * 25.4 / IMAGE_WIDTH;
        self.ensure_room(height);

        Image::from_dynamic_image(&DynamicImage::ImageRgb8(decoded.to_rgb8())).add_to_layer(
            self.layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(MARGIN_LEFT)),
                translate_y: Some(Mm(PAGE_HEIGHT - self.y - height)),
                dpi: Some(dpi),
                ..Default::default()
            },
        );
        self.y += height;
        Ok(())
    }
}

/// Lays the charts out under a fixed header, one titled section per chart,
/// in report order.
pub fn export(charts: &ReportCharts, options: &ExportOptions) -> Result<ReportDocument, ExportError> {
    let start = std::time::Instant::now();

    let (doc, page, layer) = PdfDocument::new(&options.title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let font_failure = |e: printpdf::Error| ExportError::RenderFailure {
        title: options.title.clone(),
        reason: format!("font unavailable: {}", e),
    };
    let bold = doc.add_builtin_font(BuiltinFont::HelveticaBold).map_err(font_failure)?;
    let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(font_failure)?;

    let mut sections = Vec::with_capacity(3);
    let pages = {
        let mut writer = PageWriter::new(&doc, doc.get_page(page).get_layer(layer));
        writer.centered_line(&options.title, HEADER_SIZE, &bold);
        writer.gap(LINE_HEIGHT);

        for (kind, artifact) in charts.in_report_order() {
            writer.line(kind.title(), TITLE_SIZE, &regular);
            writer.image(artifact)?;
            writer.gap(LINE_HEIGHT);
            sections.push(kind.title().to_string());
        }
        writer.pages
    };

    let bytes = doc
        .save_to_bytes()
        .map_err(|e| ExportError::IoFailure(e.to_string()))?;

    tracing::info!(
        "Exported {} ({} pages, {}KB) in {:?}",
        options.file_name,
        pages,
        bytes.len() / 1024,
        start.elapsed()
    );

    Ok(ReportDocument {
        file_name: options.file_name.clone(),
        bytes,
        sections,
        pages,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CustomerPurchases, DailySales, ProductSales};
    use crate::services::charts::{ChartData, ChartKind, ChartRenderer};
    use crate::services::test_support::SwatchRenderer;

    fn charts_with(renderer: &SwatchRenderer) -> ReportCharts {
        // Computed back to front on purpose
        let top_customers = renderer
            .render(ChartKind::TopCustomers.title(), ChartData::Customers(&[] as &[CustomerPurchases]))
            .unwrap();
        let product_sales = renderer
            .render(ChartKind::ProductSales.title(), ChartData::Products(&[] as &[ProductSales]))
            .unwrap();
        let daily_sales = renderer
            .render(ChartKind::DailySales.title(), ChartData::Daily(&[] as &[DailySales]))
            .unwrap();
        ReportCharts {
            daily_sales,
            product_sales,
            top_customers,
        }
    }

    #[test]
    fn sections_follow_report_order() {
        let doc = export(&charts_with(&SwatchRenderer::default()), &ExportOptions::default()).unwrap();
        assert_eq!(
            doc.sections,
            vec!["Daily Sales Over Time", "Product Sales Summary", "Top Customers"]
        );
        assert_eq!(doc.file_name, "Sales_Report.pdf");
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn charts_flow_onto_new_pages() {
        // 60x40 px charts are 120 mm tall at 180 mm wide: two fit on the first page
        let wide = export(&charts_with(&SwatchRenderer::default()), &ExportOptions::default()).unwrap();
        assert_eq!(wide.pages, 2);

        // Square charts are 180 mm tall: one per page
        let square = SwatchRenderer { width: 50, height: 50 };
        let tall = export(&charts_with(&square), &ExportOptions::default()).unwrap();
        assert_eq!(tall.pages, 3);
    }

    #[test]
    fn corrupt_image_is_a_render_failure() {
        let mut charts = charts_with(&SwatchRenderer::default());
        charts.product_sales.png = b"definitely not a png".to_vec();

        match export(&charts, &ExportOptions::default()) {
            Err(ExportError::RenderFailure { title, .. }) => assert_eq!(title, "Product Sales Summary"),
            other => panic!("unexpected result: {:?}", other.map(|d| d.sections)),
        }
    }

    #[test]
    fn custom_title_and_file_name() {
        let options = ExportOptions {
            title: "Acme Sales Report".to_string(),
            file_name: "acme.pdf".to_string(),
        };
        let doc = export(&charts_with(&SwatchRenderer::default()), &options).unwrap();
        assert_eq!(doc.file_name, "acme.pdf");
    }
}

//! Chart rendering for the three derived views.
//!
//! Charts are drawn with [`plotters`] onto an in-memory RGB bitmap and encoded
//! as PNG, so nothing touches the filesystem. The renderer sits behind
//! [`ChartRenderer`] so the pipeline only sees titles in and images out.

use std::io::Cursor;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::RenderError;
use crate::models::{ChartArtifact, CustomerPurchases, DailySales, DerivedViews, ProductSales};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    DailySales,
    ProductSales,
    TopCustomers,
}

impl ChartKind {
    /// The order charts appear in, on the dashboard and in the report.
    pub const REPORT_ORDER: [ChartKind; 3] = [
        ChartKind::DailySales,
        ChartKind::ProductSales,
        ChartKind::TopCustomers,
    ];

    /// Title used on the chart itself and in the exported report.
    pub fn title(self) -> &'static str {
        match self {
            ChartKind::DailySales => "Daily Sales Over Time",
            ChartKind::ProductSales => "Product Sales Summary",
            ChartKind::TopCustomers => "Top Customers",
        }
    }

    /// Section heading on the dashboard.
    pub fn heading(self) -> &'static str {
        match self {
            ChartKind::DailySales => "Daily Sales Over Time",
            ChartKind::ProductSales => "Product Sales Summary",
            ChartKind::TopCustomers => "Customer Purchase Frequency",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ChartData<'a> {
    Daily(&'a [DailySales]),
    Products(&'a [ProductSales]),
    Customers(&'a [CustomerPurchases]),
}

impl ChartData<'_> {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartData::Daily(_) => ChartKind::DailySales,
            ChartData::Products(_) => ChartKind::ProductSales,
            ChartData::Customers(_) => ChartKind::TopCustomers,
        }
    }
}

pub trait ChartRenderer: Send + Sync {
    fn render(&self, title: &str, data: ChartData<'_>) -> Result<ChartArtifact, RenderError>;
}

/// One artifact per view, always handed out in report order.
#[derive(Debug, Clone)]
pub struct ReportCharts {
    pub daily_sales: ChartArtifact,
    pub product_sales: ChartArtifact,
    pub top_customers: ChartArtifact,
}

impl ReportCharts {
    pub fn get(&self, kind: ChartKind) -> &ChartArtifact {
        match kind {
            ChartKind::DailySales => &self.daily_sales,
            ChartKind::ProductSales => &self.product_sales,
            ChartKind::TopCustomers => &self.top_customers,
        }
    }

    pub fn in_report_order(&self) -> [(ChartKind, &ChartArtifact); 3] {
        ChartKind::REPORT_ORDER.map(|kind| (kind, self.get(kind)))
    }
}

pub fn render_all(renderer: &dyn ChartRenderer, views: &DerivedViews) -> Result<ReportCharts, RenderError> {
    let start = std::time::Instant::now();

    let daily_sales = renderer.render(
        ChartKind::DailySales.title(),
        ChartData::Daily(&views.daily_sales),
    )?;
    let product_sales = renderer.render(
        ChartKind::ProductSales.title(),
        ChartData::Products(&views.product_sales),
    )?;
    let top_customers = renderer.render(
        ChartKind::TopCustomers.title(),
        ChartData::Customers(&views.top_customers),
    )?;

    tracing::info!("Rendered 3 charts in {:?}", start.elapsed());
    Ok(ReportCharts {
        daily_sales,
        product_sales,
        top_customers,
    })
}

pub fn encode_png(pixels: Vec<u8>, width: u32, height: u32) -> Result<Vec<u8>, RenderError> {
    let img = image::RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| RenderError::Encoding("pixel buffer does not match chart size".to_string()))?;

    let mut png = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), image::ImageOutputFormat::Png)
        .map_err(|e| RenderError::Encoding(e.to_string()))?;
    Ok(png)
}

/// Axis bounds that always include zero and leave some headroom above the data.
///
/// Fails when the data or the padded bounds are not finite; plotters cannot lay
/// out an infinite range.
pub fn value_axis(values: impl IntoIterator<Item = f64>) -> Result<(f64, f64), RenderError> {
    let (min, max) = values
        .into_iter()
        .fold((0.0_f64, 0.0_f64), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let span = max - min;
    let (lo, hi) = if span <= 0.0 {
        (min, min + 1.0)
    } else {
        let lo = if min < 0.0 { min - span * 0.05 } else { 0.0 };
        (lo, max + span * 0.05)
    };

    if lo.is_finite() && hi.is_finite() {
        Ok((lo, hi))
    } else {
        Err(RenderError::ChartConfig(format!(
            "value range {}..{} cannot be drawn",
            min, max
        )))
    }
}

/// Label for an index-based x axis; ticks between data points stay blank.
fn label_at(labels: &[String], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

const FONT: &str = "sans-serif";

pub struct PlottersRenderer {
    width: u32,
    height: u32,
}

impl PlottersRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    fn draw_daily(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        series: &[DailySales],
    ) -> Result<(), RenderError> {
        let x_max = series.len().saturating_sub(1).max(1) as f64;
        let (y_min, y_max) = value_axis(series.iter().map(|d| d.sales))?;
        let labels: Vec<String> = series
            .iter()
            .map(|d| d.date.format("%Y-%m-%d").to_string())
            .collect();

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 36))
            .margin(20)
            .x_label_area_size(70)
            .y_label_area_size(90)
            .build_cartesian_2d(0f64..x_max, y_min..y_max)
            .map_err(|e| RenderError::ChartConfig(e.to_string()))?;

        chart
            .configure_mesh()
            .x_labels(series.len().clamp(2, 12))
            .x_label_formatter(&|x| label_at(&labels, *x))
            .x_desc("Date")
            .y_desc("Sales")
            .label_style((FONT, 18))
            .draw()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        chart
            .draw_series(LineSeries::new(
                series.iter().enumerate().map(|(i, d)| (i as f64, d.sales)),
                BLUE.stroke_width(3),
            ))
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }

    /// Horizontal bars, first entry on top.
    fn draw_bars(
        area: &DrawingArea<BitMapBackend<'_>, Shift>,
        title: &str,
        value_desc: &str,
        labels: &[String],
        values: &[f64],
    ) -> Result<(), RenderError> {
        let slots = labels.len().max(1) as i32;
        let (x_min, x_max) = value_axis(values.iter().copied())?;

        let mut chart = ChartBuilder::on(area)
            .caption(title, (FONT, 36))
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(220)
            .build_cartesian_2d(x_min..x_max, (0..slots).into_segmented())
            .map_err(|e| RenderError::ChartConfig(e.to_string()))?;

        let label_for = |v: &SegmentValue<i32>| match v {
            SegmentValue::CenterOf(slot) if *slot >= 0 && *slot < slots => labels
                .get((slots - 1 - *slot) as usize)
                .cloned()
                .unwrap_or_default(),
            _ => String::new(),
        };

        chart
            .configure_mesh()
            .disable_y_mesh()
            .y_labels(labels.len().max(1))
            .y_label_formatter(&label_for)
            .x_desc(value_desc)
            .label_style((FONT, 18))
            .draw()
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        chart
            .draw_series(values.iter().enumerate().map(|(i, value)| {
                let slot = slots - 1 - i as i32;
                Rectangle::new(
                    [(0.0, SegmentValue::Exact(slot)), (*value, SegmentValue::Exact(slot + 1))],
                    BLUE.mix(0.75).filled(),
                )
            }))
            .map_err(|e| RenderError::Drawing(e.to_string()))?;

        Ok(())
    }
}

impl ChartRenderer for PlottersRenderer {
    fn render(&self, title: &str, data: ChartData<'_>) -> Result<ChartArtifact, RenderError> {
        let (width, height) = (self.width, self.height);
        let mut pixels = vec![0u8; width as usize * height as usize * 3];

        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE)
                .map_err(|e| RenderError::DrawingArea(e.to_string()))?;

            match data {
                ChartData::Daily(series) => Self::draw_daily(&root, title, series)?,
                ChartData::Products(ranking) => {
                    let labels: Vec<String> = ranking.iter().map(|p| p.product.clone()).collect();
                    let values: Vec<f64> = ranking.iter().map(|p| p.sales).collect();
                    Self::draw_bars(&root, title, "Sales", &labels, &values)?
                }
                ChartData::Customers(table) => {
                    let labels: Vec<String> = table.iter().map(|c| c.customer.clone()).collect();
                    let values: Vec<f64> = table.iter().map(|c| c.purchases as f64).collect();
                    Self::draw_bars(&root, title, "Purchases", &labels, &values)?
                }
            }

            root.present()
                .map_err(|e| RenderError::Drawing(e.to_string()))?;
        }

        tracing::debug!("Rendered chart '{}' at {}x{}", title, width, height);
        Ok(ChartArtifact {
            title: title.to_string(),
            png: encode_png(pixels, width, height)?,
            width,
            height,
        })
    }
}

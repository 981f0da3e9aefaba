//! Request-scoped chaining of the report stages.
//!
//! Every call starts from the uploaded bytes. Nothing is kept between calls, so
//! exporting a report runs the whole pipeline again on the same upload.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Serialize;
use std::time::Instant;

use crate::config::ReportSettings;
use crate::error::AppError;
use crate::models::{
    ChartArtifact, CustomerFrequencyTable, DailySalesSeries, DerivedViews, ProductSalesRanking,
    ReportDocument, Upload,
};
use crate::services::charts::{render_all, ChartKind, ChartRenderer, ReportCharts};
use crate::services::exporter::{self, ExportOptions, REPORT_FILE_NAME};
use crate::services::{aggregator, dates, ingest, schema};

pub const UPLOAD_SUCCESS_MESSAGE: &str = "File uploaded successfully!";

#[derive(Debug, Clone, Serialize)]
pub struct DashboardChart {
    pub heading: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub png_base64: String,
}

impl DashboardChart {
    fn new(kind: ChartKind, artifact: &ChartArtifact) -> Self {
        Self {
            heading: kind.heading().to_string(),
            title: artifact.title.clone(),
            width: artifact.width,
            height: artifact.height,
            png_base64: STANDARD.encode(&artifact.png),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub file_name: String,
    pub message: String,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<String>,
    pub preview: Vec<Vec<String>>,
    pub daily_sales: DailySalesSeries,
    pub product_sales: ProductSalesRanking,
    pub top_customers: CustomerFrequencyTable,
    pub charts: Vec<DashboardChart>,
}

struct Analysis {
    row_count: usize,
    column_count: usize,
    columns: Vec<String>,
    preview: Vec<Vec<String>>,
    views: DerivedViews,
    charts: ReportCharts,
}

fn analyze(
    upload: &Upload,
    settings: &ReportSettings,
    renderer: &dyn ChartRenderer,
) -> Result<Analysis, AppError> {
    let start = Instant::now();

    let load_start = Instant::now();
    let raw = ingest::load(&upload.file_name, &upload.data)?;
    tracing::info!(
        "Loaded {} rows x {} columns in {:?}",
        raw.row_count(),
        raw.column_count(),
        load_start.elapsed()
    );

    schema::validate(&raw)?;

    let row_count = raw.row_count();
    let column_count = raw.column_count();
    let columns = raw.headers().to_vec();
    let preview = raw.preview(settings.preview_rows);

    let validated = dates::normalize_dates(raw)?;
    let views = aggregator::aggregate(&validated, settings.top_customers)?;
    let charts = render_all(renderer, &views)?;

    tracing::info!("Analyzed {} in {:?}", upload.file_name, start.elapsed());
    Ok(Analysis {
        row_count,
        column_count,
        columns,
        preview,
        views,
        charts,
    })
}

pub fn build_dashboard(
    upload: &Upload,
    settings: &ReportSettings,
    renderer: &dyn ChartRenderer,
) -> Result<Dashboard, AppError> {
    let analysis = analyze(upload, settings, renderer)?;

    let charts = analysis
        .charts
        .in_report_order()
        .iter()
        .map(|(kind, artifact)| DashboardChart::new(*kind, artifact))
        .collect();

    Ok(Dashboard {
        file_name: upload.file_name.clone(),
        message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        row_count: analysis.row_count,
        column_count: analysis.column_count,
        columns: analysis.columns,
        preview: analysis.preview,
        daily_sales: analysis.views.daily_sales,
        product_sales: analysis.views.product_sales,
        top_customers: analysis.views.top_customers,
        charts,
    })
}

pub fn build_report(
    upload: &Upload,
    settings: &ReportSettings,
    renderer: &dyn ChartRenderer,
) -> Result<ReportDocument, AppError> {
    let analysis = analyze(upload, settings, renderer)?;
    let options = ExportOptions {
        title: settings.report_title.clone(),
        file_name: REPORT_FILE_NAME.to_string(),
    };
    Ok(exporter::export(&analysis.charts, &options)?)
}

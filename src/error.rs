use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported file type '{0}', expected .csv, .xlsx or .zip")]
    UnsupportedExtension(String),

    #[error("{0}")]
    UnreadableFile(String),

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArchiveError {
    #[error("No CSV or Excel file found in the ZIP archive.")]
    NoMatchingEntry,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("Your file is missing these required columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateError {
    #[error("Unknown date format in row {row}: '{value}'")]
    UnparseableDate { row: usize, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Sales value '{value}' in row {row} is not a number")]
    NonNumericSales { row: usize, value: String },

    #[error("Sales total for '{key}' is too large to represent")]
    NonFiniteTotal { key: String },
}

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("Failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("Failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("Failed to encode chart image: {0}")]
    Encoding(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("could not embed chart '{title}': {reason}")]
    RenderFailure { title: String, reason: String },

    #[error("could not write report: {0}")]
    IoFailure(String),
}

#[derive(Debug)]
pub enum AppError {
    InvalidInput(String),
    Load(LoadError),
    Schema(SchemaError),
    Date(DateError),
    Aggregation(AggregationError),
    Chart(RenderError),
    Export(ExportError),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "{}", msg),
            AppError::Load(LoadError::Archive(err)) => write!(f, "{}", err),
            AppError::Load(err) => write!(f, "Error reading file: {}", err),
            AppError::Schema(err) => write!(f, "{}", err),
            AppError::Date(err) => write!(f, "Error reading file: {}", err),
            AppError::Aggregation(err) => write!(f, "Error reading file: {}", err),
            AppError::Chart(err) => write!(f, "Error drawing chart: {}", err),
            AppError::Export(err) => write!(f, "Error generating PDF: {}", err),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<LoadError> for AppError {
    fn from(err: LoadError) -> Self {
        AppError::Load(err)
    }
}

impl From<SchemaError> for AppError {
    fn from(err: SchemaError) -> Self {
        AppError::Schema(err)
    }
}

impl From<DateError> for AppError {
    fn from(err: DateError) -> Self {
        AppError::Date(err)
    }
}

impl From<AggregationError> for AppError {
    fn from(err: AggregationError) -> Self {
        AppError::Aggregation(err)
    }
}

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError::Chart(err)
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        AppError::Export(err)
    }
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Load(_) => StatusCode::BAD_REQUEST,
            AppError::Schema(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Date(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Aggregation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Chart(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::warn!("Request rejected: {}", message);
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

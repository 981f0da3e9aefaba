use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

pub const DEFAULT_REPORT_TITLE: &str = "InsightLite Sales Report";

/// Knobs that shape a single pipeline run. Cloned into each request.
#[derive(Debug, Clone)]
pub struct ReportSettings {
    pub preview_rows: usize,
    pub top_customers: usize,
    pub report_title: String,
    pub chart_width: u32,
    pub chart_height: u32,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            preview_rows: 5,
            top_customers: 10,
            report_title: DEFAULT_REPORT_TITLE.to_string(),
            chart_width: 1200,
            chart_height: 800,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub report: ReportSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_file_size: default_max_file_size(),
            report: ReportSettings::default(),
        }
    }
}

impl Config {
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let report = ReportSettings {
            preview_rows: parse_var(&lookup, "INSIGHTLITE_PREVIEW_ROWS")?
                .unwrap_or(defaults.report.preview_rows),
            top_customers: parse_var(&lookup, "INSIGHTLITE_TOP_CUSTOMERS")?
                .unwrap_or(defaults.report.top_customers),
            report_title: lookup("INSIGHTLITE_REPORT_TITLE")
                .filter(|title| !title.trim().is_empty())
                .unwrap_or(defaults.report.report_title),
            chart_width: parse_var(&lookup, "INSIGHTLITE_CHART_WIDTH")?
                .unwrap_or(defaults.report.chart_width),
            chart_height: parse_var(&lookup, "INSIGHTLITE_CHART_HEIGHT")?
                .unwrap_or(defaults.report.chart_height),
        };

        if report.chart_width == 0 || report.chart_height == 0 {
            anyhow::bail!("chart dimensions must be non-zero");
        }

        Ok(Config {
            bind_addr: parse_var(&lookup, "INSIGHTLITE_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            max_file_size: parse_var(&lookup, "INSIGHTLITE_MAX_UPLOAD_BYTES")?
                .unwrap_or(defaults.max_file_size),
            report,
        })
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        _ => Ok(None),
    }
}

pub fn load_config() -> Result<Config> {
    // Load .env file first
    dotenv().ok();

    Config::from_lookup(|key| std::env::var(key).ok())
}

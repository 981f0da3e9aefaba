use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

mod config;
mod error;
mod logging;
mod routes;
mod services;
pub mod models;

use services::charts::{ChartRenderer, PlottersRenderer};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    logging::init_logging()?;

    // Load configuration
    let config = config::load_config()?;
    let addr = config.bind_addr;

    let renderer = PlottersRenderer::new(config.report.chart_width, config.report.chart_height);
    let app = build_app(AppState::new(config, Arc::new(renderer)));

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

pub fn build_app(state: AppState) -> Router {
    let max_file_size = state.config.max_file_size;

    Router::new()
        .merge(routes::routes())
        .merge(routes::reports::routes(max_file_size))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

// Application state
#[derive(Clone)]
pub struct AppState {
    config: config::Config,
    renderer: Arc<dyn ChartRenderer>,
}

impl AppState {
    fn new(config: config::Config, renderer: Arc<dyn ChartRenderer>) -> Self {
        Self { config, renderer }
    }
}

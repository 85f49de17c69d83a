//! Subscriber setup and the dashboard server's lifecycle events.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter, Layer};

use crate::config::DashboardConfig;
use crate::filters::ListingSubset;
use crate::listing::ListingDataset;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    /// Case-insensitive; anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.trim().eq_ignore_ascii_case("json") {
            Some(Self::Json)
        } else if raw.trim().eq_ignore_ascii_case("pretty") {
            Some(Self::Pretty)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `info` or `used_car_dashboard=debug`.
    pub filter: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("invalid log filter '{filter}': {source}")]
    InvalidFilter {
        filter: String,
        #[source]
        source: ParseError,
    },
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Install the global subscriber. Fails on a bad filter instead of silently logging at `info`.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter =
        EnvFilter::try_new(&config.filter).map_err(|source| LoggingInitError::InvalidFilter {
            filter: config.filter.clone(),
            source,
        })?;

    let output = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_ansi(false)
            .with_target(config.include_target)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(config.include_target)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(output)
        .with(filter)
        .try_init()?;
    Ok(())
}

pub fn log_app_start(config: &DashboardConfig) {
    info!(
        component = "dashboard_server",
        event = "app.start",
        data_path = %config.data_path.display(),
        bind_addr = %config.bind_addr,
        log_filter = %config.logging.filter,
        log_format = ?config.logging.format
    );
}

/// What the controls will offer, once the table is in memory.
pub fn log_dataset_ready(dataset: &ListingDataset) {
    info!(
        component = "dashboard_server",
        event = "dataset.ready",
        rows = dataset.len(),
        vehicle_types = dataset.type_options().len(),
        conditions = ListingSubset::full(dataset).condition_options().len()
    );
}

pub fn log_app_bind(bound_addr: SocketAddr) {
    info!(
        component = "dashboard_server",
        event = "app.bind",
        bind_addr = %bound_addr,
        route = "/dashboard"
    );
}

//! Used-car listings dashboard.
//!
//! Loads a listings table once, narrows it by vehicle type and condition, and prepares four
//! chart specifications for a browser front end:
//! - `listing`: data model and CSV loader
//! - `filters`: filter state and the working-subset pipeline
//! - `charts`: per-chart bounded views and chart parameters
//! - `view`: the pure `render_view` recompute
//! - `dashboard`: HTML page and JSON view routes

mod charts;
mod config;
mod dashboard;
mod filters;
mod listing;
mod observability;
mod view;

#[cfg(test)]
mod test_support;

pub use charts::{
    bounded_view, format_thousands, prepare_chart, prepare_charts, Axis, BarMode, BoundedView,
    ChartId, ChartKind, ChartSpec, Series, Values, DURATION_BINS, HEATMAP_BINS, MAX_DAYS_LISTED,
    MAX_MODEL_YEAR, MAX_ODOMETER, MAX_PRICE, MAX_PRICE_HEATMAP, MIN_MODEL_YEAR, OVERLAY_OPACITY,
    PRICE_BINS,
};
pub use config::{
    dashboard_config_from_env, ConfigError, DashboardConfig, DEFAULT_BIND_ADDR, DEFAULT_DATA_PATH,
};
pub use dashboard::{dashboard_router, render_dashboard_html, DashboardQuery, PLOTLY_CDN_URL};
pub use filters::{
    apply_filters, condition_options, filter_by_conditions, filter_by_type, FilterState,
    ListingSubset, TypeSelection, ALL_TYPES,
};
pub use listing::{load_listings, read_listings, Listing, ListingDataset, ListingLoadError};
pub use observability::{
    init_logging, log_app_bind, log_app_start, log_dataset_ready, LogFormat, LoggingConfig,
    LoggingInitError,
};
pub use view::{
    filter_options, render_view, DashboardView, FilterOptions, Summary, SummaryInsight,
    PAGE_INTRO, PAGE_TITLE, SUMMARY_INSIGHTS, SUMMARY_TITLE,
};

//! Full recompute of everything the dashboard shows for one filter state.

use serde::Serialize;
use tracing::debug;

use crate::charts::{prepare_charts, ChartSpec};
use crate::filters::{apply_filters, condition_options, FilterState, ALL_TYPES};
use crate::listing::ListingDataset;

pub const PAGE_TITLE: &str = "Used Car Sales Dashboard";
pub const PAGE_INTRO: &str =
    "Explore how vehicle characteristics affect price and time on market using filters and interactive charts.";

pub const SUMMARY_TITLE: &str = "Summary Insights";

/// Static insight bullets as (headline, detail). The detail carries its own leading separator.
pub const SUMMARY_INSIGHTS: [(&str, &str); 4] = [
    (
        "Vehicle condition and age strongly impact price",
        " — listings marked as \"excellent\" or \"like new\", as well as models from recent years, show significantly higher prices.",
    ),
    (
        "Higher mileage correlates with lower prices",
        " — vehicles with more than 100k miles tend to be priced 25–40% lower than those with under 50k.",
    ),
    (
        "SUVs and trucks are consistently valued higher",
        " than sedans and hatchbacks, often by $5,000–$10,000 on average.",
    ),
    (
        "Electric and hybrid cars tend to stay longer on the market",
        ", but retain value better compared to gasoline vehicles.",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    /// "All" first, then every observed type.
    pub types: Vec<String>,
    /// Conditions observed under the selected type.
    pub conditions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryInsight {
    pub headline: &'static str,
    pub detail: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub title: &'static str,
    pub insights: Vec<SummaryInsight>,
}

impl Summary {
    pub fn fixed() -> Self {
        Self {
            title: SUMMARY_TITLE,
            insights: SUMMARY_INSIGHTS
                .iter()
                .map(|&(headline, detail)| SummaryInsight { headline, detail })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub filters: FilterState,
    pub options: FilterOptions,
    pub total_rows: usize,
    pub working_rows: usize,
    pub charts: Vec<ChartSpec>,
    pub summary: Summary,
}

pub fn filter_options(dataset: &ListingDataset, state: &FilterState) -> FilterOptions {
    let mut types = vec![ALL_TYPES.to_string()];
    types.extend(dataset.type_options());

    FilterOptions {
        types,
        conditions: condition_options(dataset, state.vehicle_type())
            .into_iter()
            .collect(),
    }
}

/// Pure function of the dataset and the filter state.
pub fn render_view(dataset: &ListingDataset, state: &FilterState) -> DashboardView {
    let working = apply_filters(dataset, state);
    let charts = prepare_charts(&working);
    let chart_rows: Vec<usize> = charts.iter().map(|chart| chart.row_count).collect();

    debug!(
        component = "view",
        event = "pipeline.recompute",
        vehicle_type = state.vehicle_type().as_str(),
        selected_conditions = state.conditions().len(),
        total_rows = dataset.len(),
        working_rows = working.len(),
        chart_rows = ?chart_rows
    );

    DashboardView {
        filters: state.clone(),
        options: filter_options(dataset, state),
        total_rows: dataset.len(),
        working_rows: working.len(),
        charts,
        summary: Summary::fixed(),
    }
}

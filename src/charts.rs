//! Per-chart bounded views and the chart parameters handed to the plotting front end.
//!
//! Chart preparation only selects and shapes rows. Binning, 2-D density counting and box
//! statistics are left to the renderer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::filters::ListingSubset;
use crate::listing::Listing;

pub const MAX_PRICE: f64 = 100_000.0;
pub const MAX_PRICE_HEATMAP: f64 = 50_000.0;
pub const MAX_ODOMETER: f64 = 200_000.0;
pub const MIN_MODEL_YEAR: f64 = 1990.0;
pub const MAX_MODEL_YEAR: f64 = 2022.0;
pub const MAX_DAYS_LISTED: i64 = 120;

pub const PRICE_BINS: u32 = 50;
pub const HEATMAP_BINS: u32 = 50;
pub const DURATION_BINS: u32 = 40;
pub const OVERLAY_OPACITY: f64 = 0.6;

const COUNT_LABEL: &str = "Number of listings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChartId {
    PriceByCondition,
    PriceVsOdometer,
    PriceByModelYear,
    ListingDuration,
}

impl ChartId {
    /// Display order on the page.
    pub const ALL: [ChartId; 4] = [
        ChartId::PriceByCondition,
        ChartId::PriceVsOdometer,
        ChartId::PriceByModelYear,
        ChartId::ListingDuration,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ChartId::PriceByCondition => "price-by-condition",
            ChartId::PriceVsOdometer => "price-vs-odometer",
            ChartId::PriceByModelYear => "price-by-model-year",
            ChartId::ListingDuration => "listing-duration",
        }
    }

    /// Non-null requirements first, then the chart's ceiling or range.
    pub fn admits(self, listing: &Listing) -> bool {
        match self {
            ChartId::PriceByCondition => {
                listing.condition.is_some() && listing.price <= MAX_PRICE
            }
            ChartId::PriceVsOdometer => {
                listing
                    .odometer
                    .is_some_and(|odometer| odometer <= MAX_ODOMETER)
                    && listing.price <= MAX_PRICE_HEATMAP
            }
            ChartId::PriceByModelYear => {
                listing
                    .model_year
                    .is_some_and(|year| (MIN_MODEL_YEAR..=MAX_MODEL_YEAR).contains(&year))
                    && listing.price <= MAX_PRICE
            }
            ChartId::ListingDuration => {
                listing.condition.is_some() && listing.days_listed <= MAX_DAYS_LISTED
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Histogram,
    DensityHeatmap,
    Box,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BarMode {
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Axis {
    pub field: &'static str,
    pub label: &'static str,
}

/// Column of values for one axis. Integer fields stay integers on the wire.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Values {
    Int(Vec<i64>),
    Float(Vec<f64>),
}

impl Values {
    pub fn len(&self) -> usize {
        match self {
            Values::Int(values) => values.len(),
            Values::Float(values) => values.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub name: Option<String>,
    pub x: Values,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<Values>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub id: ChartId,
    pub kind: ChartKind,
    pub title: String,
    pub x: Axis,
    pub y: Axis,
    pub color_field: Option<&'static str>,
    pub nbins_x: Option<u32>,
    pub nbins_y: Option<u32>,
    pub barmode: Option<BarMode>,
    pub opacity: Option<f64>,
    pub color_scale: Option<&'static str>,
    pub colorbar_label: Option<&'static str>,
    pub row_count: usize,
    pub series: Vec<Series>,
}

/// The working subset narrowed to what one chart is allowed to show.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedView<'a> {
    subset: ListingSubset<'a>,
}

impl<'a> BoundedView<'a> {
    pub fn rows(&self) -> &[&'a Listing] {
        self.subset.rows()
    }

    pub fn len(&self) -> usize {
        self.subset.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subset.is_empty()
    }
}

pub fn bounded_view<'a>(chart: ChartId, working: &ListingSubset<'a>) -> BoundedView<'a> {
    BoundedView {
        subset: working.restrict(|listing| chart.admits(listing)),
    }
}

pub fn prepare_chart(chart: ChartId, working: &ListingSubset<'_>) -> ChartSpec {
    let view = bounded_view(chart, working);
    match chart {
        ChartId::PriceByCondition => ChartSpec {
            id: chart,
            kind: ChartKind::Histogram,
            title: format!(
                "Price Distribution by Vehicle Condition (Price ≤ ${})",
                format_thousands(MAX_PRICE as i64)
            ),
            x: Axis {
                field: "price",
                label: "Price ($)",
            },
            y: Axis {
                field: "count",
                label: COUNT_LABEL,
            },
            color_field: Some("condition"),
            nbins_x: Some(PRICE_BINS),
            nbins_y: None,
            barmode: Some(BarMode::Overlay),
            opacity: Some(OVERLAY_OPACITY),
            color_scale: None,
            colorbar_label: None,
            row_count: view.len(),
            series: series_by_condition(&view, |listing| Some(listing.price))
                .into_iter()
                .map(|(name, prices)| Series {
                    name: Some(name),
                    x: Values::Float(prices),
                    y: None,
                })
                .collect(),
        },
        ChartId::PriceVsOdometer => {
            let (odometer, price): (Vec<f64>, Vec<f64>) = view
                .rows()
                .iter()
                .filter_map(|listing| Some((listing.odometer?, listing.price)))
                .unzip();
            ChartSpec {
                id: chart,
                kind: ChartKind::DensityHeatmap,
                title: format!(
                    "Price vs. Odometer (Filtered: ≤ {} miles & ≤ ${})",
                    format_thousands(MAX_ODOMETER as i64),
                    format_thousands(MAX_PRICE_HEATMAP as i64)
                ),
                x: Axis {
                    field: "odometer",
                    label: "Odometer (miles)",
                },
                y: Axis {
                    field: "price",
                    label: "Price ($)",
                },
                color_field: None,
                nbins_x: Some(HEATMAP_BINS),
                nbins_y: Some(HEATMAP_BINS),
                barmode: None,
                opacity: None,
                color_scale: Some("Blues"),
                colorbar_label: Some(COUNT_LABEL),
                row_count: view.len(),
                series: vec![Series {
                    name: None,
                    x: Values::Float(odometer),
                    y: Some(Values::Float(price)),
                }],
            }
        }
        ChartId::PriceByModelYear => {
            let (year, price): (Vec<i64>, Vec<f64>) = view
                .rows()
                .iter()
                .filter_map(|listing| Some((listing.model_year? as i64, listing.price)))
                .unzip();
            ChartSpec {
                id: chart,
                kind: ChartKind::Box,
                title: format!(
                    "Price Distribution by Model Year ({}–{}, ≤ ${}k)",
                    MIN_MODEL_YEAR as i64,
                    MAX_MODEL_YEAR as i64,
                    MAX_PRICE as i64 / 1_000
                ),
                x: Axis {
                    field: "model_year",
                    label: "Model year",
                },
                y: Axis {
                    field: "price",
                    label: "Price ($)",
                },
                color_field: None,
                nbins_x: None,
                nbins_y: None,
                barmode: None,
                opacity: None,
                color_scale: None,
                colorbar_label: None,
                row_count: view.len(),
                series: vec![Series {
                    name: None,
                    x: Values::Int(year),
                    y: Some(Values::Float(price)),
                }],
            }
        }
        ChartId::ListingDuration => ChartSpec {
            id: chart,
            kind: ChartKind::Histogram,
            title: format!("Listing Duration by Vehicle Condition (≤ {MAX_DAYS_LISTED} days)"),
            x: Axis {
                field: "days_listed",
                label: "Days listed",
            },
            y: Axis {
                field: "count",
                label: COUNT_LABEL,
            },
            color_field: Some("condition"),
            nbins_x: Some(DURATION_BINS),
            nbins_y: None,
            barmode: Some(BarMode::Overlay),
            opacity: Some(OVERLAY_OPACITY),
            color_scale: None,
            colorbar_label: None,
            row_count: view.len(),
            series: series_by_condition(&view, |listing| Some(listing.days_listed))
                .into_iter()
                .map(|(name, days)| Series {
                    name: Some(name),
                    x: Values::Int(days),
                    y: None,
                })
                .collect(),
        },
    }
}

/// Every chart in display order.
pub fn prepare_charts(working: &ListingSubset<'_>) -> Vec<ChartSpec> {
    ChartId::ALL
        .iter()
        .map(|chart| prepare_chart(*chart, working))
        .collect()
}

/// One colour group per condition, in ascending condition order.
fn series_by_condition<T>(
    view: &BoundedView<'_>,
    value: impl Fn(&Listing) -> Option<T>,
) -> BTreeMap<String, Vec<T>> {
    let mut groups: BTreeMap<String, Vec<T>> = BTreeMap::new();
    for &listing in view.rows() {
        if let (Some(condition), Some(v)) = (&listing.condition, value(listing)) {
            groups.entry(condition.clone()).or_default().push(v);
        }
    }
    groups
}

pub fn format_thousands(value: i64) -> String {
    let digits = value.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if value < 0 {
        out.push('-');
    }
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

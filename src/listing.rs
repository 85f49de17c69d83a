//! Used-vehicle listings and the one-shot CSV dataset loader.

use std::collections::BTreeSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;
use tracing::{error, info};

/// One row of the listings table. Rows carry no identity and are never mutated after load.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: f64,
    pub odometer: Option<f64>,
    pub model_year: Option<f64>,
    pub condition: Option<String>,
    pub vehicle_type: String,
    pub days_listed: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingDataset {
    listings: Vec<Listing>,
}

impl ListingDataset {
    pub fn new(listings: Vec<Listing>) -> Self {
        Self { listings }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// Distinct vehicle types in ascending order.
    pub fn type_options(&self) -> Vec<String> {
        self.listings
            .iter()
            .map(|listing| listing.vehicle_type.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Error)]
pub enum ListingLoadError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("listings table is missing required column '{column}'")]
    MissingColumn { column: &'static str },
    #[error("line {line}: required field {field} is empty")]
    MissingValue { line: u64, field: &'static str },
    #[error("line {line}: failed to parse field {field} value '{value}'")]
    ParseField {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Read the whole listings table at `path` into memory.
pub fn load_listings(path: &Path) -> Result<ListingDataset, ListingLoadError> {
    let result = fs::File::open(path)
        .map_err(|source| ListingLoadError::Open {
            path: path.to_path_buf(),
            source,
        })
        .and_then(read_listings);

    match &result {
        Ok(dataset) => info!(
            component = "listing",
            event = "dataset.load.finish",
            path = %path.display(),
            rows = dataset.len()
        ),
        Err(err) => error!(
            component = "listing",
            event = "dataset.load.error",
            path = %path.display(),
            reason = %err
        ),
    }

    result
}

pub fn read_listings<R: Read>(reader: R) -> Result<ListingDataset, ListingLoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnIndex::from_headers(reader.headers()?)?;

    let mut listings = Vec::new();
    for record in reader.records() {
        let record = record?;
        listings.push(parse_listing_record(&record, &columns)?);
    }

    Ok(ListingDataset::new(listings))
}

#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    price: usize,
    odometer: usize,
    model_year: usize,
    condition: usize,
    vehicle_type: usize,
    days_listed: usize,
}

impl ColumnIndex {
    fn from_headers(headers: &StringRecord) -> Result<Self, ListingLoadError> {
        let find = |column: &'static str| {
            headers
                .iter()
                .position(|header| header == column)
                .ok_or(ListingLoadError::MissingColumn { column })
        };

        Ok(Self {
            price: find("price")?,
            odometer: find("odometer")?,
            model_year: find("model_year")?,
            condition: find("condition")?,
            vehicle_type: find("type")?,
            days_listed: find("days_listed")?,
        })
    }
}

fn parse_listing_record(
    record: &StringRecord,
    columns: &ColumnIndex,
) -> Result<Listing, ListingLoadError> {
    let line = record.position().map(|pos| pos.line()).unwrap_or_default();
    let cell = |idx: usize| record.get(idx).filter(|raw| !raw.is_empty());

    let price = cell(columns.price).ok_or(ListingLoadError::MissingValue {
        line,
        field: "price",
    })?;
    let vehicle_type = cell(columns.vehicle_type).ok_or(ListingLoadError::MissingValue {
        line,
        field: "type",
    })?;
    let days_listed = cell(columns.days_listed).ok_or(ListingLoadError::MissingValue {
        line,
        field: "days_listed",
    })?;

    Ok(Listing {
        price: parse_f64(price, line, "price")?,
        odometer: cell(columns.odometer)
            .map(|raw| parse_f64(raw, line, "odometer"))
            .transpose()?,
        model_year: cell(columns.model_year)
            .map(|raw| parse_f64(raw, line, "model_year"))
            .transpose()?,
        condition: cell(columns.condition).map(str::to_string),
        vehicle_type: vehicle_type.to_string(),
        days_listed: parse_count(days_listed, line, "days_listed")?,
    })
}

fn parse_f64(raw: &str, line: u64, field: &'static str) -> Result<f64, ListingLoadError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ListingLoadError::ParseField {
            line,
            field,
            value: raw.to_string(),
        })
}

// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
const I64_LOWER: f64 = i64::MIN as f64;
const I64_UPPER: f64 = i64::MAX as f64;

fn parse_count(raw: &str, line: u64, field: &'static str) -> Result<i64, ListingLoadError> {
    if let Ok(value) = raw.parse::<i64>() {
        return Ok(value);
    }

    // Exported tables sometimes write integer columns as `19.0`.
    parse_f64(raw, line, field)
        .ok()
        .filter(|value| value.fract() == 0.0 && (I64_LOWER..I64_UPPER).contains(value))
        .map(|value| value as i64)
        .ok_or_else(|| ListingLoadError::ParseField {
            line,
            field,
            value: raw.to_string(),
        })
}

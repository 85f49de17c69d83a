//! Filter state and the immutable filtering pipeline that produces the working subset.

use std::collections::BTreeSet;

use serde::{Serialize, Serializer};

use crate::listing::{Listing, ListingDataset};

/// Control value meaning "do not filter on type".
pub const ALL_TYPES: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TypeSelection {
    #[default]
    All,
    Only(String),
}

impl TypeSelection {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed == ALL_TYPES {
            Self::All
        } else {
            Self::Only(trimmed.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_TYPES,
            Self::Only(value) => value,
        }
    }

    pub fn admits(&self, listing: &Listing) -> bool {
        match self {
            Self::All => true,
            Self::Only(value) => listing.vehicle_type == *value,
        }
    }
}

/// A borrowed, read-only selection of listings. Every narrowing step returns a new subset.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingSubset<'a> {
    rows: Vec<&'a Listing>,
}

impl<'a> ListingSubset<'a> {
    pub fn full(dataset: &'a ListingDataset) -> Self {
        Self {
            rows: dataset.listings().iter().collect(),
        }
    }

    pub fn restrict(&self, keep: impl Fn(&Listing) -> bool) -> Self {
        Self {
            rows: self
                .rows
                .iter()
                .copied()
                .filter(|&listing| keep(listing))
                .collect(),
        }
    }

    pub fn rows(&self) -> &[&'a Listing] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct non-null conditions present in this subset, ascending.
    pub fn condition_options(&self) -> BTreeSet<String> {
        self.rows
            .iter()
            .filter_map(|listing| listing.condition.clone())
            .collect()
    }
}

pub fn filter_by_type<'a>(
    subset: &ListingSubset<'a>,
    selection: &TypeSelection,
) -> ListingSubset<'a> {
    match selection {
        TypeSelection::All => subset.clone(),
        TypeSelection::Only(_) => subset.restrict(|listing| selection.admits(listing)),
    }
}

/// Rows without a condition never pass, whatever the selection.
pub fn filter_by_conditions<'a>(
    subset: &ListingSubset<'a>,
    conditions: &BTreeSet<String>,
) -> ListingSubset<'a> {
    subset.restrict(|listing| {
        listing
            .condition
            .as_ref()
            .is_some_and(|condition| conditions.contains(condition))
    })
}

/// Current control selections. `conditions` is always a subset of the conditions observed
/// under `vehicle_type`; the only way to change either is through the setters below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilterState {
    #[serde(serialize_with = "serialize_type_selection")]
    vehicle_type: TypeSelection,
    conditions: BTreeSet<String>,
}

impl FilterState {
    /// Type "All" with every observed condition selected.
    pub fn initial(dataset: &ListingDataset) -> Self {
        Self {
            vehicle_type: TypeSelection::All,
            conditions: ListingSubset::full(dataset).condition_options(),
        }
    }

    /// Build the state the controls would reach: pick the type, then (optionally) the
    /// conditions. `None` keeps the default of all conditions selected.
    pub fn from_selection(
        dataset: &ListingDataset,
        vehicle_type: TypeSelection,
        conditions: Option<BTreeSet<String>>,
    ) -> Self {
        let mut state = Self::initial(dataset);
        state.set_type(dataset, vehicle_type);
        if let Some(conditions) = conditions {
            state.set_conditions(dataset, conditions);
        }
        state
    }

    pub fn vehicle_type(&self) -> &TypeSelection {
        &self.vehicle_type
    }

    pub fn conditions(&self) -> &BTreeSet<String> {
        &self.conditions
    }

    /// Switch the type filter and reset the conditions to everything observed under it.
    pub fn set_type(&mut self, dataset: &ListingDataset, selection: TypeSelection) {
        self.conditions = condition_options(dataset, &selection);
        self.vehicle_type = selection;
    }

    /// Select conditions; values not offered under the current type are dropped.
    pub fn set_conditions(
        &mut self,
        dataset: &ListingDataset,
        values: impl IntoIterator<Item = String>,
    ) {
        let offered = condition_options(dataset, &self.vehicle_type);
        self.conditions = values
            .into_iter()
            .filter(|value| offered.contains(value))
            .collect();
    }
}

/// Conditions the condition control offers under a given type selection.
pub fn condition_options(
    dataset: &ListingDataset,
    selection: &TypeSelection,
) -> BTreeSet<String> {
    filter_by_type(&ListingSubset::full(dataset), selection).condition_options()
}

/// The working subset shared by every chart.
pub fn apply_filters<'a>(dataset: &'a ListingDataset, state: &FilterState) -> ListingSubset<'a> {
    let by_type = filter_by_type(&ListingSubset::full(dataset), &state.vehicle_type);
    filter_by_conditions(&by_type, &state.conditions)
}

fn serialize_type_selection<S: Serializer>(
    value: &TypeSelection,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(value.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(price: f64, vehicle_type: &str, condition: Option<&str>) -> Listing {
        Listing {
            price,
            odometer: Some(50_000.0),
            model_year: Some(2015.0),
            condition: condition.map(str::to_string),
            vehicle_type: vehicle_type.to_string(),
            days_listed: 30,
        }
    }

    fn sample_dataset() -> ListingDataset {
        ListingDataset::new(vec![
            listing(20_000.0, "sedan", Some("excellent")),
            listing(8_000.0, "sedan", Some("fair")),
            listing(120_000.0, "truck", Some("good")),
            listing(30_000.0, "truck", Some("like new")),
            listing(15_000.0, "SUV", None),
            listing(12_000.0, "SUV", Some("good")),
        ])
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn type_selection_parses_sentinel_and_blank_as_all() {
        assert_eq!(TypeSelection::parse("All"), TypeSelection::All);
        assert_eq!(TypeSelection::parse("  "), TypeSelection::All);
        assert_eq!(
            TypeSelection::parse("sedan"),
            TypeSelection::Only("sedan".to_string())
        );
        assert_eq!(TypeSelection::Only("SUV".to_string()).as_str(), "SUV");
    }

    #[test]
    fn initial_state_selects_every_observed_condition() {
        let dataset = sample_dataset();
        let state = FilterState::initial(&dataset);

        assert_eq!(state.vehicle_type(), &TypeSelection::All);
        assert_eq!(
            state.conditions(),
            &set(&["excellent", "fair", "good", "like new"])
        );
    }

    #[test]
    fn set_type_resets_conditions_to_type_options() {
        let dataset = sample_dataset();
        let mut state = FilterState::initial(&dataset);
        state.set_conditions(&dataset, set(&["good"]));

        state.set_type(&dataset, TypeSelection::Only("sedan".to_string()));

        assert_eq!(state.conditions(), &set(&["excellent", "fair"]));
    }

    #[test]
    fn set_conditions_drops_values_not_offered_under_type() {
        let dataset = sample_dataset();
        let mut state = FilterState::initial(&dataset);
        state.set_type(&dataset, TypeSelection::Only("truck".to_string()));

        state.set_conditions(&dataset, set(&["good", "excellent", "salvage"]));

        assert_eq!(state.conditions(), &set(&["good"]));
    }

    #[test]
    fn default_conditions_do_not_exclude_rows_with_a_condition() {
        let dataset = sample_dataset();
        let state = FilterState::initial(&dataset);
        let working = apply_filters(&dataset, &state);

        // The SUV without a condition is the only row that falls out.
        assert_eq!(working.len(), 5);
        assert!(working.rows().iter().all(|row| row.condition.is_some()));
    }

    #[test]
    fn all_equals_union_of_individual_types() {
        let dataset = sample_dataset();
        let all = apply_filters(&dataset, &FilterState::initial(&dataset));

        let mut union_len = 0;
        for vehicle_type in dataset.type_options() {
            let state =
                FilterState::from_selection(&dataset, TypeSelection::Only(vehicle_type), None);
            let subset = apply_filters(&dataset, &state);
            for row in subset.rows() {
                assert!(all.rows().iter().any(|candidate| std::ptr::eq(*candidate, *row)));
            }
            union_len += subset.len();
        }

        assert_eq!(union_len, all.len());
    }

    #[test]
    fn empty_condition_selection_yields_empty_subset() {
        let dataset = sample_dataset();
        let state =
            FilterState::from_selection(&dataset, TypeSelection::All, Some(BTreeSet::new()));

        assert!(state.conditions().is_empty());
        assert!(apply_filters(&dataset, &state).is_empty());
    }

    #[test]
    fn unknown_type_yields_empty_subset_and_no_condition_options() {
        let dataset = sample_dataset();
        let state = FilterState::from_selection(
            &dataset,
            TypeSelection::Only("spaceship".to_string()),
            None,
        );

        assert!(state.conditions().is_empty());
        assert!(apply_filters(&dataset, &state).is_empty());
    }

    #[test]
    fn filtering_is_deterministic_and_leaves_dataset_untouched() {
        let dataset = sample_dataset();
        let before = dataset.clone();
        let state = FilterState::from_selection(
            &dataset,
            TypeSelection::Only("truck".to_string()),
            Some(set(&["good", "like new"])),
        );

        let first = apply_filters(&dataset, &state);
        let second = apply_filters(&dataset, &state);

        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
        assert_eq!(dataset, before);
    }

    #[test]
    fn filter_state_serializes_type_as_plain_string() {
        let dataset = sample_dataset();
        let state = FilterState::from_selection(
            &dataset,
            TypeSelection::Only("sedan".to_string()),
            None,
        );

        let json = serde_json::to_value(&state).expect("filter state should serialize");
        assert_eq!(json["vehicle_type"], "sedan");
        assert_eq!(json["conditions"][0], "excellent");
    }

    #[test]
    fn setters_are_the_only_way_to_reach_a_state() {
        let dataset = sample_dataset();
        let mut state = FilterState::initial(&dataset);

        state.set_conditions(&dataset, set(&["excellent", "rebuilt"]));
        state.set_type(&dataset, TypeSelection::Only("SUV".to_string()));
        state.set_conditions(&dataset, set(&["good", "excellent"]));

        let offered = condition_options(&dataset, state.vehicle_type());
        assert!(state.conditions().is_subset(&offered));
        assert_eq!(state.conditions(), &set(&["good"]));
    }
}

//! Filter engine: derives the filtered identifier list.
//!
//! Pure and order-preserving. A property survives when it passes every
//! predicate in the chain: basic filter, search, price range, category.

use std::collections::HashMap;

use crate::domain::models::{BasicFilter, FilterCriteria, Property};

/// Apply `criteria` to `all_ids`, returning the surviving identifiers in
/// their original relative order. Identifiers without a record are dropped.
pub fn apply(
    all_ids: &[String],
    by_id: &HashMap<String, Property>,
    criteria: &FilterCriteria,
) -> Vec<String> {
    let search = criteria.search_term().map(str::to_lowercase);

    all_ids
        .iter()
        .filter(|id| {
            by_id
                .get(id.as_str())
                .is_some_and(|property| matches_with(property, criteria, search.as_deref()))
        })
        .cloned()
        .collect()
}

/// Whether a single property passes `criteria`.
pub fn matches(property: &Property, criteria: &FilterCriteria) -> bool {
    let search = criteria.search_term().map(str::to_lowercase);
    matches_with(property, criteria, search.as_deref())
}

/// The basic filter alone.
pub fn passes_basic(property: &Property, basic: BasicFilter) -> bool {
    match basic {
        BasicFilter::All => true,
        BasicFilter::Available => property.is_available(),
        BasicFilter::Expensive => property.is_expensive(),
    }
}

fn matches_with(property: &Property, criteria: &FilterCriteria, search: Option<&str>) -> bool {
    passes_basic(property, criteria.basic)
        && search.map_or(true, |term| passes_search(property, term))
        && passes_price(property, criteria)
        && criteria
            .category
            .map_or(true, |category| property.category.as_str().eq_ignore_ascii_case(category.as_str()))
}

/// `term` is already lowercased.
fn passes_search(property: &Property, term: &str) -> bool {
    property.name.to_lowercase().contains(term)
        || property.description.to_lowercase().contains(term)
        || property.location.to_string().to_lowercase().contains(term)
}

// No special case for an inverted range: it matches nothing.
fn passes_price(property: &Property, criteria: &FilterCriteria) -> bool {
    criteria.effective_min_price() <= property.price && property.price <= criteria.effective_max_price()
}

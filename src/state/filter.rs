/// Filter and sort engine
///
/// Derives the displayed sequence from the full item set. Pure and
/// synchronous; the view re-runs it whenever the query, the category,
/// the selection key or the item set changes.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use super::catalog::CatalogSchema;
use super::data::CatalogItem;

/// Current filter inputs of a view
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    /// Free text, matched case-insensitively as a substring
    pub query: String,
    /// Exact match against the schema's category field
    pub category: Option<String>,
    /// Exact match against the schema's link field (cross-view selection)
    pub selection: Option<String>,
}

impl FilterCriteria {
    /// Whether `item` passes every active criterion
    pub fn matches(&self, schema: &CatalogSchema, item: &CatalogItem) -> bool {
        self.matches_query(schema, item)
            && self.matches_category(schema, item)
            && self.matches_selection(schema, item)
    }

    fn matches_query(&self, schema: &CatalogSchema, item: &CatalogItem) -> bool {
        if self.query.is_empty() {
            return true;
        }
        let needle = self.query.to_lowercase();
        schema
            .search_fields
            .iter()
            .filter_map(|field| item.field(field))
            .any(|value| value.contains_lowercase(&needle))
    }

    fn matches_category(&self, schema: &CatalogSchema, item: &CatalogItem) -> bool {
        match (&self.category, &schema.category_field) {
            (Some(wanted), Some(field)) if !wanted.is_empty() => item
                .field(field)
                .map(|value| value.matches_exact(wanted))
                .unwrap_or(false),
            _ => true,
        }
    }

    fn matches_selection(&self, schema: &CatalogSchema, item: &CatalogItem) -> bool {
        match (&self.selection, &schema.link_field) {
            (Some(wanted), Some(field)) if !wanted.is_empty() => item
                .field(field)
                .map(|value| value.matches_exact(wanted))
                .unwrap_or(false),
            _ => true,
        }
    }
}

/// Collation key of a display name: compatibility-decomposed, accents
/// stripped, lower-cased
fn collation_key(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

/// Case- and accent-insensitive name ordering
///
/// "Éclair" sorts with the e's, not after "z". Names that only differ in
/// accents or case fall back to finer comparisons so the order is total
/// and repeatable.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Select the matching items and sort them by display name
///
/// Returns indices into `items`, so every displayed entry is by
/// construction a member of the loaded set.
pub fn apply(schema: &CatalogSchema, items: &[CatalogItem], criteria: &FilterCriteria) -> Vec<usize> {
    let mut selected: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| criteria.matches(schema, item))
        .map(|(index, _)| index)
        .collect();

    selected.sort_by(|&a, &b| compare_names(&items[a].name, &items[b].name));
    selected
}

/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the network layer, the catalog views and the UI layer.

use std::collections::BTreeMap;
use std::fmt;

/// A single attribute value of a catalog record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    /// Plain scalar (strings verbatim, numbers and booleans stringified)
    Text(String),
    /// Array of scalars (e.g. a skin's `role` list)
    List(Vec<String>),
}

impl FieldValue {
    /// Exact equality for scalars, membership for lists
    pub fn matches_exact(&self, wanted: &str) -> bool {
        match self {
            FieldValue::Text(value) => value == wanted,
            FieldValue::List(values) => values.iter().any(|v| v == wanted),
        }
    }

    /// Case-insensitive substring match (`needle` must already be lower-cased)
    pub fn contains_lowercase(&self, needle: &str) -> bool {
        match self {
            FieldValue::Text(value) => value.to_lowercase().contains(needle),
            FieldValue::List(values) => values
                .iter()
                .any(|v| v.to_lowercase().contains(needle)),
        }
    }

    /// Get the scalar text, if this is not a list
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(value) => Some(value),
            FieldValue::List(_) => None,
        }
    }
}

/// One image slot of an item, with its URL already normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSlot {
    /// Field name the URL came from (e.g. "img1")
    pub name: String,
    /// Normalized URL, the only form stored after ingestion
    pub url: String,
}

/// Represents a single record of a loaded catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogItem {
    /// Identity key, unique within one loaded catalog
    pub id: String,
    /// Display name used for sorting and row titles
    pub name: String,
    /// Image slots in render order
    pub slots: Vec<ImageSlot>,
    /// Every attribute of the record (including id and name fields)
    pub fields: BTreeMap<String, FieldValue>,
}

impl CatalogItem {
    /// Look up an attribute by field name
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Look up a scalar attribute by field name
    pub fn text(&self, name: &str) -> Option<&str> {
        self.field(name).and_then(FieldValue::as_text)
    }

    /// Build the readiness key of one of this item's slots
    pub fn slot_key(&self, slot: &ImageSlot) -> ImageSlotKey {
        ImageSlotKey::new(&self.id, &slot.name)
    }
}

/// Composite identity of one tracked image load: (item id, slot name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ImageSlotKey {
    pub item: String,
    pub slot: String,
}

impl ImageSlotKey {
    pub fn new(item: &str, slot: &str) -> Self {
        Self {
            item: item.to_string(),
            slot: slot.to_string(),
        }
    }
}

impl fmt::Display for ImageSlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.item, self.slot)
    }
}

/// Tag of one view activation
///
/// Every async completion carries the generation it was started under;
/// completions from an older generation are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Generation(pub u64);

impl Generation {
    /// The generation that follows this one
    pub fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Loaded items plus the derived, displayed sequence
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    /// Full loaded set (empty before load or after a failed load)
    pub items: Vec<CatalogItem>,
    /// Indices into `items`, filtered and sorted by display name
    pub filtered: Vec<usize>,
    /// True from activation until the single fetch completes
    pub loading: bool,
    /// User-visible error of a failed load
    pub error_message: Option<String>,
}

impl ViewState {
    /// Iterate the displayed items in order
    pub fn filtered_items(&self) -> impl Iterator<Item = &CatalogItem> {
        self.filtered.iter().map(|&index| &self.items[index])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_field_matches_member() {
        let roles = FieldValue::List(vec!["Tank".to_string(), "Support".to_string()]);
        assert!(roles.matches_exact("Support"));
        assert!(!roles.matches_exact("support"));
        assert!(roles.contains_lowercase("supp"));
    }

    #[test]
    fn test_slot_key_display() {
        let key = ImageSlotKey::new("123", "img1");
        assert_eq!(key.to_string(), "123-img1");
    }

    #[test]
    fn test_generation_advances() {
        let first = Generation::default();
        assert!(first.next() > first);
        assert_eq!(first.next(), Generation(1));
    }
}

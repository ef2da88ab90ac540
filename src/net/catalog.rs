/// Catalog loader
///
/// Fetches a catalog's JSON array once, validates its shape and maps every
/// usable entry onto a `CatalogItem` using the catalog's schema. Never
/// retries.

use std::collections::{BTreeMap, HashSet};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::normalize::normalize_image_url;
use crate::state::catalog::CatalogSchema;
use crate::state::data::{CatalogItem, FieldValue, ImageSlot};

/// Why a catalog could not be loaded
///
/// Cloneable so it can travel inside UI messages; foreign errors are
/// captured as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    /// The server could not be reached
    #[error("transport failure: {}", .cause.as_deref().unwrap_or("unknown error"))]
    Transport { cause: Option<String> },

    /// The server answered with a non-success status
    #[error("server responded with {reason} (Status: {status})")]
    Status { status: u16, reason: String },

    /// The body was not JSON at all
    #[error("{resource} is not valid JSON: {detail}")]
    InvalidJson { resource: String, detail: String },

    /// The body was JSON but not an array
    #[error("{resource} is not a valid array")]
    NotAnArray { resource: String },
}

impl LoadError {
    /// Response arrived but had the wrong shape
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            LoadError::InvalidJson { .. } | LoadError::NotAnArray { .. }
        )
    }

    fn transport(err: &reqwest::Error) -> Self {
        let cause = err.to_string();
        LoadError::Transport {
            cause: if cause.is_empty() { None } else { Some(cause) },
        }
    }
}

/// Build the HTTP client shared by catalog and image requests
pub fn build_client(request_timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .timeout(request_timeout)
        .build()
        .unwrap_or_else(|err| {
            warn!(error = %err, "Falling back to default HTTP client");
            reqwest::Client::new()
        })
}

/// Fetch and parse one catalog
pub async fn fetch_catalog(
    client: reqwest::Client,
    schema: CatalogSchema,
) -> Result<Vec<CatalogItem>, LoadError> {
    info!(catalog = %schema.kind, url = %schema.source_url, "📥 Fetching catalog");

    let response = client
        .get(&schema.source_url)
        .send()
        .await
        .map_err(|err| LoadError::transport(&err))?;

    let status = response.status();
    if !status.is_success() {
        return Err(LoadError::Status {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("an error").to_string(),
        });
    }

    let body = response
        .bytes()
        .await
        .map_err(|err| LoadError::transport(&err))?;

    let items = parse_catalog(&schema, &body)?;
    info!(catalog = %schema.kind, count = items.len(), "✅ Catalog loaded");
    Ok(items)
}

/// Validate a response body and map it to catalog items
pub fn parse_catalog(schema: &CatalogSchema, body: &[u8]) -> Result<Vec<CatalogItem>, LoadError> {
    let resource = schema.resource_name();

    let value: Value = serde_json::from_slice(body).map_err(|err| LoadError::InvalidJson {
        resource: resource.clone(),
        detail: err.to_string(),
    })?;

    let Value::Array(entries) = value else {
        return Err(LoadError::NotAnArray { resource });
    };

    let mut seen = HashSet::new();
    let mut items = Vec::with_capacity(entries.len());

    for (index, entry) in entries.into_iter().enumerate() {
        let item = match parse_entry(schema, entry) {
            Ok(item) => item,
            Err(reason) => {
                warn!(catalog = %schema.kind, index, %reason, "Dropping unusable catalog entry");
                continue;
            }
        };

        if !seen.insert(item.id.clone()) {
            warn!(catalog = %schema.kind, id = %item.id, index, "Dropping duplicate catalog entry");
            continue;
        }
        items.push(item);
    }

    debug!(catalog = %schema.kind, count = items.len(), "Parsed catalog entries");
    Ok(items)
}

/// Map one JSON object onto a catalog item
fn parse_entry(schema: &CatalogSchema, entry: Value) -> Result<CatalogItem, String> {
    let Value::Object(object) = entry else {
        return Err("not an object".to_string());
    };

    let fields: BTreeMap<String, FieldValue> = object
        .into_iter()
        .filter_map(|(name, value)| to_field_value(value).map(|field| (name, field)))
        .collect();

    let required_text = |field: &str| -> Result<String, String> {
        fields
            .get(field)
            .and_then(FieldValue::as_text)
            .map(str::to_string)
            .ok_or_else(|| format!("missing `{}`", field))
    };

    let id = required_text(&schema.id_field)?;
    let name = required_text(&schema.name_field)?;

    let slots = schema
        .slot_fields
        .iter()
        .map(|slot| {
            let raw = fields.get(slot).and_then(FieldValue::as_text).unwrap_or("");
            ImageSlot {
                name: slot.clone(),
                url: normalize_image_url(raw, &schema.placeholder_image),
            }
        })
        .collect();

    Ok(CatalogItem {
        id,
        name,
        slots,
        fields,
    })
}

/// Flatten a JSON value into a field; nested objects and nulls are dropped
fn to_field_value(value: Value) -> Option<FieldValue> {
    match value {
        Value::Array(values) => Some(FieldValue::List(
            values.into_iter().filter_map(scalar_text).collect(),
        )),
        other => scalar_text(other).map(FieldValue::Text),
    }
}

fn scalar_text(value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

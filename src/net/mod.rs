/// Network module
///
/// This module handles:
/// - Fetching and validating catalog JSON (catalog.rs)
/// - Prefetching image slots (prefetch.rs)
/// - Normalizing image URLs at ingestion (normalize.rs)

pub mod catalog;
pub mod normalize;
pub mod prefetch;

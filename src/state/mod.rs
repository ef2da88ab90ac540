/// State management module
/// 
/// This module handles all application state, including:
/// - Shared data structures (data.rs)
/// - Per-catalog schemas (catalog.rs)
/// - Filtering and sorting of the displayed list (filter.rs)
/// - Image readiness tracking with per-slot timeouts (readiness.rs)
/// - One activation of a catalog view (view.rs)
/// - Cross-view selection (session.rs)

pub mod catalog;
pub mod data;
pub mod filter;
pub mod readiness;
pub mod session;
pub mod view;

/// User interface module
///
/// - Catalog page and rows (catalog_list.rs)
/// - Animated spinner placeholder drawn on a canvas (spinner.rs)

pub mod catalog_list;
pub mod spinner;

//! Result aggregation
//!
//! Locates the item collection inside heterogeneous response bodies and
//! accumulates it across pages.

mod extractor;

pub use extractor::{extract_items, ResultAggregator, DEFAULT_COLLECTION_FIELDS};

#[cfg(test)]
mod tests;

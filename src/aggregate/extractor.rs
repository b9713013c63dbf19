//! Item extraction
//!
//! Fixed precedence, shared by every target API:
//! 1. the body itself when it is an array
//! 2. `data` when it is an array
//! 3. `items` when it is an array
//! 4. the first configured domain field (e.g. `orders`) that is an array
//! 5. otherwise the whole body as a single item
//!
//! An empty (`null`) body yields no items.

use serde_json::Value;

/// Domain-specific collection fields consulted after `data` and `items`
pub const DEFAULT_COLLECTION_FIELDS: [&str; 1] = ["orders"];

/// Generic collection fields, in precedence order
const GENERIC_COLLECTION_FIELDS: [&str; 2] = ["data", "items"];

/// Extract items using the default domain fields
pub fn extract_items(body: &Value) -> Vec<Value> {
    ResultAggregator::default().extract_items(body)
}

/// Extracts items from page bodies and keeps the running totals
#[derive(Debug, Clone)]
pub struct ResultAggregator {
    collection_fields: Vec<String>,
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_COLLECTION_FIELDS.iter().map(ToString::to_string))
    }
}

impl ResultAggregator {
    /// Create an aggregator with the given domain collection fields
    pub fn new<I, S>(collection_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            collection_fields: collection_fields.into_iter().map(Into::into).collect(),
        }
    }

    /// Domain collection fields in lookup order
    pub fn collection_fields(&self) -> &[String] {
        &self.collection_fields
    }

    /// Extract the item sequence from a response body
    ///
    /// Pure: the body is never mutated and repeated calls yield equal results.
    pub fn extract_items(&self, body: &Value) -> Vec<Value> {
        match body {
            Value::Null => Vec::new(),
            Value::Array(items) => items.clone(),
            Value::Object(map) => GENERIC_COLLECTION_FIELDS
                .iter()
                .copied()
                .chain(self.collection_fields.iter().map(String::as_str))
                .find_map(|field| map.get(field).and_then(Value::as_array))
                .cloned()
                .unwrap_or_else(|| vec![body.clone()]),
            other => vec![other.clone()],
        }
    }

    /// Extract items from `body` and append them to `aggregate`
    ///
    /// Returns the number of items contributed by this page.
    pub fn append(&self, body: &Value, aggregate: &mut Vec<Value>) -> usize {
        let items = self.extract_items(body);
        let count = items.len();
        aggregate.extend(items);
        count
    }
}

//! # facetql - JSON output
//!
//! Conversion of evaluation results into [`serde_json::Value`] trees, for
//! embedding hosts that hand results to a UI or serialize them over a
//! wire.
//!
//! Mapping:
//!
//! | facetql value | JSON |
//! |---------------|------|
//! | Text, Item    | string |
//! | Number        | number, or `null` for NaN and infinities |
//! | Boolean       | boolean |
//! | Date          | RFC 3339 string |
//!
//! A collection becomes a JSON array. Set-backed collections are emitted
//! in a stable order (sorted by display string) so serialized output is
//! reproducible; ordered collections keep their own order.
//!
//! # Examples
//!
//! ```
//! use facetql::{to_json, Collection, Value, ValueType};
//!
//! let c = Collection::from_values(
//!     vec![Value::Number(3.0), Value::Text("a".into())],
//!     ValueType::Text,
//! );
//! assert_eq!(to_json(&c), r#"[3.0,"a"]"#);
//! ```

use serde_json::Value as Json;

use crate::collection::{Backing, Collection};
use crate::value::Value;

/// Convert one value to JSON.
pub fn value_to_json(value: &Value) -> Json {
    match value {
        Value::Text(s) | Value::Item(s) => Json::String(s.clone()),
        Value::Number(n) => serde_json::Number::from_f64(*n)
            .map(Json::Number)
            .unwrap_or(Json::Null),
        Value::Boolean(b) => Json::Bool(*b),
        Value::Date(d) => Json::String(d.to_rfc3339()),
    }
}

/// Convert a collection to a JSON array.
pub fn collection_to_json(collection: &Collection) -> Json {
    let values: Vec<Json> = match collection.backing() {
        Backing::Ordered(values) => values.iter().map(value_to_json).collect(),
        Backing::Unique(set) => {
            let mut values: Vec<&Value> = set.iter().collect();
            values.sort_by_key(|v| v.to_string());
            values.into_iter().map(value_to_json).collect()
        }
    };
    Json::Array(values)
}

/// Serialize a collection as compact JSON.
pub fn to_json(collection: &Collection) -> String {
    collection_to_json(collection).to_string()
}

/// Serialize a collection as indented JSON.
pub fn to_json_pretty(collection: &Collection) -> String {
    serde_json::to_string_pretty(&collection_to_json(collection))
        .unwrap_or_else(|_| "[]".to_string())
}

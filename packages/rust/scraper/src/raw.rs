//! Null-propagating access to the site's raw state payload.
//!
//! The embedded state object is site-controlled and loosely structured, so
//! every read is optional: a missing segment anywhere along a path yields
//! `None`, never an error. Normalization turns those `None`s into defaults.

use serde_json::Value;

/// The raw `data` payload extracted from a product page's global state.
#[derive(Debug, Clone)]
pub struct RawState(Value);

impl RawState {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Walk `path` through nested objects, stopping at the first absent or
    /// non-object segment.
    pub fn get(&self, path: &[&str]) -> Option<&Value> {
        let mut current = &self.0;
        for segment in path {
            current = current.get(segment)?;
        }
        if current.is_null() { None } else { Some(current) }
    }

    /// String at `path`, if present.
    pub fn str_at(&self, path: &[&str]) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Integer at `path`. Accepts fractional payload numbers and truncates,
    /// since the site encodes counters inconsistently.
    pub fn i64_at(&self, path: &[&str]) -> Option<i64> {
        let value = self.get(path)?;
        value.as_i64().or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Float at `path`, if present.
    pub fn f64_at(&self, path: &[&str]) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    /// Array at `path`, or an empty slice when absent — absent lists are
    /// normal, not an error.
    pub fn array_at(&self, path: &[&str]) -> &[Value] {
        self.get(path)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Element-level helpers for entries of a raw array.
pub(crate) fn elem_str(value: &Value, key: &str) -> Option<String> {
    value.get(key)?.as_str().map(str::to_string)
}

pub(crate) fn elem_i64(value: &Value, key: &str) -> Option<i64> {
    let v = value.get(key)?;
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_walks_nested_objects() {
        let state = RawState::new(json!({
            "titleModule": { "subject": "Shoes", "tradeCount": 42 }
        }));
        assert_eq!(state.str_at(&["titleModule", "subject"]), Some("Shoes"));
        assert_eq!(state.i64_at(&["titleModule", "tradeCount"]), Some(42));
    }

    #[test]
    fn absent_segments_yield_none() {
        let state = RawState::new(json!({ "a": { "b": 1 } }));
        assert!(state.get(&["a", "missing"]).is_none());
        assert!(state.get(&["missing", "b"]).is_none());
        assert!(state.str_at(&["a", "b"]).is_none()); // wrong type, not a panic
    }

    #[test]
    fn explicit_null_is_absent() {
        let state = RawState::new(json!({ "priceModule": { "minActivityAmount": null } }));
        assert!(state.get(&["priceModule", "minActivityAmount"]).is_none());
    }

    #[test]
    fn absent_array_is_empty() {
        let state = RawState::new(json!({ "imageModule": {} }));
        assert!(state.array_at(&["imageModule", "imagePathList"]).is_empty());

        let state = RawState::new(json!({ "imageModule": { "imagePathList": ["a", "b"] } }));
        assert_eq!(state.array_at(&["imageModule", "imagePathList"]).len(), 2);
    }

    #[test]
    fn fractional_counters_truncate() {
        let state = RawState::new(json!({ "quantityModule": { "totalAvailQuantity": 600.0 } }));
        assert_eq!(state.i64_at(&["quantityModule", "totalAvailQuantity"]), Some(600));
    }
}

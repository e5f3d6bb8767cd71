//! Request DTOs for the admin API
//!
//! Defines the structure of incoming HTTP request bodies.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::manager::WarmItem;

/// Largest number of items accepted by one warm request.
pub const MAX_WARM_ITEMS: usize = 10_000;

/// Request body for `PUT /caches/:store/:key`
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The value to store
    pub value: Value,
    /// Optional TTL in milliseconds (store default if not specified)
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

impl SetRequest {
    pub fn ttl(&self) -> Option<Duration> {
        self.ttl_ms.map(Duration::from_millis)
    }
}

/// One item of a warm request. `key` may be a string or any JSON value.
#[derive(Debug, Clone, Deserialize)]
pub struct WarmEntry {
    pub key: Value,
    pub value: Value,
    #[serde(default)]
    pub ttl_ms: Option<u64>,
}

/// Request body for `POST /caches/:store`
#[derive(Debug, Clone, Deserialize)]
pub struct WarmRequest {
    pub items: Vec<WarmEntry>,
}

impl WarmRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.items.len() > MAX_WARM_ITEMS {
            return Some(format!(
                "Warm request exceeds maximum of {} items",
                MAX_WARM_ITEMS
            ));
        }
        if self.items.iter().any(|item| item.key.is_null()) {
            return Some("Key cannot be null".to_string());
        }
        None
    }

    pub fn into_items(self) -> Vec<WarmItem> {
        self.items
            .into_iter()
            .map(|entry| WarmItem {
                key: entry.key.into(),
                value: entry.value,
                ttl: entry.ttl_ms.map(Duration::from_millis),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RawKey;
    use serde_json::json;

    #[test]
    fn test_set_request_deserialize() {
        let req: SetRequest = serde_json::from_str(r#"{"value": {"a": 1}}"#).unwrap();
        assert_eq!(req.value, json!({"a": 1}));
        assert!(req.ttl().is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let req: SetRequest = serde_json::from_str(r#"{"value": "v", "ttl_ms": 1500}"#).unwrap();
        assert_eq!(req.ttl(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_warm_request_rejects_null_key() {
        let req: WarmRequest =
            serde_json::from_str(r#"{"items": [{"key": null, "value": 1}]}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_warm_request_into_items() {
        let req: WarmRequest = serde_json::from_str(
            r#"{"items": [{"key": "a", "value": 1}, {"key": {"id": 2}, "value": 2, "ttl_ms": 10}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_none());

        let items = req.into_items();
        assert_eq!(items[0].key, RawKey::Text("a".to_string()));
        assert_eq!(items[1].key, RawKey::Structured(json!({"id": 2})));
        assert_eq!(items[1].ttl, Some(Duration::from_millis(10)));
    }
}

//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check store invariants over arbitrary operation sequences.

use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashSet;

use crate::cache::{CacheKey, CacheStore};

// == Test Configuration ==
const TEST_CAPACITY: usize = 100;

// == Strategies ==
fn valid_key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9_]{1,64}"
}

fn valid_value_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        "[a-zA-Z0-9 ]{1,64}".prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        prop::collection::vec(any::<u8>(), 0..8).prop_map(|bytes| json!(bytes)),
    ]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: Value },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (valid_key_strategy(), valid_value_strategy())
            .prop_map(|(key, value)| CacheOp::Set { key, value }),
        valid_key_strategy().prop_map(|key| CacheOp::Get { key }),
        valid_key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

fn unique(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|k| seen.insert(k.clone())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Counters match the outcomes callers observed, for any op sequence.
    #[test]
    fn prop_statistics_accuracy(ops in prop::collection::vec(cache_op_strategy(), 1..50)) {
        let mut store = CacheStore::new(TEST_CAPACITY, None);
        let (mut hits, mut misses, mut sets, mut deletes) = (0u64, 0u64, 0u64, 0u64);

        for op in ops {
            match op {
                CacheOp::Set { key, value } => {
                    store.set(CacheKey::from(key.as_str()), value, None);
                    sets += 1;
                }
                CacheOp::Get { key } => match store.get(&CacheKey::from(key.as_str())) {
                    Some(_) => hits += 1,
                    None => misses += 1,
                },
                CacheOp::Delete { key } => {
                    if store.delete(&CacheKey::from(key.as_str())) {
                        deletes += 1;
                    }
                }
            }
        }

        let stats = store.stats();
        prop_assert_eq!(stats.hits, hits, "Hits mismatch");
        prop_assert_eq!(stats.misses, misses, "Misses mismatch");
        prop_assert_eq!(stats.sets, sets, "Sets mismatch");
        prop_assert_eq!(stats.deletes, deletes, "Deletes mismatch");
        prop_assert_eq!(stats.current_size, store.len(), "Size mismatch");
    }

    // The store never holds more than its capacity.
    #[test]
    fn prop_capacity_enforcement(
        entries in prop::collection::vec((valid_key_strategy(), valid_value_strategy()), 1..200),
        capacity in 1usize..50,
    ) {
        let mut store = CacheStore::new(capacity, None);
        let mut evictions = 0u64;

        for (key, value) in entries {
            if store.set(CacheKey::from(key.as_str()), value, None).evicted.is_some() {
                evictions += 1;
            }
            prop_assert!(store.len() <= capacity, "size {} exceeds {}", store.len(), capacity);
        }

        prop_assert_eq!(store.stats().evictions, evictions);
    }

    // Filling to N and inserting one more evicts exactly the first-inserted key.
    #[test]
    fn prop_lru_eviction_order(
        initial_keys in prop::collection::vec(valid_key_strategy(), 2..10),
        new_key in valid_key_strategy(),
        new_value in valid_value_strategy()
    ) {
        let keys = unique(initial_keys);
        prop_assume!(keys.len() >= 2);
        prop_assume!(!keys.contains(&new_key));

        let mut store = CacheStore::new(keys.len(), None);
        for key in &keys {
            store.set(CacheKey::from(key.as_str()), json!(key), None);
        }

        let outcome = store.set(CacheKey::from(new_key.as_str()), new_value, None);

        prop_assert_eq!(outcome.evicted, Some(CacheKey::from(keys[0].as_str())));
        prop_assert_eq!(store.len(), keys.len());
        prop_assert_eq!(store.stats().evictions, 1);
        for key in keys.iter().skip(1) {
            prop_assert!(store.get(&CacheKey::from(key.as_str())).is_some());
        }
    }

    // A read moves the key off the eviction front.
    #[test]
    fn prop_lru_access_tracking(
        initial_keys in prop::collection::vec(valid_key_strategy(), 3..8),
        new_key in valid_key_strategy(),
    ) {
        let keys = unique(initial_keys);
        prop_assume!(keys.len() >= 3);
        prop_assume!(!keys.contains(&new_key));

        let mut store = CacheStore::new(keys.len(), None);
        for key in &keys {
            store.set(CacheKey::from(key.as_str()), json!(key), None);
        }

        store.get(&CacheKey::from(keys[0].as_str()));
        let outcome = store.set(CacheKey::from(new_key.as_str()), json!("new"), None);

        prop_assert_eq!(outcome.evicted, Some(CacheKey::from(keys[1].as_str())));
        prop_assert!(store.get(&CacheKey::from(keys[0].as_str())).is_some());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Every error renders as JSON with a string "error" field.
    #[test]
    fn prop_error_response_format(error_msg in "[a-zA-Z0-9 _-]{1,100}") {
        use crate::error::CacheError;
        use axum::body::to_bytes;
        use axum::response::IntoResponse;

        let error_variants = vec![
            CacheError::NotFound(error_msg.clone()),
            CacheError::InvalidConfig(error_msg.clone()),
            CacheError::InvalidRequest(error_msg.clone()),
            CacheError::Loader(anyhow::anyhow!(error_msg.clone())),
            CacheError::Persist(anyhow::anyhow!(error_msg.clone())),
            CacheError::Internal(error_msg.clone()),
        ];

        let rt = tokio::runtime::Runtime::new().unwrap();
        for error in error_variants {
            let response = error.into_response();

            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|v| v.to_str().ok());
            prop_assert!(
                content_type.map(|ct| ct.contains("application/json")).unwrap_or(false),
                "Response should have JSON content-type"
            );

            let bytes = rt.block_on(async { to_bytes(response.into_body(), usize::MAX).await.unwrap() });
            let json: Value = serde_json::from_slice(&bytes).expect("body should be JSON");
            let field = json.get("error").and_then(Value::as_str);
            prop_assert!(field.map(|msg| msg.contains(&error_msg)).unwrap_or(false));
        }
    }
}

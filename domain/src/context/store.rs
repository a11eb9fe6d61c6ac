//! Session context: bounded step history plus named intermediate values.
//!
//! [`ContextStore`] keeps the most recent `window` [`StepRecord`]s in full and
//! evicts the oldest beyond that; a [`StepSummary`] ledger survives eviction so
//! the final report always covers the whole session. Named values are
//! last-write-wins and are never removed implicitly.

use std::collections::{HashMap, VecDeque};

use serde_json::{Map, Value};

use super::entities::{StepRecord, StepSummary};
use crate::core::error::DomainError;
use crate::tool::value_objects::ToolResult;

/// Append-only session history and keyed value map.
#[derive(Debug, Clone)]
pub struct ContextStore {
    window: usize,
    history: VecDeque<StepRecord>,
    ledger: Vec<StepSummary>,
    /// Insertion-ordered named values
    values: Vec<(String, Value)>,
    positions: HashMap<String, usize>,
    next_index: usize,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW)
    }
}

impl ContextStore {
    pub const DEFAULT_WINDOW: usize = 200;

    /// Create a store retaining at most `window` full records (minimum 1).
    pub fn new(window: usize) -> Self {
        Self {
            window: window.max(1),
            history: VecDeque::new(),
            ledger: Vec::new(),
            values: Vec::new(),
            positions: HashMap::new(),
            next_index: 0,
        }
    }

    /// Index the next appended record must carry at minimum.
    pub fn next_index(&self) -> usize {
        self.next_index
    }

    /// Append a record. Indices must strictly increase.
    pub fn append(&mut self, record: StepRecord) -> Result<(), DomainError> {
        if !self.ledger.is_empty() && record.index < self.next_index {
            return Err(DomainError::NonMonotonicStep {
                last: self.next_index - 1,
                got: record.index,
            });
        }
        self.push(record);
        Ok(())
    }

    /// Record a dispatch result under the next index and return that index.
    pub fn record(&mut self, arguments: Map<String, Value>, result: &ToolResult) -> usize {
        let index = self.next_index;
        self.push(StepRecord::from_result(index, arguments, result));
        index
    }

    fn push(&mut self, record: StepRecord) {
        self.next_index = record.index + 1;
        self.ledger.push(record.summary());
        self.history.push_back(record);
        while self.history.len() > self.window {
            self.history.pop_front();
        }
    }

    /// Set a named value (last write wins, original insertion position kept).
    pub fn set_value(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.positions.get(&key) {
            Some(&pos) => self.values[pos].1 = value,
            None => {
                self.positions.insert(key.clone(), self.values.len());
                self.values.push((key, value));
            }
        }
    }

    pub fn get_value(&self, key: &str) -> Option<&Value> {
        self.positions.get(key).map(|&pos| &self.values[pos].1)
    }

    /// Named values in insertion order.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// The last `n` retained records, oldest first.
    pub fn recent_history(&self, n: usize) -> Vec<&StepRecord> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).collect()
    }

    pub fn last_step(&self) -> Option<&StepRecord> {
        self.history.back()
    }

    /// Summaries of every step ever appended, in order.
    pub fn ledger(&self) -> &[StepSummary] {
        &self.ledger
    }

    pub fn total_steps(&self) -> usize {
        self.ledger.len()
    }

    pub fn retained_steps(&self) -> usize {
        self.history.len()
    }

    pub fn evicted_steps(&self) -> usize {
        self.ledger.len() - self.history.len()
    }

    /// Case-insensitive substring match of `name` against stored keys; the
    /// first key in insertion order wins. A heuristic, not a guarantee.
    pub fn find_value_by_fuzzy_key(&self, name: &str) -> Option<(&str, &Value)> {
        let needle = name.to_lowercase();
        if needle.is_empty() {
            return None;
        }
        self.values
            .iter()
            .find(|(key, _)| key.to_lowercase().contains(&needle))
            .map(|(k, v)| (k.as_str(), v))
    }

    /// Resolve a parameter value from context.
    ///
    /// Lookup order: exact key, a field of that name inside a stored object
    /// (or the first element of a stored array of objects), fuzzy key, then
    /// the most recent successful step result carrying the field.
    pub fn resolve_value(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.get_value(name) {
            return Some(value.clone());
        }

        for (_, value) in &self.values {
            if let Some(found) = nested_field(value, name) {
                return Some(found.clone());
            }
        }

        if let Some((_, value)) = self.find_value_by_fuzzy_key(name) {
            return Some(value.clone());
        }

        self.history
            .iter()
            .rev()
            .filter(|r| r.is_success())
            .filter_map(|r| r.result.as_ref())
            .find_map(|result| nested_field(result, name).cloned())
    }
}

fn nested_field<'a>(value: &'a Value, name: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(name),
        Value::Array(items) => items.first().and_then(|first| first.get(name)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::value_objects::ToolError;
    use serde_json::json;

    fn ok(tool: &str, payload: Value) -> ToolResult {
        ToolResult::success(tool, payload)
    }

    #[test]
    fn test_record_assigns_sequential_indices() {
        let mut store = ContextStore::new(10);
        assert_eq!(store.record(Map::new(), &ok("ping", json!("pong"))), 0);
        assert_eq!(store.record(Map::new(), &ok("ping", json!("pong"))), 1);
        assert_eq!(store.next_index(), 2);
        let indices: Vec<usize> = store.recent_history(5).iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn test_append_rejects_non_monotonic_index() {
        let mut store = ContextStore::new(10);
        let result = ok("ping", json!(null));
        store.append(StepRecord::from_result(3, Map::new(), &result)).unwrap();
        let err = store
            .append(StepRecord::from_result(2, Map::new(), &result))
            .unwrap_err();
        assert_eq!(err, DomainError::NonMonotonicStep { last: 3, got: 2 });
        assert_eq!(store.total_steps(), 1);
    }

    #[test]
    fn test_window_evicts_oldest_but_ledger_keeps_all() {
        let mut store = ContextStore::new(2);
        for _ in 0..5 {
            store.record(Map::new(), &ok("ping", json!(1)));
        }
        assert_eq!(store.retained_steps(), 2);
        assert_eq!(store.evicted_steps(), 3);
        assert_eq!(store.ledger().len(), 5);
        assert_eq!(store.recent_history(10)[0].index, 3);
    }

    #[test]
    fn test_values_survive_eviction() {
        let mut store = ContextStore::new(1);
        store.set_value("base", json!(4096));
        for _ in 0..3 {
            store.record(Map::new(), &ok("ping", json!(1)));
        }
        assert_eq!(store.get_value("base"), Some(&json!(4096)));
    }

    #[test]
    fn test_set_value_last_write_wins() {
        let mut store = ContextStore::default();
        store.set_value("address", json!(1));
        store.set_value("address", json!(2));
        assert_eq!(store.get_value("address"), Some(&json!(2)));
        assert_eq!(store.value_count(), 1);
    }

    #[test]
    fn test_set_value_idempotent() {
        let mut once = ContextStore::default();
        once.record(Map::new(), &ok("ping", json!("pong")));
        once.set_value("k", json!({"v": 1}));

        let mut twice = ContextStore::default();
        twice.record(Map::new(), &ok("ping", json!("pong")));
        twice.set_value("k", json!({"v": 1}));
        twice.set_value("k", json!({"v": 1}));

        assert_eq!(once.get_value("k"), twice.get_value("k"));
        assert_eq!(once.value_count(), twice.value_count());
        let shape = |store: &ContextStore| {
            store
                .recent_history(10)
                .iter()
                .map(|r| (r.index, r.tool_name.clone(), r.result.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&once), shape(&twice));
    }

    #[test]
    fn test_fuzzy_key_first_insertion_match() {
        let mut store = ContextStore::default();
        store.set_value("scan_all_0", json!({"count": 3}));
        store.set_value("Target_Address", json!(100));
        store.set_value("other_address", json!(200));
        let (key, value) = store.find_value_by_fuzzy_key("ADDRESS").unwrap();
        assert_eq!(key, "Target_Address");
        assert_eq!(value, &json!(100));
        assert!(store.find_value_by_fuzzy_key("missing").is_none());
        assert!(store.find_value_by_fuzzy_key("").is_none());
    }

    #[test]
    fn test_resolve_value_order() {
        let mut store = ContextStore::default();
        store.record(Map::new(), &ok("read_pointer", json!({"pointer": 77})));
        assert_eq!(store.resolve_value("pointer"), Some(json!(77)));

        store.set_value("get_scan_results_1", json!([{"address": 4096}, {"address": 8192}]));
        assert_eq!(store.resolve_value("address"), Some(json!(4096)));

        store.set_value("address", json!(1));
        assert_eq!(store.resolve_value("address"), Some(json!(1)));
        assert_eq!(store.resolve_value("nothing_here"), None);
    }

    #[test]
    fn test_resolve_ignores_failed_steps() {
        let mut store = ContextStore::default();
        let failed = ToolResult {
            result: Some(json!({"size": 8})),
            ..ToolResult::failure("read_memory", ToolError::server("bad"))
        };
        store.record(Map::new(), &failed);
        assert_eq!(store.resolve_value("size"), None);
    }
}

use super::{CounterUpdate, DocumentStore, Query, SetUpdate, StoreError, StoreResult};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

type Collection = BTreeMap<String, Value>;

/// 进程内文档存储
///
/// Each collection sits behind one dashmap shard entry, so every operation
/// on a single document (and on a single collection) is atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<DashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 集合中的文档数量
    pub fn len(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }

    pub fn is_empty(&self, collection: &str) -> bool {
        self.len(collection) == 0
    }

    fn with_doc_mut<R>(
        &self,
        collection: &str,
        id: &str,
        f: impl FnOnce(&mut serde_json::Map<String, Value>) -> StoreResult<R>,
    ) -> StoreResult<R> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found(collection, id))?;
        let object = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::type_mismatch(collection, id, "<root>"))?;
        f(object)
    }
}

fn string_members(
    object: &serde_json::Map<String, Value>,
    collection: &str,
    id: &str,
    field: &str,
) -> StoreResult<Vec<String>> {
    match object.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| StoreError::type_mismatch(collection, id, field))
            })
            .collect(),
        Some(_) => Err(StoreError::type_mismatch(collection, id, field)),
    }
}

fn write_members(
    object: &mut serde_json::Map<String, Value>,
    field: &str,
    members: &[String],
    count_field: Option<&str>,
) {
    object.insert(
        field.to_string(),
        Value::Array(members.iter().cloned().map(Value::String).collect()),
    );
    if let Some(count_field) = count_field {
        object.insert(count_field.to_string(), Value::from(members.len() as i64));
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).cloned()))
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<bool> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.entry(id.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(doc);
                Ok(true)
            }
            Entry::Occupied(_) => Ok(false),
        }
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), doc);
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> StoreResult<Option<Value>> {
        let Value::Object(fields) = patch else {
            return Err(StoreError::InvalidQuery("merge patch must be an object".into()));
        };
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        let Some(doc) = docs.get_mut(id) else {
            return Ok(None);
        };
        let object = doc
            .as_object_mut()
            .ok_or_else(|| StoreError::type_mismatch(collection, id, "<root>"))?;
        for (key, value) in fields {
            object.insert(key, value);
        }
        Ok(Some(doc.clone()))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        Ok(self
            .collections
            .get_mut(collection)
            .map(|mut docs| docs.remove(id).is_some())
            .unwrap_or(false))
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>> {
        query.validate()?;
        let mut results: Vec<Value> = match self.collections.get(collection) {
            Some(docs) => docs
                .values()
                .filter(|doc| query.matches(doc))
                .cloned()
                .collect(),
            None => Vec::new(),
        };
        // sort_by is stable, ties keep id order
        results.sort_by(|a, b| query.compare(a, b));
        if let Some(limit) = query.limit {
            results.truncate(limit);
        }
        debug!("Memory query on {} returned {} documents", collection, results.len());
        Ok(results)
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<CounterUpdate> {
        self.with_doc_mut(collection, id, |object| {
            let before = match object.get(field) {
                None | Some(Value::Null) => 0,
                Some(value) => value
                    .as_i64()
                    .ok_or_else(|| StoreError::type_mismatch(collection, id, field))?,
            };
            let mut after = before + delta;
            if let Some(floor) = floor {
                after = after.max(floor);
            }
            object.insert(field.to_string(), Value::from(after));
            Ok(CounterUpdate { before, after })
        })
    }

    async fn set_add(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        self.with_doc_mut(collection, id, |object| {
            let mut members = string_members(object, collection, id, field)?;
            let changed = !members.iter().any(|m| m == member);
            if changed {
                members.push(member.to_string());
            }
            write_members(object, field, &members, count_field);
            Ok(SetUpdate {
                changed,
                len: members.len(),
            })
        })
    }

    async fn set_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        self.with_doc_mut(collection, id, |object| {
            let mut members = string_members(object, collection, id, field)?;
            let before = members.len();
            members.retain(|m| m != member);
            let changed = members.len() != before;
            write_members(object, field, &members, count_field);
            Ok(SetUpdate {
                changed,
                len: members.len(),
            })
        })
    }
}

//! Document store abstraction.
//!
//! The engine talks to its backing store through [`DocumentStore`]: plain
//! JSON documents grouped in collections, with per-document atomic counter
//! and set updates. Nothing here spans more than one document, so callers
//! that touch two documents must handle partial failure themselves.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;

pub mod memory;
#[cfg(feature = "surrealdb-store")]
pub mod surreal;

pub use memory::MemoryStore;
#[cfg(feature = "surrealdb-store")]
pub use surreal::SurrealStore;

/// `IN` 过滤器允许的最大取值数量
pub const MAX_IN_VALUES: usize = 10;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("field `{field}` of {collection}/{id} has unexpected type")]
    TypeMismatch {
        collection: String,
        id: String,
        field: String,
    },

    #[error("invalid query: {0}")]
    InvalidQuery(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    pub fn type_mismatch(collection: &str, id: &str, field: &str) -> Self {
        Self::TypeMismatch {
            collection: collection.to_string(),
            id: id.to_string(),
            field: field.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Filter {
    pub fn field(&self) -> &str {
        match self {
            Filter::Eq(field, _) | Filter::In(field, _) => field,
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::Eq(field, expected) => doc.get(field) == Some(expected),
            Filter::In(field, values) => doc
                .get(field)
                .map(|actual| values.contains(actual))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// 查询描述：等值/IN 过滤 + 单字段排序 + 条数限制
#[derive(Debug, Clone, Default)]
pub struct Query {
    pub filters: Vec<Filter>,
    pub order_by: Option<(String, Direction)>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::Eq(field.to_string(), value.into()));
        self
    }

    pub fn filter_in<V: Into<Value>>(mut self, field: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.filters.push(Filter::In(
            field.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by = Some((field.to_string(), direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Rejects queries a document backend could not serve: oversized `IN`
    /// lists and field names that are not plain identifiers.
    pub fn validate(&self) -> StoreResult<()> {
        for filter in &self.filters {
            check_field_name(filter.field())?;
            if let Filter::In(field, values) = filter {
                if values.len() > MAX_IN_VALUES {
                    return Err(StoreError::InvalidQuery(format!(
                        "`in` filter on `{}` has {} values (max {})",
                        field,
                        values.len(),
                        MAX_IN_VALUES
                    )));
                }
            }
        }
        if let Some((field, _)) = &self.order_by {
            check_field_name(field)?;
        }
        Ok(())
    }

    pub fn matches(&self, doc: &Value) -> bool {
        self.filters.iter().all(|filter| filter.matches(doc))
    }

    /// 按排序字段比较两个文档，缺失字段在降序时排在最后
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match &self.order_by {
            Some((field, Direction::Asc)) => compare_values(a.get(field), b.get(field)),
            Some((field, Direction::Desc)) => compare_values(b.get(field), a.get(field)),
            None => Ordering::Equal,
        }
    }
}

pub(crate) fn check_field_name(field: &str) -> StoreResult<()> {
    let mut chars = field.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidQuery(format!("invalid field name `{}`", field)))
    }
}

/// Orders JSON scalars: numbers numerically, RFC 3339 strings as instants,
/// other strings lexically. Missing values sort first.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::String(x)), Some(Value::String(y))) => {
            match (x.parse::<DateTime<Utc>>(), y.parse::<DateTime<Utc>>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Null), Some(Value::Null)) => Ordering::Equal,
        (Some(Value::Null), Some(_)) => Ordering::Less,
        (Some(_), Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

/// Counter value before and after an atomic increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterUpdate {
    pub before: i64,
    pub after: i64,
}

impl CounterUpdate {
    /// True when the floor kicked in and the requested delta was not fully applied.
    pub fn was_clamped(&self, delta: i64) -> bool {
        self.before + delta != self.after
    }
}

/// Outcome of an atomic set-membership update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetUpdate {
    pub changed: bool,
    pub len: usize,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 检查后端是否可用
    async fn ping(&self) -> StoreResult<()>;

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>>;

    /// Inserts `doc` only if no document with `id` exists. Returns whether it
    /// was inserted.
    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<bool>;

    /// 写入（覆盖）整个文档
    async fn put(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()>;

    /// Shallow-merges the top-level fields of `patch` into an existing
    /// document. Returns `None` when the document does not exist.
    async fn merge(&self, collection: &str, id: &str, patch: Value) -> StoreResult<Option<Value>>;

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool>;

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>>;

    /// Atomically adds `delta` to an integer field (missing counts as 0),
    /// never going below `floor` when one is given.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<CounterUpdate>;

    /// Atomically adds `member` to the string array `field`, and when
    /// `count_field` is given writes the resulting array length into it in
    /// the same update.
    async fn set_add(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate>;

    /// 与 `set_add` 相对：移除成员并同步计数字段
    async fn set_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate>;
}

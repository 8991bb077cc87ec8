//! SurrealDB backend (feature `surrealdb-store`).
//!
//! Every record is stored as `{ doc: <json> }` under `type::thing(collection, id)`
//! so the JSON round-trips untouched and never collides with SurrealDB's own
//! `id` field.
//!
//! Counter and set updates are one `UPDATE ... RETURN BEFORE` statement
//! each, which SurrealDB applies atomically to the single record. Nothing
//! spans two records; callers compensate across documents.

use super::{
    check_field_name, CounterUpdate, DocumentStore, Filter, Query, SetUpdate, StoreError,
    StoreResult,
};
use crate::storage::Direction;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use surrealdb::engine::remote::http::{Client, Http};
use surrealdb::opt::auth::Root;
use surrealdb::{Connection, Surreal};
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
struct DocRow {
    doc: Value,
}

#[derive(Clone)]
pub struct SurrealStore<C: Connection = Client> {
    db: Surreal<C>,
}

fn backend(err: surrealdb::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

impl SurrealStore<Client> {
    pub async fn connect(
        url: &str,
        namespace: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> StoreResult<Self> {
        info!("Connecting to SurrealDB at {}", url);

        let address = url
            .trim_start_matches("http://")
            .trim_start_matches("https://")
            .trim_end_matches('/');
        let db = Surreal::new::<Http>(address).await.map_err(backend)?;
        db.signin(Root { username, password }).await.map_err(backend)?;
        db.use_ns(namespace).use_db(database).await.map_err(backend)?;

        Ok(Self { db })
    }
}

impl<C: Connection> SurrealStore<C> {
    /// 使用已选定命名空间和数据库的连接
    pub fn with_client(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn fetch_rows(&self, sql: &str, params: Value) -> StoreResult<Vec<DocRow>> {
        debug!("Executing query: {}", sql);
        let mut request = self.db.query(sql);
        if let Value::Object(map) = params {
            for (key, value) in map {
                request = request.bind((key, value));
            }
        }
        let mut response = request.await.map_err(backend)?;
        response.take(0).map_err(backend)
    }

    /// Runs `SET {assignments}` on an existing record in a single statement
    /// and returns the document as it was before the write. The `WHERE`
    /// guard keeps `UPDATE` from upserting a deleted record and from
    /// touching a field of the wrong type.
    async fn update_existing(
        &self,
        collection: &str,
        id: &str,
        assignments: &str,
        guard: &str,
        mut params: serde_json::Map<String, Value>,
    ) -> StoreResult<Option<Value>> {
        let sql = format!(
            "UPDATE type::thing($tb, $id) SET {} WHERE doc != NONE AND ({}) RETURN BEFORE",
            assignments, guard
        );
        params.insert("tb".into(), json!(collection));
        params.insert("id".into(), json!(id));
        let rows = self.fetch_rows(&sql, Value::Object(params)).await?;
        Ok(rows.into_iter().next().map(|row| row.doc))
    }

    /// Nothing was written: tell a missing record from a mistyped field.
    async fn rejected(&self, collection: &str, id: &str, field: &str) -> StoreError {
        match self.get(collection, id).await {
            Ok(Some(_)) => StoreError::type_mismatch(collection, id, field),
            Ok(None) => StoreError::not_found(collection, id),
            Err(e) => e,
        }
    }

    async fn update_set(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
        add: bool,
    ) -> StoreResult<SetUpdate> {
        check_field_name(field)?;
        let function = if add { "union" } else { "complement" };
        let mut assignments = format!(
            "doc.{f} = array::{func}(doc.{f} OR [], [$member])",
            f = field,
            func = function
        );
        if let Some(count_field) = count_field {
            check_field_name(count_field)?;
            assignments.push_str(&format!(
                ", doc.{c} = array::len(array::{func}(doc.{f} OR [], [$member]))",
                c = count_field,
                f = field,
                func = function
            ));
        }
        let guard = format!(
            "doc.{f} = NONE OR doc.{f} = NULL OR type::is::array(doc.{f})",
            f = field
        );

        let mut params = serde_json::Map::new();
        params.insert("member".into(), json!(member));
        let Some(before) = self
            .update_existing(collection, id, &assignments, &guard, params)
            .await?
        else {
            return Err(self.rejected(collection, id, field).await);
        };

        let members = before
            .get(field)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let present = members.iter().any(|m| m.as_str() == Some(member));
        let changed = present != add;
        let len = match (changed, add) {
            (false, _) => members.len(),
            (true, true) => members.len() + 1,
            (true, false) => members.len() - 1,
        };
        debug!("Set {}.{} on {} changed={} len={}", collection, field, id, changed, len);

        Ok(SetUpdate { changed, len })
    }
}

#[async_trait]
impl<C: Connection> DocumentStore for SurrealStore<C> {
    async fn ping(&self) -> StoreResult<()> {
        self.db.query("INFO FOR DB").await.map_err(backend)?;
        Ok(())
    }

    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Value>> {
        let rows = self
            .fetch_rows(
                "SELECT doc FROM type::thing($tb, $id)",
                json!({ "tb": collection, "id": id }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.doc))
    }

    async fn create(&self, collection: &str, id: &str, doc: Value) -> StoreResult<bool> {
        // not atomic across the check and the insert
        if self.get(collection, id).await?.is_some() {
            return Ok(false);
        }
        self.fetch_rows(
            "CREATE type::thing($tb, $id) CONTENT { doc: $doc }",
            json!({ "tb": collection, "id": id, "doc": doc }),
        )
        .await?;
        Ok(true)
    }

    async fn put(&self, collection: &str, id: &str, doc: Value) -> StoreResult<()> {
        self.fetch_rows(
            "UPDATE type::thing($tb, $id) CONTENT { doc: $doc }",
            json!({ "tb": collection, "id": id, "doc": doc }),
        )
        .await?;
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> StoreResult<Option<Value>> {
        if !patch.is_object() {
            return Err(StoreError::InvalidQuery("merge patch must be an object".into()));
        }
        // UPDATE on a record id upserts unless guarded
        let rows = self
            .fetch_rows(
                "UPDATE type::thing($tb, $id) MERGE { doc: $patch } WHERE doc != NONE RETURN AFTER",
                json!({ "tb": collection, "id": id, "patch": patch }),
            )
            .await?;
        Ok(rows.into_iter().next().map(|row| row.doc))
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        let rows = self
            .fetch_rows(
                "DELETE type::thing($tb, $id) RETURN BEFORE",
                json!({ "tb": collection, "id": id }),
            )
            .await?;
        Ok(!rows.is_empty())
    }

    async fn query(&self, collection: &str, query: &Query) -> StoreResult<Vec<Value>> {
        query.validate()?;

        let mut sql = String::from("SELECT doc FROM type::table($tb)");
        let mut params = serde_json::Map::new();
        params.insert("tb".into(), json!(collection));

        for (i, filter) in query.filters.iter().enumerate() {
            sql.push_str(if i == 0 { " WHERE " } else { " AND " });
            let param = format!("p{}", i);
            match filter {
                Filter::Eq(field, value) => {
                    sql.push_str(&format!("doc.{} = ${}", field, param));
                    params.insert(param, value.clone());
                }
                Filter::In(field, values) => {
                    sql.push_str(&format!("doc.{} INSIDE ${}", field, param));
                    params.insert(param, Value::Array(values.clone()));
                }
            }
        }
        if let Some((field, direction)) = &query.order_by {
            let dir = match direction {
                Direction::Asc => "ASC",
                Direction::Desc => "DESC",
            };
            sql.push_str(&format!(" ORDER BY doc.{} {}", field, dir));
        }
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        let rows = self.fetch_rows(&sql, Value::Object(params)).await?;
        Ok(rows.into_iter().map(|row| row.doc).collect())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
        floor: Option<i64>,
    ) -> StoreResult<CounterUpdate> {
        check_field_name(field)?;
        let assignments = match floor {
            Some(_) => format!("doc.{f} = math::max([(doc.{f} OR 0) + $delta, $floor])", f = field),
            None => format!("doc.{f} = (doc.{f} OR 0) + $delta", f = field),
        };
        let guard = format!(
            "doc.{f} = NONE OR doc.{f} = NULL OR type::is::int(doc.{f})",
            f = field
        );

        let mut params = serde_json::Map::new();
        params.insert("delta".into(), json!(delta));
        params.insert("floor".into(), json!(floor.unwrap_or(0)));
        let Some(before) = self
            .update_existing(collection, id, &assignments, &guard, params)
            .await?
        else {
            return Err(self.rejected(collection, id, field).await);
        };

        // same arithmetic the statement applied to this exact snapshot
        let before = before.get(field).and_then(Value::as_i64).unwrap_or(0);
        let after = match floor {
            Some(floor) => (before + delta).max(floor),
            None => before + delta,
        };
        Ok(CounterUpdate { before, after })
    }

    async fn set_add(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        self.update_set(collection, id, field, member, count_field, true).await
    }

    async fn set_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        member: &str,
        count_field: Option<&str>,
    ) -> StoreResult<SetUpdate> {
        self.update_set(collection, id, field, member, count_field, false).await
    }
}

#[cfg(all(test, feature = "surrealdb-mem"))]
mod tests {
    use super::*;
    use surrealdb::engine::local::{Db, Mem};

    async fn store() -> SurrealStore<Db> {
        let db = Surreal::new::<Mem>(()).await.unwrap();
        db.use_ns("test").use_db("test").await.unwrap();
        SurrealStore::with_client(db)
    }

    #[tokio::test]
    async fn test_counter_write_never_recreates_deleted_record() {
        let store = store().await;
        store.put("posts", "p1", json!({ "like_count": 0 })).await.unwrap();
        store.delete("posts", "p1").await.unwrap();

        let result = store.increment("posts", "p1", "like_count", 1, Some(0)).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        let result = store.set_add("posts", "p1", "followers", "u1", Some("follower_count")).await;
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
        assert!(store.merge("posts", "p1", json!({ "title": "x" })).await.unwrap().is_none());
        assert!(store.get("posts", "p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_updates_report_from_a_single_snapshot() {
        let store = store().await;
        store.put("users", "b", json!({ "name": "Bob" })).await.unwrap();

        let first = store.set_add("users", "b", "followers", "a", Some("follower_count")).await.unwrap();
        let again = store.set_add("users", "b", "followers", "a", Some("follower_count")).await.unwrap();
        assert_eq!(first, SetUpdate { changed: true, len: 1 });
        assert_eq!(again, SetUpdate { changed: false, len: 1 });

        let removed = store.set_remove("users", "b", "followers", "a", Some("follower_count")).await.unwrap();
        assert_eq!(removed, SetUpdate { changed: true, len: 0 });
        assert_eq!(store.get("users", "b").await.unwrap().unwrap()["follower_count"], 0);

        let update = store.increment("users", "b", "follower_count", -1, Some(0)).await.unwrap();
        assert_eq!(update, CounterUpdate { before: 0, after: 0 });
        assert!(update.was_clamped(-1));

        let result = store.increment("users", "b", "name", 1, None).await;
        assert!(matches!(result, Err(StoreError::TypeMismatch { .. })));
    }
}

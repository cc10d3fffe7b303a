//! An in-memory [`DataSource`] with just enough filter semantics.
//!
//! Supports equality predicates plus `AND`/`OR` combinators, which is
//! exactly the shape the guard produces. The source applies filters as
//! given and knows nothing about tenancy; isolation observed through it is
//! entirely the guard's doing.

use aegis_guard::{DataAction, DataOperation, DataSource, GuardError, GuardResult, QueryResult};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

/// In-memory table store keyed by model name.
#[derive(Debug, Default)]
pub struct MemoryDataSource {
    tables: Mutex<HashMap<String, Vec<Value>>>,
}

impl MemoryDataSource {
    /// Create an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert raw rows directly, bypassing the guard. For arranging
    /// cross-tenant fixtures.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    pub fn seed(&self, model: impl Into<String>, rows: Vec<Value>) {
        self.tables
            .lock()
            .expect("table lock poisoned")
            .entry(model.into())
            .or_default()
            .extend(rows);
    }

    /// Snapshot of a model's rows as stored.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn rows(&self, model: &str) -> Vec<Value> {
        self.tables
            .lock()
            .expect("table lock poisoned")
            .get(model)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl DataSource for MemoryDataSource {
    async fn execute(&self, op: &DataOperation) -> GuardResult<QueryResult> {
        let mut tables = self.tables.lock().expect("table lock poisoned");
        let table = tables.entry(op.model.clone()).or_default();
        let filter = op.args.filter.as_ref();

        match op.action {
            DataAction::FindUnique => {
                let row = table.iter().find(|row| matches(row, filter)).cloned();
                Ok(QueryResult::with_rows(row.into_iter().collect()))
            }
            DataAction::FindMany => {
                let rows: Vec<Value> = table
                    .iter()
                    .filter(|row| matches(row, filter))
                    .cloned()
                    .collect();
                Ok(QueryResult::with_rows(rows))
            }
            DataAction::Count | DataAction::Aggregate => {
                let count = table.iter().filter(|row| matches(row, filter)).count();
                Ok(QueryResult::with_affected(count as u64))
            }
            DataAction::Create => {
                let row = op.args.data.clone().ok_or_else(|| GuardError::InvalidArgs {
                    reason: "create requires data".into(),
                })?;
                table.push(row.clone());
                Ok(QueryResult::with_rows(vec![row]))
            }
            DataAction::CreateMany => {
                let data = op.args.data.clone().ok_or_else(|| GuardError::InvalidArgs {
                    reason: "create_many requires data".into(),
                })?;
                let Value::Array(items) = data else {
                    return Err(GuardError::InvalidArgs {
                        reason: "create_many data must be an array".into(),
                    });
                };
                let count = items.len() as u64;
                table.extend(items);
                Ok(QueryResult::with_affected(count))
            }
            DataAction::Update => {
                let patch = op.args.data.as_ref().ok_or_else(|| GuardError::InvalidArgs {
                    reason: "update requires data".into(),
                })?;
                match table.iter_mut().find(|row| matches(row, filter)) {
                    Some(row) => {
                        merge(row, patch);
                        Ok(QueryResult::with_affected(1))
                    }
                    None => Ok(QueryResult::empty()),
                }
            }
            DataAction::UpdateMany => {
                let patch = op.args.data.as_ref().ok_or_else(|| GuardError::InvalidArgs {
                    reason: "update_many requires data".into(),
                })?;
                let mut affected: u64 = 0;
                for row in table.iter_mut().filter(|row| matches(row, filter)) {
                    merge(row, patch);
                    affected = affected.saturating_add(1);
                }
                Ok(QueryResult::with_affected(affected))
            }
            DataAction::Upsert => {
                if let Some(row) = table.iter_mut().find(|row| matches(row, filter)) {
                    if let Some(update) = op.args.update.as_ref() {
                        merge(row, update);
                    }
                    Ok(QueryResult::with_affected(1))
                } else {
                    let row = op.args.create.clone().ok_or_else(|| {
                        GuardError::InvalidArgs {
                            reason: "upsert requires a create branch".into(),
                        }
                    })?;
                    table.push(row.clone());
                    Ok(QueryResult::with_rows(vec![row]))
                }
            }
            DataAction::Delete => {
                match table.iter().position(|row| matches(row, filter)) {
                    Some(pos) => {
                        table.remove(pos);
                        Ok(QueryResult::with_affected(1))
                    }
                    None => Ok(QueryResult::empty()),
                }
            }
            DataAction::DeleteMany => {
                let before = table.len();
                table.retain(|row| !matches(row, filter));
                let removed = before.saturating_sub(table.len());
                Ok(QueryResult::with_affected(removed as u64))
            }
        }
    }
}

/// Does `row` satisfy `filter`?
///
/// An absent filter matches everything. Object filters are conjunctions of
/// field equality checks, with `AND`/`OR` keys treated as combinators over
/// sub-filters.
fn matches(row: &Value, filter: Option<&Value>) -> bool {
    let Some(filter) = filter else { return true };
    let Some(predicates) = filter.as_object() else {
        return false;
    };
    predicates.iter().all(|(key, expected)| match key.as_str() {
        "AND" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().all(|sub| matches(row, Some(sub)))),
        "OR" => expected
            .as_array()
            .is_some_and(|subs| subs.iter().any(|sub| matches(row, Some(sub)))),
        field => row.get(field) == Some(expected),
    })
}

/// Shallow-merge `patch` object fields into `row`.
fn merge(row: &mut Value, patch: &Value) {
    if let (Some(row), Some(patch)) = (row.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            row.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn filters_combine_with_and_or() {
        let source = MemoryDataSource::new();
        source.seed(
            "Client",
            vec![
                json!({"id": "c1", "tenant_id": "org_A", "status": "active"}),
                json!({"id": "c2", "tenant_id": "org_A", "status": "archived"}),
                json!({"id": "c3", "tenant_id": "org_B", "status": "active"}),
            ],
        );

        let op = DataOperation::new("Client", DataAction::FindMany).with_filter(json!({
            "AND": [{"status": "active"}, {"tenant_id": "org_A"}]
        }));
        let result = source.execute(&op).await.unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0]["id"], json!("c1"));

        let op = DataOperation::new("Client", DataAction::FindMany).with_filter(json!({
            "OR": [{"id": "c1"}, {"id": "c3"}]
        }));
        assert_eq!(source.execute(&op).await.unwrap().rows.len(), 2);
    }

    #[tokio::test]
    async fn update_merges_matching_rows() {
        let source = MemoryDataSource::new();
        source.seed("Client", vec![json!({"id": "c1", "status": "active"})]);

        let op = DataOperation::new("Client", DataAction::Update)
            .with_filter(json!({"id": "c1"}))
            .with_data(json!({"status": "archived"}));
        assert_eq!(source.execute(&op).await.unwrap().affected, 1);
        assert_eq!(source.rows("Client")[0]["status"], json!("archived"));
    }

    #[tokio::test]
    async fn upsert_creates_then_updates() {
        let source = MemoryDataSource::new();
        let op = DataOperation::new("Client", DataAction::Upsert)
            .with_filter(json!({"id": "c1"}))
            .with_create(json!({"id": "c1", "status": "new"}))
            .with_update(json!({"status": "seen"}));

        source.execute(&op).await.unwrap();
        assert_eq!(source.rows("Client")[0]["status"], json!("new"));

        source.execute(&op).await.unwrap();
        assert_eq!(source.rows("Client").len(), 1);
        assert_eq!(source.rows("Client")[0]["status"], json!("seen"));
    }

    #[tokio::test]
    async fn delete_many_removes_matches_only() {
        let source = MemoryDataSource::new();
        source.seed(
            "Client",
            vec![
                json!({"id": "c1", "tenant_id": "org_A"}),
                json!({"id": "c2", "tenant_id": "org_B"}),
            ],
        );
        let op = DataOperation::new("Client", DataAction::DeleteMany)
            .with_filter(json!({"tenant_id": "org_A"}));
        assert_eq!(source.execute(&op).await.unwrap().affected, 1);
        assert_eq!(source.rows("Client").len(), 1);
        assert_eq!(source.rows("Client")[0]["id"], json!("c2"));
    }
}

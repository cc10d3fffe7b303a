//! The intercepted operation shape.
//!
//! One [`DataOperation`] describes one call into the external data-access
//! layer. The action set is a closed enum with exhaustive handling in the
//! middleware, so a new operation kind is a compile-time gap rather than a
//! silently unhandled runtime branch.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Every operation shape the data-access layer exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataAction {
    /// Point read of a single record.
    FindUnique,
    /// Batch read.
    FindMany,
    /// Row count.
    Count,
    /// Aggregation over matching rows.
    Aggregate,
    /// Single create.
    Create,
    /// Batch create.
    CreateMany,
    /// Single update by match filter.
    Update,
    /// Batch update by match filter.
    UpdateMany,
    /// Update-or-create.
    Upsert,
    /// Single delete by match filter.
    Delete,
    /// Batch delete by match filter.
    DeleteMany,
}

impl DataAction {
    /// Whether this action returns rows.
    #[must_use]
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Self::FindUnique | Self::FindMany | Self::Count | Self::Aggregate
        )
    }

    /// Whether this action writes.
    #[must_use]
    pub fn is_mutation(self) -> bool {
        !self.is_read()
    }

    /// Stable lowercase label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::FindUnique => "find_unique",
            Self::FindMany => "find_many",
            Self::Count => "count",
            Self::Aggregate => "aggregate",
            Self::Create => "create",
            Self::CreateMany => "create_many",
            Self::Update => "update",
            Self::UpdateMany => "update_many",
            Self::Upsert => "upsert",
            Self::Delete => "delete",
            Self::DeleteMany => "delete_many",
        }
    }
}

impl fmt::Display for DataAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// JSON-shaped arguments of an intercepted operation.
///
/// `filter` matches rows; `data` is the create/update payload; `create`
/// and `update` are the two branches of an upsert.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationArgs {
    /// Row match filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    /// Create/update payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Upsert create branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub create: Option<Value>,
    /// Upsert update branch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update: Option<Value>,
}

/// One intercepted data-access call. Mutated in place by the guard before
/// it reaches the data source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataOperation {
    /// Entity type the operation targets.
    pub model: String,
    /// Operation kind.
    pub action: DataAction,
    /// Operation arguments.
    pub args: OperationArgs,
}

impl DataOperation {
    /// Create an operation with empty args.
    #[must_use]
    pub fn new(model: impl Into<String>, action: DataAction) -> Self {
        Self {
            model: model.into(),
            action,
            args: OperationArgs::default(),
        }
    }

    /// Set the match filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Value) -> Self {
        self.args.filter = Some(filter);
        self
    }

    /// Set the payload.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.args.data = Some(data);
        self
    }

    /// Set the upsert create branch.
    #[must_use]
    pub fn with_create(mut self, create: Value) -> Self {
        self.args.create = Some(create);
        self
    }

    /// Set the upsert update branch.
    #[must_use]
    pub fn with_update(mut self, update: Value) -> Self {
        self.args.update = Some(update);
        self
    }
}

/// What came back from the data source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    /// Returned rows (reads). Empty for counts and mutations.
    pub rows: Vec<Value>,
    /// Affected/matched row count (mutations and counts).
    pub affected: u64,
}

impl QueryResult {
    /// A result carrying rows.
    #[must_use]
    pub fn with_rows(rows: Vec<Value>) -> Self {
        let affected = rows.len() as u64;
        Self { rows, affected }
    }

    /// A rowless result carrying only a count.
    #[must_use]
    pub fn with_affected(affected: u64) -> Self {
        Self {
            rows: Vec::new(),
            affected,
        }
    }

    /// An empty "not found / no-op" result.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

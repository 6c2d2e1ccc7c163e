//! Remote store contract.
//!
//! The ledger talks to its source of truth through [`RemoteStore`]: plain
//! row operations on a closed set of [`Table`]s plus named procedures.
//! Rows are JSON objects; they are typed only once they cross back into the
//! ledger.

use async_trait::async_trait;
use sea_orm::DbErr;
use serde_json::Value;
use thiserror::Error;

pub use sql::SqlStore;

mod sql;

/// One row, keyed by column name.
pub type Row = serde_json::Map<String, Value>;

/// Name of the invite preview procedure.
pub const FAMILY_PREVIEW_PROCEDURE: &str = "get_family_preview";

/// Remote store custom errors.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Database(#[from] DbErr),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Unknown column \"{column}\" in {table}")]
    UnknownColumn { table: &'static str, column: String },
    #[error("Unknown procedure \"{0}\"")]
    UnknownProcedure(String),
    #[error("Invalid query: {0}")]
    Query(String),
    #[error(transparent)]
    Encode(#[from] serde_json::Error),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Table {
    Profiles,
    Families,
    FamilyMembers,
    Transactions,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Self::Profiles => "profiles",
            Self::Families => "families",
            Self::FamilyMembers => "family_members",
            Self::Transactions => "transactions",
        }
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Profiles => &["id", "display_name", "email"],
            Self::Families => &["id", "name", "invite_code", "created_by"],
            Self::FamilyMembers => &["family_id", "profile_id", "role"],
            Self::Transactions => &[
                "id",
                "description",
                "amount_minor",
                "date",
                "status",
                "category",
                "paid_by",
                "recurrence_id",
                "family_id",
                "profile_id",
            ],
        }
    }

    pub fn primary_key(self) -> &'static [&'static str] {
        match self {
            Self::FamilyMembers => &["family_id", "profile_id"],
            _ => &["id"],
        }
    }

    /// Whether the store assigns `id` when an inserted row has none.
    pub fn generates_id(self) -> bool {
        matches!(self.primary_key(), ["id"])
    }

    pub fn check_column(self, column: &str) -> Result<(), StoreError> {
        if self.columns().contains(&column) {
            return Ok(());
        }
        Err(StoreError::UnknownColumn {
            table: self.name(),
            column: column.to_string(),
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Eq(String, Value),
    In(String, Vec<Value>),
}

impl Condition {
    pub fn column(&self) -> &str {
        match self {
            Self::Eq(column, _) | Self::In(column, _) => column,
        }
    }
}

/// A conjunction of column conditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
    conditions: Vec<Condition>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn eq(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .push(Condition::Eq(column.to_string(), value.into()));
        self
    }

    #[must_use]
    pub fn is_in<V: Into<Value>>(mut self, column: &str, values: impl IntoIterator<Item = V>) -> Self {
        self.conditions.push(Condition::In(
            column.to_string(),
            values.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Sort keys, applied in order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Order {
    keys: Vec<(String, bool)>,
}

impl Order {
    pub fn asc(column: &str) -> Self {
        Self {
            keys: vec![(column.to_string(), true)],
        }
    }

    #[must_use]
    pub fn then_asc(mut self, column: &str) -> Self {
        self.keys.push((column.to_string(), true));
        self
    }

    /// `(column, ascending)` pairs.
    pub fn keys(&self) -> &[(String, bool)] {
        &self.keys
    }
}

/// The operations the ledger needs from its source of truth.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError>;

    /// Inserts a row and returns it as stored, server-filled fields included.
    async fn insert(&self, table: Table, row: Row) -> Result<Row, StoreError>;

    /// Applies `patch` to every matching row; returns the number of rows.
    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> Result<u64, StoreError>;

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError>;

    async fn call(&self, procedure: &str, args: Value) -> Result<Value, StoreError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn filter_keeps_conditions_in_order() {
        let filter = Filter::new()
            .eq("family_id", "f1")
            .eq("paid_by", Value::Null)
            .is_in("id", ["a", "b"]);
        assert_eq!(
            filter.conditions(),
            [
                Condition::Eq("family_id".to_string(), json!("f1")),
                Condition::Eq("paid_by".to_string(), Value::Null),
                Condition::In("id".to_string(), vec![json!("a"), json!("b")]),
            ]
        );
        assert!(Filter::new().is_empty());
        assert_eq!(Order::asc("date").then_asc("id").keys().len(), 2);
    }

    #[test]
    fn tables_reject_unknown_columns() {
        assert!(Table::Transactions.check_column("amount_minor").is_ok());
        assert!(matches!(
            Table::Families.check_column("amount_minor"),
            Err(StoreError::UnknownColumn { table: "families", .. })
        ));
        assert!(Table::Transactions.generates_id());
        assert!(!Table::FamilyMembers.generates_id());
    }
}

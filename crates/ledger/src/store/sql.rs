//! [`RemoteStore`] over a sea-orm connection.
//!
//! Statements are built with sea-query against the [`Table`] column lists, so
//! no caller-supplied identifier reaches SQL unchecked. Result rows are read
//! back as JSON objects.

use async_trait::async_trait;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbErr, FromQueryResult, SqlErr,
    sea_query::{
        Alias, Asterisk, Expr, Order as SqlOrder, Query, SimpleExpr,
    },
};
use serde_json::{Value, json};
use uuid::Uuid;

use super::{Condition, FAMILY_PREVIEW_PROCEDURE, Filter, Order, RemoteStore, Row, StoreError, Table};

/// SQL-backed store. Run the `migration` crate against the connection first.
#[derive(Clone, Debug)]
pub struct SqlStore {
    database: DatabaseConnection,
}

impl SqlStore {
    pub fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn query_rows(&self, stmt: sea_orm::Statement) -> Result<Vec<Row>, StoreError> {
        let values = Value::find_by_statement(stmt)
            .all(&self.database)
            .await
            .map_err(map_db_err)?;
        values.into_iter().map(into_row).collect()
    }

    async fn family_preview(&self, args: &Value) -> Result<Value, StoreError> {
        let code = args
            .get("invite_code")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Query("missing invite_code".to_string()))?;

        let families = self
            .select(
                Table::Families,
                &Filter::new().eq("invite_code", code),
                None,
            )
            .await?;
        let Some(family) = families.into_iter().next() else {
            return Ok(Value::Null);
        };
        let family_id = family.get("id").cloned().unwrap_or(Value::Null);

        let memberships = self
            .select(
                Table::FamilyMembers,
                &Filter::new().eq("family_id", family_id.clone()),
                Some(&Order::asc("profile_id")),
            )
            .await?;
        let profile_ids: Vec<Value> = memberships
            .iter()
            .filter_map(|m| m.get("profile_id").cloned())
            .collect();
        let profiles = self
            .select(
                Table::Profiles,
                &Filter::new().is_in("id", profile_ids.clone()),
                None,
            )
            .await?;

        let members: Vec<Value> = profile_ids
            .iter()
            .map(|id| {
                let name = profiles
                    .iter()
                    .find(|p| p.get("id") == Some(id))
                    .and_then(|p| p.get("display_name"))
                    .and_then(Value::as_str)
                    .filter(|name| !name.trim().is_empty())
                    .unwrap_or("Usuário");
                json!({ "name": name })
            })
            .collect();

        Ok(json!({
            "id": family_id,
            "name": family.get("name").cloned().unwrap_or(Value::Null),
            "members": members,
        }))
    }
}

#[async_trait]
impl RemoteStore for SqlStore {
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: Option<&Order>,
    ) -> Result<Vec<Row>, StoreError> {
        tracing::debug!(table = table.name(), ?filter, "select");
        let mut query = Query::select();
        query.column(Asterisk).from(Alias::new(table.name()));
        for expr in condition_exprs(table, filter)? {
            query.and_where(expr);
        }
        if let Some(order) = order {
            for (column, ascending) in order.keys() {
                table.check_column(column)?;
                let direction = if *ascending {
                    SqlOrder::Asc
                } else {
                    SqlOrder::Desc
                };
                query.order_by(Alias::new(column.as_str()), direction);
            }
        }
        let stmt = self.database.get_database_backend().build(&query);
        self.query_rows(stmt).await
    }

    async fn insert(&self, table: Table, mut row: Row) -> Result<Row, StoreError> {
        tracing::debug!(table = table.name(), "insert");
        if table.generates_id() && !row.contains_key("id") {
            row.insert("id".to_string(), Uuid::new_v4().to_string().into());
        }

        let mut columns = Vec::with_capacity(row.len());
        let mut values = Vec::with_capacity(row.len());
        for (column, value) in &row {
            table.check_column(column)?;
            columns.push(Alias::new(column.as_str()));
            values.push(SimpleExpr::from(to_sql_value(value)?));
        }

        let mut query = Query::insert();
        query
            .into_table(Alias::new(table.name()))
            .columns(columns)
            .values(values)
            .map_err(|err| StoreError::Query(err.to_string()))?;
        let stmt = self.database.get_database_backend().build(&query);
        self.database.execute(stmt).await.map_err(map_db_err)?;

        let mut key = Filter::new();
        for column in table.primary_key() {
            let value = row
                .get(*column)
                .cloned()
                .ok_or_else(|| StoreError::Query(format!("missing key column {column}")))?;
            key = key.eq(column, value);
        }
        self.select(table, &key, None)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Rejected(format!("{} row not readable", table.name())))
    }

    async fn update(&self, table: Table, filter: &Filter, patch: Row) -> Result<u64, StoreError> {
        tracing::debug!(table = table.name(), ?filter, "update");
        if filter.is_empty() {
            return Err(StoreError::Query("refusing unfiltered update".to_string()));
        }
        if patch.is_empty() {
            return Ok(0);
        }

        let mut assignments = Vec::with_capacity(patch.len());
        for (column, value) in &patch {
            table.check_column(column)?;
            assignments.push((
                Alias::new(column.as_str()),
                SimpleExpr::from(to_sql_value(value)?),
            ));
        }

        let mut query = Query::update();
        query.table(Alias::new(table.name())).values(assignments);
        for expr in condition_exprs(table, filter)? {
            query.and_where(expr);
        }
        let stmt = self.database.get_database_backend().build(&query);
        let result = self.database.execute(stmt).await.map_err(map_db_err)?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, table: Table, filter: &Filter) -> Result<u64, StoreError> {
        tracing::debug!(table = table.name(), ?filter, "delete");
        if filter.is_empty() {
            return Err(StoreError::Query("refusing unfiltered delete".to_string()));
        }

        let mut query = Query::delete();
        query.from_table(Alias::new(table.name()));
        for expr in condition_exprs(table, filter)? {
            query.and_where(expr);
        }
        let stmt = self.database.get_database_backend().build(&query);
        let result = self.database.execute(stmt).await.map_err(map_db_err)?;
        Ok(result.rows_affected())
    }

    async fn call(&self, procedure: &str, args: Value) -> Result<Value, StoreError> {
        tracing::debug!(procedure, "call");
        match procedure {
            FAMILY_PREVIEW_PROCEDURE => self.family_preview(&args).await,
            other => Err(StoreError::UnknownProcedure(other.to_string())),
        }
    }
}

fn condition_exprs(table: Table, filter: &Filter) -> Result<Vec<SimpleExpr>, StoreError> {
    filter
        .conditions()
        .iter()
        .map(|condition| {
            table.check_column(condition.column())?;
            let column = Expr::col(Alias::new(condition.column()));
            Ok(match condition {
                Condition::Eq(_, Value::Null) => column.is_null(),
                Condition::Eq(_, value) => column.eq(to_sql_value(value)?),
                Condition::In(_, values) => column.is_in(
                    values
                        .iter()
                        .map(to_sql_value)
                        .collect::<Result<Vec<_>, _>>()?,
                ),
            })
        })
        .collect()
}

fn to_sql_value(value: &Value) -> Result<sea_orm::Value, StoreError> {
    match value {
        Value::Null => Ok(sea_orm::Value::String(None)),
        Value::Bool(b) => Ok((*b).into()),
        Value::Number(n) => n
            .as_i64()
            .map(sea_orm::Value::from)
            .or_else(|| n.as_f64().map(sea_orm::Value::from))
            .ok_or_else(|| StoreError::Query(format!("unsupported number {n}"))),
        Value::String(s) => Ok(s.clone().into()),
        Value::Array(_) | Value::Object(_) => {
            Err(StoreError::Query("nested values are not supported".to_string()))
        }
    }
}

fn into_row(value: Value) -> Result<Row, StoreError> {
    match value {
        Value::Object(row) => Ok(row),
        other => Err(StoreError::Query(format!("expected a row, got {other}"))),
    }
}

fn map_db_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(msg)) => StoreError::Conflict(msg),
        Some(SqlErr::ForeignKeyConstraintViolation(msg)) => StoreError::Rejected(msg),
        _ => StoreError::Database(err),
    }
}

//! Boundary between untyped store rows and the ledger's types.
//!
//! Every row is checked here before it can reach the snapshot, so the
//! aggregator never sees a missing or mistyped field.

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{LedgerError, ResultLedger, Row, StoreError, Table};

pub(crate) fn to_row<T: Serialize>(value: &T) -> ResultLedger<Row> {
    match serde_json::to_value(value).map_err(StoreError::from)? {
        Value::Object(row) => Ok(row),
        other => Err(LedgerError::InvalidRow {
            table: "<encode>",
            reason: format!("expected an object, got {other}"),
        }),
    }
}

pub(crate) fn from_row<T: DeserializeOwned>(table: Table, row: &Row) -> ResultLedger<T> {
    serde_json::from_value(Value::Object(row.clone())).map_err(|err| LedgerError::InvalidRow {
        table: table.name(),
        reason: err.to_string(),
    })
}

/// Decodes every row, dropping (and logging) the ones that do not validate.
pub(crate) fn admit<T: DeserializeOwned>(table: Table, rows: &[Row]) -> Vec<T> {
    rows.iter()
        .filter_map(|row| match from_row(table, row) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::warn!(
                    table = table.name(),
                    id = row.get("id").and_then(|v| v.as_str()).unwrap_or("?"),
                    "quarantined row: {err}"
                );
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::Transaction;

    fn obj(value: Value) -> Row {
        match value {
            Value::Object(row) => row,
            _ => unreachable!(),
        }
    }

    #[test]
    fn malformed_rows_are_dropped() {
        let rows = vec![
            obj(json!({
                "id": "a", "description": "Luz", "amount_minor": -100,
                "date": "2024-01-05", "status": "paid", "family_id": "f"
            })),
            obj(json!({ "id": "b", "description": "no amount", "date": "2024-01-05" })),
            obj(json!({
                "id": "c", "description": "bad status", "amount_minor": -100,
                "date": "2024-01-05", "status": "later", "family_id": "f"
            })),
        ];
        let admitted: Vec<Transaction> = admit(Table::Transactions, &rows);
        assert_eq!(admitted.len(), 1);
        assert_eq!(admitted[0].id, "a");
    }

    #[test]
    fn mistyped_family_row_is_invalid() {
        let row = obj(json!({ "id": 3, "name": "Casa", "invite_code": "ABC123" }));
        let err = from_row::<crate::Family>(Table::Families, &row).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidRow { table: "families", .. }));
    }
}

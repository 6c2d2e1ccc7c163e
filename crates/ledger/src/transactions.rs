//! Transaction primitives.
//!
//! A [`Transaction`] is one planned (`pending`) or realized (`paid`) money
//! movement of a family. Amounts are signed: expenses are negative.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{FALLBACK_CATEGORY, LedgerError, Money, ResultLedger, Row, rows};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Paid,
    Pending,
}

impl TransactionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Pending => "pending",
        }
    }

    /// The status a quick toggle moves to.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Paid => Self::Pending,
            Self::Pending => Self::Paid,
        }
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "paid" => Ok(Self::Paid),
            "pending" => Ok(Self::Pending),
            other => Err(LedgerError::Validation(format!(
                "invalid transaction status: {other}"
            ))),
        }
    }
}

/// A transaction as admitted into the snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub description: String,
    #[serde(rename = "amount_minor")]
    pub amount: Money,
    pub date: NaiveDate,
    pub status: TransactionStatus,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub paid_by: Option<String>,
    #[serde(default)]
    pub recurrence_id: Option<String>,
    pub family_id: String,
}

impl Transaction {
    /// Category label, with the fallback applied to missing or blank values.
    pub fn category_label(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(FALLBACK_CATEGORY)
    }

    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }
}

/// Fields of a transaction the caller provides; the store assigns the id and
/// the ledger assigns the family.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub description: String,
    #[serde(rename = "amount_minor")]
    pub amount: Money,
    pub date: NaiveDate,
    pub status: TransactionStatus,
    pub category: Option<String>,
    pub paid_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence_id: Option<String>,
}

impl NewTransaction {
    /// Rejects entries that must never reach the store.
    pub(crate) fn validate(&self) -> ResultLedger<()> {
        if self.description.trim().is_empty() {
            return Err(LedgerError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if self.amount.is_zero() {
            return Err(LedgerError::Validation(
                "amount must not be zero".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn into_row(self, family_id: &str, profile_id: &str) -> ResultLedger<Row> {
        let mut row = rows::to_row(&Self {
            description: self.description.trim().to_string(),
            ..self
        })?;
        row.insert("family_id".to_string(), family_id.into());
        row.insert("profile_id".to_string(), profile_id.into());
        Ok(row)
    }
}

/// A partial update. `None` leaves a field untouched; `Some(None)` on
/// `category` or `paid_by` clears it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TransactionPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "amount_minor", skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TransactionStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<Option<String>>,
}

impl TransactionPatch {
    pub fn status(status: TransactionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub(crate) fn validate(&self) -> ResultLedger<()> {
        if let Some(description) = &self.description
            && description.trim().is_empty()
        {
            return Err(LedgerError::Validation(
                "description must not be empty".to_string(),
            ));
        }
        if let Some(amount) = self.amount
            && amount.is_zero()
        {
            return Err(LedgerError::Validation(
                "amount must not be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the patch to a local copy.
    pub(crate) fn apply(&self, tx: &mut Transaction) {
        if let Some(description) = &self.description {
            tx.description = description.trim().to_string();
        }
        if let Some(amount) = self.amount {
            tx.amount = amount;
        }
        if let Some(date) = self.date {
            tx.date = date;
        }
        if let Some(status) = self.status {
            tx.status = status;
        }
        if let Some(category) = &self.category {
            tx.category = category.clone();
        }
        if let Some(paid_by) = &self.paid_by {
            tx.paid_by = paid_by.clone();
        }
    }

    pub(crate) fn to_row(&self) -> ResultLedger<Row> {
        let mut row = rows::to_row(self)?;
        if let Some(description) = &self.description {
            row.insert(
                "description".to_string(),
                description.trim().to_string().into(),
            );
        }
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction {
            id: "t1".to_string(),
            description: "Mercado".to_string(),
            amount: Money::new(-5000),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            status: TransactionStatus::Pending,
            category: None,
            paid_by: Some("Ana".to_string()),
            recurrence_id: None,
            family_id: "f1".to_string(),
        }
    }

    #[test]
    fn blank_category_uses_fallback() {
        let mut tx = sample();
        assert_eq!(tx.category_label(), FALLBACK_CATEGORY);
        tx.category = Some("  ".to_string());
        assert_eq!(tx.category_label(), FALLBACK_CATEGORY);
        tx.category = Some("Lazer".to_string());
        assert_eq!(tx.category_label(), "Lazer");
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut tx = sample();
        let patch = TransactionPatch {
            status: Some(TransactionStatus::Paid),
            paid_by: Some(None),
            ..TransactionPatch::default()
        };
        patch.apply(&mut tx);
        assert_eq!(tx.status, TransactionStatus::Paid);
        assert_eq!(tx.paid_by, None);
        assert_eq!(tx.description, "Mercado");
        assert_eq!(tx.amount, Money::new(-5000));
    }

    #[test]
    fn patch_row_serializes_cleared_fields_as_null() {
        let patch = TransactionPatch {
            category: Some(None),
            paid_by: Some(None),
            ..TransactionPatch::default()
        };
        let row = patch.to_row().unwrap();
        assert_eq!(row.len(), 2);
        assert!(row["category"].is_null());
        assert!(row["paid_by"].is_null());
    }

    #[test]
    fn cleared_category_falls_back() {
        let mut tx = sample();
        tx.category = Some("Casa".to_string());
        TransactionPatch {
            category: Some(None),
            ..TransactionPatch::default()
        }
        .apply(&mut tx);
        assert_eq!(tx.category, None);
        assert_eq!(tx.category_label(), FALLBACK_CATEGORY);
    }

    #[test]
    fn new_transaction_requires_description_and_amount() {
        let new = NewTransaction {
            description: "  ".to_string(),
            amount: Money::new(-100),
            date: NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
            status: TransactionStatus::Paid,
            category: None,
            paid_by: None,
            recurrence_id: None,
        };
        assert!(matches!(new.validate(), Err(LedgerError::Validation(_))));
        let new = NewTransaction {
            description: "Luz".to_string(),
            amount: Money::ZERO,
            ..new
        };
        assert!(matches!(new.validate(), Err(LedgerError::Validation(_))));
    }

    #[test]
    fn toggle_flips_status() {
        assert_eq!(TransactionStatus::Paid.toggled(), TransactionStatus::Pending);
        assert_eq!(TransactionStatus::Pending.toggled(), TransactionStatus::Paid);
    }
}

use crate::{
    LedgerError, NewTransaction, RecurrenceMode, RemoteStore, ResultLedger, Table, Transaction,
    TransactionPatch, generate_series, rows,
    store::Filter,
};

use super::Ledger;

impl<S: RemoteStore> Ledger<S> {
    /// Persists a new transaction in the active family and reconciles.
    pub async fn add_transaction(&mut self, new: NewTransaction) -> ResultLedger<Transaction> {
        new.validate()?;
        let family_id = self.require_family()?;

        let inserted = self.insert_transaction(new, &family_id).await?;
        self.fetch_snapshot().await?;
        Ok(inserted)
    }

    async fn insert_transaction(
        &self,
        new: NewTransaction,
        family_id: &str,
    ) -> ResultLedger<Transaction> {
        let row = new.into_row(family_id, &self.profile_id)?;
        let stored = self.store.insert(Table::Transactions, row).await?;
        rows::from_row(Table::Transactions, &stored)
    }

    /// Persists every entry of a generated series, then reconciles once.
    ///
    /// Entries are inserted one by one. If an insert fails, the entries of
    /// this series already written are deleted again before the error is
    /// returned.
    pub async fn add_series(&mut self, entries: Vec<NewTransaction>) -> ResultLedger<Vec<Transaction>> {
        for entry in &entries {
            entry.validate()?;
        }
        let family_id = self.require_family()?;

        let mut inserted = Vec::with_capacity(entries.len());
        for entry in entries {
            let recurrence_id = entry.recurrence_id.clone();
            match self.insert_transaction(entry, &family_id).await {
                Ok(tx) => inserted.push(tx),
                Err(err) => {
                    if let Some(recurrence_id) = recurrence_id {
                        self.discard_partial_series(&family_id, &recurrence_id).await;
                    }
                    return Err(err);
                }
            }
        }

        tracing::info!(
            family = %family_id,
            count = inserted.len(),
            "series persisted"
        );
        self.fetch_snapshot().await?;
        Ok(inserted)
    }

    async fn discard_partial_series(&self, family_id: &str, recurrence_id: &str) {
        let filter = Filter::new()
            .eq("family_id", family_id)
            .eq("recurrence_id", recurrence_id);
        if let Err(err) = self.store.delete(Table::Transactions, &filter).await {
            tracing::error!(recurrence_id, "could not discard partial series: {err}");
        }
    }

    /// Creates `seed` as the first entry of a new series.
    pub async fn add_recurring(
        &mut self,
        seed: NewTransaction,
        mode: RecurrenceMode,
    ) -> ResultLedger<Vec<Transaction>> {
        let entries = generate_series(&seed, mode, false)?;
        self.add_series(entries).await
    }

    /// The entry form's save: creates `data` (as a series with `mode`) or,
    /// with `editing`, overwrites that transaction with `data` and schedules
    /// its future copies.
    pub async fn save_with_recurrence(
        &mut self,
        editing: Option<&str>,
        data: NewTransaction,
        mode: Option<RecurrenceMode>,
    ) -> ResultLedger<Vec<Transaction>> {
        match (editing, mode) {
            (Some(id), mode) => {
                let patch = TransactionPatch {
                    description: Some(data.description),
                    amount: Some(data.amount),
                    date: Some(data.date),
                    status: Some(data.status),
                    category: Some(data.category),
                    paid_by: Some(data.paid_by),
                };
                self.edit_transaction(id, patch, mode).await
            }
            (None, Some(mode)) => self.add_recurring(data, mode).await,
            (None, None) => Ok(vec![self.add_transaction(data).await?]),
        }
    }

    /// Saves an edit and, with `mode`, schedules future copies of the edited
    /// entry. The edited original keeps its own identity and is not tagged
    /// with the new series id.
    pub async fn edit_transaction(
        &mut self,
        id: &str,
        patch: TransactionPatch,
        mode: Option<RecurrenceMode>,
    ) -> ResultLedger<Vec<Transaction>> {
        self.update_transaction(id, patch).await?;
        let Some(mode) = mode else {
            return Ok(Vec::new());
        };

        let original = self
            .snapshot
            .transaction(id)
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
        let seed = NewTransaction {
            description: original.description.clone(),
            amount: original.amount,
            date: original.date,
            status: original.status,
            category: original.category.clone(),
            paid_by: original.paid_by.clone(),
            recurrence_id: None,
        };
        let entries = generate_series(&seed, mode, true)?;
        self.add_series(entries).await
    }

    /// Optimistically patches a transaction, then writes and reconciles.
    pub async fn update_transaction(
        &mut self,
        id: &str,
        patch: TransactionPatch,
    ) -> ResultLedger<()> {
        patch.validate()?;
        let family_id = self.require_family()?;
        if self.snapshot.transaction(id).is_none() {
            return Err(LedgerError::NotFound(format!("transaction {id}")));
        }
        if patch.is_empty() {
            return Ok(());
        }
        let row = patch.to_row()?;

        let previous = self.snapshot.clone();
        let local = self
            .snapshot
            .transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
        patch.apply(local);

        let filter = Filter::new().eq("id", id).eq("family_id", family_id.as_str());
        if let Err(err) = self.store.update(Table::Transactions, &filter, row).await {
            return Err(self.rollback(previous, "update_transaction", err));
        }
        self.fetch_snapshot().await?;
        Ok(())
    }

    /// Flips a transaction between paid and pending.
    pub async fn toggle_status(&mut self, id: &str) -> ResultLedger<()> {
        let status = self
            .snapshot
            .transaction(id)
            .map(|t| t.status.toggled())
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))?;
        self.update_transaction(id, TransactionPatch::status(status))
            .await
    }

    pub async fn delete_transaction(&mut self, id: &str) -> ResultLedger<()> {
        let family_id = self.require_family()?;

        let previous = self.snapshot.clone();
        self.snapshot.transactions.retain(|t| t.id != id);

        let filter = Filter::new().eq("id", id).eq("family_id", family_id.as_str());
        if let Err(err) = self.store.delete(Table::Transactions, &filter).await {
            return Err(self.rollback(previous, "delete_transaction", err));
        }
        self.fetch_snapshot().await?;
        Ok(())
    }

    /// Deletes every transaction of a series, paid ones included.
    pub async fn delete_recurrence_series(&mut self, recurrence_id: &str) -> ResultLedger<()> {
        let family_id = self.require_family()?;

        let previous = self.snapshot.clone();
        self.snapshot
            .transactions
            .retain(|t| t.recurrence_id.as_deref() != Some(recurrence_id));

        let filter = Filter::new()
            .eq("recurrence_id", recurrence_id)
            .eq("family_id", family_id.as_str());
        if let Err(err) = self.store.delete(Table::Transactions, &filter).await {
            return Err(self.rollback(previous, "delete_recurrence_series", err));
        }
        self.fetch_snapshot().await?;
        Ok(())
    }
}

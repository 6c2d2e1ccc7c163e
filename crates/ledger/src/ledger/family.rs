use serde_json::json;
use uuid::Uuid;

use crate::{
    Family, FamilyPreview, LedgerError, RemoteStore, ResultLedger, Role, StoreError, Table, rows,
    store::{FAMILY_PREVIEW_PROCEDURE, Filter, Row},
};

use super::Ledger;

const INVITE_CODE_LEN: usize = 6;
const INVITE_CODE_ATTEMPTS: usize = 3;

/// How [`Ledger::join`] proceeds once the code resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JoinMode {
    /// Stop after resolving; the caller confirms with [`Ledger::confirm_join`].
    Preview,
    /// Resolve and join in one step.
    Direct,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JoinOutcome {
    /// Nothing was written yet.
    Previewed(FamilyPreview),
    Joined(FamilyPreview),
}

fn new_invite_code() -> String {
    Uuid::new_v4()
        .simple()
        .to_string()
        .chars()
        .take(INVITE_CODE_LEN)
        .collect::<String>()
        .to_uppercase()
}

fn membership_row(family_id: &str, profile_id: &str, role: Role) -> Row {
    let mut row = Row::new();
    row.insert("family_id".to_string(), family_id.into());
    row.insert("profile_id".to_string(), profile_id.into());
    row.insert("role".to_string(), role.as_str().into());
    row
}

impl<S: RemoteStore> Ledger<S> {
    /// Creates a family with the caller as its admin.
    ///
    /// The family row and the membership row are two separate writes; when
    /// the second fails the family is deleted again.
    pub async fn create_family(&mut self, name: &str) -> ResultLedger<Family> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "family name must not be empty".to_string(),
            ));
        }
        if self.snapshot.has_family() {
            return Err(LedgerError::AlreadyMember);
        }

        let family = self.insert_family(name).await?;

        let row = membership_row(&family.id, &self.profile_id, Role::Admin);
        if let Err(err) = self.store.insert(Table::FamilyMembers, row).await {
            let filter = Filter::new().eq("id", family.id.as_str());
            if let Err(cleanup) = self.store.delete(Table::Families, &filter).await {
                tracing::error!(family = %family.id, "orphaned family left behind: {cleanup}");
            }
            return Err(match err {
                StoreError::Conflict(_) => LedgerError::AlreadyMember,
                other => LedgerError::Remote(other),
            });
        }

        tracing::info!(family = %family.id, profile = %self.profile_id, "family created");
        self.fetch_snapshot().await?;
        Ok(family)
    }

    async fn insert_family(&self, name: &str) -> ResultLedger<Family> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let row = rows::to_row(&json!({
                "name": name,
                "invite_code": new_invite_code(),
                "created_by": self.profile_id,
            }))?;
            match self.store.insert(Table::Families, row).await {
                Ok(stored) => return rows::from_row(Table::Families, &stored),
                Err(StoreError::Conflict(msg)) if attempt < INVITE_CODE_ATTEMPTS => {
                    tracing::debug!(attempt, "invite code collision: {msg}");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Renames the active family. No reconciliation is needed on success.
    pub async fn update_family_name(&mut self, name: &str) -> ResultLedger<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "family name must not be empty".to_string(),
            ));
        }
        let family_id = self.require_family()?;

        let previous = self.snapshot.clone();
        if let Some(family) = self.snapshot.family.as_mut() {
            family.name = name.to_string();
        }

        let mut patch = Row::new();
        patch.insert("name".to_string(), name.into());
        let filter = Filter::new().eq("id", family_id.as_str());
        if let Err(err) = self.store.update(Table::Families, &filter, patch).await {
            return Err(self.rollback(previous, "update_family_name", err));
        }
        Ok(())
    }

    /// Resolves an invite code without writing anything.
    pub async fn preview_by_code(&self, code: &str) -> ResultLedger<FamilyPreview> {
        let code = code.trim();
        if code.is_empty() {
            return Err(LedgerError::Validation(
                "invite code must not be empty".to_string(),
            ));
        }

        let result = self
            .store
            .call(FAMILY_PREVIEW_PROCEDURE, json!({ "invite_code": code }))
            .await?;
        if result.is_null() {
            return Err(LedgerError::InvalidCode(code.to_string()));
        }
        serde_json::from_value(result).map_err(|err| LedgerError::InvalidRow {
            table: "families",
            reason: err.to_string(),
        })
    }

    /// Joins `family_id` as a plain member and reconciles.
    pub async fn confirm_join(&mut self, family_id: &str) -> ResultLedger<()> {
        if self.snapshot.has_family() {
            return Err(LedgerError::AlreadyMember);
        }

        let row = membership_row(family_id, &self.profile_id, Role::Member);
        match self.store.insert(Table::FamilyMembers, row).await {
            Ok(_) => {}
            Err(StoreError::Conflict(_)) => return Err(LedgerError::AlreadyMember),
            Err(StoreError::Rejected(msg)) => return Err(LedgerError::Join(msg)),
            Err(err) => return Err(err.into()),
        }

        tracing::info!(family = %family_id, profile = %self.profile_id, "joined family");
        self.fetch_snapshot().await?;
        Ok(())
    }

    /// The join protocol: resolve the code, then either stop at the preview
    /// or confirm right away.
    pub async fn join(&mut self, code: &str, mode: JoinMode) -> ResultLedger<JoinOutcome> {
        let preview = self.preview_by_code(code).await?;
        match mode {
            JoinMode::Preview => Ok(JoinOutcome::Previewed(preview)),
            JoinMode::Direct => {
                self.confirm_join(&preview.id).await?;
                Ok(JoinOutcome::Joined(preview))
            }
        }
    }

    /// Joins without a preview step.
    pub async fn join_by_code(&mut self, code: &str) -> ResultLedger<FamilyPreview> {
        match self.join(code, JoinMode::Direct).await? {
            JoinOutcome::Joined(preview) | JoinOutcome::Previewed(preview) => Ok(preview),
        }
    }

    /// Removes the caller's own membership.
    ///
    /// Allowed even for the last admin, which leaves the family without one.
    pub async fn leave_family(&mut self) -> ResultLedger<()> {
        let family_id = self.require_family()?;

        let admins = self
            .snapshot
            .members
            .iter()
            .filter(|m| m.role == Role::Admin && m.profile_id != self.profile_id)
            .count();
        if self.snapshot.role == Some(Role::Admin) && admins == 0 {
            tracing::warn!(family = %family_id, "last admin is leaving the family");
        }

        let filter = Filter::new()
            .eq("family_id", family_id.as_str())
            .eq("profile_id", self.profile_id.as_str());
        self.store.delete(Table::FamilyMembers, &filter).await?;

        tracing::info!(family = %family_id, profile = %self.profile_id, "left family");
        self.fetch_snapshot().await?;
        Ok(())
    }

    /// Removes another member (admin only). Removing yourself is rejected;
    /// use [`leave_family`](Self::leave_family).
    pub async fn remove_member(&mut self, profile_id: &str) -> ResultLedger<()> {
        if profile_id == self.profile_id {
            return Err(LedgerError::SelfRemoval);
        }
        let family_id = self.require_family()?;
        if self.snapshot.role != Some(Role::Admin) {
            return Err(LedgerError::Forbidden(
                "only admins can remove members".to_string(),
            ));
        }

        let previous = self.snapshot.clone();
        self.snapshot.members.retain(|m| m.profile_id != profile_id);

        let filter = Filter::new()
            .eq("family_id", family_id.as_str())
            .eq("profile_id", profile_id);
        if let Err(err) = self.store.delete(Table::FamilyMembers, &filter).await {
            return Err(self.rollback(previous, "remove_member", err));
        }
        tracing::info!(family = %family_id, member = profile_id, "member removed");
        Ok(())
    }
}

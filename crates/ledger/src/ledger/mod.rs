//! The ledger store: the signed-in profile's view of its family.
//!
//! [`Ledger`] owns the [`Snapshot`] and is the only way to change it. Every
//! mutation follows the same pattern:
//!
//! 1. validate locally, nothing is sent on failure
//! 2. apply the change to the snapshot (optimistic)
//! 3. issue the remote call; on failure restore the last known-good snapshot
//!    and return the error
//! 4. on success re-read the whole snapshot (reconciliation fetch)

use serde::Serialize;

use crate::{
    Family, LedgerError, Member, MonthView, RemoteStore, ResultLedger, Role, StoreError, Table,
    Transaction, YearView,
    family::{MembershipRow, ProfileRow},
    rows,
    store::{Filter, Order},
};

pub use family::{JoinMode, JoinOutcome};

mod family;
mod transactions;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Idle,
    Loading,
    Ready,
    /// The last fetch failed; the previous snapshot is still in place.
    Failed,
}

/// Everything the signed-in profile can see.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot {
    /// Ordered by date, then id.
    pub transactions: Vec<Transaction>,
    pub family: Option<Family>,
    /// The caller's role in `family`.
    pub role: Option<Role>,
    pub members: Vec<Member>,
}

impl Snapshot {
    pub fn has_family(&self) -> bool {
        self.family.is_some()
    }

    pub fn family_id(&self) -> Option<&str> {
        self.family.as_ref().map(|f| f.id.as_str())
    }

    pub fn family_name(&self) -> Option<&str> {
        self.family.as_ref().map(|f| f.name.as_str())
    }

    pub fn invite_code(&self) -> Option<&str> {
        self.family.as_ref().map(|f| f.invite_code.as_str())
    }

    pub fn transaction(&self, id: &str) -> Option<&Transaction> {
        self.transactions.iter().find(|t| t.id == id)
    }

    pub fn month(&self, year: i32, month: u32) -> MonthView {
        MonthView::compute(&self.transactions, year, month)
    }

    pub fn year(&self, year: i32) -> YearView {
        YearView::compute(&self.transactions, year)
    }
}

pub struct Ledger<S> {
    store: S,
    profile_id: String,
    snapshot: Snapshot,
    state: LoadState,
}

impl<S: RemoteStore> Ledger<S> {
    /// Creates an empty ledger for `profile_id`; call
    /// [`fetch_snapshot`](Self::fetch_snapshot) to load it.
    pub fn new(store: S, profile_id: impl Into<String>) -> Self {
        Self {
            store,
            profile_id: profile_id.into(),
            snapshot: Snapshot::default(),
            state: LoadState::Idle,
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn profile_id(&self) -> &str {
        &self.profile_id
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-reads membership, family, members and transactions and replaces
    /// the snapshot. On failure the previous snapshot is kept.
    pub async fn fetch_snapshot(&mut self) -> ResultLedger<&Snapshot> {
        self.state = LoadState::Loading;
        match self.load().await {
            Ok(snapshot) => {
                tracing::info!(
                    profile = %self.profile_id,
                    family = snapshot.family_id().unwrap_or("-"),
                    transactions = snapshot.transactions.len(),
                    "snapshot replaced"
                );
                self.snapshot = snapshot;
                self.state = LoadState::Ready;
                Ok(&self.snapshot)
            }
            Err(err) => {
                tracing::error!(profile = %self.profile_id, "snapshot fetch failed: {err}");
                self.state = LoadState::Failed;
                Err(err)
            }
        }
    }

    async fn load(&self) -> ResultLedger<Snapshot> {
        let links = self
            .store
            .select(
                Table::FamilyMembers,
                &Filter::new().eq("profile_id", self.profile_id.as_str()),
                None,
            )
            .await?;
        let links: Vec<MembershipRow> = rows::admit(Table::FamilyMembers, &links);
        if links.len() > 1 {
            tracing::warn!(
                profile = %self.profile_id,
                count = links.len(),
                "profile has more than one membership, using the first"
            );
        }
        let Some(link) = links.into_iter().next() else {
            return Ok(Snapshot::default());
        };

        let family_rows = self
            .store
            .select(
                Table::Families,
                &Filter::new().eq("id", link.family_id.as_str()),
                None,
            )
            .await?;
        let family: Family = family_rows
            .first()
            .ok_or_else(|| LedgerError::NotFound(format!("family {}", link.family_id)))
            .and_then(|row| rows::from_row(Table::Families, row))?;

        let members = self.load_members(&family.id).await?;

        let tx_rows = self
            .store
            .select(
                Table::Transactions,
                &Filter::new().eq("family_id", family.id.as_str()),
                Some(&Order::asc("date").then_asc("id")),
            )
            .await?;
        let mut transactions: Vec<Transaction> = rows::admit(Table::Transactions, &tx_rows);
        transactions.retain(|t| {
            let own = t.family_id == family.id;
            if !own {
                tracing::warn!(id = %t.id, family = %t.family_id, "dropping foreign transaction");
            }
            own
        });
        transactions.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        Ok(Snapshot {
            transactions,
            family: Some(family),
            role: Some(link.role),
            members,
        })
    }

    async fn load_members(&self, family_id: &str) -> ResultLedger<Vec<Member>> {
        let member_rows = self
            .store
            .select(
                Table::FamilyMembers,
                &Filter::new().eq("family_id", family_id),
                Some(&Order::asc("profile_id")),
            )
            .await?;
        let memberships: Vec<MembershipRow> = rows::admit(Table::FamilyMembers, &member_rows);

        let ids: Vec<&str> = memberships.iter().map(|m| m.profile_id.as_str()).collect();
        let profile_rows = self
            .store
            .select(Table::Profiles, &Filter::new().is_in("id", ids), None)
            .await?;
        let profiles: Vec<ProfileRow> = rows::admit(Table::Profiles, &profile_rows);

        Ok(memberships
            .into_iter()
            .map(|m| {
                let profile = profiles.iter().find(|p| p.id == m.profile_id);
                Member::from_rows(m, profile)
            })
            .collect())
    }

    /// Id of the active family, or [`LedgerError::NoFamily`].
    fn require_family(&self) -> ResultLedger<String> {
        self.snapshot
            .family_id()
            .map(ToString::to_string)
            .ok_or(LedgerError::NoFamily)
    }

    /// Restores `previous` after a failed remote call.
    fn rollback(&mut self, previous: Snapshot, operation: &str, err: StoreError) -> LedgerError {
        tracing::warn!(operation, "remote call failed, restoring snapshot: {err}");
        self.snapshot = previous;
        LedgerError::Remote(err)
    }
}

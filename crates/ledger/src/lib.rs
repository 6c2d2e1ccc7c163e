//! Shared household ledger engine.
//!
//! The crate keeps a local snapshot of one family's transactions consistent
//! with a remote store, expands planned entries into recurring series,
//! derives monthly and yearly summaries, and runs the invite-code join
//! protocol.
//!
//! The entry point is [`Ledger`], built over any [`RemoteStore`]. The crate
//! ships [`SqlStore`], a sea-orm backed store.

pub use aggregate::{CategoryTotal, ChangeCause, CompletionTracker, MonthView, YearView};
pub use dates::{days_in_month, shift_months, shift_years};
pub use error::LedgerError;
pub use family::{Family, FamilyPreview, Member, PreviewMember, Role};
pub use ledger::{JoinMode, JoinOutcome, Ledger, LoadState, Snapshot};
pub use money::Money;
pub use recurrence::{RecurrenceMode, generate_series};
pub use store::{
    Condition, FAMILY_PREVIEW_PROCEDURE, Filter, Order, RemoteStore, Row, SqlStore, StoreError, Table,
};
pub use transactions::{NewTransaction, Transaction, TransactionPatch, TransactionStatus};
pub use voice::{EntryKind, VoiceDraft, parse_transcript};

mod aggregate;
mod dates;
mod error;
mod family;
mod ledger;
mod money;
mod recurrence;
mod rows;
mod store;
mod transactions;
mod voice;

type ResultLedger<T> = Result<T, LedgerError>;

/// Category used when a transaction has none.
pub const FALLBACK_CATEGORY: &str = "Outros";

//! The errors the ledger can return.
//!
//! - [`Validation`] a mutation was rejected before anything was sent.
//! - [`NoFamily`] a mutation needs an active family and there is none.
//! - [`Remote`] the remote store failed; see [`StoreError`].
//! - [`InvalidCode`], [`AlreadyMember`], [`Join`] outcomes of the join protocol.
//!
//!  [`Validation`]: LedgerError::Validation
//!  [`NoFamily`]: LedgerError::NoFamily
//!  [`Remote`]: LedgerError::Remote
//!  [`InvalidCode`]: LedgerError::InvalidCode
//!  [`AlreadyMember`]: LedgerError::AlreadyMember
//!  [`Join`]: LedgerError::Join
use thiserror::Error;

use crate::StoreError;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("No active family")]
    NoFamily,
    #[error(transparent)]
    Remote(#[from] StoreError),
    #[error("Invalid invite code: \"{0}\"")]
    InvalidCode(String),
    #[error("Already a member of a family")]
    AlreadyMember,
    #[error("Join failed: {0}")]
    Join(String),
    #[error("Cannot remove yourself, leave the family instead")]
    SelfRemoval,
    #[error("Not allowed: {0}")]
    Forbidden(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error("Invalid row in {table}: {reason}")]
    InvalidRow { table: &'static str, reason: String },
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::NoFamily, Self::NoFamily) => true,
            (Self::Remote(a), Self::Remote(b)) => a.to_string() == b.to_string(),
            (Self::InvalidCode(a), Self::InvalidCode(b)) => a == b,
            (Self::AlreadyMember, Self::AlreadyMember) => true,
            (Self::Join(a), Self::Join(b)) => a == b,
            (Self::SelfRemoval, Self::SelfRemoval) => true,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (
                Self::InvalidRow {
                    table: ta,
                    reason: ra,
                },
                Self::InvalidRow {
                    table: tb,
                    reason: rb,
                },
            ) => ta == tb && ra == rb,
            _ => false,
        }
    }
}

//! Expansion of one planned entry into a dated series.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{LedgerError, NewTransaction, ResultLedger, shift_months, shift_years};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceMode {
    Monthly,
    Yearly,
}

impl RecurrenceMode {
    /// Total entries in a freshly created series.
    pub fn loops(self) -> u32 {
        match self {
            Self::Monthly => 12,
            Self::Yearly => 2,
        }
    }
}

impl TryFrom<&str> for RecurrenceMode {
    type Error = LedgerError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(LedgerError::Validation(format!(
                "invalid recurrence: {other}"
            ))),
        }
    }
}

/// Builds the series for `seed` under a newly minted recurrence id.
///
/// When creating (`editing == false`) entry 0 is the seed's own date and is
/// part of the series. When editing an already stored entry only the future
/// copies `1..loops` are produced; the original is never re-emitted.
pub fn generate_series(
    seed: &NewTransaction,
    mode: RecurrenceMode,
    editing: bool,
) -> ResultLedger<Vec<NewTransaction>> {
    series_with_id(seed, mode, editing, &Uuid::new_v4().to_string())
}

pub(crate) fn series_with_id(
    seed: &NewTransaction,
    mode: RecurrenceMode,
    editing: bool,
    recurrence_id: &str,
) -> ResultLedger<Vec<NewTransaction>> {
    let start = u32::from(editing);
    (start..mode.loops())
        .map(|index| {
            let offset = i32::try_from(index)
                .map_err(|_| LedgerError::Validation("series too long".to_string()))?;
            let date = match mode {
                RecurrenceMode::Monthly => shift_months(seed.date, offset),
                RecurrenceMode::Yearly => shift_years(seed.date, offset),
            }
            .ok_or_else(|| LedgerError::Validation("series date out of range".to_string()))?;
            Ok(NewTransaction {
                date,
                recurrence_id: Some(recurrence_id.to_string()),
                ..seed.clone()
            })
        })
        .collect()
}

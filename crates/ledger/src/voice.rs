//! Turns a speech transcript into a draft entry.
//!
//! Capture happens elsewhere; this module only reads the final transcript.
//! Rules:
//! - the first number (`12`, `12.50`, `12,50`, `1.234,56`) is the amount;
//!   with both separators the last one is decimal, a lone `.` before three
//!   digits groups thousands
//! - the rest, minus filler words, is the description
//! - any future-time keyword makes the entry planned instead of realized

use chrono::{Days, NaiveDate};

use crate::{
    FALLBACK_CATEGORY, LedgerError, Money, NewTransaction, ResultLedger, TransactionStatus,
};

const FILLER_WORDS: &[&str] = &["reais", "real"];
const FUTURE_KEYWORDS: &[&str] = &[
    "amanhã",
    "mês",
    "janeiro",
    "fevereiro",
    "março",
    "abril",
    "dia",
    "agendar",
];
const TOMORROW: &str = "amanhã";
const FALLBACK_DESCRIPTION: &str = "Voz";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    Realized,
    Planned,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceDraft {
    /// `None` when the transcript had no usable number.
    pub amount: Option<Money>,
    pub description: String,
    pub kind: EntryKind,
    /// Tomorrow when the transcript says so, otherwise today.
    pub date: NaiveDate,
}

impl VoiceDraft {
    /// Builds an expense from the draft. Fails when no amount was heard.
    pub fn into_new_transaction(self, paid_by: Option<String>) -> ResultLedger<NewTransaction> {
        let amount = self
            .amount
            .filter(|a| !a.is_zero())
            .ok_or_else(|| LedgerError::Validation("no amount in transcript".to_string()))?;
        Ok(NewTransaction {
            description: self.description,
            amount: amount.as_expense(),
            date: self.date,
            status: match self.kind {
                EntryKind::Realized => TransactionStatus::Paid,
                EntryKind::Planned => TransactionStatus::Pending,
            },
            category: Some(FALLBACK_CATEGORY.to_string()),
            paid_by,
            recurrence_id: None,
        })
    }
}

pub fn parse_transcript(text: &str, today: NaiveDate) -> VoiceDraft {
    let token = first_number(text);
    let amount = token.and_then(|t| normalize_amount(t).parse::<Money>().ok());

    let remainder = match token {
        Some(t) => text.replacen(t, "", 1),
        None => text.to_string(),
    };
    let words: Vec<&str> = remainder
        .split_whitespace()
        .filter(|w| !FILLER_WORDS.contains(&w.to_lowercase().as_str()))
        .collect();
    let description = capitalize(&words.join(" "));
    let description = if description.is_empty() {
        FALLBACK_DESCRIPTION.to_string()
    } else {
        description
    };

    let lowered = text.to_lowercase();
    let planned = FUTURE_KEYWORDS.iter().any(|k| lowered.contains(k));
    let date = if planned && lowered.contains(TOMORROW) {
        today.checked_add_days(Days::new(1)).unwrap_or(today)
    } else {
        today
    };

    VoiceDraft {
        amount,
        description,
        kind: if planned {
            EntryKind::Planned
        } else {
            EntryKind::Realized
        },
        date,
    }
}

/// Finds the first run of digits and separators, without trailing
/// separators.
fn first_number(text: &str) -> Option<&str> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let rest = &text[start..];
    let len = rest
        .find(|c: char| !(c.is_ascii_digit() || c == '.' || c == ','))
        .unwrap_or(rest.len());
    Some(rest[..len].trim_end_matches(['.', ',']))
}

/// Keeps only the decimal separator, as `.`.
fn normalize_amount(token: &str) -> String {
    let decimal = match (token.rfind('.'), token.rfind(',')) {
        (Some(dot), Some(comma)) => Some(dot.max(comma)),
        (None, Some(comma)) => Some(comma),
        (Some(dot), None) => {
            let grouped = token.matches('.').count() > 1 || token.len() - dot - 1 == 3;
            (!grouped).then_some(dot)
        }
        (None, None) => None,
    };
    token
        .char_indices()
        .filter_map(|(i, c)| match c {
            '.' | ',' if Some(i) == decimal => Some('.'),
            '.' | ',' => None,
            c => Some(c),
        })
        .collect()
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

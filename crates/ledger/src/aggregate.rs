//! Derived views over a snapshot.
//!
//! Everything here is a pure function of the transaction list, recomputed
//! whenever the snapshot changes.

use std::collections::HashMap;

use chrono::Datelike;
use serde::Serialize;

use crate::{Money, Transaction, TransactionStatus};

/// Progress at or above which a month counts as completed.
const COMPLETE_THRESHOLD: f64 = 99.9;

/// Transactions of one calendar month with paid/pending totals.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    /// Sorted by date, then by id.
    pub transactions: Vec<Transaction>,
    pub realized: Money,
    pub planned: Money,
    pub total: Money,
    /// `realized / total * 100`, `0` for an empty month.
    pub progress: f64,
}

impl MonthView {
    pub fn compute(transactions: &[Transaction], year: i32, month: u32) -> Self {
        let mut entries: Vec<Transaction> = transactions
            .iter()
            .filter(|t| t.date.year() == year && t.date.month() == month)
            .cloned()
            .collect();
        entries.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

        let realized = sum_by_status(&entries, TransactionStatus::Paid);
        let planned = sum_by_status(&entries, TransactionStatus::Pending);
        let total = realized + planned;

        Self {
            year,
            month,
            transactions: entries,
            realized,
            planned,
            total,
            progress: realized.percent_of(total),
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.total.is_zero() && self.progress >= COMPLETE_THRESHOLD
    }
}

fn sum_by_status(entries: &[Transaction], status: TransactionStatus) -> Money {
    entries
        .iter()
        .filter(|t| t.status == status)
        .map(|t| t.amount)
        .sum()
}

/// What caused a month view to be recomputed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChangeCause {
    /// The user changed a transaction of the month (e.g. toggled it paid).
    UserAction,
    /// The user moved to another month.
    Navigation,
    /// A reconciliation fetch replaced the snapshot.
    Refresh,
}

/// Detects the "month completed" moment.
///
/// The signal fires once, when a user action turns an incomplete month into
/// a complete one. Opening a month that is already complete does not fire.
#[derive(Clone, Debug, Default)]
pub struct CompletionTracker {
    month: Option<(i32, u32)>,
    was_complete: bool,
}

impl CompletionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `view` and returns `true` when the completed signal fires.
    pub fn observe(&mut self, view: &MonthView, cause: ChangeCause) -> bool {
        let key = (view.year, view.month);
        let was_complete = self.month == Some(key) && self.was_complete;
        let complete = view.is_complete();

        self.month = Some(key);
        self.was_complete = complete;

        complete && !was_complete && cause == ChangeCause::UserAction
    }
}

/// Paid total of one category within a year.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Money,
    /// Percentage of the year's paid total.
    pub share: f64,
    /// Length relative to the largest category, in percent.
    pub bar: f64,
}

/// Calendar-year rollup used by the analytics view.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct YearView {
    pub year: i32,
    pub total_spent: Money,
    pub total_planned: Money,
    /// Paid magnitudes per month, January first.
    pub monthly_realized: [Money; 12],
    /// Pending magnitudes per month, January first.
    pub monthly_planned: [Money; 12],
    /// Largest monthly value, never below one currency unit.
    pub max_scale: Money,
    /// Sorted by total, largest first.
    pub categories: Vec<CategoryTotal>,
}

impl YearView {
    pub fn compute(transactions: &[Transaction], year: i32) -> Self {
        let mut monthly_realized = [Money::ZERO; 12];
        let mut monthly_planned = [Money::ZERO; 12];
        let mut by_category: HashMap<&str, Money> = HashMap::new();

        for tx in transactions.iter().filter(|t| t.date.year() == year) {
            let slot = tx.date.month0() as usize;
            let magnitude = tx.amount.abs();
            match tx.status {
                TransactionStatus::Paid => {
                    monthly_realized[slot] += magnitude;
                    *by_category.entry(tx.category_label()).or_default() += magnitude;
                }
                TransactionStatus::Pending => monthly_planned[slot] += magnitude,
            }
        }

        let total_spent: Money = monthly_realized.iter().copied().sum();
        let total_planned: Money = monthly_planned.iter().copied().sum();
        let max_scale = monthly_realized
            .iter()
            .chain(monthly_planned.iter())
            .copied()
            .max()
            .unwrap_or(Money::ZERO)
            .max(Money::new(100));

        let mut sorted: Vec<(&str, Money)> = by_category.into_iter().collect();
        sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let largest = sorted.first().map(|(_, v)| *v).unwrap_or(Money::ZERO);
        let categories = sorted
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
                share: total.percent_of(total_spent),
                bar: total.percent_of(largest),
            })
            .collect();

        Self {
            year,
            total_spent,
            total_planned,
            monthly_realized,
            monthly_planned,
            max_scale,
            categories,
        }
    }

    /// Height of a monthly bar as a percentage of [`YearView::max_scale`].
    pub fn bar_height(&self, value: Money) -> f64 {
        value.percent_of(self.max_scale)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn tx(id: &str, date: &str, cents: i64, status: TransactionStatus) -> Transaction {
        Transaction {
            id: id.to_string(),
            description: format!("tx {id}"),
            amount: Money::new(cents),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            status,
            category: None,
            paid_by: None,
            recurrence_id: None,
            family_id: "f".to_string(),
        }
    }

    fn with_category(mut t: Transaction, category: &str) -> Transaction {
        t.category = Some(category.to_string());
        t
    }

    use TransactionStatus::{Paid, Pending};

    #[test]
    fn month_totals_and_progress() {
        let all = vec![
            tx("a", "2024-03-05", -5000, Paid),
            tx("b", "2024-03-20", -3000, Pending),
            tx("c", "2024-04-01", -9900, Paid),
        ];
        let view = MonthView::compute(&all, 2024, 3);
        assert_eq!(view.transactions.len(), 2);
        assert_eq!(view.realized, Money::new(-5000));
        assert_eq!(view.planned, Money::new(-3000));
        assert_eq!(view.total, Money::new(-8000));
        assert!((view.progress - 62.5).abs() < 1e-9);
        assert!(!view.is_complete());
    }

    #[test]
    fn same_date_ties_break_by_id() {
        let all = vec![
            tx("b", "2024-03-05", -100, Paid),
            tx("a", "2024-03-05", -100, Paid),
            tx("0", "2024-03-06", -100, Paid),
        ];
        let view = MonthView::compute(&all, 2024, 3);
        let ids: Vec<&str> = view.transactions.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "0"]);
    }

    #[test]
    fn empty_month_has_zero_progress() {
        let view = MonthView::compute(&[], 2024, 3);
        assert_eq!(view.progress, 0.0);
        assert!(!view.is_complete());
    }

    #[test]
    fn fully_paid_month_is_complete() {
        let all = vec![tx("a", "2024-03-05", -100, Paid), tx("b", "2024-03-09", -250, Paid)];
        let view = MonthView::compute(&all, 2024, 3);
        assert!((view.progress - 100.0).abs() < 1e-9);
        assert!(view.is_complete());
    }

    #[test]
    fn completion_fires_only_on_user_action_transition() {
        let pending = vec![tx("a", "2024-03-05", -100, Pending)];
        let paid = vec![tx("a", "2024-03-05", -100, Paid)];
        let mut tracker = CompletionTracker::new();

        assert!(!tracker.observe(&MonthView::compute(&pending, 2024, 3), ChangeCause::Navigation));
        assert!(tracker.observe(&MonthView::compute(&paid, 2024, 3), ChangeCause::UserAction));
        // Still complete: no second celebration.
        assert!(!tracker.observe(&MonthView::compute(&paid, 2024, 3), ChangeCause::UserAction));
        assert!(!tracker.observe(&MonthView::compute(&paid, 2024, 3), ChangeCause::Refresh));
    }

    #[test]
    fn navigating_to_a_complete_month_does_not_fire() {
        let paid = vec![tx("a", "2024-03-05", -100, Paid)];
        let mut tracker = CompletionTracker::new();
        assert!(!tracker.observe(&MonthView::compute(&paid, 2024, 2), ChangeCause::Navigation));
        assert!(!tracker.observe(&MonthView::compute(&paid, 2024, 3), ChangeCause::Navigation));
    }

    #[test]
    fn year_categories_sorted_with_shares() {
        let all = vec![
            with_category(tx("a", "2024-01-05", -4000, Paid), "Food"),
            with_category(tx("b", "2024-02-05", -1000, Paid), "Food"),
            with_category(tx("c", "2024-02-07", -10000, Paid), "Rent"),
            with_category(tx("d", "2024-02-09", -7000, Pending), "Rent"),
            with_category(tx("e", "2023-12-31", -7000, Paid), "Rent"),
        ];
        let view = YearView::compute(&all, 2024);
        assert_eq!(view.total_spent, Money::new(15000));
        assert_eq!(view.total_planned, Money::new(7000));

        let names: Vec<(&str, Money)> = view
            .categories
            .iter()
            .map(|c| (c.category.as_str(), c.total))
            .collect();
        assert_eq!(names, [("Rent", Money::new(10000)), ("Food", Money::new(5000))]);
        assert_eq!((view.categories[0].share * 10.0).round() / 10.0, 66.7);
        assert_eq!(view.categories[0].bar, 100.0);
        assert_eq!(view.categories[1].bar, 50.0);
    }

    #[test]
    fn year_monthly_slots_and_scale() {
        let all = vec![
            tx("a", "2024-01-05", -4000, Paid),
            tx("b", "2024-01-09", -1000, Pending),
            tx("c", "2024-12-31", -2500, Pending),
        ];
        let view = YearView::compute(&all, 2024);
        assert_eq!(view.monthly_realized[0], Money::new(4000));
        assert_eq!(view.monthly_planned[0], Money::new(1000));
        assert_eq!(view.monthly_planned[11], Money::new(2500));
        assert_eq!(view.max_scale, Money::new(4000));
        assert_eq!(view.bar_height(Money::new(1000)), 25.0);
    }

    #[test]
    fn empty_year_scale_is_never_zero() {
        let view = YearView::compute(&[], 2024);
        assert_eq!(view.max_scale, Money::new(100));
        assert!(view.categories.is_empty());
        assert_eq!(view.bar_height(Money::ZERO), 0.0);
    }

    #[test]
    fn missing_category_groups_under_fallback() {
        let all = vec![tx("a", "2024-01-05", -4000, Paid)];
        let view = YearView::compute(&all, 2024);
        assert_eq!(view.categories[0].category, crate::FALLBACK_CATEGORY);
    }
}

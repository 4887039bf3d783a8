//! Built-in filter stages for the customer report job.

use chrono::{Datelike, NaiveDate};

use crate::config::BirthdayWindow;
use crate::filter::{DropReason, FilterOutcome, FilterStage};
use crate::record::Customer;

/// Eligibility stage: keeps customers whose birthday satisfies a predicate.
///
/// The predicate is pluggable; [`BirthdayFilter::from_window`] builds the
/// standard calendar-window predicates against an explicit reference date so
/// behavior never silently depends on the wall clock.
pub struct BirthdayFilter {
    predicate: Box<dyn Fn(NaiveDate) -> bool + Send + Sync>,
}

impl BirthdayFilter {
    /// Create a filter from an arbitrary predicate over the birthday field.
    pub fn new(predicate: impl Fn(NaiveDate) -> bool + Send + Sync + 'static) -> Self {
        Self {
            predicate: Box::new(predicate),
        }
    }

    /// Build the predicate for a configured window and reference date.
    pub fn from_window(window: &BirthdayWindow, reference: NaiveDate) -> Self {
        match *window {
            BirthdayWindow::SameMonth => {
                Self::new(move |birthday| birthday.month() == reference.month())
            }
            BirthdayWindow::SameDay => Self::new(move |birthday| {
                birthday.month() == reference.month() && birthday.day() == reference.day()
            }),
            BirthdayWindow::WithinDays { days } => {
                Self::new(move |birthday| calendar_distance(birthday, reference) <= days)
            }
        }
    }
}

/// Distance in days between a birthday and a reference date, ignoring the
/// birth year and wrapping around the year boundary.
fn calendar_distance(birthday: NaiveDate, reference: NaiveDate) -> u32 {
    // Feb 29 birthdays map to Mar 1 in non-leap reference years.
    let this_year = NaiveDate::from_ymd_opt(reference.year(), birthday.month(), birthday.day())
        .or_else(|| NaiveDate::from_ymd_opt(reference.year(), 3, 1))
        .unwrap_or(reference);

    let year_len = if reference.leap_year() { 366 } else { 365 };
    let diff = this_year.ordinal().abs_diff(reference.ordinal());
    diff.min(year_len - diff)
}

impl FilterStage<Customer> for BirthdayFilter {
    fn name(&self) -> &'static str {
        "birthday-filter"
    }

    fn apply(&self, record: Customer) -> FilterOutcome<Customer> {
        if (self.predicate)(record.birthday) {
            FilterOutcome::Keep(record)
        } else {
            FilterOutcome::Drop(DropReason::NotEligible)
        }
    }
}

/// Threshold-validation stage: keeps customers with strictly fewer
/// transactions than the configured limit.
pub struct TransactionLimitFilter {
    limit: u32,
}

impl TransactionLimitFilter {
    /// Create a filter dropping customers with `transactions >= limit`.
    pub fn new(limit: u32) -> Self {
        Self { limit }
    }
}

impl FilterStage<Customer> for TransactionLimitFilter {
    fn name(&self) -> &'static str {
        "transaction-limit"
    }

    fn apply(&self, record: Customer) -> FilterOutcome<Customer> {
        if record.transactions >= self.limit {
            FilterOutcome::Drop(DropReason::ThresholdExceeded)
        } else {
            tracing::debug!("customer {} matched the transaction filter", record.id);
            FilterOutcome::Keep(record)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(id: u64, birthday: NaiveDate, transactions: u32) -> Customer {
        Customer {
            id,
            name: format!("customer-{id}"),
            birthday,
            transactions,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_birthday_same_month_keeps() {
        let filter = BirthdayFilter::from_window(&BirthdayWindow::SameMonth, date(2026, 8, 26));
        let outcome = filter.apply(customer(1, date(1990, 8, 3), 0));
        match outcome {
            FilterOutcome::Keep(kept) => assert_eq!(kept.id, 1),
            other => panic!("expected keep, got {other:?}"),
        }
    }

    #[test]
    fn test_birthday_other_month_drops() {
        let filter = BirthdayFilter::from_window(&BirthdayWindow::SameMonth, date(2026, 8, 26));
        let outcome = filter.apply(customer(1, date(1990, 2, 3), 0));
        assert_eq!(outcome, FilterOutcome::Drop(DropReason::NotEligible));
    }

    #[test]
    fn test_birthday_same_day() {
        let filter = BirthdayFilter::from_window(&BirthdayWindow::SameDay, date(2026, 8, 26));
        assert!(filter.apply(customer(1, date(1961, 8, 26), 0)).is_keep());
        assert!(filter.apply(customer(2, date(1961, 8, 25), 0)).is_drop());
    }

    #[test]
    fn test_birthday_within_days_wraps_year_boundary() {
        let filter =
            BirthdayFilter::from_window(&BirthdayWindow::WithinDays { days: 7 }, date(2026, 1, 2));
        // Dec 30 is 3 calendar days before Jan 2.
        assert!(filter.apply(customer(1, date(1975, 12, 30), 0)).is_keep());
        assert!(filter.apply(customer(2, date(1975, 1, 8), 0)).is_keep());
        assert!(filter.apply(customer(3, date(1975, 6, 15), 0)).is_drop());
    }

    #[test]
    fn test_birthday_custom_predicate_preserves_identity() {
        let filter = BirthdayFilter::new(|_| true);
        match filter.apply(customer(99, date(2000, 5, 5), 12)) {
            FilterOutcome::Keep(kept) => assert_eq!(kept.id, 99),
            other => panic!("expected keep, got {other:?}"),
        }
    }

    #[test]
    fn test_transaction_limit_boundary() {
        let filter = TransactionLimitFilter::new(5);
        let birthday = date(1990, 1, 1);

        assert!(filter.apply(customer(1, birthday, 4)).is_keep());
        // Exactly at the limit is dropped: the contract is strictly below.
        assert_eq!(
            filter.apply(customer(2, birthday, 5)),
            FilterOutcome::Drop(DropReason::ThresholdExceeded)
        );
        assert!(filter.apply(customer(3, birthday, 100)).is_drop());
    }

    #[test]
    fn test_transaction_limit_zero_drops_all() {
        let filter = TransactionLimitFilter::new(0);
        assert!(filter.apply(customer(1, date(1990, 1, 1), 0)).is_drop());
    }
}

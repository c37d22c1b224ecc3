//! Calendar of booked events.
//!
//! Only proposals that were sent or accepted show up: a pending budget is not
//! a booking yet and a declined one never will be.
use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::{Budget, BudgetStatus};

/// Highlight of a calendar day.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayMark {
    Sent,
    Accepted,
}

fn is_booked(budget: &Budget) -> bool {
    matches!(budget.status, BudgetStatus::Sent | BudgetStatus::Accepted)
}

/// Marks every day holding a booked event. A confirmed event wins over a
/// proposal on the same day.
pub fn marks(budgets: &[Budget]) -> BTreeMap<NaiveDate, DayMark> {
    let mut days = BTreeMap::new();
    for budget in budgets.iter().filter(|budget| is_booked(budget)) {
        let mark = if budget.status == BudgetStatus::Accepted {
            DayMark::Accepted
        } else {
            DayMark::Sent
        };
        days.entry(budget.event_date)
            .and_modify(|current: &mut DayMark| *current = (*current).max(mark))
            .or_insert(mark);
    }
    days
}

/// Booked events on `date`.
pub fn events_on(budgets: &[Budget], date: NaiveDate) -> Vec<&Budget> {
    budgets
        .iter()
        .filter(|budget| is_booked(budget) && budget.event_date == date)
        .collect()
}

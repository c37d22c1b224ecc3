//! Dashboard figures computed from the cached budgets.
use chrono::{Datelike, Months, NaiveDate};
use serde::Serialize;

use crate::{Amount, Budget, BudgetStatus};

/// Headline numbers of the dashboard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total: usize,
    pub pending: usize,
    pub sent: usize,
    pub accepted: usize,
    pub rejected: usize,
    /// Sum of the amounts of accepted budgets.
    pub total_revenue: Amount,
}

impl DashboardSummary {
    pub fn from_budgets(budgets: &[Budget]) -> Self {
        let mut summary = Self {
            total: budgets.len(),
            ..Self::default()
        };
        for budget in budgets {
            match budget.status {
                BudgetStatus::Pending => summary.pending += 1,
                BudgetStatus::Sent => summary.sent += 1,
                BudgetStatus::Rejected => summary.rejected += 1,
                BudgetStatus::Accepted => {
                    summary.accepted += 1;
                    summary.total_revenue += budget.amount.unwrap_or_default();
                }
            }
        }
        summary
    }
}

fn accepted(budgets: &[Budget]) -> impl Iterator<Item = &Budget> {
    budgets
        .iter()
        .filter(|budget| budget.status == BudgetStatus::Accepted)
}

fn month_index(date: NaiveDate) -> usize {
    date.month0() as usize
}

/// Accepted events per month of `year`, indexed from January.
pub fn monthly_events(budgets: &[Budget], year: i32) -> [u32; 12] {
    let mut months = [0; 12];
    for budget in accepted(budgets).filter(|budget| budget.event_date.year() == year) {
        months[month_index(budget.event_date)] += 1;
    }
    months
}

/// Expected revenue per month of `year`, indexed from January.
///
/// A budget paid in installments contributes one share per month starting at
/// its first payment date. Budgets without a first payment date are billed on
/// their event date.
pub fn monthly_revenue(budgets: &[Budget], year: i32) -> [Amount; 12] {
    let mut months = [Amount::ZERO; 12];
    for budget in accepted(budgets) {
        let amount = budget.amount.unwrap_or_default();
        let start = budget.first_payment_date.unwrap_or(budget.event_date);
        let parts = if budget.installments {
            amount.split(budget.installments_count.max(1))
        } else {
            vec![amount]
        };

        for (offset, part) in parts.into_iter().enumerate() {
            let Some(due) = start.checked_add_months(Months::new(offset as u32)) else {
                break;
            };
            if due.year() == year {
                months[month_index(due)] += part;
            }
        }
    }
    months
}

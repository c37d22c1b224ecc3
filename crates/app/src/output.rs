//! Plain-text rendering of budgets and dashboard figures.
use std::{collections::BTreeMap, fmt::Write as _};

use chrono::{Datelike, NaiveDate};
use client::{Notice, NoticeLevel};
use engine::{Amount, Budget, calendar::DayMark, stats::DashboardSummary};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn notice(notice: &Notice) -> String {
    let tag = match notice.level {
        NoticeLevel::Success => "ok",
        NoticeLevel::Error => "error",
    };
    format!("[{tag}] {}", notice.message)
}

fn amount(value: Option<Amount>) -> String {
    value.map_or_else(|| "-".to_string(), |amount| amount.to_string())
}

pub fn budget_line(budget: &Budget) -> String {
    format!(
        "{:>5}  {}  {:<24}  {:<10}  {:<9}  {:>10}",
        budget.id.as_str(),
        budget.event_date,
        budget.client_name,
        budget.event_type.label(),
        budget.status.label(),
        amount(budget.amount),
    )
}

pub fn budget_list(budgets: &[Budget]) -> String {
    if budgets.is_empty() {
        return "No budgets.".to_string();
    }
    budgets
        .iter()
        .map(budget_line)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn budget_details(budget: &Budget) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Budget #{}", budget.id);
    let _ = writeln!(out, "  Client:       {}", budget.client_name);
    if !budget.phone.is_empty() {
        let _ = writeln!(out, "  Phone:        {}", budget.phone);
    }
    let _ = writeln!(out, "  Event:        {}", budget.event_type.label());
    let _ = writeln!(out, "  Event date:   {}", budget.event_date);
    let _ = writeln!(out, "  Budget date:  {}", budget.budget_date);
    let _ = writeln!(out, "  Status:       {}", budget.status.label());
    let _ = writeln!(out, "  Amount:       {}", amount(budget.amount));
    if budget.installments {
        let _ = writeln!(out, "  Installments: {}", budget.installments_count);
        if let Some(first) = budget.first_payment_date {
            let _ = writeln!(out, "  First due:    {first}");
        }
    }
    if let Some(reason) = &budget.rejection_reason {
        let _ = writeln!(out, "  Declined:     {reason}");
    }
    if let Some(updated_at) = budget.updated_at {
        let _ = writeln!(out, "  Updated:      {}", updated_at.format("%Y-%m-%d %H:%M UTC"));
    }
    out.trim_end().to_string()
}

pub fn dashboard(
    year: i32,
    summary: &DashboardSummary,
    events: &[u32; 12],
    revenue: &[Amount; 12],
) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Budgets: {} total, {} pending, {} sent, {} accepted, {} declined",
        summary.total, summary.pending, summary.sent, summary.accepted, summary.rejected
    );
    let _ = writeln!(out, "Accepted revenue: {}", summary.total_revenue);
    let _ = writeln!(out);
    let _ = writeln!(out, "{year}   events     revenue");
    for (month, name) in MONTHS.iter().enumerate() {
        let _ = writeln!(out, "{name}  {:>7}  {:>10}", events[month], revenue[month]);
    }
    out.trim_end().to_string()
}

/// Marked days of the month containing `day`, followed by the budgets on it.
pub fn calendar(day: NaiveDate, marks: &BTreeMap<NaiveDate, DayMark>, on_day: &[&Budget]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", MONTHS[day.month0() as usize], day.year());
    let month = marks
        .iter()
        .filter(|(date, _)| date.year() == day.year() && date.month() == day.month());
    let mut any = false;
    for (date, mark) in month {
        any = true;
        let label = match mark {
            DayMark::Accepted => "accepted",
            DayMark::Sent => "sent",
        };
        let _ = writeln!(out, "  {:>2}  {label}", date.day());
    }
    if !any {
        let _ = writeln!(out, "  no marked days");
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "Events on {day}:");
    if on_day.is_empty() {
        let _ = writeln!(out, "  none");
    }
    for budget in on_day {
        let _ = writeln!(out, "  {}", budget_line(budget));
    }
    out.trim_end().to_string()
}

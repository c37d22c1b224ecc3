//! Translation between [`Budget`]s and the backend's event objects.
//!
//! Outbound payloads always carry the full field set with explicit defaults,
//! so a `PATCH` never depends on what the server already holds. The one
//! exception is `motivoRecusa`, which only exists on refusals.
use api_types::event::{EventOut, EventPayload};

use crate::{
    Amount, Budget, BudgetForm, BudgetId, BudgetStatus, EventType, ResultEngine,
    date::{format_wire_date, parse_timestamp, parse_wire_date},
};

/// Reason sent when a budget is declined without one.
pub const REJECTION_PLACEHOLDER: &str = "reason not provided";

/// Builds the wire payload for `form` moving into (or staying in) `status`.
///
/// A missing amount is sent as `0` whatever the status: the backend decides
/// whether that is acceptable for a proposal.
pub fn to_wire(form: &BudgetForm, status: BudgetStatus, rejection_reason: Option<&str>) -> EventPayload {
    let rejection_reason = (status == BudgetStatus::Rejected).then(|| {
        rejection_reason
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or(REJECTION_PLACEHOLDER)
            .to_string()
    });

    EventPayload {
        client_name: form.client_name.clone(),
        event_type: form.event_type.as_str().to_string(),
        budget_date: format_wire_date(form.budget_date),
        event_date: format_wire_date(form.event_date),
        status: status.to_wire(),
        amount: form.amount.unwrap_or(Amount::ZERO).to_major(),
        installments: form.installments,
        installments_count: form.installments_count,
        first_payment_date: form.first_payment_date.map(format_wire_date),
        phone: form.phone.clone(),
        rejection_reason,
    }
}

/// Converts an event returned by the backend into a [`Budget`].
///
/// Fails only when a mandatory date is unreadable. Optional fields fall back
/// to `installments = false`, `installments_count = 1` and no first payment
/// date; the status falls back to pending.
pub fn from_wire(event: EventOut) -> ResultEngine<Budget> {
    let budget_date = parse_wire_date(&event.budget_date)?;
    let event_date = parse_wire_date(&event.event_date)?;
    let first_payment_date = event
        .first_payment_date
        .as_deref()
        .filter(|value| !value.trim().is_empty())
        .map(parse_wire_date)
        .transpose()?;
    let amount = event.amount.map(Amount::from_major).transpose()?;

    Ok(Budget {
        id: BudgetId::from(event.id),
        client_name: event.client_name,
        phone: event.phone.unwrap_or_default(),
        budget_date,
        event_date,
        event_type: event
            .event_type
            .as_deref()
            .map(EventType::from_wire)
            .unwrap_or_default(),
        amount,
        installments: event.installments.unwrap_or(false),
        installments_count: event.installments_count.filter(|count| *count > 0).unwrap_or(1),
        first_payment_date,
        rejection_reason: event.rejection_reason,
        status: BudgetStatus::from_wire(event.status.as_deref()),
        created_at: event.created_at.as_deref().and_then(parse_timestamp),
        updated_at: event.updated_at.as_deref().and_then(parse_timestamp),
    })
}

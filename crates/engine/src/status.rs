//! Budget status workflow.
//!
//! The intended flow is `pending -> sent -> accepted | rejected`, but any
//! status may be reached from any other: photographers reopen declined
//! proposals and step back when a client renegotiates. The workflow only
//! decides which fields a transition carries, never whether it is allowed.
use std::{fmt, str::FromStr};

use api_types::event::EventStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Amount, BudgetForm, EngineError};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    #[default]
    Pending,
    Sent,
    Accepted,
    Rejected,
}

/// Whether a status-change dialog asks for a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldRule {
    Hidden,
    Optional,
    Required,
}

/// Fields exposed when moving a budget into a given status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusFields {
    pub amount: FieldRule,
    pub installments: FieldRule,
    pub rejection_reason: FieldRule,
}

impl BudgetStatus {
    pub const ALL: [BudgetStatus; 4] = [
        Self::Pending,
        Self::Sent,
        Self::Accepted,
        Self::Rejected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Sent => "Proposal sent",
            Self::Accepted => "Accepted",
            Self::Rejected => "Declined",
        }
    }

    /// Status code understood by the backend.
    pub fn to_wire(self) -> EventStatus {
        match self {
            Self::Pending => EventStatus::OrcamentoRecebido,
            Self::Sent => EventStatus::PropostaEnviada,
            Self::Accepted => EventStatus::PropostaAceita,
            Self::Rejected => EventStatus::PropostaRecusada,
        }
    }

    /// Reads a backend status code. Missing or unknown codes fall back to
    /// `Pending`.
    pub fn from_wire(code: Option<&str>) -> Self {
        match code.and_then(EventStatus::from_code) {
            Some(EventStatus::OrcamentoRecebido) => Self::Pending,
            Some(EventStatus::PropostaEnviada) => Self::Sent,
            Some(EventStatus::PropostaAceita) => Self::Accepted,
            Some(EventStatus::PropostaRecusada) => Self::Rejected,
            None => {
                if let Some(code) = code {
                    tracing::warn!("unknown event status {code:?}, treating as pending");
                }
                Self::Pending
            }
        }
    }

    /// Field visibility for a transition into this status.
    pub fn fields(self) -> StatusFields {
        use FieldRule::*;
        match self {
            Self::Pending => StatusFields {
                amount: Hidden,
                installments: Hidden,
                rejection_reason: Hidden,
            },
            Self::Sent => StatusFields {
                amount: Required,
                installments: Hidden,
                rejection_reason: Hidden,
            },
            Self::Accepted => StatusFields {
                amount: Required,
                installments: Optional,
                rejection_reason: Hidden,
            },
            Self::Rejected => StatusFields {
                amount: Hidden,
                installments: Hidden,
                rejection_reason: Optional,
            },
        }
    }

    /// Message shown once a transition into this status went through.
    pub fn confirmation(self) -> &'static str {
        match self {
            Self::Pending => "Budget set to pending",
            Self::Sent => "Proposal marked as sent",
            Self::Accepted => "Proposal accepted by client!",
            Self::Rejected => "Proposal declined by client",
        }
    }
}

impl fmt::Display for BudgetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == needle)
            .ok_or_else(|| EngineError::UnknownStatus(s.to_string()))
    }
}

/// A requested status transition, with the fields that status accepts.
///
/// Every field is optional: whatever is left out keeps the value already
/// stored on the budget.
#[derive(Clone, Debug, PartialEq)]
pub enum StatusChange {
    Pending,
    Sent {
        amount: Option<Amount>,
    },
    Accepted {
        amount: Option<Amount>,
        installments: Option<bool>,
        installments_count: Option<u32>,
        first_payment_date: Option<NaiveDate>,
    },
    Rejected {
        reason: Option<String>,
    },
}

impl StatusChange {
    pub fn target(&self) -> BudgetStatus {
        match self {
            Self::Pending => BudgetStatus::Pending,
            Self::Sent { .. } => BudgetStatus::Sent,
            Self::Accepted { .. } => BudgetStatus::Accepted,
            Self::Rejected { .. } => BudgetStatus::Rejected,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason } => reason.as_deref(),
            _ => None,
        }
    }

    /// Merges the supplied fields over `form`.
    pub fn apply(&self, form: &mut BudgetForm) {
        match self {
            Self::Pending | Self::Rejected { .. } => {}
            Self::Sent { amount } => {
                if let Some(amount) = amount {
                    form.amount = Some(*amount);
                }
            }
            Self::Accepted {
                amount,
                installments,
                installments_count,
                first_payment_date,
            } => {
                if let Some(amount) = amount {
                    form.amount = Some(*amount);
                }
                if let Some(installments) = installments {
                    form.installments = *installments;
                }
                if let Some(count) = installments_count {
                    form.installments_count = *count;
                }
                if let Some(date) = first_payment_date {
                    form.first_payment_date = Some(*date);
                }
            }
        }
    }
}

use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{Amount, BudgetStatus, EngineError, ResultEngine};

/// Upper bound for the number of installments of an accepted budget.
pub const MAX_INSTALLMENTS: u32 = 36;

/// Opaque budget identifier, assigned by the server.
///
/// The server keys events by integer; [`BudgetId::wire_id`] is the only place
/// where that leaks.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BudgetId(String);

impl BudgetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the integer id used in `/events/{id}` paths.
    pub fn wire_id(&self) -> ResultEngine<i64> {
        self.0
            .trim()
            .parse()
            .map_err(|_| EngineError::InvalidId(self.0.clone()))
    }
}

impl From<i64> for BudgetId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for BudgetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of photographed event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Wedding,
    Birthday,
    Corporate,
    Portrait,
    Graduation,
    #[default]
    Other,
}

impl EventType {
    pub const ALL: [EventType; 6] = [
        Self::Wedding,
        Self::Birthday,
        Self::Corporate,
        Self::Portrait,
        Self::Graduation,
        Self::Other,
    ];

    /// Canonical key, as sent in `tipoEvento`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Wedding => "wedding",
            Self::Birthday => "birthday",
            Self::Corporate => "corporate",
            Self::Portrait => "portrait",
            Self::Graduation => "graduation",
            Self::Other => "other",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Wedding => "Wedding",
            Self::Birthday => "Birthday",
            Self::Corporate => "Corporate",
            Self::Portrait => "Portrait session",
            Self::Graduation => "Graduation",
            Self::Other => "Other",
        }
    }

    /// Reads a `tipoEvento` value written by any version of the frontend.
    ///
    /// Older records carry Portuguese keys; unknown values become `Other`.
    pub fn from_wire(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "wedding" | "casamento" => Self::Wedding,
            "birthday" | "aniversario" | "aniversário" => Self::Birthday,
            "corporate" | "corporativo" => Self::Corporate,
            "portrait" | "ensaio" | "ensaio_fotografico" => Self::Portrait,
            "graduation" | "formatura" => Self::Graduation,
            _ => Self::Other,
        }
    }
}

impl FromStr for EventType {
    type Err = EngineError;

    /// Strict parsing of a canonical key, for user input.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s.trim().to_lowercase())
            .ok_or_else(|| EngineError::InvalidEventType(s.to_string()))
    }
}

/// Editable fields of a budget.
///
/// This is what the create/edit forms produce and what the mapper turns into a
/// wire payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BudgetForm {
    pub client_name: String,
    pub phone: String,
    pub budget_date: NaiveDate,
    pub event_date: NaiveDate,
    pub event_type: EventType,
    pub amount: Option<Amount>,
    pub installments: bool,
    pub installments_count: u32,
    pub first_payment_date: Option<NaiveDate>,
}

impl BudgetForm {
    /// Creates a form with the mandatory fields and defaults for the rest.
    pub fn new(
        client_name: impl Into<String>,
        budget_date: NaiveDate,
        event_date: NaiveDate,
        event_type: EventType,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            phone: String::new(),
            budget_date,
            event_date,
            event_type,
            amount: None,
            installments: false,
            installments_count: 1,
            first_payment_date: None,
        }
    }

    /// Checks the invariants that can be verified without the server.
    pub fn validate(&self) -> ResultEngine<()> {
        if self.client_name.trim().is_empty() {
            return Err(EngineError::MissingField("client name"));
        }
        if let Some(amount) = self.amount
            && amount.is_negative()
        {
            return Err(EngineError::InvalidAmount(format!(
                "amount must be >= 0, got {amount}"
            )));
        }
        if self.installments && !(1..=MAX_INSTALLMENTS).contains(&self.installments_count) {
            return Err(EngineError::InvalidInstallments(format!(
                "count must be between 1 and {MAX_INSTALLMENTS}, got {}",
                self.installments_count
            )));
        }
        Ok(())
    }
}

/// A budget as cached by the client.
///
/// Every instance comes from the server: ids and timestamps are never made up
/// locally.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub client_name: String,
    pub phone: String,
    pub budget_date: NaiveDate,
    pub event_date: NaiveDate,
    pub event_type: EventType,
    pub amount: Option<Amount>,
    pub installments: bool,
    pub installments_count: u32,
    pub first_payment_date: Option<NaiveDate>,
    pub rejection_reason: Option<String>,
    pub status: BudgetStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Budget {
    /// Returns the editable fields of the budget.
    pub fn form(&self) -> BudgetForm {
        BudgetForm {
            client_name: self.client_name.clone(),
            phone: self.phone.clone(),
            budget_date: self.budget_date,
            event_date: self.event_date,
            event_type: self.event_type,
            amount: self.amount,
            installments: self.installments,
            installments_count: self.installments_count,
            first_payment_date: self.first_payment_date,
        }
    }
}

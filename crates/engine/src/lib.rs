//! Budget domain of the photography studio.
//!
//! The engine is pure: it models budgets and their status workflow, maps
//! them to and from the backend's wire format and computes the dashboard and
//! calendar views. Talking to the server is the client's job.
pub use amount::Amount;
pub use budget::{Budget, BudgetForm, BudgetId, EventType, MAX_INSTALLMENTS};
pub use error::EngineError;
pub use status::{BudgetStatus, FieldRule, StatusChange, StatusFields};

pub mod calendar;
pub mod date;
pub mod mapper;
pub mod stats;

mod amount;
mod budget;
mod error;
mod status;

pub type ResultEngine<T> = Result<T, EngineError>;

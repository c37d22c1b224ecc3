//! Client side of the budget backend.
//!
//! [`ApiClient`] speaks HTTP, [`Session`] carries the credentials and
//! [`BudgetStore`] keeps the cached budgets of a session in sync with the
//! server.
pub use api::ApiClient;
pub use error::{ApiError, SessionError, StoreError};
pub use notice::{Notice, NoticeLevel};
pub use session::{Claims, Session};
pub use store::{BudgetStore, Snapshot};

mod api;
mod error;
mod notice;
mod session;
mod store;

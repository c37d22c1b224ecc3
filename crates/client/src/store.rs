//! Cached budgets of a session.
//!
//! The cache is never edited from local data: every mutation goes to the
//! server first and the cache takes whatever the server answered. A failed
//! call leaves the cache as it was. Concurrent calls on the same budget are
//! not coordinated, the last response to arrive wins.
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

use chrono::Utc;
use engine::{Budget, BudgetForm, BudgetId, BudgetStatus, StatusChange, mapper};
use tokio::sync::{broadcast, watch};

use crate::{
    api::ApiClient,
    error::StoreError,
    notice::Notice,
    session::Session,
};

const NOTICE_CAPACITY: usize = 32;
const LOAD_FAILED: &str = "Failed to load budgets";
const SESSION_EXPIRED: &str = "Session expired, please log in again";

/// State published to subscribers after every change.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    pub budgets: Vec<Budget>,
    /// `true` while at least one operation is in flight.
    pub loading: bool,
    /// Set when the last refresh failed.
    pub error: Option<String>,
    /// Cleared once the server rejects the session.
    pub authenticated: bool,
}

struct Inner {
    api: ApiClient,
    session: Session,
    state: watch::Sender<Snapshot>,
    notices: broadcast::Sender<Notice>,
    in_flight: AtomicUsize,
}

/// Keeps `loading` raised for as long as it lives.
struct InFlight<'a> {
    inner: &'a Inner,
}

impl<'a> InFlight<'a> {
    fn start(inner: &'a Inner) -> Self {
        inner.state.send_modify(|state| {
            inner.in_flight.fetch_add(1, Ordering::SeqCst);
            state.loading = true;
        });
        Self { inner }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let inner = self.inner;
        inner.state.send_modify(|state| {
            let remaining = inner.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            state.loading = remaining > 0;
        });
    }
}

/// Budget cache of one session, shared by cloning.
#[derive(Clone)]
pub struct BudgetStore {
    inner: Arc<Inner>,
}

impl BudgetStore {
    pub fn new(api: ApiClient, session: Session) -> Self {
        let authenticated = session.is_valid_at(Utc::now());
        let (state, _) = watch::channel(Snapshot {
            authenticated,
            ..Snapshot::default()
        });
        let (notices, _) = broadcast::channel(NOTICE_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                api,
                session,
                state,
                notices,
                in_flight: AtomicUsize::new(0),
            }),
        }
    }

    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    /// Receives a new [`Snapshot`] after every change.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.inner.state.subscribe()
    }

    /// Receives the notices published from now on.
    pub fn notices(&self) -> broadcast::Receiver<Notice> {
        self.inner.notices.subscribe()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.inner.state.borrow().clone()
    }

    pub fn budgets(&self) -> Vec<Budget> {
        self.inner.state.borrow().budgets.clone()
    }

    pub fn get(&self, id: &BudgetId) -> Option<Budget> {
        self.inner
            .state
            .borrow()
            .budgets
            .iter()
            .find(|budget| &budget.id == id)
            .cloned()
    }

    pub fn is_loading(&self) -> bool {
        self.inner.state.borrow().loading
    }

    /// Replaces the whole cache with the server's list.
    ///
    /// On failure the cache is emptied and the snapshot carries an error.
    pub async fn refresh(&self) -> Result<Vec<Budget>, StoreError> {
        let _in_flight = InFlight::start(&self.inner);
        self.inner.state.send_modify(|state| state.error = None);

        match self.fetch_all().await {
            Ok(budgets) => {
                tracing::info!("loaded {} budgets", budgets.len());
                let cached = budgets.clone();
                self.inner.state.send_modify(|state| state.budgets = cached);
                Ok(budgets)
            }
            Err(err) => {
                self.inner.state.send_modify(|state| {
                    state.budgets.clear();
                    state.error = Some(LOAD_FAILED.to_string());
                });
                self.report_failure(&err, LOAD_FAILED);
                Err(err)
            }
        }
    }

    /// Creates a budget. New budgets always start as pending.
    pub async fn add(&self, form: BudgetForm) -> Result<Budget, StoreError> {
        let _in_flight = InFlight::start(&self.inner);
        let result = self.create(form).await;
        self.settle(result, "Budget created", "Failed to create budget")
    }

    /// Saves edited fields. The status and decline reason are left untouched.
    pub async fn update(&self, id: &BudgetId, form: BudgetForm) -> Result<Budget, StoreError> {
        let _in_flight = InFlight::start(&self.inner);
        let result = self.edit(id, form).await;
        self.settle(result, "Budget updated", "Failed to update budget")
    }

    /// Deletes a budget on the server, then drops it from the cache.
    ///
    /// The delete is sent even when the id is not cached.
    pub async fn remove(&self, id: &BudgetId) -> Result<(), StoreError> {
        let _in_flight = InFlight::start(&self.inner);
        let result = self.delete(id).await;
        self.settle(result, "Budget deleted", "Failed to delete budget")
    }

    /// Moves a budget into another status, merging the fields carried by
    /// `change` over the cached ones.
    pub async fn change_status(
        &self,
        id: &BudgetId,
        change: StatusChange,
    ) -> Result<Budget, StoreError> {
        let _in_flight = InFlight::start(&self.inner);
        let target = change.target();
        let result = self.transition(id, change).await;
        self.settle(
            result,
            target.confirmation(),
            "Failed to update budget status",
        )
    }

    async fn fetch_all(&self) -> Result<Vec<Budget>, StoreError> {
        let events = self.inner.api.list_events(&self.inner.session).await?;
        let budgets = events
            .into_iter()
            .map(mapper::from_wire)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(budgets)
    }

    async fn create(&self, form: BudgetForm) -> Result<Budget, StoreError> {
        form.validate()?;
        let payload = mapper::to_wire(&form, BudgetStatus::Pending, None);
        let created = self
            .inner
            .api
            .create_event(&self.inner.session, &payload)
            .await?;
        let budget = mapper::from_wire(created)?;

        let cached = budget.clone();
        self.inner.state.send_modify(|state| {
            match state.budgets.iter_mut().find(|b| b.id == cached.id) {
                Some(existing) => *existing = cached,
                None => state.budgets.push(cached),
            }
        });
        tracing::info!("created budget {}", budget.id);
        Ok(budget)
    }

    async fn edit(&self, id: &BudgetId, form: BudgetForm) -> Result<Budget, StoreError> {
        let current = self.cached(id)?;
        form.validate()?;
        let payload = mapper::to_wire(&form, current.status, current.rejection_reason.as_deref());
        let budget = self.send_update(id, &payload).await?;
        tracing::info!("updated budget {id}");
        Ok(budget)
    }

    async fn delete(&self, id: &BudgetId) -> Result<(), StoreError> {
        let wire_id = id.wire_id()?;
        self.inner
            .api
            .delete_event(&self.inner.session, wire_id)
            .await?;
        self.inner
            .state
            .send_modify(|state| state.budgets.retain(|budget| &budget.id != id));
        tracing::info!("deleted budget {id}");
        Ok(())
    }

    async fn transition(&self, id: &BudgetId, change: StatusChange) -> Result<Budget, StoreError> {
        let current = self.cached(id)?;
        let mut form = current.form();
        change.apply(&mut form);
        form.validate()?;

        // A decline without a new reason keeps the recorded one.
        let reason = change
            .rejection_reason()
            .or(current.rejection_reason.as_deref());
        let target = change.target();
        let payload = mapper::to_wire(&form, target, reason);
        let budget = self.send_update(id, &payload).await?;
        tracing::info!("budget {id}: {} -> {target}", current.status);
        Ok(budget)
    }

    async fn send_update(
        &self,
        id: &BudgetId,
        payload: &api_types::event::EventPayload,
    ) -> Result<Budget, StoreError> {
        let wire_id = id.wire_id()?;
        let updated = self
            .inner
            .api
            .update_event(&self.inner.session, wire_id, payload)
            .await?;
        let budget = mapper::from_wire(updated)?;

        let cached = budget.clone();
        self.inner.state.send_modify(|state| {
            if let Some(existing) = state.budgets.iter_mut().find(|b| &b.id == id) {
                *existing = cached;
            }
        });
        Ok(budget)
    }

    fn cached(&self, id: &BudgetId) -> Result<Budget, StoreError> {
        self.get(id)
            .ok_or_else(|| StoreError::UnknownBudget(id.clone()))
    }

    fn settle<T>(
        &self,
        result: Result<T, StoreError>,
        success: &str,
        failure: &str,
    ) -> Result<T, StoreError> {
        match &result {
            Ok(_) => self.publish(Notice::success(success)),
            Err(err) => self.report_failure(err, failure),
        }
        result
    }

    fn report_failure(&self, err: &StoreError, message: &str) {
        tracing::error!("{message}: {err}");
        if matches!(err, StoreError::SessionExpired) {
            self.inner
                .state
                .send_modify(|state| state.authenticated = false);
            self.publish(Notice::error(SESSION_EXPIRED));
        } else {
            self.publish(Notice::error(format!("{message}: {err}")));
        }
    }

    fn publish(&self, notice: Notice) {
        // Nobody listening is fine.
        let _ = self.inner.notices.send(notice);
    }
}

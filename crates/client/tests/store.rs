mod common;

use axum::http::{Method, StatusCode};
use chrono::NaiveDate;
use client::{NoticeLevel, Session, SessionError, StoreError};
use common::{Gate, api, spawn_backend, store_for};
use engine::{Amount, BudgetForm, BudgetId, BudgetStatus, EventType, StatusChange};
use tokio::sync::oneshot;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn form(name: &str) -> BudgetForm {
    let mut form = BudgetForm::new(name, date(2024, 1, 5), date(2024, 1, 1), EventType::Birthday);
    form.phone = "11 98888-7777".to_string();
    form
}

#[tokio::test]
async fn refresh_replaces_cache_with_server_list() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    backend.seed(2, "Bruno", "proposta_aceita");
    let store = store_for(&backend, addr);

    let budgets = store.refresh().await.unwrap();
    assert_eq!(budgets.len(), 2);

    let snapshot = store.snapshot();
    assert_eq!(snapshot.budgets, budgets);
    assert!(!snapshot.loading);
    assert!(snapshot.error.is_none());
    assert!(snapshot.authenticated);
    assert_eq!(
        store.get(&BudgetId::from(2)).unwrap().status,
        BudgetStatus::Accepted
    );
}

#[tokio::test]
async fn failed_refresh_empties_cache_and_sets_error() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let mut notices = store.notices();
    backend.fail_next_with(StatusCode::INTERNAL_SERVER_ERROR);
    let err = store.refresh().await.unwrap_err();
    assert!(matches!(err, StoreError::Api(_)));

    let snapshot = store.snapshot();
    assert!(snapshot.budgets.is_empty());
    assert_eq!(snapshot.error.as_deref(), Some("Failed to load budgets"));
    assert_eq!(notices.recv().await.unwrap().level, NoticeLevel::Error);
    assert_eq!(
        backend
            .requests()
            .iter()
            .filter(|r| r.method == Method::GET)
            .count(),
        2
    );
}

#[tokio::test]
async fn add_caches_the_server_representation() {
    let (backend, addr) = spawn_backend().await;
    let store = store_for(&backend, addr);
    let mut notices = store.notices();

    let created = store.add(form("Carla")).await.unwrap();
    assert_eq!(created.id, BudgetId::from(1));
    assert_eq!(created.status, BudgetStatus::Pending);
    assert!(created.created_at.is_some());
    assert_eq!(store.budgets(), vec![created.clone()]);
    assert_eq!(notices.recv().await.unwrap().message, "Budget created");

    let body = backend.requests()[0].body.clone().unwrap();
    assert_eq!(body["status"], "orcamento_recebido");
    assert_eq!(body["dataEvento"], "2024-01-01");
    assert_eq!(body["valorEvento"], serde_json::json!(0.0));
    assert!(body.get("motivoRecusa").is_none());
}

#[tokio::test]
async fn invalid_form_never_reaches_the_server() {
    let (backend, addr) = spawn_backend().await;
    let store = store_for(&backend, addr);

    let err = store.add(form("  ")).await.unwrap_err();
    assert!(matches!(err, StoreError::Invalid(_)));
    assert!(backend.requests().is_empty());
    assert!(store.budgets().is_empty());
}

#[tokio::test]
async fn update_keeps_current_status() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(4, "Ana", "proposta_enviada");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let id = BudgetId::from(4);
    let mut edited = store.get(&id).unwrap().form();
    edited.client_name = "Ana Lima".to_string();
    edited.amount = Some(Amount::new(80_000));

    let updated = store.update(&id, edited).await.unwrap();
    assert_eq!(updated.status, BudgetStatus::Sent);
    assert_eq!(updated.client_name, "Ana Lima");
    assert_eq!(store.get(&id).unwrap(), updated);

    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["status"], "proposta_enviada");
    assert_eq!(body["valorEvento"], serde_json::json!(800.0));
}

#[tokio::test]
async fn update_of_unknown_budget_fails_locally() {
    let (backend, addr) = spawn_backend().await;
    let store = store_for(&backend, addr);

    let err = store
        .update(&BudgetId::from(77), form("Ghost"))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::UnknownBudget(id) if id == BudgetId::from(77)));
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn accepting_with_installments_updates_cache() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();
    let mut notices = store.notices();

    let id = BudgetId::from(1);
    let first = date(2024, 3, 10);
    let budget = store
        .change_status(
            &id,
            StatusChange::Accepted {
                amount: Some(Amount::new(100_000)),
                installments: Some(true),
                installments_count: Some(3),
                first_payment_date: Some(first),
            },
        )
        .await
        .unwrap();

    assert_eq!(budget.status, BudgetStatus::Accepted);
    assert_eq!(budget.amount, Some(Amount::new(100_000)));
    assert_eq!(budget.installments_count, 3);
    assert_eq!(budget.first_payment_date, Some(first));
    assert_eq!(store.get(&id).unwrap(), budget);
    assert_eq!(
        notices.recv().await.unwrap().message,
        "Proposal accepted by client!"
    );

    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["dataPrimeiroPagamento"], "2024-03-10");
    assert_eq!(body["quantParcelas"], 3);
    assert!(body.get("motivoRecusa").is_none());
}

#[tokio::test]
async fn sending_without_amount_sends_zero() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    store
        .change_status(&BudgetId::from(1), StatusChange::Sent { amount: None })
        .await
        .unwrap();

    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["status"], "proposta_enviada");
    assert_eq!(body["valorEvento"], serde_json::json!(0.0));
}

#[tokio::test]
async fn declining_carries_the_reason() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "proposta_enviada");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let budget = store
        .change_status(
            &BudgetId::from(1),
            StatusChange::Rejected {
                reason: Some("Budget too high".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(budget.status, BudgetStatus::Rejected);
    assert_eq!(budget.rejection_reason.as_deref(), Some("Budget too high"));

    // Reopening a declined proposal is allowed and drops the reason.
    store
        .change_status(&BudgetId::from(1), StatusChange::Pending)
        .await
        .unwrap();
    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["status"], "orcamento_recebido");
    assert!(body.get("motivoRecusa").is_none());
}

fn seed_declined(backend: &common::Backend, id: i64, reason: &str) {
    backend.seed(id, "Ana", "proposta_recusada");
    if let Some(event) = backend.events.lock().unwrap().get_mut(&id) {
        event.rejection_reason = Some(reason.to_string());
    }
}

#[tokio::test]
async fn editing_a_declined_budget_keeps_its_reason() {
    let (backend, addr) = spawn_backend().await;
    seed_declined(&backend, 1, "too expensive");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let id = BudgetId::from(1);
    let mut edited = store.get(&id).unwrap().form();
    edited.phone = "11 91234-5678".to_string();
    let budget = store.update(&id, edited).await.unwrap();

    assert_eq!(budget.status, BudgetStatus::Rejected);
    assert_eq!(budget.rejection_reason.as_deref(), Some("too expensive"));
    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["motivoRecusa"], "too expensive");
}

#[tokio::test]
async fn declining_again_without_reason_keeps_the_recorded_one() {
    let (backend, addr) = spawn_backend().await;
    seed_declined(&backend, 1, "date taken");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let budget = store
        .change_status(&BudgetId::from(1), StatusChange::Rejected { reason: None })
        .await
        .unwrap();

    assert_eq!(budget.rejection_reason.as_deref(), Some("date taken"));
    let body = backend.requests().last().unwrap().body.clone().unwrap();
    assert_eq!(body["motivoRecusa"], "date taken");
}

#[tokio::test]
async fn remove_of_uncached_id_still_calls_delete() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();
    backend.seed(99, "Created elsewhere", "orcamento_recebido");

    let before = store.budgets();
    store.remove(&BudgetId::from(99)).await.unwrap();

    assert_eq!(store.budgets(), before);
    let last = backend.requests().last().cloned().unwrap();
    assert_eq!(last.method, Method::DELETE);
    assert_eq!(last.path, "/events/99");
}

#[tokio::test]
async fn remove_drops_the_cached_entry() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    backend.seed(2, "Bruno", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    store.remove(&BudgetId::from(1)).await.unwrap();
    let ids: Vec<BudgetId> = store.budgets().into_iter().map(|b| b.id).collect();
    assert_eq!(ids, vec![BudgetId::from(2)]);
}

#[tokio::test]
async fn failed_mutation_leaves_cache_untouched() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();
    let before = store.budgets();

    backend.fail_next_with(StatusCode::UNPROCESSABLE_ENTITY);
    let err = store
        .change_status(
            &BudgetId::from(1),
            StatusChange::Sent {
                amount: Some(Amount::new(10_000)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Api(client::ApiError::Validation(ref msg)) if msg == "Erro simulado"));

    backend.fail_next_with(StatusCode::INTERNAL_SERVER_ERROR);
    assert!(store.remove(&BudgetId::from(1)).await.is_err());

    assert_eq!(store.budgets(), before);
    assert!(!store.is_loading());
}

#[tokio::test]
async fn rejected_token_expires_the_session() {
    let (backend, addr) = spawn_backend().await;
    let stale = Session::from_token(common::token_for("someone@example.com", 3600)).unwrap();
    let store = client::BudgetStore::new(api(addr), stale);
    let mut notices = store.notices();

    let err = store.refresh().await.unwrap_err();
    assert!(matches!(err, StoreError::SessionExpired));
    assert!(!store.snapshot().authenticated);
    assert_eq!(
        notices.recv().await.unwrap().message,
        "Session expired, please log in again"
    );
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn login_decodes_the_returned_token() {
    let (_backend, addr) = spawn_backend().await;
    let session = Session::login(&api(addr), "ana@example.com", "secret")
        .await
        .unwrap();
    assert_eq!(session.claims().sub, "ana@example.com");
    assert_eq!(session.user_name(), Some("Ana"));

    let err = Session::login(&api(addr), "ana@example.com", "wrong")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Api(client::ApiError::Unauthorized)));
}

#[tokio::test]
async fn concurrent_status_changes_last_response_wins() {
    let (backend, addr) = spawn_backend().await;
    backend.seed(1, "Ana", "orcamento_recebido");
    let store = store_for(&backend, addr);
    store.refresh().await.unwrap();

    let (arrived_tx, arrived_rx) = oneshot::channel();
    let (release_tx, release_rx) = oneshot::channel();
    *backend.gate.lock().unwrap() = Some(Gate {
        arrived: arrived_tx,
        release: release_rx,
    });

    let id = BudgetId::from(1);
    let first = {
        let store = store.clone();
        let id = id.clone();
        tokio::spawn(async move {
            store
                .change_status(
                    &id,
                    StatusChange::Sent {
                        amount: Some(Amount::new(50_000)),
                    },
                )
                .await
        })
    };
    arrived_rx.await.unwrap();
    assert!(store.is_loading());

    let second = store
        .change_status(
            &id,
            StatusChange::Accepted {
                amount: Some(Amount::new(100_000)),
                installments: None,
                installments_count: None,
                first_payment_date: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(second.status, BudgetStatus::Accepted);
    assert_eq!(store.get(&id).unwrap().status, BudgetStatus::Accepted);
    assert!(store.is_loading());

    release_tx.send(()).unwrap();
    let first = first.await.unwrap().unwrap();

    assert_eq!(first.status, BudgetStatus::Sent);
    let cached = store.get(&id).unwrap();
    assert_eq!(cached.status, BudgetStatus::Sent);
    assert_eq!(cached.amount, Some(Amount::new(50_000)));
    assert!(!store.is_loading());
}

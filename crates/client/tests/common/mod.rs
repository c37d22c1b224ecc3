//! In-process stand-in for the budget backend.
#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use api_types::event::{EventOut, EventPayload};
use axum::{
    Json, Router,
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use client::{ApiClient, BudgetStore, Session};
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// A request as received by the fake backend.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Holds the first `PATCH` until released.
pub struct Gate {
    pub arrived: oneshot::Sender<()>,
    pub release: oneshot::Receiver<()>,
}

#[derive(Default)]
pub struct Backend {
    pub token: String,
    pub events: Mutex<BTreeMap<i64, EventOut>>,
    pub requests: Mutex<Vec<Recorded>>,
    pub fail_next: Mutex<Option<StatusCode>>,
    pub gate: Mutex<Option<Gate>>,
    next_id: Mutex<i64>,
    revision: Mutex<u32>,
}

impl Backend {
    pub fn seed(&self, id: i64, client_name: &str, status: &str) {
        let event = EventOut {
            id,
            client_name: client_name.to_string(),
            event_type: Some("wedding".to_string()),
            budget_date: "2024-01-10".to_string(),
            event_date: "2024-06-15".to_string(),
            status: Some(status.to_string()),
            amount: None,
            installments: None,
            installments_count: None,
            first_payment_date: None,
            phone: Some("11 99999-0000".to_string()),
            rejection_reason: None,
            created_at: Some("2024-01-10T09:00:00".to_string()),
            updated_at: Some("2024-01-10T09:00:00".to_string()),
        };
        self.events.lock().unwrap().insert(id, event);
        let mut next_id = self.next_id.lock().unwrap();
        *next_id = (*next_id).max(id);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn fail_next_with(&self, status: StatusCode) {
        *self.fail_next.lock().unwrap() = Some(status);
    }

    fn record(&self, method: Method, path: String, body: Option<Value>) {
        self.requests
            .lock()
            .unwrap()
            .push(Recorded { method, path, body });
    }

    fn check(&self, bearer: &Bearer) -> Result<(), Response> {
        if bearer.token() != self.token {
            return Err((StatusCode::UNAUTHORIZED, Json(json!({"detail": "Token inválido"})))
                .into_response());
        }
        if let Some(status) = self.fail_next.lock().unwrap().take() {
            return Err((status, Json(json!({"detail": "Erro simulado"}))).into_response());
        }
        Ok(())
    }

    fn stamp(&self) -> String {
        let mut revision = self.revision.lock().unwrap();
        *revision += 1;
        format!("2024-02-01T10:{:02}:00", *revision % 60)
    }
}

fn apply(event: &mut EventOut, payload: EventPayload) {
    event.client_name = payload.client_name;
    event.event_type = Some(payload.event_type);
    event.budget_date = payload.budget_date;
    event.event_date = payload.event_date;
    event.status = Some(payload.status.as_str().to_string());
    event.amount = Some(payload.amount);
    event.installments = Some(payload.installments);
    event.installments_count = Some(payload.installments_count);
    event.first_payment_date = payload.first_payment_date;
    event.phone = Some(payload.phone);
    event.rejection_reason = payload.rejection_reason;
}

type Shared = State<Arc<Backend>>;
type BearerHeader = TypedHeader<Authorization<Bearer>>;

async fn list(State(backend): Shared, TypedHeader(auth): BearerHeader) -> Response {
    backend.record(Method::GET, "/events/".to_string(), None);
    if let Err(res) = backend.check(&auth.0) {
        return res;
    }
    let events: Vec<EventOut> = backend.events.lock().unwrap().values().cloned().collect();
    Json(events).into_response()
}

async fn create(State(backend): Shared, TypedHeader(auth): BearerHeader, Json(body): Json<Value>) -> Response {
    backend.record(Method::POST, "/events/".to_string(), Some(body.clone()));
    if let Err(res) = backend.check(&auth.0) {
        return res;
    }
    let Ok(payload) = serde_json::from_value::<EventPayload>(body) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    let id = {
        let mut next_id = backend.next_id.lock().unwrap();
        *next_id += 1;
        *next_id
    };
    let stamp = backend.stamp();
    let mut event = EventOut {
        id,
        client_name: String::new(),
        event_type: None,
        budget_date: String::new(),
        event_date: String::new(),
        status: None,
        amount: None,
        installments: None,
        installments_count: None,
        first_payment_date: None,
        phone: None,
        rejection_reason: None,
        created_at: Some(stamp.clone()),
        updated_at: Some(stamp),
    };
    apply(&mut event, payload);
    backend.events.lock().unwrap().insert(id, event.clone());
    (StatusCode::CREATED, Json(event)).into_response()
}

async fn update(
    State(backend): Shared,
    Path(id): Path<i64>,
    TypedHeader(auth): BearerHeader,
    Json(body): Json<Value>,
) -> Response {
    backend.record(Method::PATCH, format!("/events/{id}"), Some(body.clone()));
    if let Err(res) = backend.check(&auth.0) {
        return res;
    }
    let Ok(payload) = serde_json::from_value::<EventPayload>(body) else {
        return StatusCode::UNPROCESSABLE_ENTITY.into_response();
    };

    let gate = backend.gate.lock().unwrap().take();
    if let Some(gate) = gate {
        let _ = gate.arrived.send(());
        let _ = gate.release.await;
    }

    let stamp = backend.stamp();
    let mut events = backend.events.lock().unwrap();
    let Some(event) = events.get_mut(&id) else {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"detail": "Evento não encontrado"})),
        )
            .into_response();
    };
    apply(event, payload);
    event.updated_at = Some(stamp);
    Json(event.clone()).into_response()
}

async fn delete(State(backend): Shared, Path(id): Path<i64>, TypedHeader(auth): BearerHeader) -> Response {
    backend.record(Method::DELETE, format!("/events/{id}"), None);
    if let Err(res) = backend.check(&auth.0) {
        return res;
    }
    backend.events.lock().unwrap().remove(&id);
    StatusCode::NO_CONTENT.into_response()
}

async fn login(State(backend): Shared, Json(body): Json<Value>) -> Response {
    if body["password"] == "secret" {
        Json(json!({"access_token": backend.token, "token_type": "bearer"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Credenciais inválidas"})),
        )
            .into_response()
    }
}

/// Builds an unsigned JWT expiring `ttl_secs` from now.
pub fn token_for(sub: &str, ttl_secs: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "sub": sub,
        "id": 1,
        "name": "Ana",
        "exp": chrono::Utc::now().timestamp() + ttl_secs,
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

/// Starts the fake backend on an ephemeral port.
pub async fn spawn_backend() -> (Arc<Backend>, SocketAddr) {
    let backend = Arc::new(Backend {
        token: token_for("ana@example.com", 3600),
        ..Backend::default()
    });

    let router = Router::new()
        .route("/api/events/", get(list).post(create))
        .route("/api/events/{id}", patch(update).delete(delete))
        .route("/api/login", axum::routing::post(login))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (backend, addr)
}

pub fn api(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{addr}/api")).unwrap()
}

pub fn store_for(backend: &Backend, addr: SocketAddr) -> BudgetStore {
    BudgetStore::new(api(addr), Session::from_token(backend.token.clone()).unwrap())
}

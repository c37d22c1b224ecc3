//! Wire format of the remote budget API.
//!
//! The backend speaks Portuguese: budgets are "events", field names are
//! camelCase Portuguese and the status vocabulary differs from the one used by
//! the engine. Every struct here mirrors the JSON byte for byte; conversion
//! to and from the domain model lives in `engine::mapper`.
use serde::{Deserialize, Serialize};

pub mod event {
    use super::*;

    /// Status codes understood by the backend.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum EventStatus {
        OrcamentoRecebido,
        PropostaEnviada,
        PropostaAceita,
        PropostaRecusada,
    }

    impl EventStatus {
        /// Returns the code as sent on the wire.
        pub fn as_str(self) -> &'static str {
            match self {
                Self::OrcamentoRecebido => "orcamento_recebido",
                Self::PropostaEnviada => "proposta_enviada",
                Self::PropostaAceita => "proposta_aceita",
                Self::PropostaRecusada => "proposta_recusada",
            }
        }

        /// Parses a wire code. Unknown codes yield `None`.
        pub fn from_code(code: &str) -> Option<Self> {
            match code {
                "orcamento_recebido" => Some(Self::OrcamentoRecebido),
                "proposta_enviada" => Some(Self::PropostaEnviada),
                "proposta_aceita" => Some(Self::PropostaAceita),
                "proposta_recusada" => Some(Self::PropostaRecusada),
                _ => None,
            }
        }
    }

    /// Request body for `POST /events/` and `PATCH /events/{id}`.
    ///
    /// Dates are `YYYY-MM-DD` strings. `motivoRecusa` is omitted entirely
    /// unless the target status is a refusal: the backend reads its presence
    /// as a signal.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct EventPayload {
        #[serde(rename = "nomeCliente")]
        pub client_name: String,
        #[serde(rename = "tipoEvento")]
        pub event_type: String,
        #[serde(rename = "dataOrcamento")]
        pub budget_date: String,
        #[serde(rename = "dataEvento")]
        pub event_date: String,
        pub status: EventStatus,
        #[serde(rename = "valorEvento")]
        pub amount: f64,
        #[serde(rename = "iraParcelar")]
        pub installments: bool,
        #[serde(rename = "quantParcelas")]
        pub installments_count: u32,
        #[serde(rename = "dataPrimeiroPagamento")]
        pub first_payment_date: Option<String>,
        #[serde(rename = "contatoCliente")]
        pub phone: String,
        #[serde(
            rename = "motivoRecusa",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        pub rejection_reason: Option<String>,
    }

    /// Event object returned by the backend.
    ///
    /// Everything except the id, the client name and the two mandatory dates is
    /// optional: older records and partial updates leave holes. `status` is kept
    /// as a raw string so an unknown code never fails deserialization.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub struct EventOut {
        pub id: i64,
        #[serde(rename = "nomeCliente")]
        pub client_name: String,
        #[serde(rename = "tipoEvento", default)]
        pub event_type: Option<String>,
        #[serde(rename = "dataOrcamento")]
        pub budget_date: String,
        #[serde(rename = "dataEvento")]
        pub event_date: String,
        #[serde(default)]
        pub status: Option<String>,
        #[serde(rename = "valorEvento", default)]
        pub amount: Option<f64>,
        #[serde(rename = "iraParcelar", default)]
        pub installments: Option<bool>,
        #[serde(rename = "quantParcelas", default)]
        pub installments_count: Option<u32>,
        #[serde(rename = "dataPrimeiroPagamento", default)]
        pub first_payment_date: Option<String>,
        #[serde(rename = "contatoCliente", default)]
        pub phone: Option<String>,
        #[serde(rename = "motivoRecusa", default)]
        pub rejection_reason: Option<String>,
        #[serde(default)]
        pub created_at: Option<String>,
        #[serde(default)]
        pub updated_at: Option<String>,
    }
}

pub mod auth {
    use super::*;

    /// Request body for `POST /login`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginRequest {
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct LoginResponse {
        pub access_token: String,
        #[serde(default)]
        pub token_type: Option<String>,
    }

    /// Request body for `POST /users/`.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserNew {
        pub name: String,
        pub email: String,
        pub password: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct UserOut {
        pub id: i64,
        #[serde(default)]
        pub name: Option<String>,
        pub email: String,
    }
}

pub mod error {
    use super::*;

    /// Error body of a non-2xx response.
    ///
    /// `detail` is either a plain message or, for request validation errors,
    /// a list of objects carrying a `msg` field.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ErrorBody {
        #[serde(default)]
        pub detail: serde_json::Value,
    }

    impl ErrorBody {
        /// Flattens `detail` into a single human readable message.
        pub fn message(&self) -> Option<String> {
            match &self.detail {
                serde_json::Value::String(message) => Some(message.clone()),
                serde_json::Value::Array(items) => {
                    let messages: Vec<&str> = items
                        .iter()
                        .filter_map(|item| item.get("msg").and_then(|msg| msg.as_str()))
                        .collect();
                    if messages.is_empty() {
                        None
                    } else {
                        Some(messages.join("; "))
                    }
                }
                _ => None,
            }
        }
    }
}

//! Authenticated session.
//!
//! The backend hands out a JWT on login. Its claims are read locally to know
//! who is logged in and until when; the signature is not checked here, the
//! server does that on every request.
use std::fmt;

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{api::ApiClient, error::SessionError};

/// Seconds before `exp` after which the token is already treated as expired.
const CLOCK_SKEW_SECS: i64 = 30;
/// Seconds before `exp` during which the token should be renewed.
const REFRESH_WINDOW_SECS: i64 = 300;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

#[derive(Clone)]
pub struct Session {
    token: String,
    claims: Claims,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &"<redacted>")
            .field("claims", &self.claims)
            .finish()
    }
}

impl Session {
    /// Builds a session from a bearer token, decoding its claims.
    pub fn from_token(token: impl Into<String>) -> Result<Self, SessionError> {
        let token = token.into();
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionError::Malformed(
                "expected three dot-separated segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(payload.trim_end_matches('='))
            .map_err(|err| SessionError::Malformed(err.to_string()))?;
        let claims: Claims =
            serde_json::from_slice(&bytes).map_err(|err| SessionError::Malformed(err.to_string()))?;

        Ok(Self { token, claims })
    }

    /// Logs in and returns the resulting session.
    pub async fn login(api: &ApiClient, email: &str, password: &str) -> Result<Self, SessionError> {
        let response = api.login(email, password).await?;
        let session = Self::from_token(response.access_token)?;
        if !session.is_valid_at(Utc::now()) {
            return Err(SessionError::Expired);
        }
        tracing::info!("logged in as {}", session.claims.sub);
        Ok(session)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn claims(&self) -> &Claims {
        &self.claims
    }

    pub fn user_id(&self) -> Option<i64> {
        self.claims.id
    }

    pub fn user_name(&self) -> Option<&str> {
        self.claims.name.as_deref()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.claims.exp, 0)
    }

    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        self.claims.exp > now.timestamp() + CLOCK_SKEW_SECS
    }

    pub fn needs_refresh_at(&self, now: DateTime<Utc>) -> bool {
        self.is_valid_at(now) && self.claims.exp - now.timestamp() < REFRESH_WINDOW_SECS
    }

    /// Whole minutes left before expiry, never negative.
    pub fn expires_in_minutes(&self, now: DateTime<Utc>) -> i64 {
        ((self.claims.exp - now.timestamp()) / 60).max(0)
    }
}

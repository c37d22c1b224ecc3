use api_types::{
    auth::{LoginRequest, LoginResponse, UserNew, UserOut},
    error::ErrorBody,
    event::{EventOut, EventPayload},
};
use reqwest::{Method, RequestBuilder, Response, Url};

use crate::{error::ApiError, session::Session};

/// HTTP client for the budget backend.
///
/// Holds no credentials: every authenticated call takes the [`Session`] it
/// runs on behalf of.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: Url,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_client(base_url: &str, http: reqwest::Client) -> Result<Self, ApiError> {
        // `Url::join` drops the last segment unless the base ends with a slash.
        let normalized = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        let base_url = Url::parse(&normalized).map_err(|err| ApiError::BaseUrl(err.to_string()))?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|err| ApiError::BaseUrl(err.to_string()))
    }

    fn authorized(
        &self,
        method: Method,
        path: &str,
        session: &Session,
    ) -> Result<RequestBuilder, ApiError> {
        Ok(self
            .http
            .request(method, self.endpoint(path)?)
            .bearer_auth(session.token()))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, ApiError> {
        let res = request.send().await?;
        if res.status().is_success() {
            return Ok(res);
        }

        let status = res.status();
        let message = res
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message())
            .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));

        let err = match status.as_u16() {
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound(message),
            409 => ApiError::Conflict(message),
            400 | 422 => ApiError::Validation(message),
            _ => ApiError::Server { status, message },
        };
        Err(err)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let payload = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.http.post(self.endpoint("login")?).json(&payload);
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserOut, ApiError> {
        let payload = UserNew {
            name: name.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };
        let request = self.http.post(self.endpoint("users/")?).json(&payload);
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn list_events(&self, session: &Session) -> Result<Vec<EventOut>, ApiError> {
        let request = self.authorized(Method::GET, "events/", session)?;
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn create_event(
        &self,
        session: &Session,
        payload: &EventPayload,
    ) -> Result<EventOut, ApiError> {
        let request = self
            .authorized(Method::POST, "events/", session)?
            .json(payload);
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn update_event(
        &self,
        session: &Session,
        id: i64,
        payload: &EventPayload,
    ) -> Result<EventOut, ApiError> {
        let request = self
            .authorized(Method::PATCH, &format!("events/{id}"), session)?
            .json(payload);
        Ok(self.send(request).await?.json().await?)
    }

    pub async fn delete_event(&self, session: &Session, id: i64) -> Result<(), ApiError> {
        let request = self.authorized(Method::DELETE, &format!("events/{id}"), session)?;
        self.send(request).await?;
        Ok(())
    }
}

use std::{marker::PhantomData, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Credentials, Session},
    error::ApiError,
    protocol::{LoginRequest, LoginResponse, SessionValidationResponse},
};
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    error::RemoteError, resources::Resource, session_cache::SessionCache, RemoteResult,
    ResourceApi, SessionApi,
};

const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn build_http_client(timeout: Duration) -> reqwest::Result<Client> {
    Client::builder().timeout(timeout).build()
}

fn endpoint(base_url: &Url, segments: &[&str]) -> RemoteResult<Url> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|_| RemoteError::Transport(format!("invalid api base url: {base_url}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn request(http: &Client, method: Method, url: Url, token: Option<String>) -> RequestBuilder {
    let request_id = Uuid::new_v4().to_string();
    debug!("http: {method} {url} request_id={request_id}");
    let builder = http
        .request(method, url)
        .header(REQUEST_ID_HEADER, request_id);
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Passes 2xx responses through; maps anything else to a [`RemoteError`],
/// preferring the backend's `ApiError` body when one is present.
async fn check_status(response: Response) -> RemoteResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.bytes().await.unwrap_or_default();
    match serde_json::from_slice::<ApiError>(&body) {
        Ok(api_error) => Err(api_error.into()),
        Err(_) => Err(RemoteError::Status {
            status: status.as_u16(),
        }),
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<T> {
    let response = check_status(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|err| RemoteError::Decode(err.to_string()))
}

/// REST client for one collection: `GET /{collection}`,
/// `GET /{collection}/{id}` and `POST /{collection}`.
pub struct HttpResourceApi<R> {
    http: Client,
    base_url: Url,
    session_cache: Option<Arc<SessionCache>>,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> HttpResourceApi<R> {
    pub fn new(http: Client, base_url: Url) -> Self {
        Self {
            http,
            base_url,
            session_cache: None,
            _resource: PhantomData,
        }
    }

    /// Attaches the admin bearer token to requests while a session exists.
    pub fn with_session_cache(mut self, session_cache: Arc<SessionCache>) -> Self {
        self.session_cache = Some(session_cache);
        self
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self
            .session_cache
            .as_ref()
            .and_then(|cache| cache.access_token());
        request(&self.http, method, url, token)
    }
}

#[async_trait]
impl<R: Resource> ResourceApi<R> for HttpResourceApi<R> {
    async fn list(&self) -> RemoteResult<Vec<R::Item>> {
        let url = endpoint(&self.base_url, &[R::COLLECTION])?;
        let response = self.request(Method::GET, url).send().await?;
        read_json(response).await
    }

    async fn get_by_id(&self, id: &str) -> RemoteResult<R::Item> {
        let url = endpoint(&self.base_url, &[R::COLLECTION, id])?;
        let response = self.request(Method::GET, url).send().await?;
        read_json(response).await
    }

    async fn create(&self, payload: R::Payload) -> RemoteResult<Option<R::Item>> {
        let url = endpoint(&self.base_url, &[R::COLLECTION])?;
        let response = self
            .request(Method::POST, url)
            .json(&payload)
            .send()
            .await?;
        let response = check_status(response).await?;
        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|err| RemoteError::Decode(err.to_string()))
    }
}

/// Admin authentication against `/auth/*`. Owns persistence of the session
/// through the shared [`SessionCache`].
pub struct HttpSessionApi {
    http: Client,
    base_url: Url,
    session_cache: Arc<SessionCache>,
}

impl HttpSessionApi {
    pub fn new(http: Client, base_url: Url, session_cache: Arc<SessionCache>) -> Self {
        Self {
            http,
            base_url,
            session_cache,
        }
    }

    async fn fetch_validation(&self, token: String) -> RemoteResult<bool> {
        let url = endpoint(&self.base_url, &["auth", "session"])?;
        let response = request(&self.http, Method::GET, url, Some(token))
            .send()
            .await?;
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            return Ok(false);
        }
        let body: SessionValidationResponse = read_json(response).await?;
        Ok(body.valid)
    }

    async fn fetch_login(&self, credentials: &Credentials) -> RemoteResult<Session> {
        let url = endpoint(&self.base_url, &["auth", "login"])?;
        let response = request(&self.http, Method::POST, url, None)
            .json(&LoginRequest::from(credentials))
            .send()
            .await?;
        let body: LoginResponse = read_json(response).await?;
        Ok(body.session)
    }
}

#[async_trait]
impl SessionApi for HttpSessionApi {
    fn current_session_local(&self) -> Option<Session> {
        self.session_cache
            .get()
            .filter(|session| !session.is_expired_at(Utc::now()))
    }

    async fn validate_session(&self) -> RemoteResult<bool> {
        let Some(token) = self.session_cache.access_token() else {
            return Ok(false);
        };
        let valid = self.fetch_validation(token).await.inspect_err(|err| {
            warn!("session cache: dropping session after failed validation error={err}");
            self.session_cache.clear();
        })?;
        if !valid {
            self.session_cache.clear();
        }
        Ok(valid)
    }

    async fn login(&self, credentials: &Credentials) -> RemoteResult<Session> {
        let session = self.fetch_login(credentials).await.inspect_err(|_| {
            self.session_cache.clear();
        })?;
        if let Err(err) = self.session_cache.store(session.clone()) {
            warn!("session cache: failed to persist session error={err:#}");
        }
        Ok(session)
    }

    async fn logout(&self) -> RemoteResult<()> {
        let token = self.session_cache.access_token();
        self.session_cache.clear();
        let url = endpoint(&self.base_url, &["auth", "logout"])?;
        let response = request(&self.http, Method::POST, url, token).send().await?;
        check_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;

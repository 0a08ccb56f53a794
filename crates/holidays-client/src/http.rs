use std::sync::RwLock;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{ClientError, Record, RecordUpdate, RecordsApi};

/// Public account fields returned by registration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub id: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
struct SignInResponse {
    token: String,
    username: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    username: &'a str,
    credential: &'a str,
}

#[derive(Debug, Default)]
struct SignedIn {
    token: Option<String>,
    username: Option<String>,
}

/// HTTP client for the holidays API. Holds the bearer token after sign-in.
pub struct HttpClient {
    base_url: String,
    http: reqwest::Client,
    session: RwLock<SignedIn>,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            session: RwLock::new(SignedIn::default()),
        }
    }

    /// Reuse a token obtained earlier, e.g. from the environment.
    pub fn with_token(self, token: impl Into<String>) -> Self {
        self.session.write().expect("Session lock poisoned").token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.session.read().expect("Session lock poisoned").token.clone()
    }

    /// The user that signed in through this client, if any.
    pub fn current_user(&self) -> Option<String> {
        self.session
            .read()
            .expect("Session lock poisoned")
            .username
            .clone()
    }

    /// Create an account. Does not sign in.
    pub async fn register(&self, username: &str, credential: &str) -> Result<AccountInfo, ClientError> {
        let resp = self
            .request(Method::POST, "/accounts")
            .json(&Credentials { username, credential })
            .send()
            .await?;
        decode(resp).await
    }

    /// Sign in and keep the issued token for subsequent requests.
    pub async fn sign_in(&self, username: &str, credential: &str) -> Result<String, ClientError> {
        let resp = self
            .request(Method::POST, "/sessions")
            .json(&Credentials { username, credential })
            .send()
            .await?;
        let signed_in: SignInResponse = decode(resp).await?;

        let mut session = self.session.write().expect("Session lock poisoned");
        session.token = Some(signed_in.token.clone());
        session.username = Some(signed_in.username);
        Ok(signed_in.token)
    }

    /// End the server session and forget the token.
    pub async fn sign_out(&self) -> Result<(), ClientError> {
        if self.token().is_none() {
            return Ok(());
        }

        let resp = self.request(Method::DELETE, "/sessions").send().await?;
        check(resp).await?;

        let mut session = self.session.write().expect("Session lock poisoned");
        session.token = None;
        session.username = None;
        Ok(())
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        match self.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

#[async_trait]
impl RecordsApi for HttpClient {
    async fn list(&self) -> Result<Vec<Record>, ClientError> {
        let resp = self.request(Method::GET, "/records").send().await?;
        decode(resp).await
    }

    async fn create(&self, name: &str) -> Result<Record, ClientError> {
        let resp = self
            .request(Method::POST, "/records")
            .json(&json!({ "name": name }))
            .send()
            .await?;
        decode(resp).await
    }

    async fn update(&self, id: &str, update: &RecordUpdate) -> Result<Record, ClientError> {
        let resp = self
            .request(Method::PUT, &format!("/records/{}", id))
            .json(update)
            .send()
            .await?;
        decode(resp).await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let resp = self
            .request(Method::DELETE, &format!("/records/{}", id))
            .send()
            .await?;
        check(resp).await
    }
}

async fn check(resp: Response) -> Result<(), ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.bytes().await?;
    Err(error_from(status, &body))
}

async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        return Err(error_from(status, &body));
    }

    serde_json::from_slice(&body).map_err(|e| ClientError::Decode(e.to_string()))
}

fn error_from(status: StatusCode, body: &[u8]) -> ClientError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .map(|b| b.error)
        .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned());
    ClientError::from_status(status.as_u16(), message)
}

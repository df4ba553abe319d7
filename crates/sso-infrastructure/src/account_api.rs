//! HTTP client for the external Account API

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, warn};

use sso_core::{AccountApi, DomainError, TokenPair};
use sso_shared::config::AccountApiSettings;

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    identifier: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(alias = "userId")]
    user_id: String,
}

#[derive(Debug, Serialize)]
struct IssueTokensRequest<'a> {
    user_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshTokenRequest<'a> {
    refresh_token: &'a str,
}

#[derive(Clone)]
pub struct HttpAccountApi {
    client: Client,
    base_url: String,
}

impl HttpAccountApi {
    pub fn new(settings: &AccountApiSettings) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(settings.timeout_seconds))
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> Result<String, DomainError> {
        if self.base_url.is_empty() {
            error!("account_api.base_url is not configured");
            return Err(DomainError::Misconfigured(
                "account_api.base_url is not configured".into(),
            ));
        }
        Ok(format!("{}{}", self.base_url, path))
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Response, DomainError> {
        let url = self.endpoint(path)?;
        debug!(url = %url, "Calling Account API");
        self.client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(url = %url, "Account API unreachable: {}", e);
                DomainError::CollaboratorUnavailable(e.to_string())
            })
    }
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, DomainError> {
    response.json::<T>().await.map_err(|e| {
        error!("Account API returned an unreadable body: {}", e);
        DomainError::CollaboratorUnavailable(format!("malformed response: {}", e))
    })
}

async fn failure(response: Response) -> (StatusCode, String) {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    (status, body)
}

#[async_trait]
impl AccountApi for HttpAccountApi {
    async fn authenticate(&self, identifier: &str, password: &str) -> Result<String, DomainError> {
        let response = self
            .post("/api/v1/auth/login", &LoginRequest { identifier, password })
            .await?;

        match response.status() {
            s if s.is_success() => Ok(read_json::<LoginResponse>(response).await?.user_id),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::NOT_FOUND => {
                Err(DomainError::InvalidCredentials)
            }
            _ => {
                let (status, body) = failure(response).await;
                error!("Account API login error ({}): {}", status, body);
                Err(DomainError::CollaboratorUnavailable(format!("status {}", status)))
            }
        }
    }

    async fn issue_tokens(&self, user_id: &str) -> Result<TokenPair, DomainError> {
        let response = self
            .post("/api/v1/auth/tokens", &IssueTokensRequest { user_id })
            .await?;

        if !response.status().is_success() {
            let (status, body) = failure(response).await;
            error!(user_id = %user_id, "Account API token error ({}): {}", status, body);
            return Err(DomainError::CollaboratorUnavailable(format!("status {}", status)));
        }
        read_json(response).await
    }

    /// Non-success answers are passed through with their status.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, DomainError> {
        let response = self
            .post("/api/v1/auth/refresh", &RefreshTokenRequest { refresh_token })
            .await?;

        if !response.status().is_success() {
            let (status, body) = failure(response).await;
            warn!("Account API refresh rejected ({})", status);
            return Err(DomainError::CollaboratorRejected {
                status: status.as_u16(),
                message: body,
            });
        }
        read_json(response).await
    }

    async fn revoke(&self, refresh_token: &str) -> Result<(), DomainError> {
        let response = self
            .post("/api/v1/auth/revoke", &RefreshTokenRequest { refresh_token })
            .await?;

        if !response.status().is_success() {
            let (status, _) = failure(response).await;
            return Err(DomainError::CollaboratorUnavailable(format!("status {}", status)));
        }
        Ok(())
    }
}

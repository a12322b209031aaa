//! HTTP client for the sponsorship and identity backend.

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::BackendConfig;
use crate::sponsor::{ExecuteRequest, ExecuteResponse, SponsorBackend, SponsorRequest, SponsorResponse};
use crate::types::{Result, SponsorError, SponsorshipStage, SuiChatError};

#[derive(Debug, Serialize)]
struct SaltRequest<'a> {
    jwt: &'a str,
}

/// zkLogin salt and the session address it yields.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSalt {
    pub user_salt: String,
    pub address: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// JSON client for the backend routes.
#[derive(Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: Client,
}

impl BackendClient {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let http = Client::builder()
            .use_rustls_tls()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| SuiChatError::Http(e.to_string()))?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    /// Exchange an identity token for the user's salt and address.
    pub async fn user_salt(&self, identity_token: &str) -> Result<UserSalt> {
        let url = self.config.salt_url();
        debug!(%url, "requesting user salt");

        let response = self
            .http
            .post(&url)
            .json(&SaltRequest { jwt: identity_token })
            .send()
            .await
            .map_err(|e| SuiChatError::Http(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            return Err(SuiChatError::Http(format!(
                "Salt request failed: {}",
                body.error.unwrap_or_else(|| status.to_string())
            )));
        }

        response
            .json()
            .await
            .map_err(|e| SuiChatError::Http(format!("Parse failed: {}", e)))
    }

    async fn post<Req, Resp>(&self, stage: SponsorshipStage, url: &str, request: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: for<'de> Deserialize<'de>,
    {
        let response = self
            .http
            .post(url)
            .json(request)
            .send()
            .await
            .map_err(|e| SponsorError::new(stage, format!("Request failed: {}", e)))?;

        let status = response.status();
        debug!(%url, status = status.as_u16(), "backend responded");

        if !status.is_success() {
            let body = read_error_body(response).await;
            let reason = match (body.error, body.details) {
                (Some(error), Some(details)) => format!("{}: {}", error, details),
                (Some(error), None) => error,
                (None, Some(details)) => details,
                (None, None) => format!("{} failed: {}", capitalize(&stage.to_string()), status.as_u16()),
            };
            warn!(%url, status = status.as_u16(), %reason, "backend request rejected");
            return Err(SponsorError::new(stage, reason)
                .with_status(status.as_u16())
                .into());
        }

        response.json().await.map_err(|e| {
            SponsorError::new(stage, format!("Parse failed: {}", e))
                .with_status(status.as_u16())
                .into()
        })
    }
}

async fn read_error_body(response: Response) -> ErrorBody {
    response.json::<ErrorBody>().await.unwrap_or_default()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait::async_trait]
impl SponsorBackend for BackendClient {
    async fn sponsor(&self, request: &SponsorRequest) -> Result<SponsorResponse> {
        self.post(SponsorshipStage::Sponsored, &self.config.sponsor_url(), request)
            .await
    }

    async fn execute(&self, request: &ExecuteRequest) -> Result<ExecuteResponse> {
        self.post(SponsorshipStage::Executed, &self.config.execute_url(), request)
            .await
    }
}

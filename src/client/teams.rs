//! Teams API client implementation

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, Method, RequestBuilder, Response, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::api::TeamsApi;
use super::models::{Team, TeamCreate};
use super::reauth::ReactiveReauth;
use crate::auth::SessionManager;
use crate::error::{ApiError, ConfigError, Result};

/// Error body shape used by the Teams API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Detail>,
}

/// `detail` is a message, or a list of field errors for validation failures
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Detail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Deserialize)]
struct FieldError {
    msg: String,
}

/// Extract the server-provided error message from a response body
fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        Detail::Message(msg) if !msg.trim().is_empty() => Some(msg),
        Detail::Message(_) => None,
        Detail::Fields(fields) if !fields.is_empty() => Some(
            fields
                .into_iter()
                .map(|f| f.msg)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Detail::Fields(_) => None,
    }
}

/// Teams API client
pub struct TeamsClient {
    http: HttpClient,
    base_url: Url,
    session: Arc<SessionManager>,
    reauth: Arc<ReactiveReauth>,
}

impl TeamsClient {
    /// Create a client for the API at `base_url`, authenticating through `session`
    pub fn new(
        base_url: &str,
        session: Arc<SessionManager>,
        reauth: Arc<ReactiveReauth>,
    ) -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(ApiError::from)?;

        let base_url = Url::parse(base_url)
            .map_err(|e| ConfigError::Invalid(format!("api_url '{}': {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(
                ConfigError::Invalid(format!("api_url '{}' cannot hold a path", base_url)).into(),
            );
        }

        Ok(Self {
            http,
            base_url,
            session,
            reauth,
        })
    }

    /// Append path segments to the base URL, percent-encoding each one
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        // Base URLs that cannot hold a path are rejected in `new`
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Attach the bearer token, if there is one
    async fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        let token = self.session.get_token().await;
        if token.is_empty() {
            debug!("No bearer token available, sending request unauthenticated");
            builder
        } else {
            builder.bearer_auth(token)
        }
    }

    /// Send an authenticated request and turn non-success statuses into errors
    async fn send(&self, builder: RequestBuilder) -> std::result::Result<Response, ApiError> {
        let response = self
            .authorize(builder)
            .await
            .send()
            .await
            .map_err(ApiError::from)?;

        if response.status().is_success() {
            Ok(response)
        } else {
            Err(self.normalize_error(response).await)
        }
    }

    async fn normalize_error(&self, response: Response) -> ApiError {
        let status = response.status();
        debug!("API error: {} {}", status, response.url());

        match status {
            StatusCode::UNAUTHORIZED => {
                self.reauth.trigger();
                ApiError::Unauthorized
            }
            StatusCode::FORBIDDEN => ApiError::Forbidden,
            _ => {
                let body = response.text().await.unwrap_or_default();
                let message = detail_message(&body)
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
                ApiError::Status {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }

    async fn request_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> std::result::Result<T, ApiError> {
        let response = self.send(builder).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl TeamsApi for TeamsClient {
    async fn list_teams(&self) -> std::result::Result<Vec<Team>, ApiError> {
        let url = self.url(&["teams"]);
        debug!("Listing teams: GET {}", url);
        self.request_json(self.http.request(Method::GET, url)).await
    }

    async fn create_team(&self, request: &TeamCreate) -> std::result::Result<Team, ApiError> {
        let url = self.url(&["teams"]);
        debug!("Creating team: POST {}", url);
        self.request_json(self.http.request(Method::POST, url).json(request))
            .await
    }

    async fn delete_team(&self, team_id: &str) -> std::result::Result<(), ApiError> {
        let url = self.url(&["teams", team_id]);
        debug!("Deleting team: DELETE {}", url);
        self.send(self.http.request(Method::DELETE, url)).await?;
        Ok(())
    }
}

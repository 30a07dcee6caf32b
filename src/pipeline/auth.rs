//! Exchanges credentials for a session token

use crate::error::{Result, ScanwatchError};
use crate::http::{decode_json, expect_success, ApiClient, RemoteFailure};
use crate::models::{Credentials, SessionToken};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct AuthResponse {
    #[serde(default)]
    token: Option<String>,
}

/// Client for the service's `/auth` endpoint
pub struct AuthClient<'a> {
    api: &'a ApiClient,
}

impl<'a> AuthClient<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    /// Authenticates and returns the issued bearer token
    pub async fn authenticate(&self, credentials: &Credentials) -> Result<SessionToken> {
        info!("Authenticating as {}", credentials.username);
        self.request_token(credentials).await.map_err(|failure| {
            failure.log("Authentication");
            ScanwatchError::AuthenticationFailed(failure)
        })
    }

    async fn request_token(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<SessionToken, RemoteFailure> {
        let response = self.api.post_json(&["auth"], credentials, None).await?;
        let body: AuthResponse = decode_json(expect_success(response).await?).await?;

        match body.token {
            Some(token) if !token.is_empty() => {
                info!("Authentication successful");
                Ok(SessionToken::new(token))
            }
            _ => Err(RemoteFailure::MalformedResponse(
                "response did not contain a token".to_string(),
            )),
        }
    }
}

//! Google OAuth
//!
//! Builds the consent URL and exchanges an authorization code for the user's
//! profile. Only the verified email, display name and picture are kept.

use log::{info, warn};
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::Value;

use crate::config::ServerConfig;
use crate::error::AuthError;
use crate::storage::UserSummary;

/// OAuth client for Google sign-in
#[derive(Debug, Clone)]
pub struct GoogleOAuth {
    client: Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_url: String,
    token_url: String,
    userinfo_url: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    #[serde(default)]
    email: String,
    name: Option<String>,
    #[serde(default)]
    picture: String,
}

impl GoogleOAuth {
    pub fn new(client: Client, config: &ServerConfig) -> Self {
        Self {
            client,
            client_id: config.auth.google_client_id.clone(),
            client_secret: config.auth.google_client_secret.clone(),
            redirect_uri: config.server.oauth_redirect_uri(),
            auth_url: config.auth.google_auth_url.clone(),
            token_url: config.auth.google_token_url.clone(),
            userinfo_url: config.auth.google_userinfo_url.clone(),
        }
    }

    /// Consent page the browser is sent to
    pub fn authorization_url(&self) -> Result<String, AuthError> {
        let url = Url::parse_with_params(
            &self.auth_url,
            &[
                ("client_id", self.client_id.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("access_type", "offline"),
            ],
        )
        .map_err(|e| AuthError::OAuth(format!("Invalid authorization endpoint: {e}")))?;
        Ok(url.into())
    }

    /// Exchanges an authorization code for the signed-in user's profile
    pub async fn exchange_code(&self, code: &str) -> Result<UserSummary, AuthError> {
        let token: Value = self
            .client
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?
            .json()
            .await?;

        if token.get("error").is_some() {
            let description = token
                .get("error_description")
                .and_then(Value::as_str)
                .unwrap_or("OAuth error");
            warn!("OAuth code exchange refused: {}", description);
            return Err(AuthError::OAuth(description.to_string()));
        }

        let access_token = token
            .get("access_token")
            .and_then(Value::as_str)
            .ok_or_else(|| AuthError::OAuth("OAuth error: no access token".to_string()))?;

        let info: UserInfo = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .json()
            .await?;

        if info.email.is_empty() {
            return Err(AuthError::OAuth("OAuth error: no email in profile".to_string()));
        }

        info!("OAuth sign-in for {}", info.email);
        Ok(UserSummary {
            name: info.name.unwrap_or_else(|| info.email.clone()),
            email: info.email,
            picture: info.picture,
        })
    }
}

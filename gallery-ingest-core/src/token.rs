//! Resource-owner-password token acquisition against an OpenID Connect
//! identity provider.
//!
//! The token endpoint is not configured directly: it is read from the
//! provider's discovery document at `{authority}/.well-known/openid-configuration`.
//! Every failure on the way (unreachable provider, bad discovery document,
//! rejected grant, empty token) is reported as [`GalleryError::Authentication`].

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, error, info};

use crate::contract::{AccessToken, Credentials, TokenProvider};
use crate::error::GalleryError;
use crate::http;

/// Client registration used for the password grant.
#[derive(Debug, Clone)]
pub struct ClientRegistration {
    pub client_id: String,
    pub client_secret: Option<String>,
    /// Extra scopes requested alongside the API identifier, space separated.
    pub scope: Option<String>,
}

pub struct OidcTokenProvider {
    client: reqwest::Client,
    registration: ClientRegistration,
}

#[derive(Debug, Deserialize)]
struct DiscoveryDocument {
    token_endpoint: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

impl OidcTokenProvider {
    pub fn new(registration: ClientRegistration) -> Result<Self, GalleryError> {
        Ok(OidcTokenProvider {
            client: http::build_client().map_err(|e| GalleryError::Authentication(e.to_string()))?,
            registration,
        })
    }

    /// Scope parameter for the grant: configured scopes first, then the API
    /// identifier, without duplicates.
    pub fn scope_for(&self, api_identifier: &str) -> String {
        let mut scopes: Vec<&str> = Vec::new();
        let configured = self.registration.scope.as_deref().unwrap_or("");
        for scope in configured
            .split_whitespace()
            .chain(std::iter::once(api_identifier.trim()))
        {
            if !scope.is_empty() && !scopes.contains(&scope) {
                scopes.push(scope);
            }
        }
        scopes.join(" ")
    }

    async fn discover_token_endpoint(&self, authority: &str) -> Result<String, GalleryError> {
        let url = format!(
            "{}/.well-known/openid-configuration",
            authority.trim_end_matches('/')
        );
        debug!(url = %url, "Fetching OpenID Connect discovery document");

        let response = self.client.get(&url).send().await.map_err(|e| {
            error!(error = ?e, url = %url, "Identity provider unreachable");
            GalleryError::Authentication(format!("identity provider unreachable at {url}: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, url = %url, "Discovery document request failed");
            return Err(GalleryError::Authentication(format!(
                "discovery document at {url} returned HTTP {}",
                status.as_u16()
            )));
        }

        let document: DiscoveryDocument = response.json().await.map_err(|e| {
            error!(error = ?e, url = %url, "Malformed discovery document");
            GalleryError::Authentication(format!("malformed discovery document at {url}: {e}"))
        })?;
        Ok(document.token_endpoint)
    }
}

#[async_trait]
impl TokenProvider for OidcTokenProvider {
    async fn request_token(&self, credentials: &Credentials) -> Result<AccessToken, GalleryError> {
        let token_endpoint = self.discover_token_endpoint(&credentials.authority).await?;
        let scope = self.scope_for(&credentials.api_identifier);
        info!(
            token_endpoint = %token_endpoint,
            login = %credentials.login,
            client_id = %self.registration.client_id,
            scope = %scope,
            "Requesting resource owner password token"
        );

        let mut form: Vec<(&str, &str)> = vec![
            ("grant_type", "password"),
            ("username", credentials.login.as_str()),
            ("password", credentials.password.as_str()),
            ("client_id", self.registration.client_id.as_str()),
            ("scope", scope.as_str()),
        ];
        if let Some(secret) = self.registration.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        let response = self
            .client
            .post(&token_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| {
                error!(error = ?e, url = %token_endpoint, "Token endpoint unreachable");
                GalleryError::Authentication(format!(
                    "token endpoint unreachable at {token_endpoint}: {e}"
                ))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GalleryError::Authentication(format!("failed reading token response: {e}"))
        })?;

        if !status.is_success() {
            let reason = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => match err.error_description {
                    Some(description) => format!("{}: {description}", err.error),
                    None => err.error,
                },
                Err(_) => body,
            };
            error!(status = %status, reason = %reason, "Identity provider rejected the grant");
            return Err(GalleryError::Authentication(format!(
                "token request returned HTTP {}: {reason}",
                status.as_u16()
            )));
        }

        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = ?e, "Malformed token response");
            GalleryError::Authentication(format!("malformed token response: {e}"))
        })?;

        let mut token = AccessToken::new(parsed.access_token)?;
        if let Some(token_type) = parsed.token_type {
            token.token_type = token_type;
        }
        token.expires_in = parsed.expires_in;
        token.scope = parsed.scope;

        info!(
            token_type = %token.token_type,
            expires_in = ?token.expires_in,
            "Access token acquired"
        );
        Ok(token)
    }
}

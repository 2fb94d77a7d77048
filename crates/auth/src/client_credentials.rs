//! OAuth 2.0 client-credentials grant against the identity endpoint.
//!
//! The time-series service only accepts bearer tokens minted for a
//! confidential client, so there is no interactive flow and no refresh token:
//! a new grant is requested whenever the cached token gets close to expiry.

use hubgate_config::Config;
use hubgate_types::{Credential, HubError, traits::Result};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use secrecy::{ExposeSecret as _, SecretString};
use std::time::Duration;

/// Fixed `grant_type` form value.
pub const GRANT_TYPE: &str = "client_credentials";

/// Lifetime assumed when the identity endpoint omits `expires_in`.
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// Everything needed to request a token for the configured client.
#[derive(Debug)]
pub struct ClientCredentials {
    pub token_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub audience: Option<String>,
    pub scope: Option<String>,
}

impl ClientCredentials {
    /// Reads the identity settings out of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            token_url: config.token_url(),
            client_id: config.identity.client_id.clone(),
            client_secret: SecretString::from(config.identity.client_secret.clone()),
            audience: config.identity.audience.clone(),
            scope: config.identity.scope.clone(),
        }
    }

    /// Form-encoded token request body.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::AuthFetch`] if the body cannot be encoded.
    pub fn form_body(&self) -> Result<String> {
        let mut form: Vec<(&str, &str)> = vec![
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.expose_secret()),
            ("grant_type", GRANT_TYPE),
        ];
        if let Some(audience) = self.audience.as_deref().filter(|a| !a.is_empty()) {
            form.push(("audience", audience));
        }
        if let Some(scope) = self.scope.as_deref().filter(|s| !s.is_empty()) {
            form.push(("scope", scope));
        }
        serde_urlencoded::to_string(&form)
            .map_err(|e| HubError::AuthFetch(format!("failed to encode token request: {e}")))
    }
}

/// Parse the token endpoint JSON response into a [`Credential`].
///
/// `expires_in` may be a number or a numeric string; when absent the token is
/// assumed to live for [`DEFAULT_LIFETIME_SECS`].
///
/// # Errors
///
/// Returns an error if the response is missing the `access_token` field.
pub fn parse_token_response(json: &serde_json::Value) -> Result<Credential> {
    let access_token = json
        .get("access_token")
        .and_then(serde_json::Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| HubError::AuthFetch("missing access_token".into()))?;

    let expires_in = json
        .get("expires_in")
        .and_then(|v| v.as_u64().or_else(|| v.as_str()?.trim().parse().ok()))
        .unwrap_or(DEFAULT_LIFETIME_SECS);

    Ok(Credential::new(
        access_token,
        Duration::from_secs(expires_in),
    ))
}

/// Perform one client-credentials exchange.
///
/// # Errors
///
/// Every failure (unreachable endpoint, timeout, non-success status,
/// malformed body) is reported as [`HubError::AuthFetch`].
pub async fn request_token(
    http: &reqwest::Client,
    creds: &ClientCredentials,
) -> Result<Credential> {
    let body = creds.form_body()?;

    let resp = http
        .post(&creds.token_url)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .header(ACCEPT, "application/json")
        .body(body)
        .send()
        .await
        .map_err(|e| HubError::AuthFetch(format!("identity endpoint unreachable: {e}")))?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(HubError::AuthFetch(format!(
            "identity endpoint returned {status}: {text}"
        )));
    }

    let json: serde_json::Value = resp
        .json()
        .await
        .map_err(|e| HubError::AuthFetch(format!("failed to parse token response: {e}")))?;

    parse_token_response(&json)
}

//! OAuth2 client-credentials authentication for the Battle.net API.
//!
//! A single bearer token is requested at startup and kept for the whole run.

use common::Error;
use serde::Deserialize;
use tracing::debug;

pub const OAUTH_TOKEN_URL: &str = "https://oauth.battle.net/token";

/// Bearer token for API requests.
#[derive(Clone)]
pub struct AccessToken(String);

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("AccessToken").field(&"<redacted>").finish()
    }
}

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client credentials for a bearer token. Any failure is fatal.
pub async fn request_token(
    http: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &str,
) -> Result<AccessToken, Error> {
    if client_id.trim().is_empty() || client_secret.trim().is_empty() {
        return Err(Error::Auth(
            "client id and client secret are required".into(),
        ));
    }

    debug!("Requesting access token from {}", token_url);

    let resp = http
        .post(token_url)
        .basic_auth(client_id, Some(client_secret))
        .form(&[("grant_type", "client_credentials")])
        .send()
        .await
        .map_err(|e| Error::Auth(format!("token request failed: {e}")))?;

    let status = resp.status().as_u16();
    if status != 200 {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Auth(format!(
            "Failed to authorize (status={status}): {body}"
        )));
    }

    let token: TokenResponse = resp
        .json()
        .await
        .map_err(|e| Error::Auth(format!("malformed token response: {e}")))?;

    Ok(AccessToken(token.access_token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_debug_is_redacted() {
        let token = AccessToken::new("secret-token");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("secret-token"));
        assert_eq!(token.as_str(), "secret-token");
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_request() {
        let http = reqwest::Client::new();
        // Unroutable URL: reaching the network would surface a different error.
        let result = request_token(&http, "http://127.0.0.1:9/token", "", "secret").await;
        match result {
            Err(Error::Auth(msg)) => assert!(msg.contains("required")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }
}

use crate::log::redact;
use crate::tlog;

use std::fmt;

use super::api::GenesysClient;
use super::error::DashError;

/// OAuth client credentials as typed into the login form.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

impl Credentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    /// Both fields must be non-empty after trimming. Runs before any
    /// network call.
    pub fn validate(&self) -> Result<(), DashError> {
        if self.client_id.trim().is_empty() || self.client_secret.trim().is_empty() {
            return Err(DashError::Validation(
                "Please enter both Client ID and Client Secret".into(),
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &redact(&self.client_id))
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// Opaque bearer credential. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn authorization(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(<redacted>)")
    }
}

/// Exchanges client credentials for a bearer token. One request, no retry.
pub fn authenticate(
    client: &GenesysClient,
    credentials: &Credentials,
) -> Result<AccessToken, DashError> {
    credentials.validate()?;

    let client_id = credentials.client_id.trim();
    tlog!(
        info,
        "requesting token for client {} at {}",
        redact(client_id),
        client.endpoints().token
    );

    let resp = client.request_token(client_id, credentials.client_secret.trim())?;
    if resp.access_token.is_empty() {
        return Err(DashError::Decode {
            what: "token".into(),
            message: "empty access_token".into(),
        });
    }

    tlog!(
        info,
        "token acquired: type={} expires_in={}",
        resp.token_type.as_deref().unwrap_or("bearer"),
        resp.expires_in
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "-".to_string())
    );

    Ok(AccessToken::new(resp.access_token))
}

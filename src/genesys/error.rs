const BODY_PREVIEW: usize = 200;

/// Everything that can go wrong between the dashboard and the upstream API.
/// The `Display` text is what the user sees inline.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashError {
    /// Missing or malformed input, caught before any network call.
    #[error("{0}")]
    Validation(String),

    /// The token endpoint rejected the client-credentials exchange.
    #[error("Authentication failed (HTTP {status}): {body}")]
    Auth { status: u16, body: String },

    /// A data endpoint answered with a non-success status.
    #[error("HTTP {status}: {body}")]
    Fetch { status: u16, body: String },

    /// The request never produced an HTTP response.
    #[error("network error: {0}")]
    Network(String),

    /// A success response whose body is not the expected JSON.
    #[error("{what}: unexpected response ({message})")]
    Decode { what: String, message: String },
}

impl DashError {
    pub fn auth(status: u16, body: &str) -> Self {
        Self::Auth {
            status,
            body: preview(body),
        }
    }

    pub fn fetch(status: u16, body: &str) -> Self {
        Self::Fetch {
            status,
            body: preview(body),
        }
    }
}

fn preview(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "(empty body)".to_string();
    }
    match trimmed.char_indices().nth(BODY_PREVIEW) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

use crate::tlog;

use std::time::Duration;

use super::auth::AccessToken;
use super::environment::Endpoints;
use super::error::DashError;
use super::models::{ObservationQuery, ObservationResponse, TokenResponse, UsersResponse};

const USER_AGENT: &str = concat!("ccdash/", env!("CARGO_PKG_VERSION"));

/// Parse a JSON body, logging a preview of it when the shape is wrong.
fn parse_json<T: serde::de::DeserializeOwned>(body: &str, label: &str) -> Result<T, DashError> {
    serde_json::from_str(body).map_err(|e| {
        tlog!(
            error,
            "{} parse error: {} body: {}",
            label,
            e,
            preview(body, 500)
        );
        DashError::Decode {
            what: label.to_string(),
            message: e.to_string(),
        }
    })
}

fn preview(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

/// Blocking client for the token, users and queue-observation endpoints.
/// One client is built per request cycle from that cycle's [`Endpoints`].
pub struct GenesysClient {
    agent: ureq::Agent,
    endpoints: Endpoints,
}

impl GenesysClient {
    pub fn new(endpoints: Endpoints, timeout: Option<Duration>) -> Self {
        let agent = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build()
            .new_agent();

        Self { agent, endpoints }
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Client-credentials grant. Callers validate the inputs first.
    pub fn request_token(
        &self,
        client_id: &str,
        client_secret: &str,
    ) -> Result<TokenResponse, DashError> {
        let url = &self.endpoints.token;
        tlog!(info, "POST {}", url);
        let resp = self
            .agent
            .post(url)
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .send_form([
                ("grant_type", "client_credentials"),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ])
            .map_err(network_error)?;

        let body = read_body(resp, DashError::auth)?;
        parse_json(&body, "token")
    }

    pub fn fetch_agents(&self, token: &AccessToken) -> Result<UsersResponse, DashError> {
        let url = &self.endpoints.agents;
        tlog!(info, "GET {}", url);
        let resp = self
            .agent
            .get(url)
            .header("Authorization", &token.authorization())
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .call()
            .map_err(network_error)?;

        let body = read_body(resp, DashError::fetch)?;
        let users: UsersResponse = parse_json(&body, "agents")?;
        tlog!(
            info,
            "parsed {} online users",
            users.entities.as_ref().map_or(0, Vec::len)
        );
        Ok(users)
    }

    pub fn fetch_queues(&self, token: &AccessToken) -> Result<ObservationResponse, DashError> {
        let url = &self.endpoints.queues;
        let query = serde_json::to_string(&ObservationQuery::all_queues()).map_err(|e| {
            DashError::Decode {
                what: "queue query".to_string(),
                message: e.to_string(),
            }
        })?;

        tlog!(info, "POST {}", url);
        let resp = self
            .agent
            .post(url)
            .header("Authorization", &token.authorization())
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .send(query.as_str())
            .map_err(network_error)?;

        let body = read_body(resp, DashError::fetch)?;
        let observations: ObservationResponse = parse_json(&body, "queues")?;
        tlog!(
            info,
            "parsed {} queue observations",
            observations.results.as_ref().map_or(0, Vec::len)
        );
        Ok(observations)
    }
}

fn network_error(e: ureq::Error) -> DashError {
    tlog!(error, "request error: {}", e);
    DashError::Network(e.to_string())
}

/// Reads the body of a response, turning a non-2xx status into the error
/// built by `on_failure`.
fn read_body(
    resp: ureq::http::Response<ureq::Body>,
    on_failure: fn(u16, &str) -> DashError,
) -> Result<String, DashError> {
    let status = resp.status();
    tlog!(info, "response: HTTP {}", status.as_u16());

    let body = resp.into_body().read_to_string();

    if !status.is_success() {
        let body = body.unwrap_or_else(|_| "(unreadable body)".to_string());
        tlog!(error, "HTTP {}: {}", status.as_u16(), preview(&body, 200));
        return Err(on_failure(status.as_u16(), &body));
    }

    body.map_err(|e| DashError::Network(format!("read body failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genesys::environment::{Environment, Routing};
    use crate::test_support::{client_for, MockUpstream, Reply};

    #[test]
    fn test_request_token_posts_form() {
        let mock = MockUpstream::start(|req| {
            if req.url == "/login/oauth/token" {
                Reply::json(200, r#"{"access_token":"tok-1","expires_in":86399}"#)
            } else {
                Reply::text(404, "nope")
            }
        });

        let token = client_for(&mock).request_token("my-id", "s&cret").unwrap();
        assert_eq!(token.access_token, "tok-1");
        assert_eq!(token.expires_in, Some(86399));

        let recorded = mock.requests();
        assert_eq!(recorded.len(), 1);
        assert_eq!(recorded[0].method, "POST");
        let body = &recorded[0].body;
        assert!(body.contains("grant_type=client_credentials"));
        assert!(body.contains("client_id=my-id"));
        assert!(body.contains("client_secret=s%26cret"));
        assert!(recorded[0]
            .header("content-type")
            .unwrap_or_default()
            .starts_with("application/x-www-form-urlencoded"));
    }

    #[test]
    fn test_request_token_rejection_is_auth_error() {
        let mock = MockUpstream::start(|_| Reply::text(403, "forbidden client"));
        let err = client_for(&mock).request_token("id", "secret").unwrap_err();
        assert_eq!(err, DashError::auth(403, "forbidden client"));
    }

    #[test]
    fn test_fetch_agents_sends_bearer() {
        let mock = MockUpstream::start(|req| {
            if req.url == "/api/api/v2/users?presence=ONLINE&expand=presence" {
                Reply::json(200, r#"{"entities":[{"name":"Amy"}]}"#)
            } else {
                Reply::text(404, "nope")
            }
        });

        let users = client_for(&mock)
            .fetch_agents(&AccessToken::new("tok-2"))
            .unwrap();
        assert_eq!(users.entities.unwrap().len(), 1);
        assert_eq!(
            mock.requests()[0].header("authorization").as_deref(),
            Some("Bearer tok-2")
        );
    }

    #[test]
    fn test_fetch_queues_posts_query_body() {
        let mock = MockUpstream::start(|_| Reply::json(200, r#"{"results":[]}"#));
        let obs = client_for(&mock)
            .fetch_queues(&AccessToken::new("tok-3"))
            .unwrap();
        assert!(obs.results.unwrap().is_empty());

        let req = &mock.requests()[0];
        assert_eq!(req.method, "POST");
        assert_eq!(req.url, "/api/api/v2/analytics/queues/observations/query");
        let body: serde_json::Value = serde_json::from_str(&req.body).unwrap();
        assert_eq!(body["metrics"], serde_json::json!(["oWaiting", "oActive"]));
    }

    #[test]
    fn test_fetch_failure_carries_status_and_body() {
        let mock = MockUpstream::start(|_| Reply::text(500, "upstream exploded"));
        let err = client_for(&mock)
            .fetch_queues(&AccessToken::new("tok"))
            .unwrap_err();
        assert_eq!(err, DashError::fetch(500, "upstream exploded"));
    }

    #[test]
    fn test_malformed_success_body_is_decode_error() {
        let mock = MockUpstream::start(|_| Reply::text(200, "<html>"));
        let err = client_for(&mock)
            .fetch_agents(&AccessToken::new("tok"))
            .unwrap_err();
        assert!(matches!(err, DashError::Decode { ref what, .. } if what == "agents"));
    }

    #[test]
    fn test_unreachable_host_is_network_error() {
        let endpoints = Endpoints::resolve(
            &Environment::default(),
            &Routing::LocalProxy {
                base: "http://127.0.0.1:1".into(),
            },
        );
        let client = GenesysClient::new(endpoints, Some(Duration::from_secs(2)));
        let err = client.fetch_agents(&AccessToken::new("tok")).unwrap_err();
        assert!(matches!(err, DashError::Network(_)));
    }
}

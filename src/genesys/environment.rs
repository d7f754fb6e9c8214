use std::fmt;

use super::error::DashError;

pub const DEFAULT_ENVIRONMENT: &str = "mypurecloud.com";

/// Region suffixes offered by the environment selector, with a display label.
pub const KNOWN_ENVIRONMENTS: &[(&str, &str)] = &[
    ("mypurecloud.com", "Americas (US East)"),
    ("usw2.pure.cloud", "Americas (US West)"),
    ("cac1.pure.cloud", "Americas (Canada)"),
    ("sae1.pure.cloud", "Americas (Sao Paulo)"),
    ("mypurecloud.ie", "EMEA (Dublin)"),
    ("euw2.pure.cloud", "EMEA (London)"),
    ("mypurecloud.de", "EMEA (Frankfurt)"),
    ("mec1.pure.cloud", "EMEA (UAE)"),
    ("aps1.pure.cloud", "Asia Pacific (Mumbai)"),
    ("mypurecloud.in", "Asia Pacific (India)"),
    ("mypurecloud.jp", "Asia Pacific (Tokyo)"),
    ("apne2.pure.cloud", "Asia Pacific (Seoul)"),
    ("mypurecloud.com.au", "Asia Pacific (Sydney)"),
];

/// A domain suffix selecting which regional deployment requests go to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn parse(raw: &str) -> Result<Self, DashError> {
        let trimmed = raw.trim().trim_matches('.');
        if trimmed.is_empty() {
            return Err(DashError::Validation("Please select an environment".into()));
        }
        if trimmed.contains("://") || trimmed.contains('/') || trimmed.contains(' ') {
            return Err(DashError::Validation(format!(
                "'{}' is not a domain suffix (expected e.g. {})",
                trimmed, DEFAULT_ENVIRONMENT
            )));
        }
        Ok(Self(trimmed.to_ascii_lowercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn label(&self) -> &str {
        KNOWN_ENVIRONMENTS
            .iter()
            .find(|(suffix, _)| *suffix == self.0)
            .map(|(_, label)| *label)
            .unwrap_or("Custom")
    }

    /// Index into [`KNOWN_ENVIRONMENTS`], if this is one of them.
    pub fn known_index(&self) -> Option<usize> {
        KNOWN_ENVIRONMENTS
            .iter()
            .position(|(suffix, _)| *suffix == self.0)
    }

    pub fn known(index: usize) -> Self {
        let (suffix, _) = KNOWN_ENVIRONMENTS[index % KNOWN_ENVIRONMENTS.len()];
        Self(suffix.to_string())
    }

    /// The next known environment, wrapping around. A custom suffix moves
    /// to the first known one.
    pub fn cycle(&self, forward: bool) -> Self {
        let len = KNOWN_ENVIRONMENTS.len();
        let next = match self.known_index() {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        Self::known(next)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self(DEFAULT_ENVIRONMENT.to_string())
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How requests reach the login and api hosts.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Routing {
    #[default]
    Direct,
    /// A `ccdash proxy` instance: `/login` and `/api` prefixes on `base`.
    /// The proxy targets its own fixed region.
    LocalProxy { base: String },
    /// A pass-through relay that takes the full target URL after `prefix`.
    Relay { prefix: String },
}

impl Routing {
    pub fn label(&self) -> String {
        match self {
            Self::Direct => "direct".to_string(),
            Self::LocalProxy { base } => format!("proxy {}", base),
            Self::Relay { prefix } => format!("relay {}", prefix),
        }
    }
}

pub const AGENTS_PATH: &str = "/api/v2/users?presence=ONLINE&expand=presence";
pub const QUEUES_PATH: &str = "/api/v2/analytics/queues/observations/query";
pub const TOKEN_PATH: &str = "/oauth/token";

/// Fully resolved URLs for one request cycle. Built from a snapshot of the
/// environment, so a later environment change never touches a cycle that
/// already started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub token: String,
    pub agents: String,
    pub queues: String,
}

impl Endpoints {
    pub fn resolve(environment: &Environment, routing: &Routing) -> Self {
        let (login_base, api_base) = match routing {
            Routing::Direct => (
                format!("https://login.{}", environment),
                format!("https://api.{}", environment),
            ),
            Routing::LocalProxy { base } => {
                let base = base.trim_end_matches('/');
                (format!("{}/login", base), format!("{}/api", base))
            }
            Routing::Relay { prefix } => (
                format!("{}https://login.{}", prefix, environment),
                format!("{}https://api.{}", prefix, environment),
            ),
        };

        Self {
            token: format!("{}{}", login_base, TOKEN_PATH),
            agents: format!("{}{}", api_base, AGENTS_PATH),
            queues: format!("{}{}", api_base, QUEUES_PATH),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_lowercases() {
        let env = Environment::parse("  MyPureCloud.IE. ").unwrap();
        assert_eq!(env.as_str(), "mypurecloud.ie");
        assert_eq!(env.label(), "EMEA (Dublin)");
    }

    #[test]
    fn test_parse_rejects_empty_and_urls() {
        assert!(matches!(
            Environment::parse("   "),
            Err(DashError::Validation(_))
        ));
        assert!(Environment::parse("https://login.mypurecloud.com").is_err());
    }

    #[test]
    fn test_cycle_wraps_both_ways() {
        let first = Environment::known(0);
        let last = Environment::known(KNOWN_ENVIRONMENTS.len() - 1);
        assert_eq!(last.cycle(true), first);
        assert_eq!(first.cycle(false), last);

        let custom = Environment::parse("example.test").unwrap();
        assert_eq!(custom.label(), "Custom");
        assert_eq!(custom.cycle(true), first);
    }

    #[test]
    fn test_direct_endpoints() {
        let env = Environment::parse("mypurecloud.de").unwrap();
        let ep = Endpoints::resolve(&env, &Routing::Direct);
        assert_eq!(ep.token, "https://login.mypurecloud.de/oauth/token");
        assert_eq!(
            ep.agents,
            "https://api.mypurecloud.de/api/v2/users?presence=ONLINE&expand=presence"
        );
        assert_eq!(
            ep.queues,
            "https://api.mypurecloud.de/api/v2/analytics/queues/observations/query"
        );
    }

    #[test]
    fn test_local_proxy_endpoints_ignore_environment() {
        let routing = Routing::LocalProxy {
            base: "http://localhost:3000/".into(),
        };
        let a = Endpoints::resolve(&Environment::default(), &routing);
        let b = Endpoints::resolve(&Environment::parse("mypurecloud.jp").unwrap(), &routing);
        assert_eq!(a, b);
        assert_eq!(a.token, "http://localhost:3000/login/oauth/token");
        assert!(a.agents.starts_with("http://localhost:3000/api/api/v2/users"));
    }

    #[test]
    fn test_relay_endpoints_wrap_full_url() {
        let routing = Routing::Relay {
            prefix: "https://relay.example/".into(),
        };
        let ep = Endpoints::resolve(&Environment::default(), &routing);
        assert_eq!(
            ep.token,
            "https://relay.example/https://login.mypurecloud.com/oauth/token"
        );
    }
}

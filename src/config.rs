use crate::log::redact;
use crate::tlog;

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::genesys::environment::DEFAULT_ENVIRONMENT;
use crate::genesys::{Credentials, DashError, Environment, Routing};
use crate::refresh::SessionSettings;

const DEFAULT_POLL_INTERVAL: u64 = 30;
const DEFAULT_PROXY_URL: &str = "http://localhost:3000";
const DEFAULT_PROXY_LISTEN: &str = "127.0.0.1:3000";
const DEFAULT_PROXY_REGION: &str = "mypurecloud.in";

#[derive(Debug, Clone)]
pub struct DashConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub environment: String,
    pub poll_interval: u64,
    pub request_timeout: Option<u64>,
    pub routing: Routing,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    pub listen: String,
    /// Region suffix both upstream hosts are built from.
    pub region: String,
    pub static_root: PathBuf,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_PROXY_LISTEN.to_string(),
            region: DEFAULT_PROXY_REGION.to_string(),
            static_root: PathBuf::from("."),
        }
    }
}

#[derive(Deserialize, Default)]
struct ConfigFile {
    genesys: Option<GenesysSection>,
    proxy: Option<ProxySection>,
}

#[derive(Deserialize, Default)]
struct GenesysSection {
    client_id: Option<String>,
    client_secret: Option<String>,
    environment: Option<String>,
    poll_interval: Option<u64>,
    request_timeout: Option<u64>,
    routing: Option<String>,
    proxy_url: Option<String>,
    relay_url: Option<String>,
}

#[derive(Deserialize, Default)]
struct ProxySection {
    listen: Option<String>,
    region: Option<String>,
    static_root: Option<PathBuf>,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self::from_file(ConfigFile::default())
    }
}

impl DashConfig {
    /// Defaults, then `~/.ccdash/config.toml`, then `GENESYS_*` variables.
    pub fn load() -> Self {
        let mut config = match Self::read_config_file() {
            Some(file) => Self::from_file(file),
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());

        tlog!(
            info,
            "config loaded: environment={} poll={}s routing={} client_id={}",
            config.environment,
            config.poll_interval,
            config.routing.label(),
            config
                .client_id
                .as_deref()
                .map(redact)
                .unwrap_or_else(|| "-".to_string()),
        );

        config
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(Self::from_file(file))
    }

    fn from_file(file: ConfigFile) -> Self {
        let genesys = file.genesys.unwrap_or_default();
        let proxy = file.proxy.unwrap_or_default();
        let proxy_defaults = ProxyConfig::default();

        Self {
            client_id: genesys.client_id.filter(|v| !v.is_empty()),
            client_secret: genesys.client_secret.filter(|v| !v.is_empty()),
            environment: genesys
                .environment
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            poll_interval: genesys.poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL).max(1),
            request_timeout: genesys.request_timeout.filter(|t| *t > 0),
            routing: parse_routing(
                genesys.routing.as_deref(),
                genesys.proxy_url,
                genesys.relay_url,
            ),
            proxy: ProxyConfig {
                listen: proxy.listen.unwrap_or(proxy_defaults.listen),
                region: proxy.region.unwrap_or(proxy_defaults.region),
                static_root: proxy.static_root.unwrap_or(proxy_defaults.static_root),
            },
        }
    }

    /// Environment variables win over the file. Empty values are ignored.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        if let Some(id) = get("GENESYS_CLIENT_ID") {
            self.client_id = Some(id);
        }
        if let Some(secret) = get("GENESYS_CLIENT_SECRET") {
            self.client_secret = Some(secret);
        }
        if let Some(env) = get("GENESYS_ENVIRONMENT") {
            self.environment = env;
        }
    }

    pub fn credentials(&self) -> Credentials {
        Credentials::new(
            self.client_id.clone().unwrap_or_default(),
            self.client_secret.clone().unwrap_or_default(),
        )
    }

    pub fn environment(&self) -> Result<Environment, DashError> {
        Environment::parse(&self.environment)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            routing: self.routing.clone(),
            refresh_interval: Duration::from_secs(self.poll_interval),
            request_timeout: self.request_timeout.map(Duration::from_secs),
        }
    }

    fn read_config_file() -> Option<ConfigFile> {
        let path = config_path()?;
        let content = std::fs::read_to_string(&path).ok()?;
        match toml::from_str(&content) {
            Ok(file) => Some(file),
            Err(e) => {
                tlog!(warn, "ignoring {}: {}", path.display(), e);
                None
            }
        }
    }
}

pub fn parse_routing(
    kind: Option<&str>,
    proxy_url: Option<String>,
    relay_url: Option<String>,
) -> Routing {
    match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
        None | Some("") | Some("direct") => Routing::Direct,
        Some("proxy") => Routing::LocalProxy {
            base: proxy_url.unwrap_or_else(|| DEFAULT_PROXY_URL.to_string()),
        },
        Some("relay") => match relay_url.filter(|u| !u.is_empty()) {
            Some(prefix) => Routing::Relay { prefix },
            None => {
                tlog!(warn, "routing = \"relay\" needs relay_url; using direct");
                Routing::Direct
            }
        },
        Some(other) => {
            tlog!(warn, "unknown routing {:?}; using direct", other);
            Routing::Direct
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".ccdash").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_path() {
        let path = config_path();
        assert!(path.is_some());
        assert!(path.unwrap().ends_with(".ccdash/config.toml"));
    }

    #[test]
    fn test_defaults() {
        let config = DashConfig::from_toml("").unwrap();
        assert_eq!(config.environment, "mypurecloud.com");
        assert_eq!(config.poll_interval, 30);
        assert_eq!(config.routing, Routing::Direct);
        assert_eq!(config.proxy, ProxyConfig::default());
        assert_eq!(config.session_settings().refresh_interval, Duration::from_secs(30));
        assert!(config.session_settings().request_timeout.is_none());
    }

    #[test]
    fn test_full_file() {
        let config = DashConfig::from_toml(
            r#"
            [genesys]
            client_id = "abc"
            client_secret = "shh"
            environment = "mypurecloud.ie"
            poll_interval = 0
            request_timeout = 12
            routing = "proxy"
            proxy_url = "http://127.0.0.1:4000"

            [proxy]
            listen = "0.0.0.0:8080"
            region = "mypurecloud.de"
            static_root = "/srv/dash"
            "#,
        )
        .unwrap();

        assert_eq!(config.credentials(), Credentials::new("abc", "shh"));
        assert_eq!(config.environment().unwrap().as_str(), "mypurecloud.ie");
        assert_eq!(config.poll_interval, 1);
        assert_eq!(
            config.session_settings().request_timeout,
            Some(Duration::from_secs(12))
        );
        assert_eq!(
            config.routing,
            Routing::LocalProxy {
                base: "http://127.0.0.1:4000".into()
            }
        );
        assert_eq!(config.proxy.listen, "0.0.0.0:8080");
        assert_eq!(config.proxy.region, "mypurecloud.de");
        assert_eq!(config.proxy.static_root, PathBuf::from("/srv/dash"));
    }

    #[test]
    fn test_env_overrides_file_but_not_with_empty_values() {
        let mut config = DashConfig::from_toml(
            r#"
            [genesys]
            client_id = "from-file"
            environment = "mypurecloud.jp"
            "#,
        )
        .unwrap();

        let vars: HashMap<&str, &str> = [
            ("GENESYS_CLIENT_ID", "from-env"),
            ("GENESYS_CLIENT_SECRET", "env-secret"),
            ("GENESYS_ENVIRONMENT", ""),
        ]
        .into_iter()
        .collect();
        config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.client_id.as_deref(), Some("from-env"));
        assert_eq!(config.client_secret.as_deref(), Some("env-secret"));
        assert_eq!(config.environment, "mypurecloud.jp");
    }

    #[test]
    fn test_routing_kinds() {
        assert_eq!(parse_routing(Some("DIRECT"), None, None), Routing::Direct);
        assert_eq!(
            parse_routing(Some("proxy"), None, None),
            Routing::LocalProxy {
                base: "http://localhost:3000".into()
            }
        );
        assert_eq!(
            parse_routing(Some("relay"), None, Some("https://r.example/".into())),
            Routing::Relay {
                prefix: "https://r.example/".into()
            }
        );
        assert_eq!(parse_routing(Some("relay"), None, None), Routing::Direct);
        assert_eq!(parse_routing(Some("carrier-pigeon"), None, None), Routing::Direct);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        assert!(DashConfig::from_toml("[genesys\nclient_id = 1").is_err());
    }
}

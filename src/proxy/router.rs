/// Base URLs (scheme + host, no trailing slash) the two prefixes forward to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstreams {
    pub api: String,
    pub login: String,
}

impl Upstreams {
    pub fn for_region(region: &str) -> Self {
        let region = region.trim().trim_matches('.');
        Self {
            api: format!("https://api.{}", region),
            login: format!("https://login.{}", region),
        }
    }

    /// Picks the upstream for a request URL (path plus optional query), or
    /// `None` when the path belongs to the static file handler.
    pub fn resolve(&self, url: &str) -> Option<Forward> {
        let (path, query) = match url.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (url, None),
        };

        let (base, rest) = if let Some(rest) = strip_segment(path, "/api") {
            (&self.api, rest)
        } else if let Some(rest) = strip_segment(path, "/login") {
            (&self.login, rest)
        } else {
            return None;
        };

        let rest = if rest.is_empty() { "/" } else { rest };
        let mut target = format!("{}{}", base, rest);
        if let Some(q) = query {
            target.push('?');
            target.push_str(q);
        }

        Some(Forward {
            host: host_of(base).to_string(),
            url: target,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Forward {
    /// Value for the rewritten `Host` header.
    pub host: String,
    pub url: String,
}

/// `/api` and `/api/...` match `/api`; `/apiary` does not.
fn strip_segment<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

fn host_of(base: &str) -> &str {
    let without_scheme = base.split_once("://").map(|(_, h)| h).unwrap_or(base);
    without_scheme.split('/').next().unwrap_or(without_scheme)
}

use crate::tlog;

use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::router::{Forward, Upstreams};
use super::static_files;
use crate::config::ProxyConfig;

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";
const UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);
const ACCEPT_SLICE: Duration = Duration::from_millis(100);

/// Headers that describe one connection rather than the message.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "transfer-encoding",
    "te",
    "trailer",
    "upgrade",
    "content-length",
    "proxy-connection",
];

/// Local CORS reverse proxy: `/api` and `/login` go upstream, everything
/// else is a static file.
pub struct ProxyServer {
    server: tiny_http::Server,
    addr: SocketAddr,
    shared: Arc<Shared>,
}

struct Shared {
    upstreams: Upstreams,
    static_root: PathBuf,
    agent: ureq::Agent,
}

/// A response before the CORS header is attached.
struct Outgoing {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Outgoing {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: vec![("Content-Type".into(), "text/plain; charset=utf-8".into())],
            body: body.as_bytes().to_vec(),
        }
    }
}

impl ProxyServer {
    pub fn from_config(config: &ProxyConfig) -> Result<Self> {
        Self::bind(
            &config.listen,
            Upstreams::for_region(&config.region),
            config.static_root.clone(),
        )
    }

    pub fn bind(listen: &str, upstreams: Upstreams, static_root: PathBuf) -> Result<Self> {
        let server = tiny_http::Server::http(listen)
            .map_err(|e| anyhow!("failed to listen on {}: {}", listen, e))?;
        let addr = server
            .server_addr()
            .to_ip()
            .context("listener has no IP address")?;

        let agent = ureq::Agent::config_builder()
            .timeout_global(Some(UPSTREAM_TIMEOUT))
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .new_agent();

        tlog!(
            info,
            "proxy listening on {} (api={} login={} root={})",
            addr,
            upstreams.api,
            upstreams.login,
            static_root.display()
        );

        Ok(Self {
            server,
            addr,
            shared: Arc::new(Shared {
                upstreams,
                static_root,
                agent,
            }),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Accepts until `stop` is set. Each request gets its own thread.
    pub fn run(&self, stop: &AtomicBool) -> Result<()> {
        while !stop.load(Ordering::Relaxed) {
            match self.server.recv_timeout(ACCEPT_SLICE) {
                Ok(Some(request)) => {
                    let shared = Arc::clone(&self.shared);
                    std::thread::spawn(move || shared.handle(request));
                }
                Ok(None) => {}
                Err(e) => return Err(e).context("proxy accept failed"),
            }
        }
        tlog!(info, "proxy stopped");
        Ok(())
    }
}

impl Shared {
    fn handle(&self, mut request: tiny_http::Request) {
        let method = request.method().as_str().to_string();
        let url = request.url().to_string();
        let id = uuid::Uuid::new_v4().simple().to_string();
        let id = &id[..8];

        let is_preflight =
            method == "OPTIONS" && header(&request, "access-control-request-method").is_some();
        let outgoing = if is_preflight {
            tlog!(info, "[{}] preflight {} {}", id, method, url);
            preflight(&request)
        } else if let Some(forward) = self.upstreams.resolve(&url) {
            tlog!(info, "[{}] Proxying request: {} {} -> {}", id, method, url, forward.url);
            match self.forward(&mut request, &method, &forward) {
                Ok(out) => out,
                Err(e) => {
                    tlog!(error, "[{}] upstream {} failed: {:#}", id, forward.url, e);
                    Outgoing::text(502, "Bad Gateway: upstream unreachable")
                }
            }
        } else {
            tlog!(info, "[{}] static {} {}", id, method, url);
            self.serve_static(&method, &url)
        };

        tlog!(info, "[{}] -> {}", id, outgoing.status);
        if let Err(e) = request.respond(into_response(outgoing)) {
            tlog!(warn, "[{}] client went away: {}", id, e);
        }
    }

    fn forward(
        &self,
        request: &mut tiny_http::Request,
        method: &str,
        forward: &Forward,
    ) -> Result<Outgoing> {
        // Host comes from the target URI, which rewrites it to the upstream.
        let mut builder = ureq::http::Request::builder()
            .method(method)
            .uri(forward.url.as_str());
        for h in request.headers() {
            let name = h.field.as_str().as_str().to_ascii_lowercase();
            if name == "host" || name == "accept-encoding" || HOP_BY_HOP.contains(&name.as_str()) {
                continue;
            }
            builder = builder.header(name.as_str(), h.value.as_str());
        }

        let mut body = Vec::new();
        request
            .as_reader()
            .read_to_end(&mut body)
            .context("reading request body")?;

        // Methods that carry a payload keep an explicit zero length when empty.
        let bodiless = matches!(method, "GET" | "HEAD" | "OPTIONS" | "DELETE");
        let mut resp = if body.is_empty() && bodiless {
            self.send(builder.body(())?)?
        } else {
            self.send(builder.body(body)?)?
        };

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                let name = name.as_str();
                // Bodies arrive decoded, so the encoding header no longer applies.
                if HOP_BY_HOP.contains(&name)
                    || name == "content-encoding"
                    || name == "access-control-allow-origin"
                {
                    return None;
                }
                value.to_str().ok().map(|v| (name.to_string(), v.to_string()))
            })
            .collect();
        let body = resp
            .body_mut()
            .read_to_vec()
            .context("reading upstream body")?;

        Ok(Outgoing {
            status,
            headers,
            body,
        })
    }

    fn send<B: ureq::AsSendBody>(
        &self,
        request: ureq::http::Request<B>,
    ) -> Result<ureq::http::Response<ureq::Body>> {
        Ok(self.agent.run(request)?)
    }

    fn serve_static(&self, method: &str, url: &str) -> Outgoing {
        if method != "GET" && method != "HEAD" {
            return Outgoing::text(404, "Not Found");
        }
        let Some(path) = static_files::resolve(&self.static_root, url) else {
            return Outgoing::text(404, "Not Found");
        };
        match std::fs::read(&path) {
            Ok(body) => Outgoing {
                status: 200,
                headers: vec![(
                    "Content-Type".into(),
                    static_files::content_type(&path).into(),
                )],
                body,
            },
            Err(e) => {
                tlog!(warn, "failed to read {}: {}", path.display(), e);
                Outgoing::text(404, "Not Found")
            }
        }
    }
}

fn header(request: &tiny_http::Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str().to_string())
}

fn preflight(request: &tiny_http::Request) -> Outgoing {
    let mut headers = vec![(
        "Access-Control-Allow-Methods".to_string(),
        ALLOWED_METHODS.to_string(),
    )];
    if let Some(requested) = header(request, "access-control-request-headers") {
        headers.push(("Access-Control-Allow-Headers".into(), requested));
        headers.push(("Vary".into(), "Access-Control-Request-Headers".into()));
    }
    Outgoing {
        status: 204,
        headers,
        body: Vec::new(),
    }
}

fn into_response(out: Outgoing) -> tiny_http::Response<std::io::Cursor<Vec<u8>>> {
    let mut response = tiny_http::Response::from_data(out.body).with_status_code(out.status);
    let cors = std::iter::once(("Access-Control-Allow-Origin".to_string(), "*".to_string()));
    for (name, value) in out.headers.into_iter().chain(cors) {
        match tiny_http::Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(h) => response.add_header(h),
            Err(()) => tlog!(warn, "dropping unrepresentable header {}", name),
        }
    }
    response
}

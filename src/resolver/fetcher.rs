use std::error::Error as StdError;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::{redirect, Client as ReqwestClient, Response};
use url::{Host, Url};

use super::error::FetchError;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const MAX_REDIRECTS: usize = 10;
pub const MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

type BoxError = Box<dyn StdError + Send + Sync>;

// ── URL validation ─────────────────────────────────────────────────────────

/// Parse `url` as an absolute http(s) URL with a host.
pub fn parse_http_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url.trim()).map_err(|_| FetchError::InvalidUrl)?;
    ensure_http(&parsed)?;
    Ok(parsed)
}

/// Returns `true` if `url` is something the fetcher would attempt to GET.
pub fn is_valid_url(url: &str) -> bool {
    parse_http_url(url).is_ok()
}

fn ensure_http(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => {}
        _ => return Err(FetchError::InvalidUrl),
    }
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(FetchError::InvalidUrl),
    }
}

/// Returns `true` if `ip` is a private, loopback, or link-local address.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            matches!(
                o,
                [127, ..]
                    | [10, ..]
                    | [169, 254, ..]
                    | [192, 168, ..]
                    | [0, ..]
                    | [255, 255, 255, 255]
            ) || (o[0] == 172 && (16..=31).contains(&o[1]))
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xfe00 == 0xfc00)
                || (v6.segments()[0] & 0xffc0 == 0xfe80)
                || v6.to_ipv4_mapped().is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}

// ── Private-address guard ──────────────────────────────────────────────────

/// `true` if the URL's host is an IP literal in a private range.
///
/// Literal hosts never reach the DNS resolver, so they are checked here for
/// the first request and for every redirect hop.
pub fn host_is_private_literal(url: &Url) -> bool {
    match url.host() {
        Some(Host::Ipv4(v4)) => is_private_ip(IpAddr::V4(v4)),
        Some(Host::Ipv6(v6)) => is_private_ip(IpAddr::V6(v6)),
        _ => false,
    }
}

/// Redirect policy used while the guard is on: at most `MAX_REDIRECTS` hops,
/// none of them to a private IP literal.
pub fn guarded_redirect_policy() -> redirect::Policy {
    redirect::Policy::custom(|attempt| {
        if attempt.previous().len() >= MAX_REDIRECTS {
            attempt.error("too many redirects")
        } else if host_is_private_literal(attempt.url()) {
            tracing::warn!(url = %attempt.url(), "Refusing redirect to private address");
            attempt.error(FetchError::PrivateAddress)
        } else {
            attempt.follow()
        }
    })
}

/// Resolves names with the system resolver.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl Resolve for SystemResolver {
    fn resolve(&self, name: Name) -> Resolving {
        Box::pin(async move {
            let addrs = tokio::net::lookup_host((name.as_str(), 0)).await?;
            let addrs: Addrs = Box::new(addrs.collect::<Vec<_>>().into_iter());
            Ok::<_, BoxError>(addrs)
        })
    }
}

/// DNS resolver that refuses names resolving to any private address.
///
/// Installed on the HTTP client, so every connection is checked, redirect
/// hops included, against the addresses that are actually dialled.
pub struct GuardedResolver {
    inner: Arc<dyn Resolve>,
}

impl GuardedResolver {
    pub fn new(inner: Arc<dyn Resolve>) -> Self {
        GuardedResolver { inner }
    }
}

impl Resolve for GuardedResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let inner = Arc::clone(&self.inner);
        Box::pin(async move {
            let host = name.as_str().to_string();
            let addrs: Vec<SocketAddr> = inner.resolve(name).await?.collect();

            if let Some(addr) = addrs.iter().find(|addr| is_private_ip(addr.ip())) {
                tracing::warn!(host = %host, ip = %addr.ip(), "Refusing to connect to private address");
                return Err(Box::new(FetchError::PrivateAddress) as BoxError);
            }

            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, BoxError>(addrs)
        })
    }
}

/// `true` if the guard caused this request to fail.
fn blocked_by_guard(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if matches!(e.downcast_ref::<FetchError>(), Some(FetchError::PrivateAddress)) {
            return true;
        }
        source = e.source();
    }
    false
}

// ── Fetcher seam ───────────────────────────────────────────────────────────

/// Retrieves the raw HTML for a page.
///
/// Implementations perform at most one outbound request per call and never
/// retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError>;
}

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub timeout: Duration,
    pub user_agent: String,
    /// Refuse hosts that resolve to private/loopback/link-local addresses.
    pub block_private_addresses: bool,
    /// Bytes of body read before the rest is dropped.
    pub max_body_bytes: usize,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        FetcherConfig {
            timeout: FETCH_TIMEOUT,
            user_agent: USER_AGENT.to_string(),
            block_private_addresses: true,
            max_body_bytes: MAX_BODY_BYTES,
        }
    }
}

/// `PageFetcher` backed by a shared `reqwest` client.
#[derive(Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    block_private_addresses: bool,
    max_body_bytes: usize,
}

impl HttpFetcher {
    pub fn new(config: &FetcherConfig) -> Result<Self, reqwest::Error> {
        Self::with_resolver(config, Arc::new(SystemResolver))
    }

    /// Like `new`, but names are looked up through `resolver`. The guard, when
    /// enabled, wraps it.
    pub fn with_resolver(
        config: &FetcherConfig,
        resolver: Arc<dyn Resolve>,
    ) -> Result<Self, reqwest::Error> {
        let builder = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str());

        let builder = if config.block_private_addresses {
            builder
                .dns_resolver(Arc::new(GuardedResolver::new(resolver)))
                .redirect(guarded_redirect_policy())
        } else {
            builder.dns_resolver(Arc::new(PassthroughResolver(resolver)))
        };

        Ok(HttpFetcher {
            client: builder.build()?,
            block_private_addresses: config.block_private_addresses,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Read at most `max_body_bytes` of the body. Anything past the cap is
    /// dropped; page metadata lives in `<head>`.
    async fn read_body(&self, mut response: Response, url: &Url) -> Result<String, FetchError> {
        let mut body: Vec<u8> = Vec::new();

        while let Some(chunk) = response.chunk().await.map_err(|e| {
            tracing::warn!(error = ?e, url = %url, "Failed to read response body");
            FetchError::ParseFailure(e.to_string())
        })? {
            let room = self.max_body_bytes - body.len();
            if chunk.len() >= room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!(url = %url, limit = self.max_body_bytes, "Response body truncated");
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Hands lookups straight to the wrapped resolver.
struct PassthroughResolver(Arc<dyn Resolve>);

impl Resolve for PassthroughResolver {
    fn resolve(&self, name: Name) -> Resolving {
        self.0.resolve(name)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, FetchError> {
        ensure_http(url)?;

        if self.block_private_addresses && host_is_private_literal(url) {
            return Err(FetchError::PrivateAddress);
        }

        let response = self.client.get(url.clone()).send().await.map_err(|e| {
            if blocked_by_guard(&e) {
                return FetchError::PrivateAddress;
            }
            tracing::warn!(error = ?e, url = %url, "Failed to fetch URL for link resolution");
            FetchError::Transport(e.to_string())
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(%status, url = %url, "Upstream returned non-success status");
            return Err(FetchError::Status(status));
        }

        self.read_body(response, url).await
    }
}

// ── Unit tests ─────────────────────────────────────────────────────────────

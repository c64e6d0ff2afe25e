// ABOUTME: Production DocumentCapability backed by reqwest with SSRF protection and size limits.
// ABOUTME: Validates URLs, blocks private networks, caps content length, and decodes charsets.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use ipnet::{Ipv4Net, Ipv6Net};

use crate::capability::{DocumentCapability, PageDocument};
use crate::error::PipelineError;

/// Maximum allowed content length (10 MB).
pub const MAX_CONTENT_LENGTH: usize = 10 * 1024 * 1024;

/// HTTP-backed document capability.
///
/// Stateless across requests: each navigation owns its response exclusively
/// and everything is released when the returned [`PageDocument`] drops.
#[derive(Debug, Clone)]
pub struct HttpCapability {
    client: reqwest::Client,
    allow_private_networks: bool,
}

impl HttpCapability {
    /// Build a capability with the given per-request timeout.
    pub fn new(timeout: Duration, allow_private_networks: bool) -> Result<Self, PipelineError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("granary/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| {
                PipelineError::extraction(
                    "BuildClient",
                    Some(anyhow::anyhow!("failed to build HTTP client: {}", e)),
                )
            })?;
        Ok(Self {
            client,
            allow_private_networks,
        })
    }

    /// Build a capability around an existing reqwest client.
    pub fn with_client(client: reqwest::Client, allow_private_networks: bool) -> Self {
        Self {
            client,
            allow_private_networks,
        }
    }

    async fn check_host(&self, parsed: &url::Url) -> Result<(), PipelineError> {
        if self.allow_private_networks {
            return Ok(());
        }
        let Some(host) = parsed.host_str() else {
            return Ok(());
        };
        if let Ok(ip) = host.parse::<IpAddr>() {
            if is_private_ip(&ip) {
                return Err(PipelineError::extraction(
                    "Navigate",
                    Some(anyhow::anyhow!(
                        "private IP addresses are not allowed: {}",
                        host
                    )),
                ));
            }
            return Ok(());
        }
        let port = parsed
            .port()
            .unwrap_or(if parsed.scheme() == "https" { 443 } else { 80 });
        let addrs = tokio::net::lookup_host((host, port)).await.map_err(|e| {
            PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("DNS lookup failed for {}: {}", host, e)),
            )
        })?;
        for socket_addr in addrs {
            if is_private_ip(&socket_addr.ip()) {
                return Err(PipelineError::extraction(
                    "Navigate",
                    Some(anyhow::anyhow!(
                        "host {} resolves to a private address",
                        host
                    )),
                ));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl DocumentCapability for HttpCapability {
    async fn navigate(&self, url: &str) -> Result<PageDocument, PipelineError> {
        if url.is_empty() {
            return Err(PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("empty URL")),
            ));
        }

        let parsed = url::Url::parse(url).map_err(|e| {
            PipelineError::extraction("Navigate", Some(anyhow::anyhow!("invalid URL: {}", e)))
        })?;

        let scheme = parsed.scheme();
        if scheme != "http" && scheme != "https" {
            return Err(PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("scheme must be http or https")),
            ));
        }

        self.check_host(&parsed).await?;

        let response = self.client.get(url).send().await.map_err(|e| {
            let cause = if e.is_timeout() {
                anyhow::anyhow!("navigation timed out: {}", e)
            } else {
                anyhow::anyhow!("request failed: {}", e)
            };
            PipelineError::extraction("Navigate", Some(cause))
        })?;

        // Re-check after redirects: the final host must not be private either.
        let final_parsed = response.url().clone();
        self.check_host(&final_parsed).await?;

        let content_length = response.content_length().or_else(|| {
            response
                .headers()
                .get("content-length")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
        });
        if let Some(len) = content_length {
            if len as usize > MAX_CONTENT_LENGTH {
                return Err(PipelineError::extraction(
                    "Navigate",
                    Some(anyhow::anyhow!("content too large: {} bytes", len)),
                ));
            }
        }

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_lowercase());

        let body = response.bytes().await.map_err(|e| {
            PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("failed to read body: {}", e)),
            )
        })?;

        if body.len() > MAX_CONTENT_LENGTH {
            return Err(PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("content too large: {} bytes", body.len())),
            ));
        }

        if status != 200 {
            return Err(PipelineError::extraction(
                "Navigate",
                Some(anyhow::anyhow!("HTTP status {}", status)),
            ));
        }

        Ok(PageDocument {
            url: url.to_string(),
            final_url,
            html: decode_body(&body, content_type.as_deref()),
        })
    }
}

/// Check if an IP address is in a private/reserved range.
fn is_private_ip(addr: &IpAddr) -> bool {
    match addr {
        IpAddr::V4(ip) => {
            // RFC1918 private ranges
            let private_10: Ipv4Net = "10.0.0.0/8".parse().unwrap();
            let private_172: Ipv4Net = "172.16.0.0/12".parse().unwrap();
            let private_192: Ipv4Net = "192.168.0.0/16".parse().unwrap();
            let loopback: Ipv4Net = "127.0.0.0/8".parse().unwrap();
            let link_local: Ipv4Net = "169.254.0.0/16".parse().unwrap();

            private_10.contains(ip)
                || private_172.contains(ip)
                || private_192.contains(ip)
                || loopback.contains(ip)
                || link_local.contains(ip)
        }
        IpAddr::V6(ip) => {
            if ip.is_loopback() {
                return true;
            }
            let unique_local: Ipv6Net = "fc00::/7".parse().unwrap();
            let link_local: Ipv6Net = "fe80::/10".parse().unwrap();

            unique_local.contains(ip) || link_local.contains(ip)
        }
    }
}

/// Decode body bytes to a String using charset from content-type header or detection.
fn decode_body(body: &[u8], content_type: Option<&str>) -> String {
    if let Some(ct) = content_type {
        if let Some(charset) = extract_charset(ct) {
            if let Some(encoding) = encoding_rs::Encoding::for_label(charset.as_bytes()) {
                let (decoded, _, _) = encoding.decode(body);
                return decoded.into_owned();
            }
        }
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(body, true);
    let encoding = detector.guess(None, true);
    let (decoded, _, _) = encoding.decode(body);
    decoded.into_owned()
}

/// Extract charset value from a Content-Type header.
fn extract_charset(content_type: &str) -> Option<String> {
    let lower = content_type.to_lowercase();
    for part in lower.split(';') {
        let trimmed = part.trim();
        if let Some(charset) = trimmed.strip_prefix("charset=") {
            let charset = charset.trim_matches('"').trim_matches('\'');
            return Some(charset.to_string());
        }
    }
    None
}

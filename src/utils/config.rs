//! Service configuration

use crate::extractor::endpoint::ResolverEndpoint;
use crate::extractor::reference::DEFAULT_ACCEPTED_HOSTS;
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_REFERER: &str = "https://www.tiktok.com/";

/// Service settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Address the HTTP server binds to
    pub host: IpAddr,

    /// Port the HTTP server listens on
    pub port: u16,

    /// Per-endpoint bound for resolver lookups
    pub resolver_timeout: Duration,

    /// Bound for reaching the media origin and receiving its headers
    pub relay_timeout: Duration,

    /// Browser user agent sent to resolvers and the media origin
    pub user_agent: String,

    /// Referer sent to the media origin (hotlink protection)
    pub referer: String,

    /// Hosts a video link may point at
    pub accepted_hosts: Vec<String>,

    /// Resolver endpoints in priority order
    pub endpoints: Vec<ResolverEndpoint>,

    /// Chunks buffered between the upstream stream and the response body
    pub relay_buffer: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            resolver_timeout: Duration::from_millis(15_000),
            relay_timeout: Duration::from_millis(60_000),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            referer: DEFAULT_REFERER.to_string(),
            accepted_hosts: DEFAULT_ACCEPTED_HOSTS.iter().map(|h| h.to_string()).collect(),
            endpoints: ResolverEndpoint::defaults(),
            relay_buffer: 16,
        }
    }
}

impl AppSettings {
    /// Enforce sane minimums and a canonical host list
    pub fn sanitized(mut self) -> Self {
        if self.relay_buffer == 0 {
            self.relay_buffer = 1;
        }

        self.accepted_hosts = self
            .accepted_hosts
            .iter()
            .map(|h| h.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|h| !h.is_empty())
            .collect();

        self
    }
}

//! Caller-supplied video links

use crate::utils::error::ResolutionError;
use std::fmt;
use url::Url;

/// Hosts accepted when no explicit list is configured
pub const DEFAULT_ACCEPTED_HOSTS: &[&str] = &["tiktok.com", "vm.tiktok.com", "vt.tiktok.com"];

/// A shareable video link that passed host validation.
///
/// Keeps the caller's text verbatim (trimmed) since that is what gets
/// forwarded to the resolver endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoReference {
    raw: String,
    host: String,
}

impl VideoReference {
    /// Validate `input` against `accepted_hosts`.
    ///
    /// A host matches when it equals an accepted entry or is a subdomain of
    /// one. Links pasted without a scheme are read as `https://`.
    pub fn parse<S: AsRef<str>>(input: &str, accepted_hosts: &[S]) -> Result<Self, ResolutionError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ResolutionError::MissingReference);
        }

        let invalid = || ResolutionError::InvalidReference(trimmed.to_string());

        let url = Url::parse(trimmed)
            .or_else(|_| Url::parse(&format!("https://{trimmed}")))
            .map_err(|_| invalid())?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid());
        }

        let host = url
            .host_str()
            .map(|h| h.trim_end_matches('.').to_ascii_lowercase())
            .ok_or_else(invalid)?;

        let accepted = accepted_hosts.iter().any(|candidate| {
            let candidate = candidate.as_ref();
            host == candidate
                || host
                    .strip_suffix(candidate)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        });

        if !accepted {
            return Err(invalid());
        }

        Ok(Self {
            raw: trimmed.to_string(),
            host,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn host(&self) -> &str {
        &self.host
    }
}

impl fmt::Display for VideoReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

//! Resolver endpoint configuration

use crate::extractor::models::SourceTag;
use crate::extractor::reference::VideoReference;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};

/// Characters left untouched when embedding a link as a query value
/// (the `encodeURIComponent` set)
const URL_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// One upstream lookup service.
///
/// `template` contains a `{url}` placeholder that receives the encoded
/// reference; `tag` picks the normalization rules for the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverEndpoint {
    pub tag: SourceTag,
    pub template: String,
}

impl ResolverEndpoint {
    pub const PLACEHOLDER: &'static str = "{url}";

    pub fn new(tag: SourceTag, template: impl Into<String>) -> Self {
        Self {
            tag,
            template: template.into(),
        }
    }

    pub fn tikwm() -> Self {
        Self::new(SourceTag::Tikwm, "https://www.tikwm.com/api/?url={url}")
    }

    pub fn tiklydown() -> Self {
        Self::new(
            SourceTag::Tiklydown,
            "https://api.tiklydown.com/api/download?url={url}",
        )
    }

    /// Production endpoints in priority order
    pub fn defaults() -> Vec<Self> {
        vec![Self::tikwm(), Self::tiklydown()]
    }

    pub fn request_url(&self, reference: &VideoReference) -> String {
        let encoded = utf8_percent_encode(reference.as_str(), URL_COMPONENT).to_string();
        self.template.replace(Self::PLACEHOLDER, &encoded)
    }
}

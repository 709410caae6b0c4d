//! Data structures for resolved video records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which resolver endpoint produced a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceTag {
    Tikwm,
    Tiklydown,
}

impl SourceTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTag::Tikwm => "tikwm",
            SourceTag::Tiklydown => "tiklydown",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Media variant flavour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTag {
    #[default]
    Standard,
    Hd,
    Watermark,
}

impl QualityTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTag::Standard => "standard",
            QualityTag::Hd => "hd",
            QualityTag::Watermark => "watermark",
        }
    }
}

impl fmt::Display for QualityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QualityTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standard" => Ok(QualityTag::Standard),
            "hd" => Ok(QualityTag::Hd),
            "watermark" => Ok(QualityTag::Watermark),
            other => Err(format!("unknown quality: {other}")),
        }
    }
}

/// One playable media URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityVariant {
    pub quality: QualityTag,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub nickname: String,
    pub unique_id: String,
    pub avatar: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub likes: u64,
    pub shares: u64,
    pub comments: u64,
    pub plays: u64,
    pub downloads: u64,
}

/// Canonical record built from whichever endpoint answered first.
///
/// Always carries at least one entry in `qualities`; payloads without a
/// playable URL never make it this far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub author: Author,
    pub duration: u64,
    pub cover: Option<String>,
    pub music: serde_json::Value,
    pub statistics: Statistics,
    pub qualities: Vec<QualityVariant>,
    pub analyzed_at: DateTime<Utc>,
    #[serde(rename = "apiSource")]
    pub source_tag: SourceTag,
}

impl VideoRecord {
    /// Quality tags in the order they appear in the record
    pub fn available_qualities(&self) -> Vec<QualityTag> {
        self.qualities.iter().map(|v| v.quality).collect()
    }
}

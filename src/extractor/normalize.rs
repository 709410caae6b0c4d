//! Per-provider response normalization
//!
//! Each provider's `data` payload is read through a typed struct whose
//! fields are all optional. Values that are empty, zero or of an unexpected
//! type count as absent, so every fallback chain falls through the same way
//! regardless of which provider answered.

use crate::extractor::models::{
    Author, QualityTag, QualityVariant, SourceTag, Statistics, VideoRecord,
};
use crate::utils::error::SourceError;
use chrono::Utc;
use serde::de::{DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::{Map, Value};

pub const DEFAULT_TITLE: &str = "TikTok Video";
pub const DEFAULT_NICKNAME: &str = "Unknown Creator";
pub const DEFAULT_UNIQUE_ID: &str = "unknown";

/// Normalize a raw `data` payload according to the rules for `tag`
pub fn normalize(tag: SourceTag, data: Value) -> Result<VideoRecord, SourceError> {
    if !data.is_object() {
        return Err(SourceError::Decode(
            "expected an object under \"data\"".to_string(),
        ));
    }

    match tag {
        SourceTag::Tikwm => normalize_tikwm(data),
        SourceTag::Tiklydown => normalize_tiklydown(data),
    }
}

pub fn normalize_tikwm(data: Value) -> Result<VideoRecord, SourceError> {
    let payload: CommonPayload = decode(data)?;
    build_record(payload, SourceTag::Tikwm)
}

/// tiklydown answers either with the tikwm field names or with its own
/// nested `video` / `stats` layout; flat fields win when both are present.
pub fn normalize_tiklydown(data: Value) -> Result<VideoRecord, SourceError> {
    let extras: TiklydownExtras = decode(data.clone())?;
    let mut payload: CommonPayload = decode(data)?;

    let video = extras.video.unwrap_or_default();
    payload.play = payload.play.or(video.no_watermark);
    payload.wmplay = payload.wmplay.or(video.watermark);
    payload.cover = payload.cover.or(video.cover);
    payload.duration = payload.duration.or(video.duration);

    let stats = extras.stats.unwrap_or_default();
    payload.like_count = payload.like_count.or(stats.like_count);
    payload.share_count = payload.share_count.or(stats.share_count);
    payload.comment_count = payload.comment_count.or(stats.comment_count);
    payload.play_count = payload.play_count.or(stats.play_count);

    let mut author = payload.author.take().unwrap_or_default();
    author.nickname = author
        .nickname
        .or_else(|| extras.author.and_then(|a| a.name));
    payload.author = Some(author);

    build_record(payload, SourceTag::Tiklydown)
}

fn decode<T: DeserializeOwned>(data: Value) -> Result<T, SourceError> {
    serde_json::from_value(data).map_err(|e| SourceError::Decode(e.to_string()))
}

fn build_record(payload: CommonPayload, tag: SourceTag) -> Result<VideoRecord, SourceError> {
    let qualities: Vec<QualityVariant> = [
        (QualityTag::Standard, payload.play),
        (QualityTag::Hd, payload.hdplay),
        (QualityTag::Watermark, payload.wmplay),
    ]
    .into_iter()
    .filter_map(|(quality, url)| url.map(|url| QualityVariant { quality, url }))
    .collect();

    if qualities.is_empty() {
        return Err(SourceError::NoPlayableUrl);
    }

    let author = payload.author.unwrap_or_default();
    let description = payload
        .desc
        .or_else(|| payload.title.clone())
        .unwrap_or_default();

    Ok(VideoRecord {
        id: payload
            .id
            .unwrap_or_else(|| Utc::now().timestamp_millis().to_string()),
        title: payload.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description,
        author: Author {
            nickname: author
                .nickname
                .unwrap_or_else(|| DEFAULT_NICKNAME.to_string()),
            unique_id: author
                .unique_id
                .unwrap_or_else(|| DEFAULT_UNIQUE_ID.to_string()),
            avatar: author.avatar.unwrap_or_default(),
        },
        duration: payload.duration.unwrap_or(0),
        cover: payload.cover.or(payload.thumbnail),
        music: payload
            .music
            .or(payload.music_info)
            .unwrap_or_else(|| Value::Object(Map::new())),
        statistics: Statistics {
            likes: payload.digg_count.or(payload.like_count).unwrap_or(0),
            shares: payload.share_count.unwrap_or(0),
            comments: payload.comment_count.unwrap_or(0),
            plays: payload.play_count.unwrap_or(0),
            downloads: payload.download_count.unwrap_or(0),
        },
        qualities,
        analyzed_at: Utc::now(),
        source_tag: tag,
    })
}

// ------------------------------------------------------------------
// Payload shapes
// ------------------------------------------------------------------

/// Field names shared by both providers (tikwm layout)
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CommonPayload {
    #[serde(deserialize_with = "text")]
    id: Option<String>,
    #[serde(deserialize_with = "text")]
    title: Option<String>,
    #[serde(deserialize_with = "text")]
    desc: Option<String>,
    #[serde(deserialize_with = "text")]
    cover: Option<String>,
    #[serde(deserialize_with = "text")]
    thumbnail: Option<String>,
    #[serde(deserialize_with = "text")]
    play: Option<String>,
    #[serde(deserialize_with = "text")]
    hdplay: Option<String>,
    #[serde(deserialize_with = "text")]
    wmplay: Option<String>,
    #[serde(deserialize_with = "count")]
    duration: Option<u64>,
    #[serde(deserialize_with = "nested")]
    author: Option<PayloadAuthor>,
    #[serde(deserialize_with = "opaque")]
    music: Option<Value>,
    #[serde(deserialize_with = "opaque")]
    music_info: Option<Value>,
    #[serde(deserialize_with = "count")]
    digg_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    like_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    share_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    comment_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    play_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    download_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct PayloadAuthor {
    #[serde(deserialize_with = "text")]
    nickname: Option<String>,
    #[serde(deserialize_with = "text")]
    unique_id: Option<String>,
    #[serde(deserialize_with = "text")]
    avatar: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TiklydownExtras {
    #[serde(deserialize_with = "nested")]
    video: Option<TiklydownVideo>,
    #[serde(deserialize_with = "nested")]
    stats: Option<TiklydownStats>,
    #[serde(deserialize_with = "nested")]
    author: Option<TiklydownAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TiklydownVideo {
    #[serde(deserialize_with = "text")]
    no_watermark: Option<String>,
    #[serde(deserialize_with = "text")]
    watermark: Option<String>,
    #[serde(deserialize_with = "text")]
    cover: Option<String>,
    #[serde(deserialize_with = "count")]
    duration: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct TiklydownStats {
    #[serde(deserialize_with = "count")]
    like_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    share_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    comment_count: Option<u64>,
    #[serde(deserialize_with = "count")]
    play_count: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TiklydownAuthor {
    #[serde(deserialize_with = "text")]
    name: Option<String>,
}

// ------------------------------------------------------------------
// Lenient field readers
// ------------------------------------------------------------------

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Non-empty string, or a number rendered as text
fn text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    if !is_present(&value) {
        return Ok(None);
    }
    Ok(match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

/// Positive integer, from a JSON number or a numeric string
fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u64>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    let parsed = match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(parsed.filter(|n| *n > 0))
}

/// Pass-through value that is only kept when present
fn opaque<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(is_present(&value).then_some(value))
}

/// Nested object; anything else reads as absent
fn nested<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Object(_) => serde_json::from_value(value).ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_tikwm_payload() {
        let record = normalize(
            SourceTag::Tikwm,
            json!({
                "id": "7312",
                "title": "Dance",
                "desc": "Dance #fyp",
                "duration": 15,
                "cover": "http://x/cover.jpg",
                "play": "http://x/play.mp4",
                "hdplay": "http://x/hd.mp4",
                "wmplay": "http://x/wm.mp4",
                "author": {"nickname": "Nick", "unique_id": "nick_1", "avatar": "http://x/a.jpg"},
                "music_info": {"title": "original sound"},
                "digg_count": 10,
                "share_count": 2,
                "comment_count": 3,
                "play_count": 400,
                "download_count": 5
            }),
        )
        .unwrap();

        assert_eq!(record.id, "7312");
        assert_eq!(record.title, "Dance");
        assert_eq!(record.description, "Dance #fyp");
        assert_eq!(record.author.nickname, "Nick");
        assert_eq!(record.author.unique_id, "nick_1");
        assert_eq!(record.duration, 15);
        assert_eq!(record.cover.as_deref(), Some("http://x/cover.jpg"));
        assert_eq!(record.music, json!({"title": "original sound"}));
        assert_eq!(
            record.statistics,
            Statistics {
                likes: 10,
                shares: 2,
                comments: 3,
                plays: 400,
                downloads: 5
            }
        );
        assert_eq!(
            record.available_qualities(),
            vec![QualityTag::Standard, QualityTag::Hd, QualityTag::Watermark]
        );
        assert_eq!(record.source_tag, SourceTag::Tikwm);
    }

    #[test]
    fn test_likes_fall_back_to_like_count() {
        let record = normalize(
            SourceTag::Tikwm,
            json!({"play": "http://x/v.mp4", "like_count": 42}),
        )
        .unwrap();
        assert_eq!(record.statistics.likes, 42);

        let record = normalize(SourceTag::Tikwm, json!({"play": "http://x/v.mp4"})).unwrap();
        assert_eq!(record.statistics.likes, 0);

        // zero is treated as absent
        let record = normalize(
            SourceTag::Tikwm,
            json!({"play": "http://x/v.mp4", "digg_count": 0, "like_count": 7}),
        )
        .unwrap();
        assert_eq!(record.statistics.likes, 7);
    }

    #[test]
    fn test_only_hd_variant() {
        let record = normalize(SourceTag::Tikwm, json!({"hdplay": "http://x/hd.mp4"})).unwrap();
        assert_eq!(
            record.qualities,
            vec![QualityVariant {
                quality: QualityTag::Hd,
                url: "http://x/hd.mp4".to_string()
            }]
        );
    }

    #[test]
    fn test_defaults_for_sparse_payload() {
        let before = Utc::now().timestamp_millis();
        let record = normalize(SourceTag::Tikwm, json!({"play": "http://x/v.mp4"})).unwrap();

        assert_eq!(record.title, DEFAULT_TITLE);
        assert_eq!(record.description, "");
        assert_eq!(record.author.nickname, DEFAULT_NICKNAME);
        assert_eq!(record.author.unique_id, DEFAULT_UNIQUE_ID);
        assert_eq!(record.author.avatar, "");
        assert_eq!(record.duration, 0);
        assert_eq!(record.cover, None);
        assert_eq!(record.music, json!({}));

        let id: i64 = record.id.parse().expect("timestamp id");
        assert!(id >= before);
    }

    #[test]
    fn test_description_falls_back_to_raw_title() {
        let record = normalize(
            SourceTag::Tikwm,
            json!({"play": "http://x/v.mp4", "title": "Only title", "desc": ""}),
        )
        .unwrap();
        assert_eq!(record.description, "Only title");
    }

    #[test]
    fn test_cover_and_numeric_id_fallbacks() {
        let record = normalize(
            SourceTag::Tikwm,
            json!({"play": "http://x/v.mp4", "id": 991, "thumbnail": "http://x/t.jpg", "duration": "30"}),
        )
        .unwrap();
        assert_eq!(record.id, "991");
        assert_eq!(record.cover.as_deref(), Some("http://x/t.jpg"));
        assert_eq!(record.duration, 30);
    }

    #[test]
    fn test_wrong_types_read_as_absent() {
        let record = normalize(
            SourceTag::Tikwm,
            json!({"play": "http://x/v.mp4", "author": "someone", "digg_count": "lots", "music": null}),
        )
        .unwrap();
        assert_eq!(record.author.unique_id, DEFAULT_UNIQUE_ID);
        assert_eq!(record.statistics.likes, 0);
        assert_eq!(record.music, json!({}));
    }

    #[test]
    fn test_no_playable_url() {
        let err = normalize(SourceTag::Tikwm, json!({"id": "1", "title": "T", "play": ""}))
            .unwrap_err();
        assert_eq!(err, SourceError::NoPlayableUrl);
    }

    #[test]
    fn test_non_object_payload() {
        assert!(matches!(
            normalize(SourceTag::Tikwm, json!(["http://x/v.mp4"])),
            Err(SourceError::Decode(_))
        ));
        assert!(matches!(
            normalize(SourceTag::Tiklydown, json!("http://x/v.mp4")),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn test_tiklydown_flat_fields() {
        let record = normalize(
            SourceTag::Tiklydown,
            json!({"id": "1", "title": "T", "play": "http://x/v.mp4"}),
        )
        .unwrap();
        assert_eq!(record.source_tag, SourceTag::Tiklydown);
        assert_eq!(record.qualities[0].url, "http://x/v.mp4");
    }

    #[test]
    fn test_tiklydown_nested_layout() {
        let record = normalize(
            SourceTag::Tiklydown,
            json!({
                "id": 555,
                "title": "Nested",
                "author": {"name": "Display Name", "unique_id": "handle", "avatar": "http://x/a.jpg"},
                "video": {
                    "noWatermark": "http://x/nowm.mp4",
                    "watermark": "http://x/wm.mp4",
                    "cover": "http://x/c.jpg",
                    "duration": 21
                },
                "stats": {"likeCount": 9, "commentCount": 4, "shareCount": 1, "playCount": 100},
                "music": {"title": "song"}
            }),
        )
        .unwrap();

        assert_eq!(record.id, "555");
        assert_eq!(record.author.nickname, "Display Name");
        assert_eq!(record.author.unique_id, "handle");
        assert_eq!(record.duration, 21);
        assert_eq!(record.cover.as_deref(), Some("http://x/c.jpg"));
        assert_eq!(
            record.qualities,
            vec![
                QualityVariant {
                    quality: QualityTag::Standard,
                    url: "http://x/nowm.mp4".to_string()
                },
                QualityVariant {
                    quality: QualityTag::Watermark,
                    url: "http://x/wm.mp4".to_string()
                },
            ]
        );
        assert_eq!(record.statistics.likes, 9);
        assert_eq!(record.statistics.comments, 4);
        assert_eq!(record.statistics.shares, 1);
        assert_eq!(record.statistics.plays, 100);
        assert_eq!(record.statistics.downloads, 0);
    }

    #[test]
    fn test_tiklydown_flat_fields_win() {
        let record = normalize(
            SourceTag::Tiklydown,
            json!({
                "play": "http://x/flat.mp4",
                "digg_count": 3,
                "video": {"noWatermark": "http://x/nested.mp4"},
                "stats": {"likeCount": 9}
            }),
        )
        .unwrap();
        assert_eq!(record.qualities[0].url, "http://x/flat.mp4");
        assert_eq!(record.statistics.likes, 3);
    }
}

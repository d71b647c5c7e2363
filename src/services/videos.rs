// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! YouTube Data API search client for travel videos about a location.

use crate::error::{Upstream, UpstreamError};
use serde::{Deserialize, Serialize};
use std::time::Duration;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/youtube/v3";
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const SERVICE: Upstream = Upstream::YouTube;

/// Number of videos requested per location.
pub const MAX_VIDEOS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct Video {
    pub video_id: String,
    pub title: String,
    pub channel_title: String,
    pub thumbnail_url: Option<String>,
}

#[derive(Clone)]
pub struct VideoSearchClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl VideoSearchClient {
    pub fn new(api_key: Option<String>) -> anyhow::Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Search for travel videos about `location`.
    pub async fn travel_videos(&self, location: &str) -> Result<Vec<Video>, UpstreamError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| UpstreamError::Misconfigured {
                service: SERVICE,
                reason: "missing API key".to_string(),
            })?;

        let query = format!("travel {} tourism", location);
        let max_results = MAX_VIDEOS.to_string();

        let response = self
            .http
            .get(format!("{}/search", self.base_url))
            .query(&[
                ("part", "snippet"),
                ("q", query.as_str()),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
                ("key", api_key),
            ])
            .send()
            .await
            .map_err(|e| transient(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error = response
                .json::<ErrorEnvelope>()
                .await
                .ok()
                .map(|e| e.error)
                .unwrap_or_default();
            return Err(classify_error(status.as_u16(), error));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| transient(format!("invalid response body: {}", e.without_url())))?;

        Ok(body
            .items
            .into_iter()
            .filter_map(SearchItem::into_video)
            .take(MAX_VIDEOS as usize)
            .collect())
    }
}

fn transient(detail: String) -> UpstreamError {
    UpstreamError::Transient {
        service: SERVICE,
        detail,
    }
}

fn classify_error(status: u16, error: ErrorBody) -> UpstreamError {
    let reasons: Vec<&str> = error.errors.iter().map(|e| e.reason.as_str()).collect();
    let message = error.message.unwrap_or_else(|| format!("HTTP {}", status));

    if reasons.iter().any(|r| matches!(*r, "quotaExceeded" | "rateLimitExceeded")) {
        tracing::warn!("YouTube quota exceeded");
        return UpstreamError::QuotaExceeded { service: SERVICE };
    }

    match status {
        400 if reasons.contains(&"keyInvalid") => UpstreamError::Misconfigured {
            service: SERVICE,
            reason: message,
        },
        401 | 403 => UpstreamError::Misconfigured {
            service: SERVICE,
            reason: message,
        },
        _ => transient(message),
    }
}

// ─── Wire Format ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: ItemId,
    snippet: Option<Snippet>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItemId {
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Snippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    channel_title: String,
    #[serde(default)]
    thumbnails: Thumbnails,
}

#[derive(Debug, Default, Deserialize)]
struct Thumbnails {
    medium: Option<Thumbnail>,
    default: Option<Thumbnail>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

impl SearchItem {
    fn into_video(self) -> Option<Video> {
        let video_id = self.id.video_id?;
        let snippet = self.snippet?;
        Some(Video {
            video_id,
            title: snippet.title,
            channel_title: snippet.channel_title,
            thumbnail_url: snippet
                .thumbnails
                .medium
                .or(snippet.thumbnails.default)
                .map(|t| t.url),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn error_body(value: serde_json::Value) -> ErrorBody {
        serde_json::from_value::<ErrorEnvelope>(value).unwrap().error
    }

    #[test]
    fn test_quota_exceeded_is_distinct() {
        let body = error_body(json!({
            "error": {
                "code": 403,
                "message": "The request cannot be completed because you have exceeded your quota.",
                "errors": [{ "reason": "quotaExceeded", "domain": "youtube.quota" }]
            }
        }));
        assert_eq!(
            classify_error(403, body),
            UpstreamError::QuotaExceeded { service: SERVICE }
        );

        let body = error_body(json!({
            "error": { "code": 403, "message": "forbidden", "errors": [{ "reason": "forbidden" }] }
        }));
        assert!(matches!(
            classify_error(403, body),
            UpstreamError::Misconfigured { .. }
        ));

        assert!(matches!(
            classify_error(500, ErrorBody::default()),
            UpstreamError::Transient { .. }
        ));
    }

    #[test]
    fn test_items_without_video_id_are_skipped() {
        let body: SearchResponse = serde_json::from_value(json!({
            "items": [
                { "id": { "kind": "youtube#channel", "channelId": "abc" },
                  "snippet": { "title": "A channel" } },
                { "id": { "kind": "youtube#video", "videoId": "dQw4w9WgXcQ" },
                  "snippet": { "title": "Paris in 4K", "channelTitle": "Walks",
                               "thumbnails": { "default": { "url": "https://i.ytimg.com/d.jpg" } } } }
            ]
        }))
        .unwrap();

        let videos: Vec<Video> = body.items.into_iter().filter_map(SearchItem::into_video).collect();
        assert_eq!(videos.len(), 1);
        assert_eq!(videos[0].video_id, "dQw4w9WgXcQ");
        assert_eq!(videos[0].channel_title, "Walks");
        assert_eq!(videos[0].thumbnail_url.as_deref(), Some("https://i.ytimg.com/d.jpg"));
    }
}

//! YouTube Data API v3 comment source.
//!
//! Endpoints used:
//! - GET /commentThreads  (top-level threads for a video, optionally with
//!   their readily-available replies via `part=snippet,replies`)
//! - GET /comments         (all replies of one comment, max 100)
//! - GET /videos           (video snippet for the URL-extract operation)
//!
//! Payloads are decoded into typed structs and mapped onto the domain types
//! of `umpire-core`; transport failures are normalized into
//! [`SourceError`].

pub mod video_url;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use umpire_core::errors::SourceError;
use umpire_core::model::{Comment, CommentThread, ThreadPage, VideoInfo};
use umpire_core::source::{CommentSource, MAX_REPLIES_PER_COMMENT};

pub use video_url::extract_video_id;

/// Public Data API base; overridable for tests and proxies.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/youtube/v3";

/// Thin client for the YouTube Data API v3.
///
/// Holds a shared `reqwest` instance and the API key; constructed once by
/// the application and passed to whoever needs a comment source.
#[derive(Debug, Clone)]
pub struct YouTubeClient {
    http: Client,
    base_api: String,
    api_key: String,
}

impl YouTubeClient {
    /// Constructs a client with a shared reqwest instance and API key.
    pub fn new(http: Client, base_api: String, api_key: String) -> Self {
        Self {
            http,
            base_api,
            api_key,
        }
    }

    /// Fetches the video snippet for `video_id`.
    pub async fn video_info(&self, video_id: &str) -> Result<VideoInfo, SourceError> {
        let url = format!("{}/videos", self.base_api);
        let resp: VideoListResponse = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet"),
                ("id", video_id),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(map_http)?
            .error_for_status()
            .map_err(map_http)?
            .json()
            .await
            .map_err(map_http)?;

        let item = resp.items.into_iter().next().ok_or(SourceError::NotFound)?;
        Ok(VideoInfo {
            video_id: video_id.to_owned(),
            title: item.snippet.title,
            channel_name: item.snippet.channel_title,
            thumbnail_url: item.snippet.thumbnails.best_url().unwrap_or_default(),
            published_at: item.snippet.published_at,
        })
    }

    /// Fetches one page of comment threads, in source order.
    pub async fn thread_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_replies: bool,
    ) -> Result<ThreadPage, SourceError> {
        let url = format!("{}/commentThreads", self.base_api);
        let part = if include_replies {
            "snippet,replies"
        } else {
            "snippet"
        };
        let max_results = page_size.clamp(1, 100).to_string();

        let mut query = vec![
            ("part", part.to_owned()),
            ("videoId", video_id.to_owned()),
            ("maxResults", max_results),
            ("order", "time".to_owned()),
            ("key", self.api_key.clone()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_owned()));
        }

        debug!(video_id, page_size, include_replies, "GET {url}");
        let resp: CommentThreadListResponse = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(map_http)?
            .error_for_status()
            .map_err(map_http)?
            .json()
            .await
            .map_err(map_http)?;

        let threads = resp.items.into_iter().map(map_thread).collect();
        Ok(ThreadPage {
            threads,
            next_page_token: resp.next_page_token,
        })
    }

    /// Fetches the replies of one comment, capped at 100 by the API.
    pub async fn replies(&self, comment_id: &str) -> Result<Vec<Comment>, SourceError> {
        let url = format!("{}/comments", self.base_api);
        let max_results = MAX_REPLIES_PER_COMMENT.to_string();
        debug!(comment_id, "GET {url}");
        let resp: CommentListResponse = self
            .http
            .get(url)
            .query(&[
                ("part", "snippet"),
                ("parentId", comment_id),
                ("maxResults", max_results.as_str()),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(map_http)?
            .error_for_status()
            .map_err(map_http)?
            .json()
            .await
            .map_err(map_http)?;

        Ok(resp
            .items
            .into_iter()
            .map(|item| map_comment(item, Some(comment_id.to_owned()), 0))
            .collect())
    }
}

impl CommentSource for YouTubeClient {
    async fn fetch_thread_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_replies: bool,
    ) -> Result<ThreadPage, SourceError> {
        self.thread_page(video_id, page_token, page_size, include_replies)
            .await
    }

    async fn fetch_replies(&self, comment_id: &str) -> Result<Vec<Comment>, SourceError> {
        self.replies(comment_id).await
    }
}

/// Normalizes reqwest failures into the collaborator error taxonomy.
fn map_http(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        return SourceError::Timeout;
    }
    if e.is_decode() {
        return SourceError::Decode(e.to_string());
    }
    if let Some(status) = e.status() {
        let code = status.as_u16();
        return match code {
            401 => SourceError::Unauthorized,
            403 => SourceError::Forbidden,
            404 => SourceError::NotFound,
            429 => SourceError::RateLimited {
                retry_after_secs: None,
            },
            500..=599 => SourceError::Server(code),
            _ => SourceError::HttpStatus(code),
        };
    }
    SourceError::Network(e.to_string())
}

/* ===========================================================================
API payloads & mapping
======================================================================== */

fn map_thread(item: CommentThreadResource) -> CommentThread {
    let reply_count = item.snippet.total_reply_count.unwrap_or(0);
    let top_level = map_top_level(item.snippet.top_level_comment, reply_count);
    let parent_id = top_level.id.clone();
    let replies = item
        .replies
        .map(|list| {
            list.comments
                .into_iter()
                .map(|reply| map_comment(reply, Some(parent_id.clone()), 0))
                .collect()
        })
        .unwrap_or_default();
    CommentThread { top_level, replies }
}

fn map_top_level(item: CommentResource, reply_count: u64) -> Comment {
    map_comment(item, None, reply_count)
}

fn map_comment(item: CommentResource, parent_id: Option<String>, reply_count: u64) -> Comment {
    let snippet = item.snippet;
    let text_original = snippet
        .text_original
        .unwrap_or_else(|| snippet.text_display.clone());
    Comment {
        id: item.id,
        text: snippet.text_display,
        text_original,
        author: snippet.author_display_name,
        published_at: snippet.published_at,
        like_count: snippet.like_count.unwrap_or(0),
        reply_count,
        // The API carries parentId only on replies; the thread mapping
        // supplies it when the snippet omits it.
        parent_id: snippet.parent_id.or(parent_id),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadListResponse {
    #[serde(default)]
    items: Vec<CommentThreadResource>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentThreadResource {
    snippet: CommentThreadSnippet,
    replies: Option<ReplyList>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentThreadSnippet {
    top_level_comment: CommentResource,
    total_reply_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ReplyList {
    #[serde(default)]
    comments: Vec<CommentResource>,
}

#[derive(Debug, Deserialize)]
struct CommentListResponse {
    #[serde(default)]
    items: Vec<CommentResource>,
}

#[derive(Debug, Deserialize)]
struct CommentResource {
    id: String,
    snippet: CommentSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CommentSnippet {
    text_display: String,
    text_original: Option<String>,
    author_display_name: String,
    published_at: DateTime<Utc>,
    like_count: Option<u64>,
    parent_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideoListResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
struct VideoResource {
    snippet: VideoSnippet,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    title: String,
    channel_title: String,
    published_at: DateTime<Utc>,
    #[serde(default)]
    thumbnails: ThumbnailSet,
}

#[derive(Debug, Default, Deserialize)]
struct ThumbnailSet {
    medium: Option<Thumbnail>,
    high: Option<Thumbnail>,
    #[serde(rename = "default")]
    fallback: Option<Thumbnail>,
}

impl ThumbnailSet {
    fn best_url(self) -> Option<String> {
        self.medium
            .or(self.high)
            .or(self.fallback)
            .map(|t| t.url)
    }
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREAD_PAGE: &str = r#"{
        "items": [
            {
                "id": "thread-1",
                "snippet": {
                    "totalReplyCount": 2,
                    "topLevelComment": {
                        "id": "c1",
                        "snippet": {
                            "textDisplay": "面白かった！<br>また見ます",
                            "textOriginal": "面白かった！\nまた見ます",
                            "authorDisplayName": "viewer-a",
                            "publishedAt": "2024-05-01T12:00:00Z",
                            "likeCount": 3
                        }
                    }
                },
                "replies": {
                    "comments": [
                        {
                            "id": "c1-r1",
                            "snippet": {
                                "textDisplay": "同感です",
                                "textOriginal": "同感です",
                                "authorDisplayName": "viewer-b",
                                "publishedAt": "2024-05-01T13:00:00Z",
                                "likeCount": 1,
                                "parentId": "c1"
                            }
                        }
                    ]
                }
            }
        ],
        "nextPageToken": "CAISBQ"
    }"#;

    #[test]
    fn thread_payload_maps_to_domain() {
        let resp: CommentThreadListResponse = serde_json::from_str(THREAD_PAGE).unwrap();
        assert_eq!(resp.next_page_token.as_deref(), Some("CAISBQ"));

        let thread = map_thread(resp.items.into_iter().next().unwrap());
        assert_eq!(thread.top_level.id, "c1");
        assert_eq!(thread.top_level.reply_count, 2);
        assert_eq!(thread.top_level.parent_id, None);
        assert_eq!(thread.top_level.text_original, "面白かった！\nまた見ます");

        assert_eq!(thread.replies.len(), 1);
        assert_eq!(thread.replies[0].parent_id.as_deref(), Some("c1"));
        assert_eq!(thread.replies[0].reply_count, 0);
    }

    #[test]
    fn missing_optional_fields_default() {
        let raw = r#"{
            "id": "c9",
            "snippet": {
                "textDisplay": "すごい",
                "authorDisplayName": "viewer-c",
                "publishedAt": "2024-05-02T09:30:00Z"
            }
        }"#;
        let item: CommentResource = serde_json::from_str(raw).unwrap();
        let comment = map_comment(item, None, 0);
        assert_eq!(comment.like_count, 0);
        // textOriginal falls back to the display form.
        assert_eq!(comment.text_original, "すごい");
    }

    #[test]
    fn thumbnail_fallback_order() {
        let set = ThumbnailSet {
            medium: None,
            high: Some(Thumbnail { url: "high".into() }),
            fallback: Some(Thumbnail { url: "def".into() }),
        };
        assert_eq!(set.best_url().as_deref(), Some("high"));
    }
}

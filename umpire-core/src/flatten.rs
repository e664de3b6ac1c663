//! Thread flattening: pages of threaded comments into one flat, ordered,
//! capped sequence.
//!
//! Two policies are supported. *Inline-replies* walks reply-inclusive pages
//! of up to 50 threads and interleaves each top-level comment with its
//! replies. *Top-level-only* walks plain pages of up to the cap, leaving
//! replies to on-demand lookups.
//!
//! A transport failure on any page fetch aborts the whole operation; callers
//! tell a legitimate cap hit apart from end-of-stream by inspecting the
//! returned continuation token.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::{Error, UmpResult};
use crate::model::Comment;
use crate::source::CommentSource;

/// Page size used by the inline-replies policy (reply-inclusive pages).
pub const REPLY_INCLUSIVE_PAGE_SIZE: u32 = 50;
/// Largest top-level page the source accepts.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Flattening policy. Pages fetched with different policies must not be
/// mixed within one pass for the same video.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlattenPolicy {
    /// Reply-inclusive pages; each top-level comment is immediately followed
    /// by its currently-available replies.
    InlineReplies,
    /// Top-level comments only; replies are fetched on demand per comment.
    TopLevelOnly,
}

/// Result of one flatten pass.
#[derive(Debug, Clone, Serialize)]
pub struct FlattenedThread {
    /// Flat ordered sequence, never longer than the requested cap.
    pub comments: Vec<Comment>,
    /// Continuation token for the next pass; `None` means the source is
    /// exhausted.
    pub next_page_token: Option<String>,
}

/// Materializes up to `cap` comments for `video_id` starting at `page_token`.
///
/// Ordering: top-level comments keep source order; inlined replies keep
/// source order beneath their parent. The sequence is truncated to exactly
/// `cap` the moment the cap is reached; mid-reply-group truncation is
/// allowed.
///
/// # Errors
/// - [`Error::Validation`] if `cap` is zero.
/// - [`Error::Source`] if any page fetch fails; no partial sequence is
///   returned in that case.
pub async fn flatten_thread<S: CommentSource>(
    source: &S,
    video_id: &str,
    cap: usize,
    policy: FlattenPolicy,
    page_token: Option<&str>,
) -> UmpResult<FlattenedThread> {
    if cap == 0 {
        return Err(Error::Validation("comment cap must be positive".into()));
    }
    match policy {
        FlattenPolicy::InlineReplies => flatten_inline(source, video_id, cap, page_token).await,
        FlattenPolicy::TopLevelOnly => flatten_top_level(source, video_id, cap, page_token).await,
    }
}

async fn flatten_inline<S: CommentSource>(
    source: &S,
    video_id: &str,
    cap: usize,
    page_token: Option<&str>,
) -> UmpResult<FlattenedThread> {
    let mut comments: Vec<Comment> = Vec::new();
    let mut token = page_token.map(str::to_owned);

    loop {
        let page = source
            .fetch_thread_page(video_id, token.as_deref(), REPLY_INCLUSIVE_PAGE_SIZE, true)
            .await?;
        let next = page.next_page_token;
        debug!(
            video_id,
            threads = page.threads.len(),
            collected = comments.len(),
            has_next = next.is_some(),
            "flattened reply-inclusive page"
        );

        for thread in page.threads {
            comments.push(thread.top_level);
            if comments.len() == cap {
                return Ok(FlattenedThread {
                    comments,
                    next_page_token: next,
                });
            }
            for reply in thread.replies {
                comments.push(reply);
                if comments.len() == cap {
                    return Ok(FlattenedThread {
                        comments,
                        next_page_token: next,
                    });
                }
            }
        }

        match next {
            Some(t) => token = Some(t),
            None => {
                return Ok(FlattenedThread {
                    comments,
                    next_page_token: None,
                });
            }
        }
    }
}

async fn flatten_top_level<S: CommentSource>(
    source: &S,
    video_id: &str,
    cap: usize,
    page_token: Option<&str>,
) -> UmpResult<FlattenedThread> {
    let mut comments: Vec<Comment> = Vec::new();
    let mut token = page_token.map(str::to_owned);

    loop {
        let remaining = cap - comments.len();
        let page_size = remaining.min(MAX_PAGE_SIZE as usize) as u32;
        let page = source
            .fetch_thread_page(video_id, token.as_deref(), page_size, false)
            .await?;
        let next = page.next_page_token;
        debug!(
            video_id,
            threads = page.threads.len(),
            collected = comments.len(),
            has_next = next.is_some(),
            "flattened top-level page"
        );

        for thread in page.threads {
            comments.push(thread.top_level);
            if comments.len() == cap {
                return Ok(FlattenedThread {
                    comments,
                    next_page_token: next,
                });
            }
        }

        match next {
            Some(t) => token = Some(t),
            None => {
                return Ok(FlattenedThread {
                    comments,
                    next_page_token: None,
                });
            }
        }
    }
}

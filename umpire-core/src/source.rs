//! Comment-source collaborator interface.
//!
//! The transport itself (YouTube Data API, a fixture, a mock) lives outside
//! the core; flattening is a pure function of the pages a source yields.

use std::future::Future;

use crate::errors::SourceError;
use crate::model::{Comment, ThreadPage};

/// Maximum replies a single on-demand reply lookup may return.
pub const MAX_REPLIES_PER_COMMENT: u32 = 100;

/// A paginated source of comment threads for one video.
///
/// Continuation tokens are opaque and must be threaded through unmodified
/// between successive page fetches.
pub trait CommentSource {
    /// Fetches one page of top-level comment threads.
    ///
    /// With `include_replies`, each thread carries the replies the source has
    /// readily available; otherwise `replies` is empty and only
    /// `reply_count` hints at their existence.
    fn fetch_thread_page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
        page_size: u32,
        include_replies: bool,
    ) -> impl Future<Output = Result<ThreadPage, SourceError>> + Send;

    /// Fetches the replies of a single top-level comment, capped at
    /// [`MAX_REPLIES_PER_COMMENT`]; no further pagination.
    fn fetch_replies(
        &self,
        comment_id: &str,
    ) -> impl Future<Output = Result<Vec<Comment>, SourceError>> + Send;
}

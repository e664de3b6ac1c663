//! Domain types shared across the workspace.
//!
//! Comments are immutable once fetched; analysis never mutates them.
//! An `AnalysisResult` is created once per analysis request and may later be
//! replaced wholesale by the protest path, never field-by-field.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single YouTube comment, top-level or reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Opaque id, unique within a video.
    pub id: String,
    /// Rendered/display form (may contain HTML).
    pub text: String,
    /// Unrendered form used for analysis, HTML-free.
    pub text_original: String,
    pub author: String,
    pub published_at: DateTime<Utc>,
    pub like_count: u64,
    /// Only meaningful on top-level comments; replies carry 0.
    pub reply_count: u64,
    /// Present iff the comment is a reply. References a top-level comment
    /// materialized earlier in the flattened sequence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Comment {
    /// True for replies, false for top-level comments.
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Video metadata returned by the URL-extract operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub video_id: String,
    pub title: String,
    pub channel_name: String,
    pub thumbnail_url: String,
    pub published_at: DateTime<Utc>,
}

/// One top-level comment together with the replies the source attached to it.
#[derive(Debug, Clone)]
pub struct CommentThread {
    pub top_level: Comment,
    pub replies: Vec<Comment>,
}

/// A batch of comment threads plus an opaque continuation token.
///
/// Token absence means end-of-stream; flattening never synthesizes comments
/// beyond what a page provides.
#[derive(Debug, Clone)]
pub struct ThreadPage {
    pub threads: Vec<CommentThread>,
    pub next_page_token: Option<String>,
}

/// The binary safe/out outcome attached to an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Safe,
    Out,
}

impl Verdict {
    pub fn as_str(self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::Out => "out",
        }
    }
}

/// Assessment of how well-founded the comment's claim is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Validity {
    High,
    Medium,
    Low,
    Undetermined,
}

impl Validity {
    /// Japanese label as rendered in prompts and by the original UI.
    pub fn label_jp(self) -> &'static str {
        match self {
            Validity::High => "高い",
            Validity::Medium => "中程度",
            Validity::Low => "低い",
            Validity::Undetermined => "判定不能",
        }
    }
}

/// Normalized analysis verdict for one comment.
///
/// `graham_level`/`graham_type` are co-present and only appear when
/// `is_counter` is true.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Non-empty set of labels from the closed 19-term taxonomy.
    pub categories: BTreeSet<String>,
    pub is_counter: bool,
    /// Counter-argument quality on the 7-level hierarchy, 1..=7.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graham_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub graham_type: Option<String>,
    /// Possibly empty set of labels from the closed 5-term fallacy set.
    pub logical_fallacies: BTreeSet<String>,
    pub validity_assessment: Validity,
    pub verdict: Verdict,
    pub explanation: String,
    pub validity_reason: String,
}

impl AnalysisResult {
    /// Derives the replacement result a sustained protest produces: only the
    /// verdict and explanation change, everything else is carried over.
    pub fn with_revised_verdict(&self, verdict: Verdict, explanation: String) -> Self {
        Self {
            verdict,
            explanation,
            ..self.clone()
        }
    }
}

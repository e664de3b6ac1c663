//! Conversation context for contextual analysis.
//!
//! Context models "conversation so far": a reply is analyzed together with
//! its parent and the sibling replies surfaced before it. A top-level
//! comment is analyzed on its own; other top-level threads are unrelated
//! and never included.

use crate::model::Comment;

/// Builds the ordered context list for `target` within one flattened
/// sequence: `[parent, sibling_1, …, sibling_k]` where `k` is the target's
/// zero-based position among already-surfaced siblings.
///
/// Returns an empty list for top-level comments.
pub fn context_for<'a>(target: &Comment, flattened: &'a [Comment]) -> Vec<&'a Comment> {
    let Some(parent_id) = target.parent_id.as_deref() else {
        return Vec::new();
    };

    let mut context = Vec::new();
    if let Some(parent) = flattened.iter().find(|c| c.id == parent_id) {
        context.push(parent);
    }
    for comment in flattened {
        if comment.id == target.id {
            break;
        }
        if comment.parent_id.as_deref() == Some(parent_id) {
            context.push(comment);
        }
    }
    context
}

//! Single-comment analysis: compose → complete → normalize.

pub mod parse;
pub mod prompt;

use tracing::{debug, info};

use crate::completion::TextCompletion;
use crate::errors::UmpResult;
use crate::model::{AnalysisResult, Comment};
use crate::templates::TemplateStore;

pub use parse::parse_analysis_response;
pub use prompt::{CompletionRequest, SYSTEM_INSTRUCTION, compose_analysis_request};

/// Runs one analysis request for `comment_text` with its conversation
/// context (empty for top-level comments).
///
/// # Errors
/// - `PromptUnavailable` if the core template is missing (fails closed).
/// - `SourceUnavailable` if the completion call fails.
/// - `InvalidResponseFormat` if the completion output cannot be normalized.
pub async fn analyze_comment<C, T>(
    completion: &C,
    templates: &T,
    comment_text: &str,
    context: &[&Comment],
) -> UmpResult<AnalysisResult>
where
    C: TextCompletion,
    T: TemplateStore,
{
    let request = compose_analysis_request(templates, comment_text, context)?;
    debug!(
        prompt_len = request.user_prompt.len(),
        context_len = context.len(),
        "requesting comment analysis"
    );

    let raw = completion
        .complete(&request.system_instruction, &request.user_prompt)
        .await?;
    let result = parse_analysis_response(&raw)?;

    info!(
        categories = result.categories.len(),
        is_counter = result.is_counter,
        verdict = result.verdict.as_str(),
        "comment analysis completed"
    );
    Ok(result)
}

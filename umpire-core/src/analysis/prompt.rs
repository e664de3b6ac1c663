//! Prompt composition for single-comment analysis.
//!
//! The user-editable core template carries three named placeholders:
//! `{context_section}`, `{comment_text}` and `{additional_section}`. The
//! output contract itself lives in a fixed system instruction so that edits
//! to the core template cannot change the response schema.

use lazy_static::lazy_static;

use crate::errors::UmpResult;
use crate::model::Comment;
use crate::taxonomy::{CATEGORIES, GRAHAM_TYPES, LOGICAL_FALLACIES};
use crate::templates::TemplateStore;

/// One composed completion request, ready for the completion backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_instruction: String,
    pub user_prompt: String,
}

lazy_static! {
    /// Fixed system instruction describing the JSON output contract.
    ///
    /// This is a stable internal constant, distinct from the user-editable
    /// core template.
    pub static ref SYSTEM_INSTRUCTION: String = build_system_instruction();
}

fn build_system_instruction() -> String {
    format!(
        "あなたはYouTubeコメントを審判する専門家です。与えられたコメントを分析し、\
         指定された形式の有効なJSONのみを返してください。マークダウンやJSON以外の文章は\
         一切含めないでください。\n\
         \n\
         \"categories\" には次の19種のカテゴリーから該当するものを全て配列で入れてください（複数可）：\n\
         {categories}\n\
         \n\
         コメントが反論である場合は \"graham_hierarchy\" に \
         {{\"level\": 1〜7の整数, \"type\": \"階層名\"}} を設定してください。\
         階層名はレベル順に {graham} です。反論でない場合は \
         {{\"level\": null, \"type\": null}} としてください。\n\
         \n\
         \"logicalFallacy\" には {fallacies} のいずれか1つを、\
         該当する誤謬がない場合は null を設定してください。\n\
         \n\
         \"validity_assessment\" は \"高い\"・\"中程度\"・\"低い\" のいずれか、\
         \"safe_or_out\" は \"safe\" または \"out\" としてください。\n\
         \"explanation\" と \"validity_reason\" には、コメントのどの部分がなぜその判定に\
         なったのかを一般の人にも分かりやすい日本語で書いてください。技術的な用語\
         （JSON、true/false等）は使わないでください。",
        categories = CATEGORIES.join("、"),
        graham = GRAHAM_TYPES.join("、"),
        fallacies = LOGICAL_FALLACIES.join("、"),
    )
}

/// Renders the context list into the context block of the prompt.
///
/// Empty context renders as the empty string. Entries are labeled
/// positionally: the parent first, then each prior reply in flattened order.
pub fn render_context_block(context: &[&Comment]) -> String {
    if context.is_empty() {
        return String::new();
    }

    let mut block = String::from("【文脈情報】\n");
    for (i, comment) in context.iter().enumerate() {
        if i == 0 {
            block.push_str(&format!(
                "親コメント: \"{}\" (投稿者: {})\n",
                comment.text_original, comment.author
            ));
        } else {
            block.push_str(&format!(
                "前の返信{}: \"{}\" (投稿者: {})\n",
                i, comment.text_original, comment.author
            ));
        }
    }
    block.push_str("\n上記の文脈を考慮して、以下のコメントを分析してください。\n");
    block
}

/// Composes the completion request for one analysis.
///
/// Fails closed with `PromptUnavailable` when the core template is missing;
/// an uncontrolled fallback prompt would make results incomparable across
/// sessions.
pub fn compose_analysis_request<T: TemplateStore>(
    templates: &T,
    comment_text: &str,
    context: &[&Comment],
) -> UmpResult<CompletionRequest> {
    let core = templates.core_template()?;
    let additional = templates.additional_instructions()?;

    let additional_block = if additional.trim().is_empty() {
        String::new()
    } else {
        format!("【追加指示】\n{}", additional.trim())
    };
    let context_block = render_context_block(context);

    let user_prompt = core
        .replace("{context_section}", &context_block)
        .replace("{comment_text}", comment_text)
        .replace("{additional_section}", &additional_block);

    Ok(CompletionRequest {
        system_instruction: SYSTEM_INSTRUCTION.clone(),
        user_prompt,
    })
}

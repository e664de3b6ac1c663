//! Protest negotiation: a short multi-turn conversation with a role-played
//! arbiter that may revise a verdict.
//!
//! Sessions move OPEN → OPEN on a rejected protest and OPEN → RESOLVED on a
//! sustained one. A resolved session accepts no further turns; a fresh
//! protest starts a new session. Turns are append-only and a failed arbiter
//! call advances nothing, so a protest can be retried without losing the
//! conversation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::analysis::parse::decode_json_span;
use crate::completion::TextCompletion;
use crate::errors::{Error, ResponseFormatError, UmpResult};
use crate::model::{AnalysisResult, Verdict};

/// Fixed role instructions for the arbiter persona.
///
/// The bar for reversal is deliberately stringent: an explicit factual
/// error, overlooked context, or a plainly wrong categorization. Difference
/// of opinion or emotional pushback is never sufficient.
pub const ARBITER_SYSTEM_INSTRUCTION: &str = "あなたはYouTubeコメントの判定を下した審判です。\
視聴者からその判定への抗議を受けています。審判として一貫性を保ち、安易に判定を覆してはいけません。\n\
判定を変更してよいのは次の場合のみです：\n\
- 元の判定に明確な事実誤認がある\n\
- 判定時に見落とされた文脈が指摘された\n\
- カテゴリー分類が明らかに誤っている\n\
意見の相違や感情的な反発だけでは判定を変更しないでください。\n\
\n\
必ず次の形式の有効なJSONのみを返してください：\n\
{\"umpire_response\": \"抗議への返答（日本語）\", \"judgment_changed\": true/false, \
\"newSafeOrOut\": \"safe または out（変更時のみ）\", \"new_explanation\": \"新しい判定理由（変更時のみ）\"}";

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Arbiter,
}

/// One turn of the protest conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
}

/// Protest session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Open,
    Resolved,
}

/// One protest negotiation over a single analysis result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtestSession {
    /// The analyzed comment, verbatim.
    pub comment_text: String,
    /// The result being contested, kept for reference.
    pub original_result: AnalysisResult,
    /// The live result; replaced wholesale on a sustained protest.
    pub current_result: AnalysisResult,
    /// Append-only conversation; a session never rewinds turns.
    pub conversation: Vec<ConversationTurn>,
    pub state: SessionState,
}

impl ProtestSession {
    /// Opens a fresh session contesting `result`.
    pub fn new(comment_text: impl Into<String>, result: AnalysisResult) -> Self {
        Self {
            comment_text: comment_text.into(),
            original_result: result.clone(),
            current_result: result,
            conversation: Vec::new(),
            state: SessionState::Open,
        }
    }
}

/// The arbiter's parsed decision for one protest turn.
#[derive(Debug, Clone)]
pub struct ArbiterDecision {
    pub reply: String,
    pub judgment_changed: bool,
    pub new_verdict: Option<Verdict>,
    pub new_explanation: Option<String>,
}

/// Runs one protest turn against `session`, returning the advanced session.
///
/// The input session is never mutated; on any failure it remains valid for a
/// retry with the same conversation history.
///
/// # Errors
/// - [`Error::Validation`] when the session is already resolved.
/// - [`Error::Source`] when the completion call fails.
/// - [`Error::InvalidResponse`] when the arbiter output cannot be parsed.
pub async fn protest_turn<C: TextCompletion>(
    completion: &C,
    session: &ProtestSession,
    message: &str,
) -> UmpResult<ProtestSession> {
    if session.state == SessionState::Resolved {
        return Err(Error::Validation(
            "protest session is already resolved".into(),
        ));
    }

    let prompt = build_arbiter_prompt(session, message);
    debug!(
        turns = session.conversation.len(),
        prompt_len = prompt.len(),
        "requesting arbiter decision"
    );

    let raw = completion
        .complete(ARBITER_SYSTEM_INSTRUCTION, &prompt)
        .await?;
    let decision = parse_arbiter_response(&raw)?;

    let mut next = session.clone();
    next.conversation.push(ConversationTurn {
        role: TurnRole::User,
        content: message.to_owned(),
    });
    next.conversation.push(ConversationTurn {
        role: TurnRole::Arbiter,
        content: decision.reply,
    });

    if decision.judgment_changed {
        // Only the verdict and explanation change; categories, fallacies and
        // the rest of the result carry over unchanged.
        let verdict = decision
            .new_verdict
            .ok_or(ResponseFormatError::MissingField("newSafeOrOut"))?;
        let explanation = decision
            .new_explanation
            .ok_or(ResponseFormatError::MissingField("new_explanation"))?;
        next.current_result = session
            .current_result
            .with_revised_verdict(verdict, explanation);
        next.state = SessionState::Resolved;
        info!(
            verdict = verdict.as_str(),
            "arbiter sustained the protest and revised the verdict"
        );
    } else {
        info!("arbiter rejected the protest");
    }

    Ok(next)
}

/// Renders the arbiter prompt: the original comment, the current verdict,
/// the conversation so far, and the new protest message.
pub fn build_arbiter_prompt(session: &ProtestSession, message: &str) -> String {
    let result = &session.current_result;
    let categories: Vec<&str> = result.categories.iter().map(String::as_str).collect();

    let mut prompt = String::new();
    prompt.push_str("【分析対象コメント】\n");
    prompt.push_str(&format!("\"{}\"\n\n", session.comment_text));

    prompt.push_str("【現在の判定】\n");
    prompt.push_str(&format!("カテゴリー: {}\n", categories.join("、")));
    prompt.push_str(&format!("判定: {}\n", result.verdict.as_str()));
    prompt.push_str(&format!(
        "主張の妥当性: {}\n",
        result.validity_assessment.label_jp()
    ));
    prompt.push_str(&format!("判定理由: {}\n\n", result.explanation));

    if !session.conversation.is_empty() {
        prompt.push_str("【これまでのやり取り】\n");
        for turn in &session.conversation {
            let speaker = match turn.role {
                TurnRole::User => "ユーザー",
                TurnRole::Arbiter => "審判",
            };
            prompt.push_str(&format!("{}: {}\n", speaker, turn.content));
        }
        prompt.push('\n');
    }

    prompt.push_str("【新しい抗議】\n");
    prompt.push_str(&format!("ユーザー: {}\n", message));
    prompt
}

/// Parses the arbiter's JSON decision out of raw completion text.
pub fn parse_arbiter_response(raw: &str) -> UmpResult<ArbiterDecision> {
    let value = decode_json_span(raw).map_err(Error::InvalidResponse)?;
    let obj = value
        .as_object()
        .ok_or(Error::InvalidResponse(ResponseFormatError::NoJsonObject))?;

    let reply = ["umpire_response", "reply", "response"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_owned)
        .ok_or(ResponseFormatError::MissingField("umpire_response"))?;

    let judgment_changed = ["judgment_changed", "judgmentChanged"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_bool))
        .ok_or(ResponseFormatError::MissingField("judgment_changed"))?;

    let new_verdict = ["newSafeOrOut", "new_safe_or_out", "new_verdict"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(|v| match v.trim() {
            v if v.eq_ignore_ascii_case("safe") => Ok(Verdict::Safe),
            v if v.eq_ignore_ascii_case("out") => Ok(Verdict::Out),
            _ => Err(ResponseFormatError::InvalidField("newSafeOrOut")),
        })
        .transpose()?;

    let new_explanation = ["new_explanation", "newExplanation"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_owned);

    Ok(ArbiterDecision {
        reply,
        judgment_changed,
        new_verdict,
        new_explanation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SourceError;
    use std::collections::BTreeSet;
    use std::collections::VecDeque;
    use std::future::Future;
    use std::sync::Mutex;

    use crate::model::Validity;

    struct ScriptedCompletion {
        replies: Mutex<VecDeque<&'static str>>,
    }

    impl ScriptedCompletion {
        fn new(replies: &[&'static str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().copied().collect()),
            }
        }
    }

    impl TextCompletion for ScriptedCompletion {
        fn complete(
            &self,
            _system_instruction: &str,
            _user_prompt: &str,
        ) -> impl Future<Output = Result<String, SourceError>> + Send {
            let next = self.replies.lock().unwrap().pop_front();
            async move {
                next.map(str::to_owned)
                    .ok_or_else(|| SourceError::Network("script exhausted".into()))
            }
        }
    }

    fn out_result() -> AnalysisResult {
        AnalysisResult {
            categories: BTreeSet::from(["誹謗中傷".to_owned(), "侮辱".to_owned()]),
            is_counter: false,
            graham_level: None,
            graham_type: None,
            logical_fallacies: BTreeSet::from(["対人論証".to_owned()]),
            validity_assessment: Validity::Low,
            verdict: Verdict::Out,
            explanation: "人格攻撃を含むため".into(),
            validity_reason: "根拠が示されていない".into(),
        }
    }

    #[tokio::test]
    async fn rejected_protest_keeps_session_open() {
        let completion = ScriptedCompletion::new(&[
            r#"{"umpire_response": "判定は妥当です。", "judgment_changed": false}"#,
        ]);
        let session = ProtestSession::new("ひどいコメント", out_result());

        let next = protest_turn(&completion, &session, "文脈を見てください").await.unwrap();

        assert_eq!(next.state, SessionState::Open);
        assert_eq!(next.current_result, session.current_result);
        assert_eq!(next.conversation.len(), 2);
        assert_eq!(next.conversation[0].role, TurnRole::User);
        assert_eq!(next.conversation[0].content, "文脈を見てください");
        assert_eq!(next.conversation[1].role, TurnRole::Arbiter);
    }

    #[tokio::test]
    async fn sustained_protest_revises_verdict_and_resolves() {
        let completion = ScriptedCompletion::new(&[
            r#"{"umpire_response": "判定は妥当です。", "judgment_changed": false}"#,
            r#"{"umpire_response": "ご指摘の文脈を見落としていました。",
                "judgment_changed": true,
                "newSafeOrOut": "safe",
                "new_explanation": "文脈上は冗談であり攻撃性はありません。"}"#,
        ]);
        let session = ProtestSession::new("ひどいコメント", out_result());

        let after_first = protest_turn(&completion, &session, "抗議します").await.unwrap();
        assert_eq!(after_first.state, SessionState::Open);

        let after_second =
            protest_turn(&completion, &after_first, "これは身内の冗談です").await.unwrap();

        assert_eq!(after_second.state, SessionState::Resolved);
        assert_eq!(after_second.current_result.verdict, Verdict::Safe);
        assert_eq!(
            after_second.current_result.explanation,
            "文脈上は冗談であり攻撃性はありません。"
        );
        // Everything but verdict and explanation carries over.
        assert_eq!(
            after_second.current_result.categories,
            session.current_result.categories
        );
        assert_eq!(
            after_second.current_result.logical_fallacies,
            session.current_result.logical_fallacies
        );
        assert_eq!(
            after_second.current_result.validity_reason,
            session.current_result.validity_reason
        );
        // The original result is untouched for reference.
        assert_eq!(after_second.original_result.verdict, Verdict::Out);
        assert_eq!(after_second.conversation.len(), 4);
    }

    #[tokio::test]
    async fn resolved_session_accepts_no_further_turns() {
        let completion = ScriptedCompletion::new(&[]);
        let mut session = ProtestSession::new("x", out_result());
        session.state = SessionState::Resolved;

        let err = protest_turn(&completion, &session, "もう一度").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn malformed_arbiter_output_advances_nothing() {
        let completion = ScriptedCompletion::new(&["考えておきます。"]);
        let session = ProtestSession::new("x", out_result());

        let err = protest_turn(&completion, &session, "抗議").await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::NoJsonObject)
        ));
        // The caller's session still has its history and stays retryable.
        assert_eq!(session.conversation.len(), 0);
        assert_eq!(session.state, SessionState::Open);
    }

    #[tokio::test]
    async fn change_without_replacement_fields_is_invalid() {
        let completion = ScriptedCompletion::new(&[
            r#"{"umpire_response": "変更します", "judgment_changed": true}"#,
        ]);
        let session = ProtestSession::new("x", out_result());

        let err = protest_turn(&completion, &session, "抗議").await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::MissingField("newSafeOrOut"))
        ));
    }

    #[test]
    fn arbiter_prompt_embeds_result_and_history() {
        let mut session = ProtestSession::new("最悪の動画", out_result());
        session.conversation.push(ConversationTurn {
            role: TurnRole::User,
            content: "納得できません".into(),
        });
        session.conversation.push(ConversationTurn {
            role: TurnRole::Arbiter,
            content: "判定は維持します".into(),
        });

        let prompt = build_arbiter_prompt(&session, "理由を説明してください");
        assert!(prompt.contains("\"最悪の動画\""));
        assert!(prompt.contains("判定: out"));
        assert!(prompt.contains("誹謗中傷"));
        assert!(prompt.contains("ユーザー: 納得できません"));
        assert!(prompt.contains("審判: 判定は維持します"));
        assert!(prompt.contains("【新しい抗議】\nユーザー: 理由を説明してください"));
    }
}

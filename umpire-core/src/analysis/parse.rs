//! Completion-output parsing and schema normalization.
//!
//! The upstream response format drifted several times: field names switched
//! between snake_case and camelCase, the counter-argument hierarchy moved
//! from pre-formatted strings (`"Lv3: 論調批判"`, earlier `"DH2: …"`) to a
//! composite object, and fallacies appeared as a name→bool map, a single
//! string-or-null, and an array. All variants normalize into the one
//! [`AnalysisResult`] shape here.
//!
//! A response with no balanced `{`…`}` span, or one that fails to decode, is
//! a hard error; inventing a verdict is worse than surfacing a failure.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::errors::{Error, ResponseFormatError, UmpResult};
use crate::model::{AnalysisResult, Validity, Verdict};
use crate::taxonomy::is_not_applicable;

/// Parses raw completion text into a normalized [`AnalysisResult`].
pub fn parse_analysis_response(raw: &str) -> UmpResult<AnalysisResult> {
    let value = decode_json_span(raw)?;
    normalize(&value).map_err(Error::from)
}

/// Extracts the first `{` … last `}` span and decodes it as JSON.
///
/// Tolerates prose or code fences around the object; everything outside the
/// span is ignored.
pub(crate) fn decode_json_span(raw: &str) -> Result<Value, ResponseFormatError> {
    let start = raw.find('{').ok_or(ResponseFormatError::NoJsonObject)?;
    let end = raw.rfind('}').ok_or(ResponseFormatError::NoJsonObject)?;
    if end < start {
        return Err(ResponseFormatError::NoJsonObject);
    }
    Ok(serde_json::from_str(&raw[start..=end])?)
}

fn normalize(value: &Value) -> Result<AnalysisResult, ResponseFormatError> {
    let obj = value.as_object().ok_or(ResponseFormatError::NoJsonObject)?;

    let categories = normalize_categories(obj)?;
    let (mut graham_level, mut graham_type) = normalize_hierarchy(obj)?;

    // An explicit counter flag always wins; derivation from hierarchy
    // presence applies only when the flag is absent.
    let is_counter = explicit_counter_flag(obj).unwrap_or(graham_level.is_some());
    if !is_counter {
        graham_level = None;
        graham_type = None;
    }

    Ok(AnalysisResult {
        categories,
        is_counter,
        graham_level,
        graham_type,
        logical_fallacies: normalize_fallacies(obj),
        validity_assessment: normalize_validity(obj),
        verdict: normalize_verdict(obj),
        explanation: first_string(obj, &["explanation", "summary"]).unwrap_or_default(),
        validity_reason: first_string(obj, &["validity_reason", "validityReason"])
            .unwrap_or_default(),
    })
}

fn normalize_categories(obj: &Map<String, Value>) -> Result<BTreeSet<String>, ResponseFormatError> {
    let mut set = BTreeSet::new();
    match obj.get("categories").or_else(|| obj.get("category")) {
        Some(Value::String(s)) => {
            let s = s.trim();
            if !s.is_empty() {
                set.insert(s.to_owned());
            }
        }
        Some(Value::Array(items)) => {
            for item in items {
                if let Value::String(s) = item {
                    let s = s.trim();
                    if !s.is_empty() {
                        set.insert(s.to_owned());
                    }
                }
            }
        }
        _ => {}
    }
    if set.is_empty() {
        return Err(ResponseFormatError::MissingField("categories"));
    }
    Ok(set)
}

fn explicit_counter_flag(obj: &Map<String, Value>) -> Option<bool> {
    ["is_counter", "isCounter", "isCounterArgument"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_bool))
}

fn normalize_hierarchy(
    obj: &Map<String, Value>,
) -> Result<(Option<u8>, Option<String>), ResponseFormatError> {
    match obj.get("graham_hierarchy").or_else(|| obj.get("grahamHierarchy")) {
        Some(Value::Object(h)) => match h.get("level") {
            Some(Value::Number(n)) => {
                let level = n
                    .as_u64()
                    .filter(|l| (1..=7).contains(l))
                    .ok_or(ResponseFormatError::InvalidField("graham_hierarchy.level"))?
                    as u8;
                let ty = h
                    .get("type")
                    .and_then(Value::as_str)
                    .unwrap_or("")
                    .trim()
                    .to_owned();
                Ok((Some(level), Some(ty)))
            }
            // null or absent level means "not a counter-argument".
            _ => Ok((None, None)),
        },
        Some(Value::String(s)) => parse_hierarchy_string(s),
        Some(Value::Null) | None => normalize_split_hierarchy(obj),
        Some(_) => Err(ResponseFormatError::InvalidField("graham_hierarchy")),
    }
}

/// The split `graham_level`/`graham_type` pair of the normalized shape
/// itself, accepted for symmetry with what this parser emits downstream.
fn normalize_split_hierarchy(
    obj: &Map<String, Value>,
) -> Result<(Option<u8>, Option<String>), ResponseFormatError> {
    match obj.get("graham_level") {
        Some(Value::Number(n)) => {
            let level = n
                .as_u64()
                .filter(|l| (1..=7).contains(l))
                .ok_or(ResponseFormatError::InvalidField("graham_level"))? as u8;
            let ty = obj
                .get("graham_type")
                .and_then(Value::as_str)
                .unwrap_or("")
                .trim()
                .to_owned();
            Ok((Some(level), Some(ty)))
        }
        _ => Ok((None, None)),
    }
}

/// Parses the pre-formatted hierarchy strings: `"Lv<N>: <type>"` (1-based)
/// and the earlier `"DH<n>: <type>"` (0-based), plus the not-applicable
/// sentinels.
fn parse_hierarchy_string(s: &str) -> Result<(Option<u8>, Option<String>), ResponseFormatError> {
    let s = s.trim();
    if is_not_applicable(s) {
        return Ok((None, None));
    }

    let (zero_based, rest) = if let Some(rest) = s.strip_prefix("Lv") {
        (false, rest)
    } else if let Some(rest) = s.strip_prefix("DH") {
        (true, rest)
    } else {
        return Err(ResponseFormatError::InvalidField("graham_hierarchy"));
    };

    let (num, ty) = match rest.split_once(':') {
        Some((num, ty)) => (num.trim(), ty.trim()),
        None => (rest.trim(), ""),
    };
    let mut level: u8 = num
        .parse()
        .map_err(|_| ResponseFormatError::InvalidField("graham_hierarchy"))?;
    if zero_based {
        level += 1;
    }
    if !(1..=7).contains(&level) {
        return Err(ResponseFormatError::InvalidField("graham_hierarchy"));
    }
    Ok((Some(level), Some(ty.to_owned())))
}

fn normalize_fallacies(obj: &Map<String, Value>) -> BTreeSet<String> {
    let keys = [
        "logical_fallacies",
        "logicalFallacies",
        "logical_fallacy",
        "logicalFallacy",
    ];
    let Some(value) = keys.iter().find_map(|k| obj.get(*k)) else {
        return BTreeSet::new();
    };

    let mut set = BTreeSet::new();
    match value {
        Value::Array(items) => {
            for item in items {
                if let Value::String(s) = item {
                    if !is_not_applicable(s) {
                        set.insert(s.trim().to_owned());
                    }
                }
            }
        }
        // Historical storage joined multiple fallacies with '|'.
        Value::String(s) if !is_not_applicable(s) => {
            for part in s.split('|') {
                let part = part.trim();
                if !part.is_empty() {
                    set.insert(part.to_owned());
                }
            }
        }
        // Earliest schema: a name→bool map.
        Value::Object(map) => {
            for (name, hit) in map {
                if hit.as_bool() == Some(true) {
                    set.insert(name.trim().to_owned());
                }
            }
        }
        _ => {}
    }
    set
}

fn normalize_validity(obj: &Map<String, Value>) -> Validity {
    let value = first_string(obj, &["validity_assessment", "validityAssessment"]);
    match value.as_deref().map(str::trim) {
        Some("高い") | Some("high") => Validity::High,
        Some("中程度") | Some("medium") => Validity::Medium,
        Some("低い") | Some("low") => Validity::Low,
        _ => Validity::Undetermined,
    }
}

/// Absent verdicts normalize to safe: absence of an explicit "out" must
/// never be read as "out".
fn normalize_verdict(obj: &Map<String, Value>) -> Verdict {
    let value = first_string(obj, &["safe_or_out", "safeOrOut", "verdict"]);
    match value.as_deref().map(str::trim) {
        Some(v) if v.eq_ignore_ascii_case("out") => Verdict::Out,
        _ => Verdict::Safe,
    }
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_str))
        .map(str::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> AnalysisResult {
        parse_analysis_response(raw).unwrap()
    }

    #[test]
    fn rejects_text_without_json_object() {
        let err = parse_analysis_response("すみません、JSONを生成できませんでした。").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::NoJsonObject)
        ));
    }

    #[test]
    fn rejects_unbalanced_braces() {
        let err = parse_analysis_response("} oops {").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::NoJsonObject)
        ));
    }

    #[test]
    fn rejects_undecodable_span() {
        let err = parse_analysis_response("{not json}").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::Json(_))
        ));
    }

    #[test]
    fn ignores_prose_and_code_fences_around_json() {
        let raw = "以下が分析結果です:\n```json\n{\"categories\": [\"感想\"]}\n```";
        let result = parse(raw);
        assert!(result.categories.contains("感想"));
    }

    #[test]
    fn current_schema_normalizes_fully() {
        let raw = r#"{
            "categories": ["批判", "情報提供"],
            "graham_hierarchy": {"level": 5, "type": "反論提示"},
            "logical_fallacies": ["対人論証"],
            "validity_assessment": "高い",
            "safe_or_out": "safe",
            "explanation": "根拠を挙げた反論です。",
            "validity_reason": "出典が確認できます。"
        }"#;
        let result = parse(raw);
        assert_eq!(
            result.categories.iter().collect::<Vec<_>>(),
            ["情報提供", "批判"]
        );
        assert!(result.is_counter);
        assert_eq!(result.graham_level, Some(5));
        assert_eq!(result.graham_type.as_deref(), Some("反論提示"));
        assert!(result.logical_fallacies.contains("対人論証"));
        assert_eq!(result.validity_assessment, Validity::High);
        assert_eq!(result.verdict, Verdict::Safe);
        assert_eq!(result.explanation, "根拠を挙げた反論です。");
    }

    #[test]
    fn example_categories_null_fallacy_no_counter() {
        // Worked example: category list, null fallacy, explicit false flag.
        let raw = r#"{
            "category": ["感想", "賞賛"],
            "isCounter": false,
            "grahamHierarchy": "null",
            "logicalFallacy": null,
            "explanation": "賞賛を含む感想コメント"
        }"#;
        let result = parse(raw);
        assert_eq!(
            result.categories.iter().collect::<Vec<_>>(),
            ["感想", "賞賛"]
        );
        assert!(result.logical_fallacies.is_empty());
        assert!(!result.is_counter);
        assert_eq!(result.graham_level, None);
        assert_eq!(result.verdict, Verdict::Safe);
    }

    #[test]
    fn hierarchy_presence_derives_counter_flag() {
        let raw = r#"{
            "categories": ["批判"],
            "graham_hierarchy": {"level": 5, "type": "counter_argument"}
        }"#;
        let result = parse(raw);
        assert!(result.is_counter);
        assert_eq!(result.graham_level, Some(5));
    }

    #[test]
    fn explicit_flag_beats_derivation() {
        let raw = r#"{
            "categories": ["意見"],
            "is_counter": false,
            "graham_hierarchy": {"level": 4, "type": "単純否定"}
        }"#;
        let result = parse(raw);
        assert!(!result.is_counter);
        // Co-presence invariant: no hierarchy on a non-counter result.
        assert_eq!(result.graham_level, None);
        assert_eq!(result.graham_type, None);
    }

    #[test]
    fn composite_and_string_hierarchy_round_trip() {
        let composite = parse(r#"{"categories": ["批判"], "graham_hierarchy": {"level": 3, "type": "論調批判"}}"#);
        let formatted = parse(r#"{"categories": ["批判"], "grahamHierarchy": "Lv3: 論調批判"}"#);
        assert_eq!(composite.graham_level, formatted.graham_level);
        assert_eq!(composite.graham_type, formatted.graham_type);
    }

    #[test]
    fn zero_based_hierarchy_prefix_shifts_to_one_based() {
        let result = parse(r#"{"categories": ["罵倒"], "grahamHierarchy": "DH0: 罵倒"}"#);
        assert_eq!(result.graham_level, Some(1));
        assert_eq!(result.graham_type.as_deref(), Some("罵倒"));
    }

    #[test]
    fn not_applicable_hierarchy_clears_both_fields() {
        let result = parse(r#"{"categories": ["感想"], "grahamHierarchy": "該当なし"}"#);
        assert!(!result.is_counter);
        assert_eq!(result.graham_level, None);
        assert_eq!(result.graham_type, None);
    }

    #[test]
    fn garbage_hierarchy_string_is_invalid() {
        let err = parse_analysis_response(r#"{"categories": ["感想"], "grahamHierarchy": "とても強い"}"#)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::InvalidField("graham_hierarchy"))
        ));
    }

    #[test]
    fn out_of_range_level_is_invalid() {
        let err =
            parse_analysis_response(r#"{"categories": ["批判"], "graham_hierarchy": {"level": 9, "type": "x"}}"#)
                .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidResponse(ResponseFormatError::InvalidField("graham_hierarchy.level"))
        ));
    }

    #[test]
    fn fallacy_bool_map_selects_true_entries() {
        let raw = r#"{
            "category": "批判",
            "isCounterArgument": true,
            "grahamHierarchy": "DH3: 反論",
            "logicalFallacies": {
                "対人論証": false,
                "お前だって論法": true,
                "滑り坂論法": true
            }
        }"#;
        let result = parse(raw);
        assert_eq!(
            result.logical_fallacies.iter().collect::<Vec<_>>(),
            ["お前だって論法", "滑り坂論法"]
        );
    }

    #[test]
    fn pipe_joined_fallacy_string_splits() {
        let result =
            parse(r#"{"categories": ["批判"], "logical_fallacy": "対人論証|権威論証"}"#);
        assert_eq!(result.logical_fallacies.len(), 2);
    }

    #[test]
    fn missing_verdict_defaults_to_safe() {
        let result = parse(r#"{"categories": ["悪口"]}"#);
        assert_eq!(result.verdict, Verdict::Safe);
    }

    #[test]
    fn explicit_out_verdict_survives() {
        let result = parse(r#"{"categories": ["誹謗中傷"], "safe_or_out": "out"}"#);
        assert_eq!(result.verdict, Verdict::Out);
    }

    #[test]
    fn single_category_string_becomes_singleton_set() {
        let result = parse(r#"{"category": "感想"}"#);
        assert_eq!(result.categories.len(), 1);
        assert!(result.categories.contains("感想"));
    }

    #[test]
    fn empty_categories_are_a_hard_failure() {
        for raw in [r#"{}"#, r#"{"categories": []}"#, r#"{"category": "  "}"#] {
            let err = parse_analysis_response(raw).unwrap_err();
            assert!(matches!(
                err,
                Error::InvalidResponse(ResponseFormatError::MissingField("categories"))
            ));
        }
    }

    #[test]
    fn summary_stands_in_for_explanation() {
        let result = parse(r#"{"categories": ["感想"], "summary": "ポジティブな感想です。"}"#);
        assert_eq!(result.explanation, "ポジティブな感想です。");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let raw = r#"{
            "categories": ["感想"],
            "confidence": 0.95,
            "model_notes": {"tokens": 120},
            "future_field": ["a", "b"]
        }"#;
        assert!(parse_analysis_response(raw).is_ok());
    }

    #[test]
    fn japanese_validity_labels_normalize() {
        for (label, expected) in [
            ("高い", Validity::High),
            ("中程度", Validity::Medium),
            ("低い", Validity::Low),
            ("よくわからない", Validity::Undetermined),
        ] {
            let raw = format!(r#"{{"categories": ["感想"], "validity_assessment": "{label}"}}"#);
            assert_eq!(parse(&raw).validity_assessment, expected);
        }
    }
}

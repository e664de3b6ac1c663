//! Closed label sets used by the analysis contract.
//!
//! These lists are part of the output contract embedded in the system
//! instruction; the parser treats anything outside them leniently but the
//! model is told to stay within them.

/// The 19 comment categories. Multiple labels may co-occur.
pub const CATEGORIES: [&str; 19] = [
    "皮肉",
    "嘲笑",
    "感想",
    "意見",
    "アドバイス",
    "批判",
    "誹謗中傷",
    "悪口",
    "侮辱",
    "上から目線",
    "論点すり替え",
    "攻撃的",
    "賞賛",
    "感謝",
    "情報提供",
    "問題提起",
    "正論",
    "差別的",
    "共感",
];

/// Counter-argument hierarchy type names, indexed by level - 1 (Lv1..Lv7).
pub const GRAHAM_TYPES: [&str; 7] = [
    "罵倒",
    "人格攻撃",
    "論調批判",
    "単純否定",
    "反論提示",
    "論破",
    "主眼論破",
];

/// The closed logical-fallacy set.
pub const LOGICAL_FALLACIES: [&str; 5] = [
    "対人論証",
    "権威論証",
    "ストローマン論法",
    "お前だって論法",
    "滑り坂論法",
];

/// Values treated as "not applicable" wherever a hierarchy or fallacy slot
/// may be empty. Historical responses used several spellings.
pub const NOT_APPLICABLE: [&str; 4] = ["該当なし", "null", "none", "なし"];

/// True when `value` is one of the not-applicable sentinels (or blank).
pub fn is_not_applicable(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || NOT_APPLICABLE.iter().any(|s| v.eq_ignore_ascii_case(s))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sentinels_match_all_spellings() {
        assert!(is_not_applicable("該当なし"));
        assert!(is_not_applicable("null"));
        assert!(is_not_applicable("NULL"));
        assert!(is_not_applicable("  "));
        assert!(!is_not_applicable("罵倒"));
    }

    #[test]
    fn graham_types_are_level_ordered() {
        assert_eq!(GRAHAM_TYPES[0], "罵倒");
        assert_eq!(GRAHAM_TYPES[6], "主眼論破");
        assert_eq!(GRAHAM_TYPES.len(), 7);
    }
}

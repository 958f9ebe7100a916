//! Status normalization.

use crate::spec::{EnumStatusLabel, EnumStatusOutcome, SpecStatusRules};
use crate::util::{contains_ignore_case, to_title_case};

/// Map a raw status cell to a canonical label, an exclusion or an unrecognized value.
///
/// The text is trimmed and title-cased first. `not executed` matches as a
/// substring; `passed`/`failed` must match the whole text. Excluded terms are
/// only consulted when no label matched.
pub fn normalize_status(raw: &str, rules: &SpecStatusRules) -> EnumStatusOutcome {
    let c_title = to_title_case(raw.trim());
    let c_lower = c_title.to_lowercase();

    if c_lower.contains("not executed") {
        return EnumStatusOutcome::Canonical(EnumStatusLabel::NotExecuted);
    }
    if c_lower == "passed" {
        return EnumStatusOutcome::Canonical(EnumStatusLabel::Passed);
    }
    if c_lower == "failed" {
        return EnumStatusOutcome::Canonical(EnumStatusLabel::Failed);
    }
    if is_excluded_status(&c_title, rules) {
        return EnumStatusOutcome::Excluded(c_title);
    }
    EnumStatusOutcome::Unrecognized(c_title)
}

/// `true` when `value` contains any excluded term (case-insensitive).
pub fn is_excluded_status(value: &str, rules: &SpecStatusRules) -> bool {
    rules
        .excluded_terms
        .iter()
        .filter(|c_term| !c_term.trim().is_empty())
        .any(|c_term| contains_ignore_case(value, c_term))
}

//! Custom Rule Layer (SPEC_FULL.md §4.3). User-supplied allow/deny regexes,
//! evaluated before any built-in check so the user can override them.

use regex::RegexBuilder;
use std::sync::LazyLock;

use crate::types::{Decision, DecisionSource};

/// Commands longer than this are clamped before testing against a custom
/// pattern, so even a pattern that survives the syntactic guard below
/// cannot be driven into unbounded backtracking by a huge input.
const INPUT_CLAMP_BYTES: usize = 2048;

/// Nested-quantifier shapes that are classic ReDoS amplifiers, e.g.
/// `(a+)+`, `(a*)+`, `(a+)*` and their non-capturing `(?:...)` variants.
static NESTED_QUANTIFIER_GUARD: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"\((?:\?:)?[^()]*[+*]\)[+*]").expect("guard regex is a fixed literal")
});

/// Rejects patterns containing a nested-quantifier shape without ever
/// running them; accepted patterns still go through the input clamp.
fn is_redos_risk(pattern: &str) -> bool {
    NESTED_QUANTIFIER_GUARD.is_match(pattern)
}

fn clamp(input: &str) -> &str {
    if input.len() <= INPUT_CLAMP_BYTES {
        return input;
    }
    let mut end = INPUT_CLAMP_BYTES;
    while !input.is_char_boundary(end) {
        end -= 1;
    }
    &input[..end]
}

/// Compiles and tests a single user pattern against `command`, treating any
/// ReDoS-risky pattern or regex compile error as no-match.
fn pattern_matches(pattern: &str, command: &str) -> bool {
    if is_redos_risk(pattern) {
        tracing::warn!(pattern, "rejected custom pattern: nested quantifier shape");
        return false;
    }

    let compiled = match RegexBuilder::new(pattern).case_insensitive(true).build() {
        Ok(re) => re,
        Err(e) => {
            tracing::warn!(pattern, error = %e, "invalid custom pattern, treating as no-match");
            return false;
        }
    };

    compiled.is_match(clamp(command))
}

/// Evaluates allow patterns first, then block patterns; `None` if neither
/// list produces a match, so the pipeline continues to built-in checks.
pub fn evaluate(command: &str, allow_patterns: &[String], block_patterns: &[String]) -> Option<Decision> {
    for pattern in allow_patterns {
        if pattern_matches(pattern, command) {
            return Some(Decision::allow(
                DecisionSource::CustomAllow,
                format!("matched custom allow pattern: {pattern}"),
            ));
        }
    }

    for pattern in block_patterns {
        if pattern_matches(pattern, command) {
            return Some(
                Decision::deny(
                    DecisionSource::CustomBlock,
                    format!("matched custom block pattern: {pattern}"),
                )
                .with_user_message(format!(
                    "[CUSTOM RULE] This command matches a pattern you've configured to block: {pattern}"
                )),
            );
        }
    }

    None
}

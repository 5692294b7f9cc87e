//! Instant-Allow Filter (SPEC_FULL.md §4.4). Recognizes purely read-only,
//! hook-free shell commands and short-circuits them to allow.

use regex::Regex;
use std::sync::LazyLock;

/// Chaining/substitution shapes that disqualify a command from being
/// "pure": anything that could run a second command.
static CHAINING_OPERATORS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[;&|]|\$\(|`|\n").expect("chaining-operator regex is a fixed literal")
});

/// Read-only, hook-free git subcommands. `add`, `commit`, `checkout`,
/// `merge`, `rebase`, `pull`, `fetch`, `stash`, `cherry-pick`, `tag`, and
/// `remote add` are deliberately excluded: they can execute repository
/// hooks (SPEC_FULL.md §4.4, §9's `git add` resolution).
const SAFE_GIT_SUBCOMMANDS: &[&str] = &[
    "status",
    "log",
    "diff",
    "show",
    "blame",
    "reflog",
    "shortlog",
    "describe",
    "rev-parse",
    "ls-files",
    "ls-tree",
];

static DANGEROUS_GIT_SHAPES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bpush\b|reset\s+--hard|clean\s+-\w*f\w*|--force|(^|\s)-f(\s|$)")
        .expect("dangerous-git regex is a fixed literal")
});

/// True only when the command is a single, unchained `git <safe-subcommand>`
/// invocation with no dangerous-git flag present anywhere in the string.
pub fn is_instant_allow(command: &str) -> bool {
    let trimmed = command.trim();
    if trimmed.is_empty() {
        return false;
    }

    if CHAINING_OPERATORS.is_match(trimmed) {
        return false;
    }

    let mut tokens = trimmed.split_whitespace();
    if tokens.next() != Some("git") {
        return false;
    }

    let Some(subcommand) = tokens.next() else {
        return false;
    };

    if !SAFE_GIT_SUBCOMMANDS.contains(&subcommand) {
        return false;
    }

    !DANGEROUS_GIT_SHAPES.is_match(trimmed)
}

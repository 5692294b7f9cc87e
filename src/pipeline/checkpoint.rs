//! Checkpoint Classifier (SPEC_FULL.md §4.6). Labels a shell command with
//! what *kind* of sensitive action it represents; first-wins across seven
//! ordered families. `git add` is deliberately classified as a checkpoint
//! (§9's resolved open question) rather than left unclassified.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{Checkpoint, CheckpointKind};

struct Rule {
    kind: CheckpointKind,
    regex: &'static Regex,
    describe: fn(&str) -> String,
}

static URL_SHORTENER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)https?://(www\.)?(bit\.ly|tinyurl\.com|t\.co|goo\.gl|ow\.ly|is\.gd|buff\.ly|rebrand\.ly|cutt\.ly|shorte\.st|adf\.ly)\b")
        .expect("url-shortener regex is a fixed literal")
});

static SCRIPT_EXECUTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(curl|wget)\s+[^|\n]*\|\s*(sudo\s+)?(ba)?sh\b|\b(ba)?sh\s+\S+\.sh\b|(^|\s)\./\S+\.sh\b|chmod\s+\+x\b|\bnpm\s+run\b|\bmake\b|\b(node|python[23]?|ruby|perl)\s+\S+\.(js|py|rb|pl)\b",
    )
    .expect("script-execution regex is a fixed literal")
});

static NETWORK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(curl|wget)\b[^\n]*https?://").expect("network regex is a fixed literal"));

static PACKAGE_INSTALL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bnpm\s+install\s+[^\s-][^\n]*|\b(pnpm|yarn)\s+(add|install)\b|\bpip[23]?\s+install\b|\b(apt|apt-get)\s+install\b|\bbrew\s+install\b|\bgem\s+install\b|\bcargo\s+install\b",
    )
    .expect("package-install regex is a fixed literal")
});

static GIT_OPERATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\bgit\s+(commit|checkout|switch|merge|rebase|pull|fetch|reset\s+--hard|\S*--force\S*|clean\s+-\w*f\w*|stash|cherry-pick|add|push)\b",
    )
    .expect("git-operation regex is a fixed literal")
});

static ENV_MODIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[\s/])\.env(\.local|\.production|\.development)?\b").expect("env-modification regex is a fixed literal")
});

static SENSITIVE_FILE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.ssh\b|\.aws\b|credentials\b").expect("sensitive-file regex is a fixed literal")
});

fn describe_url_shortener(command: &str) -> String {
    format!("Command resolves a shortened URL of unknown destination: {command}")
}
fn describe_script_execution(command: &str) -> String {
    format!("Command downloads or runs a script: {command}")
}
fn describe_network(command: &str) -> String {
    format!("Command makes an outbound network request: {command}")
}
fn describe_package_install(command: &str) -> String {
    format!("Command installs a third-party package: {command}")
}
fn describe_git_operation(command: &str) -> String {
    format!("Command performs a hook-bearing git operation: {command}")
}
fn describe_env_modification(command: &str) -> String {
    format!("Command touches an environment file: {command}")
}
fn describe_sensitive_file(command: &str) -> String {
    format!("Command touches a credential-bearing path: {command}")
}

fn rules() -> [Rule; 7] {
    [
        Rule { kind: CheckpointKind::UrlShortener, regex: &URL_SHORTENER_RE, describe: describe_url_shortener },
        Rule { kind: CheckpointKind::ScriptExecution, regex: &SCRIPT_EXECUTION_RE, describe: describe_script_execution },
        Rule { kind: CheckpointKind::Network, regex: &NETWORK_RE, describe: describe_network },
        Rule { kind: CheckpointKind::PackageInstall, regex: &PACKAGE_INSTALL_RE, describe: describe_package_install },
        Rule { kind: CheckpointKind::GitOperation, regex: &GIT_OPERATION_RE, describe: describe_git_operation },
        Rule { kind: CheckpointKind::EnvModification, regex: &ENV_MODIFICATION_RE, describe: describe_env_modification },
        Rule { kind: CheckpointKind::FileSensitive, regex: &SENSITIVE_FILE_RE, describe: describe_sensitive_file },
    ]
}

/// First-wins match across the seven ordered checkpoint families. `None`
/// means the command proceeds as no-checkpoint → allow.
pub fn classify(command: &str) -> Option<Checkpoint> {
    if command.trim().is_empty() {
        return None;
    }

    for rule in rules() {
        if rule.regex.is_match(command) {
            return Some(Checkpoint {
                kind: rule.kind,
                original_command: command.to_string(),
                description: (rule.describe)(command),
            });
        }
    }

    None
}

use regex::RegexBuilder;
use std::sync::LazyLock;

use crate::types::Severity;

pub struct PathPattern {
    pub regex: regex::Regex,
    pub description: &'static str,
    pub severity: Severity,
    pub risk: &'static str,
    pub legitimate_uses: &'static [&'static str],
}

fn compile(pattern: &str) -> regex::Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("built-in path pattern '{pattern}' failed to compile: {e}"))
}

type RawPattern = (&'static str, &'static str, Severity, &'static str, &'static [&'static str]);

/// Paths a `Write`/`Edit`/`NotebookEdit` may not touch. Ordering is
/// load-bearing: critical entries precede high entries whenever their
/// regexes could both match the same input (SPEC_FULL.md §4.2, §9).
const WRITE_SENSITIVE_RAW: &[RawPattern] = &[
    (
        r"\.ssh/(authorized_keys|config|id_[a-z0-9_]+)$",
        "SSH configuration or key file",
        Severity::Critical,
        "Could grant remote access to an attacker-controlled key or redirect outbound SSH.",
        &["Adding a deploy key", "Rotating host keys"],
    ),
    (
        r"\.aws/credentials$|\.aws/config$",
        "AWS credential or config file",
        Severity::Critical,
        "Could exfiltrate or corrupt cloud account credentials.",
        &["Switching AWS profiles locally"],
    ),
    (
        r"\.gnupg/",
        "GPG keyring directory",
        Severity::Critical,
        "Could corrupt or exfiltrate private signing/encryption keys.",
        &["Key rotation via gpg CLI"],
    ),
    (
        r"/etc/(passwd|shadow|sudoers)",
        "Core system account/privilege file",
        Severity::Critical,
        "Could grant or revoke system-level privileges.",
        &["Intentional admin account changes with sudo"],
    ),
    (
        r"(^|/)\.bashrc$|(^|/)\.bash_profile$|(^|/)\.zshrc$|(^|/)\.profile$",
        "Shell startup file",
        Severity::High,
        "Runs on every new shell; can install a persistent backdoor.",
        &["Adding an alias or PATH entry"],
    ),
    (
        r"/etc/crontab$|/etc/cron\.d/|(^|/)var/spool/cron/",
        "System crontab",
        Severity::High,
        "Schedules arbitrary recurring command execution.",
        &["Legitimate scheduled maintenance jobs"],
    ),
    (
        r"\.git/hooks/",
        "Git hooks directory",
        Severity::High,
        "Hook scripts execute automatically on common git operations.",
        &["Installing a pre-commit formatting hook"],
    ),
    (
        r"\.npmrc$|\.pypirc$|\.netrc$|\.git-credentials$",
        "Package manager or network credential config",
        Severity::High,
        "May hold an auth token that grants publish or fetch access.",
        &["Switching a private registry"],
    ),
    (
        r"^/etc/|^/usr/|^/bin/|^/sbin/",
        "System directory",
        Severity::High,
        "Could affect system stability or other users on the machine.",
        &["System package installation via a package manager"],
    ),
    (
        r"\.claude/settings\.json$|\.claude/hooks/|\.cmdsentry/",
        "Host agent or guard's own configuration",
        Severity::High,
        "Could disable or rewrite the safety pipeline protecting this session.",
        &["Reinstalling the hook via the `install` subcommand"],
    ),
];

pub static WRITE_SENSITIVE: LazyLock<Vec<PathPattern>> = LazyLock::new(|| {
    WRITE_SENSITIVE_RAW
        .iter()
        .map(|(pattern, description, severity, risk, uses)| PathPattern {
            regex: compile(pattern),
            description,
            severity: *severity,
            risk,
            legitimate_uses: uses,
        })
        .collect()
});

/// Paths a `Read` may not touch. Environment files are `high`; private keys
/// and cloud credentials are `critical` (SPEC_FULL.md §4.2).
const READ_SENSITIVE_RAW: &[RawPattern] = &[
    (
        r"\.ssh/id_(rsa|dsa|ecdsa|ed25519)$",
        "SSH private key",
        Severity::Critical,
        "Grants impersonation on every host that trusts this key.",
        &["Key backup by its legitimate owner"],
    ),
    (
        r"\.pem$|\.key$",
        "PEM/key file",
        Severity::Critical,
        "Likely a private key or certificate material.",
        &["Inspecting a self-signed dev certificate"],
    ),
    (
        r"\.aws/credentials$|\.aws/config$",
        "AWS credential file",
        Severity::Critical,
        "Full read access discloses long-lived cloud credentials.",
        &["Debugging which AWS profile is active"],
    ),
    (
        r"\.gnupg/.*private",
        "GPG private key material",
        Severity::Critical,
        "Discloses a private signing/encryption key.",
        &["Key export by the legitimate owner"],
    ),
    (
        r"/etc/shadow$",
        "System shadow password file",
        Severity::Critical,
        "Contains password hashes for every local account.",
        &["Security auditing tools run as root"],
    ),
    (
        r"\.env(\.local|\.production|\.development)?$",
        "Environment file",
        Severity::High,
        "Commonly holds API keys, database URLs, and other secrets.",
        &["Reviewing local development configuration"],
    ),
    (
        r"\.netrc$|\.git-credentials$",
        "Plaintext network credential file",
        Severity::High,
        "Holds unencrypted basic-auth credentials for remote services.",
        &["Confirming which remote credentials are configured"],
    ),
    (
        r"\.npmrc$|\.pypirc$",
        "Package registry config",
        Severity::High,
        "May contain a publish-scoped auth token.",
        &["Checking which registry is configured"],
    ),
];

pub static READ_SENSITIVE: LazyLock<Vec<PathPattern>> = LazyLock::new(|| {
    READ_SENSITIVE_RAW
        .iter()
        .map(|(pattern, description, severity, risk, uses)| PathPattern {
            regex: compile(pattern),
            description,
            severity: *severity,
            risk,
            legitimate_uses: uses,
        })
        .collect()
});

/// Expand `$HOME`/`${HOME}` to `~` and collapse repeated path separators,
/// then match case-insensitively (SPEC_FULL.md §4.2).
pub fn normalize_path(path: &str) -> String {
    let expanded = path.replace("${HOME}", "~").replace("$HOME", "~");
    let mut collapsed = String::with_capacity(expanded.len());
    let mut prev_slash = false;
    for c in expanded.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        collapsed.push(c);
    }
    collapsed
}

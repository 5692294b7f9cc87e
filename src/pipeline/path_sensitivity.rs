//! Path Sensitivity Check (SPEC_FULL.md §4.2). Resolves a file path against
//! the write- or read-sensitive pattern set, first match wins.

use crate::patterns::path_patterns::{normalize_path, PathPattern, READ_SENSITIVE, WRITE_SENSITIVE};
use crate::types::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathAction {
    Read,
    Write,
    /// Edit uses the write-sensitive set (SPEC_FULL.md §4.2).
    Edit,
}

pub struct PathSensitivityHit {
    pub severity: Severity,
    pub description: &'static str,
    pub risk: &'static str,
    pub legitimate_uses: &'static [&'static str],
}

/// Normalizes `path` and walks the action-appropriate ordered pattern list,
/// returning the first match (critical-before-high ordering is encoded in
/// the pattern table itself, not here).
pub fn check(path: &str, action: PathAction) -> Option<PathSensitivityHit> {
    if path.is_empty() {
        return None;
    }

    let normalized = normalize_path(path);
    let set: &[PathPattern] = match action {
        PathAction::Read => &READ_SENSITIVE,
        PathAction::Write | PathAction::Edit => &WRITE_SENSITIVE,
    };

    set.iter().find(|p| p.regex.is_match(&normalized)).map(|p| PathSensitivityHit {
        severity: p.severity,
        description: p.description,
        risk: p.risk,
        legitimate_uses: p.legitimate_uses,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_ssh_private_key_read_as_critical() {
        let hit = check("~/.ssh/id_rsa", PathAction::Read).unwrap();
        assert_eq!(hit.severity, Severity::Critical);
    }

    #[test]
    fn flags_ssh_authorized_keys_write_as_critical_not_shell_startup() {
        let hit = check("$HOME/.ssh/authorized_keys", PathAction::Write).unwrap();
        assert_eq!(hit.severity, Severity::Critical);
        assert_eq!(hit.description, "SSH configuration or key file");
    }

    #[test]
    fn edit_uses_write_sensitive_set() {
        let hit = check("/etc/sudoers", PathAction::Edit).unwrap();
        assert_eq!(hit.severity, Severity::Critical);
    }

    #[test]
    fn env_file_read_is_high() {
        let hit = check(".env", PathAction::Read).unwrap();
        assert_eq!(hit.severity, Severity::High);
    }

    #[test]
    fn ordinary_project_path_is_not_flagged() {
        assert!(check("/project/src/index.ts", PathAction::Write).is_none());
        assert!(check("/project/README.md", PathAction::Read).is_none());
    }

    #[test]
    fn empty_path_is_not_flagged() {
        assert!(check("", PathAction::Write).is_none());
    }
}

//! Settings Installer (SPEC_FULL.md §1, §6). Writes/removes this guard's
//! hook registration in the host agent's settings file. Explicitly an
//! external collaborator from the core's point of view: it only consumes
//! this binary's own path and a target settings file.

use serde_json::{json, Value};
use std::path::{Path, PathBuf};

use crate::error::GuardError;

const CLAUDE_DOTDIR: &str = ".claude";
const SETTINGS_FILENAME: &str = "settings.json";
const HOOK_EVENT: &str = "PermissionRequest";

/// `<cwd>/.claude/settings.json` if that directory already exists, else
/// `<home>/.claude/settings.json` (created if neither exists).
pub fn resolve_settings_path(cwd: &Path) -> Result<PathBuf, GuardError> {
    let project_settings = cwd.join(CLAUDE_DOTDIR).join(SETTINGS_FILENAME);
    if project_settings.exists() || cwd.join(CLAUDE_DOTDIR).exists() {
        return Ok(project_settings);
    }

    let home = dirs::home_dir().ok_or(GuardError::NoHomeDirectory)?;
    Ok(home.join(CLAUDE_DOTDIR).join(SETTINGS_FILENAME))
}

fn read_settings(path: &Path) -> Result<Value, GuardError> {
    if !path.exists() {
        return Ok(json!({}));
    }
    let contents = std::fs::read_to_string(path).map_err(|source| GuardError::SettingsRead {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| GuardError::SettingsParse {
        path: path.display().to_string(),
        source,
    })
}

/// Writes the settings file back with the same permissions it had before
/// (0600 if it did not already exist), per SPEC_FULL.md §6's install/
/// uninstall contract.
fn write_settings(path: &Path, settings: &Value) -> Result<(), GuardError> {
    let previous_mode = existing_mode(path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| GuardError::SettingsWrite {
            path: path.display().to_string(),
            source,
        })?;
    }
    let contents = serde_json::to_string_pretty(settings).expect("settings always serialize");
    std::fs::write(path, contents).map_err(|source| GuardError::SettingsWrite {
        path: path.display().to_string(),
        source,
    })?;

    restore_mode(path, previous_mode).map_err(|source| GuardError::SettingsWrite {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(unix)]
fn existing_mode(path: &Path) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path).ok().map(|m| m.permissions().mode())
}

#[cfg(not(unix))]
fn existing_mode(_path: &Path) -> Option<u32> {
    None
}

#[cfg(unix)]
fn restore_mode(path: &Path, previous_mode: Option<u32>) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    let mode = previous_mode.unwrap_or(0o600);
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(mode);
    std::fs::set_permissions(path, perms)
}

#[cfg(not(unix))]
fn restore_mode(_path: &Path, _previous_mode: Option<u32>) -> std::io::Result<()> {
    Ok(())
}

fn hook_command(binary_path: &str) -> Value {
    json!({
        "type": "command",
        "command": format!("{binary_path} check"),
    })
}

fn is_our_entry(entry: &Value, binary_path: &str) -> bool {
    entry
        .get("command")
        .and_then(Value::as_str)
        .is_some_and(|c| c.trim_start() == format!("{binary_path} check"))
}

/// Registers this binary's `check` subcommand under
/// `hooks.PermissionRequest`. Idempotent: running twice does not duplicate
/// the entry.
pub fn install(settings_path: &Path, binary_path: &str) -> Result<(), GuardError> {
    let mut settings = read_settings(settings_path)?;

    let hooks = settings
        .as_object_mut()
        .expect("settings root is always an object")
        .entry("hooks")
        .or_insert_with(|| json!({}));

    let event_array = hooks
        .as_object_mut()
        .expect("hooks is always an object")
        .entry(HOOK_EVENT)
        .or_insert_with(|| json!([]));

    let array = event_array.as_array_mut().expect("hook event is always an array");

    if !array.iter().any(|entry| is_our_entry(entry, binary_path)) {
        array.push(hook_command(binary_path));
    }

    write_settings(settings_path, &settings)
}

/// Removes only the hook entry matching this binary's own invocation,
/// leaving any other registered hooks untouched. A no-op if the entry
/// isn't present.
pub fn uninstall(settings_path: &Path, binary_path: &str) -> Result<(), GuardError> {
    let mut settings = read_settings(settings_path)?;

    let Some(array) = settings
        .get_mut("hooks")
        .and_then(|h| h.get_mut(HOOK_EVENT))
        .and_then(Value::as_array_mut)
    else {
        return Ok(());
    };

    array.retain(|entry| !is_our_entry(entry, binary_path));

    write_settings(settings_path, &settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_creates_hook_entry_in_fresh_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        install(&path, "/usr/local/bin/cmdsentry").unwrap();

        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = settings["hooks"]["PermissionRequest"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["command"], "/usr/local/bin/cmdsentry check");
    }

    #[test]
    fn install_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        install(&path, "/usr/local/bin/cmdsentry").unwrap();
        install(&path, "/usr/local/bin/cmdsentry").unwrap();

        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = settings["hooks"]["PermissionRequest"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn install_preserves_unrelated_existing_hooks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            json!({
                "hooks": {
                    "PermissionRequest": [{"type": "command", "command": "other-tool check"}]
                }
            })
            .to_string(),
        )
        .unwrap();

        install(&path, "/usr/local/bin/cmdsentry").unwrap();

        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = settings["hooks"]["PermissionRequest"].as_array().unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn uninstall_removes_only_our_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(
            &path,
            json!({
                "hooks": {
                    "PermissionRequest": [
                        {"type": "command", "command": "other-tool check"},
                        {"type": "command", "command": "/usr/local/bin/cmdsentry check"},
                    ]
                }
            })
            .to_string(),
        )
        .unwrap();

        uninstall(&path, "/usr/local/bin/cmdsentry").unwrap();

        let settings: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let entries = settings["hooks"]["PermissionRequest"].as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["command"], "other-tool check");
    }

    #[test]
    fn uninstall_on_unregistered_hook_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        assert!(uninstall(&path, "/usr/local/bin/cmdsentry").is_ok());
    }

    #[test]
    fn resolve_settings_path_prefers_project_claude_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(".claude")).unwrap();
        let resolved = resolve_settings_path(dir.path()).unwrap();
        assert_eq!(resolved, dir.path().join(".claude/settings.json"));
    }

    #[cfg(unix)]
    #[test]
    fn install_sets_owner_only_permissions_on_a_new_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        install(&path, "/usr/local/bin/cmdsentry").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn install_preserves_existing_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, json!({}).to_string()).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        install(&path, "/usr/local/bin/cmdsentry").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }
}

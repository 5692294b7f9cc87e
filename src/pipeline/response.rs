//! Response Assembler (SPEC_FULL.md §4.1, §4.10). Builds the user-facing
//! warning text shared by the path-sensitivity and high-risk-pattern
//! checks; the core never sleeps out the timeout itself — that's the host
//! adapter's job.

/// `"[SENSITIVE FILE] <reason> (Auto-reject in <T>s)\n\nPotential risk: <risk>\n
/// Common uses: <legit uses>\n\nOnly proceed if you know what you're doing."`
/// (SPEC_FULL.md §4.1).
pub fn sensitive_file_message(
    label: &str,
    reason: &str,
    risk: &str,
    legitimate_uses: &[&str],
    timeout_seconds: u64,
) -> String {
    let uses = if legitimate_uses.is_empty() {
        "None commonly known".to_string()
    } else {
        legitimate_uses.join(", ")
    };

    format!(
        "{label} {reason} (Auto-reject in {timeout_seconds}s)\n\n\
         Potential risk: {risk}\n\
         Common uses: {uses}\n\n\
         Only proceed if you know what you're doing."
    )
}

//! Prompt-injection defenses that keep the LLM cascade honest (SPEC_FULL.md
//! §4.9). The command text reaching these functions is adversarial input:
//! every defense here assumes a motivated attacker is trying to steer the
//! triage/review models toward SELF_HANDLE/ALLOW.

use regex::RegexBuilder;
use std::sync::LazyLock;

/// Maximum length of sanitized command text interpolated into a prompt.
const SANITIZE_MAX_LEN: usize = 2000;

/// Replace runs of 3+ newlines with exactly two, truncate to
/// [`SANITIZE_MAX_LEN`] chars, neutralize CDATA closers, then XML-escape.
/// Idempotent: `sanitize(sanitize(x)) == sanitize(x)`.
pub fn sanitize(input: &str) -> String {
    let collapsed = collapse_blank_runs(input);
    let truncated = truncate_chars(&collapsed, SANITIZE_MAX_LEN);
    let cdata_safe = truncated.replace("]]>", "]]&gt;");
    xml_escape(&cdata_safe)
}

fn collapse_blank_runs(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut newline_run = 0usize;
    for c in input.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(c);
            }
        } else {
            newline_run = 0;
            out.push(c);
        }
    }
    out
}

fn truncate_chars(input: &str, max: usize) -> String {
    if input.chars().count() <= max {
        return input.to_string();
    }
    let mut out: String = input.chars().take(max).collect();
    out.push_str("… [truncated]");
    out
}

/// XML-escape is applied *after* truncation/CDATA-neutralization, so an
/// already-escaped `&gt;` above is re-escaped to `&amp;gt;` — this is
/// intentional: it guarantees the final string contains no raw `]]>` under
/// any escaping order, which matters more than a cosmetically clean escape.
fn xml_escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Curated, case-insensitive signatures of prompt-injection attempts
/// embedded in a shell command (SPEC_FULL.md §4.9).
static INJECTION_PATTERNS: LazyLock<Vec<regex::Regex>> = LazyLock::new(|| {
    [
        r"\b(ignore|forget|disregard|override)\b[^.\n]{0,40}\b(previous|prior|above|earlier)\b[^.\n]{0,20}\b(instructions?|rules?|prompt)\b",
        r"\bbypass\b[^.\n]{0,20}\bsecurity\b",
        r"\byou\s+are\s+now\s+a\b",
        r"\bact\s+as\s+(a|an)\b",
        r"\bpretend\s+to\s+be\b",
        r"(^|\n)\s*(system|assistant|human|user)\s*:",
        r"</?(system|instructions)>",
        r"\b(important|note|warning|critical|urgent)\s*:",
        r"\brespond\s+with\s+this\s+json\b",
        r"\breturn\s+ALLOW\b",
        r"\balways\s+return\b",
        r"\bthis\s+is\s+pre-?approved\b",
        r"\balready\s+verified\b",
        r"\bfor\s+testing\s+purposes\b",
        r"\bverdict\s*=\s*ALLOW\b",
        r"\bclassification\s*=\s*SELF_HANDLE\b",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("built-in injection pattern '{p}' failed to compile: {e}"))
    })
    .collect()
});

/// True if `command` contains any curated prompt-injection signature.
pub fn detect_injection(command: &str) -> bool {
    INJECTION_PATTERNS.iter().any(|re| re.is_match(command))
}

/// Structural danger markers that, independent of the injection detector,
/// justify lifting a SELF_HANDLE triage verdict back to ESCALATE.
static FORCE_ESCALATE_STRUCTURAL: LazyLock<Vec<regex::Regex>> = LazyLock::new(|| {
    [
        r"\|\s*(bash|sh|zsh|fish)\b",
        r"\bcurl\b[^|\n]*\|",
        r"\bwget\b[^|\n]*\|",
        r"\bbase64\b",
        r"\beval\s*\(",
        r"\$\(",
        r"`[^`]*`",
        r"/dev/tcp/",
        r"\bnc\b\s+.*-[a-z]*[elp][a-z]*\b",
        r"\bsudo\b",
        r"\bsu\s+-",
        r"\bchmod\b\s+[0-7]*[1357]\d*\b",
        r"\.env\b",
        r"(^|[\s;&|])/etc\b",
        r"(^|[\s;&|])/root\b",
        r"(^|[\s;&|])/home\b",
    ]
    .iter()
    .map(|p| {
        RegexBuilder::new(p)
            .case_insensitive(true)
            .build()
            .unwrap_or_else(|e| panic!("built-in force-escalate pattern '{p}' failed to compile: {e}"))
    })
    .collect()
});

/// Safety net: a successful prompt injection would most likely steer the
/// triage model toward SELF_HANDLE, so independently re-derive whether the
/// raw command *looks* dangerous regardless of what the model said.
pub fn should_force_escalate(command: &str) -> bool {
    detect_injection(command) || FORCE_ESCALATE_STRUCTURAL.iter().any(|re| re.is_match(command))
}

/// Tries, in order: whole-reply JSON; first fenced ```json code block;
/// first balanced, string-literal-aware `{…}` substring. Returns `None` if
/// no candidate parses as a JSON object.
pub fn extract_json_object(reply: &str) -> Option<serde_json::Value> {
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(reply.trim()) {
        if v.is_object() {
            return Some(v);
        }
    }

    if let Some(fenced) = extract_fenced_code_block(reply) {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(fenced.trim()) {
            if v.is_object() {
                return Some(v);
            }
        }
    }

    if let Some(balanced) = extract_first_balanced_object(reply) {
        if let Ok(v) = serde_json::from_str::<serde_json::Value>(&balanced) {
            if v.is_object() {
                return Some(v);
            }
        }
    }

    None
}

fn extract_fenced_code_block(reply: &str) -> Option<&str> {
    let start_marker = reply.find("```")?;
    let after_fence = start_marker + 3;
    let rest = &reply[after_fence..];
    let content_start = rest.find('\n').map(|i| i + 1).unwrap_or(0);
    let content = &rest[content_start..];
    let end = content.find("```")?;
    Some(content[..end].trim())
}

/// Scans for the first top-level balanced `{…}`, tracking string literals
/// (and escapes within them) so braces inside quoted strings never throw
/// off the depth counter.
fn extract_first_balanced_object(reply: &str) -> Option<String> {
    let bytes = reply.as_bytes();
    let start = reply.find('{')?;

    let mut depth = 0i32;
    let mut in_string = false;
    let mut escaped = false;
    let mut end = None;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        let c = b as char;
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(start + offset + 1);
                    break;
                }
            }
            _ => {}
        }
    }

    end.map(|e| reply[start..e].to_string())
}

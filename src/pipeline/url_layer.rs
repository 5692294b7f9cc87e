//! URL Layer (SPEC_FULL.md §4.7). Extracts URLs from a command, resolves
//! each against the trusted-domain set, and decides whether the command is
//! eligible for a trusted-domain short-circuit.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"https?://[^ \t\n"'<>]+"#).expect("url extraction regex is a fixed literal")
});

/// Subdomains/hosting shapes that reintroduce user-controlled content even
/// under an otherwise-trusted parent domain.
static RISKY_SUBDOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^([a-z0-9-]+\.)?(s3\.amazonaws\.com|storage\.googleapis\.com|blob\.core\.windows\.net|github\.io|pages\.dev|vercel\.app|netlify\.app|surge\.sh|herokuapp\.com|glitch\.me|repl\.co)$",
    )
    .expect("risky-subdomain regex is a fixed literal")
});

/// URL path shapes that reintroduce user-controlled content on otherwise
/// trusted hosts: raw content endpoints, gist raw endpoints, release
/// download endpoints, and `get.<name>.sh`-style installer paths.
static RISKY_URL_PATTERN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)raw\.githubusercontent\.com|gist\.githubusercontent\.com|/releases/download/|get\.[\w.-]+\.sh\b",
    )
    .expect("risky-url-pattern regex is a fixed literal")
});

#[derive(Debug, Default)]
pub struct UrlAnalysis {
    pub urls: Vec<String>,
    pub trusted: Vec<String>,
    pub untrusted: Vec<String>,
    pub risky: Vec<String>,
}

impl UrlAnalysis {
    pub fn all_trusted(&self) -> bool {
        !self.urls.is_empty() && self.untrusted.is_empty()
    }

    pub fn has_risky_url(&self) -> bool {
        !self.risky.is_empty()
    }

    /// Eligible for a trusted-domain short-circuit only when every
    /// extracted URL is trusted, at least one URL was found, and none of
    /// them matched a risky URL pattern (SPEC_FULL.md §4.7).
    pub fn eligible_for_short_circuit(&self) -> bool {
        self.all_trusted() && !self.has_risky_url()
    }
}

/// Single-pass trim of trailing prose punctuation (`)`, `,`, `;`, a
/// trailing `.`), never stripping punctuation that appears mid-URL
/// (SPEC_FULL.md §4.7, §9's open question on conservative trimming).
fn trim_trailing_punctuation(raw: &str) -> &str {
    raw.trim_end_matches([')', ',', ';', '.'])
}

fn extract_urls(command: &str) -> Vec<String> {
    URL_RE
        .find_iter(command)
        .map(|m| trim_trailing_punctuation(m.as_str()).to_string())
        .collect()
}

fn is_trusted_host(host: &str, trusted_domains: &[String]) -> bool {
    if RISKY_SUBDOMAIN_RE.is_match(host) {
        return false;
    }
    trusted_domains
        .iter()
        .any(|domain| host.eq_ignore_ascii_case(domain) || host.to_ascii_lowercase().ends_with(&format!(".{}", domain.to_ascii_lowercase())))
}

/// Extracts every URL in `command` and classifies each against
/// `trusted_domains`. A URL that fails to parse is treated as untrusted.
pub fn analyze(command: &str, trusted_domains: &[String]) -> UrlAnalysis {
    let mut analysis = UrlAnalysis::default();

    for raw in extract_urls(command) {
        let is_risky_pattern = RISKY_URL_PATTERN_RE.is_match(&raw);
        if is_risky_pattern {
            analysis.risky.push(raw.clone());
        }

        let trusted = match Url::parse(&raw) {
            Ok(parsed) => parsed.host_str().is_some_and(|h| is_trusted_host(h, trusted_domains)),
            Err(_) => false,
        };

        if trusted {
            analysis.trusted.push(raw.clone());
        } else {
            analysis.untrusted.push(raw.clone());
        }

        analysis.urls.push(raw);
    }

    analysis
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains() -> Vec<String> {
        vec!["github.com".to_string(), "api.github.com".to_string()]
    }

    #[test]
    fn trusted_host_exact_match_is_trusted() {
        let a = analyze("curl https://api.github.com/users/octocat", &domains());
        assert!(a.eligible_for_short_circuit());
    }

    #[test]
    fn trusted_host_subdomain_suffix_is_trusted() {
        let a = analyze("curl https://api.github.com/repos", &["github.com".to_string()]);
        assert!(a.eligible_for_short_circuit());
    }

    #[test]
    fn untrusted_host_is_not_eligible() {
        let a = analyze("curl https://evil.example.com/x", &domains());
        assert!(!a.eligible_for_short_circuit());
        assert_eq!(a.untrusted.len(), 1);
    }

    #[test]
    fn risky_subdomain_suppresses_trust_even_under_trusted_parent() {
        let a = analyze("curl https://someuser.github.io/page", &["github.io".to_string()]);
        assert!(!a.trusted.contains(&"https://someuser.github.io/page".to_string()));
    }

    #[test]
    fn risky_url_pattern_suppresses_short_circuit_on_trusted_host() {
        let a = analyze(
            "curl https://raw.githubusercontent.com/foo/bar/main/install.sh",
            &["githubusercontent.com".to_string()],
        );
        assert!(a.has_risky_url());
        assert!(!a.eligible_for_short_circuit());
    }

    #[test]
    fn trailing_prose_punctuation_is_trimmed() {
        let a = analyze("see https://github.com/foo/bar.", &domains());
        assert_eq!(a.urls[0], "https://github.com/foo/bar");
    }

    #[test]
    fn unparseable_url_is_untrusted() {
        // The bracketed host looks like a trusted domain to a naive
        // substring check, but isn't a valid IPv6 literal, so `Url::parse`
        // rejects it. If the `Err(_) => false` branch were ever deleted or
        // replaced with a substring match, this URL would wrongly end up
        // trusted instead.
        let raw = "https://[github.com]/bad";
        assert!(Url::parse(raw).is_err());

        let a = analyze(&format!("curl {raw}"), &domains());
        assert_eq!(a.urls, vec![raw.to_string()]);
        assert_eq!(a.untrusted, vec![raw.to_string()]);
        assert!(a.trusted.is_empty());
    }

    #[test]
    fn no_urls_means_not_eligible() {
        let a = analyze("echo hello", &domains());
        assert!(!a.eligible_for_short_circuit());
        assert!(a.urls.is_empty());
    }

    #[test]
    fn multiple_urls_all_must_be_trusted() {
        let a = analyze(
            "curl https://api.github.com/a https://evil.example/b",
            &domains(),
        );
        assert!(!a.eligible_for_short_circuit());
    }
}

use regex::RegexBuilder;
use std::sync::LazyLock;

use crate::types::Severity;

pub struct HighRiskPattern {
    pub name: &'static str,
    pub regex: regex::Regex,
    pub severity: Severity,
    pub description: &'static str,
    pub risk: &'static str,
    pub legitimate_uses: &'static [&'static str],
}

fn compile(pattern: &str, case_insensitive: bool) -> regex::Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .unwrap_or_else(|e| panic!("built-in high-risk pattern '{pattern}' failed to compile: {e}"))
}

type RawPattern = (
    &'static str,
    &'static str,
    bool,
    Severity,
    &'static str,
    &'static str,
    &'static [&'static str],
);

fn build(raw: &'static [RawPattern]) -> Vec<HighRiskPattern> {
    raw.iter()
        .map(
            |(name, pattern, ci, severity, description, risk, uses)| HighRiskPattern {
                name,
                regex: compile(pattern, *ci),
                severity: *severity,
                description,
                risk,
                legitimate_uses: uses,
            },
        )
        .collect()
}

/// Reverse shells across common interpreters and networking tools.
const REVERSE_SHELL_RAW: &[RawPattern] = &[
    (
        "bash-dev-tcp",
        r"(bash|sh)\s+-[a-z]*i[a-z]*\s*>&\s*/dev/tcp/",
        true,
        Severity::Critical,
        "Interactive shell redirected over a raw TCP device file",
        "Gives a remote attacker an interactive shell on this machine.",
        &[],
    ),
    (
        "dev-tcp-redirect",
        r"/dev/tcp/[a-zA-Z0-9.\-]+/\d+",
        true,
        Severity::Critical,
        "Bash TCP device redirection to a remote host/port",
        "The canonical bash reverse-shell primitive.",
        &["Rare legitimate low-level network debugging"],
    ),
    (
        "nc-exec-shell",
        r"nc(\.traditional)?\s+.*-e\s+/bin/(ba)?sh",
        true,
        Severity::Critical,
        "netcat spawning a shell on connect",
        "Classic netcat reverse/bind shell.",
        &[],
    ),
    (
        "nc-listen-exec",
        r"nc\s+.*-[a-z]*l[a-z]*\s+.*-[a-z]*e",
        true,
        Severity::Critical,
        "netcat listening and executing on connection",
        "Opens a network-reachable shell backdoor.",
        &[],
    ),
    (
        "ncat-exec-shell",
        r"ncat\s+.*--sh-exec|ncat\s+.*-e\s+/bin/(ba)?sh",
        true,
        Severity::Critical,
        "ncat spawning a shell on connect",
        "Same reverse/bind-shell pattern via ncat.",
        &[],
    ),
    (
        "python-reverse-shell",
        r#"python[23]?\s+-c\s+.*socket.*(connect|SOCK_STREAM).*(subprocess|os\.system|pty\.spawn)"#,
        true,
        Severity::Critical,
        "Python one-liner opening a socket and spawning a shell",
        "Common fileless reverse-shell payload.",
        &[],
    ),
    (
        "perl-reverse-shell",
        r"perl\s+-e\s+.*socket.*exec",
        true,
        Severity::Critical,
        "Perl one-liner opening a socket and exec'ing a shell",
        "Common fileless reverse-shell payload.",
        &[],
    ),
    (
        "ruby-reverse-shell",
        r#"ruby\s+-r?socket\s+-e\s*.*TCPSocket.*exec"#,
        true,
        Severity::Critical,
        "Ruby one-liner opening a socket and exec'ing a shell",
        "Common fileless reverse-shell payload.",
        &[],
    ),
    (
        "php-reverse-shell",
        r"php\s+-r\s+.*fsockopen.*(exec|shell_exec|system)",
        true,
        Severity::Critical,
        "PHP one-liner opening a socket and running a shell command",
        "Common fileless reverse-shell payload.",
        &[],
    ),
    (
        "socat-reverse-shell",
        r"socat\s+.*exec:.*(/bin/(ba)?sh|cmd\.exe)",
        true,
        Severity::Critical,
        "socat piping a remote connection to a shell",
        "Full-duplex reverse/bind shell via socat.",
        &[],
    ),
    (
        "telnet-pipe-shell",
        r"telnet\s+[a-zA-Z0-9.\-]+\s+\d+\s*\|\s*/bin/(ba)?sh",
        true,
        Severity::Critical,
        "telnet piped directly into a shell",
        "Legacy reverse-shell construction using telnet as the transport.",
        &[],
    ),
];

/// Data exfiltration shapes: credentials or sensitive files leaving over the
/// network, DNS-tunnel heuristics, and unexpected outbound file transfer.
const DATA_EXFIL_RAW: &[RawPattern] = &[
    (
        "exfil-credential-var",
        r"(curl|wget|nc|ncat)\s+.*\$\{?\w*(API_?KEY|SECRET|TOKEN|PASSWORD|CREDENTIAL)\w*\}?",
        true,
        Severity::Critical,
        "Sending a credential-shaped environment variable over the network",
        "Likely exfiltration of an API key, secret, or password.",
        &[],
    ),
    (
        "exfil-env-pipe",
        r"env\s*\|\s*(curl|nc|ncat|wget)|printenv\s*\|\s*(curl|nc|ncat|wget)",
        true,
        Severity::Critical,
        "Piping the full process environment to a network tool",
        "Dumps every environment variable, including any secrets, off-host.",
        &[],
    ),
    (
        "exfil-private-key-pipe",
        r"cat\s+[^|]*(id_rsa|id_ed25519|\.pem|private[_-]?key)[^|]*\|\s*(curl|nc|ncat|wget)",
        true,
        Severity::Critical,
        "Piping private key material to a network tool",
        "Directly uploads private key material to a remote endpoint.",
        &[],
    ),
    (
        "exfil-sensitive-file-upload",
        r"(curl|wget).*[@<].*(\.env|\.pem|\.key|\.crt|id_rsa|id_ed25519|credentials|\.aws|\.ssh|\.gnupg|\.netrc)",
        true,
        Severity::Critical,
        "Uploading a sensitive file as part of a curl/wget request body",
        "Sends credential or key material to a remote server.",
        &[],
    ),
    (
        "exfil-dns-tunnel",
        r"dig\s+.*txt\s+.*\$\(|nslookup\s+.*\$\(|\$\(.*\)\.\S+\.(com|net|io|xyz)",
        true,
        Severity::High,
        "Encoding command output into a DNS query name",
        "A common technique for exfiltrating data around egress filtering.",
        &[],
    ),
    (
        "exfil-outbound-transfer",
        r"(scp|rsync)\s+.*\s+[a-zA-Z0-9._-]+@[a-zA-Z0-9.\-]+:",
        true,
        Severity::Medium,
        "Outbound file transfer to a remote host",
        "Could move sensitive project files off this machine.",
        &["Legitimate deployment or backup workflows"],
    ),
];

/// Cryptocurrency miner installation/execution shapes.
const CRYPTO_MINER_RAW: &[RawPattern] = &[
    (
        "miner-binary-names",
        r"\b(xmrig|minerd|cpuminer|cgminer|bfgminer|ethminer|nheqminer|t-rex|phoenixminer|lolminer)\b",
        true,
        Severity::Critical,
        "Reference to a well-known cryptocurrency miner binary",
        "Hijacks CPU/GPU for unauthorized mining, often as part of a supply-chain compromise.",
        &["Security research explicitly analyzing miner samples"],
    ),
    (
        "stratum-pool-url",
        r"stratum\+tcp://|stratum\+ssl://",
        true,
        Severity::Critical,
        "Mining pool connection string (stratum protocol)",
        "Configures a process to mine cryptocurrency using this machine's resources.",
        &[],
    ),
    (
        "miner-download-and-run",
        r"(curl|wget).*(xmrig|minerd|cpuminer|cryptonight)",
        true,
        Severity::Critical,
        "Downloading a miner payload by name",
        "Likely cryptojacking payload delivery.",
        &[],
    ),
];

/// Obfuscated-execution shapes: encoded payloads decoded and fed straight
/// into an interpreter, or dynamic `eval`/`exec` of fetched content.
const OBFUSCATED_EXECUTION_RAW: &[RawPattern] = &[
    (
        "base64-pipe-shell",
        r"base64\s+(-d|--decode)[^|]*\|\s*(bash|sh|zsh)|echo\s+\S+\s*\|\s*base64\s+(-d|--decode)\s*\|\s*(bash|sh|zsh)",
        true,
        Severity::Critical,
        "Base64-decoded content piped directly into a shell",
        "Hides the actual command being executed from casual inspection.",
        &[],
    ),
    (
        "base64-eval",
        r"eval\s*[\s$(`].*base64|base64.*\|\s*eval",
        true,
        Severity::Critical,
        "Base64-decoded content passed to eval",
        "Hides the actual command being executed from casual inspection.",
        &[],
    ),
    (
        "hex-decode-exec",
        r#"(echo|printf)\s+.*\\x[0-9a-f]{2}.*\|\s*(bash|sh)"#,
        true,
        Severity::High,
        "Hex-escaped payload piped into a shell",
        "Another obfuscation technique for hiding executed commands.",
        &[],
    ),
    (
        "python-exec-dynamic",
        r#"python[23]?\s+-c\s+.*(exec|eval)\s*\(\s*(__import__|compile)"#,
        true,
        Severity::High,
        "Python dynamically compiling and executing a string payload",
        "Can run arbitrary code not visible in the literal command text.",
        &[],
    ),
];

/// Destructive filesystem/process operations with no network component.
const DESTRUCTIVE_RAW: &[RawPattern] = &[
    (
        "rm-rf-root-or-home",
        r"rm\s+(-[a-z]*r[a-z]*f[a-z]*|-[a-z]*f[a-z]*r[a-z]*)\s+(/($|\s)|~($|\s|/\*)|\$HOME($|\s)|/\*\s*$)",
        true,
        Severity::Critical,
        "Recursive forced deletion of root, home, or everything under root",
        "Irrecoverable loss of the filesystem or the user's entire home directory.",
        &[],
    ),
    (
        "mkfs-device",
        r"mkfs(\.\w+)?\s+/dev/(sd|hd|nvme|vd)",
        true,
        Severity::Critical,
        "Formatting a block device",
        "Destroys all data on the target disk.",
        &["Intentional disk provisioning on a scratch/ephemeral volume"],
    ),
    (
        "dd-to-device",
        r"dd\s+.*of=/dev/(sd|hd|nvme|vd)",
        true,
        Severity::Critical,
        "Writing raw data directly to a disk device",
        "Can silently overwrite a partition table or entire disk.",
        &["Flashing a USB installer image on a throwaway device"],
    ),
    (
        "fork-bomb",
        r":\(\)\s*\{\s*:\s*\|\s*:\s*&?\s*\}\s*;\s*:|:\(\)\{:\|:&\};:",
        false,
        Severity::Critical,
        "Shell fork-bomb shape",
        "Exhausts process table/memory, crashing or freezing the machine.",
        &[],
    ),
    (
        "chmod-777-root",
        r"chmod\s+(-R\s+)?777\s+/($|\s)",
        true,
        Severity::High,
        "Recursive world-writable permissions from the filesystem root",
        "Breaks system security boundaries across every file on the machine.",
        &[],
    ),
    (
        "chown-root-recursive",
        r"chown\s+(-R\s+)?[^\s]+\s+/($|\s)",
        true,
        Severity::High,
        "Recursive ownership change from the filesystem root",
        "Can lock out the legitimate owner of system files.",
        &[],
    ),
];

/// Commands that target this guard's own install, config, or process —
/// anchored to command-position to avoid false positives from quoted
/// strings or echoed text (SPEC_FULL.md §4.5).
const SELF_PROTECTION_RAW: &[RawPattern] = &[
    (
        "self-uninstall",
        r"(^|[;&|]\s*)cmdsentry\s+uninstall\b",
        true,
        Severity::High,
        "Invoking this guard's own uninstall subcommand",
        "Removes the safety pipeline protecting this session.",
        &["A deliberate, user-initiated uninstall"],
    ),
    (
        "self-delete-files",
        r"(^|[;&|]\s*)rm\s+.*\.cmdsentry",
        true,
        Severity::High,
        "Deleting this guard's installation directory",
        "Disables the safety pipeline without going through `uninstall`.",
        &[],
    ),
    (
        "self-process-kill",
        r"(^|[;&|]\s*)(kill|pkill|killall)\s+.*cmdsentry",
        true,
        Severity::High,
        "Killing this guard's own process",
        "Could be used to race past the permission check for a later command.",
        &[],
    ),
    (
        "self-settings-overwrite",
        r"(^|[;&|]\s*)(>|cp\s|mv\s|tee\s).*\.claude/settings\.json",
        true,
        Severity::High,
        "Direct overwrite of the host agent's settings file",
        "Can remove the hook registration that invokes this guard.",
        &[],
    ),
];

pub static REVERSE_SHELL: LazyLock<Vec<HighRiskPattern>> =
    LazyLock::new(|| build(REVERSE_SHELL_RAW));
pub static DATA_EXFIL: LazyLock<Vec<HighRiskPattern>> = LazyLock::new(|| build(DATA_EXFIL_RAW));
pub static CRYPTO_MINER: LazyLock<Vec<HighRiskPattern>> =
    LazyLock::new(|| build(CRYPTO_MINER_RAW));
pub static OBFUSCATED_EXECUTION: LazyLock<Vec<HighRiskPattern>> =
    LazyLock::new(|| build(OBFUSCATED_EXECUTION_RAW));
pub static DESTRUCTIVE: LazyLock<Vec<HighRiskPattern>> = LazyLock::new(|| build(DESTRUCTIVE_RAW));
pub static SELF_PROTECTION: LazyLock<Vec<HighRiskPattern>> =
    LazyLock::new(|| build(SELF_PROTECTION_RAW));

/// Fixed family evaluation order (SPEC_FULL.md §4.5): reverse-shell,
/// data-exfiltration, crypto-miner, obfuscated-execution, destructive,
/// self-protection. First match across the whole corpus wins.
pub fn scan(command: &str) -> Option<&'static HighRiskPattern> {
    for family in [
        &*REVERSE_SHELL,
        &*DATA_EXFIL,
        &*CRYPTO_MINER,
        &*OBFUSCATED_EXECUTION,
        &*DESTRUCTIVE,
        &*SELF_PROTECTION,
    ] {
        if let Some(pattern) = family.iter().find(|p| p.regex.is_match(command)) {
            return Some(pattern);
        }
    }
    None
}

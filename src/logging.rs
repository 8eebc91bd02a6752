//! Ambient logging stack: `tracing` initialization and secret redaction. Grounded on the
//! teacher's `logging::manager::sanitize_log_text`, reimplemented locally since this crate does
//! not carry the `oatty_util` sibling crate the teacher delegates to.

use once_cell::sync::Lazy;
use regex::Regex;

const REDACTION_PLACEHOLDER: &str = "[REDACTED]";

/// Patterns for text that commonly embeds a secret: `Authorization: Bearer <token>`, generic
/// `key=value`/`token: value` pairs, and bare long hex/base64-ish tokens.
static BEARER_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(bearer)\s+[A-Za-z0-9._~+/=-]{8,}").unwrap());
static KEY_VALUE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)\b(token|api[_-]?key|secret|password)["']?\s*[:=]\s*["']?[A-Za-z0-9._~+/=-]{4,}"#).unwrap());

/// Scrubs text of anything that looks like a bearer token or a `key=value`/`key: value` secret,
/// replacing the secret portion with a fixed placeholder. Used before any user-facing error
/// message or log line is emitted (§7: "sensitive fields (tokens) are redacted in logs").
pub fn sanitize_log_text(text: &str) -> String {
    let after_bearer = BEARER_PATTERN.replace_all(text, |caps: &regex::Captures| format!("{} {REDACTION_PLACEHOLDER}", &caps[1]));
    KEY_VALUE_PATTERN
        .replace_all(&after_bearer, |caps: &regex::Captures| format!("{}={REDACTION_PLACEHOLDER}", &caps[1]))
        .into_owned()
}

/// Initializes the global `tracing` subscriber from `RUST_LOG` (or `info` if unset). Call once,
/// at process start.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

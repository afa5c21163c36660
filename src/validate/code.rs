//! Security Screening of Generated Code
//!
//! Deny-list screening over generated source. Each pattern names a
//! capability the sandbox must never grant (shell execution, dynamic
//! import, raw file or network access). The list is intentionally blunt:
//! false positives are acceptable, false negatives are not.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::types::ValidationError;

/// Denied pattern with the capability it would grant
struct DeniedPattern {
    regex: Regex,
    pattern: &'static str,
    capability: &'static str,
}

static DENIED_PATTERNS: LazyLock<Vec<DeniedPattern>> = LazyLock::new(|| {
    [
        (r"os\s*\.\s*system", "shell command execution"),
        (r"subprocess", "subprocess spawning"),
        (r"eval\s*\(", "dynamic expression evaluation"),
        (r"exec\s*\(", "dynamic code execution"),
        (r"__import__", "dynamic module import"),
        (r"open\s*\(", "raw file access"),
        (r"socket\.", "raw socket access"),
        (r"requests?\.", "outbound HTTP access"),
        (r"urllib", "outbound URL access"),
    ]
    .into_iter()
    .map(|(pattern, capability)| DeniedPattern {
        regex: Regex::new(pattern).expect("static deny-list pattern is valid"),
        pattern,
        capability,
    })
    .collect()
});

/// Screens generated source against the capability deny-list
#[derive(Debug, Default, Clone, Copy)]
pub struct CodeValidator;

impl CodeValidator {
    pub fn new() -> Self {
        Self
    }

    /// Reject code matching any denied pattern. The first match wins; the
    /// error names both the pattern and the capability it would grant.
    pub fn validate(&self, code: &str) -> Result<(), ValidationError> {
        for denied in DENIED_PATTERNS.iter() {
            if denied.regex.is_match(code) {
                debug!(
                    pattern = denied.pattern,
                    capability = denied.capability,
                    "Generated code matched denied pattern"
                );
                return Err(ValidationError::security(denied.pattern, denied.capability));
            }
        }
        Ok(())
    }
}

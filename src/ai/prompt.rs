//! Prompt Assembly and Response Extraction
//!
//! Builds the chat messages for one generation request, derives the
//! deterministic cache key used by the prompt-level response cache, and
//! strips markdown fencing from model output.

use sha2::{Digest, Sha256};

use super::provider::ChatMessage;
use crate::types::{GenerationOptions, TriggerInfo};

const SYSTEM_PROMPT: &str = "\
You are an expert Python developer generating MicroAgent classes for automated \
code analysis. Respond with complete, runnable Python source only. Do not add \
commentary outside the code.";

/// Build the message sequence for one trigger, folding caller options into
/// the user prompt in a stable order.
pub fn build_messages(trigger: &TriggerInfo, options: &GenerationOptions) -> Vec<ChatMessage> {
    let mut user = trigger.render_prompt();

    if !options.is_empty() {
        user.push_str("\n\nAdditional requirements:");
        // BTreeMap iteration keeps the prompt (and its cache key) stable
        for (key, value) in options {
            user.push_str(&format!("\n- {key}: {value}"));
        }
    }

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Cache key for prompt-level response caching: the class name plus a
/// digest over every message. Identical conversations always map to the
/// same key.
pub fn cache_key(class_name: &str, messages: &[ChatMessage]) -> String {
    let mut hasher = Sha256::new();
    for message in messages {
        hasher.update(message.role.as_bytes());
        hasher.update([0]);
        hasher.update(message.content.as_bytes());
        hasher.update([0]);
    }
    format!("{class_name}:{:x}", hasher.finalize())
}

/// Strip a markdown code fence from model output, if present. Models
/// regularly wrap source in ```` ```python ```` blocks despite being asked
/// not to.
pub fn extract_code(content: &str) -> String {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    // Drop the info string (e.g. "python") up to the first newline
    let body = match rest.split_once('\n') {
        Some((_, body)) => body,
        None => return trimmed.to_string(),
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim().to_string(),
        None => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn trigger() -> TriggerInfo {
        TriggerInfo::new(
            "PythonAnalyzer",
            "Python analyzer",
            "Generate a class named '{class_name}'.",
        )
    }

    #[test]
    fn test_messages_carry_rendered_template() {
        let messages = build_messages(&trigger(), &GenerationOptions::new());
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("PythonAnalyzer"));
        assert!(!messages[1].content.contains("{class_name}"));
    }

    #[test]
    fn test_options_are_folded_in_stable_order() {
        let options: GenerationOptions = BTreeMap::from([
            ("style".to_string(), serde_json::json!("pep8")),
            ("analysis_type".to_string(), serde_json::json!("security")),
        ]);
        let user = &build_messages(&trigger(), &options)[1].content;
        let analysis = user.find("analysis_type").unwrap();
        let style = user.find("style").unwrap();
        assert!(analysis < style);
    }

    #[test]
    fn test_cache_key_is_deterministic_and_content_sensitive() {
        let messages = build_messages(&trigger(), &GenerationOptions::new());
        let key = cache_key("PythonAnalyzer", &messages);
        assert_eq!(key, cache_key("PythonAnalyzer", &messages));
        assert!(key.starts_with("PythonAnalyzer:"));

        let other = vec![ChatMessage::user("different")];
        assert_ne!(key, cache_key("PythonAnalyzer", &other));
    }

    #[test]
    fn test_extract_code_strips_fences() {
        let fenced = "```python\nclass A(MicroAgent):\n    pass\n```";
        assert_eq!(extract_code(fenced), "class A(MicroAgent):\n    pass");

        let bare = "class A(MicroAgent):\n    pass";
        assert_eq!(extract_code(bare), bare);

        let no_lang = "```\nx = 1\n```";
        assert_eq!(extract_code(no_lang), "x = 1");
    }

    #[test]
    fn test_extract_code_tolerates_unterminated_fence() {
        let broken = "```python\nx = 1";
        assert_eq!(extract_code(broken), "x = 1");
    }
}

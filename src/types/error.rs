//! Unified Error Type System
//!
//! Centralized error types for the entire generation pipeline.
//! Every error carries a machine-readable type tag, structured details,
//! and an optional recovery hint so callers can report failures without
//! string-parsing messages.
//!
//! ## Propagation Policy
//!
//! - Validation and catalog-lookup failures are terminal: no retry
//! - Generation (LLM) failures are retried up to the configured limit
//! - Class-loading failures are terminal (retrying without changing the
//!   code is pointless)
//! - State save failures restore the backup before propagating
//!
//! No panic/unwrap: all errors are surfaced as values.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

// =============================================================================
// Validation Error
// =============================================================================

/// Which validation gate rejected the input or generated code
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationKind {
    /// Bad caller input (empty keyword, malformed options)
    Input { field: String },
    /// Generated code matched a denied capability pattern
    Security { pattern: String, capability: String },
    /// Generated code is missing required structural markers
    Structure { missing: Vec<String> },
    /// Generated code is missing required imports
    Imports { missing: Vec<String> },
    /// A trigger-specific validation rule failed (e.g. max_code_length)
    Rule { rule: String, detail: String },
}

/// Structured validation error with per-kind details
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub kind: ValidationKind,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

impl ValidationError {
    pub fn input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: ValidationKind::Input {
                field: field.into(),
            },
            message: message.into(),
        }
    }

    pub fn security(pattern: impl Into<String>, capability: impl Into<String>) -> Self {
        let capability = capability.into();
        let pattern = pattern.into();
        Self {
            message: format!("Security violation: {capability}"),
            kind: ValidationKind::Security {
                pattern,
                capability,
            },
        }
    }

    pub fn structure(missing: Vec<String>) -> Self {
        Self {
            message: format!("Missing required elements: {}", missing.join(", ")),
            kind: ValidationKind::Structure { missing },
        }
    }

    pub fn imports(missing: Vec<String>) -> Self {
        Self {
            message: format!("Missing required imports: {}", missing.join(", ")),
            kind: ValidationKind::Imports { missing },
        }
    }

    pub fn rule(rule: impl Into<String>, detail: impl Into<String>) -> Self {
        let rule = rule.into();
        let detail = detail.into();
        Self {
            message: format!("Validation rule '{rule}' failed: {detail}"),
            kind: ValidationKind::Rule { rule, detail },
        }
    }

    /// Structured details for error reports
    pub fn details(&self) -> Value {
        match &self.kind {
            ValidationKind::Input { field } => json!({ "field": field }),
            ValidationKind::Security {
                pattern,
                capability,
            } => json!({ "pattern": pattern, "capability": capability }),
            ValidationKind::Structure { missing } => json!({ "missing": missing }),
            ValidationKind::Imports { missing } => json!({ "missing_imports": missing }),
            ValidationKind::Rule { rule, detail } => json!({ "rule": rule, "detail": detail }),
        }
    }
}

// =============================================================================
// Application Error
// =============================================================================

#[derive(Debug, Error)]
pub enum ForgeError {
    // -------------------------------------------------------------------------
    // System Errors (auto From impl)
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Pipeline Errors
    // -------------------------------------------------------------------------
    #[error("{0}")]
    Validation(ValidationError),

    #[error("State error: {message}")]
    State { message: String },

    #[error("No trigger registered for keyword '{keyword}'")]
    TriggerNotFound { keyword: String },

    #[error("Unknown technology: {keyword}")]
    UnknownTechnology { keyword: String },

    #[error("Code generation failed: {message}")]
    CodeGeneration { message: String },

    #[error("Class loading failed for '{class_name}': {message}")]
    ClassLoading { class_name: String, message: String },

    #[error("LLM API error: {0}")]
    LlmApi(String),
}

impl From<ValidationError> for ForgeError {
    fn from(err: ValidationError) -> Self {
        ForgeError::Validation(err)
    }
}

pub type Result<T> = std::result::Result<T, ForgeError>;

impl ForgeError {
    /// Create a state error
    pub fn state(message: impl Into<String>) -> Self {
        Self::State {
            message: message.into(),
        }
    }

    /// Create a code generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::CodeGeneration {
            message: message.into(),
        }
    }

    /// Create a class loading error
    pub fn loading(class_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ClassLoading {
            class_name: class_name.into(),
            message: message.into(),
        }
    }

    /// Machine-readable error type tag
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Io(_) => "IoError",
            Self::Json(_) => "JsonError",
            Self::Config(_) => "ConfigError",
            Self::Validation(_) => "ValidationError",
            Self::State { .. } => "StateError",
            Self::TriggerNotFound { .. } => "TriggerNotFound",
            Self::UnknownTechnology { .. } => "UnknownTechnology",
            Self::CodeGeneration { .. } => "CodeGenerationError",
            Self::ClassLoading { .. } => "ClassLoadingError",
            Self::LlmApi(_) => "LlmApiError",
        }
    }

    /// Structured details for machine consumption
    pub fn details(&self) -> Value {
        match self {
            Self::Validation(v) => v.details(),
            Self::TriggerNotFound { keyword } | Self::UnknownTechnology { keyword } => {
                json!({ "keyword": keyword })
            }
            Self::ClassLoading { class_name, .. } => json!({ "class_name": class_name }),
            _ => json!({}),
        }
    }

    /// Human-oriented recovery hint
    pub fn recovery_hint(&self) -> Option<&'static str> {
        match self {
            Self::Validation(_) => Some("Check input requirements and constraints"),
            Self::State { .. } => Some("Verify state file integrity and permissions"),
            Self::TriggerNotFound { .. } | Self::UnknownTechnology { .. } => {
                Some("Register a trigger for this technology or refresh the catalog")
            }
            Self::CodeGeneration { .. } => Some("Check LLM service and prompt templates"),
            Self::ClassLoading { .. } => {
                Some("Inspect the generated source for structural problems")
            }
            Self::Config(_) => Some("Review configuration values"),
            _ => None,
        }
    }

    /// Whether a retry of the same operation can succeed.
    ///
    /// Validation, lookup, and loading failures are deterministic and must
    /// not be retried. Transport-level failures may resolve on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Io(_) | Self::LlmApi(_) | Self::CodeGeneration { .. }
        )
    }

    /// Serializable report for error histories and result metadata
    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            error_type: self.error_type().to_string(),
            message: self.to_string(),
            details: self.details(),
            recovery_hint: self.recovery_hint().map(str::to_string),
            timestamp: Utc::now(),
        }
    }
}

/// Serializable error snapshot appended to agent error histories
#[derive(Debug, Clone, Serialize)]
pub struct ErrorReport {
    pub error_type: String,
    pub message: String,
    pub details: Value,
    pub recovery_hint: Option<String>,
    pub timestamp: DateTime<Utc>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_type_tags() {
        assert_eq!(
            ForgeError::UnknownTechnology {
                keyword: "cobol".into()
            }
            .error_type(),
            "UnknownTechnology"
        );
        assert_eq!(
            ForgeError::generation("boom").error_type(),
            "CodeGenerationError"
        );
        assert_eq!(
            ForgeError::loading("PythonAnalyzer", "no attribute").error_type(),
            "ClassLoadingError"
        );
    }

    #[test]
    fn test_retryability() {
        assert!(ForgeError::LlmApi("503".into()).is_retryable());
        assert!(ForgeError::generation("timeout").is_retryable());
        assert!(
            !ForgeError::Validation(ValidationError::security("os\\.system", "shell"))
                .is_retryable()
        );
        assert!(
            !ForgeError::UnknownTechnology {
                keyword: "x".into()
            }
            .is_retryable()
        );
        assert!(!ForgeError::loading("A", "bad").is_retryable());
    }

    #[test]
    fn test_security_details_name_the_pattern() {
        let err: ForgeError = ValidationError::security("os\\s*\\.\\s*system", "shell").into();
        assert_eq!(err.details()["pattern"], "os\\s*\\.\\s*system");
    }

    #[test]
    fn test_structure_details_list_all_missing() {
        let err: ForgeError =
            ValidationError::structure(vec!["class definition".into(), "run method".into()])
                .into();
        let missing = err.details()["missing"].as_array().unwrap().clone();
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn test_report_shape() {
        let report = ForgeError::state("corrupt file").report();
        assert_eq!(report.error_type, "StateError");
        assert!(report.recovery_hint.is_some());
        let value = serde_json::to_value(&report).unwrap();
        assert!(value.get("timestamp").is_some());
    }
}

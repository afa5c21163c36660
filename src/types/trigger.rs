//! Trigger Metadata
//!
//! A trigger binds a technology keyword to everything needed to synthesize
//! an agent for it: the class name the LLM must produce, the prompt template,
//! required imports, and validation rules. Triggers are immutable once
//! published: the catalog shares them as `Arc<TriggerInfo>` and only bumps
//! `version`/`last_updated` when the dynamic portion is regenerated.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder substituted into prompt templates
pub const CLASS_NAME_PLACEHOLDER: &str = "{class_name}";

/// Validation rules attached to a trigger.
///
/// `max_code_length` is enforced by the validator; the remaining rules are
/// advisory metadata surfaced to generated agents and dashboards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ValidationRules {
    /// Maximum accepted length of generated source, in bytes
    pub max_code_length: Option<usize>,
    /// Analysis types the generated agent is expected to support
    pub required_analysis_types: Vec<String>,
    /// Free-form rules carried through to result metadata
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Immutable-once-created record describing how to synthesize one agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TriggerInfo {
    /// Name of the class the LLM must generate (e.g. `PythonAnalyzer`)
    pub class_name: String,
    /// Human description of the agent's specialty
    pub description: String,
    /// Format string with a `{class_name}` placeholder
    pub prompt_template: String,
    /// Input field names the generated agent accepts
    pub inputs: Vec<String>,
    /// Output field names the generated agent produces
    pub outputs: Vec<String>,
    /// Module names that must appear as `import X` or `from X` in the code
    pub required_imports: Vec<String>,
    /// Named predicates over generated code and inputs
    pub validation_rules: ValidationRules,
    /// Provenance metadata (registry entry, category, version info)
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    /// Bumped when the catalog regenerates this entry
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "Utc::now")]
    pub last_updated: DateTime<Utc>,
}

fn default_version() -> u32 {
    1
}

impl TriggerInfo {
    /// Create a trigger with empty rules and metadata
    pub fn new(
        class_name: impl Into<String>,
        description: impl Into<String>,
        prompt_template: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            description: description.into(),
            prompt_template: prompt_template.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            required_imports: Vec::new(),
            validation_rules: ValidationRules::default(),
            metadata: BTreeMap::new(),
            version: 1,
            last_updated: Utc::now(),
        }
    }

    pub fn with_inputs(mut self, inputs: &[&str]) -> Self {
        self.inputs = inputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_outputs(mut self, outputs: &[&str]) -> Self {
        self.outputs = outputs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_required_imports(mut self, imports: &[&str]) -> Self {
        self.required_imports = imports.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_rules(mut self, rules: ValidationRules) -> Self {
        self.validation_rules = rules;
        self
    }

    pub fn with_metadata(mut self, metadata: BTreeMap<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }

    /// Render the prompt template with the class name substituted
    pub fn render_prompt(&self) -> String {
        self.prompt_template
            .replace(CLASS_NAME_PLACEHOLDER, &self.class_name)
    }

    /// Mark the trigger as regenerated (catalog refresh)
    pub fn bump_version(&mut self) {
        self.version += 1;
        self.last_updated = Utc::now();
    }
}

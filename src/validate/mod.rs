//! Generated Code Validation
//!
//! Multi-stage validation applied to LLM output before anything is loaded:
//!
//! 1. **Security**: capability deny-list ([`CodeValidator`])
//! 2. **Structure**: agent skeleton markers ([`StructureValidator`])
//! 3. **Imports**: every trigger-required module is imported
//! 4. **Rules**: trigger-specific limits such as `max_code_length`
//!
//! Stages run in order and stop at the first failing stage; within the
//! structure stage all missing markers are reported together. The outcome
//! records a pass/fail flag per stage so agent records can show exactly
//! how far a rejected generation got.

pub mod code;
pub mod structure;

pub use code::CodeValidator;
pub use structure::StructureValidator;

use std::collections::BTreeMap;
use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::types::{TriggerInfo, ValidationError};

/// Per-stage results of one validation pass
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// Stage name → passed. Stages after the first failure are absent.
    pub checks: BTreeMap<String, bool>,
    pub duration_ms: u64,
}

impl ValidationOutcome {
    pub fn passed(&self) -> bool {
        self.checks.values().all(|&ok| ok)
    }
}

/// Runs the full validation pipeline against one trigger's requirements
#[derive(Debug, Default, Clone, Copy)]
pub struct AgentValidator {
    security: CodeValidator,
    structure: StructureValidator,
}

impl AgentValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate generated source against the trigger. Returns the per-stage
    /// outcome alongside the first failure, if any.
    pub fn validate(
        &self,
        code: &str,
        trigger: &TriggerInfo,
    ) -> (ValidationOutcome, Option<ValidationError>) {
        let started = Instant::now();
        let mut checks = BTreeMap::new();
        let error = self.run_stages(code, trigger, &mut checks).err();

        let outcome = ValidationOutcome {
            checks,
            duration_ms: started.elapsed().as_millis() as u64,
        };
        debug!(
            class_name = %trigger.class_name,
            passed = outcome.passed(),
            duration_ms = outcome.duration_ms,
            "Validation finished"
        );
        (outcome, error)
    }

    fn run_stages(
        &self,
        code: &str,
        trigger: &TriggerInfo,
        checks: &mut BTreeMap<String, bool>,
    ) -> Result<(), ValidationError> {
        stage(checks, "security", || self.security.validate(code))?;
        stage(checks, "structure", || self.structure.validate(code))?;
        stage(checks, "imports", || check_imports(code, trigger))?;
        stage(checks, "rules", || check_rules(code, trigger))?;
        Ok(())
    }
}

fn stage(
    checks: &mut BTreeMap<String, bool>,
    name: &str,
    check: impl FnOnce() -> Result<(), ValidationError>,
) -> Result<(), ValidationError> {
    let result = check();
    checks.insert(name.to_string(), result.is_ok());
    result
}

/// Every required module must appear as `import X` or `from X`
fn check_imports(code: &str, trigger: &TriggerInfo) -> Result<(), ValidationError> {
    let missing: Vec<String> = trigger
        .required_imports
        .iter()
        .filter(|module| {
            !code.contains(&format!("import {module}")) && !code.contains(&format!("from {module}"))
        })
        .cloned()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::imports(missing))
    }
}

fn check_rules(code: &str, trigger: &TriggerInfo) -> Result<(), ValidationError> {
    if let Some(max_len) = trigger.validation_rules.max_code_length
        && code.len() > max_len
    {
        return Err(ValidationError::rule(
            "max_code_length",
            format!("generated code is {} bytes, limit is {max_len}", code.len()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ValidationKind, ValidationRules};

    const VALID: &str = "\
import ast
from pylint import lint

class PythonAnalyzer(MicroAgent):
    def __init__(self):
        super().__init__(name='python_analyzer')

    def run(self, data):
        tree = ast.parse(data['code_snippet'])
        return {'analysis_report': ast.dump(tree), 'suggestions': []}
";

    fn trigger() -> TriggerInfo {
        TriggerInfo::new("PythonAnalyzer", "Python analyzer", "{class_name}")
            .with_required_imports(&["ast", "pylint"])
            .with_rules(ValidationRules {
                max_code_length: Some(10_000),
                ..Default::default()
            })
    }

    #[test]
    fn test_valid_code_passes_all_stages() {
        let (outcome, error) = AgentValidator::new().validate(VALID, &trigger());
        assert!(error.is_none());
        assert!(outcome.passed());
        assert_eq!(outcome.checks.len(), 4);
        assert!(outcome.checks.values().all(|&ok| ok));
    }

    #[test]
    fn test_security_failure_stops_the_pipeline() {
        let code = format!("{VALID}\nos.system('ls')\n");
        let (outcome, error) = AgentValidator::new().validate(&code, &trigger());
        assert!(matches!(
            error.unwrap().kind,
            ValidationKind::Security { .. }
        ));
        assert_eq!(outcome.checks.get("security"), Some(&false));
        // Later stages never ran
        assert!(!outcome.checks.contains_key("structure"));
        assert!(!outcome.passed());
    }

    #[test]
    fn test_missing_import_is_reported() {
        let code = VALID.replace("from pylint import lint\n", "");
        let (outcome, error) = AgentValidator::new().validate(&code, &trigger());
        match error.unwrap().kind {
            ValidationKind::Imports { missing } => assert_eq!(missing, vec!["pylint"]),
            other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(outcome.checks.get("imports"), Some(&false));
        assert_eq!(outcome.checks.get("security"), Some(&true));
    }

    #[test]
    fn test_from_import_satisfies_requirement() {
        // `from pylint import lint` counts for "pylint"
        let (_, error) = AgentValidator::new().validate(VALID, &trigger());
        assert!(error.is_none());
    }

    #[test]
    fn test_max_code_length_rule() {
        let mut trigger = trigger();
        trigger.validation_rules.max_code_length = Some(64);
        let (outcome, error) = AgentValidator::new().validate(VALID, &trigger);
        match error.unwrap().kind {
            ValidationKind::Rule { rule, .. } => assert_eq!(rule, "max_code_length"),
            other => panic!("unexpected kind: {other:?}"),
        }
        assert_eq!(outcome.checks.get("rules"), Some(&false));
    }

    #[test]
    fn test_outcome_serializes_for_agent_records() {
        let (outcome, _) = AgentValidator::new().validate(VALID, &trigger());
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["checks"]["security"], true);
        assert!(value["duration_ms"].is_u64());
    }
}

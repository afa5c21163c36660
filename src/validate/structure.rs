//! Structural Markers of a Well-Formed Agent
//!
//! Checks that generated source contains every structural marker a loadable
//! agent class needs. All missing markers are collected before reporting, so
//! one round of regeneration can fix everything at once.

use tracing::debug;

use crate::types::ValidationError;

/// Marker substring paired with the human name used in error reports
const REQUIRED_ELEMENTS: &[(&str, &str)] = &[
    ("class", "class definition"),
    ("MicroAgent", "MicroAgent inheritance"),
    ("def run", "run method"),
    ("def __init__", "constructor"),
    ("super().__init__", "parent initialization"),
];

/// Verifies generated source carries the full agent skeleton
#[derive(Debug, Default, Clone, Copy)]
pub struct StructureValidator;

impl StructureValidator {
    pub fn new() -> Self {
        Self
    }

    /// Check every marker and report all missing ones together
    pub fn validate(&self, code: &str) -> Result<(), ValidationError> {
        let missing: Vec<String> = REQUIRED_ELEMENTS
            .iter()
            .filter(|(marker, _)| !code.contains(marker))
            .map(|(_, name)| name.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            debug!(?missing, "Generated code is structurally incomplete");
            Err(ValidationError::structure(missing))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationKind;

    const COMPLETE: &str = "\
class ReactAnalyzer(MicroAgent):
    def __init__(self):
        super().__init__(name='react_analyzer')

    def run(self, data):
        return {'analysis_report': 'ok'}
";

    #[test]
    fn test_complete_skeleton_passes() {
        assert!(StructureValidator::new().validate(COMPLETE).is_ok());
    }

    #[test]
    fn test_reports_all_missing_elements() {
        let err = StructureValidator::new()
            .validate("def run(self, data):\n    return {}")
            .unwrap_err();
        match err.kind {
            ValidationKind::Structure { missing } => {
                assert_eq!(
                    missing,
                    vec![
                        "class definition",
                        "MicroAgent inheritance",
                        "constructor",
                        "parent initialization",
                    ]
                );
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }

    #[test]
    fn test_single_missing_element() {
        let code = COMPLETE.replace("super().__init__(name='react_analyzer')", "pass");
        let err = StructureValidator::new().validate(&code).unwrap_err();
        assert!(err.to_string().contains("parent initialization"));
    }

    #[test]
    fn test_empty_code_misses_everything() {
        let err = StructureValidator::new().validate("").unwrap_err();
        match err.kind {
            ValidationKind::Structure { missing } => {
                assert_eq!(missing.len(), REQUIRED_ELEMENTS.len())
            }
            other => panic!("unexpected kind: {other:?}"),
        }
    }
}

//! Core Domain Types
//!
//! Shared data model for the generation pipeline: error taxonomy, trigger
//! metadata, and agent lifecycle records.

pub mod agent;
pub mod error;
pub mod trigger;

pub use agent::{AgentInfo, AgentStatus, ErrorRecord};
pub use error::{ErrorReport, ForgeError, Result, ValidationError, ValidationKind};
pub use trigger::{CLASS_NAME_PLACEHOLDER, TriggerInfo, ValidationRules};

use std::collections::BTreeMap;

/// Caller-supplied generation options.
///
/// A `BTreeMap` keeps key order canonical, so serializing the options is a
/// stable cache-key component.
pub type GenerationOptions = BTreeMap<String, serde_json::Value>;

//! Agent Lifecycle Records
//!
//! Per-keyword bookkeeping owned by the `KeywordManager`: when the agent
//! was first generated, when it was last touched, and an append-only
//! history of failures. These records are persisted through `StateManager`
//! after every mutation, so a crash never loses an acknowledged update.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Lifecycle status of a per-keyword agent record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AgentStatus {
    /// Agent generated (or generation in progress) and usable
    #[default]
    Active,
    /// Last generation attempt failed
    Error,
    /// Existing record was looked up again
    Retrieved,
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Error => write!(f, "error"),
            Self::Retrieved => write!(f, "retrieved"),
        }
    }
}

/// One timestamped failure in an agent's history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorRecord {
    pub timestamp: DateTime<Utc>,
    pub error: String,
}

/// Per-keyword lifecycle record.
///
/// Created on the first generation attempt for a keyword (successful or
/// not), updated on every subsequent attempt, deleted only via explicit
/// keyword removal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentInfo {
    pub keyword: String,
    pub status: AgentStatus,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub validation_results: BTreeMap<String, bool>,
    /// Append-only log of timestamped failures
    #[serde(default)]
    pub error_history: Vec<ErrorRecord>,
}

impl AgentInfo {
    /// Create a fresh record with status `Active`
    pub fn new(keyword: impl Into<String>, metadata: BTreeMap<String, Value>) -> Self {
        let now = Utc::now();
        Self {
            keyword: keyword.into(),
            status: AgentStatus::Active,
            created_at: now,
            last_accessed: now,
            metadata,
            validation_results: BTreeMap::new(),
            error_history: Vec::new(),
        }
    }

    /// Merge metadata: new keys overwrite old, prior keys survive
    pub fn merge_metadata(&mut self, metadata: BTreeMap<String, Value>) {
        self.metadata.extend(metadata);
    }

    /// Append a failure without erasing prior history
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.error_history.push(ErrorRecord {
            timestamp: Utc::now(),
            error: error.into(),
        });
    }

    pub fn touch(&mut self) {
        self.last_accessed = Utc::now();
    }
}

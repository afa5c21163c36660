//! Keyword and Agent Lifecycle Management
//!
//! Maps free-text input to known technology keywords and tracks the
//! per-keyword agent lifecycle (`AgentInfo`) through `StateManager`.
//!
//! ## Detection
//!
//! Input and keywords are normalized to lowercase word tokens; the score
//! for a keyword is the size of the token-set intersection with the input.
//! The keyword with the maximum positive score wins. Ties are broken
//! lexicographically (smallest keyword wins): the keyword table is a
//! `BTreeMap`, so iteration order is deterministic and the first maximal
//! score seen is the lexicographically smallest.
//!
//! ## Durability
//!
//! Every mutating operation persists the full in-memory table before
//! returning, so a crash immediately after a successful call never loses
//! that call's effect.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::{LazyLock, Mutex};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use crate::state::StateManager;
use crate::types::{AgentInfo, AgentStatus, ForgeError, Result, ValidationError};

static WORD_TOKENS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\w+").expect("static token pattern is valid"));

static KEYWORD_FORMAT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]+$").expect("static keyword pattern is valid"));

/// Persisted keyword table: keyword → description plus agent records
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct KeywordState {
    pub keywords: BTreeMap<String, String>,
    pub agents: BTreeMap<String, AgentInfo>,
}

/// Outcome of an idempotent `get_or_create_agent` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentLifecycle {
    /// First call for this keyword: a fresh `AgentInfo` was created
    Created,
    /// Record existed: `last_accessed` bumped, metadata merged
    Retrieved,
}

impl std::fmt::Display for AgentLifecycle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Retrieved => write!(f, "retrieved"),
        }
    }
}

/// Keyword detection and agent lifecycle bookkeeping
pub struct KeywordManager {
    table: Mutex<KeywordState>,
    store: StateManager<KeywordState>,
}

impl KeywordManager {
    /// Open the manager over an existing store
    pub fn new(store: StateManager<KeywordState>) -> Result<Self> {
        let table = store.load()?.data;
        Ok(Self {
            table: Mutex::new(table),
            store,
        })
    }

    /// Open and seed the keyword table with catalog entries not yet known.
    /// Seeding is persisted immediately.
    pub fn with_seed<'a>(
        store: StateManager<KeywordState>,
        seed: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let manager = Self::new(store)?;
        {
            let mut table = manager.lock();
            let mut changed = false;
            for (keyword, description) in seed {
                if !table.keywords.contains_key(keyword) {
                    table
                        .keywords
                        .insert(keyword.to_string(), description.to_string());
                    changed = true;
                }
            }
            if changed {
                manager.store.save(&table)?;
            }
        }
        Ok(manager)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, KeywordState> {
        self.table.lock().unwrap_or_else(|e| e.into_inner())
    }

    // =========================================================================
    // Keyword table
    // =========================================================================

    /// Add a keyword. Rejects malformed names and duplicates.
    pub fn add_keyword(&self, keyword: &str, description: &str) -> Result<()> {
        if !KEYWORD_FORMAT.is_match(keyword) {
            return Err(ValidationError::input(
                "keyword",
                format!("Invalid keyword format: {keyword}"),
            )
            .into());
        }
        let mut table = self.lock();
        if table.keywords.contains_key(keyword) {
            return Err(ValidationError::input(
                "keyword",
                format!("Keyword '{keyword}' already exists"),
            )
            .into());
        }
        table
            .keywords
            .insert(keyword.to_string(), description.to_string());
        self.store.save(&table)?;
        info!(keyword, "Added keyword");
        Ok(())
    }

    /// Remove a keyword and its agent record
    pub fn remove_keyword(&self, keyword: &str) -> Result<()> {
        let mut table = self.lock();
        if table.keywords.remove(keyword).is_none() {
            return Err(ForgeError::UnknownTechnology {
                keyword: keyword.to_string(),
            });
        }
        table.agents.remove(keyword);
        self.store.save(&table)?;
        info!(keyword, "Removed keyword");
        Ok(())
    }

    /// List keywords, optionally filtered by a case-insensitive regex matched
    /// against the keyword or its description. An invalid pattern logs a
    /// warning and returns the unfiltered table.
    pub fn list_keywords(&self, pattern: Option<&str>) -> BTreeMap<String, String> {
        let table = self.lock();
        match pattern {
            Some(raw) => match Regex::new(&format!("(?i){raw}")) {
                Ok(regex) => table
                    .keywords
                    .iter()
                    .filter(|(k, v)| regex.is_match(k) || regex.is_match(v))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
                Err(e) => {
                    warn!(pattern = raw, error = %e, "Invalid keyword filter pattern");
                    table.keywords.clone()
                }
            },
            None => table.keywords.clone(),
        }
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.lock().keywords.contains_key(keyword)
    }

    // =========================================================================
    // Detection
    // =========================================================================

    /// Detect the best-matching known keyword in free text.
    ///
    /// Returns `None` when no keyword shares a single token with the input.
    pub fn detect(&self, input: &str) -> Option<String> {
        let input_tokens = tokenize(input);
        if input_tokens.is_empty() {
            return None;
        }

        let table = self.lock();
        let mut best: Option<(&String, usize)> = None;
        for keyword in table.keywords.keys() {
            let overlap = tokenize(keyword)
                .intersection(&input_tokens)
                .count();
            if overlap == 0 {
                continue;
            }
            // Strict greater-than keeps the first (lexicographically
            // smallest) keyword on ties
            if best.map(|(_, score)| overlap > score).unwrap_or(true) {
                best = Some((keyword, overlap));
            }
        }

        match best {
            Some((keyword, score)) => {
                debug!(keyword, score, "Detected keyword");
                Some(keyword.clone())
            }
            None => {
                debug!(input, "No keyword detected");
                None
            }
        }
    }

    // =========================================================================
    // Agent lifecycle
    // =========================================================================

    /// Get or create the agent record for a keyword. Idempotent: the first
    /// call creates an `Active` record, repeated calls bump `last_accessed`
    /// and merge metadata without erasing history.
    pub fn get_or_create_agent(
        &self,
        keyword: &str,
        metadata: BTreeMap<String, Value>,
    ) -> Result<AgentLifecycle> {
        let mut table = self.lock();
        if !table.keywords.contains_key(keyword) {
            return Err(ForgeError::UnknownTechnology {
                keyword: keyword.to_string(),
            });
        }

        let lifecycle = match table.agents.get_mut(keyword) {
            Some(agent) => {
                agent.touch();
                agent.merge_metadata(metadata);
                agent.status = AgentStatus::Retrieved;
                AgentLifecycle::Retrieved
            }
            None => {
                table
                    .agents
                    .insert(keyword.to_string(), AgentInfo::new(keyword, metadata));
                AgentLifecycle::Created
            }
        };

        self.store.save(&table)?;
        info!(keyword, %lifecycle, "Agent record");
        Ok(lifecycle)
    }

    /// Update an agent's status, appending to its error history when an
    /// error message is supplied. A missing record is a no-op (the caller
    /// may race with keyword removal).
    pub fn update_agent_status(
        &self,
        keyword: &str,
        status: AgentStatus,
        error: Option<&str>,
    ) -> Result<()> {
        let mut table = self.lock();
        let Some(agent) = table.agents.get_mut(keyword) else {
            warn!(keyword, "No agent record to update");
            return Ok(());
        };
        agent.status = status;
        agent.touch();
        if let Some(message) = error {
            agent.record_error(message);
        }
        self.store.save(&table)?;
        info!(keyword, %status, "Updated agent status");
        Ok(())
    }

    /// Record the validation outcome of the latest generation attempt
    pub fn record_validation_results(
        &self,
        keyword: &str,
        results: &BTreeMap<String, bool>,
    ) -> Result<()> {
        let mut table = self.lock();
        let Some(agent) = table.agents.get_mut(keyword) else {
            return Ok(());
        };
        agent.validation_results = results.clone();
        self.store.save(&table)?;
        Ok(())
    }

    /// Snapshot of one agent record
    pub fn agent(&self, keyword: &str) -> Option<AgentInfo> {
        self.lock().agents.get(keyword).cloned()
    }

    /// Display view of all agent records, optionally with error histories
    pub fn show_agents(&self, include_history: bool) -> BTreeMap<String, Value> {
        let table = self.lock();
        table
            .agents
            .iter()
            .map(|(keyword, agent)| {
                let mut view = json!({
                    "status": agent.status,
                    "created_at": agent.created_at,
                    "last_accessed": agent.last_accessed,
                    "metadata": agent.metadata,
                    "validation_results": agent.validation_results,
                });
                if include_history && !agent.error_history.is_empty() {
                    view["error_history"] = json!(agent.error_history);
                }
                (keyword.clone(), view)
            })
            .collect()
    }
}

/// Lowercase word tokens of a text
fn tokenize(text: &str) -> BTreeSet<String> {
    let lowered = text.to_lowercase();
    WORD_TOKENS
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

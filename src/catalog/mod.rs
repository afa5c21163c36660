//! Trigger Catalog
//!
//! Maps a technology keyword to the `TriggerInfo` needed to synthesize an
//! agent for it. The catalog has two layers:
//!
//! - **Static triggers** compiled in at startup (python, react)
//! - **Dynamic triggers** derived from validated entries of the external
//!   `TechnologyRegistry`
//!
//! Static entries always win on key collision. Lookups go through a TTL
//! cache; a cache miss rebuilds the dynamic portion from the in-memory
//! registry snapshot, never from the external registry itself; the
//! external fetch happens only on an explicit `refresh()`.
//!
//! Published triggers are shared as `Arc<TriggerInfo>` and never mutated;
//! a refresh replaces entries and bumps their `version`.

pub mod registry;

pub use registry::{FileRegistry, RegistryData, StaticRegistry, TechnologyEntry, TechnologyRegistry};

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{debug, info};

use crate::cache::Cache;
use crate::types::{Result, TriggerInfo, ValidationRules};

/// Default TTL for trigger lookups
pub const DEFAULT_LOOKUP_TTL: Duration =
    Duration::from_secs(crate::constants::cache::CATALOG_TTL_SECS);

/// Keyword → trigger table with a static core and a registry-derived layer
pub struct TriggerCatalog {
    static_triggers: BTreeMap<String, Arc<TriggerInfo>>,
    /// Manually registered triggers; survive refresh, yield to static
    registered: RwLock<BTreeMap<String, Arc<TriggerInfo>>>,
    /// Triggers derived from the registry snapshot
    dynamic: RwLock<BTreeMap<String, Arc<TriggerInfo>>>,
    /// Last registry snapshot, used to rebuild `dynamic` without refetching
    snapshot: RwLock<Vec<TechnologyEntry>>,
    registry: Option<Arc<dyn TechnologyRegistry>>,
    lookup_cache: Cache<String, Arc<TriggerInfo>>,
}

impl TriggerCatalog {
    /// Catalog with the built-in static triggers only
    pub fn builtin() -> Self {
        Self::new(None, DEFAULT_LOOKUP_TTL)
    }

    /// Catalog with an optional registry for dynamic triggers
    pub fn new(registry: Option<Arc<dyn TechnologyRegistry>>, lookup_ttl: Duration) -> Self {
        Self {
            static_triggers: builtin_triggers(),
            registered: RwLock::new(BTreeMap::new()),
            dynamic: RwLock::new(BTreeMap::new()),
            snapshot: RwLock::new(Vec::new()),
            registry,
            lookup_cache: Cache::new(lookup_ttl),
        }
    }

    /// Register a trigger at runtime. Static entries still take precedence
    /// on lookup; the registration survives catalog refreshes.
    pub fn register(&self, keyword: &str, info: TriggerInfo) {
        let keyword = keyword.to_lowercase();
        debug!(keyword, class_name = %info.class_name, "Registering trigger");
        self.registered
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(keyword.clone(), Arc::new(info));
        self.lookup_cache.clear();
    }

    /// Resolve a keyword to its trigger.
    ///
    /// Precedence: static > registered > dynamic. A cache miss rebuilds the
    /// dynamic layer from the in-memory snapshot; the external registry is
    /// only consulted by `refresh()`.
    pub fn lookup(&self, keyword: &str) -> Option<Arc<TriggerInfo>> {
        let keyword = keyword.to_lowercase();
        if let Some(hit) = self.lookup_cache.get(&keyword) {
            return Some(hit);
        }

        self.rebuild_dynamic_from_snapshot();

        let resolved = self
            .static_triggers
            .get(&keyword)
            .cloned()
            .or_else(|| {
                self.registered
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(&keyword)
                    .cloned()
            })
            .or_else(|| {
                self.dynamic
                    .read()
                    .unwrap_or_else(|e| e.into_inner())
                    .get(&keyword)
                    .cloned()
            })?;

        self.lookup_cache.set(keyword, Arc::clone(&resolved));
        Some(resolved)
    }

    pub fn contains(&self, keyword: &str) -> bool {
        self.lookup(keyword).is_some()
    }

    /// Fetch validated registry entries and regenerate the dynamic layer.
    /// Returns the number of dynamic triggers after the refresh.
    pub fn refresh(&self) -> Result<usize> {
        let Some(registry) = &self.registry else {
            debug!("No registry configured; refresh only clears the lookup cache");
            self.lookup_cache.clear();
            return Ok(0);
        };

        let entries = registry.list_entries(true)?;
        info!(entries = entries.len(), "Refreshing dynamic triggers");
        {
            let mut snapshot = self.snapshot.write().unwrap_or_else(|e| e.into_inner());
            *snapshot = entries;
        }
        let count = self.rebuild_dynamic_from_snapshot();
        self.lookup_cache.clear();
        Ok(count)
    }

    /// Rebuild the dynamic trigger map from the held snapshot. Existing
    /// entries keep their identity when unchanged; changed entries get a
    /// version bump.
    fn rebuild_dynamic_from_snapshot(&self) -> usize {
        let snapshot = self.snapshot.read().unwrap_or_else(|e| e.into_inner());
        let mut dynamic = self.dynamic.write().unwrap_or_else(|e| e.into_inner());

        let mut next: BTreeMap<String, Arc<TriggerInfo>> = BTreeMap::new();
        for entry in snapshot.iter() {
            let keyword = entry.name.to_lowercase();
            let mut derived = derive_trigger(entry);
            if let Some(existing) = dynamic.get(&keyword) {
                if existing.prompt_template == derived.prompt_template
                    && existing.metadata == derived.metadata
                {
                    next.insert(keyword, Arc::clone(existing));
                    continue;
                }
                derived.version = existing.version;
                derived.bump_version();
            }
            next.insert(keyword, Arc::new(derived));
        }
        *dynamic = next;
        dynamic.len()
    }

    /// All actionable keywords with their descriptions, for seeding the
    /// keyword store. Static entries shadow dynamic ones here as well.
    pub fn keywords(&self) -> Vec<(String, String)> {
        let mut merged: BTreeMap<String, String> = BTreeMap::new();
        for (keyword, trigger) in self
            .dynamic
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
        {
            merged.insert(keyword.clone(), trigger.description.clone());
        }
        for (keyword, trigger) in self
            .registered
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
        {
            merged.insert(keyword.clone(), trigger.description.clone());
        }
        for (keyword, trigger) in &self.static_triggers {
            merged.insert(keyword.clone(), trigger.description.clone());
        }
        merged.into_iter().collect()
    }
}

// =============================================================================
// Static triggers
// =============================================================================

fn builtin_triggers() -> BTreeMap<String, Arc<TriggerInfo>> {
    let mut triggers = BTreeMap::new();

    triggers.insert(
        "python".to_string(),
        Arc::new(
            TriggerInfo::new(
                "PythonAnalyzer",
                "Advanced Python code analyzer for best practices and improvements",
                "\
Generate a Python MicroAgent class named '{class_name}' that analyzes Python code.
The agent should:
1. Use AST for code parsing
2. Check for common anti-patterns
3. Analyze code complexity
4. Suggest improvements
5. Handle errors gracefully

Requirements:
- Subclass MicroAgent
- Accept 'code_snippet' and 'analysis_type' inputs
- Return dict with 'analysis_report', 'suggestions', and 'complexity_score'
- Include proper error handling
- Follow PEP 8
- Use type hints",
            )
            .with_inputs(&["code_snippet", "analysis_type"])
            .with_outputs(&["analysis_report", "suggestions", "complexity_score"])
            .with_required_imports(&["ast", "pylint"])
            .with_rules(ValidationRules {
                max_code_length: Some(crate::constants::validation::MAX_CODE_LENGTH),
                required_analysis_types: vec![
                    "style".to_string(),
                    "security".to_string(),
                    "performance".to_string(),
                ],
                ..Default::default()
            }),
        ),
    );

    triggers.insert(
        "react".to_string(),
        Arc::new(
            TriggerInfo::new(
                "ReactAnalyzer",
                "React.js code analyzer focusing on performance and best practices",
                "\
Generate a Python MicroAgent class named '{class_name}' that analyzes React code.
The agent should:
1. Parse JSX/TSX syntax
2. Check component lifecycle
3. Identify performance bottlenecks
4. Verify hooks usage
5. Assess accessibility

Requirements:
- Subclass MicroAgent
- Accept 'code_snippet' and 'react_version' inputs
- Return dict with 'analysis_report', 'performance_tips', and 'accessibility_report'
- Include React-specific validations
- Handle JSX parsing errors",
            )
            .with_inputs(&["code_snippet", "react_version"])
            .with_outputs(&["analysis_report", "performance_tips", "accessibility_report"])
            .with_required_imports(&["esprima", "eslint"])
            .with_rules(ValidationRules {
                max_code_length: Some(crate::constants::validation::MAX_CODE_LENGTH),
                required_analysis_types: Vec::new(),
                ..Default::default()
            }),
        ),
    );

    triggers
}

// =============================================================================
// Dynamic trigger derivation
// =============================================================================

/// Derive a trigger from one registry entry.
///
/// Class name is the title-cased, underscored technology name plus
/// "Analyzer"; the prompt template is a fixed skeleton parameterized by the
/// entry's declared features and use cases.
fn derive_trigger(entry: &TechnologyEntry) -> TriggerInfo {
    let class_name = format!("{}Analyzer", title_case_underscored(&entry.name));
    let features = bullet_list(&entry.features, "framework-specific best practices");
    let use_cases = bullet_list(&entry.use_cases, "general code review");

    let prompt_template = format!(
        "\
Generate a Python MicroAgent class named '{{class_name}}' that analyzes {name} code.
The agent should:
1. Parse and validate {name}-specific syntax
2. Check for declared capabilities:
{features}
3. Cover the primary use cases:
{use_cases}
4. Identify potential compatibility issues
5. Suggest optimizations

Requirements:
- Subclass MicroAgent
- Accept 'code_snippet' and 'analysis_type' inputs
- Return dict with 'analysis_report', 'suggestions', and 'compatibility_check'
- Include {name}-specific validations
- Handle framework-specific patterns",
        name = entry.name,
    );

    let mut metadata = BTreeMap::new();
    metadata.insert("name".to_string(), serde_json::json!(entry.name));
    metadata.insert("type".to_string(), serde_json::json!(entry.entry_type));
    metadata.insert("category".to_string(), serde_json::json!(entry.category));
    if !entry.version_info.is_empty() {
        metadata.insert(
            "version_info".to_string(),
            serde_json::json!(entry.version_info),
        );
    }

    TriggerInfo::new(
        class_name,
        format!("Analyzer for the {} {}", entry.name, display_kind(entry)),
        prompt_template,
    )
    .with_inputs(&["code_snippet", "analysis_type"])
    .with_outputs(&["analysis_report", "suggestions", "compatibility_check"])
    .with_rules(ValidationRules {
        max_code_length: Some(10_000),
        required_analysis_types: vec![
            "style".to_string(),
            "compatibility".to_string(),
            "optimization".to_string(),
        ],
        ..Default::default()
    })
    .with_metadata(metadata)
}

fn display_kind(entry: &TechnologyEntry) -> &str {
    if entry.entry_type.is_empty() {
        "technology"
    } else {
        &entry.entry_type
    }
}

/// "tailwind css" → "Tailwind_Css": capitalize each word, join with
/// underscores so the result is a legal identifier prefix
fn title_case_underscored(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("_")
}

fn bullet_list(items: &[String], fallback: &str) -> String {
    if items.is_empty() {
        return format!("   - {fallback}");
    }
    items
        .iter()
        .map(|item| format!("   - {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

// =============================================================================
// Tests
// =============================================================================

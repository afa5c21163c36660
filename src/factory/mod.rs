//! Agent Factory
//!
//! Orchestrates the full generation pipeline:
//!
//! 1. Validate the requested technology keyword
//! 2. Serve from the result cache when possible
//! 3. Resolve the trigger (unknown keywords never reach the LLM)
//! 4. Create or retrieve the persistent agent record
//! 5. Generate source via the LLM, with prompt-level caching and
//!    exponential-backoff retry for transient failures
//! 6. Validate the generated source (security, structure, imports, rules)
//! 7. Compile the source into a callable agent
//!
//! `generate` never returns `Err`: every outcome, success or failure, is a
//! `GenerationResult` carrying status, error classification, per-stage
//! validation results, and timing. Failures are also written into the
//! agent's persistent error history.
//!
//! Only successful results are cached; a failed generation is always
//! re-attempted on the next call.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::ai::prompt;
use crate::ai::{RetryPolicy, SharedProvider};
use crate::cache::Cache;
use crate::catalog::TriggerCatalog;
use crate::keyword::KeywordManager;
use crate::loader::{CompiledAgent, SharedCompiler};
use crate::types::{AgentStatus, ForgeError, GenerationOptions, Result};
use crate::validate::AgentValidator;

const DEFAULT_CACHE_TTL: Duration =
    Duration::from_secs(crate::constants::cache::DEFAULT_TTL_SECS);

// =============================================================================
// Generation Result
// =============================================================================

/// Timing and provenance attached to every result
#[derive(Debug, Clone, Serialize)]
pub struct ResultMetadata {
    pub technology: String,
    pub class_name: Option<String>,
    pub options: GenerationOptions,
    pub duration_ms: u64,
    pub cache_hit: bool,
}

/// Outcome of one generation request, success or failure
#[derive(Clone)]
pub struct GenerationResult {
    /// The callable agent; present only on success
    pub agent: Option<Arc<dyn CompiledAgent>>,
    pub status: AgentStatus,
    pub error: Option<String>,
    pub error_type: Option<String>,
    /// Per-stage validation results of the latest attempt
    pub validation_results: BTreeMap<String, bool>,
    pub generated_at: DateTime<Utc>,
    pub metadata: ResultMetadata,
}

impl std::fmt::Debug for GenerationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationResult")
            .field("agent", &self.agent.as_ref().map(|a| a.name().to_string()))
            .field("status", &self.status)
            .field("error", &self.error)
            .field("error_type", &self.error_type)
            .field("validation_results", &self.validation_results)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        self.status == AgentStatus::Active && self.agent.is_some()
    }

    /// JSON view for CLI output and logs
    pub fn to_report(&self) -> Value {
        json!({
            "technology": self.metadata.technology,
            "class_name": self.metadata.class_name,
            "status": self.status,
            "error": self.error,
            "error_type": self.error_type,
            "validation_results": self.validation_results,
            "generated_at": self.generated_at,
            "duration_ms": self.metadata.duration_ms,
            "cache_hit": self.metadata.cache_hit,
        })
    }
}

// =============================================================================
// Factory
// =============================================================================

/// End-to-end agent generation pipeline
pub struct AgentFactory {
    catalog: Arc<TriggerCatalog>,
    keywords: Arc<KeywordManager>,
    provider: SharedProvider,
    compiler: SharedCompiler,
    validator: AgentValidator,
    retry: RetryPolicy,
    /// Prompt cache: prompt key → extracted source
    llm_cache: Cache<String, String>,
    /// Result cache: technology + options → successful result
    result_cache: Cache<String, GenerationResult>,
}

impl AgentFactory {
    pub fn builder() -> AgentFactoryBuilder {
        AgentFactoryBuilder::default()
    }

    /// Detect the best-matching known technology in free text
    pub fn detect(&self, input: &str) -> Option<String> {
        self.keywords.detect(input)
    }

    pub fn keywords(&self) -> &KeywordManager {
        &self.keywords
    }

    pub fn catalog(&self) -> &TriggerCatalog {
        &self.catalog
    }

    /// Drop both the prompt and result caches
    pub fn clear_caches(&self) {
        self.llm_cache.clear();
        self.result_cache.clear();
    }

    /// Generate (or retrieve) the agent for a technology keyword.
    ///
    /// Infallible at the signature level: failures come back as a
    /// `GenerationResult` with `status == Error` and a populated error
    /// classification.
    #[instrument(skip(self, options))]
    pub async fn generate(
        &self,
        technology: &str,
        options: GenerationOptions,
    ) -> GenerationResult {
        let started = Instant::now();
        let technology = technology.trim().to_lowercase();

        let mut checks = BTreeMap::new();
        match self
            .generate_inner(&technology, &options, started, &mut checks)
            .await
        {
            Ok(result) => result,
            Err(err) => self.failure(&technology, &options, err, checks, started),
        }
    }

    async fn generate_inner(
        &self,
        technology: &str,
        options: &GenerationOptions,
        started: Instant,
        checks: &mut BTreeMap<String, bool>,
    ) -> Result<GenerationResult> {
        if technology.is_empty() {
            return Err(crate::types::ValidationError::input(
                "technology",
                "Technology keyword must not be empty",
            )
            .into());
        }

        let result_key = result_cache_key(technology, options);
        if let Some(mut cached) = self.result_cache.get(&result_key) {
            debug!(technology, "Serving generation result from cache");
            cached.metadata.cache_hit = true;
            cached.metadata.duration_ms = started.elapsed().as_millis() as u64;
            return Ok(cached);
        }

        // Unresolvable keywords fail here, before any agent record or LLM
        // call. A keyword present in the table but absent from the catalog
        // is reported distinctly.
        let trigger = self.catalog.lookup(technology).ok_or_else(|| {
            if self.keywords.contains(technology) {
                ForgeError::TriggerNotFound {
                    keyword: technology.to_string(),
                }
            } else {
                ForgeError::UnknownTechnology {
                    keyword: technology.to_string(),
                }
            }
        })?;

        let record_metadata = BTreeMap::from([
            ("class_name".to_string(), json!(trigger.class_name)),
            ("trigger_version".to_string(), json!(trigger.version)),
        ]);
        let lifecycle = self
            .keywords
            .get_or_create_agent(technology, record_metadata)?;
        debug!(technology, %lifecycle, "Agent record resolved");

        let messages = prompt::build_messages(&trigger, options);
        let prompt_key = prompt::cache_key(&trigger.class_name, &messages);

        let code = match self.llm_cache.get(&prompt_key) {
            Some(cached) => {
                debug!(technology, "Prompt cache hit, skipping LLM call");
                cached
            }
            None => {
                // Empty output counts as a generation failure and is
                // retried along with transport errors. Once the retry
                // budget is exhausted the whole step is a generation
                // failure, whatever the last underlying error was.
                let code = self
                    .retry
                    .run(|| async {
                        let response = self.provider.chat(&messages).await?;
                        let code = prompt::extract_code(&response.content);
                        if code.is_empty() {
                            return Err(ForgeError::generation("provider returned no code"));
                        }
                        Ok(code)
                    })
                    .await
                    .map_err(|err| match err {
                        ForgeError::CodeGeneration { .. } => err,
                        other => ForgeError::generation(format!(
                            "retries exhausted, last error: {other}"
                        )),
                    })?;
                self.llm_cache.set(prompt_key, code.clone());
                code
            }
        };

        let (outcome, validation_error) = self.validator.validate(&code, &trigger);
        *checks = outcome.checks.clone();
        self.keywords
            .record_validation_results(technology, &outcome.checks)?;
        if let Some(err) = validation_error {
            return Err(err.into());
        }

        let agent = self.compiler.compile(&code, &trigger).await?;

        self.keywords
            .update_agent_status(technology, AgentStatus::Active, None)?;

        let result = GenerationResult {
            agent: Some(agent),
            status: AgentStatus::Active,
            error: None,
            error_type: None,
            validation_results: outcome.checks,
            generated_at: Utc::now(),
            metadata: ResultMetadata {
                technology: technology.to_string(),
                class_name: Some(trigger.class_name.clone()),
                options: options.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
                cache_hit: false,
            },
        };

        self.result_cache.set(result_key, result.clone());
        info!(
            technology,
            class_name = %trigger.class_name,
            duration_ms = result.metadata.duration_ms,
            "Agent generated"
        );
        Ok(result)
    }

    /// Build the failure result and record it in the agent's history
    fn failure(
        &self,
        technology: &str,
        options: &GenerationOptions,
        err: ForgeError,
        checks: BTreeMap<String, bool>,
        started: Instant,
    ) -> GenerationResult {
        let report = err.report();
        warn!(
            technology,
            error = %report.message,
            error_type = %report.error_type,
            details = %report.details,
            recovery_hint = report.recovery_hint.as_deref().unwrap_or(""),
            "Generation failed"
        );

        // No-op when no record exists (e.g. unknown technology)
        if let Err(record_err) =
            self.keywords
                .update_agent_status(technology, AgentStatus::Error, Some(&report.message))
        {
            warn!(technology, error = %record_err, "Failed to record agent error");
        }

        GenerationResult {
            agent: None,
            status: AgentStatus::Error,
            error: Some(report.message),
            error_type: Some(report.error_type),
            validation_results: checks,
            generated_at: report.timestamp,
            metadata: ResultMetadata {
                technology: technology.to_string(),
                class_name: self.catalog.lookup(technology).map(|t| t.class_name.clone()),
                options: options.clone(),
                duration_ms: started.elapsed().as_millis() as u64,
                cache_hit: false,
            },
        }
    }
}

fn result_cache_key(technology: &str, options: &GenerationOptions) -> String {
    // BTreeMap serialization is canonical, so equal options always produce
    // the same key
    let options = serde_json::to_string(options).unwrap_or_default();
    format!("{technology}:{options}")
}

// =============================================================================
// Builder
// =============================================================================

/// Assembles an `AgentFactory` from its collaborators
#[derive(Default)]
pub struct AgentFactoryBuilder {
    catalog: Option<Arc<TriggerCatalog>>,
    keywords: Option<Arc<KeywordManager>>,
    provider: Option<SharedProvider>,
    compiler: Option<SharedCompiler>,
    retry: Option<RetryPolicy>,
    cache_ttl: Option<Duration>,
}

impl AgentFactoryBuilder {
    pub fn catalog(mut self, catalog: Arc<TriggerCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn keywords(mut self, keywords: Arc<KeywordManager>) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn provider(mut self, provider: SharedProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn compiler(mut self, compiler: SharedCompiler) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    pub fn build(self) -> Result<AgentFactory> {
        let cache_ttl = self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        Ok(AgentFactory {
            catalog: self
                .catalog
                .ok_or_else(|| ForgeError::Config("factory requires a catalog".to_string()))?,
            keywords: self
                .keywords
                .ok_or_else(|| ForgeError::Config("factory requires a keyword manager".to_string()))?,
            provider: self
                .provider
                .ok_or_else(|| ForgeError::Config("factory requires an LLM provider".to_string()))?,
            compiler: self
                .compiler
                .ok_or_else(|| ForgeError::Config("factory requires a compiler".to_string()))?,
            validator: AgentValidator::new(),
            retry: self.retry.unwrap_or_default(),
            llm_cache: Cache::new(cache_ttl),
            result_cache: Cache::new(cache_ttl),
        })
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::provider::{ChatMessage, ChatResponse, LlmProvider};
    use crate::loader::AgentCompiler;
    use crate::state::StateManager;
    use crate::types::TriggerInfo;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    const VALID_CODE: &str = "\
import ast
from pylint import lint

class PythonAnalyzer(MicroAgent):
    def __init__(self):
        super().__init__(name='python_analyzer')

    def run(self, data):
        return {'analysis_report': 'ok', 'suggestions': []}
";

    /// Provider that replays a script of responses and counts calls
    struct ScriptedProvider {
        responses: Mutex<VecDeque<Result<String>>>,
        calls: AtomicUsize,
    }

    impl ScriptedProvider {
        fn new(responses: impl IntoIterator<Item = Result<String>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.into_iter().collect()),
                calls: AtomicUsize::new(0),
            })
        }

        fn always(content: &str) -> Arc<Self> {
            Self::new([Ok(content.to_string())])
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LlmProvider for ScriptedProvider {
        async fn chat(&self, _messages: &[ChatMessage]) -> Result<ChatResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let mut responses = self.responses.lock().unwrap();
            let next = responses.pop_front();
            // Replay the last response once the script is exhausted
            let content = match next {
                Some(Ok(content)) => {
                    if responses.is_empty() {
                        responses.push_back(Ok(content.clone()));
                    }
                    content
                }
                Some(Err(err)) => return Err(err),
                None => return Err(ForgeError::LlmApi("script exhausted".to_string())),
            };
            Ok(ChatResponse {
                content,
                model: "scripted".to_string(),
                duration_ms: 0,
            })
        }

        fn name(&self) -> &str {
            "scripted"
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }
    }

    struct StubAgent {
        class_name: String,
    }

    #[async_trait]
    impl CompiledAgent for StubAgent {
        fn name(&self) -> &str {
            &self.class_name
        }

        fn description(&self) -> &str {
            "stub"
        }

        fn inputs(&self) -> &[String] {
            &[]
        }

        fn outputs(&self) -> &[String] {
            &[]
        }

        async fn run(&self, _data: &Value) -> Result<Value> {
            Ok(json!({"analysis_report": "stubbed"}))
        }
    }

    struct StubCompiler {
        calls: AtomicUsize,
    }

    impl StubCompiler {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AgentCompiler for StubCompiler {
        async fn compile(
            &self,
            _source: &str,
            trigger: &TriggerInfo,
        ) -> Result<Arc<dyn CompiledAgent>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(StubAgent {
                class_name: trigger.class_name.clone(),
            }))
        }
    }

    fn factory(
        dir: &TempDir,
        provider: Arc<ScriptedProvider>,
        compiler: Arc<StubCompiler>,
    ) -> AgentFactory {
        let catalog = Arc::new(TriggerCatalog::builtin());
        let store = StateManager::new(dir.path().join("keywords.json")).unwrap();
        let seed: Vec<(String, String)> = catalog.keywords();
        let keywords = Arc::new(
            KeywordManager::with_seed(
                store,
                seed.iter().map(|(k, d)| (k.as_str(), d.as_str())),
            )
            .unwrap(),
        );
        AgentFactory::builder()
            .catalog(catalog)
            .keywords(keywords)
            .provider(provider)
            .compiler(compiler)
            .retry(RetryPolicy::new(3, Duration::from_millis(1), 2.0))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_end_to_end_success() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(&format!("```python\n{VALID_CODE}```"));
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory.generate("python", GenerationOptions::new()).await;
        assert!(result.is_success(), "unexpected failure: {result:?}");
        assert_eq!(result.agent.as_ref().unwrap().name(), "PythonAnalyzer");
        assert_eq!(result.metadata.class_name.as_deref(), Some("PythonAnalyzer"));
        assert!(!result.metadata.cache_hit);
        assert!(result.validation_results.values().all(|&ok| ok));

        let record = factory.keywords().agent("python").unwrap();
        assert_eq!(record.status, AgentStatus::Active);
        assert_eq!(record.validation_results.len(), 4);
    }

    #[tokio::test]
    async fn test_repeat_request_is_served_from_result_cache() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let first = factory.generate("python", GenerationOptions::new()).await;
        assert!(first.is_success());
        let second = factory.generate("python", GenerationOptions::new()).await;
        assert!(second.is_success());
        assert!(second.metadata.cache_hit);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_prompt_cache_survives_result_cache_clear() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        assert!(factory
            .generate("python", GenerationOptions::new())
            .await
            .is_success());
        // Drop only the result cache; the prompt cache still answers
        factory.result_cache.clear();

        let again = factory.generate("python", GenerationOptions::new()).await;
        assert!(again.is_success());
        assert!(!again.metadata.cache_hit);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_unknown_technology_never_reaches_the_llm() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory
            .generate("cobol-mainframe-9000", GenerationOptions::new())
            .await;
        assert_eq!(result.status, AgentStatus::Error);
        assert_eq!(result.error_type.as_deref(), Some("UnknownTechnology"));
        assert!(result.agent.is_none());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_keyword_without_trigger_is_distinguished() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        // Known keyword, but nothing in the catalog to generate from
        factory.keywords().add_keyword("sql", "SQL analyzer").unwrap();
        let result = factory.generate("sql", GenerationOptions::new()).await;
        assert_eq!(result.error_type.as_deref(), Some("TriggerNotFound"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_llm_output_is_retried_as_generation_failure() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new([
            Ok("```python\n```".to_string()),
            Ok(VALID_CODE.to_string()),
        ]);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory.generate("python", GenerationOptions::new()).await;
        assert!(result.is_success(), "unexpected failure: {result:?}");
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn test_empty_technology_is_rejected() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory.generate("   ", GenerationOptions::new()).await;
        assert_eq!(result.error_type.as_deref(), Some("ValidationError"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_insecure_code_fails_validation_and_is_recorded() {
        let dir = TempDir::new().unwrap();
        let provider =
            ScriptedProvider::always(&format!("{VALID_CODE}\nos.system('rm -rf /')\n"));
        let compiler = StubCompiler::new();
        let factory = factory(&dir, Arc::clone(&provider), Arc::clone(&compiler));

        let result = factory.generate("python", GenerationOptions::new()).await;
        assert_eq!(result.status, AgentStatus::Error);
        assert_eq!(result.error_type.as_deref(), Some("ValidationError"));
        assert_eq!(result.validation_results.get("security"), Some(&false));
        assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);

        let record = factory.keywords().agent("python").unwrap();
        assert_eq!(record.status, AgentStatus::Error);
        assert_eq!(record.error_history.len(), 1);
        assert_eq!(record.validation_results.get("security"), Some(&false));
    }

    #[tokio::test]
    async fn test_transient_llm_failure_is_retried_to_success() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new([
            Err(ForgeError::LlmApi("503".to_string())),
            Err(ForgeError::LlmApi("503".to_string())),
            Ok(VALID_CODE.to_string()),
        ]);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory.generate("python", GenerationOptions::new()).await;
        assert!(result.is_success(), "unexpected failure: {result:?}");
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_llm_failure_exhausts_retries_then_reports() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::new([
            Err(ForgeError::LlmApi("down".to_string())),
            Err(ForgeError::LlmApi("down".to_string())),
            Err(ForgeError::LlmApi("down".to_string())),
        ]);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let result = factory.generate("python", GenerationOptions::new()).await;
        assert_eq!(result.status, AgentStatus::Error);
        // Exhaustion is reported as a generation failure, with the last
        // transport error preserved in the message
        assert_eq!(result.error_type.as_deref(), Some("CodeGenerationError"));
        assert!(result.error.as_deref().unwrap().contains("down"));
        assert_eq!(provider.call_count(), 3);

        // Failures are not cached; a later call tries the LLM again
        let provider_calls_before = provider.call_count();
        let _ = factory.generate("python", GenerationOptions::new()).await;
        assert!(provider.call_count() > provider_calls_before);
    }

    #[tokio::test]
    async fn test_distinct_options_produce_distinct_cache_entries() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        let plain = GenerationOptions::new();
        let strict: GenerationOptions =
            BTreeMap::from([("analysis_type".to_string(), json!("security"))]);

        assert!(factory.generate("python", plain.clone()).await.is_success());
        assert!(factory.generate("python", strict).await.is_success());
        // Different options → different prompt → second LLM call
        assert_eq!(provider.call_count(), 2);

        let cached = factory.generate("python", plain).await;
        assert!(cached.metadata.cache_hit);
    }

    #[tokio::test]
    async fn test_generated_agent_record_is_idempotent_across_calls() {
        let dir = TempDir::new().unwrap();
        let provider = ScriptedProvider::always(VALID_CODE);
        let factory = factory(&dir, Arc::clone(&provider), StubCompiler::new());

        assert!(factory
            .generate("python", GenerationOptions::new())
            .await
            .is_success());
        let created = factory.keywords().agent("python").unwrap().created_at;

        factory.clear_caches();
        assert!(factory
            .generate("python", GenerationOptions::new())
            .await
            .is_success());
        let record = factory.keywords().agent("python").unwrap();
        assert_eq!(record.created_at, created);
        assert!(record.last_accessed >= created);
    }

    #[test]
    fn test_builder_rejects_missing_collaborators() {
        let Err(err) = AgentFactory::builder().build() else {
            panic!("builder accepted missing collaborators");
        };
        assert_eq!(err.error_type(), "ConfigError");
    }
}

//! Agent Loading
//!
//! Turns validated source into a callable agent. `AgentCompiler` is the
//! seam: the factory never knows how loading happens, so tests inject stub
//! compilers and the Python implementation stays swappable.
//!
//! `PythonCompiler` materializes the source into a uniquely named scratch
//! file, wraps it in a small runtime harness (a minimal `MicroAgent` base
//! plus a JSON entry point), and probes it in a subprocess: the class must
//! exist, be a type, and subclass `MicroAgent`. The scratch file is removed
//! on every exit path. Each later `run` re-materializes the harness and
//! pipes inputs/outputs as JSON over stdio.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::types::{ForgeError, Result, TriggerInfo};

// =============================================================================
// Traits
// =============================================================================

/// A loaded, callable agent
#[async_trait]
pub trait CompiledAgent: Send + Sync {
    /// Class name of the agent
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// Input field names the agent accepts
    fn inputs(&self) -> &[String];

    /// Output field names the agent produces
    fn outputs(&self) -> &[String];

    /// Invoke the agent with a JSON object of inputs
    async fn run(&self, data: &Value) -> Result<Value>;
}

/// Turns validated source into a `CompiledAgent`
#[async_trait]
pub trait AgentCompiler: Send + Sync {
    async fn compile(&self, source: &str, trigger: &TriggerInfo) -> Result<Arc<dyn CompiledAgent>>;
}

pub type SharedCompiler = Arc<dyn AgentCompiler>;

// =============================================================================
// Python Compiler
// =============================================================================

/// Settings for the Python subprocess runtime
#[derive(Debug, Clone)]
pub struct PythonCompilerConfig {
    /// Interpreter binary, e.g. "python3"
    pub python_bin: String,
    /// Directory for scratch files
    pub scratch_dir: PathBuf,
    /// Per-invocation wall-clock limit
    pub timeout: Duration,
}

impl Default for PythonCompilerConfig {
    fn default() -> Self {
        Self {
            python_bin: crate::constants::loader::PYTHON_BIN.to_string(),
            scratch_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(crate::constants::loader::TIMEOUT_SECS),
        }
    }
}

/// Loads generated Python agents by probing them in a subprocess
#[derive(Debug, Clone)]
pub struct PythonCompiler {
    config: PythonCompilerConfig,
}

impl PythonCompiler {
    pub fn new(config: PythonCompilerConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AgentCompiler for PythonCompiler {
    async fn compile(&self, source: &str, trigger: &TriggerInfo) -> Result<Arc<dyn CompiledAgent>> {
        let harness = compose_harness(source, &trigger.class_name);
        let scratch = ScratchFile::create(
            &self.config.scratch_dir,
            &trigger.class_name,
            &harness,
        )
        .map_err(|e| {
            ForgeError::loading(&trigger.class_name, format!("scratch file: {e}"))
        })?;

        debug!(
            class_name = %trigger.class_name,
            path = %scratch.path().display(),
            "Probing generated agent"
        );

        let output = run_python(
            &self.config.python_bin,
            scratch.path(),
            &["--probe"],
            None,
            self.config.timeout,
        )
        .await
        .map_err(|e| ForgeError::loading(&trigger.class_name, e))?;

        let manifest: ProbeManifest = serde_json::from_str(output.trim()).map_err(|e| {
            ForgeError::loading(
                &trigger.class_name,
                format!("probe produced no manifest: {e}"),
            )
        })?;
        if manifest.class_name != trigger.class_name {
            return Err(ForgeError::loading(
                &trigger.class_name,
                format!("probe resolved '{}' instead", manifest.class_name),
            ));
        }

        Ok(Arc::new(PythonAgent {
            class_name: trigger.class_name.clone(),
            description: trigger.description.clone(),
            inputs: trigger.inputs.clone(),
            outputs: trigger.outputs.clone(),
            harness,
            config: self.config.clone(),
        }))
    }
}

#[derive(Debug, serde::Deserialize)]
struct ProbeManifest {
    class_name: String,
}

/// A probed Python agent, re-materialized per invocation
struct PythonAgent {
    class_name: String,
    description: String,
    inputs: Vec<String>,
    outputs: Vec<String>,
    harness: String,
    config: PythonCompilerConfig,
}

#[async_trait]
impl CompiledAgent for PythonAgent {
    fn name(&self) -> &str {
        &self.class_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn inputs(&self) -> &[String] {
        &self.inputs
    }

    fn outputs(&self) -> &[String] {
        &self.outputs
    }

    async fn run(&self, data: &Value) -> Result<Value> {
        let scratch = ScratchFile::create(&self.config.scratch_dir, &self.class_name, &self.harness)
            .map_err(|e| ForgeError::loading(&self.class_name, format!("scratch file: {e}")))?;

        let input = serde_json::to_string(data)?;
        let output = run_python(
            &self.config.python_bin,
            scratch.path(),
            &[],
            Some(&input),
            self.config.timeout,
        )
        .await
        .map_err(|e| ForgeError::loading(&self.class_name, e))?;

        serde_json::from_str(output.trim())
            .map_err(|e| ForgeError::loading(&self.class_name, format!("non-JSON output: {e}")))
    }
}

// =============================================================================
// Subprocess plumbing
// =============================================================================

/// Errors are plain strings; the callers wrap them into `ClassLoadingError`
/// with the class name attached.
async fn run_python(
    python_bin: &str,
    script: &Path,
    args: &[&str],
    stdin: Option<&str>,
    timeout: Duration,
) -> std::result::Result<String, String> {
    let mut command = Command::new(python_bin);
    command
        .arg(script)
        .args(args)
        .stdin(if stdin.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| format!("failed to spawn {python_bin}: {e}"))?;

    if let (Some(input), Some(mut handle)) = (stdin, child.stdin.take()) {
        let input = input.to_string();
        handle
            .write_all(input.as_bytes())
            .await
            .map_err(|e| format!("failed to write interpreter stdin: {e}"))?;
        drop(handle);
    }

    let output = tokio::time::timeout(timeout, child.wait_with_output())
        .await
        .map_err(|_| format!("interpreter exceeded {}s limit", timeout.as_secs()))?
        .map_err(|e| format!("failed to collect interpreter output: {e}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(format!(
            "interpreter exited with {}: {}",
            output.status,
            stderr.trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Scratch file removed on every exit path via `Drop`
struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    fn create(dir: &Path, class_name: &str, content: &str) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file_name = format!("{}_{}.py", class_name.to_lowercase(), Uuid::new_v4());
        let path = dir.join(file_name);
        std::fs::write(&path, content)?;
        Ok(Self { path })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove scratch file");
        }
    }
}

/// Wrap generated source in the runtime harness: a minimal `MicroAgent`
/// base above it and a JSON stdio entry point below it.
fn compose_harness(source: &str, class_name: &str) -> String {
    format!(
        r#"import json
import sys


class MicroAgent:
    def __init__(self, name=None, **kwargs):
        self.name = name


{source}


def _resolve():
    cls = globals().get("{class_name}")
    if not isinstance(cls, type) or not issubclass(cls, MicroAgent):
        raise TypeError("{class_name} is not a MicroAgent subclass")
    return cls


if __name__ == "__main__":
    cls = _resolve()
    if "--probe" in sys.argv:
        print(json.dumps({{"class_name": cls.__name__}}))
    else:
        agent = cls()
        data = json.load(sys.stdin)
        print(json.dumps(agent.run(data)))
"#
    )
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SOURCE: &str = "\
class PythonAnalyzer(MicroAgent):
    def __init__(self):
        super().__init__(name='python_analyzer')

    def run(self, data):
        return {'analysis_report': 'ok'}
";

    #[test]
    fn test_harness_wraps_source_with_base_and_entry_point() {
        let harness = compose_harness(SOURCE, "PythonAnalyzer");
        assert!(harness.contains("class MicroAgent:"));
        assert!(harness.contains("class PythonAnalyzer(MicroAgent):"));
        assert!(harness.contains("--probe"));
        // Base class is defined before the generated source uses it
        let base = harness.find("class MicroAgent:").unwrap();
        let agent = harness.find("class PythonAnalyzer").unwrap();
        assert!(base < agent);
    }

    #[test]
    fn test_scratch_file_name_and_cleanup() {
        let dir = TempDir::new().unwrap();
        let path = {
            let scratch = ScratchFile::create(dir.path(), "PythonAnalyzer", "x = 1").unwrap();
            let path = scratch.path().to_path_buf();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            assert!(name.starts_with("pythonanalyzer_"));
            assert!(name.ends_with(".py"));
            assert!(path.exists());
            path
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_scratch_files_never_collide() {
        let dir = TempDir::new().unwrap();
        let a = ScratchFile::create(dir.path(), "A", "").unwrap();
        let b = ScratchFile::create(dir.path(), "A", "").unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[tokio::test]
    async fn test_subprocess_failures_read_as_plain_messages() {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("agent.py");
        std::fs::write(&script, "print('hi')").unwrap();

        let err = run_python(
            "no-such-interpreter",
            &script,
            &["--probe"],
            None,
            Duration::from_secs(1),
        )
        .await
        .unwrap_err();
        assert!(err.starts_with("failed to spawn"), "got: {err}");
    }

    #[tokio::test]
    async fn test_compile_failure_is_a_single_loading_error() {
        let compiler = PythonCompiler::new(PythonCompilerConfig {
            python_bin: "no-such-interpreter".to_string(),
            scratch_dir: std::env::temp_dir(),
            timeout: Duration::from_secs(1),
        });
        let trigger = crate::types::TriggerInfo::new(
            "PythonAnalyzer",
            "Python analyzer",
            "Generate {class_name}",
        );

        let Err(err) = compiler.compile(SOURCE, &trigger).await else {
            panic!("compile succeeded without an interpreter");
        };
        assert_eq!(err.error_type(), "ClassLoadingError");
        let message = err.to_string();
        assert!(message.contains("failed to spawn"), "got: {message}");
        // The loading error is not wrapped around another taxonomy variant
        assert!(!message.contains("State error"), "got: {message}");
    }
}

//! Configuration types: `ember.toml` sections, the host build-info payload
//! and the engine context handed to the orchestrator.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};

/// Cache directory used when `project.cache_dir` is not set, relative to the
/// project directory.
pub const DEFAULT_CACHE_DIR: &str = ".ember-cache";

/// The top-level project configuration parsed from `ember.toml`.
#[derive(Debug, Deserialize)]
pub struct ProjectConfig {
    /// Project identity and cache location.
    pub project: ProjectMeta,
    /// Engine tuning (worker pool, shutdown timeouts).
    #[serde(default)]
    pub engine: EngineConfig,
    /// Compiler and execution tools.
    #[serde(default)]
    pub toolchain: ToolchainConfig,
    /// Build settings and the registered files.
    #[serde(default)]
    pub build: BuildInfo,
}

/// Project identity.
#[derive(Debug, Deserialize)]
pub struct ProjectMeta {
    /// Project identifier. Scopes the cache directory.
    pub id: String,
    /// Cache directory, relative to the project directory unless absolute.
    #[serde(default)]
    pub cache_dir: Option<String>,
}

/// Worker pool and shutdown settings.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Number of scheduler worker threads. One serializes all compilation.
    pub workers: usize,
    /// How long shutdown waits for running jobs before abandoning them.
    pub shutdown_grace_ms: u64,
    /// How long teardown waits for the control thread to exit.
    pub control_join_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: 1,
            shutdown_grace_ms: 5_000,
            control_join_ms: 10_000,
        }
    }
}

/// External tools used by the clang frontend and the LLVM execution backend.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolchainConfig {
    /// Driver for C translation units.
    pub c_compiler: String,
    /// Driver for C++ and Objective-C++ translation units.
    pub cxx_compiler: String,
    /// Language standard passed to the C++ driver.
    pub cxx_standard: String,
    /// Bitcode linker.
    pub linker: String,
    /// Bitcode interpreter used to run the linked program.
    pub interpreter: String,
    /// Defines always passed before the project's own.
    #[serde(deserialize_with = "deserialize_tokens")]
    pub builtin_defines: Vec<String>,
    /// Base include directories searched before project paths.
    #[serde(deserialize_with = "deserialize_tokens")]
    pub include_dirs: Vec<String>,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            c_compiler: "clang".to_string(),
            cxx_compiler: "clang++".to_string(),
            cxx_standard: "c++11".to_string(),
            linker: "llvm-link".to_string(),
            interpreter: "lli".to_string(),
            builtin_defines: vec!["NDEBUG=1".to_string()],
            include_dirs: Vec::new(),
        }
    }
}

/// Build settings and registered files, as sent by the host in its
/// build-info message or written in the `[build]` table of `ember.toml`.
///
/// List fields accept either a list or a single space-separated string.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildInfo {
    /// System header search path.
    pub system_path: String,
    /// User header search path.
    pub user_path: String,
    /// Preprocessor defines, without the `-D` prefix.
    #[serde(deserialize_with = "deserialize_tokens")]
    pub defines: Vec<String>,
    /// Extra compiler flags passed verbatim.
    #[serde(deserialize_with = "deserialize_tokens")]
    pub extra_compiler_flags: Vec<String>,
    /// Shared libraries loaded into the program when it runs.
    #[serde(deserialize_with = "deserialize_tokens")]
    pub extra_dlls: Vec<String>,
    /// Folder holding the project's library modules, added to the include path.
    pub modules_folder: String,
    /// Files compiled and linked into the program.
    pub compile_units: Vec<PathBuf>,
    /// Other project files the host tracks.
    pub user_files: Vec<PathBuf>,
}

impl BuildInfo {
    /// Makes relative file paths absolute against `base`.
    pub fn resolve_relative(mut self, base: &Path) -> Self {
        for path in self.compile_units.iter_mut().chain(self.user_files.iter_mut()) {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
        self
    }

    /// Keeps only files that exist, dropping duplicates and keeping the first
    /// occurrence's position.
    pub fn retain_existing(&mut self) {
        retain_existing_unique(&mut self.compile_units);
        retain_existing_unique(&mut self.user_files);
    }
}

fn retain_existing_unique(paths: &mut Vec<PathBuf>) {
    let mut seen = Vec::with_capacity(paths.len());
    paths.retain(|p| {
        if !p.is_file() || seen.contains(p) {
            return false;
        }
        seen.push(p.clone());
        true
    });
}

/// Everything the orchestrator needs about its environment.
#[derive(Debug, Clone)]
pub struct EngineContext {
    /// Project identifier.
    pub project_id: String,
    /// Per-project cache directory. Disposable.
    pub cache_dir: PathBuf,
    /// Engine tuning.
    pub engine: EngineConfig,
    /// External tools.
    pub toolchain: ToolchainConfig,
}

impl EngineContext {
    /// Creates a context with default engine and toolchain settings.
    pub fn new(project_id: impl Into<String>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_id: project_id.into(),
            cache_dir: cache_dir.into(),
            engine: EngineConfig::default(),
            toolchain: ToolchainConfig::default(),
        }
    }
}

impl ProjectConfig {
    /// Builds the engine context for a project rooted at `project_dir`.
    pub fn context(&self, project_dir: &Path) -> EngineContext {
        let cache_dir = match &self.project.cache_dir {
            Some(dir) if Path::new(dir).is_absolute() => PathBuf::from(dir),
            Some(dir) => project_dir.join(dir),
            None => project_dir.join(DEFAULT_CACHE_DIR).join(&self.project.id),
        };
        EngineContext {
            project_id: self.project.id.clone(),
            cache_dir,
            engine: self.engine.clone(),
            toolchain: self.toolchain.clone(),
        }
    }
}

/// Deserializes a list of strings from a list or a space-separated string.
fn deserialize_tokens<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Tokens;

    impl<'de> Visitor<'de> for Tokens {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            formatter.write_str("a space-separated string or a list of strings")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(v.split_whitespace().map(str::to_string).collect())
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut vec = Vec::new();
            while let Some(val) = seq.next_element::<String>()? {
                let val = val.trim();
                if !val.is_empty() {
                    vec.push(val.to_string());
                }
            }
            Ok(vec)
        }
    }

    deserializer.deserialize_any(Tokens)
}

//! Shared helpers for CLI commands: project discovery, configuration loading
//! and engine construction.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ember_build::{BuildOrchestrator, HostChannel};
use ember_config::{load_config, EngineContext, ProjectConfig, CONFIG_FILE};
use ember_toolchain::{ClangFrontend, LlvmBackend, ProgramOutput};

use crate::GlobalArgs;

/// A project located on disk with its configuration.
pub struct Project {
    /// Directory containing `ember.toml`.
    pub root: PathBuf,
    /// The parsed configuration.
    pub config: ProjectConfig,
    /// Engine context derived from the configuration.
    pub context: EngineContext,
}

/// Walks up from `start` looking for the nearest directory containing
/// `ember.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Resolves the project root from global CLI args.
///
/// `--config` may name the file or its directory. Without it the search
/// starts at the current directory.
pub fn resolve_project_root(global: &GlobalArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    match &global.config {
        Some(config_path) => {
            let path = PathBuf::from(config_path);
            if path.is_file() {
                Ok(path
                    .parent()
                    .filter(|p| !p.as_os_str().is_empty())
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| PathBuf::from(".")))
            } else {
                Ok(path)
            }
        }
        None => find_project_root(&std::env::current_dir()?),
    }
}

/// Finds and loads the project.
pub fn load_project(global: &GlobalArgs) -> Result<Project, Box<dyn std::error::Error>> {
    let root = resolve_project_root(global)?;
    let root = root.canonicalize().unwrap_or(root);
    let config = load_config(&root)?;
    let context = config.context(&root);
    Ok(Project {
        root,
        config,
        context,
    })
}

/// Starts an orchestrator for `project` backed by the clang/LLVM tools.
pub fn start_engine(
    project: &Project,
    host: Arc<dyn HostChannel>,
    output: ProgramOutput,
) -> Result<BuildOrchestrator, Box<dyn std::error::Error>> {
    let toolchain = project.context.toolchain.clone();
    let engine = BuildOrchestrator::new(
        project.context.clone(),
        Box::new(ClangFrontend::new(toolchain.clone())),
        Box::new(LlvmBackend::new(toolchain).with_output(output)),
        host,
    )?;
    Ok(engine)
}

use std::path::Path;
use std::process::{Command, Stdio};

use ember_build::{BackendError, CompiledModule, ExecutionBackend, LinkedProgram};
use ember_config::ToolchainConfig;
use tracing::{debug, info};

/// Where the executed program's standard output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProgramOutput {
    /// Share the engine's standard output.
    #[default]
    Inherit,
    /// Send it to standard error, keeping standard output free for a host
    /// protocol.
    Stderr,
}

/// Links bitcode modules with `llvm-link` and interprets them with `lli`.
#[derive(Debug, Clone)]
pub struct LlvmBackend {
    toolchain: ToolchainConfig,
    output: ProgramOutput,
}

impl LlvmBackend {
    /// Creates a backend using the given tools.
    pub fn new(toolchain: ToolchainConfig) -> Self {
        Self {
            toolchain,
            output: ProgramOutput::default(),
        }
    }

    /// Redirects the program's standard output.
    pub fn with_output(mut self, output: ProgramOutput) -> Self {
        self.output = output;
        self
    }
}

impl ExecutionBackend for LlvmBackend {
    fn link(&self, modules: &[CompiledModule]) -> Result<LinkedProgram, BackendError> {
        if modules.is_empty() {
            return Err(BackendError::NoModules);
        }

        let dir = scratch_dir()?;
        let mut inputs = Vec::with_capacity(modules.len());
        for (index, module) in modules.iter().enumerate() {
            let stem = module
                .source
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let path = dir.path().join(format!("{index:03}-{stem}.bc"));
            write(&path, &module.artifact)?;
            inputs.push(path);
        }

        let linked = dir.path().join("linked.bc");
        let output = Command::new(&self.toolchain.linker)
            .arg("-o")
            .arg(&linked)
            .args(&inputs)
            .output()
            .map_err(|source| BackendError::Invoke {
                tool: self.toolchain.linker.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(BackendError::ToolFailed {
                tool: self.toolchain.linker.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let image = std::fs::read(&linked).map_err(|source| BackendError::Io {
            path: linked.clone(),
            source,
        })?;
        debug!(modules = modules.len(), bytes = image.len(), "modules linked");
        Ok(LinkedProgram { image })
    }

    fn run(
        &self,
        program: &LinkedProgram,
        args: &[String],
        libraries: &[String],
    ) -> Result<i32, BackendError> {
        // lli passes the input file name as argv[0].
        let (argv0, rest) = args.split_first().map_or(("app", &[][..]), |(first, rest)| {
            (first.as_str(), rest)
        });

        let dir = scratch_dir()?;
        let image = dir.path().join(argv0);
        write(&image, &program.image)?;

        let mut command = Command::new(&self.toolchain.interpreter);
        command
            .current_dir(dir.path())
            .args(libraries.iter().map(|lib| format!("-load={lib}")))
            .arg(argv0)
            .args(rest)
            .stdin(Stdio::null());
        if self.output == ProgramOutput::Stderr {
            command.stdout(std::io::stderr());
        }

        info!(interpreter = %self.toolchain.interpreter, "starting program");
        let status = command.status().map_err(|source| BackendError::Invoke {
            tool: self.toolchain.interpreter.clone(),
            source,
        })?;

        status.code().ok_or_else(|| BackendError::ToolFailed {
            tool: self.toolchain.interpreter.clone(),
            stderr: "terminated by a signal".to_string(),
        })
    }
}

fn scratch_dir() -> Result<tempfile::TempDir, BackendError> {
    tempfile::Builder::new()
        .prefix("ember-run-")
        .tempdir()
        .map_err(|source| BackendError::Io {
            path: std::env::temp_dir(),
            source,
        })
}

fn write(path: &Path, data: &[u8]) -> Result<(), BackendError> {
    std::fs::write(path, data).map_err(|source| BackendError::Io {
        path: path.to_path_buf(),
        source,
    })
}

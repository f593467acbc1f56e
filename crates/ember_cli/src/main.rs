//! Ember CLI, the command-line front end of the live build engine.
//!
//! `ember build` compiles the project's units through the content cache,
//! `ember run` builds and then executes the program, `ember clean` empties
//! the cache and `ember serve` speaks the host protocol as JSON lines on
//! stdin/stdout.

#![warn(missing_docs)]

mod build;
mod clean;
mod host;
mod logging;
mod pipeline;
mod run;
mod serve;

use std::process;

use clap::{Parser, Subcommand};

/// Ember, a live incremental build engine for C and C++.
#[derive(Parser, Debug)]
#[command(name = "ember", version, about = "Ember live build engine")]
pub struct Cli {
    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose (debug-level) output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to a custom `ember.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile every unit that is not up to date.
    Build,
    /// Build the project, then link and execute it.
    Run,
    /// Delete every cached snapshot and artifact.
    Clean,
    /// Serve host requests as JSON lines on stdin, events on stdout.
    Serve,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug-level logs.
    pub verbose: bool,
    /// Optional path to a custom config file.
    pub config: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    let global = GlobalArgs {
        quiet: cli.quiet,
        verbose: cli.verbose,
        config: cli.config,
    };

    let project = match pipeline::load_project(&global) {
        Ok(project) => project,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };
    let log_guard = match logging::init_logging(&project.context.cache_dir, &global) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Build => build::run(&project, &global),
        Command::Run => run::run(&project, &global),
        Command::Clean => clean::run(&project, &global),
        Command::Serve => serve::run(&project),
    };

    let code = match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e}");
            1
        }
    };
    // Flush the log writer before exiting.
    drop(log_guard);
    process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["ember", "build"]);
        assert!(matches!(cli.command, Command::Build));
        assert!(!cli.quiet);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn parse_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["ember", "run", "--verbose", "--config", "proj/ember.toml"]);
        assert!(matches!(cli.command, Command::Run));
        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some("proj/ember.toml"));
    }

    #[test]
    fn parse_clean_and_serve() {
        assert!(matches!(
            Cli::parse_from(["ember", "-q", "clean"]).command,
            Command::Clean
        ));
        assert!(matches!(
            Cli::parse_from(["ember", "serve"]).command,
            Command::Serve
        ));
    }

    #[test]
    fn unknown_command_rejected() {
        assert!(Cli::try_parse_from(["ember", "deploy"]).is_err());
    }
}

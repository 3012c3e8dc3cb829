//! camel-lsp - The `camel-lsp` command.
//!
//! Runs the language server over stdio, or validates route files from the
//! command line.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity};

use camel_lsp::catalog::Catalog;
use camel_lsp::diagnostics::compute_diagnostics;
use camel_lsp::dialect::Dialect;
use camel_lsp::document::Document;
use camel_lsp::Config;

/// Apache Camel language server
#[derive(Parser, Debug)]
#[command(name = "camel-lsp")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Language server for Apache Camel endpoint URIs", long_about = None)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level: error, warn, info, debug or trace
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the language server over stdio (default)
    Serve,

    /// Validate route files and print their diagnostics
    Check {
        #[arg(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,
    },

    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the configuration file location
    ConfigPath,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(args.config.as_deref())?;
    init_logger(args.log_level.as_deref().unwrap_or(&config.server.log_level));

    match args.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            info!("Starting camel-lsp {}", env!("CARGO_PKG_VERSION"));
            camel_lsp::run_server(config).await
        }
        Commands::Check { files } => {
            let errors = check_files(&config, &files)?;
            if errors > 0 {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Init { force } => {
            let path = Config::config_path()?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    path.display()
                );
            }
            let path = Config::create_default_config_file()?;
            println!("Wrote {}", path.display());
            Ok(())
        }
        Commands::ConfigPath => {
            println!("{}", Config::config_path()?.display());
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(Config::load_or_default()),
    }
}

/// Logs go to stderr; stdout carries the protocol.
fn init_logger(default_level: &str) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .target(env_logger::Target::Stderr)
        .init();
}

/// Print diagnostics of every file, returning the number of errors.
fn check_files(config: &Config, files: &[PathBuf]) -> Result<usize> {
    let catalog = Catalog::load(&config.catalog).context("Failed to load component catalog")?;
    let mut errors = 0;

    for file in files {
        let Some(dialect) = Dialect::from_path(&file.to_string_lossy()) else {
            log::warn!("Skipping {}: unsupported file type", file.display());
            continue;
        };
        let text = fs::read_to_string(file)
            .with_context(|| format!("Failed to read file: {}", file.display()))?;
        let diagnostics = compute_diagnostics(&Document::new(&text, 0), dialect, &catalog);

        for diagnostic in &diagnostics {
            if diagnostic.severity == Some(DiagnosticSeverity::ERROR) {
                errors += 1;
            }
            println!("{}", format_diagnostic(file, diagnostic));
        }
    }
    Ok(errors)
}

fn format_diagnostic(file: &Path, diagnostic: &Diagnostic) -> String {
    let severity = match diagnostic.severity {
        Some(DiagnosticSeverity::ERROR) => "error",
        Some(DiagnosticSeverity::WARNING) => "warning",
        Some(DiagnosticSeverity::INFORMATION) => "info",
        _ => "hint",
    };
    let start = diagnostic.range.start;
    format!(
        "{}:{}:{}: {}: {}",
        file.display(),
        start.line + 1,
        start.character + 1,
        severity,
        diagnostic.message.replace('\n', "; ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_lsp::lsp_types::{Position, Range};

    #[test]
    fn test_format_diagnostic() {
        let diagnostic = Diagnostic {
            range: Range::new(Position::new(2, 4), Position::new(2, 9)),
            severity: Some(DiagnosticSeverity::ERROR),
            message: "Unknown option".to_string(),
            ..Default::default()
        };
        assert_eq!(
            format_diagnostic(Path::new("routes.xml"), &diagnostic),
            "routes.xml:3:5: error: Unknown option"
        );
    }

    #[test]
    fn test_args_default_to_serve() {
        let args = Args::parse_from(["camel-lsp"]);
        assert!(args.command.is_none());
        let args = Args::parse_from(["camel-lsp", "check", "a.xml", "--log-level", "debug"]);
        assert!(matches!(args.command, Some(Commands::Check { ref files }) if files.len() == 1));
        assert_eq!(args.log_level.as_deref(), Some("debug"));
    }
}

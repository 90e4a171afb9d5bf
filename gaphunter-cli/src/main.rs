//! GapHunter CLI: terminal front end for research gap analysis.
//!
//! Provides both a one-shot mode driven by flags and an interactive REPL.

mod repl;
mod slash;
mod view;

use clap::Parser;
use gaphunter_core::config::{self, AppConfig};
use std::path::{Path, PathBuf};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// GapHunter: find the research gap across your papers
#[derive(Parser, Debug)]
#[command(name = "gaphunter", version, about, long_about = None)]
struct Cli {
    /// Research topic (runs one analysis and exits)
    #[arg(long)]
    topic: Option<String>,

    /// Abstracts or notes as text
    #[arg(long, conflicts_with = "abstracts_file")]
    abstracts: Option<String>,

    /// Read abstracts or notes from a file
    #[arg(long)]
    abstracts_file: Option<PathBuf>,

    /// Paper file to include (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,

    /// Model to use
    #[arg(short, long)]
    model: Option<String>,

    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Directory rendered diagrams are written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl Cli {
    /// Whether any input flag was given, selecting one-shot mode.
    fn has_inputs(&self) -> bool {
        self.topic.is_some()
            || self.abstracts.is_some()
            || self.abstracts_file.is_some()
            || !self.files.is_empty()
    }

    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.diagram.output_dir = dir.clone();
        }
    }
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Create default configuration file in the workspace
    Init,
    /// Show current configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(filter));

    let log_dir = config::log_dir();
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "gaphunter.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    if let Some(Commands::Config { action }) = &cli.command {
        return handle_config(action, &workspace);
    }

    let mut config = config::load_config(Some(&workspace), None)?;
    cli.apply_overrides(&mut config);

    if cli.has_inputs() {
        let abstracts = match &cli.abstracts_file {
            Some(path) => Some(std::fs::read_to_string(path).map_err(|e| {
                anyhow::anyhow!("Failed to read abstracts file {}: {}", path.display(), e)
            })?),
            None => cli.abstracts.clone(),
        };
        let inputs = repl::OneShotInputs {
            topic: cli.topic.clone(),
            abstracts,
            files: cli.files.clone(),
        };
        repl::run_once(config, workspace, inputs).await
    } else {
        repl::run_interactive(config, workspace).await
    }
}

fn handle_config(action: &ConfigAction, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = config::workspace_config_path(workspace);
            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let toml_str = toml::to_string_pretty(&AppConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = config::load_config(Some(workspace), None)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_no_flags_starts_repl() {
        let cli = Cli::parse_from(["gaphunter"]);
        assert!(!cli.has_inputs());
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_input_flags_select_one_shot() {
        let cli = Cli::parse_from([
            "gaphunter",
            "--topic",
            "Sparse attention",
            "--file",
            "a.pdf",
            "-f",
            "b.pdf",
        ]);
        assert!(cli.has_inputs());
        assert_eq!(cli.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")]);
    }

    #[test]
    fn test_abstracts_and_file_conflict() {
        let result = Cli::try_parse_from([
            "gaphunter",
            "--abstracts",
            "x",
            "--abstracts-file",
            "y.txt",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_apply() {
        let cli = Cli::parse_from([
            "gaphunter",
            "--model",
            "gemini-1.5-pro",
            "--output-dir",
            "/tmp/diagrams",
        ]);
        let mut config = AppConfig::default();
        cli.apply_overrides(&mut config);
        assert_eq!(config.llm.model, "gemini-1.5-pro");
        assert_eq!(config.diagram.output_dir, PathBuf::from("/tmp/diagrams"));
    }

    #[test]
    fn test_config_init_writes_parseable_toml() {
        let dir = tempfile::tempdir().unwrap();
        handle_config(&ConfigAction::Init, dir.path()).unwrap();

        let path = config::workspace_config_path(dir.path());
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: AppConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.llm.model, "gemini-2.0-flash");

        // Second init leaves the file alone.
        std::fs::write(&path, "# edited\n").unwrap();
        handle_config(&ConfigAction::Init, dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# edited\n");
    }
}

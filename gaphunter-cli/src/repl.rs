//! Interactive REPL and one-shot mode.

use crate::slash::CommandRegistry;
use crate::view;
use gaphunter_core::config::AppConfig;
use gaphunter_core::diagram::{DiagramRenderer, DiagramState, DiagramView, MermaidCliRenderer};
use gaphunter_core::orchestrator::{Orchestrator, SubmitOutcome, View};
use gaphunter_core::providers::create_client;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Inputs for a single non-interactive run.
#[derive(Debug, Default)]
pub struct OneShotInputs {
    pub topic: Option<String>,
    pub abstracts: Option<String>,
    pub files: Vec<PathBuf>,
}

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Action {
    /// Print the text and keep reading.
    Continue(String),
    /// Collect lines until a lone "." and store them as abstracts.
    ReadAbstracts,
    Quit,
}

/// The orchestrator plus everything needed to present its state.
pub struct Session {
    orchestrator: Orchestrator,
    renderer: Arc<dyn DiagramRenderer>,
    output_dir: PathBuf,
    registry: CommandRegistry,
}

impl Session {
    pub fn new(
        orchestrator: Orchestrator,
        renderer: Arc<dyn DiagramRenderer>,
        output_dir: PathBuf,
    ) -> Self {
        Self {
            orchestrator,
            renderer,
            output_dir,
            registry: CommandRegistry::with_defaults(),
        }
    }

    /// Build a session from configuration. Relative output paths resolve
    /// against `workspace`.
    pub fn from_config(config: &AppConfig, workspace: &Path) -> anyhow::Result<Self> {
        for warning in config.llm.validate() {
            tracing::warn!(warning = warning.as_str(), "LLM configuration");
        }
        let client = create_client(&config.llm)?;
        let orchestrator = Orchestrator::new(client)
            .with_accepted_extensions(config.files.accepted_extensions.clone());
        let renderer = Arc::new(MermaidCliRenderer::new(&config.diagram));
        let output_dir = if config.diagram.output_dir.is_absolute() {
            config.diagram.output_dir.clone()
        } else {
            workspace.join(&config.diagram.output_dir)
        };
        Ok(Self::new(orchestrator, renderer, output_dir))
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Render the main pane: error banner, then the empty state or the
    /// result with its diagram section.
    pub async fn present(&self) -> String {
        let screen = self.orchestrator.view();
        let mut out = String::new();
        if let Some(message) = &screen.error_banner {
            out.push_str(&view::render_error_banner(message));
        }
        match screen.view {
            View::Empty => out.push_str(&view::render_empty_state()),
            View::Result(result) => {
                out.push_str(&view::render_result(&result));
                let diagram = DiagramView::mount(result.mermaid_code, Arc::clone(&self.renderer));
                let state = diagram.settled().await;
                let saved = match &state {
                    DiagramState::Rendered(rendered) => {
                        match view::save_svg(&self.output_dir, rendered) {
                            Ok(path) => Some(path),
                            Err(e) => {
                                tracing::warn!(
                                    dir = %self.output_dir.display(),
                                    error = %e,
                                    "Could not save rendered diagram"
                                );
                                None
                            }
                        }
                    }
                    _ => None,
                };
                out.push_str(&view::render_diagram_section(&state, saved.as_deref()));
            }
        }
        out
    }

    /// Execute one line of REPL input.
    pub async fn handle_line(&self, input: &str) -> Action {
        let input = input.trim();
        if input.is_empty() {
            return Action::Continue(String::new());
        }
        if !input.starts_with('/') {
            self.orchestrator.set_topic(input);
            return Action::Continue(format!("  Topic set: {}\n", input));
        }

        let (cmd, arg) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        let Some(info) = self.registry.lookup(cmd) else {
            let hint = self
                .registry
                .suggest(cmd)
                .map(|s| format!(" Did you mean {}?", s))
                .unwrap_or_default();
            return Action::Continue(format!(
                "  Unknown command: {}.{} Type /help for commands.\n",
                cmd, hint
            ));
        };

        match info.name {
            "/quit" => Action::Quit,
            "/help" => Action::Continue(self.registry.help_text()),
            "/topic" => {
                self.orchestrator.set_topic(arg);
                if arg.is_empty() {
                    Action::Continue("  Topic cleared.\n".to_string())
                } else {
                    Action::Continue(format!("  Topic set: {}\n", arg))
                }
            }
            "/abstracts" if arg.is_empty() => Action::ReadAbstracts,
            "/abstracts" => {
                self.orchestrator.set_abstracts(arg);
                Action::Continue(format!("  Abstracts set ({} chars).\n", arg.chars().count()))
            }
            "/add" => Action::Continue(self.add_files(arg).await),
            "/remove" => Action::Continue(self.remove_file(arg)),
            "/files" => Action::Continue(view::render_files(&self.orchestrator.snapshot())),
            "/submit" => Action::Continue(self.submit().await),
            "/dismiss" => {
                self.orchestrator.dismiss_error();
                Action::Continue("  Error dismissed.\n".to_string())
            }
            "/show" => Action::Continue(self.present().await),
            "/status" => Action::Continue(view::render_status(
                &self.orchestrator.snapshot(),
                self.orchestrator.model_name(),
            )),
            other => Action::Continue(format!("  {} is not available here.\n", other)),
        }
    }

    async fn add_files(&self, arg: &str) -> String {
        let paths = split_paths(arg);
        if paths.is_empty() {
            return "  Usage: /add <path>...\n".to_string();
        }
        match self.orchestrator.add_files(&paths).await {
            Ok(count) => format!(
                "  Added {} file(s). {} total.\n",
                count,
                self.orchestrator.snapshot().files.len()
            ),
            Err(e) => format!("\x1b[31m  {}\x1b[0m\n  No files were added.\n", e),
        }
    }

    fn remove_file(&self, arg: &str) -> String {
        let Some(index) = arg.parse::<usize>().ok().filter(|n| *n >= 1) else {
            return "  Usage: /remove <n> (see /files for numbers)\n".to_string();
        };
        match self.orchestrator.remove_file(index - 1) {
            Ok(file) => format!("  Removed {}.\n", file.name),
            Err(_) => format!(
                "  No file numbered {}. There are {} file(s).\n",
                index,
                self.orchestrator.snapshot().files.len()
            ),
        }
    }

    async fn submit(&self) -> String {
        if self.orchestrator.can_submit() {
            println!(
                "\x1b[90m  Synthesizing with {}...\x1b[0m",
                self.orchestrator.model_name()
            );
        }
        if let SubmitOutcome::Rejected(reason) = self.orchestrator.submit().await {
            return format!("  Cannot submit: {}.\n", reason);
        }
        self.present().await
    }
}

/// Run one submission from CLI inputs and print the outcome.
///
/// Returns an error when the submission is rejected or fails.
pub async fn run_once(
    config: AppConfig,
    workspace: PathBuf,
    inputs: OneShotInputs,
) -> anyhow::Result<()> {
    let session = Session::from_config(&config, &workspace)?;
    let orchestrator = session.orchestrator();
    if let Some(topic) = inputs.topic {
        orchestrator.set_topic(topic);
    }
    if let Some(abstracts) = inputs.abstracts {
        orchestrator.set_abstracts(abstracts);
    }
    if !inputs.files.is_empty() {
        orchestrator.add_files(&inputs.files).await?;
    }

    let outcome = orchestrator.submit().await;
    println!("{}", session.present().await);
    match outcome {
        SubmitOutcome::Succeeded => Ok(()),
        SubmitOutcome::Failed(message) => anyhow::bail!(message),
        SubmitOutcome::Rejected(reason) => anyhow::bail!("Cannot submit: {}", reason),
    }
}

/// Run the interactive loop until `/quit` or end of input.
pub async fn run_interactive(config: AppConfig, workspace: PathBuf) -> anyhow::Result<()> {
    let session = Session::from_config(&config, &workspace)?;

    println!("\x1b[1;32m");
    println!("  GapHunter");
    println!("\x1b[0m");
    println!(
        "  Model: {} | Workspace: {}",
        session.orchestrator().model_name(),
        workspace.display()
    );
    println!("  Type /help for commands, /quit to exit");
    print!("{}", view::render_empty_state());

    let stdin = io::stdin();
    loop {
        print!("\n\x1b[1;34m> \x1b[0m");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        match session.handle_line(&line).await {
            Action::Continue(text) => print!("{}", text),
            Action::ReadAbstracts => {
                println!("  Paste abstracts or notes. End with a line containing only '.'");
                let text = read_until_dot(&mut stdin.lock())?;
                let chars = text.chars().count();
                session.orchestrator().set_abstracts(text);
                println!("  Abstracts set ({} chars).", chars);
            }
            Action::Quit => {
                println!("Goodbye!");
                break;
            }
        }
    }
    Ok(())
}

/// Split `/add` arguments on whitespace. Single or double quotes group a
/// path containing spaces.
fn split_paths(arg: &str) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;

    for c in arg.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), c) => current.push(c),
            (None, '"' | '\'') => {
                quote = Some(c);
                in_token = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_token {
                    paths.push(PathBuf::from(std::mem::take(&mut current)));
                    in_token = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        paths.push(PathBuf::from(current));
    }
    paths
}

/// Read lines until a lone "." or end of input, joined with '\n'.
fn read_until_dot(reader: &mut impl BufRead) -> io::Result<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        let trimmed = line.trim_end_matches(['\n', '\r']);
        if trimmed == "." {
            break;
        }
        lines.push(trimmed.to_string());
    }
    Ok(lines.join("\n"))
}

//! Slash command registry for the REPL.
//!
//! Holds structured metadata for every `/command`, used for categorized
//! help, alias resolution and "did you mean" suggestions.

/// Categories for grouping commands in `/help` output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandCategory {
    Inputs,
    Analysis,
    Session,
}

impl CommandCategory {
    pub fn label(&self) -> &'static str {
        match self {
            CommandCategory::Inputs => "Inputs",
            CommandCategory::Analysis => "Analysis",
            CommandCategory::Session => "Session",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[
            CommandCategory::Inputs,
            CommandCategory::Analysis,
            CommandCategory::Session,
        ]
    }
}

impl std::fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Metadata describing a slash command.
#[derive(Debug, Clone)]
pub struct CommandInfo {
    /// Primary name including the slash, e.g., "/submit".
    pub name: &'static str,
    /// Alternative aliases, e.g., &["/exit", "/q"] for /quit.
    pub aliases: &'static [&'static str],
    /// One-line description shown in /help.
    pub description: &'static str,
    /// Usage pattern, e.g., "/remove <n>".
    pub usage: &'static str,
    pub category: CommandCategory,
}

/// Registry holding all slash commands with their metadata.
pub struct CommandRegistry {
    commands: Vec<CommandInfo>,
}

impl CommandRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    /// Create a registry pre-populated with all built-in commands.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_defaults();
        registry
    }

    pub fn register(&mut self, info: CommandInfo) {
        self.commands.push(info);
    }

    fn register_defaults(&mut self) {
        // Inputs
        self.register(CommandInfo {
            name: "/topic",
            aliases: &["/t"],
            description: "Set the research topic (no argument clears it)",
            usage: "/topic [text]",
            category: CommandCategory::Inputs,
        });
        self.register(CommandInfo {
            name: "/abstracts",
            aliases: &["/a"],
            description: "Set abstracts or notes; without text, read lines until '.'",
            usage: "/abstracts [text]",
            category: CommandCategory::Inputs,
        });
        self.register(CommandInfo {
            name: "/add",
            aliases: &[],
            description: "Add one or more paper files; quote paths containing spaces",
            usage: "/add <path>...",
            category: CommandCategory::Inputs,
        });
        self.register(CommandInfo {
            name: "/remove",
            aliases: &["/rm"],
            description: "Remove a file by its number in /files",
            usage: "/remove <n>",
            category: CommandCategory::Inputs,
        });
        self.register(CommandInfo {
            name: "/files",
            aliases: &["/ls"],
            description: "List added files",
            usage: "/files",
            category: CommandCategory::Inputs,
        });

        // Analysis
        self.register(CommandInfo {
            name: "/submit",
            aliases: &["/go"],
            description: "Synthesize the gap analysis and proposal",
            usage: "/submit",
            category: CommandCategory::Analysis,
        });
        self.register(CommandInfo {
            name: "/show",
            aliases: &[],
            description: "Show the current result or empty state",
            usage: "/show",
            category: CommandCategory::Analysis,
        });
        self.register(CommandInfo {
            name: "/dismiss",
            aliases: &[],
            description: "Dismiss the error banner",
            usage: "/dismiss",
            category: CommandCategory::Analysis,
        });

        // Session
        self.register(CommandInfo {
            name: "/status",
            aliases: &[],
            description: "Show phase, model and inputs",
            usage: "/status",
            category: CommandCategory::Session,
        });
        self.register(CommandInfo {
            name: "/help",
            aliases: &["/?"],
            description: "Show this help",
            usage: "/help",
            category: CommandCategory::Session,
        });
        self.register(CommandInfo {
            name: "/quit",
            aliases: &["/exit", "/q"],
            description: "Exit GapHunter",
            usage: "/quit",
            category: CommandCategory::Session,
        });
    }

    /// Look up a command by name or alias.
    pub fn lookup(&self, input: &str) -> Option<&CommandInfo> {
        self.commands
            .iter()
            .find(|cmd| cmd.name == input || cmd.aliases.contains(&input))
    }

    /// Generate categorized help text.
    pub fn help_text(&self) -> String {
        let mut output = String::from("\nAvailable commands:\n");

        for category in CommandCategory::all() {
            let cmds: Vec<&CommandInfo> = self
                .commands
                .iter()
                .filter(|c| c.category == *category)
                .collect();

            if cmds.is_empty() {
                continue;
            }

            output.push_str(&format!("\n  {}:\n", category.label()));

            for cmd in cmds {
                let aliases = if cmd.aliases.is_empty() {
                    String::new()
                } else {
                    format!(" ({})", cmd.aliases.join(", "))
                };
                output.push_str(&format!(
                    "    {:<22} {}{}\n",
                    cmd.usage, cmd.description, aliases
                ));
            }
        }

        output.push_str("\nInput:\n  Text without a leading '/' sets the research topic.\n");
        output
    }

    /// Suggest the closest command for an unknown input using edit distance.
    pub fn suggest(&self, input: &str) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;

        for cmd in &self.commands {
            for candidate in std::iter::once(&cmd.name).chain(cmd.aliases.iter()) {
                let dist = edit_distance(input, candidate);
                if dist <= 3 && best.is_none_or(|(_, d)| dist < d) {
                    best = Some((*candidate, dist));
                }
            }
        }

        best.map(|(name, _)| name)
    }
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Levenshtein edit distance over bytes.
fn edit_distance(a: &str, b: &str) -> usize {
    let a = a.as_bytes();
    let b = b.as_bytes();

    let mut prev = (0..=b.len()).collect::<Vec<_>>();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

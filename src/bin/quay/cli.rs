//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

/// Quay - import and export resolution for CMake projects
#[derive(Parser)]
#[command(name = "quay")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Registry file used to resolve project names
    #[arg(long, global = true, env = "QUAY_REGISTRY", value_name = "PATH")]
    pub registry: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Whether the command prints JSON on stdout.
    pub fn wants_json(&self) -> bool {
        matches!(&self.command, Commands::List(args) if args.json)
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a Quay.toml template into a directory
    Init(InitArgs),

    /// Generate the CMake imports file of the current project
    Gen,

    /// Clone every missing import of the current project
    Fetch,

    /// Clone a project by registry name or URL into the workspace
    Clone(CloneArgs),

    /// List imports, merged exports or registry entries
    List(ListArgs),

    /// Display the import tree
    Tree(TreeArgs),

    /// Check imports or required tools
    Diag(DiagArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to current directory)
    pub path: Option<PathBuf>,
}

#[derive(Args)]
pub struct CloneArgs {
    /// Registry name or git URL
    pub name: String,

    /// Branch to check out (defaults to the configured default branch)
    #[arg(long)]
    pub branch: Option<String>,
}

#[derive(Args)]
pub struct ListArgs {
    /// What to list
    #[arg(value_enum)]
    pub what: ListKind,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ListKind {
    /// Every project of the import graph with its imports
    Imports,
    /// The merged exports of all imported projects
    Exports,
    /// Registry entries
    Registry,
}

#[derive(Args)]
pub struct TreeArgs {
    /// Maximum depth to display
    #[arg(long)]
    pub depth: Option<usize>,
}

#[derive(Args)]
pub struct DiagArgs {
    /// What to check
    #[arg(value_enum)]
    pub what: DiagKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum DiagKind {
    /// Missing projects, cycles and export collisions
    Imports,
    /// git, cmake, ninja and make
    Tools,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

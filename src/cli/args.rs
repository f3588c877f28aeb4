//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Load, query and render Doxygen navigation trees
#[derive(Parser, Debug)]
#[command(name = "navtree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output on stderr (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Docs directory (default: configured docs_dir, then cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub docs_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show navigation as tree
    Tree {
        /// Docs directory or navigation script
        #[arg(value_hint = ValueHint::AnyPath)]
        source: Option<PathBuf>,
        /// Deepest level to show (top level is 1)
        #[arg(short, long)]
        max_depth: Option<usize>,
        /// Hide links
        #[arg(long)]
        no_links: bool,
    },

    /// List entries in order, indented by level
    List {
        /// Docs directory or navigation script
        #[arg(value_hint = ValueHint::AnyPath)]
        source: Option<PathBuf>,
    },

    /// List entries without children
    Leaves {
        /// Docs directory or navigation script
        #[arg(value_hint = ValueHint::AnyPath)]
        source: Option<PathBuf>,
    },

    /// Show the breadcrumb for a page
    Find {
        /// Page link, e.g. doc_api.html or doc_api.html#anchor
        link: String,
        /// Docs directory or navigation script
        #[arg(value_hint = ValueHint::AnyPath)]
        source: Option<PathBuf>,
    },

    /// Validate every navigation script in a directory
    Check {
        /// Docs directory
        #[arg(value_hint = ValueHint::DirPath)]
        dir: Option<PathBuf>,
    },

    /// Write the fully expanded tree as one script
    Export {
        /// Docs directory or navigation script
        #[arg(value_hint = ValueHint::AnyPath)]
        source: Option<PathBuf>,
        /// Binding name (default: name of the loaded binding)
        #[arg(short, long)]
        name: Option<String>,
        /// Output file (default: stdout)
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Print a config template
    Template,
    /// Show config file locations
    Path,
}

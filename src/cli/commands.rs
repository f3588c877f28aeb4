use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use itertools::Itertools;
use tracing::{debug, instrument};

use crate::application::services::NavDocument;
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, local_config_path, Settings};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;
use crate::tree_traits::{RenderOptions, TreeNodeConvert};

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };
    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        clap_complete::generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let source = command_source(command).or(cli.docs_dir.as_deref());
    let settings = Settings::load(source.map(settings_dir).as_deref())?;
    let container = ServiceContainer::new(settings);
    let source = source
        .map(Path::to_path_buf)
        .unwrap_or_else(|| container.settings.docs_dir.clone());

    match command {
        Commands::Tree {
            max_depth,
            no_links,
            ..
        } => _tree(&container, &source, *max_depth, *no_links),
        Commands::List { .. } => _list(&container, &source),
        Commands::Leaves { .. } => _leaves(&container, &source),
        Commands::Find { link, .. } => _find(&container, &source, link),
        Commands::Check { .. } => _check(&container, &source),
        Commands::Export { name, output, .. } => {
            _export(&container, &source, name.as_deref(), output.as_deref())
        }
        Commands::Config { command } => _config(&container, command, &source),
        Commands::Completion { .. } => Ok(()),
    }
}

fn command_source(command: &Commands) -> Option<&Path> {
    match command {
        Commands::Tree { source, .. }
        | Commands::List { source }
        | Commands::Leaves { source }
        | Commands::Find { source, .. }
        | Commands::Export { source, .. } => source.as_deref(),
        Commands::Check { dir } => dir.as_deref(),
        Commands::Config { .. } | Commands::Completion { .. } => None,
    }
}

/// Directory holding the local config for a source path.
fn settings_dir(source: &Path) -> PathBuf {
    if source.is_file() {
        source.parent().unwrap_or(Path::new(".")).to_path_buf()
    } else {
        source.to_path_buf()
    }
}

fn load(container: &ServiceContainer, source: &Path) -> CliResult<NavDocument> {
    debug!("source: {:?}", source);
    let doc = if container.fs.is_file(source) {
        container.navigation.load_file(source)?
    } else if container.fs.is_dir(source) {
        container.navigation.load_dir(source)?
    } else {
        return Err(CliError::InvalidArgs(format!(
            "not a file or directory: {}",
            source.display()
        )));
    };
    Ok(doc)
}

#[instrument(skip(container))]
fn _tree(
    container: &ServiceContainer,
    source: &Path,
    max_depth: Option<usize>,
    no_links: bool,
) -> CliResult<()> {
    let doc = load(container, source)?;
    let options = RenderOptions {
        max_depth,
        show_links: container.settings.show_links && !no_links,
    };
    output::info(&doc.tree.to_tree_string(options));
    Ok(())
}

#[instrument(skip(container))]
fn _list(container: &ServiceContainer, source: &Path) -> CliResult<()> {
    let doc = load(container, source)?;
    for (_, depth, node) in doc.tree.iter() {
        output::entry(depth - 1, &node.data.label, &node.data.link);
    }
    Ok(())
}

#[instrument(skip(container))]
fn _leaves(container: &ServiceContainer, source: &Path) -> CliResult<()> {
    let doc = load(container, source)?;
    for idx in doc.tree.leaf_nodes() {
        if let Some(node) = doc.tree.get_node(idx) {
            output::entry(0, &node.data.label, &node.data.link);
        }
    }
    Ok(())
}

#[instrument(skip(container))]
fn _find(container: &ServiceContainer, source: &Path, link: &str) -> CliResult<()> {
    let doc = load(container, source)?;
    let crumbs = doc.breadcrumb(link)?;
    output::info(&crumbs.iter().join(" > "));
    Ok(())
}

#[instrument(skip(container))]
fn _check(container: &ServiceContainer, dir: &Path) -> CliResult<()> {
    let reports = container.navigation.check_dir(dir)?;
    if reports.is_empty() {
        output::warning(&format!("no navigation scripts found in {}", dir.display()));
        return Ok(());
    }

    output::header(&format!("Checking {} navigation scripts", reports.len()));
    let mut failed = 0;
    for report in &reports {
        let name = report
            .path
            .strip_prefix(dir)
            .unwrap_or(&report.path)
            .display();
        match &report.result {
            Ok(entries) => {
                output::success_detail(&format!("{name} ({}: {entries} entries)", report.binding))
            }
            Err(e) => {
                failed += 1;
                output::failure(&format!("{name}: {e}"));
            }
        }
    }

    if failed > 0 {
        return Err(CliError::CheckFailed(failed, reports.len()));
    }
    Ok(())
}

#[instrument(skip(container))]
fn _export(
    container: &ServiceContainer,
    source: &Path,
    name: Option<&str>,
    output_path: Option<&Path>,
) -> CliResult<()> {
    let doc = load(container, source)?;
    let script = container.navigation.export(&doc, name);
    match output_path {
        Some(path) => {
            container
                .fs
                .write(path, &script)
                .map_err(|e| InfraError::io(format!("write {}", path.display()), e))?;
            output::action("Exported", &format!("{} entries to {}", doc.tree.len(), path.display()));
        }
        None => output::info(script.trim_end()),
    }
    Ok(())
}

#[instrument(skip(container))]
fn _config(container: &ServiceContainer, command: &ConfigCommands, source: &Path) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::header("Effective configuration");
            output::info(&container.settings.to_toml()?);
        }
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            let global = global_config_path()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unavailable>".to_string());
            output::info(&format!("global: {global}"));
            output::info(&format!(
                "local:  {}",
                local_config_path(&settings_dir(source)).display()
            ));
        }
    }
    Ok(())
}

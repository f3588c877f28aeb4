//! Navigation tree service
//!
//! Loads Doxygen navigation data from a docs directory: the entry script
//! (`navtreedata.js`) plus every fragment script it references.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult, DomainResultExt, IoResultExt};
use crate::config::Settings;
use crate::domain::{
    is_navigation_script, to_expanded_literal, to_script, DomainError, DomainResult,
    FragmentResolver, Literal, NavTree, NavTreeLoader, Script,
};
use crate::infrastructure::traits::FileSystem;

/// A loaded navigation tree with its page index.
#[derive(Debug)]
pub struct NavDocument {
    /// Script the tree was loaded from
    pub entry: PathBuf,
    pub tree: NavTree,
    /// Page-chunk names from the index binding, empty when absent
    pub index: Vec<String>,
}

impl NavDocument {
    /// Labels from the top level down to the entry for `link`.
    pub fn breadcrumb(&self, link: &str) -> ApplicationResult<Vec<&str>> {
        let idx = self
            .tree
            .find_by_link(link)
            .ok_or_else(|| ApplicationError::LinkNotFound(link.to_string()))?;
        self.tree
            .path_to(idx)?
            .into_iter()
            .map(|i| self.tree.label_of(i).map_err(ApplicationError::from))
            .collect()
    }
}

/// Validation outcome for one script file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Binding that was validated
    pub binding: String,
    /// Number of entries, or why the file is invalid
    pub result: Result<usize, ApplicationError>,
}

/// Resolves fragment references to `<dir>/<name>.<ext>`.
struct DirResolver<'a> {
    fs: &'a dyn FileSystem,
    dir: &'a Path,
    ext: &'a str,
}

impl FragmentResolver for DirResolver<'_> {
    fn resolve(&self, name: &str) -> DomainResult<Option<Literal>> {
        let path = self.dir.join(format!("{name}.{}", self.ext));
        if !self.fs.is_file(&path) {
            debug!("no fragment file: {}", path.display());
            return Ok(None);
        }
        let src = self
            .fs
            .read_to_string(&path)
            .map_err(|e| DomainError::FragmentUnavailable {
                name: name.to_string(),
                reason: format!("{}: {e}", path.display()),
            })?;
        let script = Script::parse(&src).map_err(|e| DomainError::in_fragment(name, e))?;
        script
            .get(name)
            .or_else(|| script.first_array().map(|b| &b.value))
            .cloned()
            .map(Some)
            .ok_or_else(|| DomainError::in_fragment(name, DomainError::MissingBinding(name.to_string())))
    }
}

/// Service for loading and inspecting navigation trees.
pub struct NavigationService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl NavigationService {
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn entry_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.settings.entry_file)
    }

    /// Load the full tree of a docs directory, expanding all fragments.
    #[instrument(level = "debug", skip(self))]
    pub fn load_dir(&self, dir: &Path) -> ApplicationResult<NavDocument> {
        let entry = self.entry_path(dir);
        if !self.fs.is_file(&entry) {
            return Err(ApplicationError::EntryNotFound(entry));
        }
        self.load_file(&entry)
    }

    /// Load one script; references resolve against the script's directory.
    #[instrument(level = "debug", skip(self))]
    pub fn load_file(&self, path: &Path) -> ApplicationResult<NavDocument> {
        let src = self
            .fs
            .read_to_string(path)
            .with_path_context("read navigation data", path)?;
        let script = Script::parse(&src).in_file(path)?;

        let binding = script
            .bindings
            .iter()
            .find(|b| b.name == self.settings.root_var)
            .or_else(|| script.first_array())
            .ok_or_else(|| DomainError::MissingBinding(self.settings.root_var.clone()))
            .in_file(path)?;

        let dir = path.parent().unwrap_or(Path::new("."));
        let resolver = DirResolver {
            fs: self.fs.as_ref(),
            dir,
            ext: &self.settings.fragment_ext,
        };
        let tree = NavTreeLoader::new()
            .with_resolver(&resolver)
            .root_name(&binding.name)
            .strict(self.settings.strict)
            .load(&binding.value)
            .in_file(path)?;

        let index = match script.get(&self.settings.index_var) {
            Some(Literal::Array(items)) => items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect(),
            Some(other) => {
                warn!(
                    "{} is not an array ({}), ignoring",
                    self.settings.index_var,
                    other.kind()
                );
                Vec::new()
            }
            None => Vec::new(),
        };

        info!(
            "loaded {} entries from {} (depth {})",
            tree.len(),
            path.display(),
            tree.depth()
        );
        Ok(NavDocument {
            entry: path.to_path_buf(),
            tree,
            index,
        })
    }

    /// Validate every navigation script below `dir` on its own, without
    /// following references.
    ///
    /// Files that are not navigation scripts (search indexes, plain code) are
    /// skipped. Unreadable files are reported instead of aborting the scan.
    #[instrument(level = "debug", skip(self))]
    pub fn check_dir(&self, dir: &Path) -> ApplicationResult<Vec<FileReport>> {
        if !self.fs.is_dir(dir) {
            return Err(ApplicationError::EntryNotFound(dir.to_path_buf()));
        }
        let files = self
            .fs
            .list_files(dir, &self.settings.fragment_ext)
            .with_path_context("scan directory", dir)?;

        let mut reports = Vec::new();
        for path in files {
            let src = match self.fs.read_to_string(&path).with_path_context("read script", &path) {
                Ok(src) => src,
                Err(e) => {
                    warn!("{}", e);
                    reports.push(FileReport {
                        path,
                        binding: String::new(),
                        result: Err(e),
                    });
                    continue;
                }
            };
            if !is_navigation_script(&src) {
                debug!("not a navigation script, skipping: {}", path.display());
                continue;
            }
            let script = match Script::parse(&src) {
                Ok(script) => script,
                Err(e) => {
                    reports.push(FileReport {
                        path,
                        binding: String::new(),
                        result: Err(e.into()),
                    });
                    continue;
                }
            };
            let Some(binding) = script
                .bindings
                .iter()
                .find(|b| b.name == self.settings.root_var)
                .or_else(|| {
                    script
                        .bindings
                        .iter()
                        .find(|b| b.name != self.settings.index_var && b.value.as_array().is_some())
                })
            else {
                debug!("no navigation binding, skipping: {}", path.display());
                continue;
            };
            let result = NavTreeLoader::new()
                .root_name(&binding.name)
                .load(&binding.value)
                .map(|tree| tree.len())
                .map_err(ApplicationError::from);
            reports.push(FileReport {
                path,
                binding: binding.name.clone(),
                result,
            });
        }
        Ok(reports)
    }

    /// The whole tree as one self-contained script.
    pub fn export(&self, doc: &NavDocument, name: Option<&str>) -> String {
        to_script(name.unwrap_or(doc.tree.name()), &to_expanded_literal(&doc.tree))
    }
}

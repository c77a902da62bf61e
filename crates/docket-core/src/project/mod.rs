//! Build project model.
//!
//! A [`BuildProject`] describes configurations of named targets, each with
//! sources, include paths, definitions and options. The command backend asks
//! it which flags to use when compiling an example from a given source.
//! Projects are read from JSON or YAML description files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration selected when none is named.
pub const DEFAULT_CONFIGURATION: &str = "Debug";

/// Description files looked for in a build directory, in order.
pub const PROJECT_FILE_NAMES: &[&str] = &[
    "docket-project.json",
    "docket-project.yaml",
    "docket-project.yml",
];

/// Extensions tried when looking for the headers of a source.
const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hxx", "h++"];

/// Extensions of linkable shared objects.
const SHARED_LIBRARY_EXTENSIONS: &[&str] = &["so", "dll", "dylib"];

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("Failed to read project file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON project description: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML project description: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Unsupported project file format: {0}")]
    UnsupportedFormat(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetKind {
    Executable,
    StaticLibrary,
    SharedLibrary,
    InterfaceLibrary,
}

impl TargetKind {
    pub fn is_library(self) -> bool {
        !matches!(self, TargetKind::Executable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: TargetKind,
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub compile_definitions: Vec<String>,
    #[serde(default)]
    pub compile_options: Vec<String>,
    #[serde(default)]
    pub link_libraries: Vec<String>,
}

impl Target {
    pub fn new(name: impl Into<String>, kind: TargetKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sources: Vec::new(),
            include_paths: Vec::new(),
            compile_definitions: Vec::new(),
            compile_options: Vec::new(),
            link_libraries: Vec::new(),
        }
    }

    pub fn with_sources<I, S>(mut self, sources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sources.extend(sources.into_iter().map(Into::into));
        self
    }

    /// Whether `source` is one of this target's sources.
    ///
    /// Paths are compared by trailing components, so `src/a.cpp` matches
    /// `/work/src/a.cpp` in either direction.
    pub fn owns(&self, source: &str) -> bool {
        let wanted = Path::new(source);
        self.sources.iter().any(|s| {
            let own = Path::new(s);
            own.ends_with(wanted) || wanted.ends_with(own)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
    pub name: String,
    #[serde(default)]
    pub directory: String,
    #[serde(default)]
    pub targets: Vec<Target>,
}

/// Flags needed to compile one source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileCommand {
    pub definitions: Vec<String>,
    pub options: Vec<String>,
    pub include_paths: Vec<String>,
}

impl CompileCommand {
    /// As compiler arguments: `-I` paths, `-D` definitions, then options.
    pub fn to_args(&self) -> Vec<String> {
        self.include_paths
            .iter()
            .map(|p| format!("-I{}", p))
            .chain(self.definitions.iter().map(|d| format!("-D{}", d)))
            .chain(self.options.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProject {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub source_directory: String,
    #[serde(default)]
    pub build_directory: String,
    #[serde(default)]
    pub configurations: Vec<BuildConfiguration>,
    /// Configuration the queries look at.
    #[serde(default = "default_configuration")]
    pub current_configuration: String,
}

fn default_configuration() -> String {
    DEFAULT_CONFIGURATION.to_string()
}

impl BuildProject {
    pub fn new(
        name: impl Into<String>,
        source_directory: impl Into<String>,
        build_directory: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: None,
            source_directory: source_directory.into(),
            build_directory: build_directory.into(),
            configurations: Vec::new(),
            current_configuration: default_configuration(),
        }
    }

    /// First description file present in `build_dir`.
    pub fn find_in(build_dir: impl AsRef<Path>) -> Option<PathBuf> {
        let build_dir = build_dir.as_ref();
        PROJECT_FILE_NAMES
            .iter()
            .map(|name| build_dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Load a `.json`, `.yaml` or `.yml` description.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ProjectError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        let project: BuildProject = match extension.as_str() {
            "json" => serde_json::from_str(&content)?,
            "yaml" | "yml" => serde_yaml::from_str(&content)?,
            other => return Err(ProjectError::UnsupportedFormat(other.to_string())),
        };

        tracing::debug!(
            project = %project.name,
            configurations = project.configurations.len(),
            "loaded build project"
        );
        Ok(project)
    }

    pub fn configuration(&self) -> &str {
        &self.current_configuration
    }

    /// Switch configuration. Returns false if no configuration has that name.
    pub fn set_configuration(&mut self, name: &str) -> bool {
        if self.configurations.iter().any(|c| c.name == name) {
            self.current_configuration = name.to_string();
            true
        } else {
            false
        }
    }

    fn current(&self) -> Option<&BuildConfiguration> {
        self.configurations
            .iter()
            .find(|c| c.name == self.current_configuration)
    }

    /// Targets of the current configuration.
    pub fn targets(&self) -> &[Target] {
        self.current().map(|c| c.targets.as_slice()).unwrap_or(&[])
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets().iter().find(|t| t.name == name)
    }

    /// Add or replace a target, creating the configuration if needed.
    pub fn add_target(&mut self, target: Target, configuration: Option<&str>) {
        let name = configuration
            .unwrap_or(self.current_configuration.as_str())
            .to_string();

        let index = match self.configurations.iter().position(|c| c.name == name) {
            Some(i) => i,
            None => {
                self.configurations.push(BuildConfiguration {
                    directory: format!("{}/{}", self.build_directory, name),
                    name,
                    targets: Vec::new(),
                });
                self.configurations.len() - 1
            }
        };

        let targets = &mut self.configurations[index].targets;
        match targets.iter_mut().find(|t| t.name == target.name) {
            Some(existing) => *existing = target,
            None => targets.push(target),
        }
    }

    /// Remove a target. Returns false if it was not there.
    pub fn remove_target(&mut self, name: &str, configuration: Option<&str>) -> bool {
        let wanted = configuration
            .unwrap_or(self.current_configuration.as_str())
            .to_string();
        let Some(config) = self.configurations.iter_mut().find(|c| c.name == wanted) else {
            return false;
        };
        let before = config.targets.len();
        config.targets.retain(|t| t.name != name);
        config.targets.len() != before
    }

    pub fn executable_targets(&self) -> Vec<&Target> {
        self.targets()
            .iter()
            .filter(|t| t.kind == TargetKind::Executable)
            .collect()
    }

    pub fn library_targets(&self) -> Vec<&Target> {
        self.targets().iter().filter(|t| t.kind.is_library()).collect()
    }

    /// Every source of every target, first occurrence order.
    pub fn all_sources(&self) -> Vec<String> {
        dedup(self.targets().iter().flat_map(|t| t.sources.iter()))
    }

    pub fn all_include_paths(&self) -> Vec<String> {
        dedup(self.targets().iter().flat_map(|t| t.include_paths.iter()))
    }

    /// Shared-library targets plus linked shared objects.
    pub fn all_shared_libraries(&self) -> Vec<String> {
        dedup(self.targets().iter().flat_map(|t| {
            let own = (t.kind == TargetKind::SharedLibrary).then_some(&t.name);
            let linked = t.link_libraries.iter().filter(|lib| {
                Path::new(lib.as_str())
                    .extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| SHARED_LIBRARY_EXTENSIONS.contains(&e))
            });
            own.into_iter().chain(linked)
        }))
    }

    /// Every source plus same-stem header candidates.
    pub fn candidate_sources_and_headers(&self) -> Vec<String> {
        let mut candidates = Vec::new();
        for source in self.all_sources() {
            let path = Path::new(&source);
            let headers: Vec<String> = HEADER_EXTENSIONS
                .iter()
                .map(|ext| path.with_extension(ext).to_string_lossy().into_owned())
                .collect();
            candidates.push(source.clone());
            candidates.extend(headers);
        }
        dedup(candidates.iter())
    }

    /// Target whose sources include `source`.
    pub fn target_for_source(&self, source: &str) -> Option<&Target> {
        self.targets().iter().find(|t| t.owns(source))
    }

    pub fn compile_command_for(&self, source: &str) -> Option<CompileCommand> {
        let target = self.target_for_source(source)?;
        Some(CompileCommand {
            definitions: target.compile_definitions.clone(),
            options: target.compile_options.clone(),
            include_paths: target.include_paths.clone(),
        })
    }
}

fn dedup<'a>(items: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    items
        .into_iter()
        .filter(|&item| seen.insert(item.as_str()))
        .cloned()
        .collect()
}

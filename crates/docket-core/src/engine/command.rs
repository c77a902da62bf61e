//! Compile-and-run backend built on an external C++ compiler.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{BackendError, ExecutionBackend, ExecutionRequest};
use crate::config::BackendConfig;
use crate::project::BuildProject;

const HEADER_EXTENSIONS: &[&str] = &["h", "hpp", "hxx"];

/// Wrap example code in a `main` that prints its last expression.
///
/// Every line but the last is emitted as a statement. The last line is
/// streamed to `std::cout` unless it already ends a statement or block.
pub fn render_program(code: &str, includes: &[String]) -> String {
    let mut program = String::from("#include <iostream>\n");
    for header in includes {
        program.push_str(&format!("#include \"{}\"\n", header));
    }
    program.push_str("\nint main() {\n    std::cout << std::boolalpha;\n");

    let lines: Vec<&str> = code
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();
    if let Some((last, body)) = lines.split_last() {
        for line in body {
            program.push_str(&format!("    {}\n", line));
        }
        if last.ends_with(';') || last.ends_with('}') {
            program.push_str(&format!("    {}\n", last));
        } else {
            program.push_str(&format!("    std::cout << ({}) << std::endl;\n", last));
        }
    }

    program.push_str("    return 0;\n}\n");
    program
}

/// Runs examples by compiling them with `g++` (or another compiler).
#[derive(Debug, Clone)]
pub struct CommandBackend {
    compiler: String,
    flags: Vec<String>,
    includes: Vec<String>,
    project: Option<BuildProject>,
    work_dir: PathBuf,
}

impl CommandBackend {
    pub fn new(compiler: impl Into<String>) -> Self {
        Self {
            compiler: compiler.into(),
            flags: Vec::new(),
            includes: Vec::new(),
            project: None,
            work_dir: std::env::temp_dir(),
        }
    }

    pub fn from_config(config: &BackendConfig) -> Self {
        Self {
            flags: config.flags.clone(),
            includes: config.includes.clone(),
            ..Self::new(&config.compiler)
        }
    }

    pub fn with_project(mut self, project: BuildProject) -> Self {
        self.project = Some(project);
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = dir.into();
        self
    }

    /// Headers for the generated program: configured ones, then the
    /// example's own file when it is a header.
    fn includes_for(&self, source_file: &str) -> Vec<String> {
        let mut includes = self.includes.clone();
        let path = Path::new(source_file);
        let is_header = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| HEADER_EXTENSIONS.contains(&e));
        if is_header {
            let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
            includes.push(absolute.to_string_lossy().into_owned());
        }
        includes
    }

    /// Compiler arguments for an example from `source_file`.
    fn compile_args(&self, source_file: &str) -> Vec<String> {
        let mut args = self.flags.clone();
        if let Some(command) = self
            .project
            .as_ref()
            .and_then(|p| p.compile_command_for(source_file))
        {
            args.extend(command.to_args());
        }
        args
    }

    async fn compile(&self, source: &Path, binary: &Path, source_file: &str) -> Result<(), BackendError> {
        let output = Command::new(&self.compiler)
            .args(self.compile_args(source_file))
            .arg("-o")
            .arg(binary)
            .arg(source)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    BackendError::Unavailable(format!("compiler '{}' not found", self.compiler))
                }
                _ => BackendError::Io(e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(BackendError::Compile(stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn run_binary(&self, binary: &Path) -> Result<String, BackendError> {
        let output = Command::new(binary).kill_on_drop(true).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = if stderr.is_empty() {
                format!("exited with {}", output.status)
            } else {
                stderr
            };
            return Err(BackendError::Runtime(message));
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for CommandBackend {
    fn default() -> Self {
        Self::from_config(&BackendConfig::default())
    }
}

#[async_trait]
impl ExecutionBackend for CommandBackend {
    async fn execute(&self, request: &ExecutionRequest) -> Result<String, BackendError> {
        let stem = format!("docket_{}", uuid::Uuid::new_v4().simple());
        let source = self.work_dir.join(format!("{}.cpp", stem));
        let binary = self.work_dir.join(&stem);

        let program = render_program(&request.code, &self.includes_for(&request.source_file));
        tokio::fs::write(&source, program).await?;

        let outcome = match self.compile(&source, &binary, &request.source_file).await {
            Ok(()) => self.run_binary(&binary).await,
            Err(e) => Err(e),
        };

        let _ = tokio::fs::remove_file(&source).await;
        let _ = tokio::fs::remove_file(&binary).await;
        outcome
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::{Target, TargetKind};

    #[test]
    fn test_render_prints_last_expression() {
        let program = render_program("int x = 2;\nx * 3", &[]);
        assert!(program.contains("    int x = 2;\n"));
        assert!(program.contains("std::cout << (x * 3) << std::endl;"));
    }

    #[test]
    fn test_render_keeps_statement() {
        let program = render_program("std::cout << 1;", &["math.hpp".to_string()]);
        assert!(program.contains("#include \"math.hpp\""));
        assert!(program.contains("    std::cout << 1;\n"));
        assert!(!program.contains("std::endl"));
    }

    #[test]
    fn test_compile_args_from_project() {
        let mut project = BuildProject::new("demo", ".", "build");
        let mut target = Target::new("math", TargetKind::StaticLibrary).with_sources(["src/math.cpp"]);
        target.include_paths.push("include".into());
        project.add_target(target, None);

        let backend = CommandBackend::new("g++").with_project(project);
        assert_eq!(backend.compile_args("src/math.cpp"), vec!["-Iinclude"]);
        assert!(backend.compile_args("src/other.cpp").is_empty());
    }

    #[test]
    fn test_header_is_included() {
        let backend = CommandBackend::new("g++");
        assert_eq!(backend.includes_for("missing/math.hpp"), vec!["missing/math.hpp"]);
        assert!(backend.includes_for("math.cpp").is_empty());
    }
}

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use super::{RenderError, Typeset, TypesetEngine, validate_svg};

/// Argument that is replaced by the markup. Without it the markup is appended
/// after a `--` so a leading `-` is not read as an option.
pub const MARKUP_PLACEHOLDER: &str = "{}";

/// Default command: MathJax's `tex2svg` CLI, markup as the last argument.
pub const DEFAULT_ENGINE_COMMAND: &str = "tex2svg";

/// Engine backed by an external command that prints SVG to stdout.
#[derive(Debug)]
pub struct ProcessEngine {
    program: String,
    args: Vec<String>,
    resolved: OnceLock<PathBuf>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            resolved: OnceLock::new(),
        }
    }

    /// Build from a whitespace-separated command line (no shell quoting).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::EngineUnavailable`] for an empty command line.
    pub fn from_command_line(line: &str) -> Result<Self, RenderError> {
        let mut parts = line.split_whitespace().map(ToOwned::to_owned);
        let program = parts
            .next()
            .ok_or_else(|| RenderError::EngineUnavailable("empty engine command".to_string()))?;
        Ok(Self::new(program, parts.collect()))
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    fn command_args(&self, markup: &str) -> Vec<String> {
        let mut substituted = false;
        let mut args: Vec<String> = self
            .args
            .iter()
            .map(|arg| {
                if arg == MARKUP_PLACEHOLDER {
                    substituted = true;
                    markup.to_string()
                } else {
                    arg.clone()
                }
            })
            .collect();
        if !substituted {
            args.push("--".to_string());
            args.push(markup.to_string());
        }
        args
    }
}

impl TypesetEngine for ProcessEngine {
    fn name(&self) -> &str {
        &self.program
    }

    fn is_ready(&self) -> bool {
        self.resolved.get().is_some()
    }

    fn wait_ready(&self) -> Result<(), RenderError> {
        if self.is_ready() {
            return Ok(());
        }
        let path = resolve_program(&self.program).ok_or_else(|| {
            RenderError::EngineUnavailable(format!("`{}` not found on PATH", self.program))
        })?;
        tracing::debug!(program = %self.program, path = %path.display(), "engine ready");
        let _ = self.resolved.set(path);
        Ok(())
    }

    fn typeset(&self, markup: &str) -> Result<Typeset, RenderError> {
        let Some(path) = self.resolved.get() else {
            return Err(RenderError::EngineUnavailable(format!(
                "`{}` has not been located yet",
                self.program
            )));
        };
        let output = Command::new(path)
            .args(self.command_args(markup))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            tracing::debug!(status = %output.status, %stderr, "engine rejected markup");
            return Err(RenderError::Failed {
                status: output.status.to_string(),
                stderr,
            });
        }
        validate_svg(markup, &String::from_utf8_lossy(&output.stdout))
    }
}

/// Locate `program` the way a shell would.
fn resolve_program(program: &str) -> Option<PathBuf> {
    let direct = Path::new(program);
    if direct.components().count() > 1 {
        return direct.is_file().then(|| direct.to_path_buf());
    }
    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths).find_map(|dir| {
        let candidate = dir.join(program);
        if candidate.is_file() {
            return Some(candidate);
        }
        #[cfg(windows)]
        {
            let exe = dir.join(format!("{program}.exe"));
            if exe.is_file() {
                return Some(exe);
            }
        }
        None
    })
}

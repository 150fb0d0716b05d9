use std::path::PathBuf;
use std::str::FromStr;

/// One coverage input: a report file and the format it is in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageSource {
    /// Format name, e.g. `lcov` or `chutzpah`. Checked when the source is
    /// loaded.
    pub mode: String,
    pub input: PathBuf,
}

impl FromStr for CoverageSource {
    type Err = String;

    /// Parse `MODE=PATH`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (mode, input) = s
            .split_once('=')
            .ok_or_else(|| format!("expected MODE=PATH, got '{s}'"))?;
        let (mode, input) = (mode.trim(), input.trim());
        if mode.is_empty() || input.is_empty() {
            return Err(format!("expected MODE=PATH, got '{s}'"));
        }
        Ok(Self {
            mode: mode.to_string(),
            input: PathBuf::from(input),
        })
    }
}

/// Everything a publish run needs to know, already validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationSettings {
    pub repo_token: String,
    pub base_path: PathBuf,
    pub coverage_sources: Vec<CoverageSource>,
    pub output_file: Option<PathBuf>,
    pub dry_run: bool,
    pub use_relative_paths: bool,
    pub treat_upload_errors_as_warnings: bool,
}

impl ConfigurationSettings {
    pub fn new(repo_token: impl Into<String>, base_path: impl Into<PathBuf>) -> Self {
        Self {
            repo_token: repo_token.into(),
            base_path: base_path.into(),
            coverage_sources: Vec::new(),
            output_file: None,
            dry_run: false,
            use_relative_paths: false,
            treat_upload_errors_as_warnings: false,
        }
    }
}

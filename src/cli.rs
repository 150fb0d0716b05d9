//! Command-line surface of the covpub binary.
//!
//! `Cli` only describes flags; the conversions below turn it into the
//! library's settings and override types so they can be tested without
//! spawning the binary.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

use crate::config::{ConfigurationSettings, CoverageSource};
use crate::git_data::GitOverrides;
use crate::metadata::MetadataOverrides;

/// Publish code coverage reports to Coveralls.
#[derive(Parser, Debug)]
#[command(name = "covpub", version, about)]
pub struct Cli {
    /// Coveralls repository token. Optional for dry runs.
    #[arg(long, env = "COVERALLS_REPO_TOKEN", hide_env_values = true)]
    pub repo_token: Option<String>,

    /// Coverage source as MODE=PATH (chutzpah, lcov, cobertura, istanbul,
    /// gocover). Repeat for several reports.
    #[arg(long = "source", value_name = "MODE=PATH", required = true)]
    pub sources: Vec<CoverageSource>,

    /// Directory that source paths are resolved against (default: current
    /// directory).
    #[arg(long)]
    pub base_path: Option<PathBuf>,

    /// Report source paths relative to the base path.
    #[arg(long)]
    pub use_relative_paths: bool,

    /// Also write the job payload to this file.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Do everything except the upload.
    #[arg(long)]
    pub dry_run: bool,

    /// Report upload failures without failing the run.
    #[arg(long)]
    pub treat_upload_errors_as_warnings: bool,

    #[arg(long, default_value = "https://coveralls.io")]
    pub server_url: String,

    #[arg(long)]
    pub commit_id: Option<String>,

    #[arg(long)]
    pub commit_branch: Option<String>,

    #[arg(long)]
    pub commit_author: Option<String>,

    #[arg(long)]
    pub commit_email: Option<String>,

    #[arg(long)]
    pub commit_message: Option<String>,

    /// Remote name for --remote-url (default: origin).
    #[arg(long, requires = "remote_url")]
    pub remote_name: Option<String>,

    #[arg(long)]
    pub remote_url: Option<String>,

    /// CI service name reported to Coveralls.
    #[arg(long)]
    pub service_name: Option<String>,

    #[arg(long)]
    pub job_id: Option<String>,

    #[arg(long)]
    pub build_number: Option<String>,

    #[arg(long)]
    pub pull_request: Option<String>,

    /// Mark this job as one of several parallel jobs.
    #[arg(long)]
    pub parallel: bool,
}

impl Cli {
    pub fn settings(&self) -> Result<ConfigurationSettings> {
        let repo_token = match (&self.repo_token, self.dry_run) {
            (Some(token), _) if !token.trim().is_empty() => token.clone(),
            (_, true) => String::new(),
            _ => bail!("a repo token is required (--repo-token or COVERALLS_REPO_TOKEN)"),
        };

        let base_path = match &self.base_path {
            Some(path) => path.clone(),
            None => std::env::current_dir().context("Failed to determine current directory")?,
        };

        Ok(ConfigurationSettings {
            repo_token,
            base_path,
            coverage_sources: self.sources.clone(),
            output_file: self.output.clone(),
            dry_run: self.dry_run,
            use_relative_paths: self.use_relative_paths,
            treat_upload_errors_as_warnings: self.treat_upload_errors_as_warnings,
        })
    }

    pub fn git_overrides(&self) -> GitOverrides {
        GitOverrides {
            commit_id: self.commit_id.clone(),
            branch: self.commit_branch.clone(),
            author: self.commit_author.clone(),
            email: self.commit_email.clone(),
            message: self.commit_message.clone(),
            remote_name: self.remote_name.clone(),
            remote_url: self.remote_url.clone(),
        }
    }

    pub fn metadata_overrides(&self) -> MetadataOverrides {
        MetadataOverrides {
            service_name: self.service_name.clone(),
            job_id: self.job_id.clone(),
            build_number: self.build_number.clone(),
            pull_request_id: self.pull_request.clone(),
            parallel: self.parallel,
        }
    }
}

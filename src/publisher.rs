//! The publish run: load every coverage source, build the job payload,
//! optionally keep a local copy, and upload once.

use std::path::Path;

use tracing::{debug, info};

use crate::config::{ConfigurationSettings, CoverageSource};
use crate::error::{LoadCoverageFilesError, PublishError};
use crate::loader::CoverageLoader;
use crate::model::{CoverageFile, CoverageMetadata, CoverallsData, Provenance};
use crate::paths::PathProcessor;
use crate::ports::{Console, CoverallsService, FileSystem};

pub struct CoverallsPublisher<'a> {
    console: &'a dyn Console,
    fs: &'a dyn FileSystem,
    service: &'a dyn CoverallsService,
}

impl<'a> CoverallsPublisher<'a> {
    pub fn new(
        console: &'a dyn Console,
        fs: &'a dyn FileSystem,
        service: &'a dyn CoverallsService,
    ) -> Self {
        Self {
            console,
            fs,
            service,
        }
    }

    pub fn run(
        &self,
        settings: &ConfigurationSettings,
        provenance: Option<Provenance>,
        metadata: &CoverageMetadata,
        server_url: &str,
    ) -> Result<(), PublishError> {
        let output_file = self.resolve_output_file(settings);

        let files = self.build_coverage_files(settings)?;
        debug!(files = files.len(), "coverage sources loaded");

        let mut data = CoverallsData::new(
            settings.repo_token.clone(),
            metadata.service_name.clone(),
            files,
        );
        data.service_job_id = metadata.service_job_id.clone();
        data.service_number = metadata.service_build_number.clone();
        data.service_pull_request = metadata.pull_request_id.clone();
        data.parallel = metadata.parallel.then_some(true);
        if let Some(provenance) = provenance {
            data.set_provenance(provenance);
        }

        let file_data = data.to_json().map_err(|e| {
            PublishError::Coverage(format!("Failed to serialize coverage data: {e}"))
        })?;

        if let Some(output_file) = output_file {
            self.write_file_data(&file_data, output_file);
        }

        if settings.dry_run {
            info!("dry run, skipping upload");
            return Ok(());
        }

        if let Err(message) = self.upload_coverage(&file_data, server_url) {
            if settings.treat_upload_errors_as_warnings {
                self.console.write_line(&message);
            } else {
                return Err(PublishError::Upload(message));
            }
        }

        Ok(())
    }

    /// The configured output file, warning when it will replace an
    /// existing one.
    fn resolve_output_file<'s>(&self, settings: &'s ConfigurationSettings) -> Option<&'s Path> {
        let output_file = settings.output_file.as_deref()?;
        if self.fs.is_file(output_file) {
            self.console.write_line(&format!(
                "output file '{}' already exists and will be overwritten.",
                output_file.display()
            ));
        }
        Some(output_file)
    }

    /// Keeping a local copy is best effort; failure is only reported.
    fn write_file_data(&self, file_data: &str, output_file: &Path) {
        if let Err(e) = self.fs.write_file(output_file, file_data) {
            debug!(error = %e, "output file write failed");
            self.console.write_line(&format!(
                "Failed to write data to output file '{}'.",
                output_file.display()
            ));
        }
    }

    /// Load every source in order. The first failure discards everything
    /// loaded so far.
    fn build_coverage_files(
        &self,
        settings: &ConfigurationSettings,
    ) -> Result<Vec<CoverageFile>, PublishError> {
        let path_processor = PathProcessor::new(&settings.base_path);
        let loader = CoverageLoader::new(self.fs);

        let mut files = Vec::new();
        for source in &settings.coverage_sources {
            let loaded = loader
                .load_coverage_files(
                    &source.mode,
                    &path_processor,
                    &source.input,
                    settings.use_relative_paths,
                )
                .map_err(|e| PublishError::Coverage(load_error_message(source, e)))?;
            files.extend(loaded);
        }
        Ok(files)
    }

    fn upload_coverage(&self, file_data: &str, server_url: &str) -> Result<(), String> {
        self.service
            .upload(file_data, server_url)
            .map_err(|e| format!("Failed to upload to coveralls\n{e}"))?;
        self.console.write_line("Coverage data uploaded to coveralls.");
        Ok(())
    }
}

fn load_error_message(source: &CoverageSource, error: LoadCoverageFilesError) -> String {
    let mode = &source.mode;
    match error {
        LoadCoverageFilesError::InputFileNotFound => {
            format!("Input file '{}' cannot be found", source.input.display())
        }
        LoadCoverageFilesError::ModeNotSupported => format!("Could not process mode {mode}"),
        LoadCoverageFilesError::UnknownFilesMissingError => {
            format!("Unknown Error Finding files processing mode {mode}")
        }
        LoadCoverageFilesError::Parse(e) => format!(
            "Failed to parse '{}' as {mode}: {e}",
            source.input.display()
        ),
    }
}

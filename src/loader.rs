use std::path::Path;

use tracing::{debug, warn};

use crate::error::LoadCoverageFilesError;
use crate::model::{rate, CoverageFile};
use crate::parsers::CoverageMode;
use crate::paths::PathProcessor;
use crate::ports::FileSystem;

/// Reads one coverage source, parses it with the parser for its mode and
/// rewrites the resulting paths.
pub struct CoverageLoader<'a> {
    fs: &'a dyn FileSystem,
}

impl<'a> CoverageLoader<'a> {
    pub fn new(fs: &'a dyn FileSystem) -> Self {
        Self { fs }
    }

    /// Load every file of one source, or nothing.
    ///
    /// The mode is checked before the input, and the input's existence
    /// before any parsing, so parsers only ever see content.
    pub fn load_coverage_files(
        &self,
        mode: &str,
        path_processor: &PathProcessor,
        input: &Path,
        use_relative_paths: bool,
    ) -> Result<Vec<CoverageFile>, LoadCoverageFilesError> {
        let mode = CoverageMode::from_name(mode).ok_or(LoadCoverageFilesError::ModeNotSupported)?;

        if !self.fs.is_file(input) {
            return Err(LoadCoverageFilesError::InputFileNotFound);
        }

        let content = self.fs.read_to_string(input).map_err(|e| {
            warn!(input = %input.display(), error = %e, "failed to read coverage input");
            LoadCoverageFilesError::UnknownFilesMissingError
        })?;

        let mut files = mode
            .parser()
            .parse(&content)
            .map_err(LoadCoverageFilesError::Parse)?;

        for file in &mut files {
            let rewritten = if use_relative_paths {
                path_processor.to_relative(file.path())
            } else {
                path_processor.normalize(file.path())
            };
            file.set_path(rewritten).map_err(|e| {
                warn!(error = %e, "coverage file path rewrite failed");
                LoadCoverageFilesError::UnknownFilesMissingError
            })?;
        }

        let relevant: u64 = files.iter().map(CoverageFile::relevant_lines).sum();
        let covered: u64 = files.iter().map(CoverageFile::covered_lines).sum();
        debug!(
            %mode,
            input = %input.display(),
            files = files.len(),
            line_rate = rate(covered, relevant),
            "loaded coverage source"
        );

        Ok(files)
    }
}

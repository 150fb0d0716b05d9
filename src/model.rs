//! Uniform in-memory representation of coverage data, independent of any
//! specific report format. Parsers produce `CoverageFile`s which are then
//! merged into a single `CoverallsData` payload for upload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Highest source line a coverage file may describe. Coverage is stored
/// densely, so larger numbers are rejected instead of allocated.
pub const MAX_LINE: u32 = 10_000_000;

/// Compute a coverage rate, returning 0.0 when the total is zero.
#[must_use]
pub fn rate(covered: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        covered as f64 / total as f64
    }
}

/// Coverage state of one physical source line.
///
/// On the wire this is `null` for lines that are not executable and the hit
/// count otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<u64>", into = "Option<u64>")]
pub enum LineCoverage {
    NotApplicable,
    Hits(u64),
}

impl LineCoverage {
    #[must_use]
    pub fn hits(self) -> Option<u64> {
        match self {
            LineCoverage::NotApplicable => None,
            LineCoverage::Hits(n) => Some(n),
        }
    }
}

impl From<Option<u64>> for LineCoverage {
    fn from(value: Option<u64>) -> Self {
        value.map_or(LineCoverage::NotApplicable, LineCoverage::Hits)
    }
}

impl From<LineCoverage> for Option<u64> {
    fn from(value: LineCoverage) -> Self {
        value.hits()
    }
}

/// Coverage data for a single source file.
///
/// `coverage[i]` describes source line `i + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCoverageFile")]
pub struct CoverageFile {
    #[serde(rename = "name")]
    path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_digest: Option<String>,
    coverage: Vec<LineCoverage>,
}

impl CoverageFile {
    pub fn new(path: impl Into<String>, coverage: Vec<LineCoverage>) -> Result<Self, ModelError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(ModelError::EmptyPath);
        }
        Ok(Self {
            path,
            source_digest: None,
            coverage,
        })
    }

    #[must_use]
    pub fn with_source_digest(mut self, digest: impl Into<String>) -> Self {
        self.source_digest = Some(digest.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source_digest(&self) -> Option<&str> {
        self.source_digest.as_deref()
    }

    pub fn coverage(&self) -> &[LineCoverage] {
        &self.coverage
    }

    /// Coverage of a 1-based source line, `None` past the end of the file.
    pub fn line(&self, line_number: u32) -> Option<LineCoverage> {
        let idx = usize::try_from(line_number).ok()?.checked_sub(1)?;
        self.coverage.get(idx).copied()
    }

    /// Number of executable lines.
    #[must_use]
    pub fn relevant_lines(&self) -> u64 {
        self.coverage.iter().filter(|c| c.hits().is_some()).count() as u64
    }

    /// Number of executable lines hit at least once.
    #[must_use]
    pub fn covered_lines(&self) -> u64 {
        self.coverage
            .iter()
            .filter(|c| c.hits().is_some_and(|h| h > 0))
            .count() as u64
    }

    /// Replace the path, keeping the coverage untouched.
    pub fn set_path(&mut self, path: impl Into<String>) -> Result<(), ModelError> {
        let path = path.into();
        if path.trim().is_empty() {
            return Err(ModelError::EmptyPath);
        }
        self.path = path;
        Ok(())
    }
}

#[derive(Deserialize)]
struct RawCoverageFile {
    name: String,
    #[serde(default)]
    source_digest: Option<String>,
    coverage: Vec<LineCoverage>,
}

impl TryFrom<RawCoverageFile> for CoverageFile {
    type Error = ModelError;

    fn try_from(raw: RawCoverageFile) -> Result<Self, Self::Error> {
        let file = CoverageFile::new(raw.name, raw.coverage)?;
        Ok(match raw.source_digest {
            Some(digest) => file.with_source_digest(digest),
            None => file,
        })
    }
}

/// Collects sparse per-line hits for one file and expands them into the
/// dense per-line sequence of a `CoverageFile`.
#[derive(Debug, Clone)]
pub struct CoverageBuilder {
    path: String,
    hits: BTreeMap<u32, u64>,
    /// Highest line mentioned, executable or not.
    last_line: u32,
    saw_line_zero: bool,
    line_count: Option<u32>,
}

impl CoverageBuilder {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            hits: BTreeMap::new(),
            last_line: 0,
            saw_line_zero: false,
            line_count: None,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Record hits for a 1-based line. A line recorded twice keeps the
    /// larger count.
    pub fn record(&mut self, line_number: u32, hit_count: u64) -> &mut Self {
        self.mention(line_number);
        self.hits
            .entry(line_number)
            .and_modify(|h| *h = (*h).max(hit_count))
            .or_insert(hit_count);
        self
    }

    /// Note a line the report lists as not executable. It stays
    /// `NotApplicable` but still counts toward the file's length.
    pub fn not_applicable(&mut self, line_number: u32) -> &mut Self {
        self.mention(line_number);
        self
    }

    fn mention(&mut self, line_number: u32) {
        if line_number == 0 {
            self.saw_line_zero = true;
        }
        self.last_line = self.last_line.max(line_number);
    }

    /// Declare the physical line count when the report knows it. Without
    /// one, the file ends at the highest recorded line.
    pub fn line_count(&mut self, line_count: u32) -> &mut Self {
        self.line_count = Some(line_count);
        self
    }

    pub fn build(self) -> Result<CoverageFile, ModelError> {
        if self.saw_line_zero {
            return Err(ModelError::ZeroLine { path: self.path });
        }
        let highest = self.last_line;
        let largest = highest.max(self.line_count.unwrap_or(0));
        if largest > MAX_LINE {
            return Err(ModelError::LineTooLarge {
                path: self.path,
                line: largest,
                max: MAX_LINE,
            });
        }
        let len = match self.line_count {
            Some(line_count) if highest > line_count => {
                return Err(ModelError::LineOutOfRange {
                    path: self.path,
                    line: highest,
                    line_count,
                });
            }
            Some(line_count) => line_count,
            None => highest,
        };

        let mut coverage = vec![LineCoverage::NotApplicable; len as usize];
        for (line, hits) in self.hits {
            coverage[(line - 1) as usize] = LineCoverage::Hits(hits);
        }

        CoverageFile::new(self.path, coverage)
    }
}

/// The `head` commit of a `GitData` block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitHead {
    pub id: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub author_email: String,
    #[serde(default)]
    pub committer_name: String,
    #[serde(default)]
    pub committer_email: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitRemote {
    pub name: String,
    pub url: String,
}

/// Full repository metadata for the commit under test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitData {
    pub head: GitHead,
    pub branch: String,
    #[serde(default)]
    pub remotes: Vec<GitRemote>,
}

/// A bare commit hash supplied by a CI system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSha(pub String);

impl CommitSha {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Version-control provenance attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Provenance {
    Git(GitData),
    CommitSha(CommitSha),
}

/// CI build identifiers sent alongside the coverage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageMetadata {
    pub service_name: String,
    pub service_job_id: Option<String>,
    pub service_build_number: Option<String>,
    pub pull_request_id: Option<String>,
    pub parallel: bool,
}

impl Default for CoverageMetadata {
    fn default() -> Self {
        Self {
            service_name: "covpub".to_string(),
            service_job_id: None,
            service_build_number: None,
            pull_request_id: None,
            parallel: false,
        }
    }
}

/// The job payload understood by the Coveralls API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCoverallsData")]
pub struct CoverallsData {
    pub repo_token: String,
    pub service_name: String,
    pub source_files: Vec<CoverageFile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_job_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_pull_request: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    git: Option<GitData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    commit_sha: Option<String>,
}

impl CoverallsData {
    pub fn new(
        repo_token: impl Into<String>,
        service_name: impl Into<String>,
        source_files: Vec<CoverageFile>,
    ) -> Self {
        Self {
            repo_token: repo_token.into(),
            service_name: service_name.into(),
            source_files,
            service_job_id: None,
            service_number: None,
            service_pull_request: None,
            parallel: None,
            git: None,
            commit_sha: None,
        }
    }

    /// Attach provenance. `git` and `commit_sha` are never both set.
    pub fn set_provenance(&mut self, provenance: Provenance) {
        match provenance {
            Provenance::Git(git) => {
                self.git = Some(git);
                self.commit_sha = None;
            }
            Provenance::CommitSha(sha) => {
                self.git = None;
                self.commit_sha = Some(sha.0);
            }
        }
    }

    pub fn git(&self) -> Option<&GitData> {
        self.git.as_ref()
    }

    pub fn commit_sha(&self) -> Option<&str> {
        self.commit_sha.as_deref()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Deserialize)]
struct RawCoverallsData {
    repo_token: String,
    service_name: String,
    source_files: Vec<CoverageFile>,
    #[serde(default)]
    service_job_id: Option<String>,
    #[serde(default)]
    service_number: Option<String>,
    #[serde(default)]
    service_pull_request: Option<String>,
    #[serde(default)]
    parallel: Option<bool>,
    #[serde(default)]
    git: Option<GitData>,
    #[serde(default)]
    commit_sha: Option<String>,
}

impl TryFrom<RawCoverallsData> for CoverallsData {
    type Error = ModelError;

    fn try_from(raw: RawCoverallsData) -> Result<Self, Self::Error> {
        let provenance = match (raw.git, raw.commit_sha) {
            (Some(_), Some(_)) => return Err(ModelError::ConflictingProvenance),
            (Some(git), None) => Some(Provenance::Git(git)),
            (None, Some(sha)) => Some(Provenance::CommitSha(CommitSha(sha))),
            (None, None) => None,
        };

        let mut data = CoverallsData::new(raw.repo_token, raw.service_name, raw.source_files);
        data.service_job_id = raw.service_job_id;
        data.service_number = raw.service_number;
        data.service_pull_request = raw.service_pull_request;
        data.parallel = raw.parallel;
        if let Some(provenance) = provenance {
            data.set_provenance(provenance);
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_fills_gaps_with_not_applicable() {
        let mut builder = CoverageBuilder::new("src/lib.rs");
        builder.record(1, 3).record(4, 0);
        let file = builder.build().unwrap();

        assert_eq!(
            file.coverage(),
            &[
                LineCoverage::Hits(3),
                LineCoverage::NotApplicable,
                LineCoverage::NotApplicable,
                LineCoverage::Hits(0),
            ]
        );
        assert_eq!(file.line(1), Some(LineCoverage::Hits(3)));
        assert_eq!(file.line(0), None);
        assert_eq!(file.line(5), None);
        assert_eq!(file.relevant_lines(), 2);
        assert_eq!(file.covered_lines(), 1);
    }

    #[test]
    fn not_applicable_lines_extend_the_file() {
        let mut builder = CoverageBuilder::new("a.c");
        builder.record(1, 1).not_applicable(3);
        let file = builder.build().unwrap();
        assert_eq!(file.coverage().len(), 3);
        assert_eq!(file.line(3), Some(LineCoverage::NotApplicable));
        assert_eq!(file.relevant_lines(), 1);
    }

    #[test]
    fn builder_keeps_max_for_repeated_line() {
        let mut builder = CoverageBuilder::new("a.js");
        builder.record(2, 7).record(2, 3);
        let file = builder.build().unwrap();
        assert_eq!(file.line(2), Some(LineCoverage::Hits(7)));
    }

    #[test]
    fn builder_pads_to_declared_line_count() {
        let mut builder = CoverageBuilder::new("a.js");
        builder.record(1, 1).line_count(3);
        let file = builder.build().unwrap();
        assert_eq!(file.coverage().len(), 3);
        assert_eq!(file.line(3), Some(LineCoverage::NotApplicable));
    }

    #[test]
    fn builder_rejects_line_past_declared_count() {
        let mut builder = CoverageBuilder::new("a.js");
        builder.record(5, 1).line_count(3);
        assert_eq!(
            builder.build().unwrap_err(),
            ModelError::LineOutOfRange {
                path: "a.js".to_string(),
                line: 5,
                line_count: 3,
            }
        );
    }

    #[test]
    fn builder_rejects_line_beyond_maximum() {
        let mut builder = CoverageBuilder::new("a.rs");
        builder.record(1, 1).record(4_000_000_000, 1);
        assert_eq!(
            builder.build().unwrap_err(),
            ModelError::LineTooLarge {
                path: "a.rs".to_string(),
                line: 4_000_000_000,
                max: MAX_LINE,
            }
        );

        let mut builder = CoverageBuilder::new("a.rs");
        builder.line_count(MAX_LINE + 1);
        assert!(matches!(builder.build(), Err(ModelError::LineTooLarge { .. })));
    }

    #[test]
    fn builder_rejects_line_zero() {
        let mut builder = CoverageBuilder::new("a.js");
        builder.record(0, 1);
        assert!(matches!(builder.build(), Err(ModelError::ZeroLine { .. })));
    }

    #[test]
    fn empty_path_is_rejected() {
        assert_eq!(
            CoverageFile::new("  ", vec![]).unwrap_err(),
            ModelError::EmptyPath
        );
        let mut file = CoverageFile::new("a.rs", vec![]).unwrap();
        assert_eq!(file.set_path(""), Err(ModelError::EmptyPath));
        assert_eq!(file.path(), "a.rs");
    }

    #[test]
    fn not_applicable_serializes_as_null() {
        let file = CoverageFile::new(
            "a.rs",
            vec![LineCoverage::Hits(2), LineCoverage::NotApplicable, LineCoverage::Hits(0)],
        )
        .unwrap();
        let json = serde_json::to_value(&file).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "name": "a.rs", "coverage": [2, null, 0] })
        );
    }

    #[test]
    fn provenance_is_mutually_exclusive() {
        let mut data = CoverallsData::new("token", "covpub", vec![]);
        data.set_provenance(Provenance::Git(GitData {
            branch: "main".to_string(),
            ..Default::default()
        }));
        data.set_provenance(Provenance::CommitSha(CommitSha("abc".to_string())));
        assert!(data.git().is_none());
        assert_eq!(data.commit_sha(), Some("abc"));

        let json = serde_json::to_value(&data).unwrap();
        assert!(json.get("git").is_none());
        assert_eq!(json["commit_sha"], "abc");
    }

    #[test]
    fn deserialize_rejects_empty_file_name() {
        let err = serde_json::from_str::<CoverageFile>(r#"{"name": " ", "coverage": [1]}"#)
            .unwrap_err();
        assert!(err.to_string().contains("must not be empty"));

        let file: CoverageFile =
            serde_json::from_str(r#"{"name": "a.rs", "source_digest": "ab", "coverage": [1, null]}"#)
                .unwrap();
        assert_eq!(file.source_digest(), Some("ab"));
        assert_eq!(file.coverage(), &[LineCoverage::Hits(1), LineCoverage::NotApplicable]);
    }

    #[test]
    fn deserialize_rejects_git_with_commit_sha() {
        let both = r#"{
            "repo_token": "t",
            "service_name": "covpub",
            "source_files": [],
            "git": {"head": {"id": "abc"}, "branch": "main"},
            "commit_sha": "abc"
        }"#;
        let err = serde_json::from_str::<CoverallsData>(both).unwrap_err();
        assert!(err.to_string().contains("both git data and a commit sha"));

        let sha_only = r#"{
            "repo_token": "t",
            "service_name": "covpub",
            "source_files": [],
            "commit_sha": "abc"
        }"#;
        let data: CoverallsData = serde_json::from_str(sha_only).unwrap();
        assert_eq!(data.commit_sha(), Some("abc"));
        assert!(data.git().is_none());
    }
}

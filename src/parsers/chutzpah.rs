/// Parser for Chutzpah's JSON coverage output.
///
/// Reference: https://github.com/mmanela/chutzpah/wiki/Code-Coverage-in-Chutzpah
///
/// The report is a JSON object keyed by source path:
///   {
///     "D:\\src\\file.ts": {
///       "FilePath": "D:\\src\\file.ts",
///       "LineExecutionCounts": [null, 36, null, 10, ...],
///       "SourceLines": ["...", ...],
///       "CoveragePercentage": 0.5
///     }
///   }
///
/// `LineExecutionCounts` is indexed by line number, so slot 0 is a
/// placeholder. `null` marks a line that is not executable.
///
/// The JSON is often captured from a console run, so lines before the opening
/// `{` and anything after the closing `}` are ignored.
use serde::Deserialize;
use md5::{Digest, Md5};

use super::{CoverageMode, CoverageParser, OrderedEntries};
use crate::error::{ParseError, Result};
use crate::model::{CoverageFile, LineCoverage};

pub struct ChutzpahParser;

impl CoverageParser for ChutzpahParser {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Chutzpah
    }

    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>> {
        parse(input)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct FileEntry {
    file_path: Option<String>,
    #[serde(default)]
    line_execution_counts: Vec<Option<u64>>,
    source_lines: Option<Vec<String>>,
}

/// Parse Chutzpah JSON, skipping console noise around the document.
pub fn parse(input: &str) -> Result<Vec<CoverageFile>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let start = document_start(input).ok_or(ParseError::MissingMarker {
        format: "chutzpah",
    })?;

    // Only the first JSON value is read; trailing runner output is ignored.
    let mut deser = serde_json::Deserializer::from_str(&input[start..]);
    let OrderedEntries(entries) = OrderedEntries::<FileEntry>::deserialize(&mut deser)?;

    entries
        .into_iter()
        .map(|(key, entry)| to_coverage_file(key, entry))
        .collect()
}

/// Byte offset of the first line opening a JSON object.
fn document_start(input: &str) -> Option<usize> {
    let mut offset = 0;
    for line in input.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if trimmed.starts_with('{') {
            return Some(offset + (line.len() - trimmed.len()));
        }
        offset += line.len();
    }
    None
}

fn to_coverage_file(key: String, entry: FileEntry) -> Result<CoverageFile> {
    let path = entry
        .file_path
        .filter(|p| !p.trim().is_empty())
        .unwrap_or(key);

    let coverage = entry
        .line_execution_counts
        .into_iter()
        .skip(1)
        .map(LineCoverage::from)
        .collect();

    let file = CoverageFile::new(path, coverage)?;
    Ok(match entry.source_lines {
        Some(lines) => file.with_source_digest(source_digest(&lines)),
        None => file,
    })
}

/// Hex MD5 of the source text, lines joined with `\n`. Coveralls compares
/// it against its own digest of the file.
fn source_digest(lines: &[String]) -> String {
    let mut hasher = Md5::new();
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            hasher.update(b"\n");
        }
        hasher.update(line.as_bytes());
    }
    hex::encode(hasher.finalize())
}

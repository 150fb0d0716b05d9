/// Parser for Istanbul / NYC `coverage-final.json` format.
///
/// Reference: https://github.com/istanbuljs/istanbuljs
///
/// The format is a JSON object keyed by file path. Each value contains:
///   - `statementMap`: `{ "0": { "start": { "line": 1, "column": 0 }, "end": { "line": 1, "column": 30 } }, ... }`
///   - `s`:            `{ "0": 5, "1": 0, ... }`, hit counts per statement
///   - `branchMap` / `b`, `fnMap` / `f`: branch and function data, unused here
use std::collections::HashMap;

use serde::Deserialize;

use super::{CoverageMode, CoverageParser, FileSet, OrderedEntries};
use crate::error::{ParseError, Result};
use crate::model::{CoverageBuilder, CoverageFile};

/// Istanbul / NYC JSON parser.
pub struct IstanbulParser;

impl CoverageParser for IstanbulParser {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Istanbul
    }

    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>> {
        parse(input)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileEntry {
    path: Option<String>,
    statement_map: HashMap<String, Span>,
    #[serde(default)]
    s: HashMap<String, u64>,
}

#[derive(Deserialize)]
struct Span {
    start: Position,
}

#[derive(Deserialize)]
struct Position {
    line: u32,
}

/// Parse Istanbul JSON. Files keep the order they appear in the document.
pub fn parse(input: &str) -> Result<Vec<CoverageFile>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    if !trimmed.starts_with('{') {
        return Err(ParseError::MissingMarker { format: "istanbul" });
    }

    let mut deser = serde_json::Deserializer::from_str(trimmed);
    let OrderedEntries(entries) = OrderedEntries::<FileEntry>::deserialize(&mut deser)?;
    deser.end()?;

    let mut files = FileSet::default();
    for (key, entry) in entries {
        let FileEntry {
            path,
            statement_map,
            s,
        } = entry;
        let path = path.filter(|p| !p.trim().is_empty()).unwrap_or(key);
        record_statements(files.file(&path), &statement_map, &s);
    }
    Ok(files.finish()?)
}

/// Map statement hit counts onto the line each statement starts on.
/// Several statements on one line keep the maximum count.
fn record_statements(
    file: &mut CoverageBuilder,
    statement_map: &HashMap<String, Span>,
    s: &HashMap<String, u64>,
) {
    for (idx, span) in statement_map {
        let count = s.get(idx).copied().unwrap_or(0);
        file.record(span.start.line, count);
    }
}

/// Parser for the LCOV `.info` format.
///
/// Reference: https://ltp.sourceforge.net/coverage/lcov/geninfo.1.php
///
/// Key records:
///   TN:<test name>
///   SF:<absolute path to source file>
///   DA:<line number>,<execution count>[,<checksum>]
///   LF:<lines found>
///   LH:<lines hit>
///   end_of_record
///
/// Function and branch records (FN, FNDA, BRDA, ...) carry nothing the
/// per-line model needs and are skipped along with any other noise.
use super::{CoverageMode, CoverageParser, FileSet};
use crate::error::{ParseError, Result};
use crate::model::CoverageFile;

/// Record tags that identify a stream as LCOV.
const KNOWN_TAGS: &[&str] = &[
    "TN", "SF", "FN", "FNDA", "FNF", "FNH", "DA", "BRDA", "BRF", "BRH", "LF", "LH", "VER",
];

/// LCOV format parser.
pub struct LcovParser;

impl CoverageParser for LcovParser {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Lcov
    }

    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>> {
        parse(input)
    }
}

/// Parse LCOV coverage data. Records for the same `SF` path are merged.
pub fn parse(input: &str) -> Result<Vec<CoverageFile>> {
    let mut files = FileSet::default();
    let mut current: Option<String> = None;
    let mut recognized = false;
    let mut blank = true;

    for (idx, raw_line) in input.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        blank = false;

        if line == "end_of_record" {
            recognized = true;
            current = None;
            continue;
        }

        // Split on first ':'
        let Some((tag, value)) = line.split_once(':') else {
            continue;
        };
        if KNOWN_TAGS.contains(&tag) {
            recognized = true;
        }

        match tag {
            "SF" => {
                let path = value.trim();
                if path.is_empty() {
                    return Err(ParseError::Malformed {
                        line: idx + 1,
                        message: "SF record without a path".to_string(),
                    });
                }
                files.file(path);
                current = Some(path.to_string());
            }
            "DA" => {
                // DA:<line_number>,<execution_count>[,<checksum>]
                // Some instrumenters use negative counts (e.g., -1) to mark
                // non-instrumentable lines.
                let Some(path) = current.as_deref() else {
                    continue;
                };
                let mut parts = value.splitn(3, ',');
                let (Some(line_str), Some(count_str)) = (parts.next(), parts.next()) else {
                    continue;
                };
                let Ok(line_number) = line_str.trim().parse::<u32>() else {
                    continue;
                };
                let file = files.file(path);
                match count_str.trim().parse::<i64>() {
                    Ok(count) if count >= 0 => {
                        file.record(line_number, count as u64);
                    }
                    Ok(_) => {
                        file.not_applicable(line_number);
                    }
                    Err(_) => {}
                }
            }
            // Everything else is either summary data we derive ourselves or
            // detail the per-line model does not carry.
            _ => {}
        }
    }

    if !blank && !recognized {
        return Err(ParseError::MissingMarker { format: "lcov" });
    }

    Ok(files.finish()?)
}

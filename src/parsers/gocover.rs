/// Parser for Go's `-coverprofile` format.
///
/// Reference: https://go.dev/blog/cover
///
/// Format:
///   mode: set|count|atomic
///   <file>:<startLine>.<startCol>,<endLine>.<endCol> <numStatements> <count>
///
/// Each line describes a basic block (a range of source lines). Blocks are
/// expanded into their lines, each line taking the highest count of any block
/// touching it.
use super::{CoverageMode, CoverageParser, FileSet};
use crate::error::{ModelError, ParseError, Result};
use crate::model::{CoverageFile, MAX_LINE};

/// Go coverage profile parser.
pub struct GocoverParser;

impl CoverageParser for GocoverParser {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Gocover
    }

    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>> {
        parse(input)
    }
}

/// A parsed block from a single line of the coverage profile.
struct Block {
    start_line: u32,
    end_line: u32,
    count: u64,
}

/// Parse a Go coverage profile. Files keep the order of their first block.
pub fn parse(input: &str) -> Result<Vec<CoverageFile>> {
    let mut files = FileSet::default();
    let mut recognized = false;
    let mut blank = true;

    for raw_line in input.lines() {
        let line = raw_line.trim();
        if line.is_empty() {
            continue;
        }
        blank = false;

        if line.starts_with("mode:") {
            recognized = true;
            continue;
        }

        // Merged profiles and `go test` output can interleave other lines.
        let Some((file, block)) = parse_block_line(line) else {
            continue;
        };
        recognized = true;

        if block.end_line > MAX_LINE {
            return Err(ModelError::LineTooLarge {
                path: file.to_string(),
                line: block.end_line,
                max: MAX_LINE,
            }
            .into());
        }

        let builder = files.file(file);
        // Go ranges are inclusive on both ends. The end line's column may
        // be 1, meaning the block barely touches it; without column detail
        // we include it anyway, as most tools do.
        for line_number in block.start_line..=block.end_line {
            builder.record(line_number, block.count);
        }
    }

    if !blank && !recognized {
        return Err(ParseError::MissingMarker { format: "gocover" });
    }

    Ok(files.finish()?)
}

/// Parse a single block line, returning (file_path, Block).
///
/// Format: `<file>:<startLine>.<startCol>,<endLine>.<endCol> <numStmt> <count>`
fn parse_block_line(line: &str) -> Option<(&str, Block)> {
    // Anchor on the last ".go:" to split the file path from the block range.
    // This naturally handles paths containing colons.
    let colon_pos = line.rfind(".go:")? + 3; // position of ':'

    let file = &line[..colon_pos];
    let rest = &line[colon_pos + 1..];

    // rest = "startLine.startCol,endLine.endCol numStmt count"
    let (range, tail) = rest.split_once(' ')?;
    let (start, end) = range.split_once(',')?;

    let start_line: u32 = start.split_once('.')?.0.parse().ok()?;
    let end_line: u32 = end.split_once('.')?.0.parse().ok()?;
    if end_line < start_line {
        return None;
    }

    let mut parts = tail.split_whitespace();
    let _num_stmt = parts.next()?;
    let count: u64 = parts.next()?.parse().ok()?;

    Some((
        file,
        Block {
            start_line,
            end_line,
            count,
        },
    ))
}

/// Parser for Cobertura XML coverage reports.
///
/// Cobertura XML structure:
///   <coverage>
///     <sources><source>...</source></sources>
///     <packages>
///       <package name="...">
///         <classes>
///           <class name="..." filename="...">
///             <methods>
///               <method name="...">
///                 <lines><line number="..." hits="..."/></lines>
///               </method>
///             </methods>
///             <lines>
///               <line number="..." hits="..." branch="true|false"/>
///             </lines>
///           </class>
///         </classes>
///       </package>
///     </packages>
///   </coverage>
///
/// Several `<class>` elements may share one `filename` (inner classes,
/// partial classes); they merge into a single file.
use std::collections::HashMap;
use std::str;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use super::{CoverageMode, CoverageParser, FileSet};
use crate::error::{ParseError, Result};
use crate::model::CoverageFile;

pub struct CoberturaParser;

impl CoverageParser for CoberturaParser {
    fn mode(&self) -> CoverageMode {
        CoverageMode::Cobertura
    }

    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>> {
        parse(input)
    }
}

pub fn parse(input: &str) -> Result<Vec<CoverageFile>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut reader = Reader::from_reader(input.as_bytes());
    reader.trim_text(true);

    let mut files = FileSet::default();
    let mut buf = Vec::new();

    let mut saw_root = false;
    let mut current_file: Option<String> = None;

    // Source prefix from <source> elements
    let mut sources: Vec<String> = Vec::new();
    let mut in_source = false;

    loop {
        let event = reader.read_event_into(&mut buf);
        let is_start_event = matches!(&event, Ok(Event::Start(_)));
        match event {
            Err(source) => {
                return Err(ParseError::Xml {
                    source,
                    position: reader.buffer_position(),
                })
            }
            Ok(Event::Eof) => break,
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => match e.name().as_ref() {
                b"coverage" => saw_root = true,
                b"source" => {
                    // A self-closing <source/> has no text and no End event.
                    if is_start_event {
                        in_source = true;
                    }
                }
                b"class" => {
                    let attrs = attr_map(e);
                    current_file = attrs
                        .get("filename")
                        .filter(|f| !f.trim().is_empty())
                        .map(|f| resolve_source_path(f, &sources));
                    if let Some(path) = current_file.as_deref() {
                        files.file(path);
                    }
                    // A self-closing <class/> has no lines and no End event.
                    if !is_start_event {
                        current_file = None;
                    }
                }
                b"line" => {
                    if let Some(path) = current_file.as_deref() {
                        record_line(&mut files, path, e);
                    }
                }
                _ => {}
            },
            Ok(Event::Text(ref e)) => {
                if in_source {
                    if let Ok(text) = e.unescape() {
                        sources.push(text.to_string());
                    }
                    in_source = false;
                }
            }
            Ok(Event::End(ref e)) => match e.name().as_ref() {
                b"source" => in_source = false,
                b"class" => current_file = None,
                _ => {}
            },
            _ => {}
        }
        buf.clear();
    }

    if !saw_root {
        return Err(ParseError::MissingMarker {
            format: "cobertura",
        });
    }

    Ok(files.finish()?)
}

/// Record one `<line number=".." hits=".."/>` element. Lines may appear under
/// both `<method>` and `<class>`; the builder keeps the larger count.
fn record_line(files: &mut FileSet, path: &str, e: &BytesStart) {
    let attrs = attr_map(e);
    let Some(line_number) = attrs.get("number").and_then(|n| n.parse::<u32>().ok()) else {
        return;
    };
    let hit_count = attrs
        .get("hits")
        .and_then(|h| h.parse::<u64>().ok())
        .unwrap_or(0);
    files.file(path).record(line_number, hit_count);
}

/// Resolve a filename against the list of `<source>` prefixes.
///
/// - If the filename is already absolute, return it as-is.
/// - Otherwise, prepend the first non-empty source prefix.
/// - If no non-empty sources exist, return the filename unchanged.
fn resolve_source_path(filename: &str, sources: &[String]) -> String {
    if filename.starts_with('/') || is_windows_absolute(filename) {
        return filename.to_string();
    }
    for source in sources {
        let base = source.trim().trim_end_matches(['/', '\\']);
        if !base.is_empty() {
            return format!("{}/{}", base, filename);
        }
    }
    filename.to_string()
}

/// `C:\...` or `C:/...`
fn is_windows_absolute(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 3
        && bytes[0].is_ascii_alphabetic()
        && bytes[1] == b':'
        && matches!(bytes[2], b'\\' | b'/')
}

/// Extract attributes from an XML element into a HashMap.
fn attr_map(e: &BytesStart) -> HashMap<String, String> {
    e.attributes()
        .filter_map(|a| {
            let attr = a.ok()?;
            let key = str::from_utf8(attr.key.local_name().into_inner())
                .ok()?
                .to_string();
            let value = attr.unescape_value().ok()?.to_string();
            Some((key, value))
        })
        .collect()
}

//! Source path rewriting applied to every loaded coverage file.
//!
//! Everything here is lexical: paths from a report may name files on another
//! machine (a Windows build agent, a container), so the local filesystem is
//! never consulted.

use std::path::Path;

/// Rewrites report paths against a base directory.
#[derive(Debug, Clone)]
pub struct PathProcessor {
    base_path: String,
}

impl PathProcessor {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        let base = base_path.as_ref().to_string_lossy();
        Self {
            base_path: normalize(&base),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Unify separators to `/` and resolve `.` and `..` components.
    pub fn normalize(&self, path: &str) -> String {
        normalize(path)
    }

    /// Make `path` relative to the base path. Paths outside the base are
    /// only normalized.
    pub fn to_relative(&self, path: &str) -> String {
        let path = normalize(path);
        let base = self.base_path.as_str();
        let prefix = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{base}/")
        };

        // Drive-letter paths come from Windows, where case does not matter.
        let matches = match path.get(..prefix.len()) {
            Some(head) if drive_prefix(&prefix).is_some() => {
                head.eq_ignore_ascii_case(&prefix)
            }
            Some(head) => head == prefix,
            None => false,
        };

        if matches {
            let rest = &path[prefix.len()..];
            if rest.is_empty() {
                ".".to_string()
            } else {
                rest.to_string()
            }
        } else if path == base {
            ".".to_string()
        } else {
            path
        }
    }
}

/// `C:` of a `C:/...` path.
fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[..2])
    } else {
        None
    }
}

fn normalize(path: &str) -> String {
    let unified = path.trim().replace('\\', "/");

    let (root, rest) = match drive_prefix(&unified) {
        Some(drive) => {
            let rest = &unified[2..];
            if let Some(stripped) = rest.strip_prefix('/') {
                (format!("{drive}/"), stripped)
            } else {
                (drive.to_string(), rest)
            }
        }
        None => match unified.strip_prefix('/') {
            Some(stripped) => ("/".to_string(), stripped),
            None => (String::new(), unified.as_str()),
        },
    };
    let rooted = root.ends_with('/');

    let mut parts: Vec<&str> = Vec::new();
    for component in rest.split('/') {
        match component {
            "" | "." => {}
            // A `..` at the root is dropped.
            ".." => {
                if parts.last().is_some_and(|last| *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if root.is_empty() && joined.is_empty() {
        ".".to_string()
    } else {
        format!("{root}{joined}")
    }
}

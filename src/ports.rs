//! Seams to the outside world: filesystem, environment, console output and
//! the coverage service. The pipeline only talks to these traits, so tests
//! can swap in recording or in-memory versions.

use std::collections::HashMap;
use std::io;
use std::path::Path;

/// Read and write access to report and output files.
pub trait FileSystem {
    fn is_file(&self, path: &Path) -> bool;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()>;
}

/// The real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_file(&self, path: &Path, contents: &str) -> io::Result<()> {
        std::fs::write(path, contents)
    }
}

/// Read-only lookup of environment variables.
pub trait Environment {
    fn var(&self, name: &str) -> Option<String>;

    /// The variable's value, treating blank values as unset.
    fn non_blank(&self, name: &str) -> Option<String> {
        self.var(name).filter(|v| !v.trim().is_empty())
    }
}

/// The environment of the running process.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnvironment;

impl Environment for ProcessEnvironment {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Environment for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// Line-oriented sink for status and warning messages.
pub trait Console {
    fn write_line(&self, line: &str);
}

/// Prints to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdConsole;

impl Console for StdConsole {
    fn write_line(&self, line: &str) {
        println!("{line}");
    }
}

/// The coverage backend. One call is one network attempt.
pub trait CoverallsService {
    /// Submit a serialized job payload. The error is a human-readable
    /// description of what the service or transport reported.
    fn upload(&self, payload: &str, server_url: &str) -> Result<(), String>;
}

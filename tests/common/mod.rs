#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use covpub::config::{ConfigurationSettings, CoverageSource};
use covpub::ports::{Console, CoverallsService};

/// Collects console output for assertions.
#[derive(Default)]
pub struct TestConsole {
    lines: RefCell<Vec<String>>,
}

impl TestConsole {
    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }
}

impl Console for TestConsole {
    fn write_line(&self, line: &str) {
        self.lines.borrow_mut().push(line.to_string());
    }
}

/// Upload service that records every payload and answers with a fixed
/// result.
pub struct RecordingService {
    result: Result<(), String>,
    calls: Cell<usize>,
    payloads: RefCell<Vec<String>>,
}

impl RecordingService {
    pub fn succeeding() -> Self {
        Self::with_result(Ok(()))
    }

    pub fn failing(message: &str) -> Self {
        Self::with_result(Err(message.to_string()))
    }

    fn with_result(result: Result<(), String>) -> Self {
        Self {
            result,
            calls: Cell::new(0),
            payloads: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn last_payload(&self) -> Option<String> {
        self.payloads.borrow().last().cloned()
    }
}

impl CoverallsService for RecordingService {
    fn upload(&self, payload: &str, _server_url: &str) -> Result<(), String> {
        self.calls.set(self.calls.get() + 1);
        self.payloads.borrow_mut().push(payload.to_string());
        self.result.clone()
    }
}

pub fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
    vars.iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

/// Settings for a single source under `base_path`.
pub fn settings(base_path: &Path, mode: &str, input: &Path) -> ConfigurationSettings {
    let mut settings = ConfigurationSettings::new("repo-token", base_path);
    settings.coverage_sources.push(CoverageSource {
        mode: mode.to_string(),
        input: input.to_path_buf(),
    });
    settings
}

pub mod chutzpah;
pub mod cobertura;
pub mod gocover;
pub mod istanbul;
pub mod lcov;

use std::collections::HashMap;
use std::marker::PhantomData;

use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};

use crate::error::{ModelError, Result};
use crate::model::{CoverageBuilder, CoverageFile};

/// Supported coverage report formats, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoverageMode {
    Chutzpah,
    Cobertura,
    Gocover,
    Istanbul,
    Lcov,
}

impl CoverageMode {
    pub const ALL: [CoverageMode; 5] = [
        CoverageMode::Chutzpah,
        CoverageMode::Cobertura,
        CoverageMode::Gocover,
        CoverageMode::Istanbul,
        CoverageMode::Lcov,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CoverageMode::Chutzpah => "chutzpah",
            CoverageMode::Cobertura => "cobertura",
            CoverageMode::Gocover => "gocover",
            CoverageMode::Istanbul => "istanbul",
            CoverageMode::Lcov => "lcov",
        }
    }

    /// Look a mode up by name, case-insensitively. `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(name))
    }

    /// The parser that understands this mode.
    pub fn parser(&self) -> &'static dyn CoverageParser {
        match self {
            CoverageMode::Chutzpah => &chutzpah::ChutzpahParser,
            CoverageMode::Cobertura => &cobertura::CoberturaParser,
            CoverageMode::Gocover => &gocover::GocoverParser,
            CoverageMode::Istanbul => &istanbul::IstanbulParser,
            CoverageMode::Lcov => &lcov::LcovParser,
        }
    }
}

impl std::fmt::Display for CoverageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Every format parser implements this trait.
pub trait CoverageParser {
    fn mode(&self) -> CoverageMode;

    /// Parse a report into canonical coverage files, one per source file in
    /// first-seen order. Blank input yields no files; input without any
    /// recognizable coverage is an error.
    fn parse(&self, input: &str) -> Result<Vec<CoverageFile>>;
}

/// Per-file builders keyed by path, preserving first-seen order.
#[derive(Default)]
pub(crate) struct FileSet {
    builders: Vec<CoverageBuilder>,
    index: HashMap<String, usize>,
}

impl FileSet {
    /// The builder for `path`, created on first use.
    pub(crate) fn file(&mut self, path: &str) -> &mut CoverageBuilder {
        let idx = match self.index.get(path) {
            Some(&idx) => idx,
            None => {
                self.builders.push(CoverageBuilder::new(path));
                self.index.insert(path.to_string(), self.builders.len() - 1);
                self.builders.len() - 1
            }
        };
        &mut self.builders[idx]
    }

    pub(crate) fn finish(self) -> std::result::Result<Vec<CoverageFile>, ModelError> {
        self.builders.into_iter().map(CoverageBuilder::build).collect()
    }
}

/// A JSON object read as `(key, value)` pairs in document order.
///
/// `serde_json::Map` sorts its keys, which would lose the report's file
/// order.
pub(crate) struct OrderedEntries<T>(pub(crate) Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OrderedEntries<T> {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = OrderedEntries<T>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("a JSON object keyed by source file path")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(OrderedEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

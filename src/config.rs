use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// The four independently toggleable output paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SinkKind {
    /// Structured records rendered to the real console.
    ConsoleLog,
    /// Structured records rendered into a rotating file.
    FileLog,
    /// Raw stream writes passed through to the real console.
    ConsoleRaw,
    /// Raw stream writes captured into rotating files.
    FileRaw,
}

impl SinkKind {
    pub const ALL: [SinkKind; 4] = [
        Self::ConsoleLog,
        Self::FileLog,
        Self::ConsoleRaw,
        Self::FileRaw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConsoleLog => "console-log",
            Self::FileLog => "file-log",
            Self::ConsoleRaw => "console-raw",
            Self::FileRaw => "file-raw",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s.trim() {
            "" => Err(Error::Config("empty sink name".to_string())),
            "console-log" => Ok(Self::ConsoleLog),
            "file-log" => Ok(Self::FileLog),
            "console-raw" => Ok(Self::ConsoleRaw),
            "file-raw" => Ok(Self::FileRaw),
            other => Err(Error::Config(format!("unknown sink: {other}"))),
        }
    }
}

/// Configuration handed to [`Configurator::setup`](crate::Configurator::setup).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Filename stem for the live files (`<prefix>.log`, `<prefix>.stdout`,
    /// `<prefix>.stderr`).
    #[serde(default = "default_prefix")]
    pub prefix: String,
    /// Directory holding the live files and dated archive directories.
    #[serde(default = "default_root_dir")]
    pub root_dir: PathBuf,
    /// Maximum number of dated archive directories to keep.
    #[serde(default = "default_retention_days")]
    pub retention_days: usize,
    /// Severity floor applied to the requested structured-log sinks
    /// (e.g. "info", "debug").
    #[serde(default = "default_level")]
    pub level: String,
    /// Record format for structured sinks ("text" or "json").
    #[serde(default = "default_format")]
    pub format: String,
    /// Sinks activated by `setup`.
    #[serde(default)]
    pub sinks: Vec<SinkKind>,
}

impl SinkConfig {
    /// Create a new SinkConfig with defaults
    pub fn new() -> Self {
        Self {
            prefix: default_prefix(),
            root_dir: default_root_dir(),
            retention_days: default_retention_days(),
            level: default_level(),
            format: default_format(),
            sinks: Vec::new(),
        }
    }

    /// Set the live-file prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the root directory
    pub fn with_root_dir(mut self, root_dir: impl Into<PathBuf>) -> Self {
        self.root_dir = root_dir.into();
        self
    }

    /// Set the retention limit
    pub fn with_retention_days(mut self, retention_days: usize) -> Self {
        self.retention_days = retention_days;
        self
    }

    /// Set the severity floor
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the record format ("text" or "json")
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    /// Set the sinks activated at setup
    pub fn with_sinks(mut self, sinks: impl IntoIterator<Item = SinkKind>) -> Self {
        self.sinks = sinks.into_iter().collect();
        self
    }
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn default_prefix() -> String {
    "app".to_string()
}

fn default_root_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_retention_days() -> usize {
    7
}

fn default_level() -> String {
    "info".to_string()
}

fn default_format() -> String {
    "text".to_string()
}

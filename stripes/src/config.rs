//! Job configuration.
//!
//! A [`JobConfig`] starts from the defaults below, takes the job's overrides
//! (builder methods or TOML text) and is then only read.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Hadoop job priority.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    VeryHigh,
    High,
    #[default]
    Normal,
    Low,
    VeryLow,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Priority::VeryHigh => "VERY_HIGH",
            Priority::High => "HIGH",
            Priority::Normal => "NORMAL",
            Priority::Low => "LOW",
            Priority::VeryLow => "VERY_LOW",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SideFileLocation {
    /// Shipped with the job through the distributed cache.
    Local,
    /// Already on the cluster; the job reads it itself.
    Hdfs,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideFile {
    pub location: SideFileLocation,
    pub path: PathBuf,
}

impl SideFile {
    pub fn local(path: impl Into<PathBuf>) -> Self {
        Self {
            location: SideFileLocation::Local,
            path: path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobConfig {
    pub input_dir: String,
    pub output_dir: String,
    pub history_loc: String,
    pub priority: Priority,
    pub num_partition_keys: usize,
    pub side_files: Vec<SideFile>,
    pub in_sep: char,
    pub out_sep: char,
    pub allowed_errors: usize,
    /// Appended verbatim to the streaming command.
    pub streaming_args: Vec<String>,
    pub reduce_tasks: usize,
    /// Sample size for the local verification run.
    pub test_rows: usize,
    pub hadoop_bin: String,
    pub streaming_jar: Option<PathBuf>,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            input_dir: String::new(),
            output_dir: "/tmp/streaming_out".to_string(),
            history_loc: "/tmp/history".to_string(),
            priority: Priority::Normal,
            num_partition_keys: 1,
            side_files: Vec::new(),
            in_sep: '\x01',
            out_sep: '\x01',
            allowed_errors: 0,
            streaming_args: Vec::new(),
            reduce_tasks: 1,
            test_rows: 100,
            hadoop_bin: "hadoop".to_string(),
            streaming_jar: None,
        }
    }
}

impl JobConfig {
    /// Defaults overridden by whatever keys `text` sets.
    pub fn from_toml(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_partition_keys == 0 {
            return Err(Error::Config("num_partition_keys must be at least 1".into()));
        }
        for (name, sep) in [("in_sep", self.in_sep), ("out_sep", self.out_sep)] {
            if sep == '\n' || sep == '\r' {
                return Err(Error::Config(format!("{name} cannot be a line terminator")));
            }
        }
        if self.test_rows == 0 {
            return Err(Error::Config("test_rows must be at least 1".into()));
        }
        Ok(())
    }

    pub fn with_input_dir(mut self, dir: impl Into<String>) -> Self {
        self.input_dir = dir.into();
        self
    }

    pub fn with_output_dir(mut self, dir: impl Into<String>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_separators(mut self, in_sep: char, out_sep: char) -> Self {
        self.in_sep = in_sep;
        self.out_sep = out_sep;
        self
    }

    pub fn with_num_partition_keys(mut self, n: usize) -> Self {
        self.num_partition_keys = n;
        self
    }

    pub fn with_allowed_errors(mut self, n: usize) -> Self {
        self.allowed_errors = n;
        self
    }

    pub fn with_side_file(mut self, file: SideFile) -> Self {
        self.side_files.push(file);
        self
    }

    pub fn with_reduce_tasks(mut self, n: usize) -> Self {
        self.reduce_tasks = n;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_test_rows(mut self, n: usize) -> Self {
        self.test_rows = n;
        self
    }

    pub fn with_streaming_jar(mut self, jar: impl Into<PathBuf>) -> Self {
        self.streaming_jar = Some(jar.into());
        self
    }

    /// Local side files, the ones the launcher ships with `-file`.
    pub fn local_side_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.side_files
            .iter()
            .filter(|f| f.location == SideFileLocation::Local)
            .map(|f| &f.path)
    }
}

//! Counts a fixed list of words across message bodies.
//!
//! Input rows are `user_id<sep>message`. The words to count come from a
//! side file shipped with the job, one word per line.

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use stripes::{record, Acc, CountSum, Job, JobConfig, Key, Phase, Record, SideFile, Sink};

pub const WORDS_FILE: &str = "words_to_count.txt";

/// Messages from this user id are test traffic.
const IGNORED_USER: &str = "9";

pub fn config() -> JobConfig {
    JobConfig::default()
        .with_input_dir("MESSAGE_DATA_DIR")
        .with_output_dir("/tmp/streaming_out")
        .with_side_file(SideFile::local(WORDS_FILE))
}

pub struct WordCount {
    words_file: PathBuf,
    words: HashSet<String>,
}

impl Default for WordCount {
    fn default() -> Self {
        Self::new(WORDS_FILE)
    }
}

impl WordCount {
    pub fn new(words_file: impl Into<PathBuf>) -> Self {
        Self {
            words_file: words_file.into(),
            words: HashSet::new(),
        }
    }
}

impl Job for WordCount {
    type Aggregator = CountSum;

    fn aggregator(&self) -> &CountSum {
        &CountSum
    }

    fn load_side_data(&mut self, phase: Phase, _config: &JobConfig) -> anyhow::Result<()> {
        if phase != Phase::Map {
            return Ok(());
        }
        let text = fs::read_to_string(&self.words_file)
            .with_context(|| format!("reading {}", self.words_file.display()))?;
        self.words = text
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_owned)
            .collect();
        Ok(())
    }

    fn map(&mut self, record: Record, out: &mut dyn Sink) -> anyhow::Result<()> {
        if record.field(0)?.trim() == IGNORED_USER {
            return Ok(());
        }
        let content = record.field(1)?.to_lowercase();
        for word in content
            .split(|c: char| !(c.is_alphanumeric() || c == '_'))
            .filter(|w| self.words.contains(*w))
        {
            out.emit(record![word, 1])?;
        }
        Ok(())
    }

    fn reduce(&mut self, key: &Key, acc: Acc<Self>, out: &mut dyn Sink) -> anyhow::Result<()> {
        let mut fields = key.clone();
        fields.push(acc.to_string());
        out.emit(Record::from(fields))?;
        Ok(())
    }

    fn combine(&mut self, key: &Key, acc: Acc<Self>, out: &mut dyn Sink) -> anyhow::Result<()> {
        self.reduce(key, acc, out)
    }

    fn has_combiner(&self) -> bool {
        true
    }
}

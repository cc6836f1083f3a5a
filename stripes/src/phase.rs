//! Phase executors: map, and the grouping executor shared by combine and reduce.
//!
//! Both read `\n`-terminated lines and treat per-record failures the same
//! way: the raw line and the error go to the diagnostics channel, the skip
//! is counted, and the run carries on until the error budget runs out.

use std::io::{self, BufRead, Write};

use anyhow::anyhow;
use tracing::{debug, info};

use crate::aggregate::Aggregator;
use crate::budget::ErrorBudget;
use crate::cli::Phase;
use crate::config::JobConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::job::{Acc, Job};
use crate::record::{Key, Record};
use crate::sink::Sink;

/// Counters for one finished phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PhaseReport {
    pub records: usize,
    pub skipped: usize,
    pub groups: usize,
}

struct Skipper<'a, W: Write> {
    phase: Phase,
    budget: ErrorBudget,
    diag: &'a mut Diagnostics<W>,
}

impl<W: Write> Skipper<'_, W> {
    fn skip(&mut self, raw: &str, err: &anyhow::Error) -> Result<()> {
        self.diag.skipped(&self.phase.to_string(), raw, err)?;
        self.budget.record_skip()
    }

    fn skip_line(&mut self, line: &[u8], err: &anyhow::Error) -> Result<()> {
        let raw = String::from_utf8_lossy(line);
        self.skip(raw.trim_end_matches(['\r', '\n']), err)
    }
}

/// Forwards to the real sink and remembers a write failure, which ends the
/// phase instead of being charged to the record that triggered it.
struct Guarded<'a> {
    inner: &'a mut dyn Sink,
    failure: Option<io::Error>,
}

impl<'a> Guarded<'a> {
    fn new(inner: &'a mut dyn Sink) -> Self {
        Self {
            inner,
            failure: None,
        }
    }

    fn check(&mut self) -> Result<()> {
        match self.failure.take() {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }
}

impl Sink for Guarded<'_> {
    fn emit(&mut self, record: Record) -> io::Result<()> {
        self.inner.emit(record).map_err(|err| {
            let copy = io::Error::new(err.kind(), err.to_string());
            if self.failure.is_none() {
                self.failure = Some(err);
            }
            copy
        })
    }
}

/// Decode each line with the input delimiter and hand it to [`Job::map`].
pub fn run_map<J, R, W>(
    job: &mut J,
    config: &JobConfig,
    input: R,
    out: &mut dyn Sink,
    diag: &mut Diagnostics<W>,
) -> Result<PhaseReport>
where
    J: Job + ?Sized,
    R: BufRead,
    W: Write,
{
    let mut skipper = Skipper {
        phase: Phase::Map,
        budget: ErrorBudget::new(config.allowed_errors),
        diag,
    };
    let mut out = Guarded::new(out);
    let mut report = PhaseReport::default();

    for line in input.split(b'\n') {
        let line = line?;
        report.records += 1;
        let result = Record::decode_bytes(&line, config.in_sep)
            .map_err(anyhow::Error::from)
            .and_then(|record| job.map(record, &mut out));
        out.check()?;
        if let Err(err) = result {
            skipper.skip_line(&line, &err)?;
        }
    }

    report.skipped = skipper.budget.skipped();
    info!(phase = %Phase::Map, records = report.records, skipped = report.skipped, "phase finished");
    Ok(report)
}

/// Reduce with [`Job::reduce`].
pub fn run_reduce<J, R, W>(
    job: &mut J,
    config: &JobConfig,
    input: R,
    out: &mut dyn Sink,
    diag: &mut Diagnostics<W>,
) -> Result<PhaseReport>
where
    J: Job + ?Sized,
    R: BufRead,
    W: Write,
{
    run_grouping(job, Phase::Reduce, config, input, out, diag, |job, key, acc, out| {
        job.reduce(key, acc, out)
    })
}

/// Same grouping as [`run_reduce`], with [`Job::combine`] called per group.
pub fn run_combine<J, R, W>(
    job: &mut J,
    config: &JobConfig,
    input: R,
    out: &mut dyn Sink,
    diag: &mut Diagnostics<W>,
) -> Result<PhaseReport>
where
    J: Job + ?Sized,
    R: BufRead,
    W: Write,
{
    run_grouping(job, Phase::Combine, config, input, out, diag, |job, key, acc, out| {
        job.combine(key, acc, out)
    })
}

/// Group a key-sorted stream into runs of equal keys and call `reduce_fn`
/// once per run.
///
/// Lines are decoded with the output delimiter; the first
/// `num_partition_keys` fields are the key. A record that fails to decode or
/// aggregate leaves the open group exactly as it was, so the next good record
/// is still compared against the same key.
pub fn run_grouping<J, R, W, F>(
    job: &mut J,
    phase: Phase,
    config: &JobConfig,
    input: R,
    out: &mut dyn Sink,
    diag: &mut Diagnostics<W>,
    mut reduce_fn: F,
) -> Result<PhaseReport>
where
    J: Job + ?Sized,
    R: BufRead,
    W: Write,
    F: FnMut(&mut J, &Key, Acc<J>, &mut dyn Sink) -> anyhow::Result<()>,
{
    let mut skipper = Skipper {
        phase,
        budget: ErrorBudget::new(config.allowed_errors),
        diag,
    };
    let mut out = Guarded::new(out);
    let mut report = PhaseReport::default();

    let mut current_key: Option<Key> = None;
    let mut current_acc: Option<Acc<J>> = None;

    for line in input.split(b'\n') {
        let line = line?;
        report.records += 1;

        let (key, value) = match Record::decode_bytes(&line, config.out_sep)
            .and_then(|record| record.split_key(config.num_partition_keys))
        {
            Ok(split) => split,
            Err(err) => {
                skipper.skip_line(&line, &err.into())?;
                continue;
            }
        };

        if current_key.as_ref() == Some(&key) {
            if let Err(err) = job.aggregator().aggregate(&mut current_acc, value) {
                skipper.skip_line(&line, &err)?;
            }
            continue;
        }

        let mut acc = None;
        let opened = job
            .aggregator()
            .aggregate(&mut acc, value)
            .and_then(|()| acc.ok_or_else(|| anyhow!("aggregator produced no accumulator")));
        let acc = match opened {
            Ok(acc) => acc,
            Err(err) => {
                skipper.skip_line(&line, &err)?;
                continue;
            }
        };

        if let Some(done) = current_key.replace(key) {
            report.groups += 1;
            flush(job, &mut reduce_fn, done, current_acc.take(), &mut out, &mut skipper, config)?;
        }
        current_acc = Some(acc);
    }

    if let Some(done) = current_key.take() {
        report.groups += 1;
        flush(job, &mut reduce_fn, done, current_acc.take(), &mut out, &mut skipper, config)?;
    }

    report.skipped = skipper.budget.skipped();
    info!(
        phase = %phase,
        records = report.records,
        groups = report.groups,
        skipped = report.skipped,
        "phase finished"
    );
    Ok(report)
}

fn flush<J, W, F>(
    job: &mut J,
    reduce_fn: &mut F,
    key: Key,
    acc: Option<Acc<J>>,
    out: &mut Guarded<'_>,
    skipper: &mut Skipper<'_, W>,
    config: &JobConfig,
) -> Result<()>
where
    J: Job + ?Sized,
    W: Write,
    F: FnMut(&mut J, &Key, Acc<J>, &mut dyn Sink) -> anyhow::Result<()>,
{
    debug!(key = ?key, "flushing group");
    let result = match acc {
        Some(acc) => reduce_fn(job, &key, acc, out),
        None => Err(anyhow!("group has no accumulator")),
    };
    out.check()?;
    if let Err(err) = result {
        let raw = Record::new(key).encode(config.out_sep);
        skipper.skip(&raw, &err)?;
    }
    Ok(())
}

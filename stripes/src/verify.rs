//! Local dry run of a whole job over a small sample.
//!
//! Mimics what the cluster does between phases: each phase's output is
//! sorted before it becomes the next phase's input.

use std::io::{BufRead, Write};

use itertools::Itertools;
use tracing::info;

use crate::cli::{run_streaming, Phase};
use crate::config::JobConfig;
use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::job::Job;

/// Read at most `test_rows` lines from `input` and push them through map,
/// combine (when the job has one) and reduce, printing each stage's output.
pub fn run_local_verification<J, R, O, W>(
    job: &mut J,
    config: &JobConfig,
    input: R,
    mut output: O,
    diag: &mut Diagnostics<W>,
) -> Result<()>
where
    J: Job,
    R: BufRead,
    O: Write,
    W: Write,
{
    let sample: Vec<Vec<u8>> = input
        .split(b'\n')
        .take(config.test_rows)
        .collect::<std::io::Result<_>>()?;
    info!(rows = sample.len(), "running local verification");

    let mut stages = vec![Phase::Map];
    if job.has_combiner() {
        stages.push(Phase::Combine);
    }
    if job.has_reducer() {
        stages.push(Phase::Reduce);
    }

    let mut lines = sample;
    for phase in stages {
        let mut captured = Vec::new();
        run_streaming(job, config, phase, join_lines(&lines).as_slice(), &mut captured, diag)?;
        lines = split_lines(&captured);
        print_stage(&mut output, phase, &lines, config.out_sep)?;
        lines = lines.into_iter().sorted().collect();
    }
    output.flush()?;
    Ok(())
}

fn join_lines(lines: &[Vec<u8>]) -> Vec<u8> {
    lines.iter().flat_map(|l| l.iter().chain(b"\n")).copied().collect()
}

/// Every `\n`-terminated line, empty ones included.
fn split_lines(buf: &[u8]) -> Vec<Vec<u8>> {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    if buf.is_empty() {
        return Vec::new();
    }
    buf.split(|b| *b == b'\n').map(<[u8]>::to_vec).collect()
}

/// Delimiters are shown as tabs so control characters stay readable.
fn print_stage<O: Write>(output: &mut O, phase: Phase, lines: &[Vec<u8>], sep: char) -> Result<()> {
    writeln!(output, "--{phase} output--")?;
    for line in lines {
        let text = String::from_utf8_lossy(line);
        writeln!(output, "{}", text.replace(sep, "\t"))?;
    }
    Ok(())
}

//! The user-facing side of the harness.

use crate::aggregate::Aggregator;
use crate::cli::Phase;
use crate::config::JobConfig;
use crate::error::Error;
use crate::record::{Key, Record};
use crate::sink::Sink;

/// Accumulator type a job's reducer and combiner receive.
pub type Acc<J> = <<J as Job>::Aggregator as Aggregator>::Acc;

/// A streaming job.
///
/// Only [`map`](Job::map) is required. A job that combines overrides both
/// [`combine`](Job::combine) and [`has_combiner`](Job::has_combiner); a
/// map-only job returns `false` from [`has_reducer`](Job::has_reducer).
pub trait Job {
    type Aggregator: Aggregator;

    fn aggregator(&self) -> &Self::Aggregator;

    /// Called once before the first record of the map, combine and reduce
    /// phases. Files listed as local side files are in the working directory.
    fn load_side_data(&mut self, _phase: Phase, _config: &JobConfig) -> anyhow::Result<()> {
        Ok(())
    }

    fn map(&mut self, record: Record, out: &mut dyn Sink) -> anyhow::Result<()>;

    fn reduce(&mut self, _key: &Key, _acc: Acc<Self>, _out: &mut dyn Sink) -> anyhow::Result<()> {
        Err(Error::UnsupportedPhase(Phase::Reduce).into())
    }

    /// Only called when [`has_combiner`](Job::has_combiner) returns `true`:
    /// that flag alone decides whether `-p combine` runs and whether the
    /// launch command wires a `-combiner`. Override both together.
    fn combine(&mut self, _key: &Key, _acc: Acc<Self>, _out: &mut dyn Sink) -> anyhow::Result<()> {
        Err(Error::UnsupportedPhase(Phase::Combine).into())
    }

    fn has_reducer(&self) -> bool {
        true
    }

    /// Whether [`combine`](Job::combine) is implemented.
    fn has_combiner(&self) -> bool {
        false
    }
}

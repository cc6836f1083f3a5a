use std::io;

use thiserror::Error;

use crate::cli::Phase;

/// Errors surfaced by the harness.
///
/// `Decode` and `MissingField` are per-record and normally end up as skips
/// counted against the error budget. Everything else ends the phase.
#[derive(Debug, Error)]
pub enum Error {
    #[error("decode error: {0}")]
    Decode(String),
    #[error("record has no field at index {index} (only {len} fields)")]
    MissingField { index: usize, len: usize },
    #[error("error budget exceeded: {skipped} records skipped, {allowed} allowed")]
    BudgetExceeded { skipped: usize, allowed: usize },
    #[error("side data for the {phase} phase failed to load: {source:#}")]
    SideData {
        phase: Phase,
        #[source]
        source: anyhow::Error,
    },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("job does not implement the {0} phase")]
    UnsupportedPhase(Phase),
    #[error("launch failed: {0}")]
    Launch(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

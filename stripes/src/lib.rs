//! Write a line-oriented map/combine/reduce job once, run it locally over
//! stdin or hand it to hadoop streaming.
//!
//! A job binary is a [`Job`] plus a `main` that calls [`run`]; the `-p`
//! flag picks the phase.

pub mod aggregate;
pub mod budget;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod job;
pub mod launch;
pub mod logging;
pub mod phase;
pub mod record;
pub mod sink;
pub mod verify;

pub use aggregate::{AggregateFn, Aggregator, Collect, CountSum};
pub use budget::ErrorBudget;
pub use cli::{dispatch, run, Phase};
pub use config::{JobConfig, Priority, SideFile, SideFileLocation};
pub use diagnostics::Diagnostics;
pub use error::{Error, Result};
pub use job::{Acc, Job};
pub use launch::LaunchDescriptor;
pub use phase::{run_combine, run_grouping, run_map, run_reduce, PhaseReport};
pub use record::{Key, Record};
pub use sink::{CaptureSink, LineSink, Sink};

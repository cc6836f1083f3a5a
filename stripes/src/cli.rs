//! Phase selection and dispatch.

use std::env;
use std::fmt;
use std::io::{self, BufRead, BufWriter, Write};

use clap::{Parser, ValueEnum};
use tracing::{debug, info};

use crate::config::JobConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::job::Job;
use crate::launch::LaunchDescriptor;
use crate::logging::init_logger;
use crate::phase::{run_combine, run_map, run_reduce, PhaseReport};
use crate::sink::LineSink;
use crate::verify::run_local_verification;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Phase {
    /// Build the streaming command and hand the job to the cluster.
    Launch,
    Map,
    Combine,
    Reduce,
    /// Run map, combine and reduce locally over a sample read from stdin.
    #[value(alias = "local-verification")]
    Test,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Launch => "launch",
            Phase::Map => "map",
            Phase::Combine => "combine",
            Phase::Reduce => "reduce",
            Phase::Test => "test",
        };
        f.write_str(s)
    }
}

#[derive(Parser, Debug)]
#[command(about = "Run one phase of a streaming map/combine/reduce job")]
pub struct Cli {
    /// Which phase to run.
    #[arg(short, long, value_enum, default_value_t = Phase::Launch)]
    pub phase: Phase,
}

/// Entry point for a job binary: parse the phase flag and run it over
/// stdin/stdout.
pub fn run<J: Job>(mut job: J, config: JobConfig) -> anyhow::Result<()> {
    let _guard = init_logger();
    let cli = Cli::parse();
    config.validate()?;
    debug!(?config, "job configuration");

    let stdin = io::stdin();
    let stdout = io::stdout();
    dispatch(
        &mut job,
        &config,
        cli.phase,
        stdin.lock(),
        stdout.lock(),
        &mut Diagnostics::stderr(),
    )?;
    Ok(())
}

/// Run `phase` over `input`, writing records to `output`.
pub fn dispatch<J, R, O, W>(
    job: &mut J,
    config: &JobConfig,
    phase: Phase,
    input: R,
    output: O,
    diag: &mut Diagnostics<W>,
) -> Result<()>
where
    J: Job,
    R: BufRead,
    O: Write,
    W: Write,
{
    info!(%phase, "starting phase");
    match phase {
        Phase::Launch => {
            let executable = env::current_exe()?;
            LaunchDescriptor::build(&*job, config, &executable)?.launch()
        }
        Phase::Map | Phase::Combine | Phase::Reduce => {
            run_streaming(job, config, phase, input, output, diag).map(|_| ())
        }
        Phase::Test => run_local_verification(job, config, input, output, diag),
    }
}

/// Load side data, then run one streaming phase into a line sink.
pub(crate) fn run_streaming<J, R, O, W>(
    job: &mut J,
    config: &JobConfig,
    phase: Phase,
    input: R,
    output: O,
    diag: &mut Diagnostics<W>,
) -> Result<PhaseReport>
where
    J: Job,
    R: BufRead,
    O: Write,
    W: Write,
{
    match phase {
        Phase::Combine if !job.has_combiner() => return Err(Error::UnsupportedPhase(phase)),
        Phase::Reduce if !job.has_reducer() => return Err(Error::UnsupportedPhase(phase)),
        _ => {}
    }

    job.load_side_data(phase, config)
        .map_err(|source| Error::SideData { phase, source })?;

    // Dropping the writer on an early return still flushes what was emitted.
    let mut sink = LineSink::new(BufWriter::new(output), config.out_sep);
    let report = match phase {
        Phase::Map => run_map(job, config, input, &mut sink, diag)?,
        Phase::Combine => run_combine(job, config, input, &mut sink, diag)?,
        Phase::Reduce => run_reduce(job, config, input, &mut sink, diag)?,
        Phase::Launch | Phase::Test => return Err(Error::UnsupportedPhase(phase)),
    };
    sink.flush()?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::CountSum;
    use crate::record::{Key, Record};
    use crate::sink::Sink;
    use crate::{record, Acc};
    use anyhow::bail;

    #[derive(Default)]
    struct Lengths {
        loaded: Vec<Phase>,
        fail_load: bool,
    }

    impl Job for Lengths {
        type Aggregator = CountSum;

        fn aggregator(&self) -> &CountSum {
            &CountSum
        }

        fn load_side_data(&mut self, phase: Phase, _config: &JobConfig) -> anyhow::Result<()> {
            if self.fail_load {
                bail!("lookup file missing");
            }
            self.loaded.push(phase);
            Ok(())
        }

        fn map(&mut self, record: Record, out: &mut dyn Sink) -> anyhow::Result<()> {
            let word = record.field(0)?;
            out.emit(record![word.len(), 1])?;
            Ok(())
        }

        fn reduce(&mut self, key: &Key, acc: Acc<Self>, out: &mut dyn Sink) -> anyhow::Result<()> {
            out.emit(record![key[0], acc])?;
            Ok(())
        }
    }

    fn run_phase(job: &mut Lengths, phase: Phase, input: &str) -> Result<String> {
        let config = JobConfig::default().with_separators(' ', ' ');
        let mut output = Vec::new();
        let mut diag = Diagnostics::new(io::sink());
        dispatch(job, &config, phase, input.as_bytes(), &mut output, &mut diag)?;
        Ok(String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_cli_default_phase_is_launch() {
        assert_eq!(Cli::parse_from(["job"]).phase, Phase::Launch);
        assert_eq!(Cli::parse_from(["job", "-p", "map"]).phase, Phase::Map);
        assert_eq!(Cli::parse_from(["job", "--phase", "reduce"]).phase, Phase::Reduce);
        assert_eq!(Cli::parse_from(["job", "-p", "local-verification"]).phase, Phase::Test);
        assert!(Cli::try_parse_from(["job", "-p", "shuffle"]).is_err());
    }

    #[test]
    fn test_dispatch_map_then_reduce() {
        let mut job = Lengths::default();
        let mapped = run_phase(&mut job, Phase::Map, "ab\ncd\nxyz\n").unwrap();
        assert_eq!(mapped, "2 1\n2 1\n3 1\n");

        let reduced = run_phase(&mut job, Phase::Reduce, &mapped).unwrap();
        assert_eq!(reduced, "2 2\n3 1\n");
        assert_eq!(job.loaded, [Phase::Map, Phase::Reduce]);
    }

    #[test]
    fn test_missing_combiner_is_rejected() {
        let mut job = Lengths::default();
        assert!(matches!(
            run_phase(&mut job, Phase::Combine, "2 1\n"),
            Err(Error::UnsupportedPhase(Phase::Combine))
        ));
        assert!(job.loaded.is_empty());
    }

    #[test]
    fn test_output_before_a_fatal_error_is_kept() {
        let config = JobConfig::default().with_separators(' ', ' ');
        let mut job = Lengths::default();
        let mut output = Vec::new();
        let mut diag = Diagnostics::new(Vec::new());
        let err = dispatch(
            &mut job,
            &config,
            Phase::Reduce,
            "2 1\n3 1\n4 x\n".as_bytes(),
            &mut output,
            &mut diag,
        )
        .unwrap_err();
        assert!(matches!(err, Error::BudgetExceeded { skipped: 1, allowed: 0 }));
        assert_eq!(String::from_utf8(output).unwrap(), "2 1\n");
    }

    #[test]
    fn test_side_data_failure_is_fatal_before_any_record() {
        let mut job = Lengths {
            fail_load: true,
            ..Default::default()
        };
        let err = run_phase(&mut job, Phase::Map, "ab\n").unwrap_err();
        assert!(matches!(err, Error::SideData { phase: Phase::Map, .. }));
        assert!(err.to_string().contains("lookup file missing"));
    }
}

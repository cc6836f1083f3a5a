//! The hadoop streaming command for a job.
//!
//! Finding the hadoop install and the streaming jar, and clearing an old
//! output directory, are left to whoever sets up the [`JobConfig`].

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::info;

use crate::cli::Phase;
use crate::config::JobConfig;
use crate::error::{Error, Result};
use crate::job::Job;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchDescriptor {
    pub program: String,
    pub args: Vec<String>,
    pub mapper: String,
    pub combiner: Option<String>,
    pub reducer: Option<String>,
    /// Files shipped to the task working directories with `-file`.
    pub staged_files: Vec<PathBuf>,
}

impl LaunchDescriptor {
    /// `executable` is the job binary; every task re-runs it with `-p <phase>`.
    pub fn build<J: Job + ?Sized>(job: &J, config: &JobConfig, executable: &Path) -> Result<Self> {
        let jar = config
            .streaming_jar
            .as_ref()
            .ok_or_else(|| Error::Config("streaming_jar must be set to launch".into()))?;
        if config.input_dir.is_empty() {
            return Err(Error::Config("input_dir must be set to launch".into()));
        }
        let exe_name = executable
            .file_name()
            .ok_or_else(|| Error::Config(format!("{} is not a file", executable.display())))?
            .to_string_lossy()
            .into_owned();

        let sub_command = |phase: Phase| format!("{exe_name} -p {phase}");
        let mapper = sub_command(Phase::Map);
        let combiner = job.has_combiner().then(|| sub_command(Phase::Combine));
        let reducer = job.has_reducer().then(|| sub_command(Phase::Reduce));

        let mut staged_files = vec![executable.to_path_buf()];
        staged_files.extend(config.local_side_files().cloned());

        let mut args = vec!["jar".to_string(), jar.display().to_string()];
        for (name, value) in [
            ("hadoop.job.history.user.location", config.history_loc.clone()),
            ("stream.map.output.field.separator", escape_separator(config.out_sep)),
            ("mapred.reduce.tasks", config.reduce_tasks.to_string()),
            ("mapred.job.priority", config.priority.to_string()),
            ("num.key.fields.for.partition", config.num_partition_keys.to_string()),
        ] {
            args.push("-D".to_string());
            args.push(format!("{name}={value}"));
        }
        args.extend([
            "-input".to_string(),
            config.input_dir.clone(),
            "-output".to_string(),
            config.output_dir.clone(),
            "-mapper".to_string(),
            mapper.clone(),
        ]);
        if let Some(combiner) = &combiner {
            args.extend(["-combiner".to_string(), combiner.clone()]);
        }
        if let Some(reducer) = &reducer {
            args.extend(["-reducer".to_string(), reducer.clone()]);
        } else {
            args.extend(["-numReduceTasks".to_string(), "0".to_string()]);
        }
        args.extend(config.streaming_args.iter().cloned());
        for file in &staged_files {
            args.extend(["-file".to_string(), file.display().to_string()]);
        }

        Ok(Self {
            program: config.hadoop_bin.clone(),
            args,
            mapper,
            combiner,
            reducer,
            staged_files,
        })
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        cmd
    }

    /// Run the streaming job and wait for it.
    pub fn launch(&self) -> Result<()> {
        info!(command = %self, "launching streaming job");
        let status = self
            .command()
            .status()
            .map_err(|e| Error::Launch(format!("could not start {}: {e}", self.program)))?;
        if !status.success() {
            return Err(Error::Launch(format!("{} exited with {status}", self.program)));
        }
        Ok(())
    }
}

impl fmt::Display for LaunchDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let argv = std::iter::once(&self.program).chain(&self.args);
        f.write_str(&shell_words::join(argv))
    }
}

/// Control characters in the `\ooo` form streaming unescapes.
fn escape_separator(sep: char) -> String {
    if sep.is_control() && (sep as u32) < 0o400 {
        format!("\\{:03o}", sep as u32)
    } else {
        sep.to_string()
    }
}

//! EnergyPlus process invocation
//!
//! Every run gets its own temporary directory holding a private copy of the
//! input file. EnergyPlus writes sibling artifacts (`.rvi`, `.mvi`) next to its
//! input, so runs sharing one source file would clobber each other.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, info, warn};

use crate::config::{Config, DEFAULT_OUTPUT_PREFIX, EPLUS_EXEC};
use crate::error::{Result, SubError};
use crate::path::expand;
use crate::table::Table;

/// Name of the input file copied into each run directory
pub const RUN_IDF_NAME: &str = "in.idf";

/// Something that turns an IDF and a weather file into simulation output
pub trait SimulationRunner {
    fn run(&self, idf: &Path, weather: &Path, verbose: bool) -> Result<Table>;
}

impl<R: SimulationRunner + ?Sized> SimulationRunner for &R {
    fn run(&self, idf: &Path, weather: &Path, verbose: bool) -> Result<Table> {
        (**self).run(idf, weather, verbose)
    }
}

impl<R: SimulationRunner + ?Sized> SimulationRunner for Box<R> {
    fn run(&self, idf: &Path, weather: &Path, verbose: bool) -> Result<Table> {
        (**self).run(idf, weather, verbose)
    }
}

/// Runs the `energyplus` command-line binary
#[derive(Debug, Clone)]
pub struct EnergyPlusRunner {
    executable: String,
    output_prefix: String,
    tmp_dir_prefix: PathBuf,
    check_exit_status: bool,
}

impl Default for EnergyPlusRunner {
    fn default() -> Self {
        Self {
            executable: EPLUS_EXEC.to_string(),
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
            tmp_dir_prefix: PathBuf::from("/tmp"),
            check_exit_status: true,
        }
    }
}

impl EnergyPlusRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            executable: config.executable.clone(),
            output_prefix: config.output_prefix.clone(),
            tmp_dir_prefix: config.tmp_dir_prefix.clone(),
            check_exit_status: config.check_exit_status,
        }
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = executable.into();
        self
    }

    pub fn with_tmp_dir_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.tmp_dir_prefix = prefix.into();
        self
    }

    /// Read the result file even when the process exits non-zero
    pub fn allow_failed_runs(mut self) -> Self {
        self.check_exit_status = false;
        self
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Name of the CSV EnergyPlus writes into the output directory
    pub fn result_file_name(&self) -> String {
        format!("{}out.csv", self.output_prefix)
    }

    /// `<exe> -w <weather> -d <out_dir> -p <prefix> -r <idf>`, run inside `out_dir`
    pub fn build_command(&self, idf: &Path, weather: &Path, out_dir: &Path) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.arg("-w")
            .arg(weather)
            .arg("-d")
            .arg(out_dir)
            .arg("-p")
            .arg(&self.output_prefix)
            .arg("-r")
            .arg(idf)
            .current_dir(out_dir);
        cmd
    }
}

impl SimulationRunner for EnergyPlusRunner {
    fn run(&self, idf: &Path, weather: &Path, verbose: bool) -> Result<Table> {
        let idf = expand(idf);
        let weather = expand(weather);
        let prefix = expand(&self.tmp_dir_prefix);

        let run_dir = tempfile::Builder::new()
            .prefix(".")
            .suffix("_test")
            .tempdir_in(&prefix)
            .map_err(|e| SubError::io(&prefix, e))?;

        let run_idf = run_dir.path().join(RUN_IDF_NAME);
        std::fs::copy(&idf, &run_idf).map_err(|e| SubError::io(&idf, e))?;

        let mut cmd = self.build_command(&run_idf, &weather, run_dir.path());
        cmd.stdin(Stdio::null());
        if verbose {
            info!(command = ?cmd, "Running simulation");
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        } else {
            debug!(command = ?cmd, "Running simulation");
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        let status = cmd.status().map_err(|source| SubError::Spawn {
            program: self.executable.clone(),
            source,
        })?;

        if !status.success() {
            if self.check_exit_status {
                return Err(SubError::SimulationFailed { status });
            }
            warn!(%status, "Simulation exited unsuccessfully, reading results anyway");
        }

        let result_path = run_dir.path().join(self.result_file_name());
        if !result_path.exists() {
            return Err(SubError::ResultMissing { path: result_path });
        }

        let table = Table::from_path(&result_path)?;
        debug!(rows = table.len(), columns = table.columns().len(), "Read simulation output");
        Ok(table)
    }
}

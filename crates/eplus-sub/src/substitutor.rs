//! Substitute one request into a template and optionally simulate it

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Result, SubError};
use crate::path::expand;
use crate::request::{ScalarRequest, SubstitutionRequest};
use crate::runner::{EnergyPlusRunner, SimulationRunner};
use crate::substitute::substitute_file;
use crate::table::Table;

/// File name of the generated document inside its scratch directory
pub const GENERATED_IDF_NAME: &str = "generated_input.idf";

/// Result of one substitution
#[derive(Debug, Clone, PartialEq)]
pub enum SubstitutionOutput {
    /// Modified document text (no weather file given)
    Document(String),
    /// Parsed simulation output
    Simulation(Table),
}

impl SubstitutionOutput {
    pub fn as_document(&self) -> Option<&str> {
        match self {
            Self::Document(text) => Some(text),
            Self::Simulation(_) => None,
        }
    }

    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Self::Document(_) => None,
            Self::Simulation(table) => Some(table),
        }
    }
}

/// Drives substitution and simulation for one template
pub struct Substitutor<R = EnergyPlusRunner> {
    runner: R,
    workspace_dir: PathBuf,
}

impl Substitutor<EnergyPlusRunner> {
    pub fn from_config(config: &Config) -> Self {
        Self::new(EnergyPlusRunner::from_config(config)).with_workspace_dir(&config.workspace_dir)
    }
}

impl<R: SimulationRunner> Substitutor<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner,
            workspace_dir: PathBuf::from("~"),
        }
    }

    /// Parent directory for generated documents
    pub fn with_workspace_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = dir.into();
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Substitute a request whose values are scalars or length-1 sequences.
    pub fn substitute_one(
        &self,
        template: &Path,
        weather: Option<&Path>,
        request: &SubstitutionRequest,
        verbose: bool,
    ) -> Result<SubstitutionOutput> {
        let request = request.normalize()?;
        self.substitute_scalar(template, weather, &request, verbose)
    }

    pub(crate) fn substitute_scalar(
        &self,
        template: &Path,
        weather: Option<&Path>,
        request: &ScalarRequest,
        verbose: bool,
    ) -> Result<SubstitutionOutput> {
        let document = substitute_file(template, request)?;

        let workspace = expand(&self.workspace_dir);
        let scratch = tempfile::Builder::new()
            .prefix(".")
            .suffix("_test")
            .tempdir_in(&workspace)
            .map_err(|e| SubError::io(&workspace, e))?;

        let generated = scratch.path().join(GENERATED_IDF_NAME);
        std::fs::write(&generated, &document).map_err(|e| SubError::io(&generated, e))?;

        if verbose {
            info!(path = %generated.display(), fields = request.len(), "Wrote generated input");
        } else {
            debug!(path = %generated.display(), fields = request.len(), "Wrote generated input");
        }

        match weather {
            Some(weather) => {
                let table = self.runner.run(&generated, weather, verbose)?;
                Ok(SubstitutionOutput::Simulation(table))
            }
            None => Ok(SubstitutionOutput::Document(document)),
        }
    }
}

//! EnergyPlus input substitution and simulation runs
//!
//! This crate rewrites individual fields of an IDF template, optionally runs
//! the `energyplus` binary on each generated input, and reads back its CSV
//! output. It also reads and writes EPW weather files.
//!
//! ```no_run
//! use std::path::Path;
//! use eplus_sub::{Config, SubstitutionRequest, Substitutor};
//!
//! let config = Config::load(None)?;
//! let request = SubstitutionRequest::new()
//!     .with("Schedule:Compact", "HTGSETP_SCH_NO_OPTIMUM", "Field 6", vec![20.0, 21.0, 22.0]);
//!
//! let results = Substitutor::from_config(&config).dispatch(
//!     Path::new("model.idf"),
//!     Some(Path::new("KOR_Inchon.471120_IWEC.epw")),
//!     &request,
//!     false,
//! )?;
//! assert_eq!(results.len(), 3);
//! # Ok::<(), eplus_sub::SubError>(())
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod batch;
pub mod config;
pub mod error;
pub mod path;
pub mod request;
pub mod runner;
pub mod substitute;
pub mod substitutor;
pub mod table;
pub mod weather;

// Re-export core types
pub use batch::{batch_size, plan, Dispatch};
pub use config::Config;
pub use error::{Result, SubError};
pub use path::expand_path;
pub use request::{FieldKey, Scalar, ScalarRequest, SubValue, SubstitutionRequest};
pub use runner::{EnergyPlusRunner, SimulationRunner};
pub use substitute::{apply_request, field_value, substitute_field, substitute_file, FieldPattern};
pub use substitutor::{SubstitutionOutput, Substitutor};
pub use table::Table;
pub use weather::Weather;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Config, Dispatch, FieldKey, Result, Scalar, SimulationRunner, SubError,
        SubstitutionOutput, SubstitutionRequest, Substitutor, Table,
    };
}

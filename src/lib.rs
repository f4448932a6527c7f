pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{catalog::TomlCatalog, storage::LocalStorage};
pub use config::AppConfig;
pub use crate::core::batch::{BatchEngine, BatchFormat, CsvBatchPipeline};
pub use crate::core::calculation::{run_calculation, CalculationOutcome};
pub use crate::core::calculator::{compute_default, compute_report};
pub use domain::model::{
    Advisory, CalculatorConfig, PeptideProfile, RawReconstitutionInput, ReconstitutionInput,
    ReconstitutionReport, SyringeScale,
};
pub use utils::error::{InputField, InvalidInput, InvalidReason, PepcalcError, Result};

pub mod advisory;
pub mod batch;
pub mod calculation;
pub mod calculator;
pub mod format;

pub use crate::domain::model::{ReconstitutionInput, ReconstitutionReport};
pub use crate::domain::ports::{PeptideCatalog, Pipeline, Storage};
pub use crate::utils::error::Result;

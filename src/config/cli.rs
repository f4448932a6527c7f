use crate::core::batch::BatchFormat;
use crate::domain::model::{RawReconstitutionInput, SyringeScale};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "pepcalc")]
#[command(about = "Peptide reconstitution and dosing calculator")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(long, global = true, default_value = super::toml_config::DEFAULT_CONFIG_FILE)]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Calculate a single reconstitution
    Calc(CalcArgs),
    /// Calculate every row of a CSV file
    Batch(BatchArgs),
    /// Inspect the peptide catalog
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

// 數值參數以字串接收，交給 RawReconstitutionInput 做欄位層級的驗證
#[derive(Debug, Clone, Args)]
pub struct CalcArgs {
    #[arg(long, default_value = "")]
    pub peptide: String,

    #[arg(long = "vial-mg", allow_hyphen_values = true)]
    pub vial_mg: String,

    #[arg(long = "water-ml", allow_hyphen_values = true)]
    pub water_ml: String,

    #[arg(long = "dose-mcg", allow_hyphen_values = true)]
    pub dose_mcg: String,

    #[arg(long = "doses-per-day", default_value = "1", allow_hyphen_values = true)]
    pub doses_per_day: String,

    /// u100 or u40; overrides the config file
    #[arg(long)]
    pub syringe: Option<SyringeScale>,

    /// text or json; overrides the config file
    #[arg(long)]
    pub format: Option<String>,

    /// Peptide catalog used for dose-range warnings
    #[arg(long)]
    pub catalog: Option<String>,

    /// Reconstitution date (YYYY-MM-DD), used to report the expiration date
    #[arg(long)]
    pub reconstituted_on: Option<NaiveDate>,
}

impl CalcArgs {
    pub fn raw_input(&self) -> RawReconstitutionInput {
        RawReconstitutionInput {
            peptide_name: self.peptide.clone(),
            vial_amount_mg: self.vial_mg.clone(),
            water_volume_ml: self.water_ml.clone(),
            desired_dose_mcg: self.dose_mcg.clone(),
            doses_per_day: self.doses_per_day.clone(),
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct BatchArgs {
    /// CSV with peptide_name,vial_amount_mg,water_volume_ml,desired_dose_mcg,doses_per_day
    #[arg(long)]
    pub input: String,

    #[arg(long, default_value = "pepcalc_results.csv")]
    pub output: String,

    #[arg(long, default_value = "csv")]
    pub format: BatchFormat,

    #[arg(long)]
    pub syringe: Option<SyringeScale>,

    #[arg(long)]
    pub catalog: Option<String>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum CatalogAction {
    /// List every peptide in the catalog
    List {
        #[arg(long)]
        catalog: Option<String>,
    },
    /// Show one peptide
    Show {
        name: String,
        #[arg(long)]
        catalog: Option<String>,
    },
}

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// 計算輸入的欄位名稱
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputField {
    VialAmountMg,
    WaterVolumeMl,
    DesiredDoseMcg,
    DosesPerDay,
}

impl InputField {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputField::VialAmountMg => "vial_amount_mg",
            InputField::WaterVolumeMl => "water_volume_ml",
            InputField::DesiredDoseMcg => "desired_dose_mcg",
            InputField::DosesPerDay => "doses_per_day",
        }
    }
}

impl fmt::Display for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReason {
    Missing,
    NotANumber { raw: String },
    NotFinite,
    NotPositive { value: f64 },
    NotInteger { value: f64 },
    OutOfRange { value: f64 },
}

impl fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InvalidReason::Missing => write!(f, "value is required"),
            InvalidReason::NotANumber { raw } => write!(f, "'{}' is not a number", raw),
            InvalidReason::NotFinite => write!(f, "value must be a finite number"),
            InvalidReason::NotPositive { value } => {
                write!(f, "must be greater than 0 (got {})", value)
            }
            InvalidReason::NotInteger { value } => {
                write!(f, "must be a whole number (got {})", value)
            }
            InvalidReason::OutOfRange { value } => {
                write!(f, "value {} is outside the computable range", value)
            }
        }
    }
}

/// 計算器唯一的錯誤類型：在任何推導之前就會回傳
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[error("Invalid input for {field}: {reason}")]
pub struct InvalidInput {
    pub field: InputField,
    pub reason: InvalidReason,
}

impl InvalidInput {
    pub fn new(field: InputField, reason: InvalidReason) -> Self {
        Self { field, reason }
    }
}

#[derive(Error, Debug)]
pub enum PepcalcError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Catalog error: {message}")]
    CatalogError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Catalog,
    Io,
    Data,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl PepcalcError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            PepcalcError::InvalidInput(_) => ErrorCategory::Input,
            PepcalcError::ConfigValidationError { .. }
            | PepcalcError::InvalidConfigValueError { .. }
            | PepcalcError::MissingConfigError { .. } => ErrorCategory::Configuration,
            PepcalcError::CatalogError { .. } => ErrorCategory::Catalog,
            PepcalcError::IoError(_) => ErrorCategory::Io,
            PepcalcError::CsvError(_) | PepcalcError::SerializationError(_) => {
                ErrorCategory::Data
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration | ErrorCategory::Data => {
                ErrorSeverity::High
            }
            ErrorCategory::Catalog => ErrorSeverity::Medium,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            PepcalcError::InvalidInput(e) => match e.field {
                InputField::DosesPerDay => {
                    "Enter doses per day as a whole number of at least 1".to_string()
                }
                field => format!("Enter a positive number for {}", field),
            },
            PepcalcError::IoError(_) => {
                "Check that the file exists and that you have permission to access it".to_string()
            }
            PepcalcError::CsvError(_) => {
                "Check the CSV header: peptide_name,vial_amount_mg,water_volume_ml,desired_dose_mcg,doses_per_day".to_string()
            }
            PepcalcError::SerializationError(_) => {
                "Check the output data for values that cannot be serialized".to_string()
            }
            PepcalcError::ConfigValidationError { field, .. }
            | PepcalcError::InvalidConfigValueError { field, .. } => {
                format!("Fix the '{}' setting in your configuration file", field)
            }
            PepcalcError::MissingConfigError { field } => {
                format!("Add the '{}' setting or pass it on the command line", field)
            }
            PepcalcError::CatalogError { .. } => {
                "Check the peptide catalog file and the peptide name".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            PepcalcError::InvalidInput(e) => {
                format!("{} {}", field_label(e.field), e.reason)
            }
            PepcalcError::IoError(e) => format!("Could not read or write a file: {}", e),
            PepcalcError::CsvError(e) => format!("Could not process CSV data: {}", e),
            PepcalcError::SerializationError(e) => format!("Could not produce output: {}", e),
            PepcalcError::ConfigValidationError { message, .. } => {
                format!("Configuration problem: {}", message)
            }
            PepcalcError::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value for {} is invalid: {}", field, reason)
            }
            PepcalcError::MissingConfigError { field } => {
                format!("Missing configuration: {}", field)
            }
            PepcalcError::CatalogError { message } => format!("Catalog problem: {}", message),
        }
    }
}

fn field_label(field: InputField) -> &'static str {
    match field {
        InputField::VialAmountMg => "Vial amount (mg)",
        InputField::WaterVolumeMl => "Water volume (ml)",
        InputField::DesiredDoseMcg => "Desired dose (mcg)",
        InputField::DosesPerDay => "Doses per day",
    }
}

pub type Result<T> = std::result::Result<T, PepcalcError>;

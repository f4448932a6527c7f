use crate::core::advisory::{assess, assess_with_catalog};
use crate::core::calculator::compute_report;
use crate::domain::model::{
    Advisory, CalculatorConfig, RawReconstitutionInput, ReconstitutionInput, ReconstitutionReport,
};
use crate::domain::ports::PeptideCatalog;
use crate::utils::error::InvalidInput;
use chrono::NaiveDate;
use serde::Serialize;

/// 單次計算的完整結果：報告本身、提醒、以及（若可得）到期日
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationOutcome {
    pub input: ReconstitutionInput,
    pub report: ReconstitutionReport,
    pub advisories: Vec<Advisory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_on: Option<NaiveDate>,
}

/// Parse raw fields, compute the report and collect advisories.
pub fn run_calculation(
    raw: &RawReconstitutionInput,
    config: &CalculatorConfig,
    catalog: Option<&dyn PeptideCatalog>,
    reconstituted_on: Option<NaiveDate>,
) -> Result<CalculationOutcome, InvalidInput> {
    let input = raw.parse()?;
    let report = compute_report(&input, config)?;

    let (advisories, profile) = match catalog {
        Some(catalog) => (
            assess_with_catalog(&input, &report, catalog),
            catalog.find(&input.peptide_name),
        ),
        None => (assess(&input, &report, None), None),
    };

    let expires_on = match (profile, reconstituted_on) {
        (Some(profile), Some(date)) => profile.expiration_date(date),
        _ => None,
    };

    Ok(CalculationOutcome {
        input,
        report,
        advisories,
        expires_on,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::catalog::TomlCatalog;
    use crate::utils::error::InputField;

    fn raw(name: &str, per_day: &str) -> RawReconstitutionInput {
        RawReconstitutionInput {
            peptide_name: name.to_string(),
            vial_amount_mg: "5".to_string(),
            water_volume_ml: "2".to_string(),
            desired_dose_mcg: "250".to_string(),
            doses_per_day: per_day.to_string(),
        }
    }

    fn catalog() -> TomlCatalog {
        TomlCatalog::from_toml_str(
            r#"
[[peptides]]
name = "BPC-157"
typical_dose_min_mcg = 200
typical_dose_max_mcg = 500
frequency_per_day = 2
shelf_life_days = 28
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_outcome_with_expiration() {
        let catalog = catalog();
        let outcome = run_calculation(
            &raw("BPC-157", "2"),
            &CalculatorConfig::default(),
            Some(&catalog),
            NaiveDate::from_ymd_opt(2026, 10, 18),
        )
        .unwrap();

        assert_eq!(outcome.report.vial_duration_days, 10);
        assert!(outcome.advisories.is_empty());
        assert_eq!(outcome.expires_on, NaiveDate::from_ymd_opt(2026, 11, 15));
    }

    #[test]
    fn test_outcome_without_catalog() {
        let outcome = run_calculation(
            &raw("Anything", "2"),
            &CalculatorConfig::default(),
            None,
            NaiveDate::from_ymd_opt(2026, 10, 18),
        )
        .unwrap();
        assert!(outcome.advisories.is_empty());
        assert_eq!(outcome.expires_on, None);

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json.get("expires_on").is_none());
        assert_eq!(json["report"]["total_doses_in_vial"], 20);
    }

    #[test]
    fn test_invalid_input_stops_everything() {
        let catalog = catalog();
        let err = run_calculation(
            &raw("BPC-157", "1.5"),
            &CalculatorConfig::default(),
            Some(&catalog),
            None,
        )
        .unwrap_err();
        assert_eq!(err.field, InputField::DosesPerDay);
    }
}

use crate::domain::model::{Advisory, PeptideProfile, ReconstitutionInput, ReconstitutionReport};
use crate::domain::ports::PeptideCatalog;

/// 產生提醒清單。僅供參考，永遠不會讓計算失敗。
pub fn assess(
    input: &ReconstitutionInput,
    report: &ReconstitutionReport,
    profile: Option<&PeptideProfile>,
) -> Vec<Advisory> {
    let mut advisories = Vec::new();

    if report.total_doses_in_vial == 0 {
        advisories.push(Advisory::EmptyVial);
    } else if report.vial_duration_days == 0 {
        advisories.push(Advisory::LastsUnderOneDay {
            total_doses: report.total_doses_in_vial,
            doses_per_day: input.doses_per_day,
        });
    }

    let Some(profile) = profile else {
        return advisories;
    };

    if let Some(min) = profile.typical_dose_min_mcg {
        if input.desired_dose_mcg < min {
            advisories.push(Advisory::BelowTypicalRange {
                dose_mcg: input.desired_dose_mcg,
                min_mcg: min,
            });
        }
    }
    if let Some(max) = profile.typical_dose_max_mcg {
        if input.desired_dose_mcg > max {
            advisories.push(Advisory::AboveTypicalRange {
                dose_mcg: input.desired_dose_mcg,
                max_mcg: max,
            });
        }
    }

    if let Some(typical) = profile.frequency_per_day {
        if typical > 0 && typical != input.doses_per_day {
            advisories.push(Advisory::FrequencyDiffers {
                doses_per_day: input.doses_per_day,
                typical_per_day: typical,
            });
        }
    }

    if let Some(shelf_life) = profile.shelf_life_days {
        if report.vial_duration_days > u64::from(shelf_life) {
            advisories.push(Advisory::OutlastsShelfLife {
                vial_duration_days: report.vial_duration_days,
                shelf_life_days: shelf_life,
            });
        }
    }

    advisories
}

/// 用 catalog 查詢 `input.peptide_name` 後再評估
pub fn assess_with_catalog(
    input: &ReconstitutionInput,
    report: &ReconstitutionReport,
    catalog: &dyn PeptideCatalog,
) -> Vec<Advisory> {
    let profile = catalog.find(&input.peptide_name);
    let mut advisories = assess(input, report, profile);
    if profile.is_none() && !input.peptide_name.trim().is_empty() {
        advisories.push(Advisory::UnknownPeptide {
            name: input.peptide_name.clone(),
        });
    }
    advisories
}

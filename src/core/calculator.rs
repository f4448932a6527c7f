//! Reconstitution calculator.
//!
//! Pure arithmetic over a validated [`ReconstitutionInput`]. No logging and no I/O;
//! identical input always produces a bit-identical [`ReconstitutionReport`].

use crate::domain::model::{CalculatorConfig, ReconstitutionInput, ReconstitutionReport};
use crate::utils::error::{InputField, InvalidInput, InvalidReason};

pub const MCG_PER_MG: f64 = 1000.0;

// 2^64: the first f64 that no longer fits in a u64 dose count
const MAX_DOSE_COUNT: f64 = 18_446_744_073_709_551_616.0;

/// 驗證輸入並計算完整報告。驗證失敗時不做任何推導。
pub fn compute_report(
    input: &ReconstitutionInput,
    config: &CalculatorConfig,
) -> Result<ReconstitutionReport, InvalidInput> {
    validate_input(input)?;

    // 推導值必須是有限正數，否則整份報告作廢
    let total_mcg = in_range(
        InputField::VialAmountMg,
        input.vial_amount_mg,
        input.vial_amount_mg * MCG_PER_MG,
    )?;
    let concentration_mcg_per_ml = in_range(
        InputField::WaterVolumeMl,
        input.water_volume_ml,
        total_mcg / input.water_volume_ml,
    )?;
    let dose_volume_ml = in_range(
        InputField::DesiredDoseMcg,
        input.desired_dose_mcg,
        input.desired_dose_mcg / concentration_mcg_per_ml,
    )?;
    let syringe_units = in_range(
        InputField::DesiredDoseMcg,
        input.desired_dose_mcg,
        dose_volume_ml * config.syringe.units_per_ml(),
    )?;
    let total_mcg_per_day = in_range(
        InputField::DesiredDoseMcg,
        input.desired_dose_mcg,
        input.desired_dose_mcg * f64::from(input.doses_per_day),
    )?;

    // 只取完整劑量，餘數捨去
    let doses = (total_mcg / input.desired_dose_mcg).floor();
    if !doses.is_finite() || doses >= MAX_DOSE_COUNT {
        return Err(InvalidInput::new(
            InputField::DesiredDoseMcg,
            InvalidReason::OutOfRange {
                value: input.desired_dose_mcg,
            },
        ));
    }
    let total_doses_in_vial = doses as u64;
    let vial_duration_days = total_doses_in_vial / u64::from(input.doses_per_day);

    Ok(ReconstitutionReport {
        concentration_mcg_per_ml,
        dose_volume_ml,
        syringe_units,
        total_doses_in_vial,
        vial_duration_days,
        total_mcg_per_day,
    })
}

/// [`compute_report`] with the U-100 defaults.
pub fn compute_default(input: &ReconstitutionInput) -> Result<ReconstitutionReport, InvalidInput> {
    compute_report(input, &CalculatorConfig::default())
}

pub fn validate_input(input: &ReconstitutionInput) -> Result<(), InvalidInput> {
    check_positive(InputField::VialAmountMg, input.vial_amount_mg)?;
    check_positive(InputField::WaterVolumeMl, input.water_volume_ml)?;
    check_positive(InputField::DesiredDoseMcg, input.desired_dose_mcg)?;
    if input.doses_per_day == 0 {
        return Err(InvalidInput::new(
            InputField::DosesPerDay,
            InvalidReason::NotPositive { value: 0.0 },
        ));
    }
    Ok(())
}

fn in_range(field: InputField, value: f64, derived: f64) -> Result<f64, InvalidInput> {
    if derived.is_finite() && derived > 0.0 {
        Ok(derived)
    } else {
        Err(InvalidInput::new(field, InvalidReason::OutOfRange { value }))
    }
}

fn check_positive(field: InputField, value: f64) -> Result<(), InvalidInput> {
    if !value.is_finite() {
        return Err(InvalidInput::new(field, InvalidReason::NotFinite));
    }
    if value <= 0.0 {
        return Err(InvalidInput::new(field, InvalidReason::NotPositive { value }));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SyringeScale;

    fn input(vial: f64, water: f64, dose: f64, per_day: u32) -> ReconstitutionInput {
        ReconstitutionInput::new("BPC-157", vial, water, dose, per_day)
    }

    #[test]
    fn test_worked_example() {
        let report = compute_default(&input(5.0, 2.0, 250.0, 2)).unwrap();

        assert_eq!(report.concentration_mcg_per_ml, 2500.0);
        assert_eq!(report.dose_volume_ml, 0.1);
        assert!((report.syringe_units - 10.0).abs() < 1e-9);
        assert_eq!(report.total_doses_in_vial, 20);
        assert_eq!(report.total_mcg_per_day, 500.0);
        assert_eq!(report.vial_duration_days, 10);
    }

    #[test]
    fn test_u40_syringe_scale() {
        let config = CalculatorConfig::with_syringe(SyringeScale::U40);
        let report = compute_report(&input(5.0, 2.0, 250.0, 2), &config).unwrap();
        assert!((report.syringe_units - 4.0).abs() < 1e-9);
        // 其他欄位不受刻度影響
        assert_eq!(report.total_doses_in_vial, 20);
    }

    #[test]
    fn test_nan_is_rejected() {
        let err = compute_default(&input(f64::NAN, 2.0, 250.0, 1)).unwrap_err();
        assert_eq!(err.field, InputField::VialAmountMg);
        assert_eq!(err.reason, InvalidReason::NotFinite);
    }

    #[test]
    fn test_overflowing_vial_amount_is_rejected() {
        let err = compute_default(&input(1e306, 1.0, 1.0, 1)).unwrap_err();
        assert_eq!(err.field, InputField::VialAmountMg);
        assert_eq!(err.reason, InvalidReason::OutOfRange { value: 1e306 });
    }

    #[test]
    fn test_underflowing_dose_volume_is_rejected() {
        // concentration 1e303 mcg/ml; 1e-30 mcg 換算體積下溢為 0
        let err = compute_default(&input(1e300, 1.0, 1e-30, 1)).unwrap_err();
        assert_eq!(err.field, InputField::DesiredDoseMcg);
        assert!(matches!(err.reason, InvalidReason::OutOfRange { .. }));
    }

    #[test]
    fn test_dose_count_beyond_u64_is_rejected() {
        // 1e10 mg = 1e13 mcg; 1e-7 mcg per dose -> 1e20 doses
        let err = compute_default(&input(1e10, 1.0, 1e-7, 1)).unwrap_err();
        assert_eq!(err.field, InputField::DesiredDoseMcg);
        assert!(matches!(err.reason, InvalidReason::OutOfRange { .. }));

        // 剛好在範圍內的值照常計算
        let report = compute_default(&input(1e10, 1.0, 1.0, 1)).unwrap();
        assert_eq!(report.total_doses_in_vial, 10_000_000_000_000);
    }

    #[test]
    fn test_validation_order() {
        let err = compute_default(&input(0.0, -1.0, 0.0, 0)).unwrap_err();
        assert_eq!(err.field, InputField::VialAmountMg);

        let err = compute_default(&input(5.0, -1.0, 0.0, 0)).unwrap_err();
        assert_eq!(err.field, InputField::WaterVolumeMl);
    }
}

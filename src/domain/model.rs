use crate::utils::error::{InputField, InvalidInput, InvalidReason};
use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 一次計算的輸入。由 [`RawReconstitutionInput::parse`] 或直接建構。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconstitutionInput {
    pub peptide_name: String,
    pub vial_amount_mg: f64,
    pub water_volume_ml: f64,
    pub desired_dose_mcg: f64,
    pub doses_per_day: u32,
}

impl ReconstitutionInput {
    pub fn new(
        peptide_name: impl Into<String>,
        vial_amount_mg: f64,
        water_volume_ml: f64,
        desired_dose_mcg: f64,
        doses_per_day: u32,
    ) -> Self {
        Self {
            peptide_name: peptide_name.into(),
            vial_amount_mg,
            water_volume_ml,
            desired_dose_mcg,
            doses_per_day,
        }
    }
}

/// 未經型別轉換的輸入，欄位皆為字串（CLI 參數、表單、CSV 列）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawReconstitutionInput {
    #[serde(default)]
    pub peptide_name: String,
    #[serde(default)]
    pub vial_amount_mg: String,
    #[serde(default)]
    pub water_volume_ml: String,
    #[serde(default)]
    pub desired_dose_mcg: String,
    #[serde(default)]
    pub doses_per_day: String,
}

impl RawReconstitutionInput {
    /// 依欄位順序解析，回傳第一個不合法的欄位
    pub fn parse(&self) -> Result<ReconstitutionInput, InvalidInput> {
        let vial_amount_mg = parse_positive(InputField::VialAmountMg, &self.vial_amount_mg)?;
        let water_volume_ml = parse_positive(InputField::WaterVolumeMl, &self.water_volume_ml)?;
        let desired_dose_mcg = parse_positive(InputField::DesiredDoseMcg, &self.desired_dose_mcg)?;
        let doses_per_day = parse_whole(InputField::DosesPerDay, &self.doses_per_day)?;

        Ok(ReconstitutionInput {
            peptide_name: self.peptide_name.trim().to_string(),
            vial_amount_mg,
            water_volume_ml,
            desired_dose_mcg,
            doses_per_day,
        })
    }
}

fn parse_number(field: InputField, raw: &str) -> Result<f64, InvalidInput> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(InvalidInput::new(field, InvalidReason::Missing));
    }
    let value: f64 = trimmed.parse().map_err(|_| {
        InvalidInput::new(
            field,
            InvalidReason::NotANumber {
                raw: trimmed.to_string(),
            },
        )
    })?;
    if !value.is_finite() {
        return Err(InvalidInput::new(field, InvalidReason::NotFinite));
    }
    Ok(value)
}

fn parse_positive(field: InputField, raw: &str) -> Result<f64, InvalidInput> {
    let value = parse_number(field, raw)?;
    if value <= 0.0 {
        return Err(InvalidInput::new(field, InvalidReason::NotPositive { value }));
    }
    Ok(value)
}

fn parse_whole(field: InputField, raw: &str) -> Result<u32, InvalidInput> {
    let value = parse_number(field, raw)?;
    if value.fract() != 0.0 {
        return Err(InvalidInput::new(field, InvalidReason::NotInteger { value }));
    }
    if value <= 0.0 {
        return Err(InvalidInput::new(field, InvalidReason::NotPositive { value }));
    }
    if value > f64::from(u32::MAX) {
        return Err(InvalidInput::new(field, InvalidReason::OutOfRange { value }));
    }
    Ok(value as u32)
}

/// 計算結果。六個欄位原樣回傳，不做顯示用的四捨五入。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReconstitutionReport {
    pub concentration_mcg_per_ml: f64,
    pub dose_volume_ml: f64,
    pub syringe_units: f64,
    pub total_doses_in_vial: u64,
    pub vial_duration_days: u64,
    pub total_mcg_per_day: f64,
}

/// Insulin syringe scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyringeScale {
    /// 100 units = 1 ml
    #[default]
    U100,
    /// 40 units = 1 ml
    U40,
}

impl SyringeScale {
    pub fn units_per_ml(&self) -> f64 {
        match self {
            SyringeScale::U100 => 100.0,
            SyringeScale::U40 => 40.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyringeScale::U100 => "u100",
            SyringeScale::U40 => "u40",
        }
    }
}

impl fmt::Display for SyringeScale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyringeScale::U100 => f.write_str("U-100"),
            SyringeScale::U40 => f.write_str("U-40"),
        }
    }
}

impl FromStr for SyringeScale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "").as_str() {
            "u100" => Ok(SyringeScale::U100),
            "u40" => Ok(SyringeScale::U40),
            other => Err(format!(
                "Unknown syringe scale '{}'. Valid scales: u100, u40",
                other
            )),
        }
    }
}

/// 每次計算都明確傳入的設定，沒有全域狀態
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculatorConfig {
    #[serde(default)]
    pub syringe: SyringeScale,
}

impl CalculatorConfig {
    pub fn with_syringe(syringe: SyringeScale) -> Self {
        Self { syringe }
    }
}

/// 胜肽資料（由 catalog 提供）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeptideProfile {
    pub name: String,
    pub common_name: Option<String>,
    pub typical_dose_min_mcg: Option<f64>,
    pub typical_dose_max_mcg: Option<f64>,
    pub frequency_per_day: Option<u32>,
    /// Shelf life after reconstitution.
    pub shelf_life_days: Option<u32>,
    pub notes: Option<String>,
}

impl PeptideProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            common_name: None,
            typical_dose_min_mcg: None,
            typical_dose_max_mcg: None,
            frequency_per_day: None,
            shelf_life_days: None,
            notes: None,
        }
    }

    pub fn typical_range(&self) -> Option<(f64, f64)> {
        match (self.typical_dose_min_mcg, self.typical_dose_max_mcg) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        let needle = name.trim();
        self.name.trim().eq_ignore_ascii_case(needle)
            || self
                .common_name
                .as_deref()
                .is_some_and(|common| common.trim().eq_ignore_ascii_case(needle))
    }

    /// 回溶日期加上回溶後保存天數
    pub fn expiration_date(&self, reconstituted_on: NaiveDate) -> Option<NaiveDate> {
        let days = self.shelf_life_days?;
        reconstituted_on.checked_add_days(Days::new(u64::from(days)))
    }
}

/// 與報告並列的提醒，不影響計算結果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Advisory {
    EmptyVial,
    LastsUnderOneDay {
        total_doses: u64,
        doses_per_day: u32,
    },
    BelowTypicalRange {
        dose_mcg: f64,
        min_mcg: f64,
    },
    AboveTypicalRange {
        dose_mcg: f64,
        max_mcg: f64,
    },
    UnknownPeptide {
        name: String,
    },
    OutlastsShelfLife {
        vial_duration_days: u64,
        shelf_life_days: u32,
    },
    FrequencyDiffers {
        doses_per_day: u32,
        typical_per_day: u32,
    },
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Advisory::EmptyVial => write!(
                f,
                "The desired dose is larger than the vial contents; the vial yields no full dose"
            ),
            Advisory::LastsUnderOneDay {
                total_doses,
                doses_per_day,
            } => write!(
                f,
                "Only {} dose(s) in the vial but {} planned per day; it will not last a full day",
                total_doses, doses_per_day
            ),
            Advisory::BelowTypicalRange { dose_mcg, min_mcg } => write!(
                f,
                "Dose of {} mcg is below the typical minimum of {} mcg",
                dose_mcg, min_mcg
            ),
            Advisory::AboveTypicalRange { dose_mcg, max_mcg } => write!(
                f,
                "Dose of {} mcg is above the typical maximum of {} mcg",
                dose_mcg, max_mcg
            ),
            Advisory::UnknownPeptide { name } => {
                write!(f, "'{}' is not in the peptide catalog; no range check done", name)
            }
            Advisory::OutlastsShelfLife {
                vial_duration_days,
                shelf_life_days,
            } => write!(
                f,
                "Vial would last {} days but is only good for {} days after reconstitution",
                vial_duration_days, shelf_life_days
            ),
            Advisory::FrequencyDiffers {
                doses_per_day,
                typical_per_day,
            } => write!(
                f,
                "Planned {}x per day; typical frequency is {}x per day",
                doses_per_day, typical_per_day
            ),
        }
    }
}

/// 批次計算的一列結果；驗證失敗時 `report` 為 None
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchRow {
    /// 1-based data row number (header excluded)
    pub row: usize,
    pub input: RawReconstitutionInput,
    pub report: Option<ReconstitutionReport>,
    pub advisories: Vec<Advisory>,
    pub error: Option<InvalidInput>,
}

impl BatchRow {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub rows: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub output_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(vial: &str, water: &str, dose: &str, per_day: &str) -> RawReconstitutionInput {
        RawReconstitutionInput {
            peptide_name: " BPC-157 ".to_string(),
            vial_amount_mg: vial.to_string(),
            water_volume_ml: water.to_string(),
            desired_dose_mcg: dose.to_string(),
            doses_per_day: per_day.to_string(),
        }
    }

    #[test]
    fn test_parse_valid_raw_input() {
        let input = raw("5", " 2 ", "250", "2").parse().unwrap();
        assert_eq!(input, ReconstitutionInput::new("BPC-157", 5.0, 2.0, 250.0, 2));
    }

    #[test]
    fn test_parse_accepts_whole_float_frequency() {
        let input = raw("5", "2", "250", "2.0").parse().unwrap();
        assert_eq!(input.doses_per_day, 2);
    }

    #[test]
    fn test_parse_rejects_fractional_frequency() {
        let err = raw("5", "2", "250", "1.5").parse().unwrap_err();
        assert_eq!(err.field, InputField::DosesPerDay);
        assert_eq!(err.reason, InvalidReason::NotInteger { value: 1.5 });
    }

    #[test]
    fn test_parse_reports_first_bad_field() {
        let err = raw("abc", "0", "250", "1").parse().unwrap_err();
        assert_eq!(err.field, InputField::VialAmountMg);
        assert!(matches!(err.reason, InvalidReason::NotANumber { .. }));

        let err = raw("5", "", "250", "1").parse().unwrap_err();
        assert_eq!(err.field, InputField::WaterVolumeMl);
        assert_eq!(err.reason, InvalidReason::Missing);

        let err = raw("5", "2", "inf", "1").parse().unwrap_err();
        assert_eq!(err.field, InputField::DesiredDoseMcg);
        assert_eq!(err.reason, InvalidReason::NotFinite);

        let err = raw("5", "2", "250", "0").parse().unwrap_err();
        assert_eq!(err.field, InputField::DosesPerDay);
        assert_eq!(err.reason, InvalidReason::NotPositive { value: 0.0 });

        let err = raw("5", "2", "250", "1e12").parse().unwrap_err();
        assert!(matches!(err.reason, InvalidReason::OutOfRange { .. }));
    }

    #[test]
    fn test_syringe_scale_from_str() {
        assert_eq!("u100".parse::<SyringeScale>(), Ok(SyringeScale::U100));
        assert_eq!("U-40".parse::<SyringeScale>(), Ok(SyringeScale::U40));
        assert!("u50".parse::<SyringeScale>().is_err());
        assert_eq!(CalculatorConfig::default().syringe.units_per_ml(), 100.0);
    }

    #[test]
    fn test_profile_matching_and_expiration() {
        let mut profile = PeptideProfile::new("BPC-157");
        profile.common_name = Some("Body Protection Compound".to_string());
        profile.shelf_life_days = Some(28);

        assert!(profile.matches("bpc-157"));
        assert!(profile.matches("  body protection compound "));
        assert!(!profile.matches("TB-500"));

        let reconstituted = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        assert_eq!(
            profile.expiration_date(reconstituted),
            NaiveDate::from_ymd_opt(2026, 11, 15)
        );

        profile.shelf_life_days = None;
        assert_eq!(profile.expiration_date(reconstituted), None);
    }
}

use crate::domain::model::{Advisory, CalculatorConfig, ReconstitutionInput, ReconstitutionReport};

const RULE_WIDTH: usize = 60;

/// Render a report for the terminal.
///
/// Concentration and dose volume are shown with one decimal, syringe units
/// rounded to the nearest whole unit. The report itself is left untouched.
pub fn format_report(
    input: &ReconstitutionInput,
    report: &ReconstitutionReport,
    config: &CalculatorConfig,
) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let title = if input.peptide_name.is_empty() {
        "(unnamed)"
    } else {
        input.peptide_name.as_str()
    };

    format!(
        "{rule}\n\
         PEPTIDE RECONSTITUTION REPORT: {title}\n\
         {rule}\n\
         \n\
         VIAL PREPARATION:\n\
         \x20 • Peptide amount: {vial} mg\n\
         \x20 • Bacteriostatic water: {water} ml\n\
         \x20 • Concentration: {concentration:.1} mcg/ml\n\
         \n\
         DOSING:\n\
         \x20 • Target dose: {dose} mcg, {per_day}x per day ({per_day_mcg} mcg/day)\n\
         \x20 • Inject volume: {volume:.1} ml\n\
         \x20 • Syringe: {units} units ({scale} syringe)\n\
         \n\
         VIAL LIFESPAN:\n\
         \x20 • Total doses: {doses}\n\
         \x20 • Lasts: {days} days\n\
         {rule}",
        rule = rule,
        title = title,
        vial = input.vial_amount_mg,
        water = input.water_volume_ml,
        concentration = report.concentration_mcg_per_ml,
        dose = input.desired_dose_mcg,
        per_day = input.doses_per_day,
        per_day_mcg = report.total_mcg_per_day,
        volume = report.dose_volume_ml,
        units = display_units(report.syringe_units),
        scale = config.syringe,
        doses = report.total_doses_in_vial,
        days = report.vial_duration_days,
    )
}

pub fn format_advisories(advisories: &[Advisory]) -> String {
    advisories
        .iter()
        .map(|a| format!("  ⚠ {}", a))
        .collect::<Vec<_>>()
        .join("\n")
}

fn display_units(units: f64) -> String {
    format!("{:.0}", units.round())
}

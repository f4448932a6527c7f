use crate::domain::model::PeptideProfile;
use crate::domain::ports::PeptideCatalog;
use crate::utils::error::{PepcalcError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_positive_f64, Validate};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// 由 TOML 檔載入的胜肽清單：
///
/// ```toml
/// [[peptides]]
/// name = "BPC-157"
/// typical_dose_min_mcg = 200
/// typical_dose_max_mcg = 500
/// shelf_life_days = 28
/// ```
#[derive(Debug, Clone, Default)]
pub struct TomlCatalog {
    peptides: Vec<PeptideProfile>,
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    peptides: Vec<PeptideProfile>,
}

impl TomlCatalog {
    pub fn new(peptides: Vec<PeptideProfile>) -> Result<Self> {
        let catalog = Self { peptides };
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::debug!(
            "Loaded {} peptide profiles from {}",
            catalog.peptides.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| PepcalcError::CatalogError {
                message: format!("TOML parsing error: {}", e),
            })?;
        Self::new(file.peptides)
    }

    pub fn len(&self) -> usize {
        self.peptides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peptides.is_empty()
    }
}

impl Validate for TomlCatalog {
    fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();

        for (i, profile) in self.peptides.iter().enumerate() {
            let prefix = format!("peptides[{}]", i);
            validate_non_empty_string(&format!("{}.name", prefix), &profile.name)?;

            if let Some(min) = profile.typical_dose_min_mcg {
                validate_positive_f64(&format!("{}.typical_dose_min_mcg", prefix), min)?;
            }
            if let Some(max) = profile.typical_dose_max_mcg {
                validate_positive_f64(&format!("{}.typical_dose_max_mcg", prefix), max)?;
            }
            if let Some((min, max)) = profile.typical_range() {
                if min > max {
                    return Err(PepcalcError::CatalogError {
                        message: format!(
                            "{}: typical dose range {}-{} mcg has min above max",
                            profile.name, min, max
                        ),
                    });
                }
            }

            if !seen.insert(profile.name.trim().to_ascii_lowercase()) {
                return Err(PepcalcError::CatalogError {
                    message: format!("Duplicate peptide name: {}", profile.name),
                });
            }
        }

        Ok(())
    }
}

impl PeptideCatalog for TomlCatalog {
    fn find(&self, name: &str) -> Option<&PeptideProfile> {
        // 先比對正式名稱，再比對 common name
        let needle = name.trim();
        self.peptides
            .iter()
            .find(|p| p.name.trim().eq_ignore_ascii_case(needle))
            .or_else(|| self.peptides.iter().find(|p| p.matches(needle)))
    }

    fn profiles(&self) -> &[PeptideProfile] {
        &self.peptides
    }
}

use crate::core::advisory::{assess, assess_with_catalog};
use crate::core::calculator::compute_report;
use crate::domain::model::{BatchRow, BatchSummary, CalculatorConfig, RawReconstitutionInput};
use crate::domain::ports::{PeptideCatalog, Pipeline, Storage};
use crate::utils::error::{PepcalcError, Result};
use serde::Serialize;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for BatchFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(BatchFormat::Csv),
            "json" => Ok(BatchFormat::Json),
            other => Err(format!("Unsupported batch format '{}'. Valid formats: csv, json", other)),
        }
    }
}

/// CSV 檔讀入、逐列計算、寫出 CSV 或 JSON
pub struct CsvBatchPipeline<'a, S: Storage> {
    storage: S,
    input_path: String,
    output_path: String,
    format: BatchFormat,
    config: CalculatorConfig,
    catalog: Option<&'a dyn PeptideCatalog>,
}

impl<'a, S: Storage> CsvBatchPipeline<'a, S> {
    pub fn new(
        storage: S,
        input_path: impl Into<String>,
        output_path: impl Into<String>,
        format: BatchFormat,
        config: CalculatorConfig,
    ) -> Self {
        Self {
            storage,
            input_path: input_path.into(),
            output_path: output_path.into(),
            format,
            config,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: &'a dyn PeptideCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }
}

// 攤平後的輸出列，失敗列的計算欄位留空
#[derive(Serialize)]
struct CsvOutputRecord<'r> {
    row: usize,
    peptide_name: &'r str,
    vial_amount_mg: &'r str,
    water_volume_ml: &'r str,
    desired_dose_mcg: &'r str,
    doses_per_day: &'r str,
    concentration_mcg_per_ml: Option<f64>,
    dose_volume_ml: Option<f64>,
    syringe_units: Option<f64>,
    total_doses_in_vial: Option<u64>,
    vial_duration_days: Option<u64>,
    total_mcg_per_day: Option<f64>,
    advisories: String,
    error: String,
}

impl<'r> From<&'r BatchRow> for CsvOutputRecord<'r> {
    fn from(row: &'r BatchRow) -> Self {
        let report = row.report.as_ref();
        Self {
            row: row.row,
            peptide_name: &row.input.peptide_name,
            vial_amount_mg: &row.input.vial_amount_mg,
            water_volume_ml: &row.input.water_volume_ml,
            desired_dose_mcg: &row.input.desired_dose_mcg,
            doses_per_day: &row.input.doses_per_day,
            concentration_mcg_per_ml: report.map(|r| r.concentration_mcg_per_ml),
            dose_volume_ml: report.map(|r| r.dose_volume_ml),
            syringe_units: report.map(|r| r.syringe_units),
            total_doses_in_vial: report.map(|r| r.total_doses_in_vial),
            vial_duration_days: report.map(|r| r.vial_duration_days),
            total_mcg_per_day: report.map(|r| r.total_mcg_per_day),
            advisories: row
                .advisories
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join("; "),
            error: row.error.as_ref().map(|e| e.to_string()).unwrap_or_default(),
        }
    }
}

impl<S: Storage> Pipeline for CsvBatchPipeline<'_, S> {
    fn extract(&self) -> Result<Vec<RawReconstitutionInput>> {
        tracing::debug!("Reading batch input from: {}", self.input_path);
        let data = self.storage.read_file(&self.input_path)?;

        // 欄位不足的列照樣讀入，缺的欄位在 transform 時以 Missing 拒絕
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(data.as_slice());

        let mut records = Vec::new();
        for result in reader.deserialize::<RawReconstitutionInput>() {
            records.push(result?);
        }
        Ok(records)
    }

    fn transform(&self, data: Vec<RawReconstitutionInput>) -> Result<Vec<BatchRow>> {
        let rows = data
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let row = i + 1;
                let outcome = raw
                    .parse()
                    .and_then(|input| compute_report(&input, &self.config).map(|r| (input, r)));

                match outcome {
                    Ok((input, report)) => {
                        let advisories = match self.catalog {
                            Some(catalog) => assess_with_catalog(&input, &report, catalog),
                            None => assess(&input, &report, None),
                        };
                        BatchRow {
                            row,
                            input: raw,
                            report: Some(report),
                            advisories,
                            error: None,
                        }
                    }
                    Err(e) => {
                        tracing::warn!("⚠️ Row {} rejected: {}", row, e);
                        BatchRow {
                            row,
                            input: raw,
                            report: None,
                            advisories: Vec::new(),
                            error: Some(e),
                        }
                    }
                }
            })
            .collect();
        Ok(rows)
    }

    fn load(&self, rows: &[BatchRow]) -> Result<String> {
        let bytes = match self.format {
            BatchFormat::Csv => {
                let mut writer = csv::Writer::from_writer(Vec::new());
                for row in rows {
                    writer.serialize(CsvOutputRecord::from(row))?;
                }
                writer.into_inner().map_err(|e| {
                    PepcalcError::IoError(std::io::Error::other(e.to_string()))
                })?
            }
            BatchFormat::Json => serde_json::to_vec_pretty(rows)?,
        };

        self.storage.write_file(&self.output_path, &bytes)?;
        Ok(self.output_path.clone())
    }
}

pub struct BatchEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> BatchEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn run(&self) -> Result<BatchSummary> {
        tracing::info!("📥 Extracting batch rows...");
        let raw_rows = self.pipeline.extract()?;
        tracing::info!("Extracted {} rows", raw_rows.len());

        tracing::info!("🧮 Calculating...");
        let rows = self.pipeline.transform(raw_rows)?;
        let succeeded = rows.iter().filter(|r| r.is_ok()).count();
        let failed = rows.len() - succeeded;
        tracing::info!("Calculated {} rows ({} rejected)", rows.len(), failed);

        tracing::info!("💾 Writing results...");
        let output_path = self.pipeline.load(&rows)?;
        tracing::info!("Output saved to: {}", output_path);

        Ok(BatchSummary {
            rows: rows.len(),
            succeeded,
            failed,
            output_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::InputField;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn with_file(path: &str, data: &str) -> Self {
            let storage = Self::default();
            storage
                .files
                .lock()
                .unwrap()
                .insert(path.to_string(), data.as_bytes().to_vec());
            storage
        }

        fn get_file(&self, path: &str) -> Option<String> {
            let files = self.files.lock().unwrap();
            files
                .get(path)
                .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        }
    }

    impl Storage for MockStorage {
        fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().unwrap();
            files.get(path).cloned().ok_or_else(|| {
                PepcalcError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().unwrap();
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    const INPUT: &str = "\
peptide_name,vial_amount_mg,water_volume_ml,desired_dose_mcg,doses_per_day
BPC-157,5,2,250,2
TB-500,5,2,250,1.5
GHK-Cu,1,1,2000,1
";

    #[test]
    fn test_transform_keeps_going_after_bad_row() {
        let storage = MockStorage::with_file("in.csv", INPUT);
        let pipeline = CsvBatchPipeline::new(
            storage,
            "in.csv",
            "out.csv",
            BatchFormat::Csv,
            CalculatorConfig::default(),
        );

        let raw = pipeline.extract().unwrap();
        assert_eq!(raw.len(), 3);

        let rows = pipeline.transform(raw).unwrap();
        assert!(rows[0].is_ok());
        assert_eq!(rows[0].report.unwrap().total_doses_in_vial, 20);

        let err = rows[1].error.as_ref().unwrap();
        assert_eq!(err.field, InputField::DosesPerDay);
        assert!(rows[1].report.is_none());

        // 劑量大於整瓶：不是錯誤，只是提醒
        assert!(rows[2].is_ok());
        assert_eq!(rows[2].report.unwrap().total_doses_in_vial, 0);
        assert!(!rows[2].advisories.is_empty());
    }

    #[test]
    fn test_short_row_is_rejected_not_fatal() {
        let input = "\
peptide_name,vial_amount_mg,water_volume_ml,desired_dose_mcg,doses_per_day
BPC-157,5,2,250,2
TB-500,5,2
GHK-Cu,1,1,2000,1
";
        let storage = MockStorage::with_file("in.csv", input);
        let pipeline = CsvBatchPipeline::new(
            storage.clone(),
            "in.csv",
            "out.csv",
            BatchFormat::Csv,
            CalculatorConfig::default(),
        );

        let summary = BatchEngine::new(pipeline).run().unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);

        let output = storage.get_file("out.csv").unwrap();
        assert!(output.contains("Invalid input for desired_dose_mcg: value is required"));
        assert!(output.contains("GHK-Cu,1,1,2000,1,"));
    }

    #[test]
    fn test_engine_writes_csv() {
        let storage = MockStorage::with_file("in.csv", INPUT);
        let pipeline = CsvBatchPipeline::new(
            storage.clone(),
            "in.csv",
            "out/results.csv",
            BatchFormat::Csv,
            CalculatorConfig::default(),
        );

        let summary = BatchEngine::new(pipeline).run().unwrap();
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.output_path, "out/results.csv");

        let output = storage.get_file("out/results.csv").unwrap();
        let mut lines = output.lines();
        assert!(lines
            .next()
            .unwrap()
            .starts_with("row,peptide_name,vial_amount_mg"));
        assert!(output.contains("BPC-157,5,2,250,2,2500.0,0.1,"));
        assert!(output.contains("Invalid input for doses_per_day"));
    }

    #[test]
    fn test_engine_writes_json() {
        let storage = MockStorage::with_file("in.csv", INPUT);
        let pipeline = CsvBatchPipeline::new(
            storage.clone(),
            "in.csv",
            "out.json",
            BatchFormat::Json,
            CalculatorConfig::default(),
        );

        BatchEngine::new(pipeline).run().unwrap();

        let output = storage.get_file("out.json").unwrap();
        let json: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(json[0]["report"]["vial_duration_days"], 10);
        assert_eq!(json[1]["error"]["field"], "doses_per_day");
        assert_eq!(json[2]["advisories"][0]["kind"], "empty_vial");
    }

    #[test]
    fn test_missing_input_file() {
        let pipeline = CsvBatchPipeline::new(
            MockStorage::default(),
            "missing.csv",
            "out.csv",
            BatchFormat::Csv,
            CalculatorConfig::default(),
        );
        let err = BatchEngine::new(pipeline).run().unwrap_err();
        assert!(matches!(err, PepcalcError::IoError(_)));
    }

    #[test]
    fn test_batch_format_from_str() {
        assert_eq!("CSV".parse::<BatchFormat>(), Ok(BatchFormat::Csv));
        assert_eq!("json".parse::<BatchFormat>(), Ok(BatchFormat::Json));
        assert!("xlsx".parse::<BatchFormat>().is_err());
    }
}

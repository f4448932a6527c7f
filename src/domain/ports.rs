use crate::domain::model::{BatchRow, PeptideProfile, RawReconstitutionInput};
use crate::utils::error::Result;

/// 胜肽資料來源（資料庫、設定檔...）
pub trait PeptideCatalog: Send + Sync {
    /// 名稱比對不分大小寫，也會比對 common name
    fn find(&self, name: &str) -> Option<&PeptideProfile>;
    fn profiles(&self) -> &[PeptideProfile];
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
}

pub trait Pipeline {
    fn extract(&self) -> Result<Vec<RawReconstitutionInput>>;
    fn transform(&self, data: Vec<RawReconstitutionInput>) -> Result<Vec<BatchRow>>;
    fn load(&self, rows: &[BatchRow]) -> Result<String>;
}

pub mod csv_dir;
pub mod memory;

pub use csv_dir::CsvDirectoryStore;
pub use memory::MemoryStore;

use crate::error::Result;
use crate::models::{ReportMatrix, SheetKey};

/// 报表存储
///
/// 工作表以 [`SheetKey::sheet_name`] 标识。
pub trait ReportStore {
    fn exists(&self) -> bool;

    /// 从工作表名称还原的键; 无法解析年份的工作表被忽略
    fn list_sheet_keys(&self) -> Result<Vec<SheetKey>>;

    /// 是否已有同名工作表
    fn contains_sheet(&self, key: &SheetKey) -> Result<bool> {
        let name = key.sheet_name();
        Ok(self.list_sheet_keys()?.iter().any(|k| k.sheet_name() == name))
    }

    fn load_sheet(&self, key: &SheetKey) -> Result<ReportMatrix>;

    fn delete_sheet(&mut self, key: &SheetKey) -> Result<()>;

    /// 写入或替换工作表
    fn write_sheet(&mut self, matrix: &ReportMatrix) -> Result<()>;

    /// `write_sheet` 是否整体替换同名工作表; 否则替换前需先 `delete_sheet`
    fn replaces_on_write(&self) -> bool {
        false
    }

    /// 创建存储并写入全部工作表 (仅用于全量构建), 同时记录续跑年份
    fn create_and_write(&mut self, matrices: &[ReportMatrix]) -> Result<()>;

    /// 增量续跑的起始年份
    fn resume_year(&self) -> Result<Option<i32>> {
        Ok(self.list_sheet_keys()?.iter().map(|k| k.year).max())
    }

    fn record_resume_year(&mut self, _year: i32) -> Result<()> {
        Ok(())
    }
}

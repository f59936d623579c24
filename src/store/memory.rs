use std::collections::BTreeMap;

use crate::error::{ReportError, Result};
use crate::models::{ReportMatrix, SheetKey};
use crate::store::ReportStore;

/// 内存报表存储
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sheets: Option<BTreeMap<String, ReportMatrix>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已存在的存储, 预置若干工作表
    pub fn with_sheets(matrices: impl IntoIterator<Item = ReportMatrix>) -> Self {
        let sheets = matrices.into_iter().map(|m| (m.sheet_name(), m)).collect();
        Self {
            sheets: Some(sheets),
        }
    }

    pub fn sheet_names(&self) -> Vec<String> {
        self.sheets
            .as_ref()
            .map(|s| s.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn sheets_mut(&mut self) -> &mut BTreeMap<String, ReportMatrix> {
        self.sheets.get_or_insert_with(BTreeMap::new)
    }
}

impl ReportStore for MemoryStore {
    fn exists(&self) -> bool {
        self.sheets.is_some()
    }

    fn list_sheet_keys(&self) -> Result<Vec<SheetKey>> {
        Ok(self
            .sheet_names()
            .iter()
            .filter_map(|name| SheetKey::from_sheet_name(name))
            .collect())
    }

    fn contains_sheet(&self, key: &SheetKey) -> Result<bool> {
        Ok(self
            .sheets
            .as_ref()
            .is_some_and(|s| s.contains_key(&key.sheet_name())))
    }

    fn load_sheet(&self, key: &SheetKey) -> Result<ReportMatrix> {
        let name = key.sheet_name();
        self.sheets
            .as_ref()
            .and_then(|s| s.get(&name))
            .cloned()
            .ok_or(ReportError::SheetNotFound(name))
    }

    fn delete_sheet(&mut self, key: &SheetKey) -> Result<()> {
        let name = key.sheet_name();
        self.sheets_mut()
            .remove(&name)
            .map(|_| ())
            .ok_or(ReportError::SheetNotFound(name))
    }

    fn write_sheet(&mut self, matrix: &ReportMatrix) -> Result<()> {
        self.sheets_mut().insert(matrix.sheet_name(), matrix.clone());
        Ok(())
    }

    fn replaces_on_write(&self) -> bool {
        true
    }

    fn create_and_write(&mut self, matrices: &[ReportMatrix]) -> Result<()> {
        let sheets = self.sheets_mut();
        sheets.clear();
        for matrix in matrices {
            sheets.insert(matrix.sheet_name(), matrix.clone());
        }
        Ok(())
    }
}

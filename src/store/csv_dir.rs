use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{ReportError, Result};
use crate::models::{ColumnLabel, ReportMatrix, RowLabel, SheetKey};
use crate::store::ReportStore;

const MANIFEST_FILE: &str = "manifest.json";
const SHEET_EXTENSION: &str = "csv";
const INDEX_HEADER: &str = "date";

/// 存储元数据: 最后处理的年份
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Manifest {
    last_year: i32,
    updated_at: DateTime<Utc>,
}

/// CSV 目录存储: 每个工作表一个 `<sheet name>.csv` 文件
///
/// 表头第一格为 `date`, 其后为列标签; 每行以行标签开头, 空单元格写为空字符串。
#[derive(Debug, Clone)]
pub struct CsvDirectoryStore {
    root: PathBuf,
}

impl CsvDirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 全量构建时的暂存目录 `<root>.partial`
    fn staging_dir(&self) -> PathBuf {
        let mut name = self
            .root
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| OsString::from("report"));
        name.push(".partial");
        self.root.with_file_name(name)
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    fn read_manifest(&self) -> Result<Option<Manifest>> {
        let path = self.manifest_path();
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ReportError::store(path, e)),
        }
    }
}

fn sheet_path(dir: &Path, sheet_name: &str) -> PathBuf {
    let stem = sheet_name.replace(['/', '\\'], "_");
    dir.join(format!("{stem}.{SHEET_EXTENSION}"))
}

fn write_manifest(dir: &Path, last_year: i32) -> Result<()> {
    let manifest = Manifest {
        last_year,
        updated_at: Utc::now(),
    };
    let path = dir.join(MANIFEST_FILE);
    let text = serde_json::to_string_pretty(&manifest)?;
    fs::write(&path, text).map_err(|e| ReportError::store(path, e))
}

/// 先写临时文件再重命名, 保证工作表整体替换
fn write_matrix(path: &Path, matrix: &ReportMatrix) -> Result<()> {
    let tmp = path.with_extension(format!("{SHEET_EXTENSION}.tmp"));
    {
        let mut writer = csv::Writer::from_path(&tmp)?;

        let mut header = vec![INDEX_HEADER.to_string()];
        header.extend(matrix.columns().map(|c| c.to_string()));
        writer.write_record(&header)?;

        let column_count = matrix.column_count();
        for (r, row) in matrix.rows().enumerate() {
            let mut record = Vec::with_capacity(column_count + 1);
            record.push(row.to_string());
            record.extend((0..column_count).map(|c| {
                matrix.get_at(r, c).map(|v| v.to_string()).unwrap_or_default()
            }));
            writer.write_record(&record)?;
        }
        writer.flush().map_err(|e| ReportError::store(&tmp, e))?;
    }
    fs::rename(&tmp, path).map_err(|e| ReportError::store(path, e))
}

fn read_matrix(path: &Path, key: &SheetKey) -> Result<ReportMatrix> {
    let sheet = key.sheet_name();
    let malformed = |reason: String| ReportError::MalformedSheet {
        sheet: sheet.clone(),
        reason,
    };

    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    if headers.get(0) != Some(INDEX_HEADER) {
        return Err(malformed(format!("first header cell must be {INDEX_HEADER:?}")));
    }
    let columns = headers
        .iter()
        .skip(1)
        .map(|h| h.parse::<ColumnLabel>().map_err(&malformed))
        .collect::<Result<Vec<_>>>()?;

    let records = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;
    let rows: Vec<RowLabel> = records
        .iter()
        .enumerate()
        .map(|(idx, record)| {
            let label = record.get(0).unwrap_or_default();
            match (idx, label) {
                (0, "quantity") => Ok(RowLabel::Quantity),
                (1, "amount") => Ok(RowLabel::Amount),
                (0, _) | (1, _) => Err(malformed(format!("unexpected totals row {label:?}"))),
                _ => Ok(RowLabel::product(label)),
            }
        })
        .collect::<Result<_>>()?;

    let mut matrix = ReportMatrix::new(key.clone(), rows.iter().cloned(), columns.iter().copied());
    if matrix.row_count() != rows.len() || matrix.column_count() != columns.len() {
        return Err(malformed("duplicate row or column label".to_string()));
    }

    for (row, record) in rows.iter().zip(&records) {
        for (column, field) in columns.iter().zip(record.iter().skip(1)) {
            if field.is_empty() {
                continue;
            }
            let value = BigDecimal::from_str(field)
                .map_err(|e| malformed(format!("bad number {field:?}: {e}")))?;
            matrix.set(row, column, value)?;
        }
    }
    Ok(matrix)
}

impl ReportStore for CsvDirectoryStore {
    fn exists(&self) -> bool {
        self.root.is_dir()
    }

    fn list_sheet_keys(&self) -> Result<Vec<SheetKey>> {
        if !self.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(&self.root).map_err(|e| ReportError::store(&self.root, e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| ReportError::store(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(SHEET_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match SheetKey::from_sheet_name(stem) {
                Some(key) => keys.push(key),
                None => tracing::warn!("Skipping sheet without year: {}", stem),
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// 按文件名判断, 与写入时的名称转换一致
    fn contains_sheet(&self, key: &SheetKey) -> Result<bool> {
        Ok(sheet_path(&self.root, &key.sheet_name()).is_file())
    }

    fn load_sheet(&self, key: &SheetKey) -> Result<ReportMatrix> {
        let path = sheet_path(&self.root, &key.sheet_name());
        if !path.is_file() {
            return Err(ReportError::SheetNotFound(key.sheet_name()));
        }
        read_matrix(&path, key)
    }

    fn delete_sheet(&mut self, key: &SheetKey) -> Result<()> {
        let path = sheet_path(&self.root, &key.sheet_name());
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(ReportError::SheetNotFound(key.sheet_name()))
            }
            Err(e) => Err(ReportError::store(path, e)),
        }
    }

    fn write_sheet(&mut self, matrix: &ReportMatrix) -> Result<()> {
        fs::create_dir_all(&self.root).map_err(|e| ReportError::store(&self.root, e))?;
        write_matrix(&sheet_path(&self.root, &matrix.sheet_name()), matrix)
    }

    /// 临时文件 + 重命名
    fn replaces_on_write(&self) -> bool {
        true
    }

    /// 在暂存目录中写完全部工作表后再整体重命名为目标目录
    fn create_and_write(&mut self, matrices: &[ReportMatrix]) -> Result<()> {
        let staging = self.staging_dir();
        if staging.exists() {
            tracing::warn!("Removing stale staging directory {}", staging.display());
            fs::remove_dir_all(&staging).map_err(|e| ReportError::store(&staging, e))?;
        }
        fs::create_dir_all(&staging).map_err(|e| ReportError::store(&staging, e))?;

        for matrix in matrices {
            tracing::info!("写入工作表: {}", matrix.sheet_name());
            write_matrix(&sheet_path(&staging, &matrix.sheet_name()), matrix)?;
        }
        if let Some(last_year) = matrices.iter().map(|m| m.key().year).max() {
            write_manifest(&staging, last_year)?;
        }

        fs::rename(&staging, &self.root).map_err(|e| ReportError::store(&self.root, e))?;
        tracing::info!("Store created at {}", self.root.display());
        Ok(())
    }

    /// 优先使用 manifest, 否则从工作表名称推断
    fn resume_year(&self) -> Result<Option<i32>> {
        if let Some(manifest) = self.read_manifest()? {
            return Ok(Some(manifest.last_year));
        }
        Ok(self.list_sheet_keys()?.iter().map(|k| k.year).max())
    }

    fn record_resume_year(&mut self, year: i32) -> Result<()> {
        write_manifest(&self.root, year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::skeleton::build_skeleton;
    use chrono::NaiveDate;

    fn sample(marketplace: &str, year: i32) -> ReportMatrix {
        let key = SheetKey::new(marketplace, year);
        let mut matrix = build_skeleton(&key, ["X1", "y2"]).unwrap();
        let day = ColumnLabel::day(NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
        let month = ColumnLabel::month_of(NaiveDate::from_ymd_opt(year, 1, 1).unwrap());
        matrix.set(&RowLabel::product("X1"), &day, BigDecimal::from(2)).unwrap();
        matrix.set(&RowLabel::Quantity, &day, BigDecimal::from(2)).unwrap();
        matrix
            .set(&RowLabel::Amount, &day, BigDecimal::from_str("100.50").unwrap())
            .unwrap();
        matrix.set(&RowLabel::product("X1"), &month, BigDecimal::from(2)).unwrap();
        matrix
    }

    #[test]
    fn sheet_round_trips_through_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvDirectoryStore::new(dir.path().join("reports"));
        let matrix = sample("Ozon", 2024);

        store.write_sheet(&matrix).unwrap();
        let loaded = store.load_sheet(matrix.key()).unwrap();
        assert_eq!(loaded, matrix);

        let second_day = ColumnLabel::day(NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(loaded.get(&RowLabel::product("y2"), &second_day), None);
    }

    #[test]
    fn csv_layout_keeps_labels_and_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvDirectoryStore::new(dir.path().join("reports"));
        store.write_sheet(&sample("Ozon", 2023)).unwrap();

        let text = fs::read_to_string(dir.path().join("reports").join("Ozon 2023.csv")).unwrap();
        let mut lines = text.lines();
        assert!(lines.next().unwrap().starts_with("date,01-01-2023,02-01-2023,"));
        assert!(lines.next().unwrap().starts_with("quantity,2,,"));
        assert!(lines.next().unwrap().starts_with("amount,100.50,,"));
        assert!(lines.next().unwrap().starts_with("X1,2,,"));
    }

    #[test]
    fn create_and_write_promotes_staging_directory() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("reports");
        let mut store = CsvDirectoryStore::new(&root);
        assert!(!store.exists());

        store
            .create_and_write(&[sample("A", 2023), sample("A", 2024), sample("B", 2024)])
            .unwrap();

        assert!(store.exists());
        assert!(!dir.path().join("reports.partial").exists());
        assert_eq!(
            store.list_sheet_keys().unwrap(),
            vec![
                SheetKey::new("A", 2023),
                SheetKey::new("A", 2024),
                SheetKey::new("B", 2024),
            ]
        );
        assert_eq!(store.resume_year().unwrap(), Some(2024));
    }

    #[test]
    fn resume_year_falls_back_to_sheet_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvDirectoryStore::new(dir.path());
        store.write_sheet(&sample("A", 2021)).unwrap();
        store.write_sheet(&sample("B", 2022)).unwrap();
        fs::write(dir.path().join("notes.csv"), "date\n").unwrap();

        assert_eq!(store.resume_year().unwrap(), Some(2022));
        assert_eq!(store.list_sheet_keys().unwrap().len(), 2);

        store.record_resume_year(2021).unwrap();
        assert_eq!(store.resume_year().unwrap(), Some(2021));
    }

    #[test]
    fn delete_removes_only_the_named_sheet() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvDirectoryStore::new(dir.path());
        store.write_sheet(&sample("A", 2023)).unwrap();
        store.write_sheet(&sample("A", 2024)).unwrap();

        store.delete_sheet(&SheetKey::new("A", 2023)).unwrap();
        assert_eq!(store.list_sheet_keys().unwrap(), vec![SheetKey::new("A", 2024)]);
        assert!(matches!(
            store.delete_sheet(&SheetKey::new("A", 2023)),
            Err(ReportError::SheetNotFound(_))
        ));
    }

    #[test]
    fn contains_sheet_matches_sanitized_file_names() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = CsvDirectoryStore::new(dir.path());
        let matrix = sample("A/B", 2024);
        store.write_sheet(&matrix).unwrap();

        assert!(dir.path().join("A_B 2024.csv").is_file());
        assert!(store.contains_sheet(matrix.key()).unwrap());
        assert!(!store.contains_sheet(&SheetKey::new("A/B", 2023)).unwrap());
    }

    #[test]
    fn malformed_sheet_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = CsvDirectoryStore::new(dir.path());
        fs::write(dir.path().join("A 2024.csv"), "date,01-01-2024\nX1,1\n").unwrap();

        let err = store.load_sheet(&SheetKey::new("A", 2024)).unwrap_err();
        assert!(matches!(err, ReportError::MalformedSheet { .. }));
    }
}

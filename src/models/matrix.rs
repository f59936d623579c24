use bigdecimal::{BigDecimal, Zero};
use indexmap::IndexSet;
use std::collections::HashMap;

use crate::error::{ReportError, Result};
use crate::models::{ColumnLabel, RowLabel, SheetKey};

/// 报表矩阵 (一个 年份×平台 工作表)
///
/// 行、列标签保持插入顺序; 单元格稀疏存储, 缺失即为空 (未发生销售)。
#[derive(Debug, Clone)]
pub struct ReportMatrix {
    key: SheetKey,
    rows: IndexSet<RowLabel>,
    columns: IndexSet<ColumnLabel>,
    cells: HashMap<(usize, usize), BigDecimal>,
}

impl ReportMatrix {
    pub fn new(
        key: SheetKey,
        rows: impl IntoIterator<Item = RowLabel>,
        columns: impl IntoIterator<Item = ColumnLabel>,
    ) -> Self {
        Self {
            key,
            rows: rows.into_iter().collect(),
            columns: columns.into_iter().collect(),
            cells: HashMap::new(),
        }
    }

    pub fn key(&self) -> &SheetKey {
        &self.key
    }

    pub fn sheet_name(&self) -> String {
        self.key.sheet_name()
    }

    pub fn rows(&self) -> impl Iterator<Item = &RowLabel> {
        self.rows.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnLabel> {
        self.columns.iter()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn day_column_count(&self) -> usize {
        self.columns.iter().filter(|c| !c.is_month()).count()
    }

    pub fn month_column_count(&self) -> usize {
        self.columns.iter().filter(|c| c.is_month()).count()
    }

    pub fn get(&self, row: &RowLabel, column: &ColumnLabel) -> Option<&BigDecimal> {
        let r = self.rows.get_index_of(row)?;
        let c = self.columns.get_index_of(column)?;
        self.cells.get(&(r, c))
    }

    /// 按位置读取 (用于序列化)
    pub fn get_at(&self, row: usize, column: usize) -> Option<&BigDecimal> {
        self.cells.get(&(row, column))
    }

    /// 写入单元格, 返回原值
    pub fn set(
        &mut self,
        row: &RowLabel,
        column: &ColumnLabel,
        value: BigDecimal,
    ) -> Result<Option<BigDecimal>> {
        let position = self.position(row, column)?;
        Ok(self.cells.insert(position, value))
    }

    /// 整列填充
    pub fn fill_column(&mut self, column: &ColumnLabel, value: &BigDecimal) -> Result<()> {
        let c = self
            .columns
            .get_index_of(column)
            .ok_or_else(|| self.unknown_cell(&RowLabel::Quantity, column))?;
        for r in 0..self.rows.len() {
            self.cells.insert((r, c), value.clone());
        }
        Ok(())
    }

    fn position(&self, row: &RowLabel, column: &ColumnLabel) -> Result<(usize, usize)> {
        match (self.rows.get_index_of(row), self.columns.get_index_of(column)) {
            (Some(r), Some(c)) => Ok((r, c)),
            _ => Err(self.unknown_cell(row, column)),
        }
    }

    fn unknown_cell(&self, row: &RowLabel, column: &ColumnLabel) -> ReportError {
        ReportError::UnknownCell {
            sheet: self.sheet_name(),
            row: row.to_string(),
            column: column.to_string(),
        }
    }

    /// 合计数量与各商品数量之和不一致的列
    ///
    /// 商品行为空的列按 0 计。空白型号的销售计入合计但不计入商品行,
    /// 因此这里的不一致也可能来自上游数据。
    pub fn quantity_mismatches(&self) -> Vec<ColumnLabel> {
        let Some(total_row) = self.rows.get_index_of(&RowLabel::Quantity) else {
            return Vec::new();
        };
        let product_rows: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, label)| label.is_product())
            .map(|(idx, _)| idx)
            .collect();

        self.columns
            .iter()
            .enumerate()
            .filter_map(|(c, column)| {
                let total = self.cells.get(&(total_row, c)).cloned().unwrap_or_else(BigDecimal::zero);
                let sum = product_rows
                    .iter()
                    .filter_map(|r| self.cells.get(&(*r, c)))
                    .fold(BigDecimal::zero(), |acc, v| acc + v);
                (total != sum).then_some(*column)
            })
            .collect()
    }
}

/// 行列顺序与单元格值都相同才相等
impl PartialEq for ReportMatrix {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
            && self.rows.iter().eq(other.rows.iter())
            && self.columns.iter().eq(other.columns.iter())
            && self.cells == other.cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> ColumnLabel {
        ColumnLabel::day(NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
    }

    fn sample() -> ReportMatrix {
        ReportMatrix::new(
            SheetKey::new("A", 2024),
            [RowLabel::Quantity, RowLabel::Amount, RowLabel::product("X1")],
            [day(1), day(2)],
        )
    }

    #[test]
    fn cells_start_empty_and_set_returns_previous() {
        let mut m = sample();
        let x1 = RowLabel::product("X1");
        assert_eq!(m.get(&x1, &day(1)), None);
        assert_eq!(m.set(&x1, &day(1), BigDecimal::from(2)).unwrap(), None);
        assert_eq!(
            m.set(&x1, &day(1), BigDecimal::from(3)).unwrap(),
            Some(BigDecimal::from(2))
        );
        assert_eq!(m.get(&x1, &day(1)), Some(&BigDecimal::from(3)));
    }

    #[test]
    fn unknown_labels_are_rejected() {
        let mut m = sample();
        let err = m
            .set(&RowLabel::product("Y"), &day(1), BigDecimal::from(1))
            .unwrap_err();
        assert!(matches!(err, ReportError::UnknownCell { .. }));
        assert!(m.set(&RowLabel::Quantity, &day(3), BigDecimal::from(1)).is_err());
    }

    #[test]
    fn quantity_mismatches_compare_totals_with_products() {
        let mut m = sample();
        let x1 = RowLabel::product("X1");
        m.set(&x1, &day(1), BigDecimal::from(2)).unwrap();
        m.set(&RowLabel::Quantity, &day(1), BigDecimal::from(2)).unwrap();
        m.set(&RowLabel::Quantity, &day(2), BigDecimal::from(1)).unwrap();
        assert_eq!(m.quantity_mismatches(), vec![day(2)]);
    }

    #[test]
    fn equality_respects_row_order() {
        let a = sample();
        let b = ReportMatrix::new(
            SheetKey::new("A", 2024),
            [RowLabel::Amount, RowLabel::Quantity, RowLabel::product("X1")],
            [day(1), day(2)],
        );
        assert_ne!(a, b);
        assert_eq!(a, sample());
    }
}

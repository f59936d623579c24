use bigdecimal::BigDecimal;
use std::collections::HashSet;

use crate::error::{ReportError, Result};
use crate::models::{ColumnLabel, OrderRow, ReportMatrix, RowLabel};
use crate::service::rollup::{PairRollup, Rollups};
use crate::service::skeleton::build_skeleton;

/// 单次填充中每个单元格只允许写入一次
struct CellWriter<'m> {
    matrix: &'m mut ReportMatrix,
    written: HashSet<(RowLabel, ColumnLabel)>,
}

impl<'m> CellWriter<'m> {
    fn new(matrix: &'m mut ReportMatrix) -> Self {
        Self {
            matrix,
            written: HashSet::new(),
        }
    }

    fn write(&mut self, row: RowLabel, column: ColumnLabel, value: BigDecimal) -> Result<()> {
        if !self.written.insert((row.clone(), column)) {
            return Err(ReportError::DuplicateCell {
                sheet: self.matrix.sheet_name(),
                row: row.to_string(),
                column: column.to_string(),
            });
        }
        self.matrix.set(&row, &column, value)?;
        Ok(())
    }
}

/// 用汇总表填充骨架矩阵
///
/// 商品行只填数量; 金额只出现在合计行。
pub fn populate(matrix: &mut ReportMatrix, rollup: &PairRollup) -> Result<()> {
    let mut writer = CellWriter::new(matrix);

    for ((date, model), totals) in &rollup.daily_by_product {
        writer.write(
            RowLabel::product(model.as_str()),
            ColumnLabel::day(*date),
            BigDecimal::from(totals.quantity),
        )?;
    }

    for (date, totals) in &rollup.daily_total {
        let column = ColumnLabel::day(*date);
        writer.write(RowLabel::Quantity, column, BigDecimal::from(totals.quantity))?;
        writer.write(RowLabel::Amount, column, totals.amount.clone())?;
    }

    for ((month, model), totals) in &rollup.monthly_by_product {
        writer.write(
            RowLabel::product(model.as_str()),
            ColumnLabel::month_of(*month),
            BigDecimal::from(totals.quantity),
        )?;
    }

    for (month, totals) in &rollup.monthly_total {
        let column = ColumnLabel::month_of(*month);
        writer.write(RowLabel::Quantity, column, BigDecimal::from(totals.quantity))?;
        writer.write(RowLabel::Amount, column, totals.amount.clone())?;
    }

    Ok(())
}

/// 汇总 → 骨架 → 填充, 按 (年份, 平台) 顺序返回全部矩阵
pub fn build_report(rows: &[OrderRow]) -> Result<Vec<ReportMatrix>> {
    let rollups = Rollups::from_rows(rows)?;
    tracing::info!("Aggregated {} rows into {} sheets", rows.len(), rollups.len());

    let mut matrices = Vec::with_capacity(rollups.len());
    for (key, pair) in rollups.iter() {
        tracing::debug!("构建工作表 {} ({} 个商品)", key, pair.products.len());
        let mut matrix = build_skeleton(key, pair.products.iter().map(String::as_str))?;
        populate(&mut matrix, pair)?;
        matrices.push(matrix);
    }
    Ok(matrices)
}

use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

use crate::error::Result;
use crate::models::{ColumnLabel, ReportMatrix, RowLabel, SheetKey};

/// 全年日历列: 1月1日至12月31日, 每月最后一天之后插入月合计列
pub fn calendar_columns(year: i32) -> Vec<ColumnLabel> {
    let Some(start) = NaiveDate::from_ymd_opt(year, 1, 1) else {
        return Vec::new();
    };

    let mut columns = Vec::with_capacity(366 + 12);
    for date in start.iter_days().take_while(|d| d.year() == year) {
        columns.push(ColumnLabel::day(date));
        let is_month_end = date.succ_opt().map_or(true, |next| next.month() != date.month());
        if is_month_end {
            columns.push(ColumnLabel::month_of(date));
        }
    }
    columns
}

/// 行标签: 数量, 金额, 然后是按字母排序 (不区分大小写) 的商品型号
pub fn product_rows<'a>(models: impl IntoIterator<Item = &'a str>) -> Vec<RowLabel> {
    let mut unique: Vec<&str> = models
        .into_iter()
        .filter(|m| !m.trim().is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    unique.sort_by(|a, b| a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(b)));

    let mut rows = Vec::with_capacity(unique.len() + 2);
    rows.push(RowLabel::Quantity);
    rows.push(RowLabel::Amount);
    rows.extend(unique.into_iter().map(RowLabel::product));
    rows
}

/// 构建空矩阵; 月合计列全部预置为 0
pub fn build_skeleton<'a>(
    key: &SheetKey,
    models: impl IntoIterator<Item = &'a str>,
) -> Result<ReportMatrix> {
    let columns = calendar_columns(key.year);
    let month_columns: Vec<ColumnLabel> = columns.iter().filter(|c| c.is_month()).copied().collect();

    let mut matrix = ReportMatrix::new(key.clone(), product_rows(models), columns);
    let zero = BigDecimal::zero();
    for column in &month_columns {
        matrix.fill_column(column, &zero)?;
    }
    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn regular_year_has_365_days_and_12_months() {
        let columns = calendar_columns(2023);
        assert_eq!(columns.iter().filter(|c| !c.is_month()).count(), 365);
        assert_eq!(columns.iter().filter(|c| c.is_month()).count(), 12);
        assert_eq!(columns.len(), 377);
    }

    #[test]
    fn leap_year_has_366_days() {
        let columns = calendar_columns(2024);
        assert_eq!(columns.iter().filter(|c| !c.is_month()).count(), 366);
        assert!(columns.iter().any(|c| c.to_string() == "29-02-2024"));
        assert_eq!(calendar_columns(1900).iter().filter(|c| !c.is_month()).count(), 365);
        assert_eq!(calendar_columns(2000).iter().filter(|c| !c.is_month()).count(), 366);
    }

    #[test]
    fn month_column_follows_last_day_of_month() {
        let labels: Vec<String> = calendar_columns(2024).iter().map(|c| c.to_string()).collect();
        let expected = [
            ("31-01-2024", "January 2024"),
            ("29-02-2024", "February 2024"),
            ("31-03-2024", "March 2024"),
            ("30-04-2024", "April 2024"),
            ("31-05-2024", "May 2024"),
            ("30-06-2024", "June 2024"),
            ("31-07-2024", "July 2024"),
            ("31-08-2024", "August 2024"),
            ("30-09-2024", "September 2024"),
            ("31-10-2024", "October 2024"),
            ("30-11-2024", "November 2024"),
            ("31-12-2024", "December 2024"),
        ];
        for (last_day, month) in expected {
            let idx = labels.iter().position(|l| l == last_day).unwrap();
            assert_eq!(labels[idx + 1], month);
        }
        assert_eq!(labels.first().map(String::as_str), Some("01-01-2024"));
        assert_eq!(labels.last().map(String::as_str), Some("December 2024"));
        assert_eq!(labels[32], "01-02-2024");
    }

    #[test]
    fn products_sort_case_insensitively_after_totals() {
        let rows: Vec<String> = product_rows(["b1", "A2", "a3", "b1", ""])
            .iter()
            .map(|r| r.to_string())
            .collect();
        assert_eq!(rows, vec!["quantity", "amount", "A2", "a3", "b1"]);
    }

    #[test]
    fn skeleton_seeds_month_columns_with_zero() {
        let key = SheetKey::new("A", 2024);
        let matrix = build_skeleton(&key, ["X1"]).unwrap();
        let x1 = RowLabel::product("X1");
        let jan = "January 2024".parse::<ColumnLabel>().unwrap();
        let first = "01-01-2024".parse::<ColumnLabel>().unwrap();

        assert_eq!(matrix.get(&x1, &jan), Some(&BigDecimal::zero()));
        assert_eq!(matrix.get(&RowLabel::Amount, &jan), Some(&BigDecimal::zero()));
        assert_eq!(matrix.get(&x1, &first), None);
        assert_eq!(matrix.day_column_count(), 366);
        assert_eq!(matrix.month_column_count(), 12);
    }
}

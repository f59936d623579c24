use bigdecimal::{BigDecimal, Zero};
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, BTreeSet};

use crate::error::{ReportError, Result};
use crate::models::{OrderRow, SheetKey};

/// 数量与金额合计
#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    pub quantity: i64,
    pub amount: BigDecimal,
}

impl Default for Totals {
    fn default() -> Self {
        Self {
            quantity: 0,
            amount: BigDecimal::zero(),
        }
    }
}

impl Totals {
    fn add(&mut self, row: &OrderRow, key: &SheetKey) -> Result<()> {
        self.quantity = self
            .quantity
            .checked_add(row.bought_pc)
            .ok_or_else(|| ReportError::QuantityOverflow(key.sheet_name()))?;
        self.amount = &self.amount + &row.bought_price;
        Ok(())
    }
}

/// 单个 年份×平台 的四张汇总表
///
/// 月份以当月第一天为键。
#[derive(Debug, Clone, Default)]
pub struct PairRollup {
    pub daily_by_product: BTreeMap<(NaiveDate, String), Totals>,
    pub monthly_by_product: BTreeMap<(NaiveDate, String), Totals>,
    pub daily_total: BTreeMap<NaiveDate, Totals>,
    pub monthly_total: BTreeMap<NaiveDate, Totals>,
    /// 出现过的非空商品型号
    pub products: BTreeSet<String>,
}

/// 汇总结果, 按工作表键分组
#[derive(Debug, Clone, Default)]
pub struct Rollups {
    pairs: BTreeMap<SheetKey, PairRollup>,
}

impl Rollups {
    /// 单次遍历累加
    pub fn from_rows(rows: &[OrderRow]) -> Result<Self> {
        let mut pairs: BTreeMap<SheetKey, PairRollup> = BTreeMap::new();

        for row in rows {
            let date = row.order_date;
            let month = first_of_month(date);
            let key = SheetKey::new(row.marketplace.clone(), date.year());
            let pair = pairs.entry(key.clone()).or_default();

            pair.daily_total.entry(date).or_default().add(row, &key)?;
            pair.monthly_total.entry(month).or_default().add(row, &key)?;

            if let Some(model) = row.model() {
                pair.daily_by_product
                    .entry((date, model.to_string()))
                    .or_default()
                    .add(row, &key)?;
                pair.monthly_by_product
                    .entry((month, model.to_string()))
                    .or_default()
                    .add(row, &key)?;
                if !pair.products.contains(model) {
                    pair.products.insert(model.to_string());
                }
            }
        }

        Ok(Self { pairs })
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn get(&self, key: &SheetKey) -> Option<&PairRollup> {
        self.pairs.get(key)
    }

    /// 按 (年份, 平台) 顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&SheetKey, &PairRollup)> {
        self.pairs.iter()
    }
}

pub(crate) fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ReportError;

/// 订单明细 (数据库原始行, 日期为文本)
#[derive(Debug, Clone, FromRow)]
pub struct RawOrderRow {
    pub order_date: String,
    pub marketplace: String,
    pub products_model: Option<String>,
    pub bought_pc: i64,
    pub bought_price: BigDecimal,
}

/// 订单明细 (已解析日期)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderRow {
    pub order_date: NaiveDate,
    pub marketplace: String,
    pub products_model: Option<String>,
    pub bought_pc: i64,
    pub bought_price: BigDecimal,
}

impl OrderRow {
    /// 商品型号; 空白型号视为缺失
    pub fn model(&self) -> Option<&str> {
        self.products_model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
    }
}

impl TryFrom<RawOrderRow> for OrderRow {
    type Error = ReportError;

    fn try_from(raw: RawOrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            order_date: parse_order_date(&raw.order_date)?,
            marketplace: raw.marketplace,
            products_model: raw.products_model,
            bought_pc: raw.bought_pc,
            bought_price: raw.bought_price,
        })
    }
}

/// 解析订单日期: `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS[.f]`, 可带时区偏移
pub fn parse_order_date(value: &str) -> Result<NaiveDate, ReportError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f%#z").map(|dt| dt.date_naive()))
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| ReportError::InvalidOrderDate(value.to_string()))
}

use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;
use std::str::FromStr;

const DAY_FORMAT: &str = "%d-%m-%Y";
const MONTH_FORMAT: &str = "%B %Y";

/// 列标签: 日列 (`DD-MM-YYYY`) 或月合计列 (`MonthName YYYY`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnLabel {
    Day(NaiveDate),
    /// 月份第一天
    Month(NaiveDate),
}

impl ColumnLabel {
    pub fn day(date: NaiveDate) -> Self {
        Self::Day(date)
    }

    pub fn month_of(date: NaiveDate) -> Self {
        Self::Month(date - Duration::days(i64::from(date.day0())))
    }

    pub fn is_month(&self) -> bool {
        matches!(self, Self::Month(_))
    }
}

impl fmt::Display for ColumnLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Day(date) => write!(f, "{}", date.format(DAY_FORMAT)),
            Self::Month(date) => write!(f, "{}", date.format(MONTH_FORMAT)),
        }
    }
}

impl FromStr for ColumnLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(date) = NaiveDate::parse_from_str(s, DAY_FORMAT) {
            return Ok(Self::Day(date));
        }
        NaiveDate::parse_from_str(&format!("01 {s}"), "%d %B %Y")
            .map(Self::Month)
            .map_err(|_| format!("not a calendar label: {s:?}"))
    }
}

/// 行标签: 合计数量, 合计金额, 或商品型号
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RowLabel {
    Quantity,
    Amount,
    Product(String),
}

impl RowLabel {
    pub fn product(model: impl Into<String>) -> Self {
        Self::Product(model.into())
    }

    pub fn is_product(&self) -> bool {
        matches!(self, Self::Product(_))
    }
}

impl fmt::Display for RowLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quantity => f.write_str("quantity"),
            Self::Amount => f.write_str("amount"),
            Self::Product(model) => f.write_str(model),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn labels_render_in_report_format() {
        assert_eq!(ColumnLabel::day(date(2024, 1, 2)).to_string(), "02-01-2024");
        assert_eq!(ColumnLabel::month_of(date(2024, 1, 31)).to_string(), "January 2024");
        assert_eq!(ColumnLabel::month_of(date(2023, 12, 7)).to_string(), "December 2023");
        assert_eq!(RowLabel::Quantity.to_string(), "quantity");
        assert_eq!(RowLabel::product("X1").to_string(), "X1");
    }

    #[test]
    fn month_label_normalizes_to_first_day() {
        assert_eq!(
            ColumnLabel::month_of(date(2024, 2, 29)),
            ColumnLabel::Month(date(2024, 2, 1))
        );
    }

    #[test]
    fn labels_parse_back() {
        assert_eq!(
            "29-02-2024".parse::<ColumnLabel>().unwrap(),
            ColumnLabel::Day(date(2024, 2, 29))
        );
        assert_eq!(
            "September 2022".parse::<ColumnLabel>().unwrap(),
            ColumnLabel::Month(date(2022, 9, 1))
        );
        assert!("quantity".parse::<ColumnLabel>().is_err());
    }
}

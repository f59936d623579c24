use serde::{Deserialize, Serialize};
use std::fmt;

/// 工作表名称最大长度
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// 工作表键 (年份 × 平台)
///
/// 按年份再按平台排序。工作表名称为 `"<marketplace> <year>"`, 截断到
/// [`MAX_SHEET_NAME_LEN`] 个字符; 截断后重名的平台不做处理。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SheetKey {
    pub year: i32,
    pub marketplace: String,
}

impl SheetKey {
    pub fn new(marketplace: impl Into<String>, year: i32) -> Self {
        Self {
            year,
            marketplace: marketplace.into(),
        }
    }

    pub fn sheet_name(&self) -> String {
        format!("{} {}", self.marketplace, self.year)
            .chars()
            .take(MAX_SHEET_NAME_LEN)
            .collect()
    }

    /// 从工作表名称还原键: 最后一个空格之后必须是完整的四位年份
    ///
    /// 截断切进年份的名称 (如 `"... 20"`) 返回 `None`。
    pub fn from_sheet_name(name: &str) -> Option<Self> {
        let (marketplace, year) = name.rsplit_once(' ')?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year = year.parse().ok()?;
        Some(Self::new(marketplace, year))
    }
}

impl fmt::Display for SheetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sheet_name())
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::Result;

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// 报表存储目录 (每个工作表一个 CSV 文件)
    pub output_dir: PathBuf,
    /// 全量构建时的起始日期
    pub epoch_start: NaiveDate,
}

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/markets";
const DEFAULT_OUTPUT_DIR: &str = "markets_info/all_reports";

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            epoch_start: NaiveDate::from_ymd_opt(2019, 1, 1).unwrap_or_default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            },
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从环境变量加载配置
    ///
    /// `REPORT__DATABASE__URL`, `REPORT__REPORT__OUTPUT_DIR`,
    /// `REPORT__REPORT__EPOCH_START`; 若设置了 `DATABASE_URL` 则优先使用。
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("database.url", DEFAULT_DATABASE_URL)?
            .set_default("report.output_dir", DEFAULT_OUTPUT_DIR)?
            .set_default("report.epoch_start", "2019-01-01")?
            .add_source(
                config::Environment::with_prefix("REPORT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_epoch_is_start_of_2019() {
        let config = ReportConfig::default();
        assert_eq!(config.epoch_start, NaiveDate::from_ymd_opt(2019, 1, 1).unwrap());
        assert_eq!(config.output_dir, PathBuf::from("markets_info/all_reports"));
    }
}

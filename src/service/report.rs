use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use crate::config::ReportConfig;
use crate::db::TransactionSource;
use crate::error::{ReportError, Result};
use crate::models::{ReportMatrix, SheetKey};
use crate::service::populate::build_report;
use crate::store::ReportStore;

/// 运行模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RunMode {
    /// 存储不存在, 从起始日期全量构建
    FullBuild,
    /// 存储已存在, 从该年 1 月 1 日起重算
    Append { resume_year: i32 },
}

/// 单次运行统计
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub rows_fetched: usize,
    pub sheets_written: usize,
    pub sheets_replaced: usize,
}

/// 报表编排服务
pub struct ReportService<S, R> {
    source: S,
    store: R,
    epoch_start: NaiveDate,
}

impl<S: TransactionSource, R: ReportStore> ReportService<S, R> {
    pub fn new(source: S, store: R, config: &ReportConfig) -> Self {
        Self {
            source,
            store,
            epoch_start: config.epoch_start,
        }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn into_parts(self) -> (S, R) {
        (self.source, self.store)
    }

    /// 根据存储是否存在选择全量构建或增量追加
    pub async fn run(&mut self) -> Result<RunSummary> {
        if self.store.exists() {
            self.append().await
        } else {
            self.full_build().await
        }
    }

    async fn full_build(&mut self) -> Result<RunSummary> {
        tracing::info!("Report store not found, building from {}", self.epoch_start);

        let rows = self.source.fetch(self.epoch_start).await?;
        let matrices = build_report(&rows)?;
        warn_on_mismatches(&matrices);

        self.store.create_and_write(&matrices)?;

        tracing::info!("全量构建完成: {} 行, {} 个工作表", rows.len(), matrices.len());
        Ok(RunSummary {
            mode: RunMode::FullBuild,
            rows_fetched: rows.len(),
            sheets_written: matrices.len(),
            sheets_replaced: 0,
        })
    }

    async fn append(&mut self) -> Result<RunSummary> {
        let sheet_count = self.store.list_sheet_keys()?.len();
        let resume_year = self.store.resume_year()?.unwrap_or(self.epoch_start.year());
        let since = NaiveDate::from_ymd_opt(resume_year, 1, 1).unwrap_or(self.epoch_start);
        tracing::info!(
            "Report store found ({} sheets), appending from {}",
            sheet_count,
            since
        );

        // 拉取与计算全部完成后才修改存储
        let rows = self.source.fetch(since).await?;
        let matrices = build_report(&rows)?;
        warn_on_mismatches(&matrices);

        let mut applied = Vec::with_capacity(matrices.len());
        let outcome = self
            .apply_sheets(&matrices, &mut applied)
            .and_then(|replaced| {
                if let Some(year) = last_year(&matrices) {
                    self.store.record_resume_year(year.max(resume_year))?;
                }
                Ok(replaced)
            });
        let sheets_replaced = match outcome {
            Ok(replaced) => replaced,
            Err(e) => {
                tracing::error!("增量追加失败, 回滚 {} 个工作表: {}", applied.len(), e);
                self.roll_back(applied);
                return Err(e);
            }
        };

        tracing::info!(
            "增量追加完成: {} 行, 写入 {} 个工作表, 其中替换 {} 个",
            rows.len(),
            matrices.len(),
            sheets_replaced
        );
        Ok(RunSummary {
            mode: RunMode::Append { resume_year },
            rows_fetched: rows.len(),
            sheets_written: matrices.len(),
            sheets_replaced,
        })
    }

    /// 逐个写入工作表, 返回替换数量
    ///
    /// 每个工作表在修改前把旧版本 (或 `None`) 记入 `applied`, 供失败时回滚。
    fn apply_sheets(
        &mut self,
        matrices: &[ReportMatrix],
        applied: &mut Vec<(SheetKey, Option<ReportMatrix>)>,
    ) -> Result<usize> {
        let mut replaced = 0;
        for matrix in matrices {
            let key = matrix.key();
            let previous = if self.store.contains_sheet(key)? {
                Some(self.store.load_sheet(key)?)
            } else {
                None
            };
            let existed = previous.is_some();
            applied.push((key.clone(), previous));

            if existed {
                tracing::info!("替换工作表: {}", key);
                if !self.store.replaces_on_write() {
                    self.store.delete_sheet(key)?;
                }
                replaced += 1;
            } else {
                tracing::info!("新增工作表: {}", key);
            }
            self.store.write_sheet(matrix)?;
        }
        Ok(replaced)
    }

    /// 按相反顺序恢复旧工作表, 删除新增的工作表
    fn roll_back(&mut self, applied: Vec<(SheetKey, Option<ReportMatrix>)>) {
        for (key, previous) in applied.into_iter().rev() {
            let restored = match previous {
                Some(matrix) => self.store.write_sheet(&matrix),
                None => match self.store.delete_sheet(&key) {
                    Err(ReportError::SheetNotFound(_)) => Ok(()),
                    other => other,
                },
            };
            if let Err(e) = restored {
                tracing::error!("回滚工作表 {} 失败: {}", key, e);
            }
        }
    }
}

fn last_year(matrices: &[ReportMatrix]) -> Option<i32> {
    matrices.iter().map(|m| m.key().year).max()
}

fn warn_on_mismatches(matrices: &[ReportMatrix]) {
    for matrix in matrices {
        let mismatches = matrix.quantity_mismatches();
        if !mismatches.is_empty() {
            tracing::warn!(
                "Sheet {}: quantity total differs from product rows in {} columns (first: {})",
                matrix.sheet_name(),
                mismatches.len(),
                mismatches[0]
            );
        }
    }
}

use chrono::NaiveDate;
use sqlx::PgPool;
use std::future::Future;

use crate::db::{create_pool, queries};
use crate::error::Result;
use crate::models::OrderRow;

/// 交易数据源: 返回 `order_date >= since` 的全部订单明细, 顺序不保证
pub trait TransactionSource {
    fn fetch(&self, since: NaiveDate) -> impl Future<Output = Result<Vec<OrderRow>>>;
}

/// PostgreSQL 数据源
pub struct PgTransactionSource {
    pool: PgPool,
}

impl PgTransactionSource {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        tracing::info!("Database pool created");
        Ok(Self::new(pool))
    }

    /// 运行结束后释放连接
    pub async fn close(self) {
        self.pool.close().await;
        tracing::info!("Database pool closed");
    }
}

impl TransactionSource for PgTransactionSource {
    async fn fetch(&self, since: NaiveDate) -> Result<Vec<OrderRow>> {
        let raw = queries::fetch_orders(&self.pool, since).await?;
        // 任一行日期无法解析则整次运行失败
        raw.into_iter().map(OrderRow::try_from).collect()
    }
}

/// 内存数据源, 按日期过滤
impl TransactionSource for Vec<OrderRow> {
    async fn fetch(&self, since: NaiveDate) -> Result<Vec<OrderRow>> {
        Ok(self.iter().filter(|r| r.order_date >= since).cloned().collect())
    }
}

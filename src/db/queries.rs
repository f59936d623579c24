use crate::models::RawOrderRow;
use chrono::NaiveDate;
use sqlx::PgPool;

/// 查询指定日期 (含) 之后的全部订单明细
///
/// 日期以文本返回, 由 [`crate::models::OrderRow`] 解析。
pub async fn fetch_orders(
    pool: &PgPool,
    since: NaiveDate,
) -> Result<Vec<RawOrderRow>, sqlx::Error> {
    tracing::debug!("开始查询订单明细, since = {}", since);
    let start_time = std::time::Instant::now();

    let rows = sqlx::query_as::<_, RawOrderRow>(
        r#"
        SELECT o.date_purchased::text AS order_date,
               o.marketplace AS marketplace,
               op.products_model AS products_model,
               op.products_quantity::bigint AS bought_pc,
               (op.final_price * op.products_quantity)::numeric AS bought_price
        FROM orders o
        INNER JOIN orders_products op ON op.orders_id = o.orders_id
        WHERE o.date_purchased >= $1
        ORDER BY o.date_purchased, o.marketplace
        "#
    )
    .bind(since)
    .fetch_all(pool)
    .await?;

    tracing::info!("✓ 查询完成, {} 行, 耗时: {:?}", rows.len(), start_time.elapsed());
    Ok(rows)
}

use markets_report::{AppConfig, CsvDirectoryStore, PgTransactionSource, ReportService};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 初始化日志 - 使用本地时间格式
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(true)
        .with_level(true)
        .init();

    let start_time = Instant::now();

    // 加载配置
    let config = AppConfig::from_env()?;
    info!("Report store: {}", config.report.output_dir.display());

    // 数据源连接只在本次运行内持有
    let source = PgTransactionSource::connect(&config.database.url).await?;
    let store = CsvDirectoryStore::new(&config.report.output_dir);

    let mut service = ReportService::new(source, store, &config.report);
    let outcome = service.run().await;
    let (source, _) = service.into_parts();
    source.close().await;

    let summary = outcome?;
    info!(
        "Run finished: {:?}, {} rows, {} sheets written, {} replaced",
        summary.mode, summary.rows_fetched, summary.sheets_written, summary.sheets_replaced
    );

    let elapsed = start_time.elapsed().as_secs();
    info!("执行时间: {} 分 {} 秒", elapsed / 60, elapsed % 60);

    Ok(())
}

pub mod populate;
pub mod report;
pub mod rollup;
pub mod skeleton;

pub use populate::{build_report, populate};
pub use report::{ReportService, RunMode, RunSummary};
pub use rollup::{PairRollup, Rollups, Totals};
pub use skeleton::{build_skeleton, calendar_columns, product_rows};

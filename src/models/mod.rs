pub mod labels;
pub mod matrix;
pub mod order;
pub mod sheet;

pub use labels::{ColumnLabel, RowLabel};
pub use matrix::ReportMatrix;
pub use order::{parse_order_date, OrderRow, RawOrderRow};
pub use sheet::{SheetKey, MAX_SHEET_NAME_LEN};

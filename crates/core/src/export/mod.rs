pub mod csv;

pub use self::csv::{report_path, validate_label, write_csv, write_report};

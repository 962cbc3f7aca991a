//! Persisted output

mod csv_export;

pub use csv_export::{export_path, write_records};

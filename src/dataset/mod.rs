//! Task records and dataset loading

pub mod loader;
pub mod types;

pub use loader::{load_task_record, task_record_from_value};
pub use types::{RawTaskRecord, TaskRecord};

pub mod config;
pub mod error;
pub mod ffi;
pub mod metadata;
pub mod record;

pub use history_api_derive::ConfigParams;

pub use error::{ErrorKind, ExportError};
pub use metadata::{HostInfo, ItemInfo, MetadataResolver, MetadataTable, NoMetadata};
pub use record::{HistoryBatch, HistoryValue, LogEntry, Record, ValueType};

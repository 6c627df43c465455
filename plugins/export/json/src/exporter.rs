use std::ffi::{c_int, c_void};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{Local, NaiveDate};
use history_api::{ExportError, HistoryBatch, MetadataResolver, NoMetadata, Record};

use crate::appender::LockedAppender;
use crate::config::{ExportConfig, ExportSettings};
use crate::dispatch::dispatch;
use crate::encoder::{JsonLineEncoder, LineFormat, RecordMetadata};
use crate::signal::critical_section;
use crate::target::target_path;

/// What happened to one batch. The host callbacks discard it; everything
/// in it has already been logged.
#[derive(Debug)]
pub enum ExportOutcome {
    /// Export is switched off (by config or by an earlier open failure).
    Disabled,
    /// Nothing to write.
    Empty,
    Written { path: PathBuf, lines: usize },
    Failed(ExportError),
}

// ════════════════════════════════════════════════════════════════
//  HistoryExporter
// ════════════════════════════════════════════════════════════════

/// Writes history batches as JSON Lines.
///
/// Each call runs synchronously on the caller's thread. Writers of the
/// same file, in this process or any other, are serialized by `flock`.
pub struct HistoryExporter {
    config: ExportConfig,
    encoder: JsonLineEncoder,
    resolver: OnceLock<Box<dyn MetadataResolver>>,
}

impl HistoryExporter {
    pub fn new(config: ExportConfig) -> Self {
        let encoder = JsonLineEncoder::new(LineFormat::from(config.settings()));
        Self {
            config,
            encoder,
            resolver: OnceLock::new(),
        }
    }

    pub fn with_resolver(config: ExportConfig, resolver: Box<dyn MetadataResolver>) -> Self {
        let exporter = Self::new(config);
        let _ = exporter.resolver.set(resolver);
        exporter
    }

    /// Load `history2json.conf` and build an exporter from it.
    pub fn from_config_file(path: &Path) -> Result<Self, ExportError> {
        let values = history_config_zbx::load(path, &ExportSettings::config_params())?;
        let config = ExportConfig::from_values(&values)?;
        Ok(Self::new(config))
    }

    /// Install the metadata resolver. Only the first call takes effect.
    pub fn install_resolver(&self, resolver: Box<dyn MetadataResolver>) -> bool {
        self.resolver.set(resolver).is_ok()
    }

    pub fn config(&self) -> &ExportConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn output_path(&self) -> &str {
        self.config.output_path()
    }

    /// Path a batch of `value_type` exported on `today` goes to.
    pub fn path_for(&self, value_type: history_api::ValueType, today: NaiveDate) -> PathBuf {
        target_path(self.config.settings(), value_type, today)
    }

    /// Generic handler behind the five host callbacks.
    ///
    /// # Safety
    /// `history` must be null or point to `count` records of the C struct
    /// matching `tag`.
    pub unsafe fn export_raw(&self, tag: c_int, history: *const c_void, count: c_int) -> ExportOutcome {
        if !self.config.is_enabled() {
            return ExportOutcome::Disabled;
        }

        let batch = match unsafe { dispatch(tag, history, count) } {
            Ok(batch) => batch,
            Err(e) => {
                tracing::error!(error = %e, tag, "internal error: batch abandoned");
                return ExportOutcome::Failed(e);
            }
        };
        self.export(&batch)
    }

    /// Export with today's local date.
    pub fn export(&self, batch: &HistoryBatch) -> ExportOutcome {
        self.export_at(batch, Local::now().date_naive())
    }

    /// Export as if the local date were `today`. The date is taken once for
    /// the whole batch.
    pub fn export_at(&self, batch: &HistoryBatch, today: NaiveDate) -> ExportOutcome {
        if !self.config.is_enabled() {
            return ExportOutcome::Disabled;
        }
        if batch.is_empty() {
            tracing::warn!(value_type = %batch.value_type, "history is empty");
            return ExportOutcome::Empty;
        }

        let path = target_path(self.config.settings(), batch.value_type, today);
        tracing::debug!(value_type = %batch.value_type, path = %path.display(), count = batch.len(), "exporting batch");

        critical_section(|| self.write_batch(&path, &batch.records))
    }

    fn write_batch(&self, path: &Path, records: &[Record]) -> ExportOutcome {
        let mut appender = match LockedAppender::open(path) {
            Ok(a) => a,
            Err(e) if e.is_open_failure() => {
                if self.config.disable() {
                    tracing::warn!(error = %e, "cannot open history file, JSON export disabled");
                }
                return ExportOutcome::Failed(e.into());
            }
            Err(e) => {
                tracing::warn!(error = %e, "batch skipped");
                return ExportOutcome::Failed(e.into());
            }
        };

        let mut write_error = None;
        for record in records {
            let meta = self.resolve(record);
            let line = match self.encoder.encode(record, &meta) {
                Ok(line) => line,
                Err(e) => {
                    tracing::error!(error = %e, itemid = record.item_id, "record cannot be encoded");
                    continue;
                }
            };
            tracing::debug!(line = %line, "JSON output");

            if let Err(e) = appender.append_line(&line) {
                tracing::warn!(error = %e, "write failed, rest of batch dropped");
                write_error = Some(e);
                break;
            }
        }

        match (appender.finish(), write_error) {
            (Ok(lines), None) => {
                tracing::debug!(count = lines, path = %path.display(), "synced history");
                ExportOutcome::Written { path: path.to_path_buf(), lines }
            }
            (Ok(_), Some(e)) => ExportOutcome::Failed(e.into()),
            (Err(e), _) => {
                tracing::warn!(error = %e, "finishing batch");
                ExportOutcome::Failed(e.into())
            }
        }
    }

    fn resolve(&self, record: &Record) -> RecordMetadata {
        let format = self.encoder.format();
        let resolver: &dyn MetadataResolver = match self.resolver.get() {
            Some(r) => r.as_ref(),
            None => &NoMetadata,
        };

        let host = if format.include_host_info {
            let host = resolver.resolve_host(record.item_id);
            if host.is_none() {
                tracing::warn!(itemid = record.item_id, "host lookup failed");
            }
            host
        } else {
            None
        };

        let item = if format.include_item_info {
            let item = resolver.resolve_item(record.item_id);
            if item.is_none() {
                tracing::warn!(itemid = record.item_id, "item lookup failed");
            }
            item
        } else {
            None
        };

        RecordMetadata { host, item }
    }
}

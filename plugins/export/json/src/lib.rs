//! JSON Lines history export module.
//!
//! Loaded by the monitoring server as a shared object. The server calls
//! [`zbx_module_init`] once, then hands each history batch to one of the
//! callbacks returned by [`zbx_module_history_write_cbs`].

pub mod appender;
pub mod config;
pub mod dispatch;
pub mod encoder;
pub mod exporter;
pub mod query;
pub mod resolver;
pub mod signal;
pub mod target;

use std::ffi::c_int;
use std::sync::OnceLock;

use history_api::ValueType;
use history_api::ffi::{
    HostLookupFn, ItemLookupFn, ZBX_MODULE_API_VERSION, ZBX_MODULE_FAIL, ZBX_MODULE_OK,
    ZbxHistoryFloat, ZbxHistoryInteger, ZbxHistoryLog, ZbxHistoryString, ZbxHistoryText,
    ZbxHistoryWriteCbs,
};

pub use config::{ExportConfig, ExportSettings};
pub use encoder::{JsonLineEncoder, LineFormat, RecordMetadata};
pub use exporter::{ExportOutcome, HistoryExporter};
pub use query::{ITEM_KEYS, QueryValue};
pub use resolver::FfiMetadataResolver;

static EXPORTER: OnceLock<HistoryExporter> = OnceLock::new();

/// The exporter built by [`zbx_module_init`], if init succeeded.
pub fn exporter() -> Option<&'static HistoryExporter> {
    EXPORTER.get()
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

// ════════════════════════════════════════════════════════════════
//  Module entry points
// ════════════════════════════════════════════════════════════════

#[unsafe(no_mangle)]
pub extern "C" fn zbx_module_api_version() -> c_int {
    ZBX_MODULE_API_VERSION
}

#[unsafe(no_mangle)]
pub extern "C" fn zbx_module_init() -> c_int {
    init_logging();

    if EXPORTER.get().is_some() {
        tracing::warn!("module already initialized");
        return ZBX_MODULE_OK;
    }

    let path = history_config_zbx::module_config_path(None);
    let exporter = match HistoryExporter::from_config_file(&path) {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, path = %path.display(), "cannot load module configuration");
            return ZBX_MODULE_FAIL;
        }
    };

    tracing::warn!(
        enable = exporter.is_enabled(),
        path = exporter.output_path(),
        "history2json module loaded"
    );
    let _ = EXPORTER.set(exporter);
    ZBX_MODULE_OK
}

#[unsafe(no_mangle)]
pub extern "C" fn zbx_module_uninit() -> c_int {
    ZBX_MODULE_OK
}

macro_rules! history_callback {
    ($name:ident, $raw:ty, $value_type:expr) => {
        unsafe extern "C" fn $name(history: *const $raw, count: c_int) {
            let Some(exporter) = EXPORTER.get() else {
                return;
            };
            // SAFETY: the server passes `count` records of the struct the
            // callback was registered for.
            let _ = unsafe { exporter.export_raw($value_type.tag(), history.cast(), count) };
        }
    };
}

history_callback!(history_float_cb, ZbxHistoryFloat, ValueType::Float);
history_callback!(history_integer_cb, ZbxHistoryInteger, ValueType::Integer);
history_callback!(history_string_cb, ZbxHistoryString, ValueType::String);
history_callback!(history_text_cb, ZbxHistoryText, ValueType::Text);
history_callback!(history_log_cb, ZbxHistoryLog, ValueType::Log);

#[unsafe(no_mangle)]
pub extern "C" fn zbx_module_history_write_cbs() -> ZbxHistoryWriteCbs {
    ZbxHistoryWriteCbs {
        history_float_cb: Some(history_float_cb),
        history_integer_cb: Some(history_integer_cb),
        history_string_cb: Some(history_string_cb),
        history_text_cb: Some(history_text_cb),
        history_log_cb: Some(history_log_cb),
    }
}

/// Install the server's host and item lookups. Must follow a successful
/// [`zbx_module_init`]; only the first call takes effect.
#[unsafe(no_mangle)]
pub extern "C" fn history2json_set_metadata_resolver(
    host_lookup: Option<HostLookupFn>,
    item_lookup: Option<ItemLookupFn>,
) -> c_int {
    let Some(exporter) = EXPORTER.get() else {
        tracing::warn!("metadata resolver set before module init");
        return ZBX_MODULE_FAIL;
    };
    let resolver = FfiMetadataResolver::new(host_lookup, item_lookup);
    if !exporter.install_resolver(Box::new(resolver)) {
        tracing::warn!("metadata resolver already installed, ignoring");
    }
    ZBX_MODULE_OK
}

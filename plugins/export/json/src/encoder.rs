use std::borrow::Cow;

use history_api::{ExportError, HistoryValue, HostInfo, ItemInfo, Record};
use serde::Serialize;

use crate::config::ExportSettings;

/// Optional fields switched on by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineFormat {
    pub include_pid: bool,
    pub include_host_info: bool,
    pub include_item_info: bool,
    pub include_type: bool,
}

impl From<&ExportSettings> for LineFormat {
    fn from(s: &ExportSettings) -> Self {
        Self {
            include_pid: s.include_pid,
            include_host_info: s.include_host_info,
            include_item_info: s.include_item_info,
            include_type: s.include_type,
        }
    }
}

/// Lookup results for one record. `None` means "not found" (or not asked).
#[derive(Debug, Clone, Default)]
pub struct RecordMetadata {
    pub host: Option<HostInfo>,
    pub item: Option<ItemInfo>,
}

// ════════════════════════════════════════════════════════════════
//  On-disk line layout
// ════════════════════════════════════════════════════════════════

/// Field order is the serialization order.
/// `Option<Option<_>>`: outer `None` drops the key, inner `None` writes `null`.
#[derive(Serialize)]
struct JsonLine<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    hostid: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<Option<&'a str>>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    value_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<Option<&'a str>>,
    itemid: u64,
    clock: i64,
    ns: i32,
    value: LineValue<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logsource: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logtimestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logeventid: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    logseverity: Option<i64>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum LineValue<'a> {
    Number(u64),
    Text(Cow<'a, str>),
}

// ════════════════════════════════════════════════════════════════
//  Encoder
// ════════════════════════════════════════════════════════════════

/// Renders records as single-line JSON objects.
///
/// Floats are written as strings with six fractional digits
/// (`12.34` → `"12.340000"`), integers as numbers. Existing consumers of
/// the export depend on that asymmetry.
///
/// `pid` is read on every encode: the server forks its writers after the
/// module is initialized.
#[derive(Debug, Clone)]
pub struct JsonLineEncoder {
    format: LineFormat,
    fixed_pid: Option<u32>,
}

impl JsonLineEncoder {
    pub fn new(format: LineFormat) -> Self {
        Self { format, fixed_pid: None }
    }

    /// Always write `pid` instead of the current process id.
    pub fn with_pid(format: LineFormat, pid: u32) -> Self {
        Self { format, fixed_pid: Some(pid) }
    }

    pub fn format(&self) -> LineFormat {
        self.format
    }

    /// Encode one record. The returned line has no trailing newline.
    pub fn encode(&self, record: &Record, meta: &RecordMetadata) -> Result<String, ExportError> {
        let f = self.format;

        let host = meta.host.as_ref();
        let mut line = JsonLine {
            pid: f.include_pid.then(|| self.fixed_pid.unwrap_or_else(std::process::id)),
            hostid: f.include_host_info.then(|| host.map_or(0, |h| h.host_id)),
            host: f.include_host_info.then(|| host.map(|h| h.host_name.as_str())),
            value_type: f.include_type.then(|| record.value_type().as_str()),
            key: f
                .include_item_info
                .then(|| meta.item.as_ref().map(|i| i.item_key.as_str())),
            itemid: record.item_id,
            clock: record.clock,
            ns: record.ns,
            value: LineValue::Number(0),
            logsource: None,
            logtimestamp: None,
            logeventid: None,
            logseverity: None,
        };

        line.value = match &record.value {
            HistoryValue::Float(v) => LineValue::Text(Cow::Owned(format_float(*v))),
            HistoryValue::Integer(v) => LineValue::Number(*v),
            HistoryValue::String(s) | HistoryValue::Text(s) => LineValue::Text(Cow::Borrowed(s.as_str())),
            HistoryValue::Log(entry) => {
                line.logsource = Some(entry.source.as_str());
                line.logtimestamp = Some(entry.timestamp);
                line.logeventid = Some(entry.event_id);
                line.logseverity = Some(entry.severity);
                LineValue::Text(Cow::Borrowed(entry.value.as_str()))
            }
        };

        Ok(serde_json::to_string(&line)?)
    }
}

/// `printf("%lf")` spelling, including `nan`, `-nan`, `inf` and `-inf`.
fn format_float(v: f64) -> String {
    if v.is_nan() {
        return if v.is_sign_negative() { "-nan" } else { "nan" }.to_string();
    }
    if v.is_infinite() {
        return if v < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    format!("{v:.6}")
}

use std::ffi::{c_int, c_void};

use history_api::ffi::{
    string_from_c, ZbxHistoryFloat, ZbxHistoryInteger, ZbxHistoryLog, ZbxHistoryString,
    ZbxHistoryText,
};
use history_api::{ExportError, HistoryBatch, HistoryValue, LogEntry, Record, ValueType};

/// A host-side history struct that can be normalized into a [`Record`].
pub trait RawRecord {
    const VALUE_TYPE: ValueType;

    /// # Safety
    /// Every string pointer in `self` must be null or a valid C string.
    unsafe fn to_record(&self) -> Record;
}

impl RawRecord for ZbxHistoryFloat {
    const VALUE_TYPE: ValueType = ValueType::Float;

    unsafe fn to_record(&self) -> Record {
        Record {
            item_id: self.itemid,
            clock: i64::from(self.clock),
            ns: self.ns,
            value: HistoryValue::Float(self.value),
        }
    }
}

impl RawRecord for ZbxHistoryInteger {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    unsafe fn to_record(&self) -> Record {
        Record {
            item_id: self.itemid,
            clock: i64::from(self.clock),
            ns: self.ns,
            value: HistoryValue::Integer(self.value),
        }
    }
}

impl RawRecord for ZbxHistoryString {
    const VALUE_TYPE: ValueType = ValueType::String;

    unsafe fn to_record(&self) -> Record {
        Record {
            item_id: self.itemid,
            clock: i64::from(self.clock),
            ns: self.ns,
            value: HistoryValue::String(unsafe { string_from_c(self.value) }),
        }
    }
}

impl RawRecord for ZbxHistoryText {
    const VALUE_TYPE: ValueType = ValueType::Text;

    unsafe fn to_record(&self) -> Record {
        Record {
            item_id: self.itemid,
            clock: i64::from(self.clock),
            ns: self.ns,
            value: HistoryValue::Text(unsafe { string_from_c(self.value) }),
        }
    }
}

impl RawRecord for ZbxHistoryLog {
    const VALUE_TYPE: ValueType = ValueType::Log;

    unsafe fn to_record(&self) -> Record {
        Record {
            item_id: self.itemid,
            clock: i64::from(self.clock),
            ns: self.ns,
            value: HistoryValue::Log(LogEntry {
                value: unsafe { string_from_c(self.value) },
                source: unsafe { string_from_c(self.source) },
                timestamp: i64::from(self.timestamp),
                event_id: i64::from(self.logeventid),
                severity: i64::from(self.severity),
            }),
        }
    }
}

/// Normalize one raw array of type `T`.
///
/// # Safety
/// `history` must point to `count` initialized `T` values.
pub unsafe fn normalize<T: RawRecord>(history: *const T, count: usize) -> Vec<Record> {
    let raw = unsafe { std::slice::from_raw_parts(history, count) };
    raw.iter().map(|h| unsafe { h.to_record() }).collect()
}

/// Normalize a raw history array identified by its value-type tag.
///
/// A null array or a non-positive count yields an empty batch. An
/// unknown tag is an invariant violation.
///
/// # Safety
/// For a known tag, `history` must be null or point to `count` values of
/// the struct matching that tag.
pub unsafe fn dispatch(
    tag: c_int,
    history: *const c_void,
    count: c_int,
) -> Result<HistoryBatch, ExportError> {
    let value_type = ValueType::try_from(tag)?;

    let count = usize::try_from(count).unwrap_or(0);
    if history.is_null() || count == 0 {
        return Ok(HistoryBatch { value_type, records: Vec::new() });
    }

    let records = unsafe {
        match value_type {
            ValueType::Float => normalize(history as *const ZbxHistoryFloat, count),
            ValueType::Integer => normalize(history as *const ZbxHistoryInteger, count),
            ValueType::String => normalize(history as *const ZbxHistoryString, count),
            ValueType::Text => normalize(history as *const ZbxHistoryText, count),
            ValueType::Log => normalize(history as *const ZbxHistoryLog, count),
        }
    };

    Ok(HistoryBatch { value_type, records })
}

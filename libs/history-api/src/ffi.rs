//! C layouts shared with the monitoring server's loadable-module interface.

use std::ffi::{c_char, c_int, CStr};

/// Module interface version the host checks via `zbx_module_api_version()`.
pub const ZBX_MODULE_API_VERSION: c_int = 2;

pub const ZBX_MODULE_OK: c_int = 0;
pub const ZBX_MODULE_FAIL: c_int = -1;

// ════════════════════════════════════════════════════════════════
//  History records
// ════════════════════════════════════════════════════════════════

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZbxHistoryFloat {
    pub itemid: u64,
    pub clock: c_int,
    pub ns: c_int,
    pub value: f64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZbxHistoryInteger {
    pub itemid: u64,
    pub clock: c_int,
    pub ns: c_int,
    pub value: u64,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZbxHistoryString {
    pub itemid: u64,
    pub clock: c_int,
    pub ns: c_int,
    pub value: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZbxHistoryText {
    pub itemid: u64,
    pub clock: c_int,
    pub ns: c_int,
    pub value: *const c_char,
}

#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZbxHistoryLog {
    pub itemid: u64,
    pub clock: c_int,
    pub ns: c_int,
    pub value: *const c_char,
    pub source: *const c_char,
    pub timestamp: c_int,
    pub logeventid: c_int,
    pub severity: c_int,
}

pub type HistoryFloatCb = unsafe extern "C" fn(*const ZbxHistoryFloat, c_int);
pub type HistoryIntegerCb = unsafe extern "C" fn(*const ZbxHistoryInteger, c_int);
pub type HistoryStringCb = unsafe extern "C" fn(*const ZbxHistoryString, c_int);
pub type HistoryTextCb = unsafe extern "C" fn(*const ZbxHistoryText, c_int);
pub type HistoryLogCb = unsafe extern "C" fn(*const ZbxHistoryLog, c_int);

/// Callback table returned by `zbx_module_history_write_cbs()`.
/// A null entry means the module ignores that value type.
#[repr(C)]
pub struct ZbxHistoryWriteCbs {
    pub history_float_cb: Option<HistoryFloatCb>,
    pub history_integer_cb: Option<HistoryIntegerCb>,
    pub history_string_cb: Option<HistoryStringCb>,
    pub history_text_cb: Option<HistoryTextCb>,
    pub history_log_cb: Option<HistoryLogCb>,
}

// ════════════════════════════════════════════════════════════════
//  Metadata query interface
// ════════════════════════════════════════════════════════════════

/// Filled in by the host's host-lookup callback. `host` is borrowed
/// for the duration of the call only.
#[repr(C)]
#[derive(Debug)]
pub struct ZbxHostInfo {
    pub hostid: u64,
    pub host: *const c_char,
}

impl Default for ZbxHostInfo {
    fn default() -> Self {
        Self { hostid: 0, host: std::ptr::null() }
    }
}

/// Filled in by the host's item-lookup callback. `key` is borrowed
/// for the duration of the call only.
#[repr(C)]
#[derive(Debug)]
pub struct ZbxItemInfo {
    pub key: *const c_char,
}

impl Default for ZbxItemInfo {
    fn default() -> Self {
        Self { key: std::ptr::null() }
    }
}

/// Returns non-zero when the item was found and `out` was filled.
pub type HostLookupFn = unsafe extern "C" fn(itemid: u64, out: *mut ZbxHostInfo) -> c_int;

/// Returns non-zero when the item was found and `out` was filled.
pub type ItemLookupFn = unsafe extern "C" fn(itemid: u64, out: *mut ZbxItemInfo) -> c_int;

// ════════════════════════════════════════════════════════════════
//  Helpers
// ════════════════════════════════════════════════════════════════

/// Copy a C string into an owned UTF-8 `String`.
///
/// Null reads as empty, invalid UTF-8 is replaced.
///
/// # Safety
/// `ptr` must be null or point to a NUL-terminated string valid for the call.
pub unsafe fn string_from_c(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::CString;

    #[test]
    fn null_string_reads_empty() {
        assert_eq!(unsafe { string_from_c(std::ptr::null()) }, "");
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let raw = CString::new(vec![b'o', b'k', 0xff]).unwrap();
        assert_eq!(unsafe { string_from_c(raw.as_ptr()) }, "ok\u{fffd}");
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn record_layouts_match_the_module_header() {
        assert_eq!(std::mem::size_of::<ZbxHistoryFloat>(), 24);
        assert_eq!(std::mem::size_of::<ZbxHistoryInteger>(), 24);
        assert_eq!(std::mem::offset_of!(ZbxHistoryLog, timestamp), 32);
    }
}

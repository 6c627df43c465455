use std::collections::HashMap;

use serde::Deserialize;

/// Host owning an item. Resolved per record, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HostInfo {
    #[serde(rename = "hostid")]
    pub host_id: u64,
    #[serde(rename = "host")]
    pub host_name: String,
}

/// Item configuration. Resolved per record, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ItemInfo {
    #[serde(rename = "key")]
    pub item_key: String,
}

/// Narrow query interface onto the host's configuration cache.
///
/// `None` means "not found": the exporter logs a warning and degrades
/// the affected JSON fields, it never fails the record.
pub trait MetadataResolver: Send + Sync {
    fn resolve_host(&self, item_id: u64) -> Option<HostInfo>;

    fn resolve_item(&self, item_id: u64) -> Option<ItemInfo>;
}

/// Resolver that knows nothing. Used until the host installs a real one.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMetadata;

impl MetadataResolver for NoMetadata {
    fn resolve_host(&self, _item_id: u64) -> Option<HostInfo> {
        None
    }

    fn resolve_item(&self, _item_id: u64) -> Option<ItemInfo> {
        None
    }
}

/// In-memory resolver keyed by item id.
///
/// JSON shape:
/// ```text
/// {"hosts": {"5": {"hostid": 10084, "host": "db01"}},
///  "items": {"5": {"key": "system.cpu.load"}}}
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataTable {
    #[serde(default)]
    pub hosts: HashMap<u64, HostInfo>,
    #[serde(default)]
    pub items: HashMap<u64, ItemInfo>,
}

impl MetadataTable {
    pub fn from_json(json: &str) -> Result<Self, crate::ExportError> {
        serde_json::from_str(json)
            .map_err(|e| crate::ExportError::metadata(format!("invalid metadata JSON: {e}")))
    }
}

impl MetadataResolver for MetadataTable {
    fn resolve_host(&self, item_id: u64) -> Option<HostInfo> {
        self.hosts.get(&item_id).cloned()
    }

    fn resolve_item(&self, item_id: u64) -> Option<ItemInfo> {
        self.items.get(&item_id).cloned()
    }
}

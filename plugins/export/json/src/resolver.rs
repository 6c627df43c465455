use history_api::ffi::{string_from_c, HostLookupFn, ItemLookupFn, ZbxHostInfo, ZbxItemInfo};
use history_api::{HostInfo, ItemInfo, MetadataResolver};

/// Metadata lookups answered by C callbacks installed by the host.
///
/// A missing callback answers "not found" for every item.
#[derive(Debug, Clone, Copy, Default)]
pub struct FfiMetadataResolver {
    host_lookup: Option<HostLookupFn>,
    item_lookup: Option<ItemLookupFn>,
}

impl FfiMetadataResolver {
    pub fn new(host_lookup: Option<HostLookupFn>, item_lookup: Option<ItemLookupFn>) -> Self {
        Self { host_lookup, item_lookup }
    }
}

impl MetadataResolver for FfiMetadataResolver {
    fn resolve_host(&self, item_id: u64) -> Option<HostInfo> {
        let lookup = self.host_lookup?;
        let mut out = ZbxHostInfo::default();
        // SAFETY: the host guarantees the callback is valid for the process
        // lifetime and that `out.host` stays valid until the call returns.
        unsafe {
            if lookup(item_id, &mut out) == 0 {
                return None;
            }
            Some(HostInfo { host_id: out.hostid, host_name: string_from_c(out.host) })
        }
    }

    fn resolve_item(&self, item_id: u64) -> Option<ItemInfo> {
        let lookup = self.item_lookup?;
        let mut out = ZbxItemInfo::default();
        // SAFETY: as above, for `out.key`.
        unsafe {
            if lookup(item_id, &mut out) == 0 {
                return None;
            }
            Some(ItemInfo { item_key: string_from_c(out.key) })
        }
    }
}

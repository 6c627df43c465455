use std::fmt;

use history_api::ExportError;

use crate::exporter::HistoryExporter;

/// Read-only items the module answers.
pub const ITEM_KEYS: [ItemKey; 2] = [
    ItemKey { key: "history2json.enable", description: "1 while JSON export is active" },
    ItemKey { key: "history2json.path", description: "Configured output directory" },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ItemKey {
    pub key: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    UInt64(u64),
    Str(String),
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryValue::UInt64(v) => write!(f, "{v}"),
            QueryValue::Str(s) => f.write_str(s),
        }
    }
}

impl HistoryExporter {
    pub fn query(&self, key: &str) -> Result<QueryValue, ExportError> {
        match key {
            "history2json.enable" => Ok(QueryValue::UInt64(u64::from(self.is_enabled()))),
            "history2json.path" => Ok(QueryValue::Str(self.output_path().to_string())),
            other => Err(ExportError::invariant(format!("unsupported item key '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use history_api::ErrorKind;

    use super::*;
    use crate::config::{ExportConfig, ExportSettings};

    fn exporter() -> HistoryExporter {
        HistoryExporter::new(ExportConfig::new(ExportSettings {
            enabled: true,
            output_path: "/srv/json".into(),
            ..Default::default()
        }))
    }

    #[test]
    fn every_declared_key_answers() {
        let exporter = exporter();
        for item in ITEM_KEYS {
            assert!(exporter.query(item.key).is_ok(), "{}", item.key);
        }
    }

    #[test]
    fn enable_tracks_sticky_flag() {
        let exporter = exporter();
        assert_eq!(exporter.query("history2json.enable").unwrap(), QueryValue::UInt64(1));
        exporter.config().disable();
        assert_eq!(exporter.query("history2json.enable").unwrap(), QueryValue::UInt64(0));
    }

    #[test]
    fn path_and_unknown_key() {
        let exporter = exporter();
        assert_eq!(exporter.query("history2json.path").unwrap().to_string(), "/srv/json");

        let err = exporter.query("history2json.size").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Invariant);
    }
}

use std::sync::atomic::{AtomicBool, Ordering};

use history_api::config::ConfigValues;
use history_api::{ConfigParams, ExportError};

// ════════════════════════════════════════════════════════════════
//  Settings
// ════════════════════════════════════════════════════════════════

/// Settings read from `history2json.conf`.
#[derive(Debug, Clone, PartialEq, ConfigParams)]
pub struct ExportSettings {
    #[param(key = "JSONOutputEnable", description = "Write history to JSON files")]
    pub enabled: bool,

    #[param(key = "JSONOutputPath", description = "Directory the JSON files are written to")]
    pub output_path: String,

    #[param(key = "JSONOutputFilenameBase", description = "Base name of the JSON files")]
    pub filename_base: String,

    #[param(key = "JSONOutputPID", description = "Add the writer's process id as 'pid'")]
    pub include_pid: bool,

    #[param(key = "JSONOutputHostinfo", description = "Add 'hostid' and 'host'")]
    pub include_host_info: bool,

    #[param(key = "JSONOutputIteminfo", description = "Add the item 'key'")]
    pub include_item_info: bool,

    #[param(key = "JSONOutputItemType", description = "Add the value 'type'")]
    pub include_type: bool,

    #[param(key = "JSONOutputSeparateDate", description = "One file per local date")]
    pub separate_by_date: bool,

    #[param(key = "JSONOutputSeparateType", description = "One file per value type")]
    pub separate_by_type: bool,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            output_path: "/var/log/zabbix/".to_string(),
            filename_base: "history".to_string(),
            include_pid: false,
            include_host_info: false,
            include_item_info: false,
            include_type: false,
            separate_by_date: false,
            separate_by_type: false,
        }
    }
}

// ════════════════════════════════════════════════════════════════
//  Snapshot
// ════════════════════════════════════════════════════════════════

/// Configuration snapshot shared by every export call.
///
/// Settings are frozen at construction. The only mutable part is the
/// enabled cell, which can go from `true` to `false` once and never back.
#[derive(Debug)]
pub struct ExportConfig {
    settings: ExportSettings,
    enabled: AtomicBool,
}

impl ExportConfig {
    pub fn new(settings: ExportSettings) -> Self {
        let enabled = AtomicBool::new(settings.enabled);
        Self { settings, enabled }
    }

    pub fn from_values(values: &ConfigValues) -> Result<Self, ExportError> {
        ExportSettings::from_config(values).map(Self::new)
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Sticky disable. Returns `true` only for the call that flipped the flag.
    pub fn disable(&self) -> bool {
        self.enabled.swap(false, Ordering::AcqRel)
    }

    pub fn output_path(&self) -> &str {
        &self.settings.output_path
    }
}

#[cfg(test)]
mod tests {
    use history_api::config::{ParamType, ParamValue};

    use super::*;

    #[test]
    fn declares_every_module_key() {
        let params = ExportSettings::config_params();
        let names: Vec<_> = params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(
            names,
            [
                "JSONOutputEnable",
                "JSONOutputPath",
                "JSONOutputFilenameBase",
                "JSONOutputPID",
                "JSONOutputHostinfo",
                "JSONOutputIteminfo",
                "JSONOutputItemType",
                "JSONOutputSeparateDate",
                "JSONOutputSeparateType",
            ]
        );
        assert!(params.iter().all(|p| !p.required));

        let path = &params[1];
        assert_eq!(path.param_type, ParamType::Str);
        assert_eq!(path.default, Some(ParamValue::Str("/var/log/zabbix/".into())));
    }

    #[test]
    fn reads_values_over_defaults() {
        let mut values = ConfigValues::new();
        values.set("JSONOutputEnable", ParamValue::Bool(true));
        values.set("JSONOutputFilenameBase", ParamValue::Str("h".into()));

        let config = ExportConfig::from_values(&values).unwrap();
        assert!(config.is_enabled());
        assert_eq!(config.settings().filename_base, "h");
        assert_eq!(config.output_path(), "/var/log/zabbix/");
        assert!(!config.settings().separate_by_date);
    }

    #[test]
    fn disable_is_one_way_and_reported_once() {
        let config = ExportConfig::new(ExportSettings { enabled: true, ..Default::default() });
        assert!(config.disable());
        assert!(!config.disable());
        assert!(!config.is_enabled());
        // The frozen settings still show what was configured.
        assert!(config.settings().enabled);
    }
}

use std::fmt::Write as _;
use std::path::Path;

use chrono::{Local, NaiveDate};
use history_api::ValueType;
use history_api::config::ConfigValues;
use history2json::{ExportConfig, ExportSettings, HistoryExporter};

use crate::config::CheckArgs;
use crate::error::CliError;

pub fn run(args: &CheckArgs) -> Result<(), CliError> {
    let path = args.source.path();
    let values = history_config_zbx::load(&path, &ExportSettings::config_params())?;
    let exporter = HistoryExporter::new(ExportConfig::from_values(&values)?);

    print!("{}", report(&path, &values, &exporter, Local::now().date_naive()));
    Ok(())
}

/// Effective settings, then today's target file per value type.
fn report(path: &Path, values: &ConfigValues, exporter: &HistoryExporter, today: NaiveDate) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}: OK", path.display());
    for param in ExportSettings::config_params() {
        let value = values.get(&param.name).map(ToString::to_string).unwrap_or_default();
        let _ = writeln!(out, "  {}={}", param.name, value);
    }
    for value_type in ValueType::ALL {
        let target = exporter.path_for(value_type, today);
        let _ = writeln!(out, "  {:<7} -> {}", value_type.as_str(), target.display());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_effective_values_and_targets() {
        let content = "JSONOutputEnable=1\nJSONOutputPath=/srv/json\nJSONOutputSeparateDate=1\n";
        let values = history_config_zbx::parse(content, "test.conf", &ExportSettings::config_params()).unwrap();
        let exporter = HistoryExporter::new(ExportConfig::from_values(&values).unwrap());
        let day = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();

        let text = report(Path::new("test.conf"), &values, &exporter, day);
        assert!(text.starts_with("test.conf: OK\n"));
        assert!(text.contains("  JSONOutputEnable=1\n"));
        assert!(text.contains("  JSONOutputFilenameBase=history\n"));
        assert!(text.contains("  JSONOutputPID=0\n"));
        assert!(text.contains("  log     -> /srv/json/history.2024-01-02\n"));
    }
}

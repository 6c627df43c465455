use std::path::PathBuf;

use chrono::NaiveDate;
use history_api::ValueType;

use crate::config::ExportSettings;

/// Output file for one batch:
/// `{output_path}/{filename_base}[.{type}][.{YYYY-MM-DD}]`.
///
/// Pure: the caller supplies the local date. The type suffix always
/// precedes the date suffix. Computed once per batch, so a batch that
/// straddles local midnight lands entirely in the earlier day's file.
pub fn target_path(settings: &ExportSettings, value_type: ValueType, today: NaiveDate) -> PathBuf {
    let mut path = format!("{}/{}", settings.output_path, settings.filename_base);
    if settings.separate_by_type {
        path.push('.');
        path.push_str(value_type.as_str());
    }
    if settings.separate_by_date {
        path.push_str(&today.format(".%Y-%m-%d").to_string());
    }
    PathBuf::from(path)
}

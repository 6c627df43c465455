//! Loader for the module's `Key=Value` configuration file.
//!
//! ```text
//! # history2json.conf
//! JSONOutputEnable=1
//! JSONOutputPath=/var/log/zabbix
//! JSONOutputSeparateDate=1
//! ```
//!
//! Parsing is strict: undeclared keys and repeated keys are errors.
//! Declared keys absent from the file take their declared default.

use std::path::{Path, PathBuf};

use history_api::config::{ConfigParam, ConfigValues, ParamType, ParamValue};
use history_api::ExportError;

/// File name looked up inside the module directory.
pub const MODULE_CONFIG_FILE_NAME: &str = "history2json.conf";

/// Environment variable overriding the module directory.
pub const MODULE_PATH_ENV: &str = "HISTORY2JSON_MODULE_PATH";

pub const DEFAULT_MODULE_PATH: &str = "/usr/lib/zabbix/modules";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{path}:{line}: {detail}")]
    Syntax { path: String, line: usize, detail: String },

    #[error("{path}:{line}: unknown parameter '{key}'")]
    UnknownKey { path: String, line: usize, key: String },

    #[error("{path}:{line}: parameter '{key}' specified more than once")]
    Duplicate { path: String, line: usize, key: String },

    #[error("{path}:{line}: parameter '{key}': {detail}")]
    InvalidValue { path: String, line: usize, key: String, detail: String },

    #[error("missing required parameter '{key}'")]
    MissingRequired { key: String },
}

impl From<ConfigError> for ExportError {
    fn from(e: ConfigError) -> Self {
        ExportError::config(e.to_string())
    }
}

/// Resolve `{module_dir}/history2json.conf`.
///
/// `module_dir` wins over `$HISTORY2JSON_MODULE_PATH`, which wins over
/// [`DEFAULT_MODULE_PATH`].
pub fn module_config_path(module_dir: Option<&str>) -> PathBuf {
    let dir = match module_dir {
        Some(dir) => dir.to_string(),
        None => std::env::var(MODULE_PATH_ENV).unwrap_or_else(|_| DEFAULT_MODULE_PATH.to_string()),
    };
    Path::new(&dir).join(MODULE_CONFIG_FILE_NAME)
}

/// Load and validate a config file. The file is required.
pub fn load(path: &Path, params: &[ConfigParam]) -> Result<ConfigValues, ConfigError> {
    let origin = path.display().to_string();
    tracing::info!(path = %origin, "loading module configuration");
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: origin.clone(),
        source,
    })?;
    parse(&content, &origin, params)
}

/// Parse config text. `origin` only labels error messages.
pub fn parse(content: &str, origin: &str, params: &[ConfigParam]) -> Result<ConfigValues, ConfigError> {
    let mut values = parse_lines(content, origin, params)?;
    fill_defaults(&mut values, params)?;
    Ok(values)
}

fn parse_lines(
    content: &str,
    origin: &str,
    params: &[ConfigParam],
) -> Result<ConfigValues, ConfigError> {
    let mut result = ConfigValues::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = idx + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let Some((key, value)) = trimmed.split_once('=') else {
            return Err(ConfigError::Syntax {
                path: origin.to_string(),
                line,
                detail: format!("expected 'Key=Value', got '{trimmed}'"),
            });
        };
        let key = key.trim();
        let value = value.trim();
        if key.is_empty() {
            return Err(ConfigError::Syntax {
                path: origin.to_string(),
                line,
                detail: "missing parameter name".into(),
            });
        }

        let Some(param) = params.iter().find(|p| p.name == key) else {
            return Err(ConfigError::UnknownKey {
                path: origin.to_string(),
                line,
                key: key.to_string(),
            });
        };

        if result.get(key).is_some() {
            return Err(ConfigError::Duplicate {
                path: origin.to_string(),
                line,
                key: key.to_string(),
            });
        }

        let pv = parse_value(value, param.param_type).map_err(|detail| ConfigError::InvalidValue {
            path: origin.to_string(),
            line,
            key: key.to_string(),
            detail,
        })?;
        result.set(key, pv);
    }

    Ok(result)
}

/// Convert a single raw value according to the declared type.
fn parse_value(raw: &str, param_type: ParamType) -> Result<ParamValue, String> {
    match param_type {
        ParamType::Bool => match raw {
            "0" => Ok(ParamValue::Bool(false)),
            "1" => Ok(ParamValue::Bool(true)),
            other => Err(format!("value '{other}' out of range 0..1")),
        },
        ParamType::I64 => raw
            .parse::<i64>()
            .map(ParamValue::I64)
            .map_err(|_| format!("expected integer, got '{raw}'")),
        ParamType::U64 => raw
            .parse::<u64>()
            .map(ParamValue::U64)
            .map_err(|_| format!("expected non-negative integer, got '{raw}'")),
        ParamType::Str => Ok(ParamValue::Str(raw.to_string())),
    }
}

/// Give every declared key the file left out its default. A key with no
/// default must be present when it is `required`.
fn fill_defaults(values: &mut ConfigValues, params: &[ConfigParam]) -> Result<(), ConfigError> {
    for param in params {
        if values.get(&param.name).is_some() {
            continue;
        }
        match &param.default {
            Some(default) => {
                tracing::debug!(key = %param.name, default = %default, "using default");
                values.set(param.name.as_str(), default.clone());
            }
            None if param.required => {
                return Err(ConfigError::MissingRequired { key: param.name.clone() });
            }
            None => {}
        }
    }
    Ok(())
}

use std::collections::BTreeMap;

/// Parameter type for module configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    /// Integer switch written as `0` or `1` in the config file.
    Bool,
    I64,
    U64,
    Str,
}

/// Declaration of a single config parameter.
///
/// Generated by `#[derive(ConfigParams)]`. The loader validates the
/// config file against these BEFORE the settings struct is built.
#[derive(Debug, Clone)]
pub struct ConfigParam {
    /// Key as it appears in the config file, e.g. `JSONOutputEnable`.
    pub name: String,
    pub param_type: ParamType,
    pub required: bool,
    pub default: Option<ParamValue>,
    pub description: String,
}

/// Typed config value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    Str(String),
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(v) => write!(f, "{}", u8::from(*v)),
            ParamValue::I64(v) => write!(f, "{v}"),
            ParamValue::U64(v) => write!(f, "{v}"),
            ParamValue::Str(v) => f.write_str(v),
        }
    }
}

impl ParamValue {
    pub fn param_type(&self) -> ParamType {
        match self {
            ParamValue::Bool(_) => ParamType::Bool,
            ParamValue::I64(_) => ParamType::I64,
            ParamValue::U64(_) => ParamType::U64,
            ParamValue::Str(_) => ParamType::Str,
        }
    }
}

/// Values that passed validation, keyed by parameter name.
///
/// Typed getters answer `None` for an absent key and for a value of
/// another type.
#[derive(Debug, Clone, Default)]
pub struct ConfigValues {
    by_name: BTreeMap<String, ParamValue>,
}

impl ConfigValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: ParamValue) {
        self.by_name.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.by_name.get(name)
    }

    /// In name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.by_name.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn get_bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(|v| match v {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        })
    }

    pub fn get_i64(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(|v| match v {
            ParamValue::I64(n) => Some(*n),
            _ => None,
        })
    }

    /// Also accepts a non-negative `I64`.
    pub fn get_u64(&self, name: &str) -> Option<u64> {
        self.get(name).and_then(|v| match v {
            ParamValue::U64(n) => Some(*n),
            ParamValue::I64(n) => u64::try_from(*n).ok(),
            _ => None,
        })
    }

    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| match v {
            ParamValue::Str(s) => Some(s.as_str()),
            _ => None,
        })
    }
}

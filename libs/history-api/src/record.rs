use crate::error::ExportError;

/// Value type of a history record. The discriminant is the tag the
/// module callbacks pass to the generic handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Float = 1,
    Integer = 2,
    String = 3,
    Text = 4,
    Log = 5,
}

impl ValueType {
    pub const ALL: [ValueType; 5] = [
        ValueType::Float,
        ValueType::Integer,
        ValueType::String,
        ValueType::Text,
        ValueType::Log,
    ];

    /// Name used in file suffixes and in the `type` JSON field.
    pub fn as_str(self) -> &'static str {
        match self {
            ValueType::Float => "float",
            ValueType::Integer => "integer",
            ValueType::String => "string",
            ValueType::Text => "text",
            ValueType::Log => "log",
        }
    }

    pub fn tag(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for ValueType {
    type Error = ExportError;

    fn try_from(tag: i32) -> Result<Self, Self::Error> {
        match tag {
            1 => Ok(ValueType::Float),
            2 => Ok(ValueType::Integer),
            3 => Ok(ValueType::String),
            4 => Ok(ValueType::Text),
            5 => Ok(ValueType::Log),
            other => Err(ExportError::invariant(format!("unknown value type tag {other}"))),
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ValueType {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ValueType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| ExportError::invariant(format!("unknown value type '{s}'")))
    }
}

/// Log-specific payload. Only log records carry these fields.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub value: String,
    pub source: String,
    pub timestamp: i64,
    pub event_id: i64,
    pub severity: i64,
}

/// Record value. Exactly one member is populated, selected by the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryValue {
    Float(f64),
    Integer(u64),
    String(String),
    Text(String),
    Log(LogEntry),
}

impl HistoryValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            HistoryValue::Float(_) => ValueType::Float,
            HistoryValue::Integer(_) => ValueType::Integer,
            HistoryValue::String(_) => ValueType::String,
            HistoryValue::Text(_) => ValueType::Text,
            HistoryValue::Log(_) => ValueType::Log,
        }
    }
}

/// Normalized history record.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub item_id: u64,
    /// Epoch seconds.
    pub clock: i64,
    pub ns: i32,
    pub value: HistoryValue,
}

impl Record {
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }
}

/// One callback's worth of same-typed records.
///
/// Batches are built per flush cycle and never retained.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryBatch {
    pub value_type: ValueType,
    pub records: Vec<Record>,
}

impl HistoryBatch {
    /// Build a batch, rejecting records whose type differs from `value_type`.
    pub fn new(value_type: ValueType, records: Vec<Record>) -> Result<Self, ExportError> {
        if let Some(bad) = records.iter().find(|r| r.value_type() != value_type) {
            return Err(ExportError::invariant(format!(
                "{} record for item {} in a {value_type} batch",
                bad.value_type(),
                bad.item_id
            )));
        }
        Ok(Self { value_type, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

use std::sync::Arc;

/// An owned column or parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    Bool(bool),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    #[cfg(feature = "with-rust-decimal")]
    Decimal(rust_decimal::Decimal),
    /// Text; short strings may be shared with the value cache
    Str(Arc<str>),
    Bytes(Vec<u8>),
    Date(Date),
    Time(Time),
    Timestamp(Timestamp),
}

impl Value {
    /// Build a string value, reusing an interned instance when one exists
    pub fn string(s: &str) -> Self {
        Value::Str(crate::cache::shared_str(s))
    }

    pub fn parameter_type(&self) -> ParameterType {
        match self {
            Value::Null => ParameterType::Null,
            Value::Bool(_) => ParameterType::Bool,
            Value::Byte(_) => ParameterType::Byte,
            Value::Short(_) => ParameterType::Short,
            Value::Int(_) => ParameterType::Int,
            Value::Long(_) => ParameterType::Long,
            Value::Float(_) => ParameterType::Float,
            Value::Double(_) => ParameterType::Double,
            #[cfg(feature = "with-rust-decimal")]
            Value::Decimal(_) => ParameterType::Decimal,
            Value::Str(_) => ParameterType::String,
            Value::Bytes(_) => ParameterType::Bytes,
            Value::Date(_) => ParameterType::Date,
            Value::Time(_) => ParameterType::Time,
            Value::Timestamp(_) => ParameterType::Timestamp,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Tag of a value held by a parameter slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterType {
    Null,
    Bool,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Decimal,
    String,
    Bytes,
    Date,
    Time,
    Timestamp,
}

/// Calendar date
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Date {
    pub year: u16,
    pub month: u8,
    pub day: u8,
}

/// Time of day with microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Time {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub microsecond: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    pub date: Date,
    pub time: Time,
}

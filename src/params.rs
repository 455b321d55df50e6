use crate::error::{Error, Result};
use crate::value::{ParameterType, Value};

/// Fixed-size container of statement parameter values, indexed from zero
///
/// A slot stays unset until a value (possibly `Value::Null`) is assigned.
/// Execution requires every slot to be set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: Vec<Option<Value>>,
}

impl Parameters {
    pub fn new(count: usize) -> Self {
        Self {
            values: vec![None; count],
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn set(&mut self, index: usize, value: Value) -> Result<()> {
        let count = self.values.len();
        let slot = self.values.get_mut(index).ok_or_else(|| {
            Error::BadUsageError(format!(
                "parameter index {} out of range for {} parameters",
                index, count
            ))
        })?;
        *slot = Some(value);
        Ok(())
    }

    pub fn set_null(&mut self, index: usize) -> Result<()> {
        self.set(index, Value::Null)
    }

    pub fn set_bool(&mut self, index: usize, value: bool) -> Result<()> {
        self.set(index, Value::Bool(value))
    }

    pub fn set_byte(&mut self, index: usize, value: i8) -> Result<()> {
        self.set(index, Value::Byte(value))
    }

    pub fn set_short(&mut self, index: usize, value: i16) -> Result<()> {
        self.set(index, Value::Short(value))
    }

    pub fn set_int(&mut self, index: usize, value: i32) -> Result<()> {
        self.set(index, Value::Int(value))
    }

    pub fn set_long(&mut self, index: usize, value: i64) -> Result<()> {
        self.set(index, Value::Long(value))
    }

    pub fn set_float(&mut self, index: usize, value: f32) -> Result<()> {
        self.set(index, Value::Float(value))
    }

    pub fn set_double(&mut self, index: usize, value: f64) -> Result<()> {
        self.set(index, Value::Double(value))
    }

    #[cfg(feature = "with-rust-decimal")]
    pub fn set_decimal(&mut self, index: usize, value: rust_decimal::Decimal) -> Result<()> {
        self.set(index, Value::Decimal(value))
    }

    pub fn set_string(&mut self, index: usize, value: &str) -> Result<()> {
        self.set(index, Value::string(value))
    }

    pub fn get(&self, index: usize) -> Result<&Value> {
        match self.values.get(index) {
            Some(Some(value)) => Ok(value),
            Some(None) => Err(Error::BadUsageError(format!(
                "parameter {} is not set",
                index
            ))),
            None => Err(Error::BadUsageError(format!(
                "parameter index {} out of range for {} parameters",
                index,
                self.values.len()
            ))),
        }
    }

    pub fn parameter_type(&self, index: usize) -> Result<ParameterType> {
        self.get(index).map(Value::parameter_type)
    }

    pub fn is_set(&self, index: usize) -> bool {
        matches!(self.values.get(index), Some(Some(_)))
    }

    pub fn are_all_set(&self) -> bool {
        self.values.iter().all(Option::is_some)
    }

    /// Reset every slot to unset
    pub fn clear(&mut self) {
        self.values.fill(None);
    }

    /// Deep copy every slot of `source` into `self`
    pub fn copy_from(&mut self, source: &Parameters) -> Result<()> {
        if source.len() != self.len() {
            return Err(Error::BadUsageError(format!(
                "cannot copy {} parameters into a container of {}",
                source.len(),
                self.len()
            )));
        }
        self.values.clone_from_slice(&source.values);
        Ok(())
    }

    /// Address of the slot storage, identifying a container across the pool
    #[cfg(test)]
    pub(crate) fn storage_id(&self) -> usize {
        self.values.as_ptr() as usize
    }

    /// All values, failing on the first unset slot
    pub fn values(&self) -> Result<Vec<&Value>> {
        (0..self.values.len()).map(|i| self.get(i)).collect()
    }
}

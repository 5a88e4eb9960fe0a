use four_cc::FourCC;
use strum::IntoEnumIterator;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// An enum parameter descriptor. Values are addressed by their index in the enum's
/// iteration order.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumParameter {
    id: FourCC,
    name: &'static str,
    values: Vec<String>,
    default_index: usize,
}

impl EnumParameter {
    pub fn new<E: IntoEnumIterator + ToString + PartialEq>(
        id: FourCC,
        name: &'static str,
        default: E,
    ) -> Self {
        let values = E::iter().map(|v| v.to_string()).collect::<Vec<_>>();
        let default_index = E::iter().position(|r| r == default).unwrap_or(0);
        Self {
            id,
            name,
            values,
            default_index,
        }
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn default_index(&self) -> usize {
        self.default_index
    }

    /// Index of the given value string, if it's a valid enum value.
    pub fn index_of(&self, value: &str) -> Option<usize> {
        self.values.iter().position(|v| v == value)
    }

    /// Whether the given index addresses a value.
    pub fn contains(&self, index: i32) -> bool {
        index >= 0 && (index as usize) < self.values.len()
    }

    /// Values below the first index wrap to the last one and vice versa.
    pub fn wrap_index(&self, index: i32) -> usize {
        if index < 0 {
            self.values.len().saturating_sub(1)
        } else if index as usize >= self.values.len() {
            0
        } else {
            index as usize
        }
    }

    pub fn value_to_string(&self, index: usize) -> String {
        self.values
            .get(index)
            .unwrap_or(&self.values[self.default_index])
            .clone()
    }
}

impl Parameter for EnumParameter {
    fn id(&self) -> FourCC {
        self.id
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn parameter_type(&self) -> ParameterType {
        ParameterType::Enum {
            values: self.values.clone(),
            default_index: self.default_index,
        }
    }
}

// -------------------------------------------------------------------------------------------------

use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// A discrete (integer) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct IntegerParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<i32>,
    default: i32,
    width: usize,
    zero_padded: bool,
    signed: bool,
}

impl IntegerParameter {
    pub fn new(id: FourCC, name: &'static str, range: RangeInclusive<i32>, default: i32) -> Self {
        assert!(range.contains(&default), "Invalid parameter default value");
        Self {
            id,
            name,
            range,
            default,
            width: 0,
            zero_padded: false,
            signed: false,
        }
    }

    /// Minimum width of formatted values, optionally padded with zeros.
    pub fn with_width(mut self, width: usize, zero_padded: bool) -> Self {
        self.width = width;
        self.zero_padded = zero_padded;
        self
    }

    /// Always show a `+` or `-` sign in formatted values.
    pub fn with_sign(mut self) -> Self {
        self.signed = true;
        self
    }

    pub fn range(&self) -> &RangeInclusive<i32> {
        &self.range
    }

    pub fn default_value(&self) -> i32 {
        self.default
    }

    pub fn clamp_value(&self, value: i32) -> i32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Values below the range wrap to the range end and values above it to the range start.
    pub fn wrap_value(&self, value: i32) -> i32 {
        if value < *self.range.start() {
            *self.range.end()
        } else if value > *self.range.end() {
            *self.range.start()
        } else {
            value
        }
    }

    pub fn value_to_string(&self, value: i32) -> String {
        let width = self.width;
        match (self.signed, self.zero_padded) {
            (true, true) => format!("{value:+0width$}"),
            (true, false) => format!("{value:+width$}"),
            (false, true) => format!("{value:0width$}"),
            (false, false) => format!("{value:width$}"),
        }
    }

    pub fn string_to_value(&self, string: &str) -> Option<i32> {
        let value = string.trim().parse::<i32>().ok()?;
        Some(self.clamp_value(value))
    }
}

impl Parameter for IntegerParameter {
    fn id(&self) -> FourCC {
        self.id
    }
    fn name(&self) -> &'static str {
        self.name
    }
    fn parameter_type(&self) -> ParameterType {
        ParameterType::Integer {
            range: self.range.clone(),
            default: self.default,
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_and_wrap() {
        let sound = IntegerParameter::new(FourCC(*b"snd "), "Sound", 0..=999, 0).with_width(3, true);
        assert_eq!(sound.value_to_string(7), "007");
        assert_eq!(sound.wrap_value(-1), 999);
        assert_eq!(sound.wrap_value(1000), 0);
        assert_eq!(sound.string_to_value(" 42 "), Some(42));

        let keysense = IntegerParameter::new(FourCC(*b"ksns"), "Key Sense", -9..=9, 0)
            .with_width(3, false)
            .with_sign();
        assert_eq!(keysense.value_to_string(3), " +3");
        assert_eq!(keysense.value_to_string(-9), " -9");
        assert_eq!(keysense.clamp_value(12), 9);
    }
}

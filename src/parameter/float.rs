use std::ops::RangeInclusive;

use four_cc::FourCC;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// A continuous (float) parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FloatParameter {
    id: FourCC,
    name: &'static str,
    range: RangeInclusive<f32>,
    default: f32,
    /// Minimum width of the formatted value.
    width: usize,
    /// Number of decimals in formatted values. Values get quantized to this precision too.
    precision: usize,
    /// Always show a sign in formatted values.
    signed: bool,
    unit: &'static str,
}

impl FloatParameter {
    /// Create a new float parameter descriptor.
    pub fn new(id: FourCC, name: &'static str, range: RangeInclusive<f32>, default: f32) -> Self {
        assert!(
            default >= *range.start() && default <= *range.end(),
            "Invalid parameter default value"
        );
        Self {
            id,
            name,
            range,
            default,
            width: 0,
            precision: 2,
            signed: false,
            unit: "",
        }
    }

    /// Set the minimum width and number of decimals of formatted values.
    pub fn with_format(mut self, width: usize, precision: usize) -> Self {
        self.width = width;
        self.precision = precision;
        self
    }

    /// Always show a `+` or `-` sign in formatted values.
    pub fn with_sign(mut self) -> Self {
        self.signed = true;
        self
    }

    /// Optional unit for string displays.
    pub fn with_unit(mut self, unit: &'static str) -> Self {
        self.unit = unit;
        self
    }

    /// The parameter's value range.
    pub fn range(&self) -> &RangeInclusive<f32> {
        &self.range
    }

    /// The parameter's default value.
    pub fn default_value(&self) -> f32 {
        self.default
    }

    /// Number of decimals of the parameter.
    pub fn precision(&self) -> usize {
        self.precision
    }

    /// Clamp the given plain value to the parameter's range.
    pub fn clamp_value(&self, value: f32) -> f32 {
        value.clamp(*self.range.start(), *self.range.end())
    }

    /// Round the given value to the parameter's precision, then wrap values which run out of
    /// the range around to the opposite range end.
    pub fn wrap_value(&self, value: f32) -> f32 {
        let scale = 10f32.powi(self.precision as i32);
        let value = (value * scale).round() / scale;
        if value < *self.range.start() {
            *self.range.end()
        } else if value > *self.range.end() {
            *self.range.start()
        } else {
            value
        }
    }

    /// Convert the given plain value to a string.
    pub fn value_to_string(&self, value: f32, include_unit: bool) -> String {
        let (width, precision) = (self.width, self.precision);
        let string = if self.signed {
            format!("{value:+width$.precision$}")
        } else {
            format!("{value:width$.precision$}")
        };
        if include_unit && !self.unit.is_empty() {
            format!("{} {}", string, self.unit)
        } else {
            string
        }
    }

    /// Convert the given string to a plain value. Returns `None` when the string can not be
    /// parsed, else a clamped value.
    pub fn string_to_value(&self, string: &str) -> Option<f32> {
        let mut string = string.trim();
        if !self.unit.is_empty() {
            string = string.trim_end_matches(self.unit).trim_end();
        }
        let value = string.parse().ok()?;
        Some(self.clamp_value(value))
    }
}

impl Parameter for FloatParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Float {
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
    fn format() {
        let param = FloatParameter::new(FourCC(*b"port"), "Portamento", -5.0..=5.0, 0.0)
            .with_format(6, 3)
            .with_sign();
        assert_eq!(param.value_to_string(1.5, true), "+1.500");
        assert_eq!(param.value_to_string(-0.25, true), "-0.250");
        let param = FloatParameter::new(FourCC(*b"atck"), "Attack", 0.0..=9.99, 0.2)
            .with_format(4, 2)
            .with_unit("s");
        assert_eq!(param.value_to_string(0.2, false), "0.20");
        assert_eq!(param.value_to_string(0.2, true), "0.20 s");
        assert_eq!(param.string_to_value("12.5 s"), Some(9.99));
        assert_eq!(param.string_to_value("abc"), None);
    }

    #[test]
    fn wrap_around() {
        let param = FloatParameter::new(FourCC(*b"fact"), "Factor", 0.0..=1.0, 1.0)
            .with_format(3, 1);
        assert_eq!(param.wrap_value(0.9 + 0.1), 1.0);
        assert_eq!(param.wrap_value(1.0 + 0.1), 0.0);
        assert_eq!(param.wrap_value(0.0 - 0.1), 1.0);
        assert_eq!(param.wrap_value(0.30000004), 0.3);
    }
}

use four_cc::FourCC;

use super::{Parameter, ParameterType};

// -------------------------------------------------------------------------------------------------

/// Characters a text parameter cycles through, in editing order.
const CHARACTERS: &str = " 0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

// -------------------------------------------------------------------------------------------------

/// A fixed length text parameter descriptor, e.g. a sound name.
#[derive(Debug, Clone, PartialEq)]
pub struct TextParameter {
    id: FourCC,
    name: &'static str,
    max_length: usize,
    default: &'static str,
}

impl TextParameter {
    pub const fn new(
        id: FourCC,
        name: &'static str,
        max_length: usize,
        default: &'static str,
    ) -> Self {
        Self {
            id,
            name,
            max_length,
            default,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn default_value(&self) -> &'static str {
        self.default
    }

    /// Truncate the given text to the maximum length.
    pub fn clamp_value(&self, text: &str) -> String {
        text.chars().take(self.max_length).collect()
    }

    /// Pad the given text with spaces to the maximum length.
    pub fn pad(&self, text: &str) -> String {
        let mut padded = self.clamp_value(text);
        let length = padded.chars().count();
        padded.extend(std::iter::repeat(' ').take(self.max_length - length));
        padded
    }

    /// Move the character at `cursor` by `step` positions through the editable character set.
    /// Characters outside of the set and cursors behind the maximum length are left untouched.
    pub fn rotate_character(&self, text: &str, cursor: usize, step: i32) -> String {
        let mut chars = self.pad(text).chars().collect::<Vec<_>>();
        if let Some(ch) = chars.get_mut(cursor) {
            if let Some(index) = CHARACTERS.chars().position(|c| c == *ch) {
                let count = CHARACTERS.chars().count() as i32;
                let index = (index as i32 + step).rem_euclid(count) as usize;
                if let Some(next) = CHARACTERS.chars().nth(index) {
                    *ch = next;
                }
            }
        }
        chars.into_iter().collect()
    }
}

impl Parameter for TextParameter {
    fn id(&self) -> FourCC {
        self.id
    }

    fn name(&self) -> &'static str {
        self.name
    }

    fn parameter_type(&self) -> ParameterType {
        ParameterType::Text {
            max_length: self.max_length,
        }
    }
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_editing() {
        let param = TextParameter::new(FourCC(*b"name"), "Name", 12, "NO NAME");
        assert_eq!(param.pad("PIANO"), "PIANO       ");
        assert_eq!(param.clamp_value("A VERY LONG NAME"), "A VERY LONG ");
        assert_eq!(param.rotate_character("PIANO", 0, 1), "QIANO       ");
        assert_eq!(param.rotate_character("PIANO", 5, 1), "PIANO0      ");
        assert_eq!(param.rotate_character("z", 0, 1), "            ");
        assert_eq!(param.rotate_character(" ", 0, -1), "z           ");
        assert_eq!(param.rotate_character("A-B", 1, 1), "A-B         ");
        assert_eq!(param.rotate_character("AB", 20, 1), "AB          ");
    }
}

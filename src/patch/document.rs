use crate::Error;

use super::{ParameterRef, PatchValue, SoundPatch};

// -------------------------------------------------------------------------------------------------

/// A flat, ordered key/value document of a patch, as exchanged with a
/// [`PatchStorage`](super::PatchStorage).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatchDocument {
    entries: Vec<(String, PatchValue)>,
}

impl PatchDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&PatchValue> {
        self.entries
            .iter()
            .find_map(|(k, value)| (k == key).then_some(value))
    }

    /// Insert or replace a value. New keys are appended.
    pub fn insert(&mut self, key: impl Into<String>, value: PatchValue) {
        let key = key.into();
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PatchValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PatchValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

// -------------------------------------------------------------------------------------------------

impl SoundPatch {
    /// Serialize all patch values into a document.
    pub fn to_document(&self) -> PatchDocument {
        let mut document = PatchDocument::new();
        for parameter in ParameterRef::all() {
            if let Some(value) = self.value(parameter) {
                document.insert(parameter.key(), value);
            }
        }
        document
    }

    /// Create a patch from a document. Missing, unknown or invalid fields are logged and
    /// fall back to their default values, all other fields get applied.
    pub fn from_document(document: &PatchDocument) -> Self {
        let mut patch = Self::default();
        for (key, value) in document.iter() {
            let Some(parameter) = ParameterRef::from_key(key) else {
                log::warn!("Ignoring unknown patch field '{key}'");
                continue;
            };
            if let Err(err) = patch.set_value(parameter, value.clone()) {
                log::warn!("Using default value for patch field '{key}': {err}");
            }
        }
        let missing = ParameterRef::all()
            .into_iter()
            .filter(|parameter| document.get(&parameter.key()).is_none())
            .count();
        if missing > 0 {
            log::warn!("{missing} patch field(s) missing, using defaults");
        }
        patch
    }

    /// Like [`from_document`](Self::from_document), but rejects documents which contain no
    /// known patch field at all.
    pub fn try_from_document(document: &PatchDocument) -> Result<Self, Error> {
        if !document
            .iter()
            .any(|(key, _)| ParameterRef::from_key(key).is_some())
        {
            return Err(Error::PatchError(
                "Document contains no patch fields".to_string(),
            ));
        }
        Ok(Self::from_document(document))
    }
}

// -------------------------------------------------------------------------------------------------

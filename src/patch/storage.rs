use std::collections::HashMap;

use crate::Error;

use super::{ParameterRef, PatchDocument, PatchValue, SoundField};

// -------------------------------------------------------------------------------------------------

/// Persists patch documents in banks of sound slots.
pub trait PatchStorage {
    /// Load the patch document of the given bank and sound slot.
    fn load(&mut self, bank: u8, sound: u16) -> Result<PatchDocument, Error>;

    /// Save a patch document to the given bank and sound slot.
    fn save(&mut self, bank: u8, sound: u16, document: &PatchDocument) -> Result<(), Error>;

    /// Name of the sound stored in the given slot, if any.
    fn sound_name(&mut self, bank: u8, sound: u16) -> Option<String> {
        let document = self.load(bank, sound).ok()?;
        match document.get(&ParameterRef::Sound(SoundField::Name).key()) {
            Some(PatchValue::Text(name)) => Some(name.clone()),
            _ => None,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// Keeps patch documents in memory. Can simulate an unavailable storage device.
#[derive(Debug, Clone)]
pub struct MemoryPatchStorage {
    documents: HashMap<(u8, u16), PatchDocument>,
    available: bool,
}

impl MemoryPatchStorage {
    pub fn new() -> Self {
        Self {
            documents: HashMap::new(),
            available: true,
        }
    }

    /// Number of stored patches.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Make all following loads and saves fail (or succeed again).
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    fn check_available(&self) -> Result<(), Error> {
        if self.available {
            Ok(())
        } else {
            Err(Error::StorageError("Storage is not available".to_string()))
        }
    }
}

impl Default for MemoryPatchStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl PatchStorage for MemoryPatchStorage {
    fn load(&mut self, bank: u8, sound: u16) -> Result<PatchDocument, Error> {
        self.check_available()?;
        self.documents
            .get(&(bank, sound))
            .cloned()
            .ok_or_else(|| Error::StorageError(format!("No sound {sound:03} in bank {bank}")))
    }

    fn save(&mut self, bank: u8, sound: u16, document: &PatchDocument) -> Result<(), Error> {
        self.check_available()?;
        self.documents.insert((bank, sound), document.clone());
        Ok(())
    }
}

// -------------------------------------------------------------------------------------------------

use std::collections::{HashMap, VecDeque};

use super::{Voice, VoiceKey};

// -------------------------------------------------------------------------------------------------

/// Maps voice keys to active voices and keeps their note-on order for voice stealing.
#[derive(Debug, Clone)]
pub struct VoiceAllocator {
    voices: HashMap<VoiceKey, Voice>,
    /// Most recent note-on first.
    stack: VecDeque<VoiceKey>,
    max_voices: usize,
}

impl VoiceAllocator {
    pub fn new(max_voices: usize) -> Self {
        Self {
            voices: HashMap::with_capacity(max_voices),
            stack: VecDeque::with_capacity(max_voices),
            max_voices: max_voices.max(1),
        }
    }

    pub fn max_voices(&self) -> usize {
        self.max_voices
    }

    pub fn len(&self) -> usize {
        self.voices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    pub fn contains(&self, key: VoiceKey) -> bool {
        self.voices.contains_key(&key)
    }

    pub fn get(&self, key: VoiceKey) -> Option<&Voice> {
        self.voices.get(&key)
    }

    /// Active voice keys, most recent note-on first.
    pub fn keys(&self) -> impl Iterator<Item = VoiceKey> + '_ {
        self.stack.iter().copied()
    }

    pub fn voices_mut(&mut self) -> impl Iterator<Item = &mut Voice> {
        self.voices.values_mut()
    }

    /// Make room for a new voice with the given key: removes an already playing voice with the
    /// same key, or the oldest voice when all voices are in use. Returns the removed voice,
    /// which the caller needs to release.
    pub fn make_room(&mut self, key: VoiceKey) -> Option<Voice> {
        if self.voices.contains_key(&key) {
            log::debug!("Retriggering voice {key}");
            return self.remove(key);
        }
        if self.voices.len() >= self.max_voices {
            let oldest = self.stack.back().copied()?;
            log::debug!("Stealing oldest voice {oldest} for {key}");
            return self.remove(oldest);
        }
        None
    }

    /// Register a new voice as the most recent one. Callers must make room first.
    pub fn insert(&mut self, voice: Voice) {
        let key = voice.key();
        if self.voices.insert(key, voice).is_some() {
            self.stack.retain(|k| *k != key);
        }
        self.stack.push_front(key);
    }

    /// Remove the voice with the given key.
    pub fn remove(&mut self, key: VoiceKey) -> Option<Voice> {
        let voice = self.voices.remove(&key)?;
        self.stack.retain(|k| *k != key);
        Some(voice)
    }

    /// Remove all voices, oldest first.
    pub fn drain(&mut self) -> Vec<Voice> {
        let mut voices = Vec::with_capacity(self.voices.len());
        while let Some(key) = self.stack.pop_back() {
            if let Some(voice) = self.voices.remove(&key) {
                voices.push(voice);
            }
        }
        voices
    }
}

// -------------------------------------------------------------------------------------------------

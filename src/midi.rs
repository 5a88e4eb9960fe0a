//! MIDI input events and the test sequencer's event queue items.

// -------------------------------------------------------------------------------------------------

/// Center of the 14 bit MIDI pitch bend range.
pub const MIDI_PITCH_BEND_CENTER: u16 = 8192;

// -------------------------------------------------------------------------------------------------

/// A MIDI channel message the synthesizer reacts on. Channels are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MidiEvent {
    /// Note on. A velocity of 0 acts as note off.
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    ControlChange { controller: u8, value: u8 },
    /// 14 bit pitch bend value.
    PitchBend { value: u16 },
    /// Any other message, e.g. active sensing or clock.
    Unknown,
}

impl MidiEvent {
    /// Parse a raw MIDI message. Incomplete and unsupported messages parse as
    /// [`MidiEvent::Unknown`].
    pub fn parse(bytes: &[u8]) -> Self {
        let [status, data1, data2, ..] = *bytes else {
            return Self::Unknown;
        };
        let (data1, data2) = (data1 & 0x7f, data2 & 0x7f);
        match status & 0xf0 {
            0x80 => Self::NoteOff { note: data1 },
            0x90 => Self::NoteOn {
                note: data1,
                velocity: data2,
            },
            0xb0 => Self::ControlChange {
                controller: data1,
                value: data2,
            },
            0xe0 => Self::PitchBend {
                value: ((data2 as u16) << 7) | data1 as u16,
            },
            _ => Self::Unknown,
        }
    }
}

// -------------------------------------------------------------------------------------------------

/// An item of the built-in test sequencer, which plays notes without any MIDI input attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SequencerEvent {
    /// Suspend the sequencer for the given number of MIDI task steps.
    Wait(u32),
    NoteOn { note: u8, velocity: u8 },
    NoteOff { note: u8 },
    /// Load a patch from the storage.
    ProgramChange { bank: u8, sound: u16 },
}

// -------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_channel_messages() {
        assert_eq!(
            MidiEvent::parse(&[0x93, 60, 100]),
            MidiEvent::NoteOn {
                note: 60,
                velocity: 100
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0x80, 60, 64]),
            MidiEvent::NoteOff { note: 60 }
        );
        assert_eq!(
            MidiEvent::parse(&[0xb0, 1, 127]),
            MidiEvent::ControlChange {
                controller: 1,
                value: 127
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0xe0, 0x00, 0x40]),
            MidiEvent::PitchBend {
                value: MIDI_PITCH_BEND_CENTER
            }
        );
        assert_eq!(
            MidiEvent::parse(&[0xe0, 0x7f, 0x7f]),
            MidiEvent::PitchBend { value: 16383 }
        );
    }

    #[test]
    fn parse_unknown_messages() {
        assert_eq!(MidiEvent::parse(&[0xfe]), MidiEvent::Unknown);
        assert_eq!(MidiEvent::parse(&[0x90, 60]), MidiEvent::Unknown);
        assert_eq!(MidiEvent::parse(&[0xc0, 1, 0]), MidiEvent::Unknown);
        assert_eq!(MidiEvent::parse(&[]), MidiEvent::Unknown);
    }
}

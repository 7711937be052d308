//! Timed MIDI events and the track that stores them.

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Smallest unit of musical time. Ticks-per-beat is the track's resolution.
pub type Tick = u32;

/// Ticks per beat of a fresh session (PPQ division).
pub const DEFAULT_RESOLUTION: u16 = 96;

pub const NUM_CHANNELS: usize = 16;
pub const NUM_KEYS: usize = 128;

/// Channel voice data carried by a [`TimedEvent`]. Values are range-checked
/// at construction; a payload that exists is well-formed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventData {
    NoteOn { channel: u8, key: u8, velocity: u8 },
    NoteOff { channel: u8, key: u8, velocity: u8 },
    ProgramChange { channel: u8, program: u8 },
}

impl EventData {
    pub fn note_on(channel: u8, key: u8, velocity: u8) -> Result<Self, Error> {
        check_channel(channel)?;
        check_data("key", key)?;
        check_data("velocity", velocity)?;
        Ok(Self::NoteOn { channel, key, velocity })
    }

    pub fn note_off(channel: u8, key: u8, velocity: u8) -> Result<Self, Error> {
        check_channel(channel)?;
        check_data("key", key)?;
        check_data("velocity", velocity)?;
        Ok(Self::NoteOff { channel, key, velocity })
    }

    pub fn program_change(channel: u8, program: u8) -> Result<Self, Error> {
        check_channel(channel)?;
        check_data("program", program)?;
        Ok(Self::ProgramChange { channel, program })
    }

    pub fn channel(&self) -> u8 {
        match self {
            Self::NoteOn { channel, .. }
            | Self::NoteOff { channel, .. }
            | Self::ProgramChange { channel, .. } => *channel,
        }
    }
}

fn check_channel(channel: u8) -> Result<(), Error> {
    if channel as usize >= NUM_CHANNELS {
        Err(Error::BadChannel(channel))
    } else {
        Ok(())
    }
}

fn check_data(what: &'static str, value: u8) -> Result<(), Error> {
    if value > 0x7f {
        Err(Error::BadData(what, value))
    } else {
        Ok(())
    }
}

/// A payload scheduled at a tick position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedEvent {
    pub tick: Tick,
    pub data: EventData,
}

/// Stable handle to an event resident in a [`Track`]. Handles are never
/// reused; one whose event was removed simply stops resolving.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EventId(u64);

/// Insertion-ordered event storage for one editing session. No global tick
/// sort is maintained; consumers traverse in storage order, and the file
/// exporter sorts a copy of its own.
#[derive(Default)]
pub struct Track {
    next_id: u64,
    events: Vec<(EventId, TimedEvent)>,
}

impl Track {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: TimedEvent) -> EventId {
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.events.push((id, event));
        id
    }

    pub fn get(&self, id: EventId) -> Option<&TimedEvent> {
        self.events.iter().find(|(e, _)| *e == id).map(|(_, event)| event)
    }

    pub fn contains(&self, id: EventId) -> bool {
        self.events.iter().any(|(e, _)| *e == id)
    }

    pub fn remove(&mut self, id: EventId) -> Option<TimedEvent> {
        let i = self.events.iter().position(|(e, _)| *e == id)?;
        Some(self.events.remove(i).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EventId, &TimedEvent)> {
        self.events.iter().map(|(id, event)| (*id, event))
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Largest tick in the track, or zero when empty.
    pub fn tick_len(&self) -> Tick {
        self.events.iter().map(|(_, event)| event.tick).max().unwrap_or(0)
    }
}

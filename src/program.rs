//! Per-channel instrument program bookkeeping.

use crate::error::Error;
use crate::event::{EventData, EventId, TimedEvent, Track, NUM_CHANNELS};

/// Tracks the single resident program-change event per channel. The resident
/// event lives at tick zero; latest write wins.
#[derive(Default)]
pub struct Programs {
    resident: [Option<(EventId, u8)>; NUM_CHANNELS],
}

impl Programs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Program number sounding on `channel`, or zero (the first instrument)
    /// if none was ever set.
    pub fn get(&self, channel: u8) -> u8 {
        self.resident
            .get(channel as usize)
            .and_then(|slot| slot.map(|(_, program)| program))
            .unwrap_or(0)
    }

    /// Called by the pairing scan for every program change it passes, so the
    /// registry reflects whatever a loaded file carries.
    pub(crate) fn record(&mut self, channel: u8, id: EventId, program: u8) {
        self.resident[channel as usize] = Some((id, program));
    }

    /// Replace the channel's resident program event with a new one at tick
    /// zero. Returns false when the program is already resident and the
    /// track was left untouched.
    pub fn set(&mut self, track: &mut Track, channel: u8, program: u8) -> Result<bool, Error> {
        let data = EventData::program_change(channel, program)?;
        if self.get(channel) == program {
            return Ok(false);
        }
        if let Some((id, _)) = self.resident[channel as usize].take() {
            track.remove(id);
        }
        let id = track.push(TimedEvent { tick: 0, data });
        self.resident[channel as usize] = Some((id, program));
        Ok(true)
    }
}

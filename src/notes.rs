//! Reconstruction of logical notes from the flat event stream.

use crate::event::{EventData, EventId, Tick, Track, NUM_CHANNELS, NUM_KEYS};
use crate::program::Programs;

/// Bitset of channels suppressed in the note view. The domain is fixed at
/// sixteen channels, so one word covers it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ChannelMask(u16);

impl ChannelMask {
    pub fn set_hidden(&mut self, channel: u8, hidden: bool) {
        if hidden {
            self.0 |= 1 << channel;
        } else {
            self.0 &= !(1 << channel);
        }
    }

    pub fn hidden(&self, channel: u8) -> bool {
        self.0 & (1 << channel) != 0
    }
}

/// A paired note-on/note-off, derived from the track. It references its two
/// backing events by handle rather than holding copies; removing the note
/// means removing those events.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Note {
    pub channel: u8,
    pub key: u8,
    pub velocity: u8,
    pub on_tick: Tick,
    pub off_tick: Tick,
    pub on_id: EventId,
    pub off_id: EventId,
}

#[derive(Clone, Copy)]
struct Open {
    id: EventId,
    tick: Tick,
    velocity: u8,
}

/// Rebuild the note view with a single linear pass over the track in storage
/// order. Events on hidden channels are skipped entirely. As a side effect,
/// the last program change seen per visible channel is recorded into
/// `programs`.
///
/// A note-on while the same (key, channel) is already open either terminates
/// the open note (running status, velocity zero) or is dropped. A note-off
/// with no open note is an orphan and is ignored. A note-on that never sees
/// a terminator stays in the track but yields no note.
pub fn find_notes(track: &Track, mask: ChannelMask, programs: &mut Programs) -> Vec<Note> {
    let mut open = [[None::<Open>; NUM_CHANNELS]; NUM_KEYS];
    let mut notes = Vec::new();

    for (id, event) in track.iter() {
        if mask.hidden(event.data.channel()) {
            continue;
        }
        match event.data {
            EventData::NoteOn { channel, key, velocity } => {
                let slot = &mut open[key as usize][channel as usize];
                match *slot {
                    None => {
                        *slot = Some(Open { id, tick: event.tick, velocity });
                    }
                    // running status: a second note-on at velocity zero is
                    // the note's terminator
                    Some(start) if velocity == 0 => {
                        notes.push(pair(channel, key, start, id, event.tick));
                        *slot = None;
                    }
                    // overlapping start while the slot is occupied; dropped
                    Some(_) => (),
                }
            }
            EventData::NoteOff { channel, key, .. } => {
                let slot = &mut open[key as usize][channel as usize];
                if let Some(start) = slot.take() {
                    notes.push(pair(channel, key, start, id, event.tick));
                }
            }
            EventData::ProgramChange { channel, program } => {
                programs.record(channel, id, program);
            }
        }
    }

    notes
}

fn pair(channel: u8, key: u8, start: Open, off_id: EventId, off_tick: Tick) -> Note {
    Note {
        channel,
        key,
        velocity: start.velocity,
        on_tick: start.tick,
        off_tick,
        on_id: start.id,
        off_id,
    }
}

//! Standard MIDI File boundary: conversion between the track and the
//! container format, delegated to the `midly` codec.

use std::error::Error;
use std::path::Path;

use midly::num::{u15, u28, u4, u7};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};
use tracing::debug;

use crate::event::{EventData, Tick, TimedEvent, Track, DEFAULT_RESOLUTION};

/// Read a track and its resolution from a MIDI file on disk.
pub fn load(path: &Path) -> Result<(Track, u16), Box<dyn Error>> {
    let bytes = std::fs::read(path)?;
    let smf = Smf::parse(&bytes)?;
    let (track, resolution) = from_smf(&smf);
    debug!(events = track.len(), resolution, "loaded {}", path.display());
    Ok((track, resolution))
}

/// Write the track to disk as a single-track (format 0) MIDI file.
pub fn save(track: &Track, resolution: u16, path: &Path) -> Result<(), Box<dyn Error>> {
    let smf = to_smf(track, resolution);
    let mut bytes = Vec::new();
    smf.write(&mut bytes)?;
    std::fs::write(path, bytes)?;
    debug!(events = track.len(), "saved {}", path.display());
    Ok(())
}

/// Convert a parsed file to engine events. Only the first track is read, and
/// only note-on/note-off/program-change messages survive; delta times are
/// accumulated to absolute ticks.
pub fn from_smf(smf: &Smf) -> (Track, u16) {
    let resolution = match smf.header.timing {
        Timing::Metrical(tpb) => tpb.as_int(),
        // SMPTE timing has no beat grid to edit against
        Timing::Timecode(..) => DEFAULT_RESOLUTION,
    };

    let mut track = Track::new();
    if let Some(events) = smf.tracks.first() {
        let mut tick: Tick = 0;
        for event in events {
            tick += event.delta.as_int();
            if let TrackEventKind::Midi { channel, message } = event.kind {
                let channel = channel.as_int();
                let data = match message {
                    MidiMessage::NoteOn { key, vel } => {
                        EventData::note_on(channel, key.as_int(), vel.as_int())
                    }
                    MidiMessage::NoteOff { key, vel } => {
                        EventData::note_off(channel, key.as_int(), vel.as_int())
                    }
                    MidiMessage::ProgramChange { program } => {
                        EventData::program_change(channel, program.as_int())
                    }
                    _ => continue,
                };
                // the codec's integer types already enforce the data ranges
                if let Ok(data) = data {
                    track.push(TimedEvent { tick, data });
                }
            }
        }
    }

    (track, resolution)
}

/// Convert the track to a format-0 file: events sorted by tick, absolute
/// ticks turned into deltas, and a terminal end-of-track marker.
pub fn to_smf(track: &Track, resolution: u16) -> Smf<'static> {
    let mut events: Vec<TimedEvent> = track.iter().map(|(_, event)| *event).collect();
    events.sort_by_key(|event| event.tick);

    let mut out = Vec::new();
    let mut last: Tick = 0;
    for event in events {
        let delta = event.tick - last;
        last = event.tick;
        let (channel, message) = match event.data {
            EventData::NoteOn { channel, key, velocity } => (
                channel,
                MidiMessage::NoteOn { key: u7::new(key), vel: u7::new(velocity) },
            ),
            EventData::NoteOff { channel, key, velocity } => (
                channel,
                MidiMessage::NoteOff { key: u7::new(key), vel: u7::new(velocity) },
            ),
            EventData::ProgramChange { channel, program } => (
                channel,
                MidiMessage::ProgramChange { program: u7::new(program) },
            ),
        };
        out.push(TrackEvent {
            delta: u28::new(delta),
            kind: TrackEventKind::Midi { channel: u4::new(channel), message },
        });
    }
    out.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });

    Smf {
        header: Header {
            format: Format::SingleTrack,
            timing: Timing::Metrical(u15::new(resolution)),
        },
        tracks: vec![out],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_smf_emits_sorted_deltas() {
        let mut track = Track::new();
        // inserted out of tick order on purpose
        track.push(TimedEvent {
            tick: 96,
            data: EventData::note_off(0, 60, 64).unwrap(),
        });
        track.push(TimedEvent {
            tick: 0,
            data: EventData::note_on(0, 60, 64).unwrap(),
        });
        let smf = to_smf(&track, 96);
        assert_eq!(smf.tracks.len(), 1);
        let events = &smf.tracks[0];
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].delta.as_int(), 0);
        assert_eq!(
            events[0].kind,
            TrackEventKind::Midi {
                channel: u4::new(0),
                message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(64) },
            }
        );
        assert_eq!(events[1].delta.as_int(), 96);
        assert_eq!(
            events[2].kind,
            TrackEventKind::Meta(MetaMessage::EndOfTrack)
        );
    }

    #[test]
    fn test_from_smf_accumulates_ticks() {
        let mut track = Track::new();
        track.push(TimedEvent {
            tick: 24,
            data: EventData::note_on(3, 72, 80).unwrap(),
        });
        track.push(TimedEvent {
            tick: 120,
            data: EventData::note_off(3, 72, 0).unwrap(),
        });
        track.push(TimedEvent {
            tick: 0,
            data: EventData::program_change(3, 7).unwrap(),
        });
        let (read, resolution) = from_smf(&to_smf(&track, 96));
        assert_eq!(resolution, 96);
        let events: Vec<_> = read.iter().map(|(_, event)| *event).collect();
        assert_eq!(
            events,
            vec![
                TimedEvent { tick: 0, data: EventData::program_change(3, 7).unwrap() },
                TimedEvent { tick: 24, data: EventData::note_on(3, 72, 80).unwrap() },
                TimedEvent { tick: 120, data: EventData::note_off(3, 72, 0).unwrap() },
            ]
        );
    }

    #[test]
    fn test_from_smf_skips_foreign_messages() {
        let smf = Smf {
            header: Header {
                format: Format::SingleTrack,
                timing: Timing::Metrical(u15::new(480)),
            },
            tracks: vec![vec![
                TrackEvent {
                    delta: u28::new(0),
                    kind: TrackEventKind::Meta(MetaMessage::Tempo(midly::num::u24::new(500_000))),
                },
                TrackEvent {
                    delta: u28::new(10),
                    kind: TrackEventKind::Midi {
                        channel: u4::new(0),
                        message: MidiMessage::Controller {
                            controller: u7::new(7),
                            value: u7::new(100),
                        },
                    },
                },
                TrackEvent {
                    delta: u28::new(10),
                    kind: TrackEventKind::Midi {
                        channel: u4::new(0),
                        message: MidiMessage::NoteOn { key: u7::new(60), vel: u7::new(64) },
                    },
                },
                TrackEvent {
                    delta: u28::new(0),
                    kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
                },
            ]],
        };
        let (track, resolution) = from_smf(&smf);
        assert_eq!(resolution, 480);
        assert_eq!(track.len(), 1);
        // deltas of skipped events still advance the clock
        let (_, event) = track.iter().next().unwrap();
        assert_eq!(event.tick, 20);
    }
}

//! The mutation surface of the engine. Keeps the track, the derived note
//! view, and the program registry consistent, and carries the session's
//! dirty flag.

use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use crate::event::{EventData, Tick, TimedEvent, Track, DEFAULT_RESOLUTION};
use crate::grid::{Grid, NoteLength, BEATS_PER_BAR, DEFAULT_BARS};
use crate::notes::{self, ChannelMask, Note};
use crate::program::Programs;

/// Parameters applied to the next added note.
pub struct ToolState {
    pub channel: u8,
    pub velocity: u8,
    pub note_length: NoteLength,
    pub quantization: NoteLength,
}

impl Default for ToolState {
    fn default() -> Self {
        Self {
            channel: 0,
            velocity: 64,
            note_length: NoteLength::Quarter,
            quantization: NoteLength::Sixteenth,
        }
    }
}

/// One editing session over a single track. The track is owned here
/// exclusively; collaborators get references, never copies.
pub struct Editor {
    track: Track,
    resolution: u16,
    grid: Grid,
    notes: Vec<Note>,
    programs: Programs,
    hidden: ChannelMask,
    tool: ToolState,
    dirty: bool,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(DEFAULT_RESOLUTION)
    }
}

impl Editor {
    /// Start a session over an empty track.
    pub fn new(resolution: u16) -> Self {
        Self {
            track: Track::new(),
            resolution,
            grid: Grid::new(resolution),
            notes: Vec::new(),
            programs: Programs::new(),
            hidden: ChannelMask::default(),
            tool: ToolState::default(),
            dirty: false,
        }
    }

    /// Start a session over a loaded track: size the display span to fit the
    /// content and build the initial note view.
    pub fn open(track: Track, resolution: u16) -> Self {
        let mut editor = Self::new(resolution);
        let beats = (track.tick_len() / resolution as Tick) as u32;
        editor.grid.set_display_bars((beats / BEATS_PER_BAR + 1).max(DEFAULT_BARS));
        editor.track = track;
        editor.rescan();
        editor
    }

    /// Apply persisted tool defaults, skipping out-of-range values.
    pub fn apply_config(&mut self, config: &Config) {
        let _ = self.set_channel(config.channel);
        let _ = self.set_velocity(config.velocity);
        self.set_note_length(config.note_length);
        self.set_quantization(config.quantization);
    }

    /// Insert a note pair at a grid position using the current tool state.
    /// The start snaps down to the quantization grid; the end is the start
    /// plus the selected note length. Overlap with an existing note of the
    /// same key and channel is not checked here; the pairing scan resolves
    /// (or drops) it on the next rebuild.
    pub fn add_note(&mut self, x: f32, y: f32) -> Result<Note, Error> {
        let key = self.grid.coordinate_to_key(y).ok_or(Error::KeyOutOfBounds(y))?;
        let start_x = self.grid.quantize(x, self.tool.quantization);
        let end_x = start_x + self.grid.note_width(self.tool.note_length);
        let on = TimedEvent {
            tick: self.grid.coordinate_to_tick(start_x),
            data: EventData::note_on(self.tool.channel, key, self.tool.velocity)?,
        };
        let off = TimedEvent {
            tick: self.grid.coordinate_to_tick(end_x),
            data: EventData::note_off(self.tool.channel, key, self.tool.velocity)?,
        };
        let on_id = self.track.push(on);
        let off_id = self.track.push(off);
        let note = Note {
            channel: self.tool.channel,
            key,
            velocity: self.tool.velocity,
            on_tick: on.tick,
            off_tick: off.tick,
            on_id,
            off_id,
        };
        self.notes.push(note);
        self.dirty = true;
        debug!(
            channel = note.channel,
            key = note.key,
            on_tick = note.on_tick,
            off_tick = note.off_tick,
            "added note"
        );
        Ok(note)
    }

    /// Remove a note's two backing events. Fails without touching the track
    /// if the note no longer resolves to resident events.
    pub fn remove_note(&mut self, note: &Note) -> Result<(), Error> {
        if !self.track.contains(note.on_id) || !self.track.contains(note.off_id) {
            return Err(Error::StaleNote);
        }
        self.track.remove(note.on_id);
        self.track.remove(note.off_id);
        self.notes.retain(|n| n.on_id != note.on_id);
        self.dirty = true;
        debug!(channel = note.channel, key = note.key, "removed note");
        Ok(())
    }

    /// Change the instrument program of a channel. Writing the program that
    /// is already resident is a no-op and does not dirty the session.
    pub fn set_program(&mut self, channel: u8, program: u8) -> Result<(), Error> {
        if self.programs.set(&mut self.track, channel, program)? {
            self.dirty = true;
            debug!(channel, program, "changed program");
        }
        Ok(())
    }

    pub fn program(&self, channel: u8) -> u8 {
        self.programs.get(channel)
    }

    /// Hide or show a channel in the note view and rebuild it. Hidden
    /// channels keep their events; playback and saving see every channel.
    pub fn set_channel_visible(&mut self, channel: u8, visible: bool) -> Result<(), Error> {
        if channel as usize >= crate::event::NUM_CHANNELS {
            return Err(Error::BadChannel(channel));
        }
        self.hidden.set_hidden(channel, !visible);
        self.rescan();
        Ok(())
    }

    pub fn channel_visible(&self, channel: u8) -> bool {
        !self.hidden.hidden(channel)
    }

    // tool state

    pub fn set_channel(&mut self, channel: u8) -> Result<(), Error> {
        if channel as usize >= crate::event::NUM_CHANNELS {
            return Err(Error::BadChannel(channel));
        }
        self.tool.channel = channel;
        Ok(())
    }

    pub fn set_velocity(&mut self, velocity: u8) -> Result<(), Error> {
        if velocity > 0x7f {
            return Err(Error::BadData("velocity", velocity));
        }
        self.tool.velocity = velocity;
        Ok(())
    }

    pub fn set_note_length(&mut self, length: NoteLength) {
        self.tool.note_length = length;
    }

    pub fn set_quantization(&mut self, quantization: NoteLength) {
        self.tool.quantization = quantization;
    }

    // viewport

    pub fn zoom_vertical(&mut self, zoom_in: bool) {
        self.grid.zoom.step_vertical(zoom_in);
    }

    pub fn zoom_horizontal(&mut self, zoom_in: bool) {
        self.grid.zoom.step_horizontal(zoom_in);
    }

    pub fn set_display_bars(&mut self, bars: u32) {
        self.grid.set_display_bars(bars);
    }

    pub fn add_bar(&mut self) {
        self.grid.add_bar();
    }

    pub fn remove_bar(&mut self) {
        self.grid.remove_bar();
    }

    pub fn display_bars(&self) -> u32 {
        self.grid.display_bars()
    }

    // views

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn tool(&self) -> &ToolState {
        &self.tool
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// The live track, for the playback and codec collaborators. No channel
    /// filtering is applied.
    pub fn track(&self) -> &Track {
        &self.track
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    /// Whether the session has unsaved edits.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Acknowledge that the persistence collaborator wrote the track out.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn rescan(&mut self) {
        self.notes = notes::find_notes(&self.track, self.hidden, &mut self.programs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_note_quarter_at_origin() {
        // resolution 96, zoom 1: a quarter note at (0, 0) lands on key 127
        // and spans ticks 0..96
        let mut editor = Editor::new(96);
        let note = editor.add_note(0.0, 0.0).unwrap();
        assert_eq!(note.channel, 0);
        assert_eq!(note.key, 127);
        assert_eq!(note.velocity, 64);
        assert_eq!(note.on_tick, 0);
        assert_eq!(note.off_tick, 96);
        assert_eq!(editor.track().len(), 2);
        let events: Vec<_> = editor.track().iter().map(|(_, e)| *e).collect();
        assert_eq!(events[0].data, EventData::NoteOn { channel: 0, key: 127, velocity: 64 });
        assert_eq!(events[1].data, EventData::NoteOff { channel: 0, key: 127, velocity: 64 });
    }

    #[test]
    fn test_add_note_uses_tool_state() {
        let mut editor = Editor::new(96);
        editor.set_channel(9).unwrap();
        editor.set_velocity(100).unwrap();
        editor.set_note_length(NoteLength::Eighth);
        let note = editor.add_note(0.0, 670.0).unwrap();
        assert_eq!(note.channel, 9);
        assert_eq!(note.velocity, 100);
        assert_eq!(note.key, 60);
        assert_eq!(note.off_tick - note.on_tick, 48);
    }

    #[test]
    fn test_add_note_quantizes_start_only() {
        let mut editor = Editor::new(96);
        // sixteenth grid at zoom 1: 25-unit steps, 24 ticks
        let note = editor.add_note(30.0, 0.0).unwrap();
        assert_eq!(note.on_tick, 24);
        assert_eq!(note.off_tick, 24 + 96);
    }

    #[test]
    fn test_add_note_off_board_is_rejected() {
        let mut editor = Editor::new(96);
        assert_eq!(
            editor.add_note(0.0, 2000.0),
            Err(Error::KeyOutOfBounds(2000.0))
        );
        assert!(editor.track().is_empty());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_add_remove_round_trip() {
        let mut editor = Editor::new(96);
        editor.add_note(0.0, 100.0).unwrap();
        let before: Vec<_> = editor.track().iter().map(|(_, e)| *e).collect();
        let note = editor.add_note(250.0, 30.0).unwrap();
        editor.remove_note(&note).unwrap();
        let after: Vec<_> = editor.track().iter().map(|(_, e)| *e).collect();
        assert_eq!(before, after);
        assert_eq!(editor.notes().len(), 1);
    }

    #[test]
    fn test_remove_stale_note_fails() {
        let mut editor = Editor::new(96);
        let note = editor.add_note(0.0, 0.0).unwrap();
        editor.remove_note(&note).unwrap();
        assert_eq!(editor.remove_note(&note), Err(Error::StaleNote));
    }

    #[test]
    fn test_dirty_flag_lifecycle() {
        let mut editor = Editor::new(96);
        assert!(!editor.is_dirty());
        let note = editor.add_note(0.0, 0.0).unwrap();
        assert!(editor.is_dirty());
        editor.mark_saved();
        assert!(!editor.is_dirty());
        editor.remove_note(&note).unwrap();
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_set_program_dirty_only_on_change() {
        let mut editor = Editor::new(96);
        editor.set_program(0, 25).unwrap();
        assert!(editor.is_dirty());
        editor.mark_saved();
        editor.set_program(0, 25).unwrap();
        assert!(!editor.is_dirty());
        assert_eq!(editor.program(0), 25);
        assert_eq!(editor.track().len(), 1);
    }

    #[test]
    fn test_hide_channel_empties_view() {
        let mut editor = Editor::new(96);
        editor.add_note(0.0, 0.0).unwrap();
        editor.add_note(100.0, 50.0).unwrap();
        editor.set_channel_visible(0, false).unwrap();
        assert!(editor.notes().is_empty());
        assert_eq!(editor.track().len(), 4);
        editor.set_channel_visible(0, true).unwrap();
        assert_eq!(editor.notes().len(), 2);
    }

    #[test]
    fn test_visibility_does_not_dirty() {
        let mut editor = Editor::new(96);
        editor.add_note(0.0, 0.0).unwrap();
        editor.mark_saved();
        editor.set_channel_visible(0, false).unwrap();
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_open_sizes_span_to_content() {
        let mut track = Track::new();
        track.push(TimedEvent {
            tick: 96 * 40,
            data: EventData::note_off(0, 60, 0).unwrap(),
        });
        let editor = Editor::open(track, 96);
        // 40 beats is 10 bars; one extra for slack
        assert_eq!(editor.display_bars(), 11);
        assert!(!editor.is_dirty());

        let editor = Editor::open(Track::new(), 96);
        assert_eq!(editor.display_bars(), DEFAULT_BARS);
    }

    #[test]
    fn test_open_builds_note_view() {
        let mut track = Track::new();
        track.push(TimedEvent {
            tick: 0,
            data: EventData::note_on(2, 64, 90).unwrap(),
        });
        track.push(TimedEvent {
            tick: 96,
            data: EventData::note_off(2, 64, 0).unwrap(),
        });
        track.push(TimedEvent {
            tick: 0,
            data: EventData::program_change(2, 48).unwrap(),
        });
        let editor = Editor::open(track, 96);
        assert_eq!(editor.notes().len(), 1);
        assert_eq!(editor.program(2), 48);
    }

    #[test]
    fn test_tool_state_setters_validate() {
        let mut editor = Editor::new(96);
        assert_eq!(editor.set_channel(16), Err(Error::BadChannel(16)));
        assert_eq!(editor.set_velocity(128), Err(Error::BadData("velocity", 128)));
    }
}

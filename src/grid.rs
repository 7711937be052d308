//! Mapping between grid coordinates and tick/key positions.

use serde::{Deserialize, Serialize};

use crate::event::{Tick, NUM_KEYS};
use crate::notes::Note;

/// Height of one key row at zoom 1, in coordinate units.
const KEY_HEIGHT_UNIT: f32 = 10.0;
/// Width of one beat at zoom 1, in coordinate units.
const BEAT_WIDTH_UNIT: f32 = 100.0;

const ZOOM_MIN: u8 = 1;
const ZOOM_MAX: u8 = 10;

pub const BEATS_PER_BAR: u32 = 4;
/// Span of a fresh session, and the floor when sizing to a loaded file.
pub const DEFAULT_BARS: u32 = 4;

/// Note durations selectable for new notes and for the quantization grid.
/// The numeric value is the denominator: 4 is a quarter note.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteLength {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
}

impl NoteLength {
    pub fn value(&self) -> u32 {
        match self {
            Self::Whole => 1,
            Self::Half => 2,
            Self::Quarter => 4,
            Self::Eighth => 8,
            Self::Sixteenth => 16,
        }
    }
}

/// Discrete zoom steps per axis, 1 (out) through 10 (in).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Zoom {
    vertical: u8,
    horizontal: u8,
}

impl Default for Zoom {
    fn default() -> Self {
        Self { vertical: 1, horizontal: 1 }
    }
}

impl Zoom {
    /// Step the vertical axis. Steps past either end of the range are no-ops.
    pub fn step_vertical(&mut self, zoom_in: bool) {
        step(&mut self.vertical, zoom_in);
    }

    /// Step the horizontal axis. Steps past either end of the range are no-ops.
    pub fn step_horizontal(&mut self, zoom_in: bool) {
        step(&mut self.horizontal, zoom_in);
    }

    pub fn note_height(&self) -> f32 {
        self.vertical as f32 * KEY_HEIGHT_UNIT
    }

    pub fn beat_width(&self) -> f32 {
        self.horizontal as f32 * BEAT_WIDTH_UNIT
    }
}

fn step(axis: &mut u8, zoom_in: bool) {
    if zoom_in && *axis < ZOOM_MAX {
        *axis += 1;
    } else if !zoom_in && *axis > ZOOM_MIN {
        *axis -= 1;
    }
}

/// On-screen bounds in coordinate units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

/// Which boundary a vertical rule marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuleKind {
    Bar,
    Beat,
    SubBeat,
}

/// Converts between coordinate space and tick/key space under the current
/// zoom and display span. Geometry is a pure function of the inputs; nothing
/// here is cached, so zoom changes cost nothing beyond recomputation.
pub struct Grid {
    pub zoom: Zoom,
    resolution: u16,
    display_beats: u32,
}

impl Grid {
    pub fn new(resolution: u16) -> Self {
        Self {
            zoom: Zoom::default(),
            resolution,
            display_beats: DEFAULT_BARS * BEATS_PER_BAR,
        }
    }

    /// The scale factor (ticks per coordinate unit) is resolution over beat
    /// width; multiplying before dividing keeps beat-aligned coordinates
    /// exact where the quotient alone would not be.
    pub fn coordinate_to_tick(&self, x: f32) -> Tick {
        (x * self.resolution as f32 / self.zoom.beat_width()) as Tick
    }

    pub fn tick_to_coordinate(&self, tick: Tick) -> f32 {
        tick as f32 * self.zoom.beat_width() / self.resolution as f32
    }

    /// Key under a vertical coordinate, or None outside the 128-key board.
    /// The board runs top-down from key 127.
    pub fn coordinate_to_key(&self, y: f32) -> Option<u8> {
        let row = (y / self.zoom.note_height()).floor();
        if (0.0..NUM_KEYS as f32).contains(&row) {
            Some(127 - row as u8)
        } else {
            None
        }
    }

    pub fn key_to_coordinate(&self, key: u8) -> f32 {
        (127 - key) as f32 * self.zoom.note_height()
    }

    /// Snap a horizontal coordinate down to the grid line at or before it.
    /// Never snaps forward.
    pub fn quantize(&self, x: f32, quantization: NoteLength) -> f32 {
        let step = self.zoom.beat_width() * 4.0 / quantization.value() as f32;
        x - x % step
    }

    /// Width in coordinate units of a new note of the given length. Note
    /// ends are not quantized; they sit at start plus this width.
    pub fn note_width(&self, length: NoteLength) -> f32 {
        self.zoom.beat_width() * 4.0 / length.value() as f32
    }

    /// Bounds of a note under the current zoom, derived from its ticks and
    /// key alone.
    pub fn note_bounds(&self, note: &Note) -> Rect {
        let x = self.tick_to_coordinate(note.on_tick);
        Rect {
            x,
            y: self.key_to_coordinate(note.key),
            w: self.tick_to_coordinate(note.off_tick) - x,
            h: self.zoom.note_height(),
        }
    }

    /// Set the displayed span. Clamped to at least one bar; the span is a
    /// viewport property and never truncates events beyond it.
    pub fn set_display_bars(&mut self, bars: u32) {
        self.display_beats = bars.max(1) * BEATS_PER_BAR;
    }

    pub fn display_bars(&self) -> u32 {
        self.display_beats / BEATS_PER_BAR
    }

    pub fn add_bar(&mut self) {
        self.display_beats += BEATS_PER_BAR;
    }

    /// Drop the last displayed bar, keeping at least one.
    pub fn remove_bar(&mut self) {
        if self.display_bars() > 1 {
            self.display_beats -= BEATS_PER_BAR;
        }
    }

    /// Total drawable size: the display span by all 128 key rows.
    pub fn extent(&self) -> (f32, f32) {
        (
            self.display_beats as f32 * self.zoom.beat_width(),
            NUM_KEYS as f32 * self.zoom.note_height(),
        )
    }

    /// Vertical rule coordinates for bar, beat, and quarter-beat boundaries
    /// across the display span, for the renderer to draw the grid from.
    pub fn rules(&self) -> Vec<(f32, RuleKind)> {
        let beat_width = self.zoom.beat_width();
        let mut rules = Vec::new();
        for beat in 0..self.display_beats {
            let x = beat as f32 * beat_width;
            let kind = if beat % BEATS_PER_BAR == 0 {
                RuleKind::Bar
            } else {
                RuleKind::Beat
            };
            rules.push((x, kind));
            for sub in 1..4 {
                rules.push((x + beat_width * sub as f32 / 4.0, RuleKind::SubBeat));
            }
        }
        rules
    }
}

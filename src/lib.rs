//! Editing engine for single-track MIDI piano rolls.
//!
//! The engine owns a flat, tick-ordered event stream and presents it as
//! discrete notes on a time-by-pitch grid: it pairs note-on/note-off events
//! into [`Note`] views, maps between grid coordinates and ticks under zoom
//! and quantization, and mutates the stream while keeping tick ordering and
//! the one-program-per-channel invariant intact. Window chrome, dialogs,
//! audio rendering, and the MIDI container encoding all live in external
//! collaborators.

pub mod config;
pub mod editor;
pub mod error;
pub mod event;
pub mod grid;
pub mod notes;
pub mod playback;
pub mod program;
pub mod smf;

pub use config::Config;
pub use editor::{Editor, ToolState};
pub use error::Error;
pub use event::{EventData, EventId, Tick, TimedEvent, Track};
pub use grid::{Grid, NoteLength, Rect, RuleKind, Zoom};
pub use notes::{ChannelMask, Note};
pub use program::Programs;

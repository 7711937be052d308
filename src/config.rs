use std::error::Error;

use serde::{Deserialize, Serialize};

use crate::grid::NoteLength;

const CONFIG_PATH: &str = "gridroll.toml";

/// Tool defaults restored at startup.
#[derive(Serialize, Deserialize)]
pub struct Config {
    pub channel: u8,
    pub velocity: u8,
    pub note_length: NoteLength,
    pub quantization: NoteLength,
}

impl Config {
    pub fn default() -> Self {
        Self {
            channel: 0,
            velocity: 64,
            note_length: NoteLength::Quarter,
            quantization: NoteLength::Sixteenth,
        }
    }

    pub fn load() -> Result<Self, Box<dyn Error>> {
        let s = std::fs::read_to_string(CONFIG_PATH)?;
        let c = toml::from_str(&s)?;
        Ok(c)
    }

    pub fn save(&self) -> Result<(), Box<dyn Error>> {
        let s = toml::to_string(self)?;
        std::fs::write(CONFIG_PATH, s)?;
        Ok(())
    }
}

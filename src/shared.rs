// Constants and the types that cross the tui/middle boundary.
//
// The idea of the rendering process: only the middle layer holds the
// sequencer state, and the TUI just renders the display state object on
// every frame. Each frame, call `middle.display_state()` to get a
// `DisplayState`, draw the grid/transport/flash from it, and translate
// keys into `InputEvent`s for the middle layer to resolve.

use crate::sequencer::Pattern;

pub const NUM_STEPS: usize = 16;
pub const NUM_INSTRUMENTS: usize = 10;
pub const DEFAULT_VELOCITY: u8 = 100;
pub const DEFAULT_BPM: u32 = 120;

pub const MIN_BPM: u32 = 30;
pub const MAX_BPM: u32 = 300;

// One row of the grid. The set is fixed at startup; samples are looked up
// by name from the project's sounds/ directory.
pub struct Instrument {
    pub name: &'static str,
    pub color: (u8, u8, u8),
    pub key: Option<char>, // live pad trigger
}

pub const INSTRUMENTS: [Instrument; NUM_INSTRUMENTS] = [
    Instrument { name: "kick",       color: (0x69, 0xff, 0x52), key: Some('1') },
    Instrument { name: "snare",      color: (0x18, 0xff, 0xff), key: Some('2') },
    Instrument { name: "clap",       color: (0xe0, 0x40, 0xfb), key: Some('3') },
    Instrument { name: "rim",        color: (0xb2, 0xff, 0x59), key: Some('4') },
    Instrument { name: "closed_hat", color: (0xff, 0xff, 0x00), key: Some('5') },
    Instrument { name: "open_hat",   color: (0xff, 0xab, 0x40), key: Some('6') },
    Instrument { name: "crash",      color: (0xff, 0xff, 0xff), key: Some('7') },
    Instrument { name: "perc",       color: (0xff, 0x40, 0x81), key: Some('8') },
    Instrument { name: "perc2",      color: (0x7c, 0x4d, 0xff), key: Some('9') },
    Instrument { name: "tom",        color: (0xff, 0x98, 0x00), key: Some('0') },
];

pub fn instrument_for_key(c: char) -> Option<usize> {
    INSTRUMENTS.iter().position(|inst| inst.key == Some(c))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    // transport
    PlayPress,

    // grid editing at the cursor
    ToggleStep,
    NudgeVelocity(i32),
    CursorUp,
    CursorDown,
    CursorLeft,
    CursorRight,

    // tempo
    NudgeBpm(i32),

    // whole-pattern actions
    ClearPattern,
    ExportPattern,
    ReloadSamples,

    // live pad hit, independent of the sequencer
    TriggerPad(usize),

    Quit,
}

// Flash pulse state: set to an instrument's color when it fires, fades out
// over the following frames.
#[derive(Clone, Copy, Debug)]
pub struct Flash {
    pub color: (u8, u8, u8),
    pub alpha: f32,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub pattern: Pattern,
    pub playing: bool,
    pub playing_step: Option<u8>, // playhead column while running
    pub bpm: u32,
    pub cursor: (usize, usize), // (row, step)
    pub flash: Option<Flash>,
    pub loaded: [bool; NUM_INSTRUMENTS], // which rows have a sample
    pub status: String, // short context-dependent text for the transport line
}

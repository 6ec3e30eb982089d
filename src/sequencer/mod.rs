mod pattern;
mod render;
mod scheduler;

pub use pattern::{Pattern, Step, Track};
pub use render::{RENDER_LOOPS, RENDER_SAMPLE_RATE, render_pattern};
pub use scheduler::{
    LOOKAHEAD_SECS, Scheduler, StepEvent, TICK_INTERVAL, TriggerSink, sanitize_bpm,
    seconds_per_step,
};

// The middle layer: all sequencer and parameter state lives here. The TUI
// sends semantic InputEvents in and renders a DisplayState back out; the
// audio thread receives AudioCommands and nothing else.

use std::path::PathBuf;
use std::time::Instant;

use crate::audio::SampleId;
use crate::audio_api::AudioCommand;
use crate::export;
use crate::sequencer::{
    Pattern, RENDER_SAMPLE_RATE, Scheduler, TICK_INTERVAL, TriggerSink, render_pattern,
};
use crate::shared::{
    DEFAULT_BPM, DisplayState, Flash, INSTRUMENTS, InputEvent, MAX_BPM, MIN_BPM,
    NUM_INSTRUMENTS, NUM_STEPS,
};
use crate::store::SampleStore;

const FLASH_ALPHA: f32 = 0.4;
const FLASH_DECAY: f32 = 0.05; // per UI frame

// Scheduler triggers leave as future-timestamped engine commands.
struct CommandSink<'a> {
    cmds: &'a mut Vec<AudioCommand>,
}

impl TriggerSink for CommandSink<'_> {
    fn play_at(&mut self, sample: SampleId, gain: f32, when: f64) {
        self.cmds.push(AudioCommand::PlayAt { id: sample, gain, when });
    }
}

pub struct Middle {
    pattern: Pattern,
    store: SampleStore,
    scheduler: Scheduler,
    bpm: u32,
    cursor: (usize, usize), // (row, step)
    playing_step: Option<u8>,
    flash: Option<Flash>,
    status: String,
    last_sched_tick: Option<Instant>, // None = tick due immediately
    project_dir: PathBuf,
    sample_rate: u32,
}

impl Middle {
    pub fn new(project_dir: PathBuf, sample_rate: u32) -> Self {
        Self {
            pattern: Pattern::default(),
            store: SampleStore::new(),
            scheduler: Scheduler::new(),
            bpm: DEFAULT_BPM,
            cursor: (0, 0),
            playing_step: None,
            flash: None,
            status: String::new(),
            last_sched_tick: None,
            project_dir,
            sample_rate,
        }
    }

    // (Re)scan the project's sounds/ directory. Used at startup and for
    // runtime sample replacement.
    pub fn reload_samples(&mut self) -> Vec<AudioCommand> {
        let cmds = self.store.load_from_dir(&self.project_dir, self.sample_rate);
        let loaded = (0..NUM_INSTRUMENTS).filter(|&i| self.store.is_loaded(i)).count();
        self.status = format!("{loaded}/{NUM_INSTRUMENTS} SAMPLES LOADED");
        cmds
    }

    pub fn handle_input(&mut self, event: InputEvent, now: f64) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();
        match event {
            InputEvent::PlayPress => {
                if self.scheduler.is_running() {
                    self.scheduler.stop();
                    self.playing_step = None; // no stale playhead after stop
                } else {
                    self.scheduler.start(now);
                    self.last_sched_tick = None;
                }
            }
            InputEvent::ToggleStep => {
                let (row, idx) = self.cursor;
                self.pattern.step_mut(row, idx).toggle();
            }
            InputEvent::NudgeVelocity(delta) => {
                let (row, idx) = self.cursor;
                self.pattern.step_mut(row, idx).nudge_velocity(delta);
            }
            InputEvent::CursorUp => self.cursor.0 = (self.cursor.0 + NUM_INSTRUMENTS - 1) % NUM_INSTRUMENTS,
            InputEvent::CursorDown => self.cursor.0 = (self.cursor.0 + 1) % NUM_INSTRUMENTS,
            InputEvent::CursorLeft => self.cursor.1 = (self.cursor.1 + NUM_STEPS - 1) % NUM_STEPS,
            InputEvent::CursorRight => self.cursor.1 = (self.cursor.1 + 1) % NUM_STEPS,
            InputEvent::NudgeBpm(delta) => {
                self.bpm = (self.bpm as i32 + delta).clamp(MIN_BPM as i32, MAX_BPM as i32) as u32;
            }
            InputEvent::ClearPattern => {
                self.pattern.clear();
                self.status = "PATTERN CLEARED".into();
            }
            InputEvent::ExportPattern => self.export_pattern(),
            InputEvent::ReloadSamples => cmds.extend(self.reload_samples()),
            InputEvent::TriggerPad(row) => {
                if let Some(sample) = self.store.get(row) {
                    cmds.push(AudioCommand::PlayNow { id: sample.id, gain: 1.0 });
                }
            }
            InputEvent::Quit => {}
        }
        cmds
    }

    // Called every UI frame with the current audio clock. Runs the scheduler
    // at its own fixed cadence, consumes visual events that have become due,
    // and fades the flash.
    pub fn tick(&mut self, now: f64) -> Vec<AudioCommand> {
        let mut cmds = Vec::new();

        if self.scheduler.is_running() {
            let due = self
                .last_sched_tick
                .is_none_or(|t| t.elapsed() >= TICK_INTERVAL);
            if due {
                self.last_sched_tick = Some(Instant::now());
                let mut sink = CommandSink { cmds: &mut cmds };
                self.scheduler
                    .tick(now, &self.pattern, &self.store, self.bpm, &mut sink);
            }
        }

        for event in self.scheduler.drain_due(now) {
            self.playing_step = Some(event.step as u8);
            // like the canvas flash: the last row wins, full alpha
            if let Some(&row) = event.fired.last() {
                self.flash = Some(Flash {
                    color: INSTRUMENTS[row].color,
                    alpha: FLASH_ALPHA,
                });
            }
        }

        if let Some(flash) = &mut self.flash {
            flash.alpha -= FLASH_DECAY;
            if flash.alpha <= 0.0 {
                self.flash = None;
            }
        }

        cmds
    }

    fn export_pattern(&mut self) {
        let Some(rendered) = render_pattern(&self.pattern, &self.store, self.bpm) else {
            self.status = "NO SAMPLES LOADED".into();
            return;
        };
        let path = self.project_dir.join(export::EXPORT_FILE);
        match export::write_wav(&path, &rendered, RENDER_SAMPLE_RATE) {
            Ok(()) => self.status = format!("SAVED {}", export::EXPORT_FILE),
            Err(e) => self.status = format!("EXPORT FAILED: {e}"),
        }
    }

    pub fn display_state(&self) -> DisplayState {
        DisplayState {
            pattern: self.pattern.clone(),
            playing: self.scheduler.is_running(),
            playing_step: self.playing_step,
            bpm: self.bpm,
            cursor: self.cursor,
            flash: self.flash,
            loaded: std::array::from_fn(|i| self.store.is_loaded(i)),
            status: self.status.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleBuffer, StereoFrame};

    fn middle() -> Middle {
        Middle::new(std::env::temp_dir(), 44100)
    }

    fn click() -> SampleBuffer {
        SampleBuffer::from(vec![StereoFrame { left: 1.0, right: 1.0 }])
    }

    #[test]
    fn toggle_and_velocity_edit_at_cursor() {
        let mut m = middle();
        m.handle_input(InputEvent::CursorDown, 0.0);
        m.handle_input(InputEvent::CursorRight, 0.0);
        m.handle_input(InputEvent::ToggleStep, 0.0);
        m.handle_input(InputEvent::NudgeVelocity(10), 0.0);

        let ds = m.display_state();
        assert!(ds.pattern.step(1, 1).active);
        assert_eq!(ds.pattern.step(1, 1).velocity(), 110);
    }

    #[test]
    fn bpm_is_clamped() {
        let mut m = middle();
        m.handle_input(InputEvent::NudgeBpm(10_000), 0.0);
        assert_eq!(m.display_state().bpm, MAX_BPM);
        m.handle_input(InputEvent::NudgeBpm(-10_000), 0.0);
        assert_eq!(m.display_state().bpm, MIN_BPM);
    }

    #[test]
    fn play_toggle_clears_playhead_on_stop() {
        let mut m = middle();
        m.store.insert(0, click());
        m.pattern.step_mut(0, 0).toggle();

        m.handle_input(InputEvent::PlayPress, 0.0);
        assert!(m.display_state().playing);
        let cmds = m.tick(0.0);
        assert!(!cmds.is_empty()); // step 0 scheduled

        m.handle_input(InputEvent::PlayPress, 1.0);
        let ds = m.display_state();
        assert!(!ds.playing);
        assert_eq!(ds.playing_step, None);
    }

    #[test]
    fn pad_trigger_needs_a_sample() {
        let mut m = middle();
        assert!(m.handle_input(InputEvent::TriggerPad(0), 0.0).is_empty());

        m.store.insert(0, click());
        let cmds = m.handle_input(InputEvent::TriggerPad(0), 0.0);
        assert!(matches!(cmds[..], [AudioCommand::PlayNow { gain, .. }] if gain == 1.0));
    }

    #[test]
    fn export_without_samples_is_a_noop() {
        let mut m = middle();
        m.pattern.step_mut(0, 0).toggle();
        m.handle_input(InputEvent::ExportPattern, 0.0);
        assert_eq!(m.display_state().status, "NO SAMPLES LOADED");
    }

    #[test]
    fn flash_fires_and_fades() {
        let mut m = middle();
        m.store.insert(2, click());
        m.pattern.step_mut(2, 0).toggle();

        m.handle_input(InputEvent::PlayPress, 0.0);
        m.tick(0.0); // schedules step 0 at t=0 and consumes its visual

        let first = m.display_state().flash.expect("flash set on fire");
        assert_eq!(first.color, INSTRUMENTS[2].color);

        // no further fired events: alpha decays frame by frame
        m.scheduler.stop();
        let mut alpha = first.alpha;
        while let Some(flash) = m.display_state().flash {
            assert!(flash.alpha <= alpha);
            alpha = flash.alpha;
            m.tick(1000.0);
        }
    }

    #[test]
    fn clear_pattern_resets_grid() {
        let mut m = middle();
        m.pattern.step_mut(3, 7).toggle();
        m.handle_input(InputEvent::ClearPattern, 0.0);
        assert!(!m.display_state().pattern.step(3, 7).active);
    }
}

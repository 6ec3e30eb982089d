// The look-ahead scheduler. The control loop that drives it runs on a
// coarse, jittery wall-clock cadence; naive "play on the tick" timing
// drifts audibly. Instead each tick fills a short forward window with
// triggers stamped at exact audio-clock times, and the engine starts them
// sample-accurately. Tick jitter then only moves *when* a trigger is
// computed, never when it sounds.

use std::collections::VecDeque;
use std::time::Duration;

use crate::audio::SampleId;
use crate::shared::{DEFAULT_BPM, NUM_INSTRUMENTS, NUM_STEPS};
use crate::store::SampleStore;

use super::pattern::Pattern;

// How far ahead of the audio clock triggers are submitted.
pub const LOOKAHEAD_SECS: f64 = 0.1;

// Control tick cadence, fixed regardless of tempo. At fast tempos one tick
// owes several steps; the window fill below handles that.
pub const TICK_INTERVAL: Duration = Duration::from_millis(25);

// 16 steps per 4-beat bar: 4 steps per beat.
pub fn seconds_per_step(bpm: u32) -> f64 {
    60.0 / bpm as f64 / 4.0
}

// A zero tempo would make the window fill never terminate.
pub fn sanitize_bpm(bpm: u32) -> u32 {
    if bpm == 0 { DEFAULT_BPM } else { bpm }
}

// Where triggers go: the live sink forwards to the engine as PlayAt
// commands, the tests record them.
pub trait TriggerSink {
    fn play_at(&mut self, sample: SampleId, gain: f32, when: f64);
}

// Visual sync event, stamped with the *audio* time of its step so the UI
// can defer the playhead/flash to the frame where the sound actually starts.
#[derive(Clone, Debug)]
pub struct StepEvent {
    pub step: usize,
    pub fired: Vec<usize>, // rows whose step was active, in row order
    pub at: f64,
}

pub struct Scheduler {
    running: bool,
    current_step: usize,
    next_trigger_time: f64,
    visuals: VecDeque<StepEvent>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            running: false,
            current_step: 0,
            next_trigger_time: 0.0,
            visuals: VecDeque::new(),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    // Starting always rewinds to step 0 at the current audio clock; there is
    // no pause. Calling start while running changes nothing.
    pub fn start(&mut self, now: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.current_step = 0;
        self.next_trigger_time = now;
    }

    // Stop abandons the cursor and any visuals not yet consumed, so nothing
    // claims a "current step" after the transport halts.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.visuals.clear();
    }

    // One control tick. Tempo is sampled fresh by the caller on every tick,
    // so a tempo change takes effect on the next computed interval without
    // stopping playback; triggers already inside the window keep the old
    // spacing.
    pub fn tick(
        &mut self,
        now: f64,
        pattern: &Pattern,
        store: &SampleStore,
        bpm: u32,
        sink: &mut dyn TriggerSink,
    ) {
        if !self.running {
            return;
        }
        let bpm = sanitize_bpm(bpm);

        // Must be a while, not an if: at 300 BPM a step lasts 50ms and a
        // 25ms tick can owe two or more of them to keep the window full.
        while self.next_trigger_time < now + LOOKAHEAD_SECS {
            let mut fired = Vec::new();
            for row in 0..NUM_INSTRUMENTS {
                let step = pattern.step(row, self.current_step);
                if !step.active {
                    continue;
                }
                fired.push(row);
                // no sample loaded: the row still flashes, it just stays silent
                if let Some(sample) = store.get(row) {
                    sink.play_at(sample.id, step.gain(), self.next_trigger_time);
                }
            }
            self.visuals.push_back(StepEvent {
                step: self.current_step,
                fired,
                at: self.next_trigger_time,
            });

            self.next_trigger_time += seconds_per_step(bpm);
            self.current_step = (self.current_step + 1) % NUM_STEPS;
        }
    }

    // Hand over the visual events whose audio time has arrived. The UI calls
    // this once per frame with the current audio clock.
    pub fn drain_due(&mut self, now: f64) -> Vec<StepEvent> {
        let mut due = Vec::new();
        while self.visuals.front().is_some_and(|ev| ev.at <= now) {
            due.extend(self.visuals.pop_front());
        }
        due
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{SampleBuffer, StereoFrame};

    #[derive(Default)]
    struct RecordingSink {
        events: Vec<(SampleId, f32, f64)>,
    }

    impl TriggerSink for RecordingSink {
        fn play_at(&mut self, sample: SampleId, gain: f32, when: f64) {
            self.events.push((sample, gain, when));
        }
    }

    fn click() -> SampleBuffer {
        SampleBuffer::from(vec![StereoFrame { left: 1.0, right: 1.0 }])
    }

    fn store_with_rows(rows: &[usize]) -> SampleStore {
        let mut store = SampleStore::new();
        for &row in rows {
            store.insert(row, click());
        }
        store
    }

    fn four_on_the_floor(row: usize) -> Pattern {
        let mut pattern = Pattern::default();
        for idx in [0, 4, 8, 12] {
            let step = pattern.step_mut(row, idx);
            step.toggle();
            step.set_velocity(100);
        }
        pattern
    }

    #[test]
    fn seconds_per_step_is_fifteen_over_bpm() {
        for bpm in [60, 90, 120, 180, 300] {
            assert_eq!(seconds_per_step(bpm), 15.0 / bpm as f64);
        }
    }

    #[test]
    fn zero_bpm_falls_back_to_default() {
        assert_eq!(sanitize_bpm(0), 120);
        assert_eq!(sanitize_bpm(90), 90);
    }

    #[test]
    fn four_on_the_floor_at_120() {
        // 120 BPM: seconds_per_step = 0.125 (exact in binary), so trigger
        // times compare exactly.
        let pattern = four_on_the_floor(0);
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        let mut now = 0.0;
        while now < 2.0 {
            sched.tick(now, &pattern, &store, 120, &mut sink);
            now += 0.025;
        }

        let times: Vec<f64> = sink.events.iter().map(|e| e.2).collect();
        assert!(times.len() >= 4);
        for (j, &t) in times.iter().enumerate() {
            assert_eq!(t, j as f64 * 0.5); // steps 0,4,8,12 repeat every 2.0s
        }
        let expected_gain = (100.0f32 / 127.0) * (100.0f32 / 127.0);
        for &(_, gain, _) in &sink.events {
            assert_eq!(gain, expected_gain);
            assert!((gain - 0.620).abs() < 1e-3);
        }
    }

    #[test]
    fn trigger_spacing_survives_tick_jitter() {
        let mut pattern = Pattern::default();
        for idx in 0..NUM_STEPS {
            pattern.step_mut(0, idx).toggle();
        }
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        let jitter = [0.013, 0.041, 0.002, 0.060, 0.025, 0.019];
        let mut now = 0.0;
        let mut i = 0;
        while now < 4.0 {
            sched.tick(now, &pattern, &store, 120, &mut sink);
            now += jitter[i % jitter.len()];
            i += 1;
        }

        // spacing is exactly uniform no matter how unevenly the ticks came
        for (k, &(_, _, t)) in sink.events.iter().enumerate() {
            assert_eq!(t, k as f64 * 0.125);
        }
    }

    #[test]
    fn fast_tempo_schedules_multiple_steps_per_tick() {
        let mut pattern = Pattern::default();
        for idx in 0..NUM_STEPS {
            pattern.step_mut(0, idx).toggle();
        }
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        // 300 BPM: step = 50ms, window = 100ms, so one tick owes 2+ steps
        sched.start(0.0);
        sched.tick(0.0, &pattern, &store, 300, &mut sink);
        assert!(sink.events.len() >= 2);
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let pattern = four_on_the_floor(0);
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(1.0);
        sched.tick(1.0, &pattern, &store, 120, &mut sink);
        let scheduled = sink.events.len();

        // a second start while running must not rewind the cursor
        sched.start(99.0);
        sched.tick(1.025, &pattern, &store, 120, &mut sink);
        assert!(sink.events.iter().all(|&(_, _, t)| t < 3.0));
        assert!(sink.events.len() >= scheduled);

        sched.stop();
        sched.stop(); // second stop is a no-op
        assert!(!sched.is_running());

        // ticking while stopped schedules nothing
        let before = sink.events.len();
        sched.tick(50.0, &pattern, &store, 120, &mut sink);
        assert_eq!(sink.events.len(), before);
    }

    #[test]
    fn stop_discards_pending_visuals() {
        let pattern = four_on_the_floor(0);
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        sched.tick(0.0, &pattern, &store, 120, &mut sink);
        sched.stop();
        assert!(sched.drain_due(f64::MAX).is_empty());
    }

    #[test]
    fn missing_sample_is_skipped_but_still_flashes() {
        let mut pattern = four_on_the_floor(0);
        pattern.step_mut(1, 0).toggle(); // row 1 has no sample
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        sched.tick(0.0, &pattern, &store, 120, &mut sink);

        let row0_id = store.get(0).map(|s| s.id);
        assert!(sink.events.iter().all(|&(id, _, _)| Some(id) == row0_id));

        let events = sched.drain_due(0.0);
        assert_eq!(events[0].step, 0);
        assert_eq!(events[0].fired, vec![0, 1]);
    }

    #[test]
    fn tempo_change_applies_from_next_increment() {
        let mut pattern = Pattern::default();
        for idx in 0..NUM_STEPS {
            pattern.step_mut(0, idx).toggle();
        }
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        sched.tick(0.0, &pattern, &store, 120, &mut sink); // schedules t=0.0 only
        assert_eq!(sink.events.len(), 1);

        sched.tick(0.5, &pattern, &store, 240, &mut sink);
        let times: Vec<f64> = sink.events.iter().map(|e| e.2).collect();

        // the step pending from the 120 BPM pass keeps its old offset...
        assert_eq!(times[1] - times[0], 0.125);
        // ...and everything after it moves at the 240 BPM interval
        for pair in times[1..].windows(2) {
            assert_eq!(pair[1] - pair[0], 0.0625);
        }
    }

    #[test]
    fn visuals_release_only_when_due() {
        let pattern = four_on_the_floor(0);
        let store = store_with_rows(&[0]);
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        let mut now = 0.0;
        while now < 1.0 {
            sched.tick(now, &pattern, &store, 120, &mut sink);
            now += 0.025;
        }

        let early = sched.drain_due(0.3);
        assert!(!early.is_empty());
        assert!(early.iter().all(|ev| ev.at <= 0.3));

        let later = sched.drain_due(0.6);
        assert!(later.iter().all(|ev| ev.at > 0.3 && ev.at <= 0.6));
    }

    #[test]
    fn step_cursor_wraps_mod_16() {
        let pattern = Pattern::default();
        let store = SampleStore::new();
        let mut sink = RecordingSink::default();
        let mut sched = Scheduler::new();

        sched.start(0.0);
        let mut now = 0.0;
        while now < 2.5 {
            sched.tick(now, &pattern, &store, 120, &mut sink);
            now += 0.025;
        }
        let events = sched.drain_due(f64::MAX);
        for (k, ev) in events.iter().enumerate() {
            assert_eq!(ev.step, k % NUM_STEPS);
        }
        assert!(events.len() > NUM_STEPS); // wrapped at least once
    }
}

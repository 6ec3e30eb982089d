// Instrument-indexed sample slots. The control thread keeps its own copy of
// each buffer (the offline renderer mixes from it); the engine gets a clone
// at registration and only ever sees SampleIds after that.

use std::path::Path;
use std::sync::Arc;

use crate::audio::{SampleBuffer, SampleId, next_sample_id};
use crate::audio_api::AudioCommand;
use crate::shared::{INSTRUMENTS, NUM_INSTRUMENTS};

pub struct LoadedSample {
    pub id: SampleId,
    pub buffer: Arc<SampleBuffer>,
}

pub struct SampleStore {
    slots: [Option<LoadedSample>; NUM_INSTRUMENTS],
}

impl Default for SampleStore {
    fn default() -> Self {
        Self {
            slots: std::array::from_fn(|_| None),
        }
    }
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, instrument: usize) -> Option<&LoadedSample> {
        self.slots.get(instrument)?.as_ref()
    }

    pub fn is_loaded(&self, instrument: usize) -> bool {
        self.get(instrument).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(|s| s.is_none())
    }

    // Replace (or fill) a slot and hand back the registration command for
    // the engine. Replacement mints a fresh id; the engine keeps the old
    // buffer around, but nothing triggers it anymore.
    pub fn insert(&mut self, instrument: usize, buffer: SampleBuffer) -> AudioCommand {
        let id = next_sample_id();
        let shared = Arc::new(buffer);
        let register = AudioCommand::RegisterSample {
            id,
            buffer: (*shared).clone(),
        };
        self.slots[instrument] = Some(LoadedSample { id, buffer: shared });
        register
    }

    // Scan <dir>/sounds/<name>.wav for every instrument. Missing files and
    // decode failures just leave the slot as it was; an absent sample is a
    // skipped trigger, never an error.
    pub fn load_from_dir(&mut self, dir: &Path, sample_rate: u32) -> Vec<AudioCommand> {
        let sounds = dir.join("sounds");
        let mut cmds = Vec::new();
        for (i, inst) in INSTRUMENTS.iter().enumerate() {
            let path = sounds.join(format!("{}.wav", inst.name));
            if !path.exists() {
                continue;
            }
            match SampleBuffer::load_wav(&path, sample_rate) {
                Ok(buffer) => cmds.push(self.insert(i, buffer)),
                Err(e) => eprintln!("stepbox: could not load {}: {e}", path.display()),
            }
        }
        cmds
    }
}

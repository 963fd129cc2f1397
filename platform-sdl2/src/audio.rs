use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

/// Number of samples over which to fade in/out (~5.8 ms at 44.1 kHz),
/// avoiding the click a hard on/off transition would put in the waveform.
const FADE_SAMPLES: u32 = 256;

/// The CHIP-8 sound timer only carries one bit of information (playing or
/// not); this generates a fixed-frequency square wave for as long as
/// `playing` is set, with a fade ramp at each on/off edge.
pub(crate) struct BeepPlayer {
    playing: Arc<AtomicBool>,
    was_playing: bool,
    phase: f32,
    phase_step: f32,
    fade_pos: u32,
    fading_in: bool,
    fading_out: bool,
}

impl AudioCallback for BeepPlayer {
    type Channel = i16;
    fn callback(&mut self, out: &mut [i16]) {
        let now_playing = self.playing.load(Ordering::Relaxed);
        if now_playing && !self.was_playing {
            self.fading_in = true;
            self.fading_out = false;
            self.fade_pos = 0;
        } else if !now_playing && self.was_playing {
            self.fading_out = true;
            self.fade_pos = 0;
        }
        self.was_playing = now_playing;

        for sample in out.iter_mut() {
            if !now_playing && !self.fading_out {
                *sample = 0;
                continue;
            }

            self.phase = (self.phase + self.phase_step) % 1.0;
            let raw: i16 = if self.phase < 0.5 { 8000 } else { -8000 };

            if self.fading_in {
                let gain = self.fade_pos as f32 / FADE_SAMPLES as f32;
                *sample = (raw as f32 * gain) as i16;
                self.fade_pos += 1;
                if self.fade_pos >= FADE_SAMPLES {
                    self.fading_in = false;
                }
            } else if self.fading_out {
                if self.fade_pos < FADE_SAMPLES {
                    let gain = 1.0 - (self.fade_pos as f32 / FADE_SAMPLES as f32);
                    *sample = (raw as f32 * gain) as i16;
                    self.fade_pos += 1;
                } else {
                    *sample = 0;
                    self.fading_out = false;
                }
            } else {
                *sample = raw;
            }
        }
    }
}

/// Handle the runtime `Platform::beep_start`/`beep_stop` calls flip.
pub struct Beeper {
    _device: AudioDevice<BeepPlayer>,
    playing: Arc<AtomicBool>,
}

impl Beeper {
    pub fn start(&mut self) {
        self.playing.store(true, Ordering::Relaxed);
    }

    pub fn stop(&mut self) {
        self.playing.store(false, Ordering::Relaxed);
    }
}

/// Open an SDL2 audio device generating a 440 Hz square-wave beep, paused
/// until the first `Beeper::start`.
pub fn init(sdl_audio: &sdl2::AudioSubsystem) -> Beeper {
    let sample_rate = 44_100;
    let playing: Arc<AtomicBool> = Arc::new(AtomicBool::new(false));

    let desired_spec = AudioSpecDesired {
        freq: Some(sample_rate),
        channels: Some(1),
        samples: Some(512), // ~11.6 ms at 44100 Hz
    };

    let device_playing = Arc::clone(&playing);
    let device = sdl_audio
        .open_playback(None, &desired_spec, move |spec| BeepPlayer {
            playing: device_playing,
            was_playing: false,
            phase: 0.0,
            phase_step: 440.0 / spec.freq as f32,
            fade_pos: 0,
            fading_in: false,
            fading_out: false,
        })
        .expect("Failed to open SDL audio device");
    device.resume();

    Beeper { _device: device, playing }
}

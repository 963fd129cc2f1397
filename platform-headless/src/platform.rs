//! `HeadlessPlatform`: the mandatory backend for automated testing.
//! No window, no audio device, no real input source — just a frame
//! counter, a deterministic clock, and a copy of the last rendered display
//! buffer that tests can dump or compare against a reference PBM.

use chip8rec_runtime::{DISPLAY_HEIGHT, DISPLAY_WIDTH, MenuCommand, Platform};

/// A headless `Platform` that quits after a configurable number of polled
/// frames. The clock advances by exactly 16,667 µs per `sleep` call,
/// matching the scheduler's one-sleep-per-tick shape: advancing once per
/// `sleep` call, not per poll.
pub struct HeadlessPlatform {
    max_frames: u32,
    frames_elapsed: u32,
    clock_micros: u64,
    quit_requested: bool,
    beeping: bool,
    last_display: Vec<u8>,
}

impl HeadlessPlatform {
    pub fn new(max_frames: u32) -> Self {
        HeadlessPlatform {
            max_frames,
            frames_elapsed: 0,
            clock_micros: 0,
            quit_requested: false,
            beeping: false,
            last_display: vec![0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
        }
    }

    /// The most recently rendered display buffer (all zeros until the
    /// first `render` call with `display_dirty` set).
    pub fn last_display(&self) -> &[u8] {
        &self.last_display
    }

    pub fn frames_elapsed(&self) -> u32 {
        self.frames_elapsed
    }

    /// Whether `beep_start` was called more recently than `beep_stop`.
    pub fn is_beeping(&self) -> bool {
        self.beeping
    }

    /// Signal a quit on the next `should_quit` check, independent of the
    /// frame budget (used by tests that want to stop early).
    pub fn request_quit(&mut self) {
        self.quit_requested = true;
    }
}

impl Platform for HeadlessPlatform {
    fn init(&mut self, _title: &str, _scale: u32) {}

    fn shutdown(&mut self) {}

    fn render(&mut self, display: &[u8], display_width: usize, display_height: usize) {
        debug_assert_eq!(display.len(), display_width * display_height);
        self.last_display.clear();
        self.last_display.extend_from_slice(display);
    }

    fn beep_start(&mut self) {
        self.beeping = true;
    }

    fn beep_stop(&mut self) {
        self.beeping = false;
    }

    /// No real input source: every key stays unpressed. Ticks the frame
    /// counter and reports quit once `max_frames` is reached.
    fn poll_input(&mut self, keys: &mut [bool; 16]) -> bool {
        keys.fill(false);
        self.frames_elapsed += 1;
        self.should_quit()
    }

    /// No menu input source to drive a headless run.
    fn poll_menu(&mut self) -> MenuCommand {
        MenuCommand::None
    }

    fn should_quit(&self) -> bool {
        self.quit_requested || self.frames_elapsed >= self.max_frames
    }

    fn render_menu_overlay(&mut self, _entries: &[&str], _selected: usize) {}

    fn apply_settings(&mut self, _cpu_hz: u32, _volume: f32) {}

    fn now_micros(&self) -> u64 {
        self.clock_micros
    }

    fn sleep(&mut self, micros: u64) {
        self.clock_micros += micros;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quits_after_max_frames_polls() {
        let mut platform = HeadlessPlatform::new(3);
        let mut keys = [false; 16];
        assert!(!platform.poll_input(&mut keys));
        assert!(!platform.poll_input(&mut keys));
        assert!(platform.poll_input(&mut keys));
        assert!(platform.should_quit());
    }

    #[test]
    fn sleep_advances_the_monotonic_clock_by_exactly_the_requested_amount() {
        let mut platform = HeadlessPlatform::new(u32::MAX);
        assert_eq!(platform.now_micros(), 0);
        platform.sleep(16_667);
        assert_eq!(platform.now_micros(), 16_667);
        platform.sleep(16_667);
        assert_eq!(platform.now_micros(), 33_334);
    }

    #[test]
    fn render_copies_the_display_buffer_for_later_inspection() {
        let mut platform = HeadlessPlatform::new(u32::MAX);
        let mut display = vec![0u8; DISPLAY_WIDTH * DISPLAY_HEIGHT];
        display[5] = 1;
        platform.render(&display, DISPLAY_WIDTH, DISPLAY_HEIGHT);
        assert_eq!(platform.last_display()[5], 1);
    }

    #[test]
    fn request_quit_overrides_the_frame_budget() {
        let mut platform = HeadlessPlatform::new(1000);
        platform.request_quit();
        assert!(platform.should_quit());
    }

    #[test]
    fn beep_start_and_stop_toggle_is_beeping() {
        let mut platform = HeadlessPlatform::new(u32::MAX);
        assert!(!platform.is_beeping());
        platform.beep_start();
        assert!(platform.is_beeping());
        platform.beep_stop();
        assert!(!platform.is_beeping());
    }
}

//! The platform trait: the function-pointer record the runtime consumes
//! and a concrete backend (headless or SDL2) provides. Set globally via a
//! `static` before the entry routine runs, mirroring the dispatch table's
//! singleton shape.

use std::sync::{Mutex, OnceLock};

/// A navigation command from the batch catalog selection overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuCommand {
    None,
    Up,
    Down,
    Select,
    Back,
}

/// Display/audio/input backend. Object-safe so it can be boxed and set
/// behind a single global.
pub trait Platform: Send {
    fn init(&mut self, title: &str, scale: u32);
    fn shutdown(&mut self);

    /// Present the display buffer (`display_width * display_height` bytes,
    /// one per pixel, 0 or 1). Called only when `display_dirty` was set.
    fn render(&mut self, display: &[u8], display_width: usize, display_height: usize);

    fn beep_start(&mut self);
    fn beep_stop(&mut self);

    /// Update `keys` in place with the currently pressed hex-keypad keys
    /// and report whether a quit was requested. The scheduler derives
    /// `keys_prev` itself from the prior frame's `keys`.
    fn poll_input(&mut self, keys: &mut [bool; 16]) -> bool;

    fn poll_menu(&mut self) -> MenuCommand;
    fn should_quit(&self) -> bool;

    fn render_menu_overlay(&mut self, entries: &[&str], selected: usize);
    fn apply_settings(&mut self, cpu_hz: u32, volume: f32);

    fn now_micros(&self) -> u64;
    fn sleep(&mut self, micros: u64);
}

static PLATFORM: OnceLock<Mutex<Box<dyn Platform>>> = OnceLock::new();

/// Install the process-wide platform. Must be called once before the first
/// tick; calling it again replaces the previous platform.
pub fn set_platform(platform: Box<dyn Platform>) {
    match PLATFORM.get() {
        Some(lock) => *lock.lock().unwrap_or_else(|e| e.into_inner()) = platform,
        None => {
            let _ = PLATFORM.set(Mutex::new(platform));
        }
    }
}

/// Run `f` with exclusive access to the installed platform.
///
/// # Panics
/// Panics if no platform has been installed via [`set_platform`].
pub fn with_platform<R>(f: impl FnOnce(&mut dyn Platform) -> R) -> R {
    let lock = PLATFORM.get().expect("platform not installed; call set_platform first");
    let mut guard = lock.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut **guard)
}

//! Machine state: the single `Chip8Context` every emitted routine takes as
//! its first argument.

use crate::font::{FONT_BASE, FONT_DATA};

pub const MEMORY_SIZE: usize = 4096;
pub const DISPLAY_WIDTH: usize = 64;
pub const DISPLAY_HEIGHT: usize = 32;
pub const STACK_DEPTH: usize = 16;
pub const ROM_ORIGIN: u16 = 0x200;

/// The full state of one running CHIP-8 program.
///
/// One instance per active ROM. Batch-mode ROM switching resets this in
/// place rather than constructing a new one, so the font region is never
/// reloaded after the first [`Chip8Context::new`].
pub struct Chip8Context {
    pub v: [u8; 16],
    pub i: u16,
    /// Diagnostic only; emitted code tracks position via labels/resume
    /// tokens, not by reading this field.
    pub pc: u16,
    pub sp: u8,
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: [u8; MEMORY_SIZE],
    pub stack: [u16; STACK_DEPTH],
    pub display: [u8; DISPLAY_WIDTH * DISPLAY_HEIGHT],
    pub display_dirty: bool,
    pub keys: [bool; 16],
    pub keys_prev: [bool; 16],
    /// `-1` if no key has been released since the last check.
    pub last_key_released: i8,
    pub waiting_for_key: bool,
    pub wait_key_target: u8,
    pub cycles_remaining: i64,
    pub resume_pc: u16,
    pub should_yield: bool,
    pub rng_state: u64,
    pub frame_count: u64,
}

impl Chip8Context {
    /// Build a context with the font pre-loaded and a time-derived RNG seed.
    pub fn new(now_micros: u64) -> Self {
        let mut ctx = Self::blank();
        ctx.rng_state = seed_from_time(now_micros);
        ctx
    }

    /// As [`Chip8Context::new`], but with a caller-supplied RNG seed. Used by
    /// headless tests that need reproducible `RND` behavior.
    pub fn with_seed(seed: u64) -> Self {
        let mut ctx = Self::blank();
        ctx.rng_state = if seed == 0 { 1 } else { seed };
        ctx
    }

    fn blank() -> Self {
        let mut memory = [0u8; MEMORY_SIZE];
        memory[FONT_BASE as usize..FONT_BASE as usize + FONT_DATA.len()].copy_from_slice(&FONT_DATA);
        Chip8Context {
            v: [0; 16],
            i: 0,
            pc: ROM_ORIGIN,
            sp: 0,
            delay_timer: 0,
            sound_timer: 0,
            memory,
            stack: [0; STACK_DEPTH],
            display: [0; DISPLAY_WIDTH * DISPLAY_HEIGHT],
            display_dirty: false,
            keys: [false; 16],
            keys_prev: [false; 16],
            last_key_released: -1,
            waiting_for_key: false,
            wait_key_target: 0,
            cycles_remaining: 0,
            resume_pc: ROM_ORIGIN,
            should_yield: false,
            rng_state: 0x9E3779B97F4A7C15,
            frame_count: 0,
        }
    }

    /// Reset every field the batch launcher must clear when switching ROMs,
    /// leaving the font region (already part of `memory`) untouched by
    /// reloading it explicitly rather than relying on the caller.
    pub fn reset(&mut self) {
        let rng_state = self.rng_state;
        let mut fresh = Self::blank();
        fresh.rng_state = rng_state;
        *self = fresh;
    }

    /// Copy ROM bytes to `[0x200, 0x200 + data.len())`.
    pub fn load_rom(&mut self, data: &[u8]) {
        let start = ROM_ORIGIN as usize;
        self.memory[start..start + data.len()].copy_from_slice(data);
        self.pc = ROM_ORIGIN;
        self.resume_pc = ROM_ORIGIN;
    }
}

fn seed_from_time(now_micros: u64) -> u64 {
    if now_micros == 0 { 0x9E3779B97F4A7C15 } else { now_micros }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_context_has_font_preloaded() {
        let ctx = Chip8Context::new(1234);
        assert_eq!(
            &ctx.memory[FONT_BASE as usize..FONT_BASE as usize + FONT_DATA.len()],
            &FONT_DATA[..]
        );
    }

    #[test]
    fn load_rom_places_bytes_at_0x200() {
        let mut ctx = Chip8Context::with_seed(1);
        ctx.load_rom(&[0x12, 0x00]);
        assert_eq!(ctx.memory[0x200], 0x12);
        assert_eq!(ctx.memory[0x201], 0x00);
        assert_eq!(ctx.pc, 0x200);
    }

    #[test]
    fn reset_clears_registers_but_keeps_rng_state_moving() {
        let mut ctx = Chip8Context::with_seed(42);
        ctx.v[0] = 0xFF;
        ctx.display_dirty = true;
        ctx.frame_count = 99;
        let rng_before = ctx.rng_state;
        ctx.reset();
        assert_eq!(ctx.v[0], 0);
        assert!(!ctx.display_dirty);
        assert_eq!(ctx.frame_count, 0);
        assert_eq!(ctx.rng_state, rng_before);
        assert_eq!(
            &ctx.memory[FONT_BASE as usize..FONT_BASE as usize + FONT_DATA.len()],
            &FONT_DATA[..]
        );
    }

    #[test]
    fn with_seed_zero_is_remapped_to_nonzero() {
        let ctx = Chip8Context::with_seed(0);
        assert_ne!(ctx.rng_state, 0);
    }
}

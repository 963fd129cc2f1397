//! Explicit immutable emitter configuration: the recognized options and
//! quirk flags, passed into emission rather than threaded through as CLI
//! globals.

/// Platform-variant behavior toggles.
#[derive(Debug, Clone, Copy, Default)]
pub struct Quirks {
    /// Zero `VF` after `AND`/`OR`/`XOR` (original COSMAC VIP behavior).
    pub vf_reset: bool,
    /// `SHR`/`SHL` operate on `Vy` into `Vx` rather than `Vx` in place.
    pub shift_uses_vy: bool,
    /// `LD [I],Vx` / `LD Vx,[I]` advance `I` by `x + 1`.
    pub memory_increment_i: bool,
    /// `DRW` wraps rows/columns instead of clipping them at the display
    /// edge. Narrower than the default, which always wraps the sprite's
    /// origin and clips its pixels.
    pub sprite_wrap: bool,
    /// `JP V0, nnn` computes `nnn + Vx` for the `x` encoded in the
    /// instruction rather than always `V0` (some SUPER-CHIP-derived
    /// interpreters).
    pub jump_uses_vx: bool,
    /// `DRW` busy-waits for vblank before drawing (display-wait quirk).
    /// Not modeled by the cooperative scheduler (every `DRW` already runs
    /// within a single 60 Hz tick), so this is a no-op flag kept only so
    /// `EmitterOptions` exposes the full named quirk set.
    pub display_wait: bool,
}

/// The full set of recognized emitter options, passed into both emission
/// modes as an explicit immutable record.
#[derive(Debug, Clone)]
pub struct EmitterOptions {
    /// Emit `let _ = "<disassembly>";` address-marker statements ahead of
    /// every translated instruction (see `crate::control::address_marker`
    /// for why this, and not a `//` comment, is what the quote!/syn/
    /// prettyplease pipeline can actually carry through to the rendered
    /// file).
    pub emit_address_comments: bool,
    /// Emit doc comments on generated functions (module/function-level
    /// prose, independent of per-instruction address markers).
    pub emit_comments: bool,
    /// Force single-function emission even when per-function mode would
    /// be sound (`--single-function`).
    pub single_function_mode: bool,
    /// Embed the ROM bytes as a `pub static ROM_DATA: &[u8]` in the
    /// generated project. Always true in practice (`DRW`, `LD F,Vx`, and
    /// `LD B,Vx` all depend on the embedded data being addressable through
    /// `ctx.memory`, which is loaded from it at launch) — exposed as a
    /// named option for completeness.
    pub embed_rom_data: bool,
    pub quirks: Quirks,
    /// Width of the dense `JP V0` switch in single-function mode, in
    /// two-byte entries (default 16 entries = 32 bytes).
    pub jp_v0_table_entries: u16,
    /// Recommended CPU clock for the generated launcher / catalog entry.
    pub cpu_hz: u32,
}

impl Default for EmitterOptions {
    fn default() -> Self {
        EmitterOptions {
            emit_address_comments: true,
            emit_comments: true,
            single_function_mode: false,
            embed_rom_data: true,
            quirks: Quirks::default(),
            jp_v0_table_entries: 16,
            cpu_hz: 700,
        }
    }
}

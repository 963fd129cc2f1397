//! Cooperative 60 Hz scheduling: run a bounded instruction budget per
//! frame, tick timers, poll input, render if dirty, pace to 16.67 ms.

use crate::dispatch::EntryFn;
use crate::platform::with_platform;
use crate::state::{Chip8Context, DISPLAY_HEIGHT, DISPLAY_WIDTH};

const FRAME_MICROS: u64 = 16_667;

/// Run a single 60 Hz tick: execute up to `cpu_hz / 60` instructions via
/// `entry`, tick timers, poll input, render if the display changed, and
/// pace to the frame boundary using the installed platform's clock.
pub fn run_one_tick(ctx: &mut Chip8Context, entry: EntryFn, cpu_hz: u32) {
    let cycles = (cpu_hz / 60).max(1) as i64;
    ctx.cycles_remaining = cycles;

    let start = with_platform(|p| p.now_micros());

    // A single call runs the whole per-tick budget: the emitted routine
    // loops internally over labeled blocks until it yields or returns.
    let _ = entry(ctx);

    ctx.tick_timers();
    ctx.frame_count += 1;

    with_platform(|p| {
        let previous = ctx.keys;
        let mut updated = ctx.keys;
        p.poll_input(&mut updated);
        ctx.keys_prev = previous;
        ctx.keys = updated;

        if ctx.display_dirty {
            p.render(&ctx.display, DISPLAY_WIDTH, DISPLAY_HEIGHT);
            ctx.display_dirty = false;
        }

        let elapsed = p.now_micros().saturating_sub(start);
        if elapsed < FRAME_MICROS {
            p.sleep(FRAME_MICROS - elapsed);
        }
    });
}

/// Run ticks until the platform reports a quit request.
pub fn run_rom(ctx: &mut Chip8Context, entry: EntryFn, cpu_hz: u32) {
    loop {
        run_one_tick(ctx, entry, cpu_hz);
        if with_platform(|p| p.should_quit()) {
            break;
        }
    }
}

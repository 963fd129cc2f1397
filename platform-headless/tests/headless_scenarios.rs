//! The headless platform driving the real scheduler against the literal
//! end-to-end scenarios from the recompiler's testable-properties section,
//! using hand-written entry routines standing in for emitted code.

use std::sync::Mutex;

use chip8rec_platform_headless::HeadlessPlatform;
use chip8rec_runtime::{Chip8Context, ControlFlow, run_one_tick, run_rom, set_platform, with_platform};

// `set_platform` touches a process-wide static; serialize the tests in this
// file so one doesn't replace another's platform mid-run.
static PLATFORM_TEST_LOCK: Mutex<()> = Mutex::new(());

/// `func_0x200` for ROM bytes `12 00` (`JP 0x200`): self-loop that yields
/// once its cycle budget is exhausted.
fn infinite_loop_entry(ctx: &mut Chip8Context) -> ControlFlow {
    loop {
        ctx.cycles_remaining -= 1;
        if ctx.cycles_remaining <= 0 {
            ctx.resume_pc = 0x200;
            ctx.should_yield = true;
            return ControlFlow::Yielded;
        }
    }
}

/// `func_0x200` for `00 E0 6A 05` (CLS; LD VA,0x05), then an implicit halt.
fn cls_then_set_register_entry(ctx: &mut Chip8Context) -> ControlFlow {
    ctx.clear_display();
    ctx.v[0xA] = 0x05;
    ControlFlow::Returned
}

#[test]
fn scenario_1_minimal_infinite_loop_after_60_frames() {
    let _guard = PLATFORM_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    set_platform(Box::new(HeadlessPlatform::new(60)));
    let mut ctx = Chip8Context::with_seed(1);
    ctx.load_rom(&[0x12, 0x00]);

    run_rom(&mut ctx, infinite_loop_entry, 700);

    let cycles_per_tick = 700 / 60;
    assert!(ctx.frame_count as i64 * cycles_per_tick >= 60 * cycles_per_tick - 60);
    assert!(ctx.display.iter().all(|&p| p == 0));
    assert!(with_platform(|p| p.should_quit()));
}

#[test]
fn scenario_2_cls_and_set_register_after_one_frame() {
    let _guard = PLATFORM_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    set_platform(Box::new(HeadlessPlatform::new(1)));
    let mut ctx = Chip8Context::with_seed(1);

    run_one_tick(&mut ctx, cls_then_set_register_entry, 700);

    assert!(ctx.display.iter().all(|&p| p == 0));
    assert_eq!(ctx.v[0xA], 0x05);
}

#[test]
fn headless_clock_advances_by_one_frame_period_per_tick() {
    let _guard = PLATFORM_TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    set_platform(Box::new(HeadlessPlatform::new(3)));
    let mut ctx = Chip8Context::with_seed(1);

    run_one_tick(&mut ctx, cls_then_set_register_entry, 700);
    let after_one = with_platform(|p| p.now_micros());
    run_one_tick(&mut ctx, cls_then_set_register_entry, 700);
    let after_two = with_platform(|p| p.now_micros());

    assert_eq!(after_two - after_one, 16_667);
}

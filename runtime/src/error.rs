//! The single call site every runtime panic goes through.

/// Print `"chip8 runtime panic at {addr:#05X}: {msg}"` to stderr and abort
/// the process. Every runtime panic case (unregistered computed-jump
/// target, stack overflow/underflow, invalid instruction reached) goes
/// through this function so the diagnostic format never drifts between
/// call sites.
pub fn runtime_panic(msg: &str, addr: u16) -> ! {
    eprintln!("chip8 runtime panic at {addr:#05X}: {msg}");
    panic!("chip8 runtime panic at {addr:#05X}: {msg}");
}

//! The process-wide computed-jump dispatch table: a single owning array
//! behind a narrow interface (`register`, `lookup`, `clear_all`), the only
//! mutable global in this crate besides the platform singleton in
//! [`crate::platform`].

use std::sync::{Mutex, OnceLock};

use crate::state::Chip8Context;

/// Outcome of an emitted routine returning control to its caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlFlow {
    /// The cycle budget ran out; `ctx.resume_pc` names where to continue.
    Yielded,
    /// The routine ran to completion (fell through its last block or hit a
    /// `RET` with an empty software call stack).
    Returned,
}

/// Signature of every emitted function-pointer-table entry: a per-function
/// routine in per-function mode, or the single `run` routine in
/// single-function mode. Direct `CALL`/`JP` transfers compile to ordinary
/// Rust calls against the named routine, so no routine needs the dispatch
/// table passed in; only a computed jump (`JP V0`) looks one up, and it does
/// so through [`with_dispatch_table`] rather than a threaded parameter.
pub type EntryFn = fn(&mut Chip8Context) -> ControlFlow;

const TABLE_SIZE: usize = 4096;

/// Address-indexed function pointer array, `[0, 4096)`.
pub struct DispatchTable {
    slots: Box<[Option<EntryFn>]>,
}

impl DispatchTable {
    pub fn new() -> Self {
        DispatchTable {
            slots: vec![None; TABLE_SIZE].into_boxed_slice(),
        }
    }

    pub fn register(&mut self, addr: u16, f: EntryFn) {
        self.slots[addr as usize & (TABLE_SIZE - 1)] = Some(f);
    }

    pub fn lookup(&self, addr: u16) -> Option<EntryFn> {
        self.slots[addr as usize & (TABLE_SIZE - 1)]
    }

    pub fn clear_all(&mut self) {
        self.slots.fill(None);
    }
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

static DISPATCH: OnceLock<Mutex<DispatchTable>> = OnceLock::new();

/// Run `f` with exclusive access to the process-wide dispatch table.
pub fn with_dispatch_table<R>(f: impl FnOnce(&mut DispatchTable) -> R) -> R {
    let lock = DISPATCH.get_or_init(|| Mutex::new(DispatchTable::new()));
    let mut table = lock.lock().unwrap_or_else(|e| e.into_inner());
    f(&mut table)
}

/// The ROM-switch transaction: clear every registered function, register
/// the new ROM's functions, reset machine state, and load the new ROM's
/// bytes at `0x200`. Running the new entry routine is the caller's next
/// step, not part of this transaction.
pub fn switch_rom(ctx: &mut Chip8Context, register_hook: impl FnOnce(&mut DispatchTable), rom_data: &[u8]) {
    with_dispatch_table(|table| {
        table.clear_all();
        register_hook(table);
    });
    ctx.reset();
    ctx.load_rom(rom_data);
}

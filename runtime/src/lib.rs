//! Runtime contract linked by every project `chip8rec-codegen` emits.
//!
//! Nothing here is invoked by the recompiler itself; the recompiler only
//! emits references to these items by path. This crate owns the machine
//! state layout, the instruction helper behaviors, the computed-jump
//! dispatch table, the platform trait, and the cooperative scheduler.

pub mod dispatch;
pub mod error;
pub mod font;
pub mod helpers;
pub mod platform;
pub mod rng;
pub mod scheduler;
pub mod state;

pub use dispatch::{ControlFlow, DispatchTable, EntryFn, switch_rom, with_dispatch_table};
pub use error::runtime_panic;
pub use platform::{MenuCommand, Platform, set_platform, with_platform};
pub use scheduler::{run_one_tick, run_rom};
pub use state::{Chip8Context, DISPLAY_HEIGHT, DISPLAY_WIDTH};

pub mod prelude {
    pub use crate::{
        ControlFlow, Chip8Context, DISPLAY_HEIGHT, DISPLAY_WIDTH, DispatchTable, EntryFn,
        MenuCommand, Platform, run_one_tick, run_rom, runtime_panic, set_platform, switch_rom,
        with_dispatch_table, with_platform,
    };
}

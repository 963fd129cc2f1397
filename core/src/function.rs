//! Functions: the set of blocks reachable from a call target without
//! crossing into another function.

use std::collections::BTreeSet;

/// A function is identified by its entry address; every call target in the
/// ROM is a function, and the program entry (`0x200`) always is too.
#[derive(Debug, Clone)]
pub struct Function {
    /// Conventional name, e.g. `func_0x200` (single-ROM) or
    /// `pong_func_0x200` (batch mode, prefixed by ROM identifier).
    pub name: String,
    /// The function's entry address.
    pub entry: u16,
    /// Addresses of every basic block reachable from `entry` without
    /// crossing another call target.
    pub block_addresses: BTreeSet<u16>,
}

impl Function {
    pub fn new(entry: u16, prefix: &str) -> Self {
        let name = if prefix.is_empty() {
            format!("func_0x{entry:03X}")
        } else {
            format!("{prefix}_func_0x{entry:03X}")
        };
        Function {
            name,
            entry,
            block_addresses: BTreeSet::new(),
        }
    }
}

//! Basic blocks, the analyzer's primary unit of control flow.

use std::collections::BTreeSet;

/// A maximal straight-line run of instructions: control enters only at
/// `start` and leaves only after the last instruction before `end`.
#[derive(Debug, Clone)]
pub struct BasicBlock {
    /// Address of the first instruction in the block.
    pub start: u16,
    /// One past the address of the last instruction's last byte.
    pub end: u16,
    /// Indices into the analyzer's instruction vector, in address order.
    pub instruction_indices: Vec<usize>,
    /// Addresses control may transfer to when this block ends.
    pub successors: BTreeSet<u16>,
    /// Addresses of blocks that can transfer control into this one.
    pub predecessors: BTreeSet<u16>,
    /// True if this block is a function's entry block.
    pub is_function_entry: bool,
    /// True if this block is reachable from `{entry} ∪ call_targets`.
    pub is_reachable: bool,
}

impl BasicBlock {
    pub fn new(start: u16) -> Self {
        BasicBlock {
            start,
            end: start,
            instruction_indices: Vec::new(),
            successors: BTreeSet::new(),
            predecessors: BTreeSet::new(),
            is_function_entry: false,
            is_reachable: false,
        }
    }

    /// A conventional label identifier for this block's address, e.g.
    /// `label_0x250`.
    pub fn label(&self) -> String {
        format!("label_0x{:03X}", self.start)
    }
}

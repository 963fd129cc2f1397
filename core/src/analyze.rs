//! Control-flow analysis (stage C): basic blocks, functions, reachability,
//! and the label/call-target/computed-jump sets the emitter needs.

use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

use crate::block::BasicBlock;
use crate::function::Function;
use crate::instruction::{Instruction, InstructionKind};
use crate::stats::AnalysisStats;

/// The aggregate result of analyzing a decoded instruction stream.
pub struct AnalysisResult {
    pub instructions: Vec<Instruction>,
    address_index: HashMap<u16, usize>,
    pub blocks: BTreeMap<u16, BasicBlock>,
    pub functions: BTreeMap<u16, Function>,
    pub label_addresses: BTreeSet<u16>,
    pub call_targets: BTreeSet<u16>,
    pub computed_jump_bases: BTreeSet<u16>,
    pub entry: u16,
}

/// Run the analyzer over a decoded instruction stream.
///
/// `prefix` names the batch namespace (empty in single-ROM mode) used when
/// constructing [`Function`] names.
pub fn analyze(instructions: &[Instruction], entry: u16) -> AnalysisResult {
    analyze_with_prefix(instructions, entry, "")
}

/// As [`analyze`], but with an explicit function-name prefix (used by the
/// batch orchestrator to keep per-ROM functions collision-free).
pub fn analyze_with_prefix(instructions: &[Instruction], entry: u16, prefix: &str) -> AnalysisResult {
    let instructions = instructions.to_vec();
    let mut address_index = HashMap::with_capacity(instructions.len());
    for (i, instr) in instructions.iter().enumerate() {
        address_index.insert(instr.address, i);
    }

    // --- Step 1: target collection -----------------------------------
    let mut label_addresses = BTreeSet::new();
    let mut call_targets = BTreeSet::new();
    let mut computed_jump_bases = BTreeSet::new();

    for instr in &instructions {
        match instr.kind {
            InstructionKind::Jp => {
                label_addresses.insert(instr.nnn);
            }
            InstructionKind::Call => {
                label_addresses.insert(instr.nnn);
                call_targets.insert(instr.nnn);
            }
            InstructionKind::JpV0 => {
                computed_jump_bases.insert(instr.nnn);
            }
            _ => {}
        }
        if instr.is_branch {
            label_addresses.insert(instr.address.wrapping_add(2));
            label_addresses.insert(instr.address.wrapping_add(4));
        }
    }
    call_targets.insert(entry);

    // --- Step 2: block starts -----------------------------------------
    let mut block_starts: BTreeSet<u16> = BTreeSet::new();
    block_starts.insert(entry);
    block_starts.extend(label_addresses.iter().copied());
    block_starts.extend(call_targets.iter().copied());
    for instr in &instructions {
        if instr.is_terminator() {
            let after = instr.address.wrapping_add(2);
            if address_index.contains_key(&after) {
                block_starts.insert(after);
            }
        }
    }
    // Only keep block starts that actually land on a decoded address.
    block_starts.retain(|addr| address_index.contains_key(addr));

    // --- Step 3: block construction -------------------------------------
    let mut blocks: BTreeMap<u16, BasicBlock> = BTreeMap::new();
    for &start in &block_starts {
        let mut block = BasicBlock::new(start);
        let mut addr = start;
        loop {
            let Some(&idx) = address_index.get(&addr) else {
                break;
            };
            let instr = &instructions[idx];
            block.instruction_indices.push(idx);
            block.end = instr.next_address();

            if instr.is_branch {
                block.successors.insert(instr.address.wrapping_add(2));
                block.successors.insert(instr.address.wrapping_add(4));
                break;
            }
            if instr.kind == InstructionKind::JpV0 {
                // Resolved at emission; no static successors.
                break;
            }
            if instr.kind == InstructionKind::Jp {
                block.successors.insert(instr.nnn);
                break;
            }
            if instr.is_return {
                break;
            }

            let next = addr.wrapping_add(2);
            if block_starts.contains(&next) {
                if address_index.contains_key(&next) {
                    block.successors.insert(next);
                }
                break;
            }
            if address_index.contains_key(&next) {
                addr = next;
                continue;
            }
            break;
        }
        blocks.insert(start, block);
    }

    // --- Step 4: predecessors (transpose of successors) ------------------
    let successor_pairs: Vec<(u16, u16)> = blocks
        .values()
        .flat_map(|b| b.successors.iter().map(move |&s| (b.start, s)))
        .collect();
    for (from, to) in successor_pairs {
        if let Some(target) = blocks.get_mut(&to) {
            target.predecessors.insert(from);
        }
    }

    // --- Step 5: reachability BFS -----------------------------------------
    let roots: BTreeSet<u16> = std::iter::once(entry)
        .chain(call_targets.iter().copied())
        .filter(|a| blocks.contains_key(a))
        .collect();
    let mut reachable: BTreeSet<u16> = BTreeSet::new();
    let mut queue: VecDeque<u16> = roots.into_iter().collect();
    while let Some(addr) = queue.pop_front() {
        if !reachable.insert(addr) {
            continue;
        }
        let Some(block) = blocks.get(&addr) else {
            continue;
        };
        for &succ in &block.successors {
            if blocks.contains_key(&succ) && !reachable.contains(&succ) {
                queue.push_back(succ);
            }
        }
    }
    for (&addr, block) in blocks.iter_mut() {
        block.is_reachable = reachable.contains(&addr);
    }

    // --- Step 6: function partitioning -------------------------------------
    let mut functions: BTreeMap<u16, Function> = BTreeMap::new();
    for &target in &call_targets {
        if !blocks.contains_key(&target) {
            continue;
        }
        let mut function = Function::new(target, prefix);
        let mut visited: BTreeSet<u16> = BTreeSet::new();
        let mut queue: VecDeque<u16> = VecDeque::new();
        visited.insert(target);
        queue.push_back(target);
        while let Some(addr) = queue.pop_front() {
            let Some(block) = blocks.get(&addr) else {
                continue;
            };
            for &succ in &block.successors {
                if !blocks.contains_key(&succ) {
                    continue;
                }
                if succ != target && call_targets.contains(&succ) {
                    // Another function's entry dominates its own function.
                    continue;
                }
                if visited.insert(succ) {
                    queue.push_back(succ);
                }
            }
        }
        function.block_addresses = visited;
        functions.insert(target, function);
    }
    for (&addr, block) in blocks.iter_mut() {
        block.is_function_entry = call_targets.contains(&addr);
    }

    AnalysisResult {
        instructions,
        address_index,
        blocks,
        functions,
        label_addresses,
        call_targets,
        computed_jump_bases,
        entry,
    }
}

impl AnalysisResult {
    /// Look up the decoded instruction at `address`, if any.
    pub fn instruction_at(&self, address: u16) -> Option<&Instruction> {
        self.address_index.get(&address).map(|&i| &self.instructions[i])
    }

    /// Aggregate statistics for the CLI's phase progress summary.
    pub fn stats(&self) -> AnalysisStats {
        let reachable_instructions: usize = self
            .blocks
            .values()
            .filter(|b| b.is_reachable)
            .map(|b| b.instruction_indices.len())
            .sum();
        let total = self.instructions.len();
        AnalysisStats {
            total_instructions: total,
            reachable_instructions,
            unreachable_instructions: total.saturating_sub(reachable_instructions),
            block_count: self.blocks.len(),
            function_count: self.functions.len(),
            computed_jump_count: self.computed_jump_bases.len(),
        }
    }

    /// Plain-text disassembly listing with block/function boundaries
    /// marked, for the CLI's `--disasm` flag.
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for (&start, block) in &self.blocks {
            if block.is_function_entry {
                out.push_str(&format!("; function entry 0x{start:03X}\n"));
            }
            out.push_str(&format!(
                "{}: ; reachable={}\n",
                block.label(),
                block.is_reachable
            ));
            for &idx in &block.instruction_indices {
                let instr = &self.instructions[idx];
                out.push_str(&format!("    0x{:03X}  {}\n", instr.address, instr.disassemble()));
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::decode_all;

    #[test]
    fn minimal_infinite_loop_single_block() {
        // JP 0x200
        let result = analyze(&decode_all(&[0x12, 0x00]), 0x200);
        assert_eq!(result.blocks.len(), 1);
        let block = &result.blocks[&0x200];
        assert_eq!(block.successors, BTreeSet::from([0x200]));
        assert!(block.is_reachable);
    }

    #[test]
    fn branch_creates_two_successors_and_skip_targets_are_labels() {
        // 3000: SE V0, 0x00 ; 3002: JP 0x300 ; 3004: JP 0x304(no-op filler)
        let bytes = vec![0x30, 0x00, 0x13, 0x06, 0x00, 0x00, 0x13, 0x06];
        let result = analyze(&decode_all(&bytes), 0x200);
        let entry_block = &result.blocks[&0x200];
        assert_eq!(entry_block.successors, BTreeSet::from([0x202, 0x204]));
        assert!(result.label_addresses.contains(&0x202));
        assert!(result.label_addresses.contains(&0x204));
    }

    #[test]
    fn call_target_always_becomes_a_function_and_block_start() {
        // 200: CALL 0x206 ; 202: JP 0x202 (halt) ; 204: pad ; 206: RET
        let bytes = vec![0x22, 0x06, 0x12, 0x02, 0x00, 0x00, 0x00, 0xEE];
        let result = analyze(&decode_all(&bytes), 0x200);
        assert!(result.call_targets.contains(&0x206));
        assert!(result.functions.contains_key(&0x206));
        assert!(result.functions.contains_key(&0x200));
        let callee = &result.functions[&0x206];
        assert!(callee.block_addresses.contains(&0x206));
    }

    #[test]
    fn computed_jump_base_recorded_without_static_successors() {
        // 200: JP V0, 0x300
        let bytes = vec![0xB3, 0x00];
        let result = analyze(&decode_all(&bytes), 0x200);
        assert!(result.computed_jump_bases.contains(&0x300));
        let block = &result.blocks[&0x200];
        assert!(block.successors.is_empty());
    }

    #[test]
    fn successors_and_predecessors_are_mutually_inverse() {
        let bytes = vec![0x30, 0x00, 0x13, 0x06, 0x00, 0x00, 0x13, 0x06];
        let result = analyze(&decode_all(&bytes), 0x200);
        for (&addr, block) in &result.blocks {
            for &succ in &block.successors {
                if let Some(target) = result.blocks.get(&succ) {
                    assert!(
                        target.predecessors.contains(&addr),
                        "block {succ:03X} missing predecessor {addr:03X}"
                    );
                }
            }
        }
    }

    #[test]
    fn unreachable_block_is_marked_and_counted() {
        // 200: JP 0x206 ; 202: CLS (dead, never reached) ; 204: JP 0x204 ; 206: JP 0x206
        let bytes = vec![0x12, 0x06, 0x00, 0xE0, 0x12, 0x04, 0x12, 0x06];
        let result = analyze(&decode_all(&bytes), 0x200);
        let dead = &result.blocks[&0x202];
        assert!(!dead.is_reachable);
        let stats = result.stats();
        assert!(stats.unreachable_instructions >= 1);
    }

    #[test]
    fn reachability_is_exactly_the_closure_of_entry_and_call_targets() {
        let bytes = vec![
            0x22, 0x06, // 200: CALL 0x206
            0x12, 0x02, // 202: JP 0x202 (halt)
            0x00, 0x00, // 204: pad, unreachable (no predecessor reaches it)
            0x00, 0xEE, // 206: RET
        ];
        let result = analyze(&decode_all(&bytes), 0x200);
        assert!(result.blocks[&0x200].is_reachable);
        assert!(result.blocks[&0x202].is_reachable);
        assert!(result.blocks[&0x206].is_reachable);
        assert!(!result.blocks[&0x204].is_reachable);
    }

    #[test]
    fn sys_is_not_a_terminator_and_does_not_split_block() {
        // 200: SYS 0x000 ; 202: CLS ; 204: JP 0x204 (self-loop, forces a
        // block start at 0x204 but not between 0x200 and 0x202).
        let bytes = vec![0x00, 0x00, 0x00, 0xE0, 0x12, 0x04];
        let result = analyze(&decode_all(&bytes), 0x200);
        assert_eq!(result.blocks.len(), 2);
        let entry_block = &result.blocks[&0x200];
        assert_eq!(entry_block.instruction_indices.len(), 2);
        assert_eq!(entry_block.successors, BTreeSet::from([0x204]));
    }
}

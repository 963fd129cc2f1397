//! Lowers a set of basic blocks into a labeled `loop { match __pc { ... } }`
//! state machine — the "inlined state machine per function" fallback for
//! a target language with no `goto`. Per-function and
//! single-function emission share this walk; they differ only in how
//! `CALL`/`RET`/`JP`/`JP V0` resolve, which is exactly what
//! [`ControlLowering`] abstracts over.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;

use chip8rec_core::{AnalysisResult, BasicBlock, Instruction, InstructionKind};

use crate::instr_codegen::{address_marker, emit_instruction_effect, skip_condition};
use crate::options::EmitterOptions;

pub trait ControlLowering {
    /// `CALL nnn`, called with the address execution resumes at once the
    /// callee returns.
    fn lower_call(&self, target: u16, return_addr: u16, analysis: &AnalysisResult) -> TokenStream;
    /// `RET`.
    fn lower_ret(&self) -> TokenStream;
    /// An unconditional transfer to `target` that both modes reach by
    /// setting `__pc` and looping: skip-branch targets, block fallthrough,
    /// and any `JP` this lowering resolves to a label within its own reach.
    fn lower_goto(&self, target: u16) -> TokenStream;
    /// `JP nnn`, resolved against the current emission scope (same function
    /// vs. cross-function tail call vs. the single flat function).
    fn lower_jump(&self, target: u16, analysis: &AnalysisResult) -> TokenStream;
    /// `JP V0, nnn` (or, under the `jump_uses_vx` quirk, `JP Vx, nnn` where
    /// `reg` is the `x` nibble encoded in the instruction rather than
    /// always `0`). `yields` is set when the enclosing block needs a yield
    /// check; single-function mode's dense switch resolves each candidate
    /// target to a literal address and can yield-check it directly,
    /// per-function mode's dispatch-table lookup has no literal resume
    /// target available and ignores the flag.
    fn lower_jp_v0(&self, base: u16, analysis: &AnalysisResult, yields: bool, reg: u8) -> TokenStream;
}

pub(crate) fn yield_check(resume: u16) -> TokenStream {
    quote! {
        ctx.cycles_remaining -= 1;
        if ctx.cycles_remaining <= 0 {
            ctx.resume_pc = #resume;
            ctx.should_yield = true;
            return chip8rec_runtime::ControlFlow::Yielded;
        }
    }
}

/// Emit one `match` arm per block in `blocks`, keyed by its start address —
/// except a block that needs a yield check, which is split into one arm
/// *per instruction address* instead. A yield can suspend mid-block, and
/// the resume prologue only matches addresses that have their own arm
/// (`RESUMABLE_LABELS` is built from the same per-instruction addresses in
/// [`resumable_addresses`]), so a block-granularity arm would silently
/// restart the block from its first instruction on resume, re-running
/// whatever ran before the yield point.
pub fn emit_block_arms(
    blocks: &[&BasicBlock],
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    needs_yield: &HashSet<u16>,
    lowering: &dyn ControlLowering,
) -> TokenStream {
    let mut arms = TokenStream::new();
    for block in blocks {
        if needs_yield.contains(&block.start) {
            arms.extend(emit_yielding_block_arms(block, analysis, opts, lowering));
        } else {
            let addr = block.start;
            let body = emit_block_body(block, analysis, opts, lowering);
            arms.extend(quote! { #addr => { #body } });
        }
    }
    arms
}

/// Every instruction address that needs its own resumable `match` arm:
/// every instruction belonging to a block in `needs_yield`.
pub fn resumable_addresses(blocks: &[&BasicBlock], analysis: &AnalysisResult, needs_yield: &HashSet<u16>) -> Vec<u16> {
    let mut addrs = Vec::new();
    for block in blocks {
        if !needs_yield.contains(&block.start) {
            continue;
        }
        for &idx in &block.instruction_indices {
            addrs.push(analysis.instructions[idx].address);
        }
    }
    addrs
}

/// A block that needs a yield check, lowered as one `match` arm per
/// instruction address rather than one arm for the whole block, so a
/// yield recorded mid-block resumes at the exact instruction that yielded
/// instead of re-running the block from its start.
fn emit_yielding_block_arms(
    block: &BasicBlock,
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    lowering: &dyn ControlLowering,
) -> TokenStream {
    let mut arms = TokenStream::new();
    let indices = &block.instruction_indices;
    for (i, &idx) in indices.iter().enumerate() {
        let instr = &analysis.instructions[idx];
        let addr = instr.address;
        let is_last = i + 1 == indices.len();
        // Every instruction is its own arm here, so a non-last one must
        // still transfer control explicitly to the next instruction's arm
        // — unlike the combined block body, there is no following
        // statement to fall into. That next address was always decoded
        // (it's the next entry in this same block's instruction list), so
        // it gets a plain goto rather than going through
        // `lower_fallthrough`'s "does this address even have a block"
        // check, which only recognizes block-start addresses.
        let body = emit_instruction(instr, analysis, opts, true, is_last, lowering);
        arms.extend(quote! { #addr => { #body } });
    }
    arms
}

fn emit_block_body(
    block: &BasicBlock,
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    lowering: &dyn ControlLowering,
) -> TokenStream {
    let mut out = TokenStream::new();
    let indices = &block.instruction_indices;

    for (i, &idx) in indices.iter().enumerate() {
        let instr = &analysis.instructions[idx];
        let is_last = i + 1 == indices.len();
        out.extend(emit_instruction(instr, analysis, opts, false, is_last, lowering));
    }

    out
}

/// Lower one instruction to its effect plus whatever transfers control to
/// the next address. For the non-terminator kinds (`Call`, `LdVxK`, plain
/// ALU/data ops), the transfer differs by context:
/// - combined (non-yielding) block body, not the last instruction: no
///   transfer at all — the next instruction is the next statement in the
///   same arm.
/// - combined block body, last instruction: `lower_fallthrough`, which
///   gotos if `next` is a block start or returns naturally if the ROM has
///   no more decoded code there.
/// - split per-instruction arm (yielding block), not the last instruction:
///   an unconditional goto straight to `next`'s own arm (see
///   [`emit_yielding_block_arms`]).
/// - split per-instruction arm, last instruction: same `lower_fallthrough`
///   as the combined case, since `next` here really does leave the block.
fn emit_instruction(
    instr: &Instruction,
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    yields: bool,
    is_last: bool,
    lowering: &dyn ControlLowering,
) -> TokenStream {
    let mut out = address_marker(instr, opts);

    match instr.kind {
        InstructionKind::Call => {
            let next = instr.next_address();
            out.extend(lowering.lower_call(instr.nnn, next, analysis));
            if yields {
                out.extend(yield_check(next));
            }
            out.extend(transfer(next, is_last, yields, analysis, lowering));
        }
        InstructionKind::Ret => {
            out.extend(lowering.lower_ret());
        }
        InstructionKind::Jp => {
            if yields {
                out.extend(yield_check(instr.nnn));
            }
            out.extend(lowering.lower_jump(instr.nnn, analysis));
        }
        InstructionKind::JpV0 => {
            let reg = if opts.quirks.jump_uses_vx { instr.x } else { 0 };
            out.extend(lowering.lower_jp_v0(instr.nnn, analysis, yields, reg));
        }
        InstructionKind::LdVxK => {
            out.extend(emit_wait_key(instr));
            let next = instr.next_address();
            if yields {
                out.extend(yield_check(next));
            }
            out.extend(transfer(next, is_last, yields, analysis, lowering));
        }
        _ if instr.is_branch => {
            out.extend(emit_branch(instr, yields, lowering));
        }
        _ => {
            out.extend(emit_instruction_effect(instr, opts));
            let next = instr.next_address();
            if yields {
                out.extend(yield_check(next));
            }
            out.extend(transfer(next, is_last, yields, analysis, lowering));
        }
    }

    out
}

/// Transfer control to `next` after a non-terminator instruction. The last
/// instruction of a block (yielding or not) goes through
/// [`lower_fallthrough`] since `next` genuinely leaves this instruction
/// list. A non-last instruction inside a split yielding block still needs
/// an explicit goto to its sibling arm (see [`emit_yielding_block_arms`]);
/// a non-last instruction inside a combined, non-yielding block needs
/// nothing at all — the next instruction is simply the next statement.
fn transfer(next: u16, is_last: bool, yields: bool, analysis: &AnalysisResult, lowering: &dyn ControlLowering) -> TokenStream {
    if is_last {
        lower_fallthrough(next, analysis, lowering)
    } else if yields {
        lowering.lower_goto(next)
    } else {
        TokenStream::new()
    }
}

/// Transfer control to `next`: a goto if it is a decoded block start,
/// otherwise a natural return — the ROM simply has no more code to run
/// past this point (e.g. a straight-line program with no trailing loop).
fn lower_fallthrough(next: u16, analysis: &AnalysisResult, lowering: &dyn ControlLowering) -> TokenStream {
    if analysis.blocks.contains_key(&next) {
        lowering.lower_goto(next)
    } else {
        quote! { return chip8rec_runtime::ControlFlow::Returned; }
    }
}

/// `LD Vx, K`: block until a key-release edge arrives. Re-entrant across
/// yields by construction — `poll_wait_key` tracks its own "waiting" state
/// on `Chip8Context`, and this instruction's own address is the resume
/// point, so revisiting it is exactly "check again."
fn emit_wait_key(instr: &Instruction) -> TokenStream {
    let reg = instr.x as usize;
    let addr = instr.address;
    quote! {
        if !ctx.poll_wait_key(#reg as u8) {
            ctx.resume_pc = #addr;
            ctx.should_yield = true;
            return chip8rec_runtime::ControlFlow::Yielded;
        }
    }
}

fn emit_branch(instr: &Instruction, yields: bool, lowering: &dyn ControlLowering) -> TokenStream {
    let cond = skip_condition(instr);
    let taken = instr.address.wrapping_add(4);
    let fall = instr.address.wrapping_add(2);
    let taken_yield = if yields { yield_check(taken) } else { TokenStream::new() };
    let fall_yield = if yields { yield_check(fall) } else { TokenStream::new() };
    let goto_taken = lowering.lower_goto(taken);
    let goto_fall = lowering.lower_goto(fall);
    quote! {
        if #cond {
            #taken_yield
            #goto_taken
        } else {
            #fall_yield
            #goto_fall
        }
    }
}

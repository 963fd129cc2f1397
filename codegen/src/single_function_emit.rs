//! Single-function emission mode: the whole program becomes one `fn
//! run`. `CALL`/`RET` no longer use the Rust call stack — they push/pop a
//! software call stack instead, so a yield inside what was a deeply nested
//! subroutine can resume directly into this one function next frame. That
//! software stack is `Chip8Context::stack`/`sp` (the CHIP-8 hardware stack
//! fields already on the context for exactly this purpose), not a
//! function-local `Vec`: state that must survive a `Yielded` return has to
//! live on the context, since the stack frame that would hold a local `Vec`
//! is gone by the time the scheduler calls `run` again.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;

use chip8rec_core::AnalysisResult;

use crate::control::{ControlLowering, emit_block_arms, resumable_addresses};
use crate::options::EmitterOptions;

struct SingleFunctionLowering {
    jp_v0_table_entries: u16,
}

impl ControlLowering for SingleFunctionLowering {
    fn lower_call(&self, target: u16, return_addr: u16, _analysis: &AnalysisResult) -> TokenStream {
        quote! {
            if ctx.sp as usize >= chip8rec_runtime::state::STACK_DEPTH {
                chip8rec_runtime::runtime_panic("stack overflow on CALL", #target);
            }
            ctx.stack[ctx.sp as usize] = #return_addr;
            ctx.sp += 1;
            __pc = #target;
            continue;
        }
    }

    fn lower_ret(&self) -> TokenStream {
        quote! {
            if ctx.sp == 0 {
                chip8rec_runtime::runtime_panic("stack underflow on RET", __pc);
            }
            ctx.sp -= 1;
            __pc = ctx.stack[ctx.sp as usize];
            continue;
        }
    }

    fn lower_goto(&self, target: u16) -> TokenStream {
        quote! { __pc = #target; continue; }
    }

    fn lower_jump(&self, target: u16, _analysis: &AnalysisResult) -> TokenStream {
        self.lower_goto(target)
    }

    /// A dense switch over `jp_v0_table_entries` two-byte entries from
    /// `base`. An entry only gets a real `goto` arm
    /// when the decoder already reached that address during the normal
    /// sweep (the common case: a jump table whose entries are themselves
    /// ordinary decoded instructions); an entry that lands where the
    /// whole-ROM decoder saw only data has no block to jump into and panics
    /// at runtime instead of being resolved by a block-splitting pass the
    /// analyzer does not perform.
    fn lower_jp_v0(&self, base: u16, analysis: &AnalysisResult, yields: bool, reg: u8) -> TokenStream {
        let mut arms = TokenStream::new();
        for k in 0..self.jp_v0_table_entries {
            let addr = base.wrapping_add(k * 2);
            if analysis.blocks.contains_key(&addr) {
                let yield_check = if yields { crate::control::yield_check(addr) } else { TokenStream::new() };
                arms.extend(quote! { #addr => { #yield_check __pc = #addr; continue; } });
            } else {
                arms.extend(quote! {
                    #addr => {
                        chip8rec_runtime::runtime_panic("computed jump to unanalyzed address", #addr);
                    }
                });
            }
        }
        let reg = reg as usize;
        quote! {
            let target = (#base as u16).wrapping_add(ctx.v[#reg] as u16);
            match target {
                #arms
                other => chip8rec_runtime::runtime_panic("computed jump to unregistered address", other),
            }
        }
    }
}

/// Emit `fn run(ctx: &mut Chip8Context) -> ControlFlow` covering every
/// analyzed block in the program.
pub fn emit_single_function(
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    needs_yield: &HashSet<u16>,
) -> TokenStream {
    let lowering = SingleFunctionLowering { jp_v0_table_entries: opts.jp_v0_table_entries };
    let blocks: Vec<_> = analysis.blocks.values().collect();
    let arms = emit_block_arms(&blocks, analysis, opts, needs_yield, &lowering);

    let entry = analysis.entry;
    let resumable = resumable_addresses(&blocks, analysis, needs_yield);
    let resumable_count = resumable.len();

    let doc = if opts.emit_comments {
        quote! { #[doc = "Recompiled CHIP-8 program (single-function mode)."] }
    } else {
        TokenStream::new()
    };

    quote! {
        #doc
        pub fn run(
            ctx: &mut chip8rec_runtime::Chip8Context,
        ) -> chip8rec_runtime::ControlFlow {
            const RESUMABLE_LABELS: [u16; #resumable_count] = [#(#resumable),*];
            let mut __pc: u16 = if ctx.should_yield && RESUMABLE_LABELS.contains(&ctx.resume_pc) {
                ctx.should_yield = false;
                ctx.resume_pc
            } else {
                #entry
            };
            loop {
                match __pc {
                    #arms
                    _ => chip8rec_runtime::runtime_panic("invalid instruction reached", __pc),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8rec_core::{analyze, decode_all};

    #[test]
    fn call_and_ret_use_the_software_stack_not_a_rust_call() {
        let bytes = [0x22, 0x04, 0x00, 0xEE, 0x00, 0xEE];
        let instructions = decode_all(&bytes);
        let analysis = analyze(&instructions, 0x200);
        let needs_yield = crate::cfg::blocks_needing_yield(&analysis);
        let tokens = emit_single_function(&analysis, &EmitterOptions::default(), &needs_yield).to_string();
        assert!(tokens.contains("ctx . stack [ctx . sp as usize]"));
        assert!(!tokens.contains("fn func_0x"));
    }

    #[test]
    fn loop_anywhere_in_the_program_is_resumable() {
        // CALL 0x204 ; RET ; 0x204: JP 0x204 (the callee loops forever)
        let bytes = [0x22, 0x04, 0x00, 0xEE, 0x12, 0x04];
        let instructions = decode_all(&bytes);
        let analysis = analyze(&instructions, 0x200);
        let needs_yield = crate::cfg::blocks_needing_yield(&analysis);
        let tokens = emit_single_function(&analysis, &EmitterOptions::default(), &needs_yield).to_string();
        assert!(tokens.contains("RESUMABLE_LABELS"));
        assert!(tokens.contains("516u16"));
    }
}

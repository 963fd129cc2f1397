//! Per-function emission mode: one `fn func_0xHHH` per analyzed
//! `Function`. `CALL` is a real Rust call; `RET` is a real `return`. Loops
//! (and `LD Vx, K`) are only ever sound in the program's entry function —
//! `crate::cfg::find_obstruction` is what guarantees that before this module
//! is reached, so every non-entry function here is a plain call-and-return
//! with no resume prologue to worry about.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};

use chip8rec_core::{AnalysisResult, Function};

use crate::control::{ControlLowering, emit_block_arms, resumable_addresses};
use crate::options::EmitterOptions;

struct FunctionLowering<'a> {
    function: &'a Function,
}

impl ControlLowering for FunctionLowering<'_> {
    fn lower_call(&self, target: u16, _return_addr: u16, analysis: &AnalysisResult) -> TokenStream {
        let Some(function) = analysis.functions.get(&target) else {
            return quote! {
                chip8rec_runtime::runtime_panic("call to unanalyzed address", #target);
            };
        };
        let callee = format_ident!("{}", function.name);
        quote! {
            match #callee(ctx) {
                chip8rec_runtime::ControlFlow::Returned => {}
                chip8rec_runtime::ControlFlow::Yielded => {
                    return chip8rec_runtime::ControlFlow::Yielded;
                }
            }
        }
    }

    fn lower_ret(&self) -> TokenStream {
        quote! { return chip8rec_runtime::ControlFlow::Returned; }
    }

    fn lower_goto(&self, target: u16) -> TokenStream {
        quote! { __pc = #target; continue; }
    }

    fn lower_jump(&self, target: u16, analysis: &AnalysisResult) -> TokenStream {
        if self.function.block_addresses.contains(&target) {
            self.lower_goto(target)
        } else if let Some(callee) = analysis.functions.get(&target) {
            let name = format_ident!("{}", callee.name);
            quote! { return #name(ctx); }
        } else {
            quote! {
                chip8rec_runtime::runtime_panic("jump to unanalyzed address", #target);
            }
        }
    }

    fn lower_jp_v0(&self, base: u16, _analysis: &AnalysisResult, _yields: bool, reg: u8) -> TokenStream {
        // The dispatch table only stores function entry points, not a
        // resumable `__pc` label, so there is no literal address to record
        // as `resume_pc` here; a loop through a computed jump in this mode
        // is ruled out upstream by `crate::cfg::find_obstruction`.
        let reg = reg as usize;
        quote! {
            let target = (#base as u16).wrapping_add(ctx.v[#reg] as u16);
            match chip8rec_runtime::with_dispatch_table(|dispatch| dispatch.lookup(target)) {
                Some(f) => return f(ctx),
                None => chip8rec_runtime::runtime_panic("computed jump to unregistered address", target),
            }
        }
    }
}

/// Emit one `fn func_0xHHH(ctx: &mut Chip8Context) -> ControlFlow` for
/// `function`.
pub fn emit_function(
    function: &Function,
    analysis: &AnalysisResult,
    opts: &EmitterOptions,
    needs_yield: &HashSet<u16>,
) -> TokenStream {
    let lowering = FunctionLowering { function };
    let blocks: Vec<_> = function
        .block_addresses
        .iter()
        .filter_map(|a| analysis.blocks.get(a))
        .collect();
    let arms = emit_block_arms(&blocks, analysis, opts, needs_yield, &lowering);

    let name = format_ident!("{}", function.name);
    let entry = function.entry;
    let resumable = resumable_addresses(&blocks, analysis, needs_yield);
    let resumable_count = resumable.len();

    let doc = if opts.emit_comments {
        let doc_text = format!("Recompiled from CHIP-8 code at `0x{entry:03X}`.");
        quote! { #[doc = #doc_text] }
    } else {
        TokenStream::new()
    };

    quote! {
        #doc
        pub fn #name(
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
    fn entry_function_emits_resume_prologue_for_its_own_loop() {
        let instructions = decode_all(&[0x12, 0x00]); // JP 0x200
        let analysis = analyze(&instructions, 0x200);
        let needs_yield = crate::cfg::blocks_needing_yield(&analysis);
        let function = &analysis.functions[&0x200];
        let tokens = emit_function(function, &analysis, &EmitterOptions::default(), &needs_yield).to_string();
        assert!(tokens.contains("RESUMABLE_LABELS"));
        assert!(tokens.contains("fn func_0x200"));
    }

    #[test]
    fn call_site_propagates_yield_and_continues_on_return() {
        // CALL 0x204 ; RET  /  0x204: RET
        let bytes = [0x22, 0x04, 0x00, 0xEE, 0x00, 0xEE];
        let instructions = decode_all(&bytes);
        let analysis = analyze(&instructions, 0x200);
        let needs_yield = crate::cfg::blocks_needing_yield(&analysis);
        let function = &analysis.functions[&0x200];
        let tokens = emit_function(function, &analysis, &EmitterOptions::default(), &needs_yield).to_string();
        assert!(tokens.contains("func_0x204 (ctx)"));
        assert!(tokens.contains("ControlFlow :: Yielded"));
    }
}

//! The shared per-instruction-kind translation table: one `match` arm
//! per non-control-flow `InstructionKind`, identical in per-function and
//! single-function mode. `CALL`, `RET`, `JP`, `JP V0`, the six branch kinds,
//! and `LD Vx, K` are lowered by [`crate::control`] instead, since their
//! translation is a control transfer rather than a local effect, and (for
//! `CALL`/`RET`/`JP`/`JP V0`) depends on which emission mode is active.

use proc_macro2::TokenStream;
use quote::quote;

use chip8rec_core::{Instruction, InstructionKind};

use crate::options::EmitterOptions;

/// Translate the *effect* of a non-control-flow instruction: register and
/// memory writes, helper calls. Never emits a control transfer — the block
/// walker in [`crate::control`] appends that uniformly after this, for every
/// instruction kind including the ones this function treats as a no-op.
pub fn emit_instruction_effect(instr: &Instruction, opts: &EmitterOptions) -> TokenStream {
    use InstructionKind::*;

    let x = instr.x as usize;
    let y = instr.y as usize;
    let n = instr.n;
    let nn = instr.nn;
    let nnn = instr.nnn;
    let vf_reset = opts.quirks.vf_reset;
    let shift_uses_vy = opts.quirks.shift_uses_vy;
    let memory_increment_i = opts.quirks.memory_increment_i;
    let sprite_wrap = opts.quirks.sprite_wrap;

    match instr.kind {
        Cls => quote! { ctx.clear_display(); },
        LdVxByte => quote! { ctx.v[#x] = #nn; },
        AddVxByte => quote! { ctx.v[#x] = ctx.v[#x].wrapping_add(#nn); },
        LdVxVy => quote! { ctx.v[#x] = ctx.v[#y]; },
        OrVxVy => {
            let reset = vf_reset_tail(vf_reset);
            quote! { ctx.v[#x] |= ctx.v[#y]; #reset }
        }
        AndVxVy => {
            let reset = vf_reset_tail(vf_reset);
            quote! { ctx.v[#x] &= ctx.v[#y]; #reset }
        }
        XorVxVy => {
            let reset = vf_reset_tail(vf_reset);
            quote! { ctx.v[#x] ^= ctx.v[#y]; #reset }
        }
        AddVxVy => quote! {
            let (result, flag) = chip8rec_runtime::helpers::add_with_carry(ctx.v[#x], ctx.v[#y]);
            ctx.v[#x] = result;
            ctx.v[0xF] = flag;
        },
        SubVxVy => quote! {
            let (result, flag) = chip8rec_runtime::helpers::sub_not_borrow(ctx.v[#x], ctx.v[#y]);
            ctx.v[#x] = result;
            ctx.v[0xF] = flag;
        },
        SubnVxVy => quote! {
            let (result, flag) = chip8rec_runtime::helpers::subn_not_borrow(ctx.v[#x], ctx.v[#y]);
            ctx.v[#x] = result;
            ctx.v[0xF] = flag;
        },
        ShrVxVy => {
            let source = if shift_uses_vy { quote! { ctx.v[#y] } } else { quote! { ctx.v[#x] } };
            quote! {
                let (result, flag) = chip8rec_runtime::helpers::shift_right(#source);
                ctx.v[#x] = result;
                ctx.v[0xF] = flag;
            }
        }
        ShlVxVy => {
            let source = if shift_uses_vy { quote! { ctx.v[#y] } } else { quote! { ctx.v[#x] } };
            quote! {
                let (result, flag) = chip8rec_runtime::helpers::shift_left(#source);
                ctx.v[#x] = result;
                ctx.v[0xF] = flag;
            }
        }
        LdIAddr => quote! { ctx.i = #nnn; },
        Rnd => quote! {
            let r = ctx.random_byte();
            ctx.v[#x] = r & #nn;
        },
        Drw => quote! {
            let collision = ctx.draw_sprite(#x as u8, #y as u8, #n, #sprite_wrap);
            ctx.v[0xF] = collision as u8;
        },
        LdVxDt => quote! { ctx.v[#x] = ctx.delay_timer; },
        LdDtVx => quote! { ctx.delay_timer = ctx.v[#x]; },
        LdStVx => quote! { ctx.sound_timer = ctx.v[#x]; },
        AddIVx => quote! { ctx.i = ctx.i.wrapping_add(ctx.v[#x] as u16); },
        LdFVx => quote! { ctx.i = chip8rec_runtime::font::glyph_address(ctx.v[#x]); },
        LdBVx => quote! { ctx.store_bcd(ctx.v[#x]); },
        LdIVx => quote! { ctx.store_registers(#x as u8, #memory_increment_i); },
        LdVxI => quote! { ctx.load_registers(#x as u8, #memory_increment_i); },
        // `SYS` is architecturally a call to machine code the recompiler
        // never sees; `Unknown` is anything the decode table didn't
        // recognize. Both are inert by definition.
        Sys | Unknown => TokenStream::new(),
        // Control-transfer kinds are handled entirely by `crate::control`;
        // this function is never called for them. Kept here so the match
        // stays total over the enum rather than silently compiling a
        // wildcard arm that would hide a future missing case.
        Ret | Jp | JpV0 | Call | SeVxByte | SneVxByte | SeVxVy | SneVxVy | Skp | Sknp | LdVxK => {
            TokenStream::new()
        }
    }
}

fn vf_reset_tail(vf_reset: bool) -> TokenStream {
    if vf_reset {
        quote! { ctx.v[0xF] = 0; }
    } else {
        TokenStream::new()
    }
}

/// The boolean condition under which a skip instruction (`SE`/`SNE`/`SKP`/
/// `SKNP`) takes its "skip" edge (`address + 4`) rather than falling through
/// (`address + 2`).
pub(crate) fn skip_condition(instr: &Instruction) -> TokenStream {
    use InstructionKind::*;
    let x = instr.x as usize;
    let y = instr.y as usize;
    let nn = instr.nn;
    match instr.kind {
        SeVxByte => quote! { ctx.v[#x] == #nn },
        SneVxByte => quote! { ctx.v[#x] != #nn },
        SeVxVy => quote! { ctx.v[#x] == ctx.v[#y] },
        SneVxVy => quote! { ctx.v[#x] != ctx.v[#y] },
        Skp => quote! { ctx.key_pressed(#x as u8) },
        Sknp => quote! { !ctx.key_pressed(#x as u8) },
        _ => quote! { false },
    }
}

/// `let _ = "<disassembly>";` — the address-marker statement
/// `EmitterOptions::emit_address_comments` controls. The quote!/syn/
/// prettyplease pipeline tokenizes and re-renders every generated file, and
/// `//` comments are whitespace trivia that proc-macro2 never carries
/// through a `TokenStream`; a `let _ = "...";` is the closest equivalent
/// that survives the round trip as an inert, zero-cost statement instead of
/// silently vanishing.
pub(crate) fn address_marker(instr: &Instruction, opts: &EmitterOptions) -> TokenStream {
    if !opts.emit_address_comments {
        return TokenStream::new();
    }
    let text = format!("0x{:03X}  {}", instr.address, instr.disassemble());
    quote! { let _ = #text; }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chip8rec_core::decode_one;

    fn opts() -> EmitterOptions {
        EmitterOptions::default()
    }

    #[test]
    fn add_vx_vy_writes_result_before_flag() {
        let instr = decode_one(0x200, 0x8014); // ADD V0, V1
        let tokens = emit_instruction_effect(&instr, &opts()).to_string();
        let result_pos = tokens.find("ctx . v [0usize] = result").unwrap();
        let flag_pos = tokens.find("ctx . v [0xF] = flag").unwrap();
        assert!(result_pos < flag_pos);
    }

    #[test]
    fn or_vx_vy_applies_vf_reset_quirk_tail() {
        let instr = decode_one(0x200, 0x8011); // OR V0, V1
        let mut options = opts();
        options.quirks.vf_reset = true;
        let tokens = emit_instruction_effect(&instr, &options).to_string();
        assert!(tokens.contains("ctx . v [0xF] = 0"));

        options.quirks.vf_reset = false;
        let tokens = emit_instruction_effect(&instr, &options).to_string();
        assert!(!tokens.contains("ctx . v [0xF] = 0"));
    }

    #[test]
    fn shr_respects_shift_uses_vy_quirk() {
        let instr = decode_one(0x200, 0x8016); // SHR V0, V1
        let mut options = opts();
        options.quirks.shift_uses_vy = true;
        let tokens = emit_instruction_effect(&instr, &options).to_string();
        assert!(tokens.contains("shift_right (ctx . v [1usize])"));

        options.quirks.shift_uses_vy = false;
        let tokens = emit_instruction_effect(&instr, &options).to_string();
        assert!(tokens.contains("shift_right (ctx . v [0usize])"));
    }

    #[test]
    fn sys_and_unknown_are_no_ops() {
        let sys = decode_one(0x200, 0x0123);
        assert!(emit_instruction_effect(&sys, &opts()).is_empty());
        let unknown = decode_one(0x200, 0x5121);
        assert!(emit_instruction_effect(&unknown, &opts()).is_empty());
    }

    #[test]
    fn skip_condition_matches_instruction_semantics() {
        let se = decode_one(0x200, 0x3005); // SE V0, 0x05
        assert_eq!(skip_condition(&se).to_string(), quote! { ctx . v [0usize] == 5u8 }.to_string());
        let skp = decode_one(0x200, 0xE09E); // SKP V0
        assert_eq!(skip_condition(&skp).to_string(), quote! { ctx . key_pressed (0usize as u8) }.to_string());
    }
}

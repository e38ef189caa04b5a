//! Decodes a method's bytecode into a flat, deterministic sequence of
//! instructions with resolved constant-pool operands, for the pretty
//! printer, the JSON emitter and `-debug` tracing.
use crate::classfile::ConstantPool;
use crate::error::ClassFileError;
use crate::opcode::{self, ArgKind};
use crate::resolve::Resolver;

/// One decoded instruction. `args_text` is the raw operand rendering
/// (`#12`, `3 (to 17)`, ...); `resolved_text` is the constant-pool-backed
/// annotation shown alongside it (`// "hi"`, `// Foo.bar:()V`), absent for
/// instructions with no pool reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisasmInstruction {
    pub pc: u32,
    pub length: u8,
    pub mnemonic: &'static str,
    pub args_text: String,
    pub resolved_text: Option<String>,
}

fn require(code: &[u8], at: usize, n: usize) -> Result<(), ClassFileError> {
    if at + n > code.len() {
        Err(ClassFileError::InvalidCodeAttribute("instruction truncated at end of code array"))
    } else {
        Ok(())
    }
}

fn u8_at(code: &[u8], at: usize) -> Result<u8, ClassFileError> {
    require(code, at, 1)?;
    Ok(code[at])
}

fn u16_at(code: &[u8], at: usize) -> Result<u16, ClassFileError> {
    require(code, at, 2)?;
    Ok(u16::from_be_bytes([code[at], code[at + 1]]))
}

fn i16_at(code: &[u8], at: usize) -> Result<i16, ClassFileError> {
    Ok(u16_at(code, at)? as i16)
}

fn u32_at(code: &[u8], at: usize) -> Result<u32, ClassFileError> {
    require(code, at, 4)?;
    Ok(u32::from_be_bytes([code[at], code[at + 1], code[at + 2], code[at + 3]]))
}

fn i32_at(code: &[u8], at: usize) -> Result<i32, ClassFileError> {
    Ok(u32_at(code, at)? as i32)
}

pub struct Disassembler;

impl Disassembler {
    /// Decodes `code` start-to-end into a flat instruction list.
    pub fn disassemble(
        code: &[u8],
        cp: &ConstantPool,
    ) -> Result<Vec<DisasmInstruction>, ClassFileError> {
        let resolver = Resolver::new(cp);
        let mut out = Vec::new();
        let mut pc: usize = 0;

        while pc < code.len() {
            let opcode = code[pc];
            let info = opcode::info(opcode);

            let (length, args_text, resolved_text) = match info.arg_kind {
                ArgKind::None => (info.length, String::new(), None),
                ArgKind::U1 => {
                    let v = u8_at(code, pc + 1)?;
                    let resolved = if opcode == 0x12 { Some(resolver.literal(v as u16)) } else { None };
                    (info.length, format!("#{v}"), resolved)
                }
                ArgKind::U2 => {
                    let v = u16_at(code, pc + 1)?;
                    let resolved = match opcode {
                        0x13 | 0x14 => Some(resolver.literal(v)),
                        0xbb | 0xbd | 0xc0 | 0xc1 | 0xc5 => Some(resolver.class_name(v)),
                        0xb2..=0xb8 => Some(resolver.ref_(v)),
                        _ => None,
                    };
                    (info.length, format!("#{v}"), resolved)
                }
                ArgKind::Iinc => {
                    let index = u8_at(code, pc + 1)?;
                    let constant = u8_at(code, pc + 2)? as i8;
                    (info.length, format!("{index}, {constant}"), None)
                }
                ArgKind::OffsetU2 => {
                    let offset = i16_at(code, pc + 1)?;
                    let target = pc as i64 + info.length as i64 + offset as i64;
                    (info.length, format!("{offset} (to {target})"), None)
                }
                ArgKind::OffsetU4 => {
                    let offset = i32_at(code, pc + 1)?;
                    let target = pc as i64 + info.length as i64 + offset as i64;
                    (info.length, format!("{offset} (to {target})"), None)
                }
                ArgKind::InvokeInterface => {
                    let v = u16_at(code, pc + 1)?;
                    let count = u8_at(code, pc + 3)?;
                    (info.length, format!("#{v}, {count}"), Some(resolver.ref_(v)))
                }
                ArgKind::InvokeDynamic => {
                    let v = u16_at(code, pc + 1)?;
                    (info.length, format!("#{v}"), None)
                }
                ArgKind::MultiANewArray => {
                    let v = u16_at(code, pc + 1)?;
                    let dims = u8_at(code, pc + 3)?;
                    (info.length, format!("#{v}, {dims}"), Some(resolver.class_name(v)))
                }
                ArgKind::Wide => Self::decode_wide(code, pc)?,
                ArgKind::TableSwitch => Self::decode_tableswitch(code, pc)?,
                ArgKind::LookupSwitch => Self::decode_lookupswitch(code, pc)?,
            };

            out.push(DisasmInstruction { pc: pc as u32, length, mnemonic: info.mnemonic, args_text, resolved_text });
            pc += length as usize;
        }

        Ok(out)
    }

    fn decode_wide(code: &[u8], pc: usize) -> Result<(u8, String, Option<String>), ClassFileError> {
        let widened = u8_at(code, pc + 1)?;
        if widened == 0x84 {
            // wide iinc: opcode, widened opcode, u2 index, u2 const
            let index = u16_at(code, pc + 2)?;
            let constant = i16_at(code, pc + 4)?;
            Ok((6, format!("iinc {index}, {constant}"), None))
        } else {
            let index = u16_at(code, pc + 2)?;
            let widened_mnemonic = opcode::info(widened).mnemonic;
            Ok((4, format!("{widened_mnemonic} #{index}"), None))
        }
    }

    fn decode_tableswitch(
        code: &[u8],
        pc: usize,
    ) -> Result<(u8, String, Option<String>), ClassFileError> {
        let mut cursor = pc + 1;
        cursor += (4 - (cursor % 4)) % 4;

        let default_offset = i32_at(code, cursor)?;
        let low = i32_at(code, cursor + 4)?;
        let high = i32_at(code, cursor + 8)?;
        cursor += 12;

        if high < low {
            return Err(ClassFileError::InvalidCodeAttribute("tableswitch high < low"));
        }
        let count = (high - low + 1) as usize;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            entries.push(i32_at(code, cursor + i * 4)?);
        }
        cursor += count * 4;

        let text = format!(
            "default:{default_offset}, low:{low}, high:{high}, offsets:{entries:?}"
        );
        Ok(((cursor - pc) as u8, text, None))
    }

    fn decode_lookupswitch(
        code: &[u8],
        pc: usize,
    ) -> Result<(u8, String, Option<String>), ClassFileError> {
        let mut cursor = pc + 1;
        cursor += (4 - (cursor % 4)) % 4;

        let default_offset = i32_at(code, cursor)?;
        let npairs = i32_at(code, cursor + 4)?;
        if npairs < 0 {
            return Err(ClassFileError::InvalidCodeAttribute("lookupswitch negative npairs"));
        }
        cursor += 8;

        let mut pairs = Vec::with_capacity(npairs as usize);
        for i in 0..npairs as usize {
            let m = i32_at(code, cursor + i * 8)?;
            let o = i32_at(code, cursor + i * 8 + 4)?;
            pairs.push((m, o));
        }
        cursor += npairs as usize * 8;

        let text = format!("default:{default_offset}, pairs:{pairs:?}");
        Ok(((cursor - pc) as u8, text, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_simple_arithmetic_sequence() {
        // iconst_1, iconst_2, iadd, ireturn
        let code = [0x04, 0x05, 0x60, 0xAC];
        let cp = ConstantPool::default();
        let instrs = Disassembler::disassemble(&code, &cp).unwrap();
        let mnemonics: Vec<_> = instrs.iter().map(|i| i.mnemonic).collect();
        assert_eq!(mnemonics, vec!["iconst_1", "iconst_2", "iadd", "ireturn"]);
        assert_eq!(instrs[2].pc, 2);
    }

    #[test]
    fn decodes_branch_offset_with_target_pc() {
        // at pc=0: goto +4, target is pc + instruction length (3) + offset = 7
        let code = [0xA7, 0x00, 0x04, 0x00];
        let cp = ConstantPool::default();
        let instrs = Disassembler::disassemble(&code, &cp).unwrap();
        assert_eq!(instrs[0].args_text, "4 (to 7)");
    }

    #[test]
    fn decodes_iinc() {
        let code = [0x84, 0x01, 0xFF]; // iinc local 1 by -1
        let cp = ConstantPool::default();
        let instrs = Disassembler::disassemble(&code, &cp).unwrap();
        assert_eq!(instrs[0].mnemonic, "iinc");
        assert_eq!(instrs[0].args_text, "1, -1");
    }

    #[test]
    fn decodes_tableswitch_with_padding() {
        // tableswitch at pc=1 (so padding consumes 2 bytes to reach 4-alignment)
        let mut code = vec![0x00, 0xAA]; // nop, tableswitch
        code.extend_from_slice(&[0, 0]); // 2 padding bytes (pc=2 -> aligns to 4)
        code.extend_from_slice(&0i32.to_be_bytes()); // default
        code.extend_from_slice(&0i32.to_be_bytes()); // low
        code.extend_from_slice(&1i32.to_be_bytes()); // high
        code.extend_from_slice(&10i32.to_be_bytes()); // offset[0]
        code.extend_from_slice(&20i32.to_be_bytes()); // offset[1]
        let cp = ConstantPool::default();
        let instrs = Disassembler::disassemble(&code, &cp).unwrap();
        assert_eq!(instrs[1].mnemonic, "tableswitch");
        assert_eq!(instrs[1].pc, 1);
    }
}

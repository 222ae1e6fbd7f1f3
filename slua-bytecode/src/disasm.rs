use std::fmt::Write;

use crate::bytecode::{Chunk, Constant, Module};
use crate::opcode::{Opcode, OpcodeIterator};

pub fn disassemble_module(module: &Module) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_module(&mut out, module);
    out
}

fn write_module(out: &mut String, module: &Module) -> std::fmt::Result {
    writeln!(out, "=== Start of Dump ===")?;
    writeln!(out)?;

    for (index, chunk) in module.chunks().iter().enumerate() {
        let name = module
            .prototypes()
            .iter()
            .find(|p| p.chunk_index == index)
            .map(|p| p.name.as_str())
            .unwrap_or(if index == 0 { "main" } else { "?" });
        writeln!(out, "=== Chunk {} ({}) ===", index, name)?;
        write_chunk(out, module, chunk)?;
        for local in chunk.locals() {
            writeln!(out, "     local {} slot {} [{:04X}, {:04X})", local.name, local.slot, local.start, local.end)?;
        }
        writeln!(out)?;
    }

    writeln!(out, "=== Prototypes ===")?;
    for (index, prototype) in module.prototypes().iter().enumerate() {
        writeln!(
            out,
            "{} {} chunk={} arity={} upvalues={:?}",
            index, prototype.name, prototype.chunk_index, prototype.arity, prototype.upvalues
        )?;
    }
    writeln!(out)?;

    writeln!(out, "=== Identifiers ===")?;
    for (index, identifier) in module.identifiers().iter().enumerate() {
        writeln!(out, "{} {}", index, identifier)?;
    }
    writeln!(out)?;

    writeln!(out, "=== Constants ===")?;
    for (index, constant) in module.constants().iter().enumerate() {
        writeln!(out, "{} {:?}", index, constant)?;
    }
    writeln!(out)?;

    writeln!(out, "=== End of Dump ===")
}

fn write_chunk(out: &mut String, module: &Module, chunk: &Chunk) -> std::fmt::Result {
    let mut last_line = None;
    for (offset, opcode) in OpcodeIterator::new(chunk.as_slice()) {
        let line = chunk.line_at(offset);
        match line {
            Some(line) if last_line != Some(line) => write!(out, "{:4} ", line)?,
            Some(_) => write!(out, "   | ")?,
            None => write!(out, "     ")?,
        }
        last_line = line;

        write!(out, "{:04X} {:?}", offset, opcode)?;
        match opcode {
            Opcode::Jump(_) | Opcode::JumpIfFalse(_) => {
                if let Some(target) = opcode.jump_target(offset) {
                    write!(out, " -> {:04X}", target)?;
                }
            }
            Opcode::Constant(index) => match module.constants().get(index as usize) {
                Some(Constant::Number(n)) => write!(out, " ; {}", n)?,
                Some(Constant::String(s)) => write!(out, " ; {:?}", s)?,
                None => {}
            },
            Opcode::GetGlobal(index)
            | Opcode::SetGlobal(index)
            | Opcode::GetField(index)
            | Opcode::SetField(index)
            | Opcode::InitField(index)
            | Opcode::Invoke(_, index) => {
                if let Some(name) = module.identifiers().get(index as usize) {
                    write!(out, " ; {}", name)?;
                }
            }
            Opcode::Closure(index) => {
                if let Some(prototype) = module.prototypes().get(index as usize) {
                    write!(out, " ; {}", prototype.name)?;
                }
            }
            _ => {}
        }
        writeln!(out)?;
    }
    Ok(())
}

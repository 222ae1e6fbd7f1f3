mod bytecode;
mod disasm;
mod error;
mod serialize;
pub mod opcode;

pub use bytecode::*;
pub use disasm::disassemble_module;
pub use error::DecodeError;
pub use serialize::VERSION;

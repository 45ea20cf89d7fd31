//! # Blob
//! The binary module format, and the tools to build and read it.
//!
//! A [`Blob`] is a section based image of a compiled module: strings, symbols,
//! class declarations (type specs), signatures, constants, debug information, and
//! the instruction words of the text section. The [`Assembler`] writes instructions
//! into a blob, resolving labels, and the [`Disassembler`] reads them back.

mod assembler;
mod blob;
mod buffer;
mod disassembler;
mod opcode;

#[cfg(test)]
mod test;

pub use assembler::{Assembler, AssemblerError, Operand};
pub use blob::{
  Binding, Blob, BlobError, Constant, DebugEntry, MAGIC, SectionHeader, SectionKind, Symbol,
  SymbolKind, TypeSpec, VERSION,
};
pub use buffer::Buffer;
pub use disassembler::{Disassembler, DisassemblyError, Instruction};
pub use opcode::{DEBUG_MASK, OpCode, OpCodeInfo, OperandKind, decode};

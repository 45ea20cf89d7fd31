//! Reads the text section of a [`Blob`] back into instructions.

use crate::{
  blob::{Binding, Blob, DebugEntry, SymbolKind},
  opcode::{self, OpCode, OperandKind},
};
use std::fmt;

/// A decoded instruction
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Instruction {
  /// The word index of the opcode
  pub address: u32,
  /// The instruction
  pub opcode: OpCode,
  /// Index of the attached debug entry
  pub debug: Option<u32>,
  /// The raw operand words
  pub operands: Vec<u32>,
}
impl Instruction {
  /// The number of words the instruction takes up
  #[must_use]
  pub fn len(&self) -> u32 {
    let debug = u32::from(self.debug.is_some());
    1 + debug + u32::try_from(self.operands.len()).unwrap_or_default()
  }

  /// Instructions always have at least an opcode word
  #[must_use]
  pub fn is_empty(&self) -> bool {
    false
  }

  /// The absolute address a jump instruction goes to
  #[must_use]
  pub fn jump_target(&self) -> Option<u32> {
    match (self.opcode.info().operands, self.operands.as_slice()) {
      ([OperandKind::Address], [target]) => Some(*target),
      ([OperandKind::Relative], [offset]) => self.address.checked_add_signed(offset.cast_signed()),
      _ => None,
    }
  }
}

/// Problems decoding the text section
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DisassemblyError {
  /// A word which should be an opcode is not one
  #[error("invalid opcode {word:#x} at {address:0>4}")]
  InvalidOpcode {
    /// Where the word is
    address: u32,
    /// The value of the word
    word: u32,
  },
  /// The text section ends part way through an instruction
  #[error("instruction at {0:0>4} is truncated")]
  Truncated(u32),
}

/// Decodes the instructions in a blob
pub struct Disassembler<'blob> {
  blob: &'blob Blob,
  text: Vec<u32>,
}
impl<'blob> Disassembler<'blob> {
  /// Create a disassembler for a blob
  #[must_use]
  pub fn new(blob: &'blob Blob) -> Self {
    Self {
      blob,
      text: blob.text(),
    }
  }

  /// Decode the instruction at an address
  ///
  /// # Errors
  /// If the word at the address is not an opcode, or the instruction is truncated
  pub fn decode(&self, address: u32) -> Result<Instruction, DisassemblyError> {
    let word = |position: u32| {
      self
        .text
        .get(position as usize)
        .copied()
        .ok_or(DisassemblyError::Truncated(address))
    };

    let raw = word(address)?;
    let (opcode, has_debug) =
      opcode::decode(raw).map_err(|word| DisassemblyError::InvalidOpcode { address, word })?;

    let mut position = address + 1;
    let debug = if has_debug {
      position += 1;
      Some(word(position - 1)?)
    } else {
      None
    };

    let operands = (0..opcode.arity())
      .map(|_| {
        position += 1;
        word(position - 1)
      })
      .collect::<Result<_, _>>()?;

    Ok(Instruction {
      address,
      opcode,
      debug,
      operands,
    })
  }

  /// Decode every instruction in the text section
  ///
  /// # Errors
  /// If any instruction can't be decoded
  pub fn instructions(&self) -> Result<Vec<Instruction>, DisassemblyError> {
    let mut instructions = Vec::new();
    let mut address = 0;
    while (address as usize) < self.text.len() {
      let instruction = self.decode(address)?;
      address += instruction.len();
      instructions.push(instruction);
    }
    Ok(instructions)
  }

  fn debug_entry(&self, instruction: &Instruction) -> Option<DebugEntry> {
    self.blob.debug_entry_at(instruction.debug?)
  }

  fn write_operand(&self, f: &mut fmt::Formatter<'_>, kind: OperandKind, word: u32) -> fmt::Result {
    match kind {
      OperandKind::String => match self.blob.string_at(word) {
        Some(string) => write!(f, " '{string}'"),
        None => write!(f, " <bad string {word}>"),
      },
      OperandKind::Index | OperandKind::Address => write!(f, " {word}"),
      OperandKind::Constant => match word.cast_signed() {
        slot if slot < 0 => write!(f, " arg{}", -(slot + 1)),
        index => write!(f, " #{index}"),
      },
      OperandKind::Relative => write!(f, " {:+}", word.cast_signed()),
    }
  }
}
impl fmt::Display for Disassembler<'_> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "      ╭─[Module: {}]", self.blob.module_name())?;

    for index in 0..self.blob.symbol_count() {
      let Some(symbol) = self.blob.symbol_at(index) else {
        continue;
      };
      let name = self.blob.string_at(symbol.name).unwrap_or("?");
      let kind = match (symbol.kind, symbol.binding) {
        (SymbolKind::Method, _) => "method",
        (_, Binding::Global) => "global fn",
        _ => "fn",
      };
      writeln!(
        f,
        "      │ {kind} {name} @{:0>4} (locals: {})",
        symbol.address, symbol.locals
      )?;
    }

    let instructions = match self.instructions() {
      Ok(instructions) => instructions,
      Err(error) => return writeln!(f, "      │ {error}\n──────╯"),
    };

    for instruction in &instructions {
      write!(f, " {:0>4} │ {}", instruction.address, instruction.opcode)?;
      for (kind, word) in instruction.opcode.info().operands.iter().zip(&instruction.operands) {
        self.write_operand(f, *kind, *word)?;
      }
      if let Some(target) = instruction.jump_target()
        && instruction.opcode.info().operands == [OperandKind::Relative]
      {
        write!(f, " ({target:0>4})")?;
      }
      if let Some(entry) = self.debug_entry(instruction) {
        write!(f, "  ; line {}:{}", entry.line, entry.col)?;
      }
      writeln!(f)?;
    }

    writeln!(f, "──────╯")
  }
}

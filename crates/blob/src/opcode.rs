//! The instruction set.
//!
//! [`OpCode::info`] is the single table of mnemonics and operand layouts, which the
//! assembler, interpreter, and disassembler all read from.

use std::fmt;

/// Set on an opcode word when the next word is a debug entry index
pub const DEBUG_MASK: u32 = 0x8000_0000;

/// How an operand word should be understood
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperandKind {
  /// An offset into the string table
  String,
  /// A plain unsigned number
  Index,
  /// A constant index, or if negative (as `i32`) an argument slot `-(i + 1)`
  Constant,
  /// An absolute word index in the text section
  Address,
  /// A signed word offset from the start of the instruction
  Relative,
}

/// Description of an opcode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OpCodeInfo {
  /// The name of the instruction
  pub mnemonic: &'static str,
  /// The kinds of the operands which follow the opcode word
  pub operands: &'static [OperandKind],
}
impl OpCodeInfo {
  /// The number of operand words
  #[must_use]
  pub const fn arity(&self) -> usize {
    self.operands.len()
  }
}

macro_rules! opcodes {
  ($($(#[doc = $doc:literal])* $name:ident = $value:literal, $mnemonic:literal, [$($operand:ident),*];)*) => {
    /// An instruction of the interpreter
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[repr(u32)]
    pub enum OpCode {
      $($(#[doc = $doc])* $name = $value,)*
    }
    impl OpCode {
      /// All the opcodes
      pub const ALL: &[OpCode] = &[$(OpCode::$name,)*];

      /// The mnemonic and operand layout of the opcode
      #[must_use]
      pub const fn info(self) -> OpCodeInfo {
        match self {
          $(OpCode::$name => OpCodeInfo {
            mnemonic: $mnemonic,
            operands: &[$(OperandKind::$operand),*],
          },)*
        }
      }
    }
    impl TryFrom<u32> for OpCode {
      type Error = u32;

      fn try_from(value: u32) -> Result<Self, u32> {
        match value {
          $($value => Ok(OpCode::$name),)*
          other => Err(other),
        }
      }
    }
  };
}

opcodes! {
  /// Do nothing
  Nop = 0, "NOP", [];
  /// Discard the top of the stack
  Pop = 1, "POP", [];
  /// Push a local variable
  LoadLocal = 2, "LOAD_LOCAL", [Index];
  /// Pop into a local variable
  StorLocal = 3, "STOR_LOCAL", [Index];
  /// Push a constant, or an argument if the operand is negative
  LoadConst = 4, "LOAD_CONST", [Constant];
  /// Push a global by name
  LoadGlobal = 5, "LOAD_GLOBAL", [String];
  /// Pop into a global by name
  StorGlobal = 6, "STOR_GLOBAL", [String];
  /// Pop an object, push one of its members
  LoadMember = 7, "LOAD_MEMBER", [String];
  /// Pop an object then a value, store the value as a member
  StorMember = 8, "STOR_MEMBER", [String];
  /// Pop a callee, call it with the arguments below it
  Invoke = 9, "INVOKE", [Index];
  /// Call a member of the receiver below the arguments
  Method = 10, "METHOD", [String, Index];
  /// Return the top of the stack from the function
  Return = 11, "RETURN", [];
  /// Return nil from the function
  Leave = 12, "LEAVE", [];
  /// Jump to an address
  Jmp = 13, "JMP", [Address];
  /// Jump by an offset
  Jmpr = 14, "JMPR", [Relative];
  /// Pop a boolean, jump to an address if it is false
  JmpIfFalse = 15, "JMP_IF_FALSE", [Address];
  /// Pop a boolean, jump to an address if it is true
  JmpIfTrue = 16, "JMP_IF_TRUE", [Address];
  /// Pop a boolean, jump by an offset if it is false
  JmprIfFalse = 17, "JMPR_IF_FALSE", [Relative];
  /// Pop a boolean, jump by an offset if it is true
  JmprIfTrue = 18, "JMPR_IF_TRUE", [Relative];
  /// Import a module, exporting its names qualified by the module name
  Import = 19, "IMPORT", [String];
  /// Import a module, exporting names which match the mask
  ImportMask = 20, "IMPORT_MASK", [String, String];
}

impl OpCode {
  /// The name of the instruction
  #[must_use]
  pub const fn mnemonic(self) -> &'static str {
    self.info().mnemonic
  }

  /// The number of operand words
  #[must_use]
  pub const fn arity(self) -> usize {
    self.info().arity()
  }

  /// Find an opcode by its mnemonic
  #[must_use]
  pub fn from_mnemonic(mnemonic: &str) -> Option<Self> {
    Self::ALL
      .iter()
      .copied()
      .find(|opcode| opcode.mnemonic() == mnemonic)
  }

  /// Is it a jump instruction?
  #[must_use]
  pub fn is_jump(self) -> bool {
    matches!(
      self.info().operands,
      [OperandKind::Address | OperandKind::Relative]
    )
  }
}
impl fmt::Display for OpCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.mnemonic())
  }
}

/// Split an opcode word into the opcode and whether a debug entry follows
///
/// # Errors
/// If the word is not a known opcode, the raw value is returned
pub fn decode(word: u32) -> Result<(OpCode, bool), u32> {
  let has_debug = word & DEBUG_MASK != 0;
  let opcode = OpCode::try_from(word & !DEBUG_MASK)?;
  Ok((opcode, has_debug))
}

//! Emits instruction words into the text section of a [`Blob`].

use crate::{
  blob::{Blob, DebugEntry},
  opcode::{DEBUG_MASK, OpCode},
};
use rustc_hash::FxHashMap as HashMap;
use smartstring::alias::String as SmartString;

/// An operand of an instruction given to the [`Assembler`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
  /// A string, interned into the string table and encoded as its offset
  String(SmartString),
  /// A raw word, written as is
  Index(u32),
  /// A reference to a label, encoded as the absolute word index of the label
  Label(SmartString),
}
impl Operand {
  /// A string operand
  pub fn string(value: impl Into<SmartString>) -> Self {
    Self::String(value.into())
  }

  /// A label operand
  pub fn label(name: impl Into<SmartString>) -> Self {
    Self::Label(name.into())
  }

  /// A signed operand, such as an argument slot or a relative jump
  #[must_use]
  pub fn signed(value: i32) -> Self {
    Self::Index(value.cast_unsigned())
  }
}

/// Problems assembling instructions
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum AssemblerError {
  /// The number of operands given doesn't match the opcode
  #[error("`{opcode}` takes {expected} operands, but {got} were given")]
  Arity {
    /// The opcode being emitted
    opcode: OpCode,
    /// How many operands the opcode takes
    expected: usize,
    /// How many operands were given
    got: usize,
  },
  /// A label was referenced but never defined
  #[error("label `{0}` is referenced but never defined")]
  UnresolvedLabel(SmartString),
}
impl AssemblerError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::Arity { .. } => "Operand Count Mismatch",
      Self::UnresolvedLabel(_) => "Unresolved Label",
    }
  }
}

/// Builds up the text section of a blob.
///
/// Instructions are emitted as words into an internal buffer. References to labels
/// are written as zero and patched when [`Assembler::finalize`] is called, after which
/// the words are appended to the blob's text section.
#[derive(Debug)]
pub struct Assembler {
  blob: Blob,
  words: Option<Vec<u32>>,
  labels: HashMap<SmartString, u32>,
  fixups: Vec<(usize, SmartString)>,
}
impl Assembler {
  /// Create an assembler which writes into a blob
  #[must_use]
  pub fn new(blob: Blob) -> Self {
    Self {
      blob,
      words: Some(Vec::with_capacity(256)),
      labels: HashMap::default(),
      fixups: Vec::new(),
    }
  }

  /// The blob being assembled into.
  ///
  /// Symbols and other sections are added through here whilst assembling.
  pub fn blob_mut(&mut self) -> &mut Blob {
    &mut self.blob
  }

  /// The blob being assembled into
  #[must_use]
  pub fn blob(&self) -> &Blob {
    &self.blob
  }

  /// The word index which the next instruction will be placed at
  #[must_use]
  pub fn position(&self) -> u32 {
    let base = self.blob.text_len() as usize;
    let emitted = self.words.as_ref().map_or(0, Vec::len);
    u32::try_from(base + emitted).unwrap_or(u32::MAX)
  }

  /// Emit an instruction with its operands, and optionally a debug entry.
  ///
  /// # Errors
  /// If the number of operands doesn't match the opcode
  pub fn emit(
    &mut self,
    opcode: OpCode,
    operands: &[Operand],
    debug: Option<DebugEntry>,
  ) -> Result<(), AssemblerError> {
    if operands.len() != opcode.arity() {
      return Err(AssemblerError::Arity {
        opcode,
        expected: opcode.arity(),
        got: operands.len(),
      });
    }

    let mut instruction = Vec::with_capacity(2 + operands.len());
    match debug {
      Some(entry) => {
        instruction.push(opcode as u32 | DEBUG_MASK);
        instruction.push(self.blob.add_debug_entry(entry));
      }
      None => instruction.push(opcode as u32),
    }

    let words = self.words.get_or_insert_with(Vec::new);
    let start = words.len();
    for operand in operands {
      let word = match operand {
        Operand::String(string) => self.blob.add_string(string),
        Operand::Index(index) => *index,
        Operand::Label(label) => {
          self
            .fixups
            .push((start + instruction.len(), label.clone()));
          0
        }
      };
      instruction.push(word);
    }

    words.extend(instruction);
    Ok(())
  }

  /// Define a label at the current position
  pub fn label(&mut self, name: impl Into<SmartString>) {
    let position = self.position();
    self.labels.insert(name.into(), position);
  }

  /// The position of a label, if it has been defined
  #[must_use]
  pub fn label_position(&self, name: &str) -> Option<u32> {
    self.labels.get(name).copied()
  }

  /// Resolve label references, and write the instructions into the blob's text section.
  ///
  /// Calling it again without emitting more instructions does nothing.
  ///
  /// # Errors
  /// If a referenced label was never defined
  pub fn finalize(&mut self) -> Result<(), AssemblerError> {
    // nothing is changed unless every label resolves, so it can be tried again
    let unresolved = (self.fixups.iter()).find(|(_, label)| !self.labels.contains_key(label));
    if let Some((_, label)) = unresolved {
      return Err(AssemblerError::UnresolvedLabel(label.clone()));
    }

    let Some(mut words) = self.words.take() else {
      return Ok(());
    };
    for (position, label) in self.fixups.drain(..) {
      if let Some(target) = self.labels.get(&label) {
        words[position] = *target;
      }
    }

    if !words.is_empty() {
      self.blob.append_text(&words);
    }
    tracing::trace!(words = words.len(), "assembled text");

    Ok(())
  }

  /// Finalize the assembler, and return the finished blob
  ///
  /// # Errors
  /// If a referenced label was never defined
  pub fn into_blob(mut self) -> Result<Blob, AssemblerError> {
    self.finalize()?;
    Ok(self.blob)
  }
}

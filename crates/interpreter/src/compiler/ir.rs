//! A linear, label based intermediate representation, and its assembly into a blob.

use crate::{class::ClassId, collections::String as SmartString};
use axol_blob::{
  Assembler, AssemblerError, Binding, Blob, DebugEntry, OpCode, Operand, OperandKind, Symbol,
  SymbolKind,
};
use axol_syntax::{LineIndex, Span};
use std::fmt;

/// An item in the body of a function
#[derive(Clone, Debug, PartialEq)]
pub enum Instruction {
  /// Marks a position which jumps can refer to
  Label(SmartString),
  /// An instruction with its operands
  Op {
    /// The instruction
    opcode: OpCode,
    /// The operands, with as many as the opcode takes
    operands: Vec<Operand>,
    /// The source the instruction was compiled from, if it can raise an error
    span: Option<Span>,
  },
}

/// A function or method
#[derive(Clone, Debug)]
pub struct Function {
  /// The name, methods are prefixed by the class name
  pub name: SmartString,
  /// Is it a function or a method
  pub kind: SymbolKind,
  /// Global functions are added to the module's globals
  pub binding: Binding,
  /// The class of each parameter
  pub signature: Vec<ClassId>,
  /// The names of the parameters
  pub parameters: Vec<SmartString>,
  /// The number of local variable slots
  pub locals: u32,
  /// The instructions
  pub body: Vec<Instruction>,
}

/// A class and its methods
#[derive(Clone, Debug)]
pub struct ClassDeclaration {
  /// The name of the class
  pub name: SmartString,
  /// The methods, as indexes into [`Program::functions`]
  pub methods: Vec<usize>,
}

/// A compiled module, before it is assembled
#[derive(Clone, Debug, Default)]
pub struct Program {
  /// The name of the module
  pub module: SmartString,
  /// Every function, including the entry point
  pub functions: Vec<Function>,
  /// The classes declared
  pub classes: Vec<ClassDeclaration>,
  /// The constant pool, as pairs of class name and serialized value
  pub constants: Vec<(SmartString, String)>,
}
impl Program {
  /// Assemble the program into a blob.
  ///
  /// If a line index is given, instructions with a span get a debug entry.
  ///
  /// # Errors
  /// If an instruction has the wrong number of operands, or a label is missing
  pub fn assemble(&self, line_index: Option<&LineIndex>) -> Result<Blob, AssemblerError> {
    let mut assembler = Assembler::new(Blob::new(&self.module));

    for (class, value) in &self.constants {
      assembler.blob_mut().add_constant(class, value);
    }

    for (index, function) in self.functions.iter().enumerate() {
      assembler.label(entry_label(index));

      for instruction in &function.body {
        match instruction {
          Instruction::Label(label) => assembler.label(label.clone()),
          Instruction::Op {
            opcode,
            operands,
            span,
          } => {
            let debug = span
              .zip(line_index)
              .map(|(span, line_index)| debug_entry(span, line_index));
            assembler.emit(*opcode, operands, debug)?;
          }
        }
      }
    }
    assembler.finalize()?;

    let mut symbols = Vec::with_capacity(self.functions.len());
    for (index, function) in self.functions.iter().enumerate() {
      let label = entry_label(index);
      let address = assembler
        .label_position(&label)
        .ok_or(AssemblerError::UnresolvedLabel(label))?;

      let blob = assembler.blob_mut();
      let symbol = Symbol {
        name: blob.add_string(&function.name),
        kind: function.kind,
        binding: function.binding,
        address,
        locals: function.locals,
        signature: blob.add_signature(&function.signature),
      };
      symbols.push(blob.add_symbol(symbol));
    }

    for class in &self.classes {
      let methods = (class.methods.iter())
        .filter_map(|method| symbols.get(*method).copied())
        .collect::<Vec<_>>();
      assembler.blob_mut().add_type_spec(&class.name, &methods);
    }

    tracing::debug!(module = %self.module, functions = symbols.len(), "assembled program");
    assembler.into_blob()
  }
}

/// Functions can share a name, so entry points are labelled by index
fn entry_label(function: usize) -> SmartString {
  format!("@{function}").into()
}

fn debug_entry(span: Span, line_index: &LineIndex) -> DebugEntry {
  let (line, col) = line_index.line_col(span);
  DebugEntry {
    line,
    col,
    extent: span.len(),
  }
}

impl fmt::Display for Program {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    writeln!(f, "module {}", self.module)?;

    if !self.constants.is_empty() {
      writeln!(f, "constants")?;
      for (index, (class, value)) in self.constants.iter().enumerate() {
        writeln!(f, "  #{index} {class} {value:?}")?;
      }
    }

    for function in &self.functions {
      writeln!(f)?;
      function.fmt(f)?;
    }

    for class in &self.classes {
      let methods = (class.methods.iter())
        .filter_map(|method| self.functions.get(*method))
        .map(|method| method.name.as_str())
        .collect::<Vec<_>>();
      writeln!(f, "\nclass {} [{}]", class.name, methods.join(", "))?;
    }

    Ok(())
  }
}
impl fmt::Display for Function {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let kind = match self.kind {
      SymbolKind::Method => "method",
      _ => "fn",
    };
    writeln!(
      f,
      "{kind} {}({}) locals {}",
      self.name,
      self.parameters.join(", "),
      self.locals
    )?;

    for instruction in &self.body {
      writeln!(f, "{instruction}")?;
    }
    Ok(())
  }
}
impl fmt::Display for Instruction {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let (opcode, operands) = match self {
      Self::Label(label) => return write!(f, "{label}:"),
      Self::Op {
        opcode, operands, ..
      } => (opcode, operands),
    };

    write!(f, "  {opcode}")?;
    for (kind, operand) in opcode.info().operands.iter().zip(operands) {
      match (kind, operand) {
        (_, Operand::String(string)) => write!(f, " '{string}'")?,
        (_, Operand::Label(label)) => write!(f, " {label}")?,
        (OperandKind::Constant, Operand::Index(index)) => match index.cast_signed() {
          slot if slot < 0 => write!(f, " arg{}", -(slot + 1))?,
          index => write!(f, " #{index}")?,
        },
        (_, Operand::Index(index)) => write!(f, " {index}")?,
      }
    }
    Ok(())
  }
}

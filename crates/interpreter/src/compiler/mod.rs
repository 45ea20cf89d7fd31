//! # Compiler
//! Lowers an AST into the intermediate representation, which is then assembled into a blob.
//!
//! Every function becomes a symbol. Top level code becomes the entry point
//! function `__main__`, and the variables it assigns are globals of the module.
//! Inside other functions, any name which is assigned to is a local variable,
//! parameters are read as argument slots, and every other name is a global.
//! Operators are calls to methods with special names, such as `__add__`.

pub mod ir;

pub use ir::{Instruction, Program};

use crate::{
  class::{ANY_ID, BUILTIN_MODULE, ClassId, class_id},
  collections::{HashMap, String as SmartString},
  module::ENTRY_POINT,
  object::names,
  stdlib::BUILTIN_CLASSES,
};
use axol_blob::{AssemblerError, Binding, Blob, OpCode, Operand, SymbolKind};
use axol_syntax::{
  AST, Span,
  ast::{expression::*, statement::*},
};
use rustc_hash::FxHashSet as HashSet;
use std::mem;

/// Compile an AST into a blob for a module
///
/// # Examples
/// ```
/// use axol_syntax::parse;
/// let ast = parse("x = 1; y = x + 2; return y;".to_owned());
/// let blob = axol_interpreter::compile(&ast, "main").unwrap();
///
/// assert!(blob.find_symbol("__main__").is_some());
/// ```
///
/// # Errors
/// If the AST has errors, or contains something which can't be compiled
pub fn compile(ast: &AST, module: &str) -> Result<Blob, CompileError> {
  let program = lower(ast, module)?;
  Ok(program.assemble(Some(ast.line_index()))?)
}

/// Lower an AST into the intermediate representation for a module
///
/// # Errors
/// If the AST has errors, or contains something which can't be compiled
pub fn lower(ast: &AST, module: &str) -> Result<Program, CompileError> {
  if !ast.is_valid() {
    return Err(CompileError::InvalidAST);
  }

  let mut compiler = Compiler::new(module);
  compiler.declare(ast)?;

  for statement in &ast.root_statements {
    statement.compile(&mut compiler, ast)?;
  }
  compiler.emit(OpCode::Leave, &[], None);

  Ok(compiler.finish())
}

struct FunctionBuilder<'s> {
  name: SmartString,
  kind: SymbolKind,
  binding: Binding,
  signature: Vec<ClassId>,
  parameters: Vec<&'s str>,
  locals: Vec<&'s str>,
  body: Vec<Instruction>,
}
impl<'s> FunctionBuilder<'s> {
  fn entry_point() -> Self {
    Self {
      name: ENTRY_POINT.into(),
      kind: SymbolKind::Function,
      binding: Binding::Global,
      signature: Vec::new(),
      parameters: Vec::new(),
      locals: Vec::new(),
      body: Vec::new(),
    }
  }

  fn finish(self) -> ir::Function {
    ir::Function {
      name: self.name,
      kind: self.kind,
      binding: self.binding,
      signature: self.signature,
      parameters: self.parameters.into_iter().map(SmartString::from).collect(),
      locals: u32::try_from(self.locals.len()).unwrap_or(u32::MAX),
      body: self.body,
    }
  }
}

/// Where a variable is stored
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Slot {
  Local(u32),
  Argument(u32),
  Global,
}

struct Compiler<'s> {
  module: SmartString,
  program: Program,
  function: FunctionBuilder<'s>,
  constants: HashMap<(SmartString, String), u32>,

  /// Modules imported with a qualified name
  aliases: HashSet<&'s str>,
  /// Classes declared in the module
  classes: HashSet<&'s str>,
  label_count: usize,
}
impl<'s> Compiler<'s> {
  fn new(module: &str) -> Self {
    Self {
      module: module.into(),
      program: Program {
        module: module.into(),
        ..Program::default()
      },
      function: FunctionBuilder::entry_point(),
      constants: HashMap::default(),

      aliases: HashSet::default(),
      classes: HashSet::default(),
      label_count: 0,
    }
  }

  fn finish(mut self) -> Program {
    let entry_point = mem::replace(&mut self.function, FunctionBuilder::entry_point());
    self.program.functions.push(entry_point.finish());
    self.program
  }

  /// Find the globals declared in the module, and the modules imported by name
  fn declare(&mut self, ast: &'s AST) -> Result<(), CompileError> {
    let mut globals = HashSet::default();
    let methods = (ast.all_statements())
      .filter_map(|statement| match statement {
        Statement::Class(class) => Some(class.methods(ast)),
        _ => None,
      })
      .flatten()
      .map(std::ptr::from_ref)
      .collect::<HashSet<_>>();

    for statement in ast.all_statements() {
      let (name, span) = match statement {
        Statement::Function(function) if methods.contains(&std::ptr::from_ref(function)) => {
          continue;
        }
        Statement::Function(function) => (function.name(ast), function.name_span(ast)),
        Statement::Class(class) => {
          self.classes.insert(class.name(ast));
          (class.name(ast), class.span(ast))
        }
        Statement::Import(import) => {
          if import.kind(ast) == ImportKind::Qualified {
            self.aliases.insert(import.module(ast));
          }
          continue;
        }
        _ => continue,
      };

      if !globals.insert(name) {
        return Err(CompileError::DuplicateDefinition(name.into(), span));
      }
    }

    Ok(())
  }

  fn emit(&mut self, opcode: OpCode, operands: &[Operand], span: Option<Span>) {
    self.function.body.push(Instruction::Op {
      opcode,
      operands: operands.to_vec(),
      span,
    });
  }

  fn new_label(&mut self) -> SmartString {
    self.label_count += 1;
    format!("L{}", self.label_count).into()
  }
  fn place_label(&mut self, label: &SmartString) {
    self.function.body.push(Instruction::Label(label.clone()));
  }

  fn add_constant(&mut self, class: &str, value: String) -> u32 {
    let key = (SmartString::from(class), value);
    if let Some(index) = self.constants.get(&key) {
      return *index;
    }

    let index = u32::try_from(self.program.constants.len()).unwrap_or(u32::MAX);
    self.program.constants.push(key.clone());
    self.constants.insert(key, index);
    index
  }
  fn load_constant(&mut self, class: &str, value: String) {
    let index = self.add_constant(class, value);
    self.emit(OpCode::LoadConst, &[Operand::Index(index)], None);
  }

  fn resolve(&self, name: &str) -> Slot {
    if let Some(index) = self.function.locals.iter().position(|local| *local == name) {
      return Slot::Local(u32::try_from(index).unwrap_or(u32::MAX));
    }
    let mut parameters = self.function.parameters.iter();
    if let Some(index) = parameters.position(|parameter| *parameter == name) {
      return Slot::Argument(u32::try_from(index).unwrap_or(u32::MAX));
    }
    Slot::Global
  }

  fn load_variable(&mut self, name: &str, span: Span) {
    match self.resolve(name) {
      Slot::Local(index) => self.emit(OpCode::LoadLocal, &[Operand::Index(index)], None),
      Slot::Argument(index) => self.emit(OpCode::LoadConst, &[argument_slot(index)], None),
      Slot::Global => self.emit(OpCode::LoadGlobal, &[Operand::string(name)], Some(span)),
    }
  }

  /// The qualified global name for `alias.name`, if `alias` is an imported module
  fn qualified_name(&self, member: &Member, ast: &AST) -> Option<String> {
    let Expression::Variable(variable) = member.object(ast) else {
      return None;
    };

    let alias = variable.name(ast);
    let is_alias = self.aliases.contains(alias) && self.resolve(alias) == Slot::Global;
    is_alias.then(|| format!("{alias}.{}", member.name(ast)))
  }

  fn annotation_class(&self, parameter: &Parameter, ast: &AST) -> Result<ClassId, CompileError> {
    match parameter.annotation(ast) {
      None | Some("Any") => Ok(ANY_ID),
      Some(name) if BUILTIN_CLASSES.contains(&name) => Ok(class_id(name, BUILTIN_MODULE)),
      Some(name) if self.classes.contains(name) => Ok(class_id(name, &self.module)),
      Some(name) => Err(CompileError::UnknownClass(name.into(), parameter.span(ast))),
    }
  }

  /// Compile a function into its own symbol, returning its index in the program
  fn compile_function(
    &mut self,
    function: &Function,
    ast: &'s AST,
    class: Option<&str>,
  ) -> Result<usize, CompileError> {
    let (name, kind, binding) = match class {
      Some(class) => (
        format!("{class}.{}", function.name(ast)).into(),
        SymbolKind::Method,
        Binding::Local,
      ),
      None => (function.name(ast).into(), SymbolKind::Function, Binding::Global),
    };

    let mut parameters = Vec::with_capacity(function.parameters().len() + 1);
    let mut signature = Vec::with_capacity(function.parameters().len() + 1);
    if class.is_some() {
      parameters.push("self");
      signature.push(ANY_ID);
    }
    for parameter in function.parameters() {
      parameters.push(parameter.name(ast));
      signature.push(self.annotation_class(parameter, ast)?);
    }

    let mut locals = Vec::new();
    assigned_names(function.body(ast), ast, &mut locals);

    let builder = FunctionBuilder {
      name,
      kind,
      binding,
      signature,
      parameters,
      locals,
      body: Vec::new(),
    };
    let enclosing = mem::replace(&mut self.function, builder);

    // parameters which are assigned to are copied into a local first
    for (index, parameter) in self.function.parameters.clone().into_iter().enumerate() {
      if let Slot::Local(local) = self.resolve(parameter) {
        let index = u32::try_from(index).unwrap_or(u32::MAX);
        self.emit(OpCode::LoadConst, &[argument_slot(index)], None);
        self.emit(OpCode::StorLocal, &[Operand::Index(local)], None);
      }
    }

    function.body(ast).compile(self, ast)?;
    self.emit(OpCode::Leave, &[], None);

    let finished = mem::replace(&mut self.function, enclosing);
    self.program.functions.push(finished.finish());
    Ok(self.program.functions.len() - 1)
  }
}

/// The operand of `LOAD_CONST` to read an argument
fn argument_slot(index: u32) -> Operand {
  let index = i32::try_from(index).unwrap_or(i32::MAX - 1);
  Operand::signed(-(index + 1))
}

/// Collect the names of variables assigned to in a function body
fn assigned_names<'s>(statement: &'s Statement, ast: &'s AST, names: &mut Vec<&'s str>) {
  match statement {
    Statement::Assignment(assignment) => {
      if let Expression::Variable(variable) = assignment.target(ast) {
        let name = variable.name(ast);
        if !names.contains(&name) {
          names.push(name);
        }
      }
    }
    Statement::Block(block) => {
      for statement in block.statements(ast) {
        assigned_names(statement, ast, names);
      }
    }
    Statement::If(if_) => {
      assigned_names(if_.then(ast), ast, names);
      if let Some(otherwise) = if_.otherwise(ast) {
        assigned_names(otherwise, ast, names);
      }
    }
    Statement::While(while_) => assigned_names(while_.body(ast), ast, names),
    Statement::Class(_)
    | Statement::Expression(_)
    | Statement::Function(_)
    | Statement::Import(_)
    | Statement::Return(_) => {}
  }
}

trait Compile<'s> {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError>;
}

impl<'s> Compile<'s> for Expression {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    match self {
      Self::Binary(binary) => binary.compile(compiler, ast),
      Self::Call(call) => call.compile(compiler, ast),
      Self::Group(group) => group.expression(ast).compile(compiler, ast),
      Self::Literal(literal) => literal.compile(compiler, ast),
      Self::Member(member) => member.compile(compiler, ast),
      Self::Unary(unary) => unary.compile(compiler, ast),
      Self::Variable(variable) => {
        compiler.load_variable(variable.name(ast), variable.span(ast));
        Ok(())
      }
      Self::Invalid(_) => Err(CompileError::InvalidAST),
    }
  }
}
impl<'s> Compile<'s> for Binary {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let span = Some(self.operator_span(ast));

    let method = match self.operator(ast) {
      BinaryOperator::Add => names::ADD,
      BinaryOperator::Subtract => names::SUBTRACT,
      BinaryOperator::Multiply => names::MULTIPLY,
      BinaryOperator::Divide => names::DIVIDE,
      BinaryOperator::Remainder => names::REMAINDER,
      BinaryOperator::NotEqual => names::NOT_EQUAL,
      BinaryOperator::Equal => names::EQUAL,
      BinaryOperator::Greater => names::GREATER,
      BinaryOperator::GreaterEqual => names::GREATER_EQUAL,
      BinaryOperator::Less => names::LESS,
      BinaryOperator::LessEqual => names::LESS_EQUAL,
      BinaryOperator::And => return short_circuit(self, compiler, ast, OpCode::JmpIfFalse, false),
      BinaryOperator::Or => return short_circuit(self, compiler, ast, OpCode::JmpIfTrue, true),
    };

    self.left(ast).compile(compiler, ast)?;
    self.right(ast).compile(compiler, ast)?;
    compiler.emit(
      OpCode::Method,
      &[Operand::string(method), Operand::Index(1)],
      span,
    );

    Ok(())
  }
}
/// The right side is only evaluated if the left doesn't decide the result
fn short_circuit<'s>(
  binary: &Binary,
  compiler: &mut Compiler<'s>,
  ast: &'s AST,
  jump: OpCode,
  value: bool,
) -> Result<(), CompileError> {
  let (short, end) = (compiler.new_label(), compiler.new_label());
  let span = Some(binary.operator_span(ast));

  binary.left(ast).compile(compiler, ast)?;
  compiler.emit(jump, &[Operand::label(short.clone())], span);
  binary.right(ast).compile(compiler, ast)?;
  compiler.emit(OpCode::Jmp, &[Operand::label(end.clone())], None);
  compiler.place_label(&short);
  compiler.load_constant("bool", value.to_string());
  compiler.place_label(&end);

  Ok(())
}
impl<'s> Compile<'s> for Call {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let span = Some(self.span(ast));
    let argument_count = u32::try_from(self.arguments(ast).len()).unwrap_or(u32::MAX);

    if let Expression::Member(member) = self.callee(ast) {
      if let Some(qualified) = compiler.qualified_name(member, ast) {
        for argument in self.arguments(ast) {
          argument.compile(compiler, ast)?;
        }
        compiler.emit(OpCode::LoadGlobal, &[Operand::string(qualified)], span);
        compiler.emit(OpCode::Invoke, &[Operand::Index(argument_count)], span);
        return Ok(());
      }

      member.object(ast).compile(compiler, ast)?;
      for argument in self.arguments(ast) {
        argument.compile(compiler, ast)?;
      }
      let operands = [
        Operand::string(member.name(ast)),
        Operand::Index(argument_count),
      ];
      compiler.emit(OpCode::Method, &operands, span);
      return Ok(());
    }

    for argument in self.arguments(ast) {
      argument.compile(compiler, ast)?;
    }
    self.callee(ast).compile(compiler, ast)?;
    compiler.emit(OpCode::Invoke, &[Operand::Index(argument_count)], span);

    Ok(())
  }
}
impl<'s> Compile<'s> for Literal {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let (class, value) = match self.value(ast) {
      LiteralValue::Integer(value) => ("int", value.to_string()),
      LiteralValue::Float(value) => ("float", format!("{value:?}")),
      LiteralValue::String(value) if value.contains('\0') => {
        return Err(CompileError::NulInString(self.span(ast)));
      }
      LiteralValue::String(value) => ("string", value),
      LiteralValue::Boolean(value) => ("bool", value.to_string()),
      LiteralValue::Nil => ("nil", String::new()),
    };

    compiler.load_constant(class, value);
    Ok(())
  }
}
impl<'s> Compile<'s> for Member {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let span = Some(self.span(ast));

    if let Some(qualified) = compiler.qualified_name(self, ast) {
      compiler.emit(OpCode::LoadGlobal, &[Operand::string(qualified)], span);
    } else {
      self.object(ast).compile(compiler, ast)?;
      compiler.emit(OpCode::LoadMember, &[Operand::string(self.name(ast))], span);
    }

    Ok(())
  }
}
impl<'s> Compile<'s> for Unary {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let method = match self.operator(ast) {
      UnaryOperator::Minus => names::NEGATE,
      UnaryOperator::Not => names::NOT,
    };

    self.expression(ast).compile(compiler, ast)?;
    compiler.emit(
      OpCode::Method,
      &[Operand::string(method), Operand::Index(0)],
      Some(self.span(ast)),
    );
    Ok(())
  }
}

impl<'s> Compile<'s> for Statement {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    match self {
      Self::Assignment(assignment) => assignment.compile(compiler, ast),
      Self::Block(block) => {
        for statement in block.statements(ast) {
          statement.compile(compiler, ast)?;
        }
        Ok(())
      }
      Self::Class(class) => class.compile(compiler, ast),
      Self::Expression(expression) => {
        expression.expression(ast).compile(compiler, ast)?;
        compiler.emit(OpCode::Pop, &[], None);
        Ok(())
      }
      Self::Function(function) => {
        compiler.compile_function(function, ast, None)?;
        Ok(())
      }
      Self::If(if_) => if_.compile(compiler, ast),
      Self::Import(import) => import.compile(compiler, ast),
      Self::Return(return_) => return_.compile(compiler, ast),
      Self::While(while_) => while_.compile(compiler, ast),
    }
  }
}
impl<'s> Compile<'s> for Assignment {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    match self.target(ast) {
      Expression::Variable(variable) => {
        self.value(ast).compile(compiler, ast)?;

        let name = variable.name(ast);
        match compiler.resolve(name) {
          Slot::Local(index) => compiler.emit(OpCode::StorLocal, &[Operand::Index(index)], None),
          Slot::Global => compiler.emit(OpCode::StorGlobal, &[Operand::string(name)], None),
          Slot::Argument(_) => return Err(CompileError::InvalidAST),
        }
      }
      Expression::Member(member) => {
        self.value(ast).compile(compiler, ast)?;

        let span = Some(member.span(ast));
        if let Some(qualified) = compiler.qualified_name(member, ast) {
          compiler.emit(OpCode::StorGlobal, &[Operand::string(qualified)], span);
        } else {
          member.object(ast).compile(compiler, ast)?;
          compiler.emit(OpCode::StorMember, &[Operand::string(member.name(ast))], span);
        }
      }
      _ => return Err(CompileError::InvalidAST),
    }

    Ok(())
  }
}
impl<'s> Compile<'s> for Class {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let name = self.name(ast);

    let methods = (self.methods(ast))
      .map(|method| compiler.compile_function(method, ast, Some(name)))
      .collect::<Result<Vec<_>, _>>()?;

    compiler.program.classes.push(ir::ClassDeclaration {
      name: name.into(),
      methods,
    });
    Ok(())
  }
}
impl<'s> Compile<'s> for If {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let (otherwise, end) = (compiler.new_label(), compiler.new_label());

    self.condition(ast).compile(compiler, ast)?;
    let span = Some(self.condition(ast).span(ast));
    compiler.emit(OpCode::JmpIfFalse, &[Operand::label(otherwise.clone())], span);

    self.then(ast).compile(compiler, ast)?;
    compiler.emit(OpCode::Jmp, &[Operand::label(end.clone())], None);

    compiler.place_label(&otherwise);
    if let Some(statement) = self.otherwise(ast) {
      statement.compile(compiler, ast)?;
    }
    compiler.place_label(&end);

    Ok(())
  }
}
impl<'s> Compile<'s> for Import {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let module = Operand::string(self.module(ast));
    let span = Some(self.span(ast));

    match self.kind(ast) {
      ImportKind::Qualified => compiler.emit(OpCode::Import, &[module], span),
      ImportKind::All => compiler.emit(OpCode::ImportMask, &[module, Operand::string("*")], span),
      ImportKind::Named(name) => {
        compiler.emit(OpCode::ImportMask, &[module, Operand::string(name)], span);
      }
    }

    Ok(())
  }
}
impl<'s> Compile<'s> for Return {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    match self.value(ast) {
      Some(value) => {
        value.compile(compiler, ast)?;
        compiler.emit(OpCode::Return, &[], None);
      }
      None => compiler.emit(OpCode::Leave, &[], None),
    }

    Ok(())
  }
}
impl<'s> Compile<'s> for While {
  fn compile(&self, compiler: &mut Compiler<'s>, ast: &'s AST) -> Result<(), CompileError> {
    let (start, end) = (compiler.new_label(), compiler.new_label());

    compiler.place_label(&start);
    self.condition(ast).compile(compiler, ast)?;
    let span = Some(self.condition(ast).span(ast));
    compiler.emit(OpCode::JmpIfFalse, &[Operand::label(end.clone())], span);

    self.body(ast).compile(compiler, ast)?;
    compiler.emit(OpCode::Jmp, &[Operand::label(start)], None);
    compiler.place_label(&end);

    Ok(())
  }
}

/// An error whilst compiling an AST
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CompileError {
  /// The AST has errors in it
  #[error("the AST contains an error, see errors from parser")]
  InvalidAST,
  /// A function or class is declared twice
  #[error("`{0}` is already defined")]
  DuplicateDefinition(SmartString, Span),
  /// A parameter annotation isn't a known class
  #[error("class `{0}` is not defined")]
  UnknownClass(SmartString, Span),
  /// A string literal contains a nul character
  #[error("strings can't contain the nul character")]
  NulInString(Span),
  /// The instructions couldn't be assembled
  #[error(transparent)]
  Assembler(#[from] AssemblerError),
}
impl CompileError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    match self {
      Self::InvalidAST => "Invalid AST",
      Self::DuplicateDefinition(..) => "Duplicate Definition",
      Self::UnknownClass(..) => "Unknown Class",
      Self::NulInString(_) => "Invalid String",
      Self::Assembler(error) => error.title(),
    }
  }

  /// The body of the error message describing what has gone wrong
  #[must_use]
  pub fn message(&self) -> String {
    self.to_string()
  }

  /// The location of the error, if it relates to the source
  #[must_use]
  pub fn span(&self) -> Option<Span> {
    match self {
      Self::DuplicateDefinition(_, span)
      | Self::UnknownClass(_, span)
      | Self::NulInString(span) => Some(*span),
      Self::InvalidAST | Self::Assembler(_) => None,
    }
  }
}

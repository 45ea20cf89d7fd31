//! # Engine
//! Executes the bytecode of modules.
//!
//! There is a single stack of objects. A call pushes its arguments, then a frame
//! object holding the caller's state, then a slot for each local variable:
//!
//! ```text
//! [.., arg 0, .., arg n-1, frame, local 0, .., local m-1, temporaries ..]
//!                                 ^ locals_start
//! ```
//!
//! Scripted functions calling scripted functions don't recurse on the native
//! stack. When native code calls a scripted function, a frame marked as the
//! boundary is pushed, and the loop runs until that frame is returned to.

use crate::{
  callable::{Callable, ScriptedFunction},
  class::{Class, ClassRef},
  collections::String as SmartString,
  error::{ErrorKind, Location, RuntimeError},
  import::ImportTable,
  module::{ENTRY_POINT, Module},
  object::{Object, Value, names},
  runtime::Runtime,
};
use axol_blob::{OpCode, decode};
use std::{mem, rc::Rc};

/// The most calls from native code into scripted code which can be active at once
const MAX_NESTING: usize = 200;

/// The state of a running function
#[derive(Clone, Debug, Default)]
struct State {
  module: Option<Module>,
  text: Option<Rc<[u32]>>,
  /// The next instruction to fetch
  pc: usize,
  /// The address of the instruction being run
  instruction: u32,
  /// The debug entry of the instruction being run
  debug: Option<u32>,
  locals_start: usize,
  locals_count: usize,
  argc: usize,
}

/// The state of the caller, saved on the stack when a scripted function is called
#[derive(Debug)]
pub struct StackFrame {
  /// Returning to this frame leaves the interpreter loop
  boundary: bool,
  state: State,
}

enum Flow {
  Continue,
  Return(Object),
}

/// The bytecode interpreter
#[derive(Debug)]
pub struct Engine {
  runtime: Rc<Runtime>,
  imports: ImportTable,
  stack: Vec<Object>,
  state: State,
  nesting: usize,
}
impl Engine {
  /// Create an engine with its own import table
  #[must_use]
  pub fn new(runtime: Rc<Runtime>) -> Self {
    Self::with_imports(runtime, ImportTable::new())
  }

  /// Create an engine which imports modules through an existing table
  #[must_use]
  pub fn with_imports(runtime: Rc<Runtime>, imports: ImportTable) -> Self {
    Self {
      runtime,
      imports,
      stack: Vec::with_capacity(256),
      state: State::default(),
      nesting: 0,
    }
  }

  /// The runtime the engine uses
  #[must_use]
  pub fn runtime(&self) -> &Rc<Runtime> {
    &self.runtime
  }

  /// The import table the engine uses
  #[must_use]
  pub fn imports(&self) -> &ImportTable {
    &self.imports
  }

  /// Call an object with arguments.
  ///
  /// A function is called directly. Any other object is called through its
  /// `__call__` member, choosing the first entry which matches the arguments, or
  /// which matches with the object passed as the first argument.
  ///
  /// # Errors
  /// If the object can't be called with the arguments, or the call fails
  pub fn invoke(&mut self, callee: &Object, arguments: &[Object]) -> Result<Object, RuntimeError> {
    match self.resolve_call(callee, arguments)? {
      (callable, false) => self.call(&callable, arguments),
      (callable, true) => {
        let mut with_self = Vec::with_capacity(arguments.len() + 1);
        with_self.push(callee.clone());
        with_self.extend_from_slice(arguments);
        self.call(&callable, &with_self)
      }
    }
  }

  /// Call a member of an object, with the object as the first argument
  ///
  /// # Errors
  /// If there is no matching member, or the call fails
  pub fn method(
    &mut self,
    receiver: &Object,
    name: &str,
    arguments: &[Object],
  ) -> Result<Object, RuntimeError> {
    let mut with_self = Vec::with_capacity(arguments.len() + 1);
    with_self.push(receiver.clone());
    with_self.extend_from_slice(arguments);

    if let Some(result) = compare_nil(name, &with_self) {
      return Ok(result.into());
    }
    match self.resolve_method(receiver, name, &with_self)? {
      Method::Bound(callable) => self.call(&callable, &with_self),
      Method::Field(field) => self.invoke(&field, arguments),
    }
  }

  /// Create an instance of a class, calling its `__init__` member with the arguments
  ///
  /// # Errors
  /// If `__init__` doesn't accept the arguments, or it fails
  pub fn construct(
    &mut self,
    class: &Rc<Class>,
    arguments: &[Object],
  ) -> Result<Object, RuntimeError> {
    let instance = Object::instance(class);

    if instance.has(names::INIT) {
      self.method(&instance, names::INIT, arguments)?;
    } else if !arguments.is_empty() {
      return Err(RuntimeError::signature(class.name(), arguments));
    }

    Ok(instance)
  }

  /// Run the finalizer of an object which is being dropped.
  ///
  /// There may not be an engine running, so the finalizer is run on a new engine.
  /// A scripted finalizer uses the runtime of the module it was declared in, and a
  /// native one the runtime of the object's class. Objects whose class isn't
  /// attached to a runtime share one runtime per thread.
  ///
  /// # Errors
  /// If the finalizer fails
  pub fn run_finalizer(finalizer: &Object, receiver: Object) -> Result<(), RuntimeError> {
    let runtime = match finalizer.as_callable() {
      Some(Callable::Scripted(function)) => (function.module.upgrade())
        .and_then(|module| module.runtime())
        .ok_or_else(|| RuntimeError::internal("module of finalizer no longer exists"))?,
      _ => match receiver.class_runtime() {
        Some(runtime) => runtime,
        None => Runtime::detached()?,
      },
    };

    Self::new(runtime).invoke(finalizer, &[receiver]).map(drop)
  }

  /// Run a function of a module by name
  ///
  /// # Errors
  /// If there is no such global, or the call fails
  pub fn run(
    &mut self,
    module: &Module,
    name: &str,
    arguments: &[Object],
  ) -> Result<Object, RuntimeError> {
    let function = module
      .global(name)
      .ok_or_else(|| RuntimeError::no_global(name))?;
    self.invoke(&function, arguments)
  }

  /// The number of objects on the stack
  #[must_use]
  pub fn stack_depth(&self) -> usize {
    self.stack.len()
  }
}

enum Method {
  /// A member which takes the object as the first argument
  Bound(Callable),
  /// A member holding a value which is called without the object
  Field(Object),
}

/// Dispatch
impl Engine {
  fn resolve_call(
    &self,
    callee: &Object,
    arguments: &[Object],
  ) -> Result<(Callable, bool), RuntimeError> {
    if let Some(callable) = callee.as_callable() {
      for argument in arguments {
        self.runtime.bind(argument);
      }
      if !callable.matches(arguments) {
        return Err(RuntimeError::signature(callable.name(), arguments));
      }
      return Ok((callable, false));
    }

    if let Some(entry) = self.runtime.resolve(callee, names::CALL, arguments) {
      return Ok((callable_of(&entry)?, false));
    }

    let mut with_self = Vec::with_capacity(arguments.len() + 1);
    with_self.push(callee.clone());
    with_self.extend_from_slice(arguments);
    if let Some(entry) = self.runtime.resolve(callee, names::CALL, &with_self) {
      return Ok((callable_of(&entry)?, true));
    }

    if callee.has(names::CALL) {
      Err(RuntimeError::signature(&callee.class_name(), arguments))
    } else {
      Err(RuntimeError::new(ErrorKind::Class(format!(
        "`{}` is not callable",
        callee.class_name()
      ))))
    }
  }

  fn resolve_method(
    &self,
    receiver: &Object,
    name: &str,
    with_self: &[Object],
  ) -> Result<Method, RuntimeError> {
    if let Some(entry) = self.runtime.resolve(receiver, name, with_self) {
      return Ok(Method::Bound(callable_of(&entry)?));
    }

    match self.runtime.entries(receiver, name).as_slice() {
      [] => Err(RuntimeError::no_member(&receiver.class_name(), name)),
      [field]
        if field
          .as_callable()
          .is_none_or(|callable| callable.signature().arity() != Some(with_self.len())) =>
      {
        Ok(Method::Field(field.clone()))
      }
      _ => Err(RuntimeError::signature(name, with_self)),
    }
  }

  /// Call a function whose signature has been checked
  fn call(&mut self, callable: &Callable, arguments: &[Object]) -> Result<Object, RuntimeError> {
    match callable {
      Callable::Native(native) => native.call(self, arguments),
      Callable::Scripted(function) => self.call_scripted(function, arguments),
    }
  }

  /// Run a scripted function to completion
  fn call_scripted(
    &mut self,
    function: &Rc<ScriptedFunction>,
    arguments: &[Object],
  ) -> Result<Object, RuntimeError> {
    if self.nesting >= MAX_NESTING {
      return Err(RuntimeError::internal("too many nested calls"));
    }
    let (depth, saved) = (self.stack.len(), self.state.clone());

    self.nesting += 1;
    let result = self
      .push_all(arguments)
      .and_then(|()| self.enter(function, arguments.len(), true))
      .and_then(|()| self.execute());
    self.nesting -= 1;

    if result.is_err() {
      self.truncate(depth);
      self.state = saved;
    }
    result
  }

  /// Push a frame and start running a scripted function, whose arguments are on the stack
  fn enter(
    &mut self,
    function: &Rc<ScriptedFunction>,
    argc: usize,
    boundary: bool,
  ) -> Result<(), RuntimeError> {
    let module = (function.module.upgrade()).ok_or_else(|| {
      RuntimeError::internal(format!("module of `{}` no longer exists", function.name()))
    })?;
    tracing::trace!(function = function.name(), module = module.name(), "call");

    let frame = StackFrame {
      boundary,
      state: mem::take(&mut self.state),
    };
    self.push(Object::new(ClassRef::Pending("frame".into()), Value::Frame(Rc::new(frame))))?;

    self.state = State {
      text: Some(module.text()),
      module: Some(module),
      pc: function.address() as usize,
      instruction: function.address(),
      debug: None,
      locals_start: self.stack.len(),
      locals_count: function.locals as usize,
      argc,
    };
    for _ in 0..function.locals {
      self.push(Object::nil())?;
    }

    Ok(())
  }

  /// Return from the running function, back to the caller's state
  fn leave(&mut self, value: Object) -> Result<Flow, RuntimeError> {
    let frame_index = self
      .state
      .locals_start
      .checked_sub(1)
      .ok_or_else(|| RuntimeError::internal("return outside of a function"))?;
    let frame = (self.stack.get(frame_index))
      .and_then(Object::as_frame)
      .ok_or_else(|| RuntimeError::internal("stack frame is missing"))?;
    let arguments_start = frame_index
      .checked_sub(self.state.argc)
      .ok_or_else(|| RuntimeError::internal("stack underflow"))?;

    self.truncate(arguments_start);
    self.state = frame.state.clone();

    if frame.boundary {
      Ok(Flow::Return(value))
    } else {
      self.push(value)?;
      Ok(Flow::Continue)
    }
  }
}

/// Stack
impl Engine {
  fn push(&mut self, object: Object) -> Result<(), RuntimeError> {
    if self.stack.len() >= self.runtime.config().max_stack {
      return Err(RuntimeError::internal("stack overflow"));
    }
    self.stack.push(object);
    Ok(())
  }

  fn push_all(&mut self, objects: &[Object]) -> Result<(), RuntimeError> {
    for object in objects {
      self.push(object.clone())?;
    }
    Ok(())
  }

  fn pop(&mut self) -> Result<Object, RuntimeError> {
    let frame_base = self.state.locals_start + self.state.locals_count;
    if self.stack.len() <= frame_base && self.state.module.is_some() {
      return Err(RuntimeError::internal("stack underflow"));
    }
    self.stack.pop().ok_or_else(|| RuntimeError::internal("stack underflow"))
  }

  fn truncate(&mut self, length: usize) {
    // objects are dropped one at a time, as finalizers may look at the stack
    while self.stack.len() > length {
      let object = self.stack.pop();
      drop(object);
    }
  }

  /// The index of the last `count` objects on the stack
  fn top(&self, count: usize) -> Result<usize, RuntimeError> {
    let start = self
      .stack
      .len()
      .checked_sub(count)
      .ok_or_else(|| RuntimeError::internal("stack underflow"))?;

    if self.state.module.is_some() && start < self.state.locals_start + self.state.locals_count {
      return Err(RuntimeError::internal("stack underflow"));
    }
    Ok(start)
  }

  fn local(&self, index: u32) -> Result<usize, RuntimeError> {
    let index = index as usize;
    if index >= self.state.locals_count {
      return Err(RuntimeError::internal(format!("local {index} is out of range")));
    }
    Ok(self.state.locals_start + index)
  }

  fn argument(&self, slot: usize) -> Result<usize, RuntimeError> {
    if slot >= self.state.argc {
      return Err(RuntimeError::internal(format!("argument {slot} is out of range")));
    }
    Ok(self.state.locals_start - self.state.argc - 1 + slot)
  }
}

/// Decode and execute
impl Engine {
  fn fetch(&mut self) -> Result<u32, RuntimeError> {
    let word = (self.state.text.as_ref())
      .and_then(|text| text.get(self.state.pc))
      .copied()
      .ok_or_else(|| RuntimeError::internal("program counter is outside the text section"))?;
    self.state.pc += 1;
    Ok(word)
  }

  fn module(&self) -> Result<&Module, RuntimeError> {
    (self.state.module.as_ref()).ok_or_else(|| RuntimeError::internal("no module is running"))
  }

  fn string(&self, offset: u32) -> Result<SmartString, RuntimeError> {
    self.module()?.string(offset)
  }

  fn location(&self) -> Option<Location> {
    let module = self.state.module.as_ref()?;
    module.location(self.state.instruction, self.state.debug?)
  }

  /// Run instructions until the boundary frame is returned to
  fn execute(&mut self) -> Result<Object, RuntimeError> {
    loop {
      let instruction = self.state.pc;
      let mut operands = [0; 2];

      let decoded = self.fetch().and_then(|word| {
        let (opcode, has_debug) = decode(word)
          .map_err(|word| RuntimeError::internal(format!("invalid opcode {word:#010x}")))?;

        self.state.instruction = u32::try_from(instruction).unwrap_or(u32::MAX);
        self.state.debug = if has_debug { Some(self.fetch()?) } else { None };
        for operand in operands.iter_mut().take(opcode.arity()) {
          *operand = self.fetch()?;
        }
        Ok(opcode)
      });

      let result = decoded.and_then(|opcode| {
        self
          .step(opcode, operands[0], operands[1])
          .map_err(|mut error| {
            error.set_opcode(opcode);
            error
          })
      });

      match result {
        Ok(Flow::Continue) => {}
        Ok(Flow::Return(value)) => return Ok(value),
        Err(error) => return Err(self.unwind(error)),
      }
    }
  }

  /// Add the location of each active call to an error, back to the boundary frame
  fn unwind(&mut self, mut error: RuntimeError) -> RuntimeError {
    if let Some(location) = self.location() {
      error.add_location(location);
    }

    while let Some(frame) = (self.state.locals_start.checked_sub(1))
      .and_then(|index| self.stack.get(index))
      .and_then(Object::as_frame)
    {
      self.state = frame.state.clone();
      if frame.boundary {
        break;
      }
      if let Some(location) = self.location() {
        error.add_location(location);
      }
    }

    error
  }

  fn step(&mut self, opcode: OpCode, first: u32, second: u32) -> Result<Flow, RuntimeError> {
    match opcode {
      OpCode::Nop => {}
      OpCode::Pop => drop(self.pop()?),

      OpCode::LoadLocal => {
        let index = self.local(first)?;
        self.push(self.stack[index].clone())?;
      }
      OpCode::StorLocal => {
        let index = self.local(first)?;
        let value = self.pop()?;
        let previous = mem::replace(&mut self.stack[index], value);
        drop(previous);
      }
      OpCode::LoadConst => match first.cast_signed() {
        slot if slot < 0 => {
          let slot = usize::try_from(-(i64::from(slot) + 1)).unwrap_or(usize::MAX);
          let index = self.argument(slot)?;
          self.push(self.stack[index].clone())?;
        }
        _ => {
          let constant = (self.module()?.constant(first))
            .ok_or_else(|| RuntimeError::internal(format!("constant {first} is out of range")))?;
          self.push(constant)?;
        }
      },

      OpCode::LoadGlobal => {
        let name = self.string(first)?;
        let value = (self.module()?.global(&name))
          .or_else(|| self.runtime.prelude(&name))
          .ok_or_else(|| RuntimeError::no_global(&name))?;
        self.push(value)?;
      }
      OpCode::StorGlobal => {
        let name = self.string(first)?;
        let value = self.pop()?;
        self.module()?.set_global(&name, value);
      }

      OpCode::LoadMember => {
        let name = self.string(first)?;
        let object = self.pop()?;
        self.push(self.runtime.member(&object, &name)?)?;
      }
      OpCode::StorMember => {
        let name = self.string(first)?;
        let object = self.pop()?;
        let value = self.pop()?;
        object.set_member(&name, value)?;
      }

      OpCode::Invoke => {
        let callee = self.pop()?;
        return self.dispatch_invoke(&callee, first as usize);
      }
      OpCode::Method => {
        let name = self.string(first)?;
        return self.dispatch_method(&name, second as usize);
      }

      OpCode::Return => {
        let value = self.pop()?;
        return self.leave(value);
      }
      OpCode::Leave => return self.leave(Object::nil()),

      OpCode::Jmp => self.state.pc = first as usize,
      OpCode::Jmpr => self.state.pc = self.relative(first)?,
      OpCode::JmpIfFalse | OpCode::JmpIfTrue | OpCode::JmprIfFalse | OpCode::JmprIfTrue => {
        let condition = self.pop()?;
        let condition = (condition.as_bool()).ok_or_else(|| RuntimeError::not_boolean(&condition))?;

        let expected = matches!(opcode, OpCode::JmpIfTrue | OpCode::JmprIfTrue);
        if condition == expected {
          self.state.pc = match opcode {
            OpCode::JmpIfFalse | OpCode::JmpIfTrue => first as usize,
            _ => self.relative(first)?,
          };
        }
      }

      OpCode::Import => {
        let name = self.string(first)?;
        self.import(&name, "")?;
      }
      OpCode::ImportMask => {
        let (name, mask) = (self.string(first)?, self.string(second)?);
        self.import(&name, &mask)?;
      }
    }

    Ok(Flow::Continue)
  }

  fn relative(&self, offset: u32) -> Result<usize, RuntimeError> {
    let target = i64::from(self.state.instruction) + i64::from(offset.cast_signed());
    usize::try_from(target).map_err(|_| RuntimeError::internal(format!("jump to {target}")))
  }

  /// Call the object on the top of the stack with the arguments below it
  fn dispatch_invoke(&mut self, callee: &Object, argc: usize) -> Result<Flow, RuntimeError> {
    let start = self.top(argc)?;
    let arguments = self.stack[start..].to_vec();

    let (callable, with_self) = self.resolve_call(callee, &arguments)?;
    let argc = if with_self {
      self.stack.insert(start, callee.clone());
      argc + 1
    } else {
      argc
    };

    self.dispatch(&callable, argc)
  }

  /// Call a member of the object below the arguments on the top of the stack
  fn dispatch_method(&mut self, name: &str, argc: usize) -> Result<Flow, RuntimeError> {
    let start = self.top(argc + 1)?;
    let with_self = self.stack[start..].to_vec();
    let receiver = &with_self[0];

    if let Some(result) = compare_nil(name, &with_self) {
      self.truncate(start);
      self.push(result.into())?;
      return Ok(Flow::Continue);
    }

    match self.resolve_method(receiver, name, &with_self)? {
      Method::Bound(callable) => self.dispatch(&callable, argc + 1),
      Method::Field(field) => {
        let receiver = self.stack.remove(start);
        drop(receiver);
        self.dispatch_invoke(&field, argc)
      }
    }
  }

  /// Call a function with the arguments on the top of the stack
  fn dispatch(&mut self, callable: &Callable, argc: usize) -> Result<Flow, RuntimeError> {
    match callable {
      Callable::Native(native) => {
        let start = self.top(argc)?;
        let arguments = self.stack[start..].to_vec();
        let result = native.call(self, &arguments)?;

        drop(arguments);
        self.truncate(start);
        self.push(result)?;
      }
      Callable::Scripted(function) => self.enter(function, argc, false)?,
    }

    Ok(Flow::Continue)
  }

  /// Open a module, run its entry point, and copy its globals into the running module
  fn import(&mut self, name: &str, mask: &str) -> Result<(), RuntimeError> {
    let module = self.imports.open(&self.runtime, name)?;
    tracing::debug!(module = name, mask, "import");

    if let Some(entry_point) = module.global(ENTRY_POINT) {
      self.invoke(&entry_point, &[])?;
    }

    let current = self.module()?.clone();
    module.export_to(&current, mask, name, None);
    Ok(())
  }
}

/// Comparisons with `nil` are decided before any member is looked up.
///
/// `nil` is only equal to `nil`, and two `nil`s are also `<=` and `>=` each other.
fn compare_nil(name: &str, with_self: &[Object]) -> Option<bool> {
  let [left, right] = with_self else {
    return None;
  };
  let (either, both) = (
    left.is_nil() || right.is_nil(),
    left.is_nil() && right.is_nil(),
  );

  match name {
    names::EQUAL if either => Some(both),
    names::NOT_EQUAL if either => Some(!both),
    names::LESS_EQUAL | names::GREATER_EQUAL if both => Some(true),
    _ => None,
  }
}

/// The function an entry of a polymorphic member refers to
fn callable_of(entry: &Object) -> Result<Callable, RuntimeError> {
  entry
    .as_callable()
    .ok_or_else(|| RuntimeError::internal("matched member is not callable"))
}

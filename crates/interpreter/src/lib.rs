//! # Interpreter
//! Compiles Axol code into blobs, and runs them.
//!
//! Source is lowered into a label based intermediate representation, which is
//! assembled into a [`Blob`](axol_blob::Blob). A blob is attached to a [`Module`],
//! which creates its globals, and the [`Engine`] runs the bytecode.
//!
//! Every value is an [`Object`]: a reference counted handle to a value, a class,
//! and members. Members can be polymorphic, in which case calls are dispatched on
//! the classes of the arguments, choosing the first entry which matches.

mod callable;
mod class;
pub mod compiler;
mod config;
mod engine;
mod error;
mod import;
mod module;
mod object;
mod runtime;
mod script;
mod stdlib;

/// More efficient datastructures than in standard library
pub(crate) mod collections {
  pub use rustc_hash::FxHashMap as HashMap;
  pub use smartstring::alias::String;
}

#[cfg(test)]
mod test;

pub use callable::{Callable, FromObject, NativeFunction, ScriptedFunction, Signature, argument};
pub use class::{ANY_ID, BUILTIN_MODULE, Class, ClassId, ClassRef, class_id};
pub use compiler::{CompileError, compile, lower};
pub use config::Config;
pub use engine::{Engine, StackFrame};
pub use error::{ErrorKind, Location, RuntimeError};
pub use import::ImportTable;
pub use module::{ENTRY_POINT, Module, WeakModule};
pub use object::{Members, Object, Value, names};
pub use runtime::Runtime;
pub use script::{Script, ScriptError};
pub use stdlib::BUILTIN_CLASSES;

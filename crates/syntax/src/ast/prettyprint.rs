//! Pretty-print the AST into a human readable format.
//!
//! Based upon this [blog post](https://www.georgevreilly.com/blog/2023/01/24/TreeInRust2PrintingTrees.html)

use super::{AST, expression::*, statement::*};
use std::fmt;

impl fmt::Display for AST {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    for statement in &self.root_statements {
      statement.pretty(f, self, "", false)?;
    }

    Ok(())
  }
}

const OTHER_CHILD: &str = "│  ";
const OTHER_ENTRY: &str = "├─ ";
const FINAL_CHILD: &str = "   ";
const FINAL_ENTRY: &str = "╰─ ";

fn connector(last: bool) -> &'static str {
  if last { FINAL_ENTRY } else { OTHER_ENTRY }
}
fn child_prefix(prefix: &str, last: bool) -> String {
  format!("{prefix}{}", if last { FINAL_CHILD } else { OTHER_CHILD })
}

pub trait PrettyPrint {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result;
}

impl PrettyPrint for Expression {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    match self {
      Self::Binary(x) => x.pretty(f, ast, prefix, last),
      Self::Call(x) => x.pretty(f, ast, prefix, last),
      Self::Group(x) => x.pretty(f, ast, prefix, last),
      Self::Literal(x) => x.pretty(f, ast, prefix, last),
      Self::Member(x) => x.pretty(f, ast, prefix, last),
      Self::Unary(x) => x.pretty(f, ast, prefix, last),
      Self::Variable(x) => x.pretty(f, ast, prefix, last),
      Self::Invalid(_) => writeln!(f, "{prefix}{}Invalid", connector(last)),
    }
  }
}
impl PrettyPrint for Binary {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Binary ({})", connector(last), self.operator(ast))?;

    let prefix = child_prefix(prefix, last);
    self.left(ast).pretty(f, ast, &prefix, false)?;
    self.right(ast).pretty(f, ast, &prefix, true)
  }
}
impl PrettyPrint for Call {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Call", connector(last))?;

    let prefix = child_prefix(prefix, last);
    let has_arguments = !self.arguments.is_empty();
    self.callee(ast).pretty(f, ast, &prefix, !has_arguments)?;

    if has_arguments {
      writeln!(f, "{prefix}{FINAL_ENTRY}Arguments")?;
      let prefix = format!("{prefix}{FINAL_CHILD}");
      let count = self.arguments.len();
      for (index, argument) in self.arguments(ast).enumerate() {
        argument.pretty(f, ast, &prefix, index + 1 == count)?;
      }
    }

    Ok(())
  }
}
impl PrettyPrint for Group {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Group", connector(last))?;
    self
      .expression(ast)
      .pretty(f, ast, &child_prefix(prefix, last), true)
  }
}
impl PrettyPrint for Literal {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    let connector = connector(last);

    match self.value(ast) {
      LiteralValue::Boolean(value) => writeln!(f, "{prefix}{connector}Boolean ({value})"),
      LiteralValue::Integer(_) | LiteralValue::Float(_) => {
        writeln!(f, "{prefix}{connector}Number ({})", self.raw_value(ast))
      }
      LiteralValue::String(_) => writeln!(f, "{prefix}{connector}String {}", self.raw_value(ast)),
      LiteralValue::Nil => writeln!(f, "{prefix}{connector}Nil"),
    }
  }
}
impl PrettyPrint for Member {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Member (.{})", connector(last), self.name(ast))?;
    self
      .object(ast)
      .pretty(f, ast, &child_prefix(prefix, last), true)
  }
}
impl PrettyPrint for Unary {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Unary ({})", connector(last), self.operator(ast))?;
    self
      .expression(ast)
      .pretty(f, ast, &child_prefix(prefix, last), true)
  }
}
impl PrettyPrint for Variable {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Variable ({})", connector(last), self.name(ast))
  }
}

impl PrettyPrint for Statement {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    match self {
      Self::Assignment(x) => x.pretty(f, ast, prefix, last),
      Self::Block(x) => x.pretty(f, ast, prefix, last),
      Self::Class(x) => x.pretty(f, ast, prefix, last),
      Self::Expression(x) => x.expression(ast).pretty(f, ast, prefix, last),
      Self::Function(x) => x.pretty(f, ast, prefix, last),
      Self::If(x) => x.pretty(f, ast, prefix, last),
      Self::Import(x) => x.pretty(f, ast, prefix, last),
      Self::Return(x) => x.pretty(f, ast, prefix, last),
      Self::While(x) => x.pretty(f, ast, prefix, last),
    }
  }
}
impl PrettyPrint for Assignment {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Assignment", connector(last))?;

    let prefix = child_prefix(prefix, last);
    self.target(ast).pretty(f, ast, &prefix, false)?;
    self.value(ast).pretty(f, ast, &prefix, true)
  }
}
impl PrettyPrint for Block {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Block", connector(last))?;

    let prefix = child_prefix(prefix, last);
    let count = self.len();
    for (index, statement) in self.statements(ast).enumerate() {
      statement.pretty(f, ast, &prefix, index + 1 == count)?;
    }

    Ok(())
  }
}
impl PrettyPrint for Class {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Class ({})", connector(last), self.name(ast))?;

    let prefix = child_prefix(prefix, last);
    let count = self.methods.len();
    for (index, method) in self.methods(ast).enumerate() {
      method.pretty(f, ast, &prefix, index + 1 == count)?;
    }

    Ok(())
  }
}
impl PrettyPrint for Function {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    let parameters = self
      .parameters()
      .iter()
      .map(|parameter| match parameter.annotation(ast) {
        Some(annotation) => format!("{}: {annotation}", parameter.name(ast)),
        None => parameter.name(ast).to_owned(),
      })
      .collect::<Vec<_>>()
      .join(", ");

    writeln!(
      f,
      "{prefix}{}Function {}({parameters})",
      connector(last),
      self.name(ast)
    )?;
    self
      .body(ast)
      .pretty(f, ast, &child_prefix(prefix, last), true)
  }
}
impl PrettyPrint for If {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}If", connector(last))?;

    let prefix = child_prefix(prefix, last);
    self.condition(ast).pretty(f, ast, &prefix, false)?;

    match self.otherwise(ast) {
      Some(otherwise) => {
        self.then(ast).pretty(f, ast, &prefix, false)?;
        writeln!(f, "{prefix}{FINAL_ENTRY}Else")?;
        otherwise.pretty(f, ast, &format!("{prefix}{FINAL_CHILD}"), true)
      }
      None => self.then(ast).pretty(f, ast, &prefix, true),
    }
  }
}
impl PrettyPrint for Import {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    let connector = connector(last);
    let module = self.module(ast);

    match self.kind(ast) {
      ImportKind::Qualified => writeln!(f, "{prefix}{connector}Import ({module})"),
      ImportKind::All => writeln!(f, "{prefix}{connector}Import ({module}: *)"),
      ImportKind::Named(name) => writeln!(f, "{prefix}{connector}Import ({module}: {name})"),
    }
  }
}
impl PrettyPrint for Return {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}Return", connector(last))?;

    if let Some(value) = self.value(ast) {
      value.pretty(f, ast, &child_prefix(prefix, last), true)?;
    }
    Ok(())
  }
}
impl PrettyPrint for While {
  fn pretty(&self, f: &mut fmt::Formatter, ast: &AST, prefix: &str, last: bool) -> fmt::Result {
    writeln!(f, "{prefix}{}While", connector(last))?;

    let prefix = child_prefix(prefix, last);
    self.condition(ast).pretty(f, ast, &prefix, false)?;
    self.body(ast).pretty(f, ast, &prefix, true)
  }
}

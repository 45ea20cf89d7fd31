//! # Statements

use crate::{
  ast::{AST, ExpressionIdx, StatementIdx, TokenIdx, expression::Expression},
  span::Span,
};
use thin_vec::ThinVec;

/// A statement in the source code.
/// They don't produce a value, and most are terminated by a semicolon.
#[must_use]
#[derive(Debug)]
pub enum Statement {
  /// An assignment, e.g. `x = 1;`, `point.x = 2;`
  Assignment(Assignment),
  /// A block of statements, e.g. `{ .. }`
  Block(Block),
  /// A class declaration, e.g. `class Point { fn length() { .. } }`
  Class(Class),
  /// An expression, e.g. `print(1);`
  Expression(ExpressionStmt),
  /// A function declaration, e.g. `fn add(a: int, b) { .. }`
  Function(Function),
  /// An if statement, e.g. `if (x) { .. } else { .. }`
  If(If),
  /// An import, e.g. `import "maths";`, `from "maths" import pi;`
  Import(Import),
  /// A return statement, e.g. `return 1;`
  Return(Return),
  /// A while loop, e.g. `while (x < 5) { .. }`
  While(While),
}
impl Statement {
  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    match self {
      Self::Assignment(assignment) => assignment.span(ast),
      Self::Block(block) => block.span(ast),
      Self::Class(class) => class.span(ast),
      Self::Expression(expression) => expression.span(ast),
      Self::Function(function) => function.span(ast),
      Self::If(if_) => if_.span(ast),
      Self::Import(import) => import.span(ast),
      Self::Return(return_) => return_.span(ast),
      Self::While(while_) => while_.span(ast),
    }
  }
}

/// An assignment, e.g. `x = 1;`
#[derive(Debug)]
pub struct Assignment {
  pub(crate) target: ExpressionIdx,
  pub(crate) value: ExpressionIdx,
}
impl Assignment {
  /// Where the value is stored, either a variable or a member
  pub fn target<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.target]
  }
  /// The value being assigned
  pub fn value<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.value]
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    self.target(ast).span(ast).merge(self.value(ast).span(ast))
  }
}

/// A block of statements, e.g. `{ .. }`
#[derive(Debug)]
pub struct Block {
  pub(crate) opening: TokenIdx,
  pub(crate) statements: ThinVec<StatementIdx>,
  pub(crate) closing: Option<TokenIdx>,
}
impl Block {
  /// How many statements are in a block
  #[must_use]
  pub fn len(&self) -> usize {
    self.statements.len()
  }
  /// Does the block have any statements?
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.statements.is_empty()
  }

  /// The statements in a block
  pub fn statements<'a>(
    &'a self,
    ast: &'a AST,
  ) -> impl DoubleEndedIterator<Item = &'a Statement> + ExactSizeIterator {
    self
      .statements
      .iter()
      .map(|statement_idx| &ast[*statement_idx])
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    let end = match (self.closing, self.statements.last()) {
      (Some(closing), _) => Span::from(ast[closing]),
      (None, Some(last)) => ast[*last].span(ast),
      (None, None) => Span::default(),
    };

    Span::from(ast[self.opening]).merge(end)
  }
}

/// A class declaration, e.g. `class Point { fn length() { .. } }`
#[derive(Debug)]
pub struct Class {
  pub(crate) keyword: TokenIdx,
  pub(crate) name: Option<TokenIdx>,
  pub(crate) methods: ThinVec<StatementIdx>,
  pub(crate) closing: Option<TokenIdx>,
}
impl Class {
  /// The name of the class
  #[must_use]
  pub fn name<'a>(&self, ast: &'a AST) -> &'a str {
    self
      .name
      .map(|name| ast.get_token_text(name))
      .unwrap_or_default()
  }

  /// The methods of the class
  pub fn methods<'a>(&'a self, ast: &'a AST) -> impl Iterator<Item = &'a Function> {
    self.methods.iter().filter_map(|method| match &ast[*method] {
      Statement::Function(function) => Some(function),
      _ => None,
    })
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    let end = self
      .closing
      .or(self.name)
      .map(|token| Span::from(ast[token]))
      .unwrap_or_default();

    Span::from(ast[self.keyword]).merge(end)
  }
}

/// An expression used as a statement
#[derive(Debug)]
pub struct ExpressionStmt {
  pub(crate) expression: ExpressionIdx,
}
impl ExpressionStmt {
  /// The expression
  pub fn expression<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.expression]
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    self.expression(ast).span(ast)
  }
}

/// A function declaration, e.g. `fn add(a: int, b) { .. }`
#[derive(Debug)]
pub struct Function {
  pub(crate) keyword: TokenIdx,
  pub(crate) name: Option<TokenIdx>,
  pub(crate) parameters: ThinVec<Parameter>,
  pub(crate) body: StatementIdx,
}
/// A parameter of a function, with an optional class annotation
#[derive(Debug)]
pub struct Parameter {
  pub(crate) name: TokenIdx,
  pub(crate) annotation: Option<TokenIdx>,
}
impl Parameter {
  /// The name of the parameter
  #[must_use]
  pub fn name<'a>(&self, ast: &'a AST) -> &'a str {
    ast.get_token_text(self.name)
  }

  /// The name of the class the argument must be
  #[must_use]
  pub fn annotation<'a>(&self, ast: &'a AST) -> Option<&'a str> {
    self.annotation.map(|annotation| ast.get_token_text(annotation))
  }

  /// The location of the parameter
  pub fn span(&self, ast: &AST) -> Span {
    let name = Span::from(ast[self.name]);
    match self.annotation {
      Some(annotation) => name.merge(ast[annotation].into()),
      None => name,
    }
  }
}
impl Function {
  /// The name of the function
  #[must_use]
  pub fn name<'a>(&self, ast: &'a AST) -> &'a str {
    self
      .name
      .map(|name| ast.get_token_text(name))
      .unwrap_or_default()
  }

  /// The parameters of the function
  #[must_use]
  pub fn parameters(&self) -> &[Parameter] {
    &self.parameters
  }

  /// The body of the function
  pub fn body<'a>(&self, ast: &'a AST) -> &'a Statement {
    &ast[self.body]
  }

  /// The location of the function name
  pub fn name_span(&self, ast: &AST) -> Span {
    Span::from(ast[self.name.unwrap_or(self.keyword)])
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    Span::from(ast[self.keyword]).merge(self.body(ast).span(ast))
  }
}

/// An if statement, e.g. `if (x) { .. } else { .. }`
#[derive(Debug)]
pub struct If {
  pub(crate) keyword: TokenIdx,
  pub(crate) condition: ExpressionIdx,
  pub(crate) then: StatementIdx,
  pub(crate) otherwise: Option<StatementIdx>,
}
impl If {
  /// The condition to decide which branch is run
  pub fn condition<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.condition]
  }
  /// The statement run if the condition is true
  pub fn then<'a>(&self, ast: &'a AST) -> &'a Statement {
    &ast[self.then]
  }
  /// The statement run if the condition is false
  #[must_use]
  pub fn otherwise<'a>(&self, ast: &'a AST) -> Option<&'a Statement> {
    self.otherwise.map(|otherwise| &ast[otherwise])
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    let end = self.otherwise(ast).unwrap_or(self.then(ast)).span(ast);
    Span::from(ast[self.keyword]).merge(end)
  }
}

/// An import, e.g. `import "maths";`, `from "maths" import pi;`
#[derive(Debug)]
pub struct Import {
  pub(crate) keyword: TokenIdx,
  pub(crate) module: Option<TokenIdx>,
  pub(crate) items: ImportItems,
  pub(crate) end: TokenIdx,
}
/// Which items of a module are imported
#[derive(Debug)]
pub(crate) enum ImportItems {
  Qualified,
  All,
  Named(TokenIdx),
}
/// How the names of an imported module are bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind<'a> {
  /// `import "maths";`, names are accessed as `maths.pi`
  Qualified,
  /// `from "maths" import *;`, every name is bound unqualified
  All,
  /// `from "maths" import pi;`, a single name is bound unqualified
  Named(&'a str),
}
impl Import {
  /// The name of the module being imported
  #[must_use]
  pub fn module<'a>(&self, ast: &'a AST) -> &'a str {
    self
      .module
      .map(|module| {
        let text = ast.get_token_text(module);
        text.get(1..text.len().saturating_sub(1)).unwrap_or_default()
      })
      .unwrap_or_default()
  }

  /// How the imported names are bound
  #[must_use]
  pub fn kind<'a>(&self, ast: &'a AST) -> ImportKind<'a> {
    match self.items {
      ImportItems::Qualified => ImportKind::Qualified,
      ImportItems::All => ImportKind::All,
      ImportItems::Named(name) => ImportKind::Named(ast.get_token_text(name)),
    }
  }

  /// The location of the module name
  pub fn module_span(&self, ast: &AST) -> Span {
    Span::from(ast[self.module.unwrap_or(self.keyword)])
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    Span::from(ast[self.keyword]).merge(ast[self.end].into())
  }
}

/// A return statement, e.g. `return 1;`
#[derive(Debug)]
pub struct Return {
  pub(crate) keyword: TokenIdx,
  pub(crate) value: Option<ExpressionIdx>,
}
impl Return {
  /// The value being returned
  #[must_use]
  pub fn value<'a>(&self, ast: &'a AST) -> Option<&'a Expression> {
    self.value.map(|value| &ast[value])
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    let keyword = Span::from(ast[self.keyword]);
    match self.value(ast) {
      Some(value) => keyword.merge(value.span(ast)),
      None => keyword,
    }
  }
}

/// A while loop, e.g. `while (x < 5) { .. }`
#[derive(Debug)]
pub struct While {
  pub(crate) keyword: TokenIdx,
  pub(crate) condition: ExpressionIdx,
  pub(crate) body: StatementIdx,
}
impl While {
  /// The condition checked before each iteration
  pub fn condition<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.condition]
  }
  /// The body of the loop
  pub fn body<'a>(&self, ast: &'a AST) -> &'a Statement {
    &ast[self.body]
  }

  /// The location of the statement
  pub fn span(&self, ast: &AST) -> Span {
    Span::from(ast[self.keyword]).merge(self.body(ast).span(ast))
  }
}

macro_rules! impl_from_statement {
  ($($name:ident),*) => {
    $(
      impl From<$name> for Statement {
        fn from(value: $name) -> Self {
          Self::$name(value)
        }
      }
    )*
  };
}
impl_from_statement!(Assignment, Block, Class, Function, If, Import, Return, While);
impl From<ExpressionStmt> for Statement {
  fn from(value: ExpressionStmt) -> Self {
    Self::Expression(value)
  }
}

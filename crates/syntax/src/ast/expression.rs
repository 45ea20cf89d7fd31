//! # Expressions

use crate::{
  ast::{AST, ExpressionIdx, TokenIdx},
  span::Span,
  tokeniser::TokenKind,
};
use std::fmt;
use thin_vec::ThinVec;

/// An expression, which can be evaluated to a value
#[must_use]
#[derive(Debug)]
pub enum Expression {
  /// A binary expression, e.g. `1 + 2`, `true and false`
  Binary(Binary),
  /// A function call, e.g. `foo(1, 2)`, `point.move(3)`
  Call(Call),
  /// An expression in parentheses, e.g. `(1 + 2)`
  Group(Group),
  /// A literal value, e.g. `1`, `2.5`, `true`, `"hello"`, `nil`
  Literal(Literal),
  /// Accessing a member of an object, e.g. `point.x`, `maths.pi`
  Member(Member),
  /// A unary expression, e.g. `!true`, `-1`
  Unary(Unary),
  /// A variable, e.g. `x`
  Variable(Variable),
  /// An invalid expression
  Invalid(Invalid),
}
impl Expression {
  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    match self {
      Self::Binary(binary) => binary.span(ast),
      Self::Call(call) => call.span(ast),
      Self::Group(group) => group.span(ast),
      Self::Literal(literal) => literal.span(ast),
      Self::Member(member) => member.span(ast),
      Self::Unary(unary) => unary.span(ast),
      Self::Variable(variable) => variable.span(ast),
      Self::Invalid(invalid) => invalid.span(ast),
    }
  }

  /// Can a value be assigned to the expression?
  #[must_use]
  pub fn is_assignable(&self) -> bool {
    matches!(self, Self::Variable(_) | Self::Member(_))
  }
}

/// A binary expression, e.g. `1 + 2`, `true and false`
#[derive(Debug)]
pub struct Binary {
  pub(crate) left: ExpressionIdx,
  pub(crate) operator: TokenIdx,
  pub(crate) right: ExpressionIdx,
}
impl Binary {
  /// The left hand side of the operation
  pub fn left<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.left]
  }
  /// The right hand side of the operation
  pub fn right<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.right]
  }

  /// The operator of the operation
  #[must_use]
  pub fn operator(&self, ast: &AST) -> BinaryOperator {
    match ast[self.operator].kind {
      TokenKind::Plus => BinaryOperator::Add,
      TokenKind::Minus => BinaryOperator::Subtract,
      TokenKind::Star => BinaryOperator::Multiply,
      TokenKind::Slash => BinaryOperator::Divide,
      TokenKind::Percent => BinaryOperator::Remainder,
      TokenKind::BangEqual => BinaryOperator::NotEqual,
      TokenKind::EqualEqual => BinaryOperator::Equal,
      TokenKind::Greater => BinaryOperator::Greater,
      TokenKind::GreaterEqual => BinaryOperator::GreaterEqual,
      TokenKind::Less => BinaryOperator::Less,
      TokenKind::LessEqual => BinaryOperator::LessEqual,
      TokenKind::And => BinaryOperator::And,
      _ => BinaryOperator::Or,
    }
  }

  /// The location of the operator
  pub fn operator_span(&self, ast: &AST) -> Span {
    ast[self.operator].into()
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    self.left(ast).span(ast).merge(self.right(ast).span(ast))
  }
}

/// A function call, e.g. `foo(1, 2)`
#[derive(Debug)]
pub struct Call {
  pub(crate) callee: ExpressionIdx,
  pub(crate) opening: TokenIdx,
  pub(crate) arguments: ThinVec<ExpressionIdx>,
  pub(crate) closing: Option<TokenIdx>,
}
impl Call {
  /// The expression which will be called
  pub fn callee<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.callee]
  }

  /// The expressions to be passed as arguments
  pub fn arguments<'a>(
    &'a self,
    ast: &'a AST,
  ) -> impl DoubleEndedIterator<Item = &'a Expression> + ExactSizeIterator {
    self.arguments.iter().map(|argument| &ast[*argument])
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    let end = match (self.closing, self.arguments.last()) {
      (Some(closing), _) => Span::from(ast[closing]),
      (None, Some(argument)) => ast[*argument].span(ast),
      (None, None) => Span::from(ast[self.opening]),
    };

    self.callee(ast).span(ast).merge(end)
  }
}

/// An expression in parentheses, e.g. `(1 + 2)`
#[derive(Debug)]
pub struct Group {
  pub(crate) start: TokenIdx,
  pub(crate) expression: ExpressionIdx,
  pub(crate) end: Option<TokenIdx>,
}
impl Group {
  /// The expression within the brackets
  pub fn expression<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.expression]
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    let end = match self.end {
      Some(end) => Span::from(ast[end]),
      None => self.expression(ast).span(ast),
    };

    Span::from(ast[self.start]).merge(end)
  }
}

/// A literal value, e.g. `1`, `2.5`, `true`, `"hello"`, `nil`
#[derive(Debug)]
pub struct Literal {
  pub(crate) token: TokenIdx,
}
/// The value of a literal
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
  /// A whole number
  Integer(i64),
  /// A number with a decimal part
  Float(f64),
  /// A string, with escapes resolved
  String(String),
  /// `true` or `false`
  Boolean(bool),
  /// `nil`
  Nil,
}
impl Literal {
  /// The value of the literal
  #[must_use]
  pub fn value(&self, ast: &AST) -> LiteralValue {
    let text = ast.get_token_text(self.token);

    match ast[self.token].kind {
      TokenKind::True => LiteralValue::Boolean(true),
      TokenKind::False => LiteralValue::Boolean(false),
      TokenKind::Integer => {
        LiteralValue::Integer(text.replace('_', "").parse().unwrap_or(i64::MAX))
      }
      TokenKind::Float => LiteralValue::Float(text.replace('_', "").parse().unwrap_or(f64::NAN)),
      TokenKind::String => LiteralValue::String(unescape(&text[1..text.len() - 1])),
      _ => LiteralValue::Nil,
    }
  }

  /// The raw source text of the literal
  #[must_use]
  pub fn raw_value<'a>(&self, ast: &'a AST) -> &'a str {
    ast.get_token_text(self.token)
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    ast[self.token].into()
  }
}

fn unescape(raw: &str) -> String {
  let mut result = String::with_capacity(raw.len());
  let mut characters = raw.chars();

  while let Some(character) = characters.next() {
    if character != '\\' {
      result.push(character);
      continue;
    }

    match characters.next() {
      Some('n') => result.push('\n'),
      Some('t') => result.push('\t'),
      Some('r') => result.push('\r'),
      Some('0') => result.push('\0'),
      Some(other) => result.push(other),
      None => result.push('\\'),
    }
  }

  result
}

/// Accessing a member of an object, e.g. `point.x`
#[derive(Debug)]
pub struct Member {
  pub(crate) object: ExpressionIdx,
  pub(crate) dot: TokenIdx,
  pub(crate) name: Option<TokenIdx>,
}
impl Member {
  /// The object the member is read from
  pub fn object<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.object]
  }

  /// The name of the member
  #[must_use]
  pub fn name<'a>(&self, ast: &'a AST) -> &'a str {
    self
      .name
      .map(|name| ast.get_token_text(name))
      .unwrap_or_default()
  }

  /// The location of the member name
  pub fn name_span(&self, ast: &AST) -> Span {
    Span::from(ast[self.name.unwrap_or(self.dot)])
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    self.object(ast).span(ast).merge(self.name_span(ast))
  }
}

/// A unary expression, e.g. `!true`, `-1`
#[derive(Debug)]
pub struct Unary {
  pub(crate) operator: TokenIdx,
  pub(crate) expression: ExpressionIdx,
}
impl Unary {
  /// The expression being operated on
  pub fn expression<'a>(&self, ast: &'a AST) -> &'a Expression {
    &ast[self.expression]
  }

  /// The operator of the operation
  #[must_use]
  pub fn operator(&self, ast: &AST) -> UnaryOperator {
    match ast[self.operator].kind {
      TokenKind::Minus => UnaryOperator::Minus,
      _ => UnaryOperator::Not,
    }
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    Span::from(ast[self.operator]).merge(self.expression(ast).span(ast))
  }
}

/// A variable, e.g. `x`
#[derive(Debug)]
pub struct Variable {
  pub(crate) token: TokenIdx,
}
impl Variable {
  /// The name of the variable
  #[must_use]
  pub fn name<'a>(&self, ast: &'a AST) -> &'a str {
    ast.get_token_text(self.token)
  }

  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    ast[self.token].into()
  }
}

/// An invalid expression
#[derive(Debug)]
pub struct Invalid {
  pub(crate) token: TokenIdx,
}
impl Invalid {
  /// The location of the expression
  pub fn span(&self, ast: &AST) -> Span {
    ast[self.token].into()
  }
}

/// The operator of a binary expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
  /// `+`
  Add,
  /// `-`
  Subtract,
  /// `*`
  Multiply,
  /// `/`
  Divide,
  /// `%`
  Remainder,
  /// `!=`
  NotEqual,
  /// `==`
  Equal,
  /// `>`
  Greater,
  /// `>=`
  GreaterEqual,
  /// `<`
  Less,
  /// `<=`
  LessEqual,
  /// `and`
  And,
  /// `or`
  Or,
}
impl fmt::Display for BinaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Add => write!(f, "+"),
      Self::Subtract => write!(f, "-"),
      Self::Multiply => write!(f, "*"),
      Self::Divide => write!(f, "/"),
      Self::Remainder => write!(f, "%"),
      Self::NotEqual => write!(f, "!="),
      Self::Equal => write!(f, "=="),
      Self::Greater => write!(f, ">"),
      Self::GreaterEqual => write!(f, ">="),
      Self::Less => write!(f, "<"),
      Self::LessEqual => write!(f, "<="),
      Self::And => write!(f, "and"),
      Self::Or => write!(f, "or"),
    }
  }
}

/// The operator of a unary expression
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOperator {
  /// `-`
  Minus,
  /// `!`
  Not,
}
impl fmt::Display for UnaryOperator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Minus => write!(f, "-"),
      Self::Not => write!(f, "!"),
    }
  }
}

macro_rules! impl_from_expression {
  ($($name:ident),*) => {
    $(
      impl From<$name> for Expression {
        fn from(value: $name) -> Self {
          Self::$name(value)
        }
      }
    )*
  };
}
impl_from_expression!(Binary, Call, Group, Literal, Member, Unary, Variable, Invalid);

//! # AST
//!
//! The definition of the Abstract Syntax Tree (AST)
//!
//! Nodes are stored in flat arenas inside the [`AST`], and refer to each other (and to
//! the tokens they were parsed from) by index. Accessors on the nodes take the AST by
//! reference to follow those indexes.

use crate::{
  LineIndex,
  parser::{ParseError, ParseWarning},
  span::Span,
  tokeniser::{Token, TokenKind, Tokeniser},
};
use std::{cell::OnceCell, num::NonZero, ops};

pub mod expression;
mod prettyprint;
pub mod statement;

pub use expression::Expression;
pub use statement::Statement;

/// Abstract Syntax Tree representing the source
#[must_use]
#[derive(Debug)]
pub struct AST {
  /// The source code which the AST is for
  pub source: String,
  /// Index of line locations, lazily constructed when required
  line_index: OnceCell<LineIndex>,
  /// The tokens of the source, without comments
  pub tokens: Vec<Token>,

  /// The top level statements of the source
  pub root_statements: Vec<Statement>,
  /// Statements which appear within blocks, functions and classes
  pub statements: Vec<Statement>,
  /// The expressions in the source
  pub expressions: Vec<Expression>,

  /// Errors found during parsing
  pub errors: Vec<ParseError>,
  /// Warnings found during parsing
  pub warnings: Vec<ParseWarning>,
}
impl AST {
  pub(crate) fn new(source: String) -> Self {
    let mut tokens: Vec<_> = Tokeniser::from(source.as_str())
      .filter(|token| token.kind != TokenKind::Comment)
      .collect();
    tokens.push(Token {
      kind: TokenKind::EndOfFile,
      start: u32::try_from(source.len()).unwrap_or(u32::MAX),
      length: 0,
    });

    Self {
      source,
      line_index: OnceCell::new(),
      tokens,

      root_statements: Vec::new(),
      statements: Vec::new(),
      expressions: Vec::new(),

      errors: Vec::new(),
      warnings: Vec::new(),
    }
  }

  /// Is the parsed AST valid, with no errors found during parsing?
  #[must_use]
  pub fn is_valid(&self) -> bool {
    self.errors.is_empty()
  }

  /// The line index for the AST, the locations of the new lines in the source code
  ///
  /// It is lazily initialised, and will be initialised on the first call
  pub fn line_index(&self) -> &LineIndex {
    self
      .line_index
      .get_or_init(|| LineIndex::from_source(&self.source))
  }

  /// All statements in the source
  pub fn all_statements(&self) -> impl Iterator<Item = &Statement> {
    self.root_statements.iter().chain(self.statements.iter())
  }

  pub(crate) fn add_expression(&mut self, expression: impl Into<Expression>) -> ExpressionIdx {
    self.expressions.push(expression.into());
    ExpressionIdx::from_len(self.expressions.len())
  }

  pub(crate) fn add_statement(&mut self, statement: impl Into<Statement>) -> StatementIdx {
    self.statements.push(statement.into());
    StatementIdx::from_len(self.statements.len())
  }

  /// The source text of a token
  pub(crate) fn get_token_text(&self, token: TokenIdx) -> &str {
    Span::from(self[token]).source_text(&self.source)
  }
}

macro_rules! index {
  ($idx:ident, $field:ident, $output:ty) => {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
    pub(crate) struct $idx(NonZero<u32>);
    impl $idx {
      /// The index of the last item of a collection of the given length
      #[allow(dead_code)]
      fn from_len(len: usize) -> Self {
        let id = u32::try_from(len).unwrap_or(u32::MAX).max(1);
        Self(NonZero::<u32>::MIN.saturating_add(id - 1))
      }

      fn slot(self) -> usize {
        self.0.get() as usize - 1
      }
    }
    impl ops::Index<$idx> for AST {
      type Output = $output;

      fn index(&self, index: $idx) -> &Self::Output {
        &self.$field[index.slot()]
      }
    }
  };
}

index!(ExpressionIdx, expressions, Expression);
index!(StatementIdx, statements, Statement);
index!(TokenIdx, tokens, Token);

impl TokenIdx {
  pub(crate) fn new(position: usize) -> Self {
    Self::from_len(position + 1)
  }
}

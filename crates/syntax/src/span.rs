//! Source positions and related helper functions.
//!
//! [`Span`] based on [oxc_span](https://github.com/web-infra-dev/oxc)
//! [`LineIndex`] based on [Ruff](https://github.com/astral-sh/ruff)

/// Represents a span of the source code
#[must_use]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
  /// The byte index of the start of the span
  pub start: u32,
  /// The byte index of the end of the span
  pub end: u32,
}

impl Span {
  /// Create a new `Span` from a start and end position
  #[inline]
  pub const fn new(start: u32, end: u32) -> Self {
    Self { start, end }
  }

  /// Combine two `Span`s into one
  pub fn merge(self, other: Self) -> Self {
    if self == Self::default() {
      other
    } else if other == Self::default() {
      self
    } else {
      Self::new(self.start.min(other.start), self.end.max(other.end))
    }
  }

  /// The length of the `Span` in bytes
  #[must_use]
  #[allow(clippy::len_without_is_empty)]
  pub const fn len(self) -> u32 {
    self.end.saturating_sub(self.start)
  }

  /// Get the source text for a `Span` from a source string
  #[must_use]
  pub fn source_text(self, source_text: &str) -> &str {
    let start = self.start as usize;
    let end = self.end as usize;

    source_text.get(start..end).unwrap_or_default()
  }
}

type FilePosition = u32;
type LineNumber = usize;

/// Index for looking up the line number from source positions
///
/// Line numbers given start at 1
#[must_use]
#[derive(Debug)]
pub struct LineIndex {
  line_starts: Vec<FilePosition>,
  file_length: FilePosition,
}
impl LineIndex {
  /// Create a new `LineIndex` from a source string.
  ///
  /// Positions past `u32::MAX` bytes are clamped.
  pub fn from_source(source: &str) -> Self {
    let position = |index: usize| FilePosition::try_from(index).unwrap_or(FilePosition::MAX);

    let mut line_starts = Vec::with_capacity(source.len() / 50);
    line_starts.push(0);
    line_starts.extend(
      (source.bytes().enumerate())
        .filter(|(_, character)| *character == b'\n')
        .map(|(index, _)| position(index + 1)),
    );

    Self {
      line_starts,
      file_length: position(source.len()),
    }
  }

  /// Get the line number which a `Span` starts on
  #[must_use]
  pub fn line(&self, span: Span) -> LineNumber {
    match self.line_starts.binary_search(&span.start) {
      Ok(line) => line + 1,
      Err(line) => line,
    }
  }

  /// Get the line number which a `Span` ends on
  #[must_use]
  pub fn final_line(&self, span: Span) -> LineNumber {
    match self.line_starts.binary_search(&span.end) {
      Ok(line) => line + 1,
      Err(line) => line,
    }
  }

  /// Get the line and column (both starting at 1) of the start of a `Span`
  #[must_use]
  pub fn line_col(&self, span: Span) -> (u32, u32) {
    let line = self.line(span);
    let column = span.start - self.get_line_start(line);

    (u32::try_from(line).unwrap_or(u32::MAX), column + 1)
  }

  /// Get the byte offset of a given line number
  #[must_use]
  pub fn get_line_start(&self, line: LineNumber) -> u32 {
    self
      .line_starts
      .get(line.saturating_sub(1))
      .copied()
      .unwrap_or(self.file_length)
  }

  /// Get a `Span` for a given line number
  pub fn line_span(&self, line: LineNumber) -> Span {
    let start = self.get_line_start(line);
    let end = *self.line_starts.get(line).unwrap_or(&self.file_length);

    Span::new(start, end)
  }
}

//! The section based binary module format.

use crate::buffer::Buffer;
use std::{fmt, str};

/// `'AXOL'` when read as little-endian bytes
pub const MAGIC: u32 = 0x4C4F_5841;
/// The version of the binary format
pub const VERSION: u32 = 0x0001_0001;

const HEADER_SIZE: usize = 20;
const SECTION_HEADER_SIZE: usize = 12;
const SYMBOL_SIZE: usize = 24;
const TYPE_SPEC_HEADER_SIZE: usize = 8;
const SIGNATURE_HEADER_SIZE: usize = 4;
const CONSTANT_SIZE: usize = 8;
const DEBUG_HEADER_SIZE: usize = 8;
const DEBUG_ENTRY_SIZE: usize = 12;

// Header field positions
const MAGIC_FIELD: usize = 0;
const VERSION_FIELD: usize = 4;
const TABLE_OFFSET_FIELD: usize = 8;
const SECTION_COUNT_FIELD: usize = 12;
const MODULE_NAME_FIELD: usize = 16;

#[expect(clippy::cast_possible_truncation, reason = "checked by assertion")]
fn narrow(value: usize) -> u32 {
  assert!(u32::try_from(value).is_ok(), "blob exceeds 4GiB");
  value as u32
}

macro_rules! u32_enum {
  (
    $(#[doc = $doc:literal])*
    $name:ident { $($(#[doc = $variant_doc:literal])* $variant:ident = $value:literal,)* }
  ) => {
    $(#[doc = $doc])*
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[repr(u32)]
    pub enum $name {
      $($(#[doc = $variant_doc])* $variant = $value,)*
    }
    impl TryFrom<u32> for $name {
      type Error = u32;

      fn try_from(value: u32) -> Result<Self, u32> {
        match value {
          $($value => Ok(Self::$variant),)*
          other => Err(other),
        }
      }
    }
  };
}

u32_enum! {
  /// The type of a section in a [`Blob`]
  SectionKind {
    /// Unused placeholder
    Null = 0,
    /// Nul-terminated, deduplicated strings
    Strings = 1,
    /// Packed instruction words
    Text = 2,
    /// Function and method symbols
    Symbols = 3,
    /// Class declarations
    TypeSpecs = 4,
    /// Argument type lists
    Signatures = 5,
    /// Serialized constant values
    Constants = 6,
    /// Source location information
    Debug = 7,
  }
}
u32_enum! {
  /// What a [`Symbol`] refers to
  SymbolKind {
    /// Unknown
    Null = 0,
    /// A free function
    Function = 1,
    /// A method belonging to a [`TypeSpec`]
    Method = 2,
  }
}
u32_enum! {
  /// The visibility of a [`Symbol`]
  Binding {
    /// Unknown
    Null = 0,
    /// Only reachable through a [`TypeSpec`]
    Local = 1,
    /// Becomes a global of the module
    Global = 2,
  }
}

/// A section header from the section table
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SectionHeader {
  /// The type of the section
  pub kind: SectionKind,
  /// The byte offset of the section payload within the blob
  pub offset: u32,
  /// The size in bytes of the section payload
  pub size: u32,
}

/// A named, addressable function in the text section
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Symbol {
  /// String offset of the name
  pub name: u32,
  /// Is it a function or a method
  pub kind: SymbolKind,
  /// Is it a global, or only accessible through a type spec
  pub binding: Binding,
  /// The word index of the first instruction
  pub address: u32,
  /// How many local variable slots the function needs
  pub locals: u32,
  /// Index of the signature in the signatures section
  pub signature: u32,
}

/// A class declaration: a name and the method symbols it has
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeSpec {
  /// String offset of the class name
  pub name: u32,
  /// Indexes of the method symbols
  pub symbols: Vec<u32>,
}

/// A serialized constant
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Constant {
  /// String offset of the name of the class of the constant
  pub class: u32,
  /// String offset of the serialized value
  pub value: u32,
}

/// A source location attached to an instruction
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DebugEntry {
  /// The line number, starting at 1
  pub line: u32,
  /// The column, starting at 1
  pub col: u32,
  /// The length of the source range
  pub extent: u32,
}

/// Problems found when loading a blob from bytes
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum BlobError {
  /// The data is too short to contain a header
  #[error("blob is {0} bytes, too short for a header")]
  TooShort(usize),
  /// The magic number is wrong
  #[error("bad magic number {0:#010x}")]
  BadMagic(u32),
  /// The version is not supported
  #[error("unsupported version {0:#010x}")]
  BadVersion(u32),
  /// The section table lies outside of the data
  #[error("section table is out of bounds")]
  TableOutOfBounds,
  /// A section has a type which is not known
  #[error("unknown section type {0}")]
  UnknownSection(u32),
  /// A section payload lies outside of the data
  #[error("{0:?} section is out of bounds")]
  SectionOutOfBounds(SectionKind),
  /// The module name doesn't point to a string
  #[error("module name is not a valid string")]
  BadModuleName,
}
impl BlobError {
  /// The title of the error message
  #[must_use]
  pub fn title(&self) -> &'static str {
    "Malformed Blob"
  }
}

/// A relocatable binary image of a compiled module.
///
/// Laid out as a fixed header, followed by the section table, followed by the
/// section payloads. Sections are created on first use, and grow in place: when
/// a section grows every section stored after it is moved along.
///
/// Cloning a blob makes an independent deep copy.
#[derive(Clone, PartialEq, Eq)]
pub struct Blob {
  buffer: Buffer,
}
impl Blob {
  /// Create an empty blob for a module
  #[must_use]
  pub fn new(module_name: &str) -> Self {
    let mut buffer = Buffer::with_capacity(256);
    buffer.extend(&MAGIC.to_le_bytes());
    buffer.extend(&VERSION.to_le_bytes());
    buffer.extend(&narrow(HEADER_SIZE).to_le_bytes());
    buffer.extend(&0_u32.to_le_bytes());
    buffer.extend(&0_u32.to_le_bytes());

    let mut blob = Self { buffer };
    blob.add_string("");
    let name = blob.add_string(module_name);
    blob.set_header_field(MODULE_NAME_FIELD, name);
    blob
  }

  /// Load a blob from its binary representation
  ///
  /// # Errors
  /// If the header or section table is malformed
  pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, BlobError> {
    let buffer = Buffer::from(bytes);
    if buffer.len() < HEADER_SIZE {
      return Err(BlobError::TooShort(buffer.len()));
    }

    let field = |offset| buffer.read_u32(offset).unwrap_or_default();
    if field(MAGIC_FIELD) != MAGIC {
      return Err(BlobError::BadMagic(field(MAGIC_FIELD)));
    }
    if field(VERSION_FIELD) != VERSION {
      return Err(BlobError::BadVersion(field(VERSION_FIELD)));
    }

    let table_offset = field(TABLE_OFFSET_FIELD) as usize;
    let table_end = (field(SECTION_COUNT_FIELD) as usize)
      .checked_mul(SECTION_HEADER_SIZE)
      .and_then(|size| size.checked_add(table_offset));
    if table_end.is_none_or(|end| end > buffer.len()) {
      return Err(BlobError::TableOutOfBounds);
    }

    let blob = Self { buffer };
    for index in 0..blob.section_count() {
      let position = blob.section_header_position(index);
      let kind = blob.buffer.read_u32(position).unwrap_or_default();
      let kind = SectionKind::try_from(kind).map_err(BlobError::UnknownSection)?;
      let header = blob
        .section_header(index)
        .ok_or(BlobError::UnknownSection(0))?;

      let end = u64::from(header.offset) + u64::from(header.size);
      if end > blob.buffer.len() as u64 {
        return Err(BlobError::SectionOutOfBounds(kind));
      }
    }

    if blob.string_at(blob.header_field(MODULE_NAME_FIELD)).is_none() {
      return Err(BlobError::BadModuleName);
    }

    Ok(blob)
  }

  /// The binary representation of the blob
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    self.buffer.raw()
  }

  /// The name of the module the blob is for
  #[must_use]
  pub fn module_name(&self) -> &str {
    self
      .string_at(self.header_field(MODULE_NAME_FIELD))
      .unwrap_or_default()
  }

  fn header_field(&self, field: usize) -> u32 {
    self.buffer.read_u32(field).unwrap_or_default()
  }
  fn set_header_field(&mut self, field: usize, value: u32) {
    self.buffer.write_u32(field, value);
  }
}

/// Section table management
impl Blob {
  /// The number of sections in the blob
  #[must_use]
  pub fn section_count(&self) -> usize {
    self.header_field(SECTION_COUNT_FIELD) as usize
  }

  fn section_header_position(&self, index: usize) -> usize {
    self.header_field(TABLE_OFFSET_FIELD) as usize + index * SECTION_HEADER_SIZE
  }

  /// Get the header of the section at the given position in the table
  #[must_use]
  pub fn section_header(&self, index: usize) -> Option<SectionHeader> {
    if index >= self.section_count() {
      return None;
    }

    let position = self.section_header_position(index);
    Some(SectionHeader {
      kind: SectionKind::try_from(self.buffer.read_u32(position)?).ok()?,
      offset: self.buffer.read_u32(position + 4)?,
      size: self.buffer.read_u32(position + 8)?,
    })
  }

  /// Iterate over all the section headers
  pub fn sections(&self) -> impl Iterator<Item = SectionHeader> + '_ {
    (0..self.section_count()).filter_map(|index| self.section_header(index))
  }

  fn find_section(&self, kind: SectionKind) -> Option<usize> {
    (0..self.section_count())
      .find(|index| self.section_header(*index).is_some_and(|header| header.kind == kind))
  }

  /// The payload of a section, if the section exists
  #[must_use]
  pub fn section_data(&self, kind: SectionKind) -> Option<&[u8]> {
    let header = self.section_header(self.find_section(kind)?)?;
    let start = header.offset as usize;
    self.buffer.sub(start..start + header.size as usize)
  }

  fn set_section_field(&mut self, index: usize, field: usize, value: u32) {
    let position = self.section_header_position(index) + field;
    self.buffer.write_u32(position, value);
  }

  /// Moves the start of every section (other than `except`) at or after `position`
  fn shift_sections(&mut self, position: usize, amount: usize, except: Option<usize>) {
    for index in 0..self.section_count() {
      if Some(index) == except {
        continue;
      }
      let Some(header) = self.section_header(index) else {
        continue;
      };

      if header.offset as usize >= position {
        self.set_section_field(index, 4, header.offset + narrow(amount));
      }
    }
  }

  /// Get the index of a section, creating it at the end of the blob if it doesn't exist
  fn ensure_section(&mut self, kind: SectionKind) -> usize {
    if let Some(index) = self.find_section(kind) {
      return index;
    }

    let index = self.section_count();
    let position = self.section_header_position(index);
    self.buffer.insert_zeroed(position, SECTION_HEADER_SIZE);
    self.shift_sections(position, SECTION_HEADER_SIZE, None);

    let end = narrow(self.buffer.len());
    self.buffer.write_u32(position, kind as u32);
    self.buffer.write_u32(position + 4, end);
    self.buffer.write_u32(position + 8, 0);
    self.set_header_field(SECTION_COUNT_FIELD, narrow(index + 1));

    tracing::trace!(?kind, "created section");
    index
  }

  /// Grow a section by `amount` zeroed bytes.
  ///
  /// The space is inserted at `at` (relative to the section start), or at the end.
  /// Returns the absolute position of the new space.
  fn grow_section(&mut self, kind: SectionKind, amount: usize, at: Option<usize>) -> usize {
    let index = self.ensure_section(kind);
    let Some(header) = self.section_header(index) else {
      unreachable!("section was just ensured")
    };

    let position = header.offset as usize + at.unwrap_or(header.size as usize);
    self.buffer.insert_zeroed(position, amount);
    self.set_section_field(index, 8, header.size + narrow(amount));
    self.shift_sections(position, amount, Some(index));

    position
  }

  /// Number of fixed size records in a section
  fn record_count(&self, kind: SectionKind, size: usize) -> usize {
    self.section_data(kind).map_or(0, |data| data.len() / size)
  }

  /// Position in the blob of a fixed size record
  fn record_position(&self, kind: SectionKind, size: usize, index: u32) -> Option<usize> {
    let index = index as usize;
    if index >= self.record_count(kind, size) {
      return None;
    }
    let header = self.section_header(self.find_section(kind)?)?;
    Some(header.offset as usize + index * size)
  }

  fn write_words(&mut self, position: usize, words: &[u32]) {
    for (offset, word) in words.iter().enumerate() {
      self.buffer.write_u32(position + offset * 4, *word);
    }
  }
}

/// Strings
impl Blob {
  /// Add a string to the string table, returning its offset.
  ///
  /// If the string is already in the table, the existing offset is returned.
  pub fn add_string(&mut self, string: &str) -> u32 {
    debug_assert!(!string.contains('\0'), "strings are nul-terminated");

    if let Some(offset) = self.find_string(string) {
      return offset;
    }

    let start = self.section_data(SectionKind::Strings).map_or(0, <[u8]>::len);
    let position = self.grow_section(SectionKind::Strings, string.len() + 1, None);
    self.buffer.overwrite(position, string.as_bytes());
    narrow(start)
  }

  /// Find the offset of a string in the string table
  #[must_use]
  pub fn find_string(&self, string: &str) -> Option<u32> {
    let data = self.section_data(SectionKind::Strings)?;

    let mut offset = 0;
    for entry in data.split(|byte| *byte == 0) {
      if offset >= data.len() {
        break;
      }
      if entry == string.as_bytes() {
        return Some(narrow(offset));
      }
      offset += entry.len() + 1;
    }

    None
  }

  /// Get the string at an offset in the string table
  #[must_use]
  pub fn string_at(&self, offset: u32) -> Option<&str> {
    let data = self.section_data(SectionKind::Strings)?;
    let rest = data.get(offset as usize..)?;
    let end = rest.iter().position(|byte| *byte == 0)?;
    str::from_utf8(&rest[..end]).ok()
  }
}

/// Symbols
impl Blob {
  /// Add a symbol, returning its index. Equal symbols are not merged.
  pub fn add_symbol(&mut self, symbol: Symbol) -> u32 {
    let index = self.symbol_count();
    let position = self.grow_section(SectionKind::Symbols, SYMBOL_SIZE, None);
    self.write_words(position, &[
      symbol.name,
      symbol.kind as u32,
      symbol.binding as u32,
      symbol.address,
      symbol.locals,
      symbol.signature,
    ]);
    index
  }

  /// The number of symbols
  #[must_use]
  pub fn symbol_count(&self) -> u32 {
    narrow(self.record_count(SectionKind::Symbols, SYMBOL_SIZE))
  }

  /// Get the symbol at an index
  #[must_use]
  pub fn symbol_at(&self, index: u32) -> Option<Symbol> {
    let position = self.record_position(SectionKind::Symbols, SYMBOL_SIZE, index)?;
    let word = |field: usize| self.buffer.read_u32(position + field * 4);

    Some(Symbol {
      name: word(0)?,
      kind: SymbolKind::try_from(word(1)?).ok()?,
      binding: Binding::try_from(word(2)?).ok()?,
      address: word(3)?,
      locals: word(4)?,
      signature: word(5)?,
    })
  }

  /// Find a symbol by name
  #[must_use]
  pub fn find_symbol(&self, name: &str) -> Option<(u32, Symbol)> {
    let name = self.find_string(name)?;
    (0..self.symbol_count())
      .filter_map(|index| Some((index, self.symbol_at(index)?)))
      .find(|(_, symbol)| symbol.name == name)
  }
}

/// Type specs and signatures, which are variable length records
impl Blob {
  /// Walk a variable length section to find the byte offset of the `index`th entry.
  ///
  /// `entry_size` gives the size of the entry starting at an offset.
  fn variable_entry(
    &self,
    kind: SectionKind,
    index: u32,
    entry_size: impl Fn(&[u8]) -> Option<usize>,
  ) -> Option<usize> {
    let data = self.section_data(kind)?;
    let mut offset = 0;
    for _ in 0..index {
      offset += entry_size(data.get(offset..)?)?;
    }
    (offset < data.len()).then_some(offset)
  }

  fn variable_count(&self, kind: SectionKind, entry_size: impl Fn(&[u8]) -> Option<usize>) -> u32 {
    let Some(data) = self.section_data(kind) else {
      return 0;
    };

    let (mut offset, mut count) = (0, 0);
    while offset < data.len() {
      let Some(size) = entry_size(&data[offset..]) else {
        break;
      };
      offset += size;
      count += 1;
    }
    count
  }

  fn type_spec_size(data: &[u8]) -> Option<usize> {
    let count = u32::from_le_bytes(data.get(4..8)?.try_into().ok()?);
    Some(TYPE_SPEC_HEADER_SIZE + count as usize * 4)
  }
  fn signature_size(data: &[u8]) -> Option<usize> {
    let count = u32::from_le_bytes(data.get(0..4)?.try_into().ok()?);
    Some(SIGNATURE_HEADER_SIZE + count as usize * 8)
  }

  /// Add a type spec, returning its index. Equal type specs are not merged.
  pub fn add_type_spec(&mut self, name: &str, symbols: &[u32]) -> u32 {
    let name = self.add_string(name);
    let index = self.type_spec_count();

    let size = TYPE_SPEC_HEADER_SIZE + symbols.len() * 4;
    let position = self.grow_section(SectionKind::TypeSpecs, size, None);
    self.write_words(position, &[name, narrow(symbols.len())]);
    self.write_words(position + TYPE_SPEC_HEADER_SIZE, symbols);

    index
  }

  /// The number of type specs
  #[must_use]
  pub fn type_spec_count(&self) -> u32 {
    self.variable_count(SectionKind::TypeSpecs, Self::type_spec_size)
  }

  /// Get the type spec at an index
  #[must_use]
  pub fn type_spec_at(&self, index: u32) -> Option<TypeSpec> {
    let offset = self.variable_entry(SectionKind::TypeSpecs, index, Self::type_spec_size)?;
    let data = self.section_data(SectionKind::TypeSpecs)?.get(offset..)?;
    let word = |position: usize| {
      let bytes = data.get(position..position + 4)?;
      Some(u32::from_le_bytes(bytes.try_into().ok()?))
    };

    let count = word(4)? as usize;
    let symbols = (0..count)
      .map(|i| word(TYPE_SPEC_HEADER_SIZE + i * 4))
      .collect::<Option<Vec<_>>>()?;

    Some(TypeSpec {
      name: word(0)?,
      symbols,
    })
  }

  /// Add a signature, returning its index. Equal signatures are not merged.
  pub fn add_signature(&mut self, arguments: &[u64]) -> u32 {
    let index = self.signature_count();

    let size = SIGNATURE_HEADER_SIZE + arguments.len() * 8;
    let position = self.grow_section(SectionKind::Signatures, size, None);
    self.write_words(position, &[narrow(arguments.len())]);
    for (i, argument) in arguments.iter().enumerate() {
      self
        .buffer
        .overwrite(position + SIGNATURE_HEADER_SIZE + i * 8, &argument.to_le_bytes());
    }

    index
  }

  /// The number of signatures
  #[must_use]
  pub fn signature_count(&self) -> u32 {
    self.variable_count(SectionKind::Signatures, Self::signature_size)
  }

  /// Get the argument types of the signature at an index
  #[must_use]
  pub fn signature_at(&self, index: u32) -> Option<Vec<u64>> {
    let offset = self.variable_entry(SectionKind::Signatures, index, Self::signature_size)?;
    let data = self.section_data(SectionKind::Signatures)?.get(offset..)?;

    let count = u32::from_le_bytes(data.get(0..4)?.try_into().ok()?) as usize;
    (0..count)
      .map(|i| {
        let start = SIGNATURE_HEADER_SIZE + i * 8;
        let bytes = data.get(start..start + 8)?;
        Some(u64::from_le_bytes(bytes.try_into().ok()?))
      })
      .collect()
  }
}

/// Constants
impl Blob {
  /// Add a constant, returning its index.
  ///
  /// If an equal constant (same class and serialized value) exists, its index is returned.
  pub fn add_constant(&mut self, class: &str, value: &str) -> u32 {
    let constant = Constant {
      class: self.add_string(class),
      value: self.add_string(value),
    };

    let existing = (0..self.constant_count()).find(|i| self.constant_at(*i) == Some(constant));
    if let Some(index) = existing {
      return index;
    }

    let index = self.constant_count();
    let position = self.grow_section(SectionKind::Constants, CONSTANT_SIZE, None);
    self.write_words(position, &[constant.class, constant.value]);
    index
  }

  /// The number of constants
  #[must_use]
  pub fn constant_count(&self) -> u32 {
    narrow(self.record_count(SectionKind::Constants, CONSTANT_SIZE))
  }

  /// Get the constant at an index
  #[must_use]
  pub fn constant_at(&self, index: u32) -> Option<Constant> {
    let position = self.record_position(SectionKind::Constants, CONSTANT_SIZE, index)?;
    Some(Constant {
      class: self.buffer.read_u32(position)?,
      value: self.buffer.read_u32(position + 4)?,
    })
  }
}

/// Debug information
impl Blob {
  fn ensure_debug_header(&mut self) -> usize {
    if let Some(data) = self.section_data(SectionKind::Debug)
      && data.len() >= DEBUG_HEADER_SIZE
    {
      let index = self.find_section(SectionKind::Debug).unwrap_or_default();
      return self.section_header(index).map_or(0, |h| h.offset as usize);
    }

    let empty = self.add_string("");
    let position = self.grow_section(SectionKind::Debug, DEBUG_HEADER_SIZE, Some(0));
    self.write_words(position, &[empty, 0]);
    position
  }

  /// Set the name of the source file the debug entries refer to
  pub fn set_debug_file(&mut self, file: &str) {
    let file = self.add_string(file);
    let position = self.ensure_debug_header();
    self.buffer.write_u32(position, file);
  }

  /// The name of the source file the debug entries refer to
  #[must_use]
  pub fn debug_file(&self) -> Option<&str> {
    let data = self.section_data(SectionKind::Debug)?;
    let offset = u32::from_le_bytes(data.get(0..4)?.try_into().ok()?);
    self.string_at(offset)
  }

  /// Add a debug entry, returning its index
  pub fn add_debug_entry(&mut self, entry: DebugEntry) -> u32 {
    self.ensure_debug_header();
    let index = self.debug_entry_count();

    let position = self.grow_section(SectionKind::Debug, DEBUG_ENTRY_SIZE, None);
    self.write_words(position, &[entry.line, entry.col, entry.extent]);

    let header = self.ensure_debug_header();
    self.buffer.write_u32(header + 4, index + 1);
    index
  }

  /// The number of debug entries
  #[must_use]
  pub fn debug_entry_count(&self) -> u32 {
    self
      .section_data(SectionKind::Debug)
      .and_then(|data| Some(u32::from_le_bytes(data.get(4..8)?.try_into().ok()?)))
      .unwrap_or(0)
  }

  /// Get the debug entry at an index
  #[must_use]
  pub fn debug_entry_at(&self, index: u32) -> Option<DebugEntry> {
    if index >= self.debug_entry_count() {
      return None;
    }

    let data = self.section_data(SectionKind::Debug)?;
    let start = DEBUG_HEADER_SIZE + index as usize * DEBUG_ENTRY_SIZE;
    let word = |field: usize| {
      let bytes = data.get(start + field * 4..start + field * 4 + 4)?;
      Some(u32::from_le_bytes(bytes.try_into().ok()?))
    };

    Some(DebugEntry {
      line: word(0)?,
      col: word(1)?,
      extent: word(2)?,
    })
  }
}

/// Text
impl Blob {
  /// Append instruction words to the text section, returning the word index of the first
  pub fn append_text(&mut self, words: &[u32]) -> u32 {
    let start = self.text_len();
    let position = self.grow_section(SectionKind::Text, words.len() * 4, None);
    self.write_words(position, words);
    start
  }

  /// The number of words in the text section
  #[must_use]
  pub fn text_len(&self) -> u32 {
    narrow(self.record_count(SectionKind::Text, 4))
  }

  /// Get the word at an index in the text section
  #[must_use]
  pub fn text_word(&self, index: u32) -> Option<u32> {
    let position = self.record_position(SectionKind::Text, 4, index)?;
    self.buffer.read_u32(position)
  }

  /// Decode the whole text section
  #[must_use]
  pub fn text(&self) -> Vec<u32> {
    self
      .section_data(SectionKind::Text)
      .unwrap_or_default()
      .chunks_exact(4)
      .map(|word| u32::from_le_bytes([word[0], word[1], word[2], word[3]]))
      .collect()
  }
}

impl fmt::Debug for Blob {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Blob")
      .field("module", &self.module_name())
      .field("size", &self.buffer.len())
      .field("sections", &self.sections().collect::<Vec<_>>())
      .finish()
  }
}

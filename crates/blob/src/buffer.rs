//! A growable byte container which supports inserting space in the middle.

use std::ops::Range;

/// A contiguous, growable sequence of bytes.
///
/// Values are stored little-endian. Views returned by [`Buffer::sub`] and
/// [`Buffer::raw`] borrow the buffer, so they can't outlive a mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Buffer {
  bytes: Vec<u8>,
}
impl Buffer {
  /// Create an empty buffer
  #[must_use]
  pub fn new() -> Self {
    Self { bytes: Vec::new() }
  }

  /// Create an empty buffer, with space reserved for `capacity` bytes
  #[must_use]
  pub fn with_capacity(capacity: usize) -> Self {
    Self {
      bytes: Vec::with_capacity(capacity),
    }
  }

  /// The number of bytes in the buffer
  #[must_use]
  pub fn len(&self) -> usize {
    self.bytes.len()
  }

  /// Does the buffer contain no bytes?
  #[must_use]
  pub fn is_empty(&self) -> bool {
    self.bytes.is_empty()
  }

  /// Append bytes to the end of the buffer
  pub fn extend(&mut self, bytes: &[u8]) {
    self.bytes.extend_from_slice(bytes);
  }

  /// Insert `amount` zeroed bytes at `offset`, moving everything after it along.
  ///
  /// # Panics
  /// Panics if `offset` is past the end of the buffer
  pub fn insert_zeroed(&mut self, offset: usize, amount: usize) {
    assert!(offset <= self.bytes.len(), "insert past end of buffer");
    self
      .bytes
      .splice(offset..offset, std::iter::repeat_n(0, amount));
  }

  /// Insert bytes at `offset`, moving everything after it along.
  ///
  /// # Panics
  /// Panics if `offset` is past the end of the buffer
  pub fn insert(&mut self, offset: usize, bytes: &[u8]) {
    assert!(offset <= self.bytes.len(), "insert past end of buffer");
    self
      .bytes
      .splice(offset..offset, bytes.iter().copied());
  }

  /// Overwrite the bytes starting at `offset`.
  ///
  /// Returns `None` if the write would go past the end of the buffer.
  pub fn overwrite(&mut self, offset: usize, bytes: &[u8]) -> Option<()> {
    let target = self.bytes.get_mut(offset..offset.checked_add(bytes.len())?)?;
    target.copy_from_slice(bytes);
    Some(())
  }

  /// A view of part of the buffer
  #[must_use]
  pub fn sub(&self, range: Range<usize>) -> Option<&[u8]> {
    self.bytes.get(range)
  }

  /// A view of the whole buffer
  #[must_use]
  pub fn raw(&self) -> &[u8] {
    &self.bytes
  }

  /// Read a little-endian `u32` at `offset`
  #[must_use]
  pub fn read_u32(&self, offset: usize) -> Option<u32> {
    let bytes = self.bytes.get(offset..offset.checked_add(4)?)?;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
  }

  /// Read a little-endian `u64` at `offset`
  #[must_use]
  pub fn read_u64(&self, offset: usize) -> Option<u64> {
    let bytes = self.bytes.get(offset..offset.checked_add(8)?)?;
    Some(u64::from_le_bytes(bytes.try_into().ok()?))
  }

  /// Overwrite a little-endian `u32` at `offset`
  pub fn write_u32(&mut self, offset: usize, value: u32) -> Option<()> {
    self.overwrite(offset, &value.to_le_bytes())
  }

  /// Consume the buffer, returning the underlying bytes
  #[must_use]
  pub fn into_bytes(self) -> Vec<u8> {
    self.bytes
  }
}
impl From<Vec<u8>> for Buffer {
  fn from(bytes: Vec<u8>) -> Self {
    Self { bytes }
  }
}
impl From<&[u32]> for Buffer {
  fn from(words: &[u32]) -> Self {
    let mut buffer = Self::with_capacity(words.len() * 4);
    for word in words {
      buffer.extend(&word.to_le_bytes());
    }
    buffer
  }
}

#[cfg(test)]
mod test {
  use super::Buffer;

  #[test]
  fn insert_moves_later_bytes() {
    let mut buffer = Buffer::from(vec![1, 2, 3, 4]);
    buffer.insert_zeroed(2, 3);
    assert_eq!(buffer.raw(), &[1, 2, 0, 0, 0, 3, 4]);

    buffer.insert(7, &[9]);
    assert_eq!(buffer.raw(), &[1, 2, 0, 0, 0, 3, 4, 9]);
  }

  #[test]
  fn words_are_little_endian() {
    let mut buffer = Buffer::new();
    buffer.extend(&0x4C4F_5841_u32.to_le_bytes());
    assert_eq!(buffer.raw(), b"AXOL");
    assert_eq!(buffer.read_u32(0), Some(0x4C4F_5841));

    buffer.write_u32(0, 7).unwrap();
    assert_eq!(buffer.read_u32(0), Some(7));
  }

  #[test]
  fn out_of_range_access() {
    let mut buffer = Buffer::from(vec![0; 6]);
    assert_eq!(buffer.read_u32(3), None);
    assert_eq!(buffer.read_u64(0), None);
    assert_eq!(buffer.sub(4..8), None);
    assert_eq!(buffer.overwrite(5, &[1, 2]), None);
    assert_eq!(buffer.write_u32(usize::MAX, 1), None);
  }
}

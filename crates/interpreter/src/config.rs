use std::path::PathBuf;

/// Settings for the runtime
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
  /// Directories searched for modules to import, in order
  pub import_paths: Vec<PathBuf>,
  /// The file extension of source files
  pub extension: String,
  /// The file extension of compiled blobs
  pub blob_extension: String,
  /// The most objects the engine's stack can hold
  pub max_stack: usize,
}
impl Default for Config {
  fn default() -> Self {
    Self {
      import_paths: vec![PathBuf::from(".")],
      extension: "ax".to_owned(),
      blob_extension: "axb".to_owned(),
      max_stack: 1 << 16,
    }
  }
}

//! Options accepted by write and copy operations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// User metadata attached to a stored entry.
pub type Metadata = BTreeMap<String, String>;

/// Permission bits used for directories when the caller gives none.
pub const DEFAULT_DIR_MODE: u32 = 0o744;

/// Permission bits used for files when the caller gives none.
pub const DEFAULT_FILE_MODE: u32 = 0o666;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub metadata: Metadata,
    /// Buffering hint for writers. Backends that don't buffer ignore it.
    pub buffer_size: Option<usize>,
    pub mode: Option<u32>,
}

impl WriteOptions {
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = Some(buffer_size);
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn file_mode(&self) -> u32 {
        self.mode.unwrap_or(DEFAULT_FILE_MODE)
    }

    pub fn dir_mode(&self) -> u32 {
        self.mode.unwrap_or(DEFAULT_DIR_MODE)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyOptions {
    /// Replaces the source metadata on the copy when set.
    pub metadata: Option<Metadata>,
    /// Overrides the source mode when set.
    pub mode: Option<u32>,
}

impl CopyOptions {
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }
}

/// Sizing of the recursive copy worker pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CopyConfig {
    pub workers: usize,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self { workers: 8 }
    }
}

impl CopyConfig {
    /// Worker count, never less than one.
    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_options_defaults() {
        let opts = WriteOptions::default();
        assert_eq!(opts.file_mode(), DEFAULT_FILE_MODE);
        assert_eq!(opts.dir_mode(), DEFAULT_DIR_MODE);
        assert!(opts.metadata.is_empty());
    }

    #[test]
    fn test_write_options_builder() {
        let opts = WriteOptions::default()
            .with_metadata_entry("owner", "ops")
            .with_buffer_size(4096)
            .with_mode(0o600);
        assert_eq!(opts.metadata.get("owner").map(String::as_str), Some("ops"));
        assert_eq!(opts.buffer_size, Some(4096));
        assert_eq!(opts.file_mode(), 0o600);
    }

    #[test]
    fn test_copy_config_clamps_workers() {
        assert_eq!(CopyConfig { workers: 0 }.workers(), 1);
        assert_eq!(CopyConfig::default().workers(), 8);
    }
}

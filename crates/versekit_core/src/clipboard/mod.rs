//! Clipboard boundary and node-list codec.
//!
//! # Responsibility
//! - Define the `Clipboard` seam the editor talks to, keyed by format strings.
//! - Provide an in-process implementation for hosts without a system
//!   clipboard and for tests.
//!
//! # See also
//! - `clipboard::codec` for the payload format.

pub mod codec;

use std::collections::BTreeMap;

/// Format key of the plain-text summary entry.
pub const TEXT_FORMAT: &str = "text/plain";

/// Format key → content entries placed on the clipboard together.
pub type ClipboardContents = BTreeMap<String, String>;

/// System clipboard boundary.
pub trait Clipboard {
    /// Replaces all clipboard entries.
    fn set_contents(&mut self, contents: ClipboardContents);
    /// Returns the entry stored under `format`.
    fn get(&self, format: &str) -> Option<String>;
    /// Whether an entry is stored under `format`.
    fn has_format(&self, format: &str) -> bool {
        self.get(format).is_some()
    }
}

/// In-process clipboard.
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    contents: ClipboardContents,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored format keys, sorted.
    pub fn formats(&self) -> Vec<&str> {
        self.contents.keys().map(String::as_str).collect()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_contents(&mut self, contents: ClipboardContents) {
        self.contents = contents;
    }

    fn get(&self, format: &str) -> Option<String> {
        self.contents.get(format).cloned()
    }

    fn has_format(&self, format: &str) -> bool {
        self.contents.contains_key(format)
    }
}

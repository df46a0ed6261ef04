//! Append-only string table for the database blob

use ahash::AHashMap;

/// Interns NUL-terminated strings into one contiguous buffer
///
/// Identical strings share a single copy. Offsets never move once issued.
#[derive(Debug, Default)]
pub struct StringInterner {
    buf: Vec<u8>,
    offsets: AHashMap<String, u64>,
    dedup_hits: usize,
}

impl StringInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `text` and return its offset from the start of the buffer
    pub fn intern(&mut self, text: &str) -> u64 {
        if let Some(&offset) = self.offsets.get(text) {
            self.dedup_hits += 1;
            return offset;
        }

        let offset = self.buf.len() as u64;
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.push(0);
        self.offsets.insert(text.to_string(), offset);
        offset
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of `intern` calls answered by an existing copy
    pub fn dedup_hits(&self) -> usize {
        self.dedup_hits
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

//! The file-level metadata block: an ordered string→string mapping written
//! as a count followed by that many `Text` pairs (version ≥ 6).
//!
//! Both sides are typed as `Text` on the wire. The reference platform's
//! `Metadata.write` serializes entries as generic `Writable` objects while
//! `readFields` reads them back as `Text` — a mismatch that happens to work
//! only because the platform's `Text` *is* a `Writable`. This implementation
//! types both sides as `Text` from the start.

use std::io::{Read, Write};

use crate::error::{Error, Result};
use crate::primitives::{read_i32_be, read_text, write_i32_be, write_text};

/// Insertion-ordered string→string map. A `Vec` rather than a sorted map so
/// that reading a file back preserves the exact entries that were written,
/// without imposing an ordering the writer never asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, String)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `key` to `value`, replacing any existing entry for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value.into(),
            None => self.entries.push((key, value.into())),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Serialize as `int32(count)` followed by `count` `(Text, Text)` pairs.
    pub fn write(&self, out: &mut dyn Write) -> Result<()> {
        write_i32_be(out, self.entries.len() as i32)?;
        for (key, value) in &self.entries {
            write_text(out, key)?;
            write_text(out, value)?;
        }
        Ok(())
    }

    /// Deserialize, replacing any existing entries. A negative count is a
    /// format error.
    pub fn read_fields(&mut self, input: &mut dyn Read) -> Result<()> {
        let count = read_i32_be(input)?;
        if count < 0 {
            return Err(Error::Corruption(format!(
                "invalid metadata entry count {count}"
            )));
        }
        self.entries.clear();
        self.entries.reserve(count as usize);
        for _ in 0..count {
            let key = read_text(input)?;
            let value = read_text(input)?;
            self.entries.push((key, value));
        }
        Ok(())
    }
}

impl IntoIterator for Metadata {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl FromIterator<(String, String)> for Metadata {
    fn from_iter<T: IntoIterator<Item = (String, String)>>(iter: T) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.set(k, v);
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_arbitrary_utf8() {
        let mut meta = Metadata::new();
        meta.set("owner", "team-ingest");
        meta.set("encoding", "utf-8 · 日本語");
        meta.set("", "empty key is allowed");

        let mut buf = Vec::new();
        meta.write(&mut buf).unwrap();

        let mut read_back = Metadata::new();
        let mut cursor = std::io::Cursor::new(buf);
        read_back.read_fields(&mut cursor).unwrap();

        assert_eq!(meta, read_back);
    }

    #[test]
    fn negative_count_is_corruption() {
        let mut buf = Vec::new();
        write_i32_be(&mut buf, -1).unwrap();
        let mut cursor = std::io::Cursor::new(buf);
        let mut meta = Metadata::new();
        assert!(matches!(
            meta.read_fields(&mut cursor),
            Err(Error::Corruption(_))
        ));
    }

    #[test]
    fn set_overwrites_existing_key() {
        let mut meta = Metadata::new();
        meta.set("k", "v1");
        meta.set("k", "v2");
        assert_eq!(meta.len(), 1);
        assert_eq!(meta.get("k"), Some("v2"));
    }
}

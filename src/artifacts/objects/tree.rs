//! Git tree object
//!
//! Trees represent directory snapshots. They contain entries for files
//! (blobs), subdirectories (other trees), symlinks and gitlinks, along with
//! their names and modes.
//!
//! ## Format
//!
//! On disk: `tree <size>\0<entries>`
//! Each entry: `<mode> <name>\0<20-byte-sha1>`
//!
//! Entries are kept in a name-keyed map. On serialization they are written
//! in git's canonical order, where a directory sorts as if its name ended
//! with `/`. Name bytes that are not valid UTF-8 are kept as `\xNN`
//! escapes, which is also how path filters must spell them.

use crate::artifacts::database::database_entry::DatabaseEntry;
use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object::Unpackable;
use crate::artifacts::objects::object::{Object, Packable};
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::object_type::ObjectType;
use anyhow::Context;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::io::{BufRead, Write};

/// Git tree object representing a directory snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree {
    entries: BTreeMap<String, DatabaseEntry>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) an entry, returning the tree for chaining
    pub fn with_entry(mut self, name: impl Into<String>, oid: ObjectId, mode: EntryMode) -> Self {
        self.insert(name, oid, mode);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, oid: ObjectId, mode: EntryMode) {
        self.entries.insert(name.into(), DatabaseEntry::new(oid, mode));
    }

    pub fn get(&self, name: &str) -> Option<&DatabaseEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &DatabaseEntry)> {
        self.entries.iter()
    }

    pub fn into_entries(self) -> impl Iterator<Item = (String, DatabaseEntry)> {
        self.entries.into_iter()
    }

    /// Entries in git's canonical on-disk order
    fn canonical_entries(&self) -> Vec<(&String, &DatabaseEntry)> {
        let mut entries = self.entries.iter().collect::<Vec<_>>();
        entries.sort_by(|(a_name, a), (b_name, b)| {
            let a_key = sort_key(a_name, a);
            let b_key = sort_key(b_name, b);
            a_key.cmp(&b_key)
        });
        entries
    }
}

fn sort_key(name: &str, entry: &DatabaseEntry) -> Vec<u8> {
    let mut key = name.as_bytes().to_vec();
    if entry.is_tree() {
        key.push(b'/');
    }
    key
}

fn decode_name(bytes: &[u8]) -> String {
    let mut name = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        name.push_str(chunk.valid());
        for byte in chunk.invalid() {
            name.push_str(&format!("\\x{byte:02x}"));
        }
    }
    name
}

impl Packable for Tree {
    fn serialize_body(&self) -> anyhow::Result<Bytes> {
        let mut content_bytes = Vec::new();

        for (name, entry) in self.canonical_entries() {
            let header = format!("{:o} {}", entry.mode.as_u32(), name);
            content_bytes.write_all(header.as_bytes())?;
            content_bytes.push(0);
            entry.oid.write_h40_to(&mut content_bytes)?;
        }

        Ok(Bytes::from(content_bytes))
    }
}

impl Unpackable for Tree {
    fn deserialize(reader: impl BufRead) -> anyhow::Result<Self> {
        let mut entries = BTreeMap::new();
        let mut reader = reader;

        // Reuse scratch buffers to reduce allocs
        let mut mode_bytes = Vec::new();
        let mut name_bytes = Vec::new();

        loop {
            mode_bytes.clear();
            // Read "mode " (space-delimited)
            let n = reader.read_until(b' ', &mut mode_bytes)?;
            if n == 0 {
                break; // clean EOF: no more entries
            }
            // Must end with ' ' or it's malformed
            if mode_bytes.pop() != Some(b' ') {
                return Err(anyhow::anyhow!("unexpected EOF in mode"));
            }

            let mode_str = std::str::from_utf8(&mode_bytes)?;
            let mode = EntryMode::from_octal_str(mode_str)?;

            // Read "name\0"
            name_bytes.clear();
            let n = reader.read_until(b'\0', &mut name_bytes)?;
            if n == 0 || name_bytes.pop() != Some(b'\0') {
                return Err(anyhow::anyhow!("unexpected EOF in name"));
            }
            let name = decode_name(&name_bytes);
            if name.is_empty() || name.contains('/') {
                return Err(anyhow::anyhow!("invalid entry name {name:?}"));
            }

            // Read object id
            let oid =
                ObjectId::read_h40_from(&mut reader).context("unexpected EOF in object id")?;

            entries.insert(name, DatabaseEntry::new(oid, mode));
        }

        Ok(Tree { entries })
    }
}

impl Object for Tree {
    fn object_type(&self) -> ObjectType {
        ObjectType::Tree
    }

    fn display(&self) -> String {
        self.canonical_entries()
            .into_iter()
            .map(|(name, entry)| {
                format!(
                    "{} {} {}\t{}",
                    entry.mode.as_str(),
                    entry.mode.object_type(),
                    entry.oid,
                    name
                )
            })
            .collect::<Vec<String>>()
            .join("\n")
    }
}

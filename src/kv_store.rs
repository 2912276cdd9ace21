use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::info;

use crate::errors::{Error, Result};
use crate::mmap_file::MMapFile;

/// Read-only, randomly addressable sequence of keyed records.
///
/// Implementations are shared by reference between worker threads, so every
/// method takes `&self` and must be safe to call concurrently.
pub trait RecordStore: Sync {
    /// Number of addressable records.
    fn size(&self) -> usize;

    /// Key associated with the record at `index`.
    fn key_at(&self, index: usize) -> Result<&str>;

    /// Raw payload of the record at `index`.
    fn data_at(&self, index: usize) -> Result<&str>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct IndexEntry {
    key: String,
    offset: usize,
    length: usize,
}

/// MMseqs2-style database: a NUL-terminated data file plus a text index.
///
/// Each index line reads `key<TAB>offset<TAB>length`, where `length` counts
/// the record's terminating NUL byte.
pub struct DbReader {
    data: MMapFile,
    entries: Vec<IndexEntry>,
}

impl DbReader {
    pub fn open<P: AsRef<Path>, Q: AsRef<Path>>(
        data_filename: P,
        index_filename: Q,
    ) -> Result<Self> {
        let index_filename = index_filename.as_ref();
        let index_file =
            File::open(index_filename).map_err(|e| Error::io(index_filename, e))?;
        let entries = read_index(BufReader::new(index_file), index_filename)?;
        let data = MMapFile::open(data_filename)?;
        data.load_file()?;

        info!(
            "Opened record store {} with {} records ({} bytes)",
            data.path().display(),
            entries.len(),
            data.filesize()
        );
        Ok(DbReader { data, entries })
    }

    fn entry(&self, index: usize) -> Result<&IndexEntry> {
        self.entries.get(index).ok_or_else(|| {
            Error::Database(format!(
                "record index {} out of range (size {})",
                index,
                self.entries.len()
            ))
        })
    }
}

impl RecordStore for DbReader {
    fn size(&self) -> usize {
        self.entries.len()
    }

    fn key_at(&self, index: usize) -> Result<&str> {
        Ok(&self.entry(index)?.key)
    }

    fn data_at(&self, index: usize) -> Result<&str> {
        let entry = self.entry(index)?;
        let bytes = entry
            .offset
            .checked_add(entry.length)
            .and_then(|end| self.data.as_slice().get(entry.offset..end))
            .ok_or_else(|| {
                Error::Database(format!(
                    "record {} ({}+{}) lies outside {} ({} bytes)",
                    entry.key,
                    entry.offset,
                    entry.length,
                    self.data.path().display(),
                    self.data.filesize()
                ))
            })?;

        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        std::str::from_utf8(&bytes[..end]).map_err(|e| {
            Error::Database(format!("record {} is not valid UTF-8: {}", entry.key, e))
        })
    }
}

fn read_index<R: BufRead>(reader: R, path: &Path) -> Result<Vec<IndexEntry>> {
    let mut entries = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| Error::io(path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        let line_no = line_no + 1;

        let fields: Vec<&str> = line.trim_end().split('\t').collect();
        if fields.len() != 3 {
            return Err(Error::parse(
                path,
                line_no,
                format!("expected 3 fields, found {}", fields.len()),
            ));
        }
        let number = |field: &str, what: &str| {
            field
                .parse::<usize>()
                .map_err(|_| Error::parse(path, line_no, format!("invalid {} {:?}", what, field)))
        };

        entries.push(IndexEntry {
            key: fields[0].to_string(),
            offset: number(fields[1], "offset")?,
            length: number(fields[2], "length")?,
        });
    }
    Ok(entries)
}

/// Record store held entirely in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    records: Vec<(String, String)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, data: impl Into<String>) {
        self.records.push((key.into(), data.into()));
    }
}

impl<K: Into<String>, D: Into<String>> FromIterator<(K, D)> for MemoryStore {
    fn from_iter<I: IntoIterator<Item = (K, D)>>(iter: I) -> Self {
        let mut store = MemoryStore::new();
        for (key, data) in iter {
            store.push(key, data);
        }
        store
    }
}

impl RecordStore for MemoryStore {
    fn size(&self) -> usize {
        self.records.len()
    }

    fn key_at(&self, index: usize) -> Result<&str> {
        self.records
            .get(index)
            .map(|(key, _)| key.as_str())
            .ok_or_else(|| Error::Database(format!("record index {} out of range", index)))
    }

    fn data_at(&self, index: usize) -> Result<&str> {
        self.records
            .get(index)
            .map(|(_, data)| data.as_str())
            .ok_or_else(|| Error::Database(format!("record index {} out of range", index)))
    }
}

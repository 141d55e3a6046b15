//! Index records and a reader for the structural half of a triad.
//!
//! Only the index and type files are decoded here; entity payloads in the
//! data file are returned as raw byte ranges.

use super::paths::TriadPaths;
use super::writer::GenericWriter;
use crate::core::{EntityCategory, Result, SaveError, Serial, TypeRef};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::ops::Range;
use std::path::Path;

/// type ref (i32) + serial (i32) + offset (i64) + length (i32)
pub const INDEX_RECORD_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IndexRecord {
    pub type_ref: TypeRef,
    pub serial: Serial,
    pub offset: u64,
    pub length: u32,
}

impl IndexRecord {
    /// Writes the fields known before the entity is serialized.
    pub fn write_head(writer: &mut dyn GenericWriter, type_ref: TypeRef, serial: Serial, offset: u64) -> Result<()> {
        writer.write_type_ref(type_ref)?;
        writer.write_serial(serial)?;
        writer.write_i64(offset as i64)
    }

    pub fn data_range(&self) -> Range<u64> {
        self.offset..self.offset + self.length as u64
    }
}

// ============================================================================
// Binary Reader
// ============================================================================

/// Reads little-endian values, never trusting a length from the file beyond
/// the bytes that are actually left in it.
struct BinaryReader<R: Read> {
    inner: R,
    source: String,
    remaining: u64,
}

impl<R: Read> BinaryReader<R> {
    fn new(inner: R, source: &Path, len: u64) -> Self {
        Self {
            inner,
            source: source.display().to_string(),
            remaining: len,
        }
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.reserve(N as u64, "a value")?;
        let mut bytes = [0u8; N];
        self.inner.read_exact(&mut bytes).map_err(|e| {
            SaveError::Corrupt(format!("'{}' ended unexpectedly: {}", self.source, e))
        })?;
        Ok(bytes)
    }

    fn reserve(&mut self, len: u64, what: &str) -> Result<()> {
        if len > self.remaining {
            return Err(SaveError::Corrupt(format!(
                "'{}' needs {} bytes for {} but only {} remain",
                self.source, len, what, self.remaining
            )));
        }
        self.remaining -= len;
        Ok(())
    }

    fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array()?))
    }

    fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    fn read_encoded_int(&mut self) -> Result<i32> {
        let mut value: u32 = 0;
        for shift in (0..35).step_by(7) {
            let byte = self.read_u8()?;
            value |= ((byte & 0x7F) as u32) << shift;
            if byte & 0x80 == 0 {
                return Ok(value as i32);
            }
        }
        Err(SaveError::Corrupt(format!(
            "'{}' contains an over-long encoded integer",
            self.source
        )))
    }

    /// Reads an unprefixed string.
    fn read_string(&mut self) -> Result<String> {
        let len = self.read_encoded_int()?;
        let len = usize::try_from(len).map_err(|_| {
            SaveError::Corrupt(format!("'{}' has a negative string length", self.source))
        })?;
        self.reserve(len as u64, "a string")?;
        let mut bytes = vec![0u8; len];
        self.inner.read_exact(&mut bytes).map_err(|e| {
            SaveError::Corrupt(format!("'{}' ended inside a string: {}", self.source, e))
        })?;
        String::from_utf8(bytes)
            .map_err(|e| SaveError::Corrupt(format!("'{}' has invalid UTF-8: {}", self.source, e)))
    }

    /// Reads an entry count, rejecting one that cannot fit in the rest of the
    /// file given each entry takes at least `min_entry_size` bytes.
    fn read_count(&mut self, min_entry_size: u64) -> Result<usize> {
        let count = self.read_i32()?;
        let count = usize::try_from(count).map_err(|_| {
            SaveError::Corrupt(format!("'{}' has a negative count {}", self.source, count))
        })?;
        if count as u64 * min_entry_size > self.remaining {
            return Err(SaveError::Corrupt(format!(
                "'{}' declares {} entries but only {} bytes follow",
                self.source, count, self.remaining
            )));
        }
        Ok(count)
    }

    fn expect_end(&self) -> Result<()> {
        if self.remaining > 0 {
            return Err(SaveError::Corrupt(format!(
                "'{}' has {} trailing bytes",
                self.source, self.remaining
            )));
        }
        Ok(())
    }
}

fn open(path: &Path) -> Result<BinaryReader<BufReader<File>>> {
    let file = File::open(path)
        .map_err(|e| SaveError::Io(format!("Failed to open '{}': {}", path.display(), e)))?;
    let len = file
        .metadata()
        .map_err(|e| SaveError::Io(format!("Failed to stat '{}': {}", path.display(), e)))?
        .len();
    Ok(BinaryReader::new(BufReader::new(file), path, len))
}

pub fn read_index<P: AsRef<Path>>(path: P) -> Result<Vec<IndexRecord>> {
    let mut reader = open(path.as_ref())?;
    let count = reader.read_count(INDEX_RECORD_SIZE as u64)?;
    let mut records = Vec::with_capacity(count);
    for _ in 0..count {
        let type_ref = TypeRef(reader.read_i32()?);
        let serial = Serial(reader.read_i32()?);
        let offset = reader.read_i64()?;
        let length = reader.read_i32()?;
        if offset < 0 || length < 0 {
            return Err(SaveError::Corrupt(format!(
                "record for {} has negative offset or length",
                serial
            )));
        }
        records.push(IndexRecord {
            type_ref,
            serial,
            offset: offset as u64,
            length: length as u32,
        });
    }
    reader.expect_end()?;
    Ok(records)
}

pub fn read_type_table<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let mut reader = open(path.as_ref())?;
    // An empty name still takes its one-byte length.
    let count = reader.read_count(1)?;
    let mut names = Vec::with_capacity(count);
    for _ in 0..count {
        names.push(reader.read_string()?);
    }
    reader.expect_end()?;
    Ok(names)
}

/// Reads the bytes `record` points at in the data file.
pub fn read_entity_bytes<P: AsRef<Path>>(data_path: P, record: &IndexRecord) -> Result<Vec<u8>> {
    let path = data_path.as_ref();
    let mut file = File::open(path)
        .map_err(|e| SaveError::Io(format!("Failed to open '{}': {}", path.display(), e)))?;
    let data_len = file
        .metadata()
        .map_err(|e| SaveError::Io(format!("Failed to stat '{}': {}", path.display(), e)))?
        .len();
    if record.data_range().end > data_len {
        return Err(SaveError::Corrupt(format!(
            "record for {} ends at {} but '{}' has {} bytes",
            record.serial,
            record.data_range().end,
            path.display(),
            data_len
        )));
    }
    file.seek(SeekFrom::Start(record.offset))?;
    let mut bytes = vec![0u8; record.length as usize];
    file.read_exact(&mut bytes).map_err(|e| {
        SaveError::Corrupt(format!(
            "record for {} runs past the end of '{}': {}",
            record.serial,
            path.display(),
            e
        ))
    })?;
    Ok(bytes)
}

// ============================================================================
// Triad Summary
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TriadSummary {
    pub category: EntityCategory,
    pub records: Vec<IndexRecord>,
    pub types: Option<Vec<String>>,
    pub data_len: u64,
}

impl TriadSummary {
    pub fn load(triad: &TriadPaths, category: EntityCategory) -> Result<Self> {
        let records = read_index(&triad.index)?;
        let types = triad.types.as_ref().map(read_type_table).transpose()?;
        let data_len = std::fs::metadata(&triad.data)
            .map_err(|e| SaveError::Io(format!("Failed to stat '{}': {}", triad.data.display(), e)))?
            .len();

        Ok(Self {
            category,
            records,
            types,
            data_len,
        })
    }

    pub fn entity_count(&self) -> usize {
        self.records.len()
    }

    pub fn type_name(&self, type_ref: TypeRef) -> Option<&str> {
        self.types
            .as_ref()
            .and_then(|types| types.get(type_ref.index()))
            .map(String::as_str)
    }

    /// Checks every record points inside the data file and, for typed
    /// categories, at a valid type table entry.
    pub fn verify(&self) -> Result<()> {
        for record in &self.records {
            if record.data_range().end > self.data_len {
                return Err(SaveError::Corrupt(format!(
                    "{} record for {} ends at {} but the data file has {} bytes",
                    self.category,
                    record.serial,
                    record.data_range().end,
                    self.data_len
                )));
            }
            if self.types.is_some() && self.type_name(record.type_ref).is_none() {
                return Err(SaveError::Corrupt(format!(
                    "{} record for {} references unknown type index {}",
                    self.category, record.serial, record.type_ref.0
                )));
            }
        }
        Ok(())
    }
}

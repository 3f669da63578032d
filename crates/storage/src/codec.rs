//! Row encoding
//!
//! The row format is picked once from configuration and held as a
//! `Box<dyn RowCodec>` for the lifetime of the backend.
//!
//! # Known Formats
//!
//! - `"single"`: all fields of a row in one value. Per field:
//!   `name_len: u32 LE | name | value_len: u32 LE | value`

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};
use strata_bench_core::{Error, Field, Result};

/// Encodes a row to bytes and back
pub trait RowCodec: Send + Sync + std::fmt::Debug {
    /// Configuration name of this format
    fn format(&self) -> &'static str;

    /// Encode all fields in order
    fn encode(&self, row: &[Field]) -> Result<Vec<u8>>;

    /// Decode every field
    fn decode(&self, data: &[u8]) -> Result<Vec<Field>>;

    /// Decode only the named fields, in stored order
    fn decode_filtered(&self, data: &[u8], fields: &[String]) -> Result<Vec<Field>> {
        let mut row = self.decode(data)?;
        row.retain(|f| fields.iter().any(|name| *name == f.name));
        Ok(row)
    }
}

/// Resolve a configured format name
///
/// # Errors
///
/// Returns [`Error::Config`] for an unknown format.
pub fn codec_for(format: &str) -> Result<Box<dyn RowCodec>> {
    match format {
        SingleRowCodec::FORMAT => Ok(Box::new(SingleRowCodec)),
        other => Err(Error::config(format!("unknown row format '{}'", other))),
    }
}

/// Whole row in one value with u32 length prefixes
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleRowCodec;

impl SingleRowCodec {
    /// Configuration name
    pub const FORMAT: &'static str = "single";
}

fn write_chunk(buf: &mut Vec<u8>, bytes: &[u8]) -> Result<()> {
    let len = u32::try_from(bytes.len())
        .map_err(|_| Error::backend(format!("field of {} bytes exceeds u32", bytes.len())))?;
    buf.write_u32::<LittleEndian>(len)?;
    buf.extend_from_slice(bytes);
    Ok(())
}

fn read_chunk(cursor: &mut Cursor<&[u8]>) -> Result<Vec<u8>> {
    let len = cursor
        .read_u32::<LittleEndian>()
        .map_err(|_| Error::Corruption("truncated length prefix".to_string()))?;
    let mut bytes = vec![0u8; len as usize];
    cursor
        .read_exact(&mut bytes)
        .map_err(|_| Error::Corruption(format!("truncated chunk of {} bytes", len)))?;
    Ok(bytes)
}

impl RowCodec for SingleRowCodec {
    fn format(&self) -> &'static str {
        Self::FORMAT
    }

    fn encode(&self, row: &[Field]) -> Result<Vec<u8>> {
        let size: usize = row.iter().map(|f| 8 + f.name.len() + f.value.len()).sum();
        let mut buf = Vec::with_capacity(size);
        for field in row {
            write_chunk(&mut buf, field.name.as_bytes())?;
            write_chunk(&mut buf, &field.value)?;
        }
        Ok(buf)
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<Field>> {
        let mut cursor = Cursor::new(data);
        let mut row = Vec::new();
        while (cursor.position() as usize) < data.len() {
            let name = String::from_utf8(read_chunk(&mut cursor)?)
                .map_err(|e| Error::Corruption(format!("field name not UTF-8: {}", e)))?;
            let value = read_chunk(&mut cursor)?;
            row.push(Field { name, value });
        }
        Ok(row)
    }
}

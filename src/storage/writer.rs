//! Byte sink contract shared by every save backend.
//!
//! Integers are little-endian. Strings are a 7-bit encoded byte length
//! followed by UTF-8, optionally preceded by a presence byte when the writer
//! was opened with `prefix_strings`.

use crate::core::{Result, Serial, TypeRef};
use chrono::{DateTime, Utc};

pub trait GenericWriter: Send {
    /// Number of bytes written so far, including bytes not yet on disk.
    fn position(&self) -> u64;

    /// Whether strings carry a leading presence byte.
    fn prefix_strings(&self) -> bool;

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Finalizes the writer. Sequential backends block until flushed,
    /// background backends hand the remaining bytes off and return.
    fn close(&mut self) -> Result<()>;

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(value as u8)
    }

    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_u64(&mut self, value: u64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// 7 bits per byte, high bit set on every byte except the last.
    fn write_encoded_int(&mut self, value: i32) -> Result<()> {
        let mut remaining = value as u32;
        while remaining >= 0x80 {
            self.write_u8((remaining as u8) | 0x80)?;
            remaining >>= 7;
        }
        self.write_u8(remaining as u8)
    }

    fn write_string(&mut self, value: Option<&str>) -> Result<()> {
        if self.prefix_strings() {
            match value {
                Some(text) => {
                    self.write_u8(1)?;
                    write_raw_string(self, text)
                }
                None => self.write_u8(0),
            }
        } else {
            write_raw_string(self, value.unwrap_or_default())
        }
    }

    /// Milliseconds since the Unix epoch.
    fn write_datetime(&mut self, value: DateTime<Utc>) -> Result<()> {
        self.write_i64(value.timestamp_millis())
    }

    fn write_serial(&mut self, serial: Serial) -> Result<()> {
        self.write_i32(serial.0)
    }

    fn write_type_ref(&mut self, type_ref: TypeRef) -> Result<()> {
        self.write_i32(type_ref.0)
    }
}

fn write_raw_string<W: GenericWriter + ?Sized>(writer: &mut W, text: &str) -> Result<()> {
    let len = i32::try_from(text.len()).map_err(|_| {
        crate::core::SaveError::Serialization(format!(
            "string of {} bytes is too long to encode",
            text.len()
        ))
    })?;
    writer.write_encoded_int(len)?;
    writer.write_bytes(text.as_bytes())
}

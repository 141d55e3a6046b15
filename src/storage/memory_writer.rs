use super::writer::GenericWriter;
use crate::core::{Result, SaveError};

/// In-memory writer, used to reproduce an entity's serialized form.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    buffer: Vec<u8>,
    prefix_strings: bool,
    closed: bool,
}

impl MemoryWriter {
    pub fn new(prefix_strings: bool) -> Self {
        Self {
            buffer: Vec::new(),
            prefix_strings,
            closed: false,
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buffer
    }
}

impl GenericWriter for MemoryWriter {
    fn position(&self) -> u64 {
        self.buffer.len() as u64
    }

    fn prefix_strings(&self) -> bool {
        self.prefix_strings
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.closed {
            return Err(SaveError::WriterClosed("<memory>".to_string()));
        }
        self.buffer.extend_from_slice(bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Serial;

    #[test]
    fn test_encoded_int_uses_seven_bit_groups() {
        let mut writer = MemoryWriter::new(false);
        writer.write_encoded_int(5).unwrap();
        writer.write_encoded_int(300).unwrap();
        assert_eq!(writer.as_bytes(), &[0x05, 0xAC, 0x02]);
    }

    #[test]
    fn test_negative_encoded_int_takes_five_bytes() {
        let mut writer = MemoryWriter::new(false);
        writer.write_encoded_int(-1).unwrap();
        assert_eq!(writer.as_bytes(), &[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]);
    }

    #[test]
    fn test_prefixed_strings_carry_presence_byte() {
        let mut writer = MemoryWriter::new(true);
        writer.write_string(Some("ab")).unwrap();
        writer.write_string(None).unwrap();
        assert_eq!(writer.as_bytes(), &[1, 2, b'a', b'b', 0]);
    }

    #[test]
    fn test_unprefixed_strings_are_length_and_bytes() {
        let mut writer = MemoryWriter::new(false);
        writer.write_string(Some("Server.Items.Gold")).unwrap();
        writer.write_string(None).unwrap();

        let bytes = writer.as_bytes();
        assert_eq!(bytes[0] as usize, "Server.Items.Gold".len());
        assert_eq!(&bytes[1..18], b"Server.Items.Gold");
        assert_eq!(bytes[18], 0);
        assert_eq!(bytes.len(), 19);
    }

    #[test]
    fn test_position_tracks_little_endian_writes() {
        let mut writer = MemoryWriter::new(false);
        writer.write_i32(1).unwrap();
        writer.write_serial(Serial(0x01020304)).unwrap();
        writer.write_i64(-2).unwrap();
        assert_eq!(writer.position(), 16);
        assert_eq!(&writer.as_bytes()[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_write_after_close_fails() {
        let mut writer = MemoryWriter::new(false);
        writer.close().unwrap();
        assert!(matches!(writer.write_u8(1), Err(SaveError::WriterClosed(_))));
    }
}

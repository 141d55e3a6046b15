use super::writer::GenericWriter;
use crate::core::{Result, SaveError};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

const FILE_BUFFER_SIZE: usize = 64 * 1024;

/// Sequential file writer. Every call runs on the caller's thread and
/// `close` returns only once the file has been synced.
pub struct BinaryFileWriter {
    path: PathBuf,
    file: Option<BufWriter<File>>,
    position: u64,
    prefix_strings: bool,
}

impl BinaryFileWriter {
    /// Creates (or truncates) the file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, prefix_strings: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| {
            SaveError::Io(format!("Failed to create '{}': {}", path.display(), e))
        })?;

        Ok(Self {
            path,
            file: Some(BufWriter::with_capacity(FILE_BUFFER_SIZE, file)),
            position: 0,
            prefix_strings,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl GenericWriter for BinaryFileWriter {
    fn position(&self) -> u64 {
        self.position
    }

    fn prefix_strings(&self) -> bool {
        self.prefix_strings
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| SaveError::WriterClosed(self.path.display().to_string()))?;
        file.write_all(bytes).map_err(|e| {
            SaveError::Io(format!("Failed to write '{}': {}", self.path.display(), e))
        })?;
        self.position += bytes.len() as u64;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.file.take() else {
            return Ok(());
        };
        file.flush().map_err(|e| {
            SaveError::Io(format!("Failed to flush '{}': {}", self.path.display(), e))
        })?;
        file.get_ref().sync_all().map_err(|e| {
            SaveError::Io(format!("Failed to sync '{}': {}", self.path.display(), e))
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_close_flushes_everything() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.bin");

        let mut writer = BinaryFileWriter::create(&path, true).unwrap();
        writer.write_i32(7).unwrap();
        writer.write_string(Some("hello")).unwrap();
        assert_eq!(writer.position(), 11);
        writer.close().unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 11);
        assert_eq!(&bytes[0..4], &7i32.to_le_bytes());
        assert_eq!(&bytes[4..6], &[1, 5]);
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("out.bin");
        std::fs::write(&path, vec![0xAA; 128]).unwrap();

        let mut writer = BinaryFileWriter::create(&path, false).unwrap();
        writer.write_u8(1).unwrap();
        writer.close().unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), vec![1]);
    }

    #[test]
    fn test_write_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut writer = BinaryFileWriter::create(temp_dir.path().join("x.bin"), false).unwrap();
        writer.close().unwrap();
        writer.close().unwrap();
        assert!(matches!(writer.write_i32(1), Err(SaveError::WriterClosed(_))));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = BinaryFileWriter::create(temp_dir.path().join("nope/x.bin"), false);
        assert!(matches!(result, Err(SaveError::Io(_))));
    }
}

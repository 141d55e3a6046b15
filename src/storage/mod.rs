pub mod async_writer;
pub mod file_writer;
pub mod index;
pub mod memory_writer;
pub mod paths;
pub mod writer;

pub use async_writer::{AsyncWriter, FlushContext, FlushHold, FlushTracker};
pub use file_writer::BinaryFileWriter;
pub use index::{
    INDEX_RECORD_SIZE, IndexRecord, TriadSummary, read_entity_bytes, read_index, read_type_table,
};
pub use memory_writer::MemoryWriter;
pub use paths::{SavePaths, TriadPaths};
pub use writer::GenericWriter;

use crate::core::Result;
use std::path::Path;

/// Backend selection for one save cycle. Every writer opened for a pass uses
/// the same mode.
#[derive(Clone)]
pub enum WriterMode {
    Sequential,
    Background(FlushContext),
}

impl WriterMode {
    pub fn is_background(&self) -> bool {
        matches!(self, WriterMode::Background(_))
    }

    pub fn open(&self, path: &Path, prefix_strings: bool) -> Result<Box<dyn GenericWriter>> {
        Ok(match self {
            WriterMode::Sequential => Box::new(BinaryFileWriter::create(path, prefix_strings)?),
            WriterMode::Background(context) => {
                Box::new(AsyncWriter::create(path, prefix_strings, context)?)
            }
        })
    }
}

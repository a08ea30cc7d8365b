use std::cell::RefCell;
use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::Path;

use bytes::{Bytes, BytesMut};
use tracing::debug;

use super::range_reader::{check_range, RangeReader};
use crate::error::IoError;

/// Range reader backed by a file on the local file system.
///
/// The handle is owned by the reader and closed when the reader is dropped,
/// so every exit path of a read operation releases it.
#[derive(Debug)]
pub struct FileRangeReader {
    file: RefCell<File>,
    size: u64,
    identifier: String,
}

impl FileRangeReader {
    /// Open `path` for reading.
    ///
    /// # Errors
    /// - `NotFound` if the path does not exist
    /// - `Read` for any other open or metadata failure
    pub fn open(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let path = path.as_ref();
        let identifier = format!("file://{}", path.display());

        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => IoError::NotFound(path.display().to_string()),
            _ => IoError::Read {
                source_id: identifier.clone(),
                message: e.to_string(),
            },
        })?;

        let size = file
            .metadata()
            .map_err(|e| IoError::Read {
                source_id: identifier.clone(),
                message: e.to_string(),
            })?
            .len();

        debug!(path = %path.display(), size, "opened file for reading");

        Ok(Self {
            file: RefCell::new(file),
            size,
            identifier,
        })
    }

    fn read_error(&self, e: std::io::Error) -> IoError {
        IoError::Read {
            source_id: self.identifier.clone(),
            message: e.to_string(),
        }
    }
}

impl RangeReader for FileRangeReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, IoError> {
        check_range(offset, len, self.size)?;

        let mut file = self.file.borrow_mut();
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| self.read_error(e))?;

        let mut buf = BytesMut::zeroed(len);
        file.read_exact(&mut buf).map_err(|e| self.read_error(e))?;
        Ok(buf.freeze())
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

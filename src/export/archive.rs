use std::io::{Cursor, Write};

use serde::{Deserialize, Serialize};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::ExportError;

/// Compression used for archive entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveCompression {
    #[default]
    Deflated,
    Stored,
}

impl ArchiveCompression {
    fn method(self) -> zip::CompressionMethod {
        match self {
            Self::Deflated => zip::CompressionMethod::Deflated,
            Self::Stored => zip::CompressionMethod::Stored,
        }
    }
}

/// Sink for exported files: `write` entries, then `finalize` into bytes.
pub trait ArchiveWriter {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<(), ExportError>;

    fn finalize(self) -> Result<Vec<u8>, ExportError>
    where
        Self: Sized;
}

/// In-memory zip archive.
pub struct ZipArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: SimpleFileOptions,
}

impl ZipArchiveWriter {
    pub fn new(compression: ArchiveCompression) -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: SimpleFileOptions::default().compression_method(compression.method()),
        }
    }
}

impl Default for ZipArchiveWriter {
    fn default() -> Self {
        Self::new(ArchiveCompression::default())
    }
}

impl ArchiveWriter for ZipArchiveWriter {
    fn write(&mut self, path: &str, bytes: &[u8]) -> Result<(), ExportError> {
        self.zip.start_file(path, self.options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    fn finalize(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.zip.finish()?.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn stored_and_deflated_entries_read_back() {
        for compression in [ArchiveCompression::Deflated, ArchiveCompression::Stored] {
            let mut writer = ZipArchiveWriter::new(compression);
            writer.write("sub/b.png", b"png-bytes").unwrap();
            let bytes = writer.finalize().unwrap();
            let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
            assert_eq!(archive.len(), 1);
            let mut entry = archive.by_name("sub/b.png").unwrap();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            assert_eq!(content, b"png-bytes");
        }
    }
}

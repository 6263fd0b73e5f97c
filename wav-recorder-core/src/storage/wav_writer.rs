use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::models::error::CaptureError;
use crate::processing::wav_format::{self, WavHeader};

/// Sequential writer for one WAV file.
///
/// The header is written first, with its final sizes, followed by the sample
/// data; nothing is ever seeked back or patched.
///
/// ## File Format
/// ```text
/// [44-byte WAV header]
/// [raw interleaved PCM data...]
/// ```
pub struct WavFileWriter {
    file_path: PathBuf,
    file: Option<BufWriter<File>>,
    hasher: Sha256,
    header: Option<WavHeader>,
    data_written: u64,
}

impl WavFileWriter {
    /// Create (or truncate) the file at `file_path`, creating missing parent
    /// directories.
    pub fn create(file_path: impl Into<PathBuf>) -> Result<Self, CaptureError> {
        let file_path = file_path.into();
        if let Some(parent) = file_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CaptureError::StorageError(format!("failed to create directory: {}", e)))?;
        }

        let file = File::create(&file_path)
            .map_err(|e| CaptureError::StorageError(format!("failed to open output file: {}", e)))?;
        log::debug!("opened {}", file_path.display());

        Ok(Self {
            file_path,
            file: Some(BufWriter::new(file)),
            hasher: Sha256::new(),
            header: None,
            data_written: 0,
        })
    }

    pub fn write_header(&mut self, header: &WavHeader) -> Result<(), CaptureError> {
        if self.header.is_some() {
            return Err(CaptureError::StorageError("WAV header already written".into()));
        }
        let bytes = header.to_bytes();
        let file = self.file_mut()?;
        wav_format::write_header(
            file,
            header.format().sample_rate,
            header.format().bits_per_sample,
            header.format().channels,
            header.data_size(),
        )?;
        self.hasher.update(bytes);
        self.header = Some(*header);
        Ok(())
    }

    /// Append sample data. The header must already be written and the total
    /// may not exceed the size it declares.
    pub fn write_data(&mut self, data: &[u8]) -> Result<(), CaptureError> {
        let Some(header) = self.header else {
            return Err(CaptureError::StorageError("data written before WAV header".into()));
        };
        let total = self.data_written + data.len() as u64;
        if total > header.data_size() as u64 {
            return Err(CaptureError::StorageError(format!(
                "{} bytes of data exceed the {} declared in the header",
                total, header.data_size()
            )));
        }
        let file = self.file_mut()?;
        wav_format::write_data(file, data)?;
        self.hasher.update(data);
        self.data_written = total;
        Ok(())
    }

    /// Flush and sync the file, returning the SHA-256 hex digest of its
    /// contents.
    pub fn finish(mut self) -> Result<String, CaptureError> {
        let Some(header) = self.header else {
            return Err(CaptureError::StorageError("WAV header never written".into()));
        };
        if self.data_written != header.data_size() as u64 {
            return Err(CaptureError::StorageError(format!(
                "wrote {} data bytes but header declares {}",
                self.data_written, header.data_size()
            )));
        }

        let writer = self
            .file
            .take()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))?;
        let file = writer
            .into_inner()
            .map_err(|e| CaptureError::StorageError(format!("flush failed: {}", e.error())))?;
        file.sync_all()
            .map_err(|e| CaptureError::StorageError(format!("sync failed: {}", e)))?;

        log::debug!("closed {} after {} data bytes", self.file_path.display(), self.data_written);
        let digest = self.hasher.finalize();
        Ok(hex_encode(&digest))
    }

    /// Bytes of sample data written so far.
    pub fn data_written(&self) -> u64 {
        self.data_written
    }

    fn file_mut(&mut self) -> Result<&mut BufWriter<File>, CaptureError> {
        self.file
            .as_mut()
            .ok_or_else(|| CaptureError::StorageError("file is not open".into()))
    }
}

/// Write a complete WAV file in one pass: header, then `data`.
///
/// On failure the partially written file is removed so no file with a
/// mismatched header is left behind.
pub fn write_wav_file(path: &Path, header: &WavHeader, data: &[u8]) -> Result<String, CaptureError> {
    let writer = WavFileWriter::create(path)?;
    let result = write_parts(writer, header, data);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            log::warn!("failed to remove partial file {}: {}", path.display(), e);
        }
    }
    result
}

fn write_parts(mut writer: WavFileWriter, header: &WavHeader, data: &[u8]) -> Result<String, CaptureError> {
    writer.write_header(header)?;
    writer.write_data(data)?;
    writer.finish()
}

/// Compute the SHA-256 hex digest of a file on disk.
pub fn sha256_file(path: &Path) -> Result<String, CaptureError> {
    let data = fs::read(path)
        .map_err(|e| CaptureError::StorageError(format!("failed to read file for checksum: {}", e)))?;
    Ok(hex_encode(&Sha256::digest(&data)))
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

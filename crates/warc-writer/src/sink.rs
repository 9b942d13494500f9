//! Byte-sink capability for serialized records
//!
//! The writer never touches files directly. It asks a [`SinkFactory`] for a
//! [`ByteSink`] per output file and hands records to it. [`FileSink`] is the
//! on-disk adapter for plain and gzip output.

use crate::config::{CompressionMode, WarcConfig};
use crate::record::WarcRecord;
use crate::{Result, WarcError};
use flate2::Compression;
use flate2::write::GzEncoder;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Destination for serialized records of one output file
pub trait ByteSink: Send {
    /// Serialize and append one record.
    fn write_record(&mut self, record: WarcRecord) -> Result<()>;

    /// True once the sink has reached its size threshold.
    fn is_full(&self) -> bool;

    /// Bytes appended so far, as stored (compressed when compressing).
    fn bytes_written(&self) -> u64;

    /// Flush and release the underlying handle. Idempotent.
    fn finalize(&mut self) -> Result<()>;
}

/// Opens a sink for each new output file
pub trait SinkFactory: Send {
    /// Create the sink for `path`.
    fn open(&self, path: &Path, config: &WarcConfig) -> Result<Box<dyn ByteSink>>;
}

/// Factory for [`FileSink`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct FileSinkFactory;

impl SinkFactory for FileSinkFactory {
    fn open(&self, path: &Path, config: &WarcConfig) -> Result<Box<dyn ByteSink>> {
        let sink = FileSink::create(path, config.compression_mode(), config.max_size)?;
        Ok(Box::new(sink))
    }
}

/// Plain or gzip WARC file on disk
///
/// With gzip compression every record becomes its own gzip member, so the
/// file can be read with any multi-member gzip decoder and records can be
/// located by member offset.
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    compression: CompressionMode,
    max_size: u64,
    bytes_written: u64,
    poisoned: bool,
}

impl FileSink {
    /// Create (or truncate) the file at `path`.
    pub fn create(path: &Path, compression: CompressionMode, max_size: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|source| WarcError::Open {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("Opened WARC sink {} ({:?})", path.display(), compression);

        Ok(Self {
            path: path.to_path_buf(),
            writer: Some(BufWriter::new(file)),
            compression,
            max_size,
            bytes_written: 0,
            poisoned: false,
        })
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the bytes handed to the file alongside the outcome, so a
    /// failed record is still counted.
    fn append(
        writer: &mut BufWriter<File>,
        compression: CompressionMode,
        record: WarcRecord,
    ) -> (u64, Result<()>) {
        let mut counter = CountingWriter::new(writer);
        let result = match compression {
            CompressionMode::None => record.write_to(&mut counter).map(|_| ()),
            CompressionMode::Gzip => {
                let mut encoder = GzEncoder::new(&mut counter, Compression::best());
                record
                    .write_to(&mut encoder)
                    .and_then(|_| encoder.try_finish().map_err(WarcError::Write))
            }
        };
        let result = result.and_then(|()| counter.flush().map_err(WarcError::Write));
        (counter.count, result)
    }
}

impl ByteSink for FileSink {
    fn write_record(&mut self, record: WarcRecord) -> Result<()> {
        if self.poisoned {
            return Err(WarcError::Write(io::Error::other(format!(
                "{} is unusable after an earlier failed write",
                self.path.display()
            ))));
        }
        let writer = self.writer.as_mut().ok_or_else(|| {
            WarcError::Write(io::Error::other(format!(
                "{} is already finalized",
                self.path.display()
            )))
        })?;

        let (count, result) = Self::append(writer, self.compression, record);
        self.bytes_written += count;
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }

    fn is_full(&self) -> bool {
        self.max_size > 0 && self.bytes_written >= self.max_size
    }

    fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn finalize(&mut self) -> Result<()> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        if self.poisoned {
            warn!(
                "Releasing {} after a failed write; the last record may be truncated",
                self.path.display()
            );
            return Ok(());
        }

        writer.flush().map_err(WarcError::Write)?;
        writer.get_ref().sync_all().map_err(WarcError::Write)?;
        debug!(
            "Finalized WARC sink {} ({} bytes)",
            self.path.display(),
            self.bytes_written
        );
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take()
            && !self.poisoned
            && let Err(e) = writer.flush()
        {
            warn!("Failed to flush {} on drop: {e}", self.path.display());
        }
    }
}

/// Counts bytes passed through to the inner writer
struct CountingWriter<'a, W: Write> {
    inner: &'a mut W,
    count: u64,
}

impl<'a, W: Write> CountingWriter<'a, W> {
    const fn new(inner: &'a mut W) -> Self {
        Self { inner, count: 0 }
    }
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

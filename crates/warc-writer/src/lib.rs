//! Sequential WARC (ISO 28500) archive writer.
//!
//! This crate manages the lifecycle of one or more rotating WARC output
//! files. A single logical writer owns the current file, writes the
//! `warcinfo` record that opens every file, and stamps each subsequent
//! record with that record's identifier:
//!
//! - **Timestamps**: [`timestamp::warc_timestamp`] formats `WARC-Date` values
//! - **Record identifiers**: [`RecordId`] produces `<urn:uuid:...>` values
//! - **Scratch storage**: [`scratch::warc_tempfile`] buffers record bodies
//! - **Records**: [`WarcRecord`] is one record prior to serialization
//! - **Writer**: [`WarcWriter`] rotates files and stores records
//!
//! # File naming
//!
//! Without a size limit the writer produces `<base>.warc` (or
//! `<base>.warc.gz`). With a size limit every file carries a five digit
//! serial number starting at `00000`: `<base>-00000.warc.gz`,
//! `<base>-00001.warc.gz`, and so on.
//!
//! # Example
//!
//! ```rust,ignore
//! use warc_writer::{WarcConfig, WarcRecord, WarcWriter};
//!
//! # fn example() -> warc_writer::Result<()> {
//! let config = WarcConfig::new("crawl").with_compression(true);
//! let mut writer = WarcWriter::new(config);
//! writer.initialize()?;
//!
//! writer.store_record(WarcRecord::resource("https://example.com/", "hello"))?;
//! writer.close()?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![allow(clippy::must_use_candidate)]

use std::path::PathBuf;
use thiserror::Error;

// Writer configuration
pub mod config;

// WARC-Date formatting
pub mod timestamp;

// WARC-Record-ID generation
pub mod record_id;

// Anonymous scratch files for record bodies
pub mod scratch;

// In-memory records and their serialization
pub mod record;

// Byte-sink capability and the file adapter
pub mod sink;

// The archive file writer
pub mod writer;

// Mutex-guarded writer for threaded producers
pub mod shared;

// Writer thread fed by async producers
pub mod actor;

// Test utilities module
#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
pub(crate) mod test_utils;

pub use actor::{WriterHandle, spawn_writer};
pub use config::{CompressionMode, WarcConfig};
pub use record::{ContentSource, RecordType, WarcRecord};
pub use record_id::RecordId;
pub use shared::SharedWarcWriter;
pub use sink::{ByteSink, FileSink, FileSinkFactory, SinkFactory};
pub use writer::{WarcWriter, WriterState};

/// Result type for WARC writer operations.
pub type Result<T> = std::result::Result<T, WarcError>;

/// Errors that can occur while writing WARC files.
#[derive(Debug, Error)]
pub enum WarcError {
    /// The output file could not be created.
    #[error("Failed to open WARC file {}: {source}", path.display())]
    Open {
        /// Path of the file that could not be created.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Opening the next file, or writing its warcinfo record, failed.
    #[error("WARC file rotation failed: {0}")]
    Rotation(#[source] Box<WarcError>),

    /// Serializing or appending a record to an open file failed.
    #[error("Failed to write WARC record: {0}")]
    Write(#[source] std::io::Error),

    /// A record was submitted while no file is open.
    #[error("No WARC file is open")]
    NoOpenFile,

    /// Scratch storage is unavailable.
    #[error("Temporary file unavailable: {0}")]
    TempFile(String),

    /// Rotating would reopen, and truncate, a file this writer already
    /// produced. Happens when size-based rotation is disabled.
    #[error("Refusing to overwrite WARC file {}", .0.display())]
    WouldOverwrite(PathBuf),

    /// Every file serial number has been used.
    #[error("WARC file serial numbers exhausted")]
    SerialExhausted,

    /// Archiving is disabled (no base path, or initialization failed).
    #[error("WARC archiving is disabled")]
    Disabled,

    /// A streamed content source did not match its declared length.
    #[error("Content length mismatch: declared {expected} bytes, source provided {actual}")]
    ContentLength {
        /// Length declared when the content source was attached.
        expected: u64,
        /// Bytes actually read from the source.
        actual: u64,
    },

    /// The writer thread has shut down.
    #[error("WARC writer is no longer running")]
    WriterUnavailable,
}

/// Version of this crate, used as the default software version in the
/// warcinfo record.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WARC format version line written at the top of every record.
pub const WARC_VERSION: &str = "WARC/1.0";

/// Content type of the warcinfo record body.
pub const WARC_FIELDS_CONTENT_TYPE: &str = "application/warc-fields";

/// Reference written to the `conformsTo` field of the warcinfo record.
pub const CONFORMS_TO: &str = "http://bibnum.bnf.fr/WARC/WARC_ISO_28500_version1_latestdraft.pdf";

/// Prefix used for scratch files in the temp directory.
pub const TEMPFILE_PREFIX: &str = ".warc_";

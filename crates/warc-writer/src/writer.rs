//! The archive file writer
//!
//! [`WarcWriter`] owns the current output file. It opens files, writes the
//! warcinfo record that starts each of them, rotates to a new file once the
//! size limit is reached, and stamps every stored record with the warcinfo
//! identifier of the file it lands in.
//!
//! The writer is a plain owned value with `&mut self` operations, so store
//! and rotate can never interleave. Share it between threads with
//! [`crate::SharedWarcWriter`] or between async tasks with
//! [`crate::spawn_writer`].

use crate::config::WarcConfig;
use crate::record::WarcRecord;
use crate::record_id::RecordId;
use crate::scratch::warc_tempfile;
use crate::sink::{ByteSink, FileSinkFactory, SinkFactory};
use crate::{CONFORMS_TO, Result, WarcError};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Lifecycle state of a [`WarcWriter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterState {
    /// No file has been opened yet
    Uninitialized,
    /// A file is open and accepting records
    Open,
    /// No file is open: the writer was closed, or a rotation failed
    Closed,
    /// Archiving is off, either by configuration or after a failed
    /// initialization
    Disabled,
}

/// The file currently being written
struct ActiveFile {
    path: PathBuf,
    serial: u32,
    sink: Box<dyn ByteSink>,
    warcinfo_id: RecordId,
    records: u64,
}

/// Sequential WARC writer with size-based rotation
pub struct WarcWriter {
    config: WarcConfig,
    factory: Box<dyn SinkFactory>,
    enabled: bool,
    /// Serial of the most recently opened file; `None` before the first.
    serial: Option<u32>,
    current: Option<ActiveFile>,
    opened_any: bool,
    files_opened: Vec<PathBuf>,
}

impl WarcWriter {
    /// Create a writer that writes files to disk.
    pub fn new(config: WarcConfig) -> Self {
        Self::with_sink_factory(config, FileSinkFactory)
    }

    /// Create a writer that opens its files through `factory`.
    pub fn with_sink_factory(config: WarcConfig, factory: impl SinkFactory + 'static) -> Self {
        Self {
            enabled: config.is_enabled(),
            config,
            factory: Box::new(factory),
            serial: None,
            current: None,
            opened_any: false,
            files_opened: Vec::new(),
        }
    }

    /// Open the first file.
    ///
    /// Does nothing when no base path is configured, or when a file has
    /// already been opened. If the first file cannot be opened the failure
    /// is logged once, archiving is disabled for the rest of the run, and
    /// the error is returned for the caller to report.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state() {
            WriterState::Uninitialized => {}
            WriterState::Open | WriterState::Closed => {
                warn!("WARC writer is already initialized");
                return Ok(());
            }
            WriterState::Disabled if self.config.is_enabled() => {
                return Err(WarcError::Disabled);
            }
            WriterState::Disabled => {
                debug!("WARC archiving not configured");
                return Ok(());
            }
        }

        self.serial = None;

        if let Err(e) = self.rotate() {
            error!("Could not open WARC file, archiving disabled: {e}");
            self.enabled = false;
            return Err(e);
        }
        Ok(())
    }

    /// Close the current file (if any) and open the next one.
    ///
    /// The new file starts with a warcinfo record whose identifier is
    /// stamped on every record stored afterwards. On failure no file is
    /// left open, except that a rotation refused up front (rotation
    /// disabled, serials exhausted) leaves the current file untouched.
    ///
    /// Without a size limit every file has the same name, so only the
    /// first file can be opened; later calls fail with
    /// [`WarcError::WouldOverwrite`].
    pub fn rotate(&mut self) -> Result<()> {
        if !self.enabled {
            return Err(WarcError::Disabled);
        }

        let serial = match self.serial {
            None => 0,
            Some(s) => s.checked_add(1).ok_or(WarcError::SerialExhausted)?,
        };

        if self.opened_any && !self.config.rotation_enabled() {
            let path = self.config.file_name_for(serial).unwrap_or_default();
            error!(
                "Refusing to reopen {} without size-based rotation",
                path.display()
            );
            return Err(WarcError::WouldOverwrite(path));
        }

        self.finish_current();
        self.serial = Some(serial);

        let path = self
            .config
            .file_name_for(serial)
            .ok_or(WarcError::Disabled)?;

        let mut sink = self.factory.open(&path, &self.config).map_err(|e| {
            error!("Error opening WARC file {}: {e}", path.display());
            WarcError::Rotation(Box::new(e))
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let warcinfo = WarcRecord::warcinfo(filename, self.warcinfo_fields());
        let warcinfo_id = warcinfo.record_id().clone();

        if let Err(e) = sink.write_record(warcinfo) {
            error!("Error writing warcinfo record to {}: {e}", path.display());
            if let Err(fe) = sink.finalize() {
                warn!("Failed to release {}: {fe}", path.display());
            }
            return Err(WarcError::Rotation(Box::new(e)));
        }

        info!(
            "Opened WARC file {} (serial {serial}, warcinfo {warcinfo_id})",
            path.display()
        );

        self.opened_any = true;
        self.files_opened.push(path.clone());
        self.current = Some(ActiveFile {
            path,
            serial,
            sink,
            warcinfo_id,
            records: 1,
        });
        Ok(())
    }

    /// Store one record in the current file, rotating first if the file
    /// has reached its size limit.
    ///
    /// The record is consumed either way. After a failed write its content
    /// has been partially appended and it cannot be resubmitted.
    pub fn store_record(&mut self, mut record: WarcRecord) -> Result<()> {
        let rotate_due = match &self.current {
            None => {
                error!("Called store_record without an open WARC file");
                return Err(WarcError::NoOpenFile);
            }
            Some(file) => self.config.rotation_enabled() && file.sink.is_full(),
        };

        if rotate_due {
            debug!("WARC file reached {} bytes, rotating", self.config.max_size);
            self.rotate().inspect_err(|e| {
                error!("Could not open new WARC file: {e}");
            })?;
        }

        let file = self.current.as_mut().ok_or(WarcError::NoOpenFile)?;

        // Always the current file's warcinfo, never one cached by a producer.
        record.set_warcinfo_id(file.warcinfo_id.clone());
        let record_id = record.record_id().clone();
        let record_type = record.record_type();

        file.sink.write_record(record).inspect_err(|e| {
            error!("Error writing record to {}: {e}", file.path.display());
        })?;
        file.records += 1;

        debug!(
            "Stored {record_type} record {record_id} in {} ({} bytes)",
            file.path.display(),
            file.sink.bytes_written()
        );
        Ok(())
    }

    /// Finalize and release the current file. Does nothing when no file is
    /// open.
    pub fn close(&mut self) -> Result<()> {
        let Some(mut file) = self.current.take() else {
            return Ok(());
        };

        file.sink.finalize()?;
        info!(
            "Closed WARC file {} ({} records, {} bytes)",
            file.path.display(),
            file.records,
            file.sink.bytes_written()
        );
        Ok(())
    }

    /// Create a scratch file in the configured temp directory.
    pub fn tempfile(&self) -> Result<File> {
        warc_tempfile(self.config.temp_dir.as_deref())
    }

    /// Current lifecycle state
    pub const fn state(&self) -> WriterState {
        if !self.enabled {
            WriterState::Disabled
        } else if self.current.is_some() {
            WriterState::Open
        } else if self.opened_any {
            WriterState::Closed
        } else {
            WriterState::Uninitialized
        }
    }

    /// True while archiving has not been disabled
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Configuration this writer was created with
    pub const fn config(&self) -> &WarcConfig {
        &self.config
    }

    /// Path of the open file
    pub fn current_path(&self) -> Option<&Path> {
        self.current.as_ref().map(|file| file.path.as_path())
    }

    /// Serial number of the open file
    pub fn current_serial(&self) -> Option<u32> {
        self.current.as_ref().map(|file| file.serial)
    }

    /// Identifier of the open file's warcinfo record
    pub fn warcinfo_id(&self) -> Option<&RecordId> {
        self.current.as_ref().map(|file| &file.warcinfo_id)
    }

    /// Records written to the open file, warcinfo included
    pub fn records_in_current_file(&self) -> u64 {
        self.current.as_ref().map_or(0, |file| file.records)
    }

    /// Every file opened by this writer, in order
    pub fn files_opened(&self) -> &[PathBuf] {
        &self.files_opened
    }

    fn finish_current(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to finalize previous WARC file: {e}");
        }
    }

    fn warcinfo_fields(&self) -> String {
        let config = &self.config;
        format!(
            "software: {name}/{version} ({os})\r\n\
             format: WARC File Format 1.0\r\n\
             conformsTo: {CONFORMS_TO}\r\n\
             robots: {robots}\r\n\
             {key}-arguments: {args}\r\n\
             \r\n",
            name = config.software_name,
            version = config.software_version,
            os = std::env::consts::OS,
            robots = config.robots_mode(),
            key = config.software_name.to_lowercase(),
            args = config.arguments,
        )
    }
}

impl Drop for WarcWriter {
    fn drop(&mut self) {
        if self.current.is_some() {
            self.finish_current();
        }
    }
}

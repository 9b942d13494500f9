//! WARC records prior to serialization
//!
//! A [`WarcRecord`] is assembled by a producer, handed to the writer by
//! value, and consumed when it is serialized. Record construction touches
//! no shared state, so producers may build records in parallel.

use crate::record_id::RecordId;
use crate::timestamp::warc_timestamp;
use crate::{Result, WARC_FIELDS_CONTENT_TYPE, WARC_VERSION, WarcError};
use bytes::Bytes;
use std::fmt::{self, Write as _};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// WARC record types defined by ISO 28500
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// Describes the records that follow it in the same file
    Warcinfo,
    /// Full response from a target server
    Response,
    /// Resource without full protocol response information
    Resource,
    /// Request as sent to a target server
    Request,
    /// Metadata about another record
    Metadata,
    /// Revisit of previously archived content
    Revisit,
    /// Alternative version of another record's content
    Conversion,
    /// Continuation of a segmented record
    Continuation,
}

impl RecordType {
    /// Value of the `WARC-Type` header
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Warcinfo => "warcinfo",
            Self::Response => "response",
            Self::Resource => "resource",
            Self::Request => "request",
            Self::Metadata => "metadata",
            Self::Revisit => "revisit",
            Self::Conversion => "conversion",
            Self::Continuation => "continuation",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of a record: an in-memory buffer or a stream of known length.
pub enum ContentSource {
    /// In-memory content
    Bytes(Bytes),
    /// Readable stream that yields exactly `length` bytes
    Stream {
        /// Content reader, consumed on serialization
        reader: Box<dyn Read + Send>,
        /// Number of bytes the reader yields
        length: u64,
    },
}

impl ContentSource {
    /// Use an open file as content, e.g. a scratch file from
    /// [`crate::scratch::warc_tempfile`].
    ///
    /// The length is taken from the file's metadata and the file is
    /// rewound to offset 0. The file is closed when the record is
    /// serialized or dropped.
    pub fn from_file(mut file: File) -> io::Result<Self> {
        let length = file.metadata()?.len();
        file.seek(SeekFrom::Start(0))?;
        Ok(Self::Stream {
            reader: Box::new(file),
            length,
        })
    }

    /// Open the file at `path` and use it as content.
    pub fn from_path<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        Self::from_file(File::open(path)?)
    }

    /// Content length in bytes
    pub fn len(&self) -> u64 {
        match self {
            Self::Bytes(bytes) => bytes.len() as u64,
            Self::Stream { length, .. } => *length,
        }
    }

    /// True when the content is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream { length, .. } => {
                f.debug_struct("Stream").field("length", length).finish()
            }
        }
    }
}

impl Default for ContentSource {
    fn default() -> Self {
        Self::Bytes(Bytes::new())
    }
}

impl From<Bytes> for ContentSource {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for ContentSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static str> for ContentSource {
    fn from(text: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl From<String> for ContentSource {
    fn from(text: String) -> Self {
        Self::Bytes(Bytes::from(text))
    }
}

/// One WARC record
#[derive(Debug)]
pub struct WarcRecord {
    record_type: RecordType,
    target_uri: Option<String>,
    content_type: Option<String>,
    date: String,
    record_id: RecordId,
    filename: Option<String>,
    concurrent_to: Option<RecordId>,
    warcinfo_id: Option<RecordId>,
    content: ContentSource,
}

impl WarcRecord {
    /// Create an empty record of the given type, dated now, with a fresh
    /// identifier.
    pub fn new(record_type: RecordType) -> Self {
        Self {
            record_type,
            target_uri: None,
            content_type: None,
            date: warc_timestamp(),
            record_id: RecordId::generate(),
            filename: None,
            concurrent_to: None,
            warcinfo_id: None,
            content: ContentSource::default(),
        }
    }

    /// A warcinfo record for the file named `filename`
    pub fn warcinfo(filename: impl Into<String>, fields: impl Into<ContentSource>) -> Self {
        Self::new(RecordType::Warcinfo)
            .with_content_type(WARC_FIELDS_CONTENT_TYPE)
            .with_filename(filename)
            .with_content(fields)
    }

    /// An HTTP request record
    pub fn request(target_uri: impl Into<String>, content: impl Into<ContentSource>) -> Self {
        Self::new(RecordType::Request)
            .with_target_uri(target_uri)
            .with_content_type("application/http;msgtype=request")
            .with_content(content)
    }

    /// An HTTP response record
    pub fn response(target_uri: impl Into<String>, content: impl Into<ContentSource>) -> Self {
        Self::new(RecordType::Response)
            .with_target_uri(target_uri)
            .with_content_type("application/http;msgtype=response")
            .with_content(content)
    }

    /// A resource record; set the content type with [`Self::with_content_type`]
    pub fn resource(target_uri: impl Into<String>, content: impl Into<ContentSource>) -> Self {
        Self::new(RecordType::Resource)
            .with_target_uri(target_uri)
            .with_content(content)
    }

    /// A metadata record in `application/warc-fields` form
    pub fn metadata(target_uri: impl Into<String>, fields: impl Into<ContentSource>) -> Self {
        Self::new(RecordType::Metadata)
            .with_target_uri(target_uri)
            .with_content_type(WARC_FIELDS_CONTENT_TYPE)
            .with_content(fields)
    }

    /// Set the `WARC-Target-URI`
    #[must_use]
    pub fn with_target_uri(mut self, uri: impl Into<String>) -> Self {
        self.target_uri = Some(uri.into());
        self
    }

    /// Set the `Content-Type`
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Override the `WARC-Date`
    #[must_use]
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = date.into();
        self
    }

    /// Override the generated `WARC-Record-ID`
    #[must_use]
    pub fn with_record_id(mut self, id: RecordId) -> Self {
        self.record_id = id;
        self
    }

    /// Set the `WARC-Filename` (meaningful on warcinfo records only)
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Link this record to another captured in the same transaction
    #[must_use]
    pub fn with_concurrent_to(mut self, id: &RecordId) -> Self {
        self.concurrent_to = Some(id.clone());
        self
    }

    /// Replace the record body
    #[must_use]
    pub fn with_content(mut self, content: impl Into<ContentSource>) -> Self {
        self.content = content.into();
        self
    }

    /// Record type
    pub const fn record_type(&self) -> RecordType {
        self.record_type
    }

    /// Record identifier
    pub const fn record_id(&self) -> &RecordId {
        &self.record_id
    }

    /// Target URI, if any
    pub fn target_uri(&self) -> Option<&str> {
        self.target_uri.as_deref()
    }

    /// WARC-Date value
    pub fn date(&self) -> &str {
        &self.date
    }

    /// Identifier of the warcinfo record this record was stored under.
    ///
    /// Only the writer assigns this.
    pub const fn warcinfo_id(&self) -> Option<&RecordId> {
        self.warcinfo_id.as_ref()
    }

    /// Content length in bytes
    pub fn content_length(&self) -> u64 {
        self.content.len()
    }

    pub(crate) fn set_warcinfo_id(&mut self, id: RecordId) {
        self.warcinfo_id = Some(id);
    }

    /// Render the header block, including the blank line that ends it.
    pub fn header_block(&self) -> String {
        let mut out = String::with_capacity(512);
        // Writing to a String never fails.
        let _ = self.write_header_block(&mut out);
        out
    }

    fn write_header_block(&self, out: &mut String) -> fmt::Result {
        write!(out, "{WARC_VERSION}\r\n")?;
        write!(out, "WARC-Type: {}\r\n", self.record_type)?;
        if let Some(uri) = &self.target_uri {
            write!(out, "WARC-Target-URI: {uri}\r\n")?;
        }
        write!(out, "WARC-Date: {}\r\n", self.date)?;
        write!(out, "WARC-Record-ID: {}\r\n", self.record_id)?;
        if let Some(filename) = &self.filename {
            write!(out, "WARC-Filename: {filename}\r\n")?;
        }
        if let Some(id) = &self.concurrent_to {
            write!(out, "WARC-Concurrent-To: {id}\r\n")?;
        }
        if let Some(id) = &self.warcinfo_id {
            write!(out, "WARC-Warcinfo-ID: {id}\r\n")?;
        }
        if let Some(content_type) = &self.content_type {
            write!(out, "Content-Type: {content_type}\r\n")?;
        }
        write!(out, "Content-Length: {}\r\n", self.content.len())?;
        out.write_str("\r\n")
    }

    /// Serialize the record to `out`, consuming its content source.
    ///
    /// Returns the number of bytes written. A stream that ends before its
    /// declared length fails with [`WarcError::ContentLength`]; whatever was
    /// written up to that point stays written.
    pub fn write_to<W: Write + ?Sized>(self, out: &mut W) -> Result<u64> {
        let header = self.header_block();
        out.write_all(header.as_bytes()).map_err(WarcError::Write)?;

        let body_len = match self.content {
            ContentSource::Bytes(bytes) => {
                out.write_all(&bytes).map_err(WarcError::Write)?;
                bytes.len() as u64
            }
            ContentSource::Stream { reader, length } => {
                let copied = io::copy(&mut reader.take(length), out).map_err(WarcError::Write)?;
                if copied != length {
                    return Err(WarcError::ContentLength {
                        expected: length,
                        actual: copied,
                    });
                }
                copied
            }
        };

        out.write_all(b"\r\n\r\n").map_err(WarcError::Write)?;
        Ok(header.len() as u64 + body_len + 4)
    }
}

//! Test utilities for writer tests
//!
//! An in-memory sink factory with failure injection, and a minimal WARC
//! reader used to check what the writer produced.

use crate::config::WarcConfig;
use crate::record::WarcRecord;
use crate::sink::{ByteSink, SinkFactory};
use crate::{Result, WarcError};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Bytes captured for one opened file
#[derive(Debug, Clone, Default)]
pub struct CapturedFile {
    pub path: PathBuf,
    pub data: Vec<u8>,
    pub finalized: bool,
}

/// Shared view of everything a [`MemorySinkFactory`] produced
#[derive(Debug, Clone, Default)]
pub struct Captured {
    files: Arc<Mutex<Vec<CapturedFile>>>,
    pub fail_open: Arc<AtomicBool>,
    pub fail_write: Arc<AtomicBool>,
}

impl Captured {
    pub fn files(&self) -> Vec<CapturedFile> {
        self.files.lock().clone()
    }

    pub fn set_fail_open(&self, fail: bool) {
        self.fail_open.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_write(&self, fail: bool) {
        self.fail_write.store(fail, Ordering::SeqCst);
    }
}

/// Sink factory that keeps every file in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySinkFactory {
    pub captured: Captured,
}

impl SinkFactory for MemorySinkFactory {
    fn open(&self, path: &Path, config: &WarcConfig) -> Result<Box<dyn ByteSink>> {
        if self.captured.fail_open.load(Ordering::SeqCst) {
            return Err(WarcError::Open {
                path: path.to_path_buf(),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "injected"),
            });
        }

        let mut files = self.captured.files.lock();
        files.push(CapturedFile {
            path: path.to_path_buf(),
            ..CapturedFile::default()
        });
        Ok(Box::new(MemorySink {
            captured: self.captured.clone(),
            index: files.len() - 1,
            max_size: config.max_size,
            written: 0,
        }))
    }
}

struct MemorySink {
    captured: Captured,
    index: usize,
    max_size: u64,
    written: u64,
}

impl ByteSink for MemorySink {
    fn write_record(&mut self, record: WarcRecord) -> Result<()> {
        let mut buf = Vec::new();
        record.write_to(&mut buf)?;

        let mut files = self.captured.files.lock();
        let file = &mut files[self.index];
        if self.captured.fail_write.load(Ordering::SeqCst) {
            // Simulate a disk that accepted half the record.
            file.data.extend_from_slice(&buf[..buf.len() / 2]);
            return Err(WarcError::Write(io::Error::other("injected write failure")));
        }
        file.data.extend_from_slice(&buf);
        drop(files);
        self.written += buf.len() as u64;
        Ok(())
    }

    fn is_full(&self) -> bool {
        self.max_size > 0 && self.written >= self.max_size
    }

    fn bytes_written(&self) -> u64 {
        self.written
    }

    fn finalize(&mut self) -> Result<()> {
        self.captured.files.lock()[self.index].finalized = true;
        Ok(())
    }
}

/// One record read back from WARC bytes
#[derive(Debug, Clone)]
pub struct ParsedRecord {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ParsedRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Split uncompressed WARC bytes into records.
pub fn parse_records(mut data: &[u8]) -> Vec<ParsedRecord> {
    let mut records = Vec::new();
    while !data.is_empty() {
        let end = data
            .windows(4)
            .position(|w| w == b"\r\n\r\n")
            .expect("header terminator");
        let header = std::str::from_utf8(&data[..end]).expect("utf-8 header");
        let mut lines = header.split("\r\n");
        assert_eq!(lines.next(), Some("WARC/1.0"));

        let headers: HashMap<String, String> = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        let length: usize = headers["Content-Length"].parse().expect("content length");

        let body_start = end + 4;
        let body = data[body_start..body_start + length].to_vec();
        assert_eq!(&data[body_start + length..body_start + length + 4], b"\r\n\r\n");
        data = &data[body_start + length + 4..];

        records.push(ParsedRecord { headers, body });
    }
    records
}

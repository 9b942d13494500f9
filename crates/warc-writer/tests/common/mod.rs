//! Shared helpers for reading back WARC output in integration tests

use flate2::read::MultiGzDecoder;
use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};

/// One record read back from a WARC file
#[derive(Debug)]
pub struct ParsedRecord {
    pub headers: HashMap<String, String>,
    pub body: Vec<u8>,
}

impl ParsedRecord {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Read a `.warc` or `.warc.gz` file and split it into records.
pub fn read_warc(path: &Path) -> Vec<ParsedRecord> {
    let raw = std::fs::read(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));

    let data = if path.extension().is_some_and(|ext| ext == "gz") {
        let mut out = Vec::new();
        MultiGzDecoder::new(raw.as_slice())
            .read_to_end(&mut out)
            .expect("decompress gzip members");
        out
    } else {
        raw
    };

    parse_records(&data)
}

/// Split uncompressed WARC bytes into records, honouring Content-Length.
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
        assert_eq!(
            &data[body_start + length..body_start + length + 4],
            b"\r\n\r\n",
            "record trailer"
        );
        data = &data[body_start + length + 4..];
        records.push(ParsedRecord { headers, body });
    }
    records
}

/// Sorted names of the files in `dir`.
pub fn dir_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .collect();
    entries.sort();
    entries
}

/// Route writer logs to the test harness output.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("warc_writer=debug")
        .try_init();
}

//! Mutex-guarded writer for threaded producers

use crate::Result;
use crate::record::WarcRecord;
use crate::record_id::RecordId;
use crate::writer::{WarcWriter, WriterState};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;

/// Cloneable handle to one [`WarcWriter`] shared between threads
///
/// Every operation holds the lock for its full duration, so a size check,
/// the rotation it triggers, and the write that follows are never
/// interleaved with another producer's record.
#[derive(Clone)]
pub struct SharedWarcWriter {
    inner: Arc<Mutex<WarcWriter>>,
}

impl SharedWarcWriter {
    /// Wrap a writer for shared use.
    pub fn new(writer: WarcWriter) -> Self {
        Self {
            inner: Arc::new(Mutex::new(writer)),
        }
    }

    /// See [`WarcWriter::initialize`].
    pub fn initialize(&self) -> Result<()> {
        self.inner.lock().initialize()
    }

    /// See [`WarcWriter::store_record`].
    pub fn store_record(&self, record: WarcRecord) -> Result<()> {
        self.inner.lock().store_record(record)
    }

    /// See [`WarcWriter::rotate`].
    pub fn rotate(&self) -> Result<()> {
        self.inner.lock().rotate()
    }

    /// See [`WarcWriter::close`].
    pub fn close(&self) -> Result<()> {
        self.inner.lock().close()
    }

    /// Current lifecycle state
    pub fn state(&self) -> WriterState {
        self.inner.lock().state()
    }

    /// Path of the open file
    pub fn current_path(&self) -> Option<PathBuf> {
        self.inner.lock().current_path().map(PathBuf::from)
    }

    /// Identifier of the open file's warcinfo record
    pub fn warcinfo_id(&self) -> Option<RecordId> {
        self.inner.lock().warcinfo_id().cloned()
    }

    /// Every file opened so far, in order
    pub fn files_opened(&self) -> Vec<PathBuf> {
        self.inner.lock().files_opened().to_vec()
    }

    /// Run `f` with exclusive access to the writer.
    pub fn with_writer<T>(&self, f: impl FnOnce(&mut WarcWriter) -> T) -> T {
        f(&mut self.inner.lock())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::WarcConfig;
    use crate::test_utils::{MemorySinkFactory, parse_records};
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn test_concurrent_producers_with_rotation() {
        let factory = MemorySinkFactory::default();
        let writer = WarcWriter::with_sink_factory(
            WarcConfig::new("crawl").with_max_size(2048),
            factory.clone(),
        );
        let shared = SharedWarcWriter::new(writer);
        shared.initialize().expect("initialize");

        let producers: Vec<_> = (0..8)
            .map(|producer| {
                let shared = shared.clone();
                thread::spawn(move || {
                    for i in 0..25 {
                        let uri = format!("http://example.com/{producer}/{i}");
                        let record = WarcRecord::resource(uri, vec![b'x'; 300])
                            .with_content_type("text/plain");
                        shared.store_record(record).expect("store");
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().expect("producer thread");
        }
        shared.close().expect("close");

        let files = factory.captured.files();
        assert!(files.len() > 1, "size limit should force rotation");
        assert_eq!(shared.files_opened().len(), files.len());

        let mut uris = HashSet::new();
        for file in &files {
            let records = parse_records(&file.data);
            let info_id = records[0].header("WARC-Record-ID").expect("warcinfo id");
            for record in &records[1..] {
                assert_eq!(record.header("WARC-Warcinfo-ID"), Some(info_id));
                uris.insert(record.header("WARC-Target-URI").expect("uri").to_string());
            }
        }
        assert_eq!(uris.len(), 8 * 25);
    }

    #[test]
    fn test_with_writer_exposes_state() {
        let factory = MemorySinkFactory::default();
        let shared = SharedWarcWriter::new(WarcWriter::with_sink_factory(
            WarcConfig::new("crawl"),
            factory,
        ));
        assert_eq!(shared.state(), WriterState::Uninitialized);
        shared.initialize().expect("initialize");

        let records = shared.with_writer(|writer| writer.records_in_current_file());
        assert_eq!(records, 1);
        assert!(shared.warcinfo_id().is_some());
        assert_eq!(shared.current_path(), Some(PathBuf::from("crawl.warc")));
    }
}

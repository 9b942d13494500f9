//! Writer thread fed by async producers
//!
//! Archive writing is blocking I/O that must finish before the next record
//! is accepted, so the writer lives on its own OS thread and drains a
//! channel of commands. Async tasks submit records through a
//! [`WriterHandle`] and await the outcome.

use crate::record::WarcRecord;
use crate::writer::WarcWriter;
use crate::{Result, WarcError};
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

/// Command sent to the writer thread
enum Command {
    Store {
        record: WarcRecord,
        response_tx: oneshot::Sender<Result<()>>,
    },
    Rotate {
        response_tx: oneshot::Sender<Result<()>>,
    },
    Shutdown {
        response_tx: oneshot::Sender<Result<()>>,
    },
}

/// Cloneable async handle to a writer running on its own thread
#[derive(Clone)]
pub struct WriterHandle {
    command_tx: mpsc::UnboundedSender<Command>,
}

/// Move `writer` onto a dedicated thread and return a handle to it.
///
/// The writer should already be initialized. The thread exits after
/// [`WriterHandle::shutdown`] or once every handle is dropped, closing the
/// current file either way.
pub fn spawn_writer(writer: WarcWriter) -> std::io::Result<(WriterHandle, JoinHandle<()>)> {
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let join = thread::Builder::new()
        .name("warc-writer".to_string())
        .spawn(move || writer_loop(writer, command_rx))?;
    Ok((WriterHandle { command_tx }, join))
}

fn writer_loop(mut writer: WarcWriter, mut command_rx: mpsc::UnboundedReceiver<Command>) {
    debug!("Started WARC writer thread");

    while let Some(command) = command_rx.blocking_recv() {
        match command {
            Command::Store {
                record,
                response_tx,
            } => {
                let _ = response_tx.send(writer.store_record(record));
            }
            Command::Rotate { response_tx } => {
                let _ = response_tx.send(writer.rotate());
            }
            Command::Shutdown { response_tx } => {
                let _ = response_tx.send(writer.close());
                debug!("WARC writer thread shut down");
                return;
            }
        }
    }

    if let Err(e) = writer.close() {
        warn!("Failed to close WARC file after all handles dropped: {e}");
    }
    debug!("WARC writer thread completed");
}

impl WriterHandle {
    /// Store a record; see [`WarcWriter::store_record`].
    pub async fn store_record(&self, record: WarcRecord) -> Result<()> {
        self.request(|response_tx| Command::Store {
            record,
            response_tx,
        })
        .await
    }

    /// Force a rotation; see [`WarcWriter::rotate`].
    pub async fn rotate(&self) -> Result<()> {
        self.request(|response_tx| Command::Rotate { response_tx })
            .await
    }

    /// Close the current file and stop the writer thread.
    pub async fn shutdown(&self) -> Result<()> {
        self.request(|response_tx| Command::Shutdown { response_tx })
            .await
    }

    async fn request(
        &self,
        command: impl FnOnce(oneshot::Sender<Result<()>>) -> Command,
    ) -> Result<()> {
        let (response_tx, response_rx) = oneshot::channel();
        self.command_tx
            .send(command(response_tx))
            .map_err(|_| WarcError::WriterUnavailable)?;
        response_rx
            .await
            .map_err(|_| WarcError::WriterUnavailable)?
    }
}

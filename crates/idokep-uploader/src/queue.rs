//! Record queue between the host engine and the upload worker.
//!
//! The host side holds a [`RecordBridge`] and pushes records without ever
//! blocking. The worker owns the [`UploadQueue`], which pulls everything
//! pending into a local backlog so the oldest entries can be trimmed before
//! the next upload.

use std::collections::VecDeque;

use idokep_types::ObservationRecord;
use tokio::sync::mpsc;
use tracing::warn;

/// Create a connected bridge and queue.
pub fn record_queue() -> (RecordBridge, UploadQueue) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        RecordBridge { tx },
        UploadQueue {
            rx,
            backlog: VecDeque::new(),
        },
    )
}

/// Producer handle for new observation records.
///
/// Cloneable; the queue closes once every bridge is dropped.
#[derive(Debug, Clone)]
pub struct RecordBridge {
    tx: mpsc::UnboundedSender<ObservationRecord>,
}

impl RecordBridge {
    /// Hand a freshly archived record to the worker. Never blocks.
    pub fn new_record(&self, record: ObservationRecord) {
        let date_time = record.date_time;
        if self.tx.send(record).is_err() {
            warn!(date_time = date_time, "upload worker is gone, record dropped");
        }
    }

    /// Whether the worker side has shut down.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Consumer side of the record queue, owned by the worker.
#[derive(Debug)]
pub struct UploadQueue {
    rx: mpsc::UnboundedReceiver<ObservationRecord>,
    backlog: VecDeque<ObservationRecord>,
}

impl UploadQueue {
    /// Wait until at least one record is pending, then move every record
    /// already sent by the bridge into the backlog.
    ///
    /// Returns `false` once every bridge is dropped and the backlog is empty.
    pub async fn wait_ready(&mut self) -> bool {
        if self.backlog.is_empty() {
            match self.rx.recv().await {
                Some(record) => self.backlog.push_back(record),
                None => return false,
            }
        }
        while let Ok(record) = self.rx.try_recv() {
            self.backlog.push_back(record);
        }
        true
    }

    /// Drop the oldest records so at most `max_backlog` remain. Returns how
    /// many were dropped.
    pub fn trim(&mut self, max_backlog: usize) -> usize {
        trim_backlog(&mut self.backlog, max_backlog)
    }

    /// Take the oldest pending record.
    pub fn pop(&mut self) -> Option<ObservationRecord> {
        self.backlog.pop_front()
    }

    /// Number of records in the local backlog.
    pub fn len(&self) -> usize {
        self.backlog.len()
    }

    /// Whether the local backlog is empty.
    pub fn is_empty(&self) -> bool {
        self.backlog.is_empty()
    }
}

/// Discard entries from the front of `backlog` until at most `max` remain.
/// Survivors keep their order. Returns the number discarded.
pub fn trim_backlog<T>(backlog: &mut VecDeque<T>, max: usize) -> usize {
    let excess = backlog.len().saturating_sub(max);
    backlog.drain(..excess);
    excess
}

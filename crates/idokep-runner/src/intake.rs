//! Record intake from a newline-delimited JSON stream.
//!
//! Each line is one observation record in the host engine's JSON shape,
//! e.g. `{"dateTime": 1400000000, "usUnits": 1, "outTemp": 68.2}`. Blank
//! lines are ignored; malformed lines are logged and skipped.
//!
//! Lines are read on a dedicated OS thread that is never joined. A read
//! blocked on an idle pipe cannot be cancelled, so it must not keep the
//! process alive after Ctrl-C.

use std::io::{self, BufRead};
use std::thread;

use idokep_types::ObservationRecord;
use idokep_uploader::RecordBridge;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::error::RunnerError;

/// Lines arriving from a reader thread.
pub type LineReceiver = mpsc::UnboundedReceiver<io::Result<String>>;

/// Counts from one intake run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeStats {
    /// Records handed to the worker.
    pub forwarded: u64,
    /// Lines that could not be parsed.
    pub skipped: u64,
}

/// Read `reader` line by line on a detached thread.
///
/// The channel closes at end of input, after a read error, or once the
/// receiver is dropped and the next line arrives.
///
/// # Errors
///
/// Returns an error if the thread cannot be spawned.
pub fn spawn_line_reader<R>(reader: R) -> io::Result<LineReceiver>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("record-reader".to_owned())
        .spawn(move || {
            for line in reader.lines() {
                let failed = line.is_err();
                if tx.send(line).is_err() || failed {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Forward every record in `lines` to `bridge` until end of input.
///
/// # Errors
///
/// Returns [`RunnerError::Io`] if reading fails, or
/// [`RunnerError::WorkerGone`] if the worker stopped while records were
/// still arriving.
pub async fn forward_records(
    mut lines: LineReceiver,
    bridge: &RecordBridge,
) -> Result<IntakeStats, RunnerError> {
    let mut stats = IntakeStats::default();
    let mut line_number: u64 = 0;

    while let Some(line) = lines.recv().await {
        let line = line?;
        line_number = line_number.saturating_add(1);
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match serde_json::from_str::<ObservationRecord>(line) {
            Ok(record) => {
                if bridge.is_closed() {
                    return Err(RunnerError::WorkerGone);
                }
                debug!(
                    line_number = line_number,
                    date_time = record.date_time,
                    "new archive record"
                );
                bridge.new_record(record);
                stats.forwarded = stats.forwarded.saturating_add(1);
            }
            Err(e) => {
                warn!(
                    line_number = line_number,
                    error = %e,
                    "malformed record, skipping"
                );
                stats.skipped = stats.skipped.saturating_add(1);
            }
        }
    }

    Ok(stats)
}

//! Upload worker that posts weather observations to Idokep.
//!
//! The host engine pushes each new archive record through a
//! [`RecordBridge`]. A single background [`Uploader`] drains the queue,
//! throttles to one post per interval, drops stale or excess records,
//! formats the Idokep query string and sends it with bounded retries.
//!
//! # Architecture
//!
//! ```text
//! host engine --> RecordBridge --> UploadQueue --> Uploader --> HTTP GET
//!                                                   |-- RequestFormatter
//!                                                   |-- Transport
//!                                                   `-- ResponseValidator
//! ```
//!
//! # Modules
//!
//! - [`config`] -- Options, defaults and validation
//! - [`error`] -- [`ConfigError`] and [`UploadError`]
//! - [`format`] -- Idokep query-string formatting
//! - [`queue`] -- Non-blocking bridge and worker-side backlog
//! - [`service`] -- Wiring and lifecycle for the real endpoint
//! - [`transport`] -- HTTP delivery via `reqwest`
//! - [`units`] -- Conversion to METRICWX units
//! - [`uploader`] -- The throttled, retrying worker loop
//! - [`validate`] -- Success-marker response check

pub mod config;
pub mod error;
pub mod format;
pub mod queue;
pub mod service;
pub mod transport;
pub mod units;
pub mod uploader;
pub mod validate;

pub use config::UploaderConfig;
pub use error::{ConfigError, UploadError};
pub use format::{IdokepFormatter, RequestFormatter, UploadRequest};
pub use queue::{RecordBridge, UploadQueue, record_queue};
pub use service::IdokepService;
pub use transport::{HttpReply, HttpTransport, Transport};
pub use units::{StandardConverter, UnitConverter};
pub use uploader::{UploadOutcome, Uploader, WorkerPolicy};
pub use validate::{MarkerValidator, ResponseValidator};

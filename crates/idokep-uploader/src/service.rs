//! Idokep service wiring.
//!
//! [`IdokepService::new`] assembles the queue, formatter, validator and
//! HTTP transport from a validated [`UploaderConfig`]. Nothing runs until
//! [`IdokepService::start`] spawns the worker task.

use tokio::task::JoinHandle;
use tracing::info;

use crate::config::UploaderConfig;
use crate::error::ConfigError;
use crate::format::IdokepFormatter;
use crate::queue::{RecordBridge, UploadQueue, record_queue};
use crate::transport::HttpTransport;
use crate::units::StandardConverter;
use crate::uploader::Uploader;
use crate::validate::MarkerValidator;

/// Protocol name used in log output.
pub const PROTOCOL_NAME: &str = "Idokep";

/// The worker type used for the real endpoint.
pub type IdokepUploader =
    Uploader<IdokepFormatter<StandardConverter>, MarkerValidator, HttpTransport>;

/// A constructed but not yet running Idokep uploader.
pub struct IdokepService {
    username: String,
    uploader: IdokepUploader,
    bridge: RecordBridge,
    queue: UploadQueue,
}

impl IdokepService {
    /// Build the service from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::HttpClient`] if the HTTP client cannot be
    /// created.
    pub fn new(config: UploaderConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.timeout)
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let formatter = IdokepFormatter::new(
            config.username.clone(),
            config.password,
            config.station_type,
            config.server_url,
            StandardConverter::new(),
        );
        let validator = MarkerValidator::new(config.success_marker);
        let uploader = Uploader::new(
            PROTOCOL_NAME,
            formatter,
            validator,
            transport,
            config.policy,
        );
        let (bridge, queue) = record_queue();

        Ok(Self {
            username: config.username,
            uploader,
            bridge,
            queue,
        })
    }

    /// Spawn the worker on the current tokio runtime.
    ///
    /// Returns the bridge the host feeds records into, and the worker's
    /// handle. The worker exits after every bridge clone is dropped and the
    /// backlog has been worked through.
    pub fn start(self) -> (RecordBridge, JoinHandle<()>) {
        let policy = self.uploader.policy();
        info!(
            protocol = PROTOCOL_NAME,
            user = self.username,
            post_interval_secs = policy.post_interval.as_secs(),
            max_tries = policy.max_tries,
            skip_upload = policy.skip_upload,
            "data will be uploaded"
        );
        let handle = tokio::spawn(self.uploader.run(self.queue));
        (self.bridge, handle)
    }
}

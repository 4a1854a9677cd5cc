//! Throttled, retrying upload worker.
//!
//! The worker is assembled from three pluggable parts: a
//! [`RequestFormatter`] that builds the request, a [`Transport`] that sends
//! it, and a [`ResponseValidator`] that decides whether the server accepted
//! it. The loop itself is protocol-agnostic:
//!
//! 1. Wait for a record
//! 2. Trim the backlog to `max_backlog`, oldest first, keeping at least the
//!    newest record
//! 3. Drop the record if it is stale
//! 4. Wait out the rest of `post_interval` since the last successful post
//! 5. Format the request
//! 6. In dry-run mode, log it and stop here
//! 7. Send, retrying up to `max_tries` with `retry_wait` between attempts
//! 8. Log the outcome; a failure never stops the worker
//!
//! Uploads are strictly sequential and in queue order.

use std::time::Duration;

use chrono::Utc;
use idokep_types::ObservationRecord;
use tokio::time::{Instant, sleep, sleep_until};
use tracing::{debug, error, info, warn};

use crate::error::UploadError;
use crate::format::{RequestFormatter, UploadRequest};
use crate::queue::UploadQueue;
use crate::transport::Transport;
use crate::validate::ResponseValidator;

/// Queueing, throttling and retry policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerPolicy {
    /// Minimum time between two successful posts.
    pub post_interval: Duration,
    /// Records allowed to wait in the backlog; `None` is unbounded. The
    /// newest record always survives, so `Some(0)` behaves like `Some(1)`.
    pub max_backlog: Option<usize>,
    /// Records older than this are dropped; `None` or zero disables the
    /// check.
    pub stale: Option<Duration>,
    /// Attempts per record, including the first.
    pub max_tries: u32,
    /// Pause between attempts.
    pub retry_wait: Duration,
    /// Format and log, but never send.
    pub skip_upload: bool,
    /// Log each accepted upload at info level.
    pub log_success: bool,
    /// Log each abandoned upload at error level.
    pub log_failure: bool,
}

impl Default for WorkerPolicy {
    fn default() -> Self {
        Self {
            post_interval: Duration::from_secs(300),
            max_backlog: None,
            stale: None,
            max_tries: 3,
            retry_wait: Duration::from_secs(5),
            skip_upload: false,
            log_success: true,
            log_failure: true,
        }
    }
}

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The server accepted the record.
    Sent {
        /// Attempts used, including the successful one.
        attempts: u32,
    },
    /// Dry-run mode: the request was logged instead of sent.
    DryRun,
    /// The record was too old and was dropped unsent.
    Stale {
        /// How old the record was when it was considered.
        age: Duration,
    },
    /// Every attempt failed; the record was dropped.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// The error from the last attempt.
        error: UploadError,
    },
    /// The record could not be turned into a request and was dropped.
    Unformattable(UploadError),
}

/// A single-threaded upload worker.
pub struct Uploader<F, V, T> {
    protocol: &'static str,
    formatter: F,
    validator: V,
    transport: T,
    policy: WorkerPolicy,
    last_post: Option<Instant>,
}

impl<F, V, T> Uploader<F, V, T>
where
    F: RequestFormatter,
    V: ResponseValidator,
    T: Transport,
{
    /// Assemble a worker. `protocol` names the destination in log output.
    pub const fn new(
        protocol: &'static str,
        formatter: F,
        validator: V,
        transport: T,
        policy: WorkerPolicy,
    ) -> Self {
        Self {
            protocol,
            formatter,
            validator,
            transport,
            policy,
            last_post: None,
        }
    }

    /// The policy this worker runs under.
    pub const fn policy(&self) -> &WorkerPolicy {
        &self.policy
    }

    /// Drain `queue` until every producer is gone.
    ///
    /// Individual upload failures are logged and never end the loop.
    pub async fn run(mut self, mut queue: UploadQueue) {
        info!(protocol = self.protocol, "upload worker started");

        while queue.wait_ready().await {
            if let Some(max_backlog) = self.policy.max_backlog {
                let dropped = queue.trim(max_backlog.max(1));
                if dropped > 0 {
                    debug!(
                        protocol = self.protocol,
                        dropped = dropped,
                        max_backlog = max_backlog,
                        "backlog trimmed"
                    );
                }
            }

            let Some(record) = queue.pop() else {
                continue;
            };
            self.process(record).await;
        }

        info!(protocol = self.protocol, "record queue closed, upload worker stopping");
    }

    /// Take one record through staleness, throttling, formatting and
    /// sending.
    pub async fn process(&mut self, record: ObservationRecord) -> UploadOutcome {
        if let Some(age) = self.stale_age(&record) {
            debug!(
                protocol = self.protocol,
                date_time = record.date_time,
                age_secs = age.as_secs(),
                "record is stale, skipping"
            );
            return UploadOutcome::Stale { age };
        }

        self.throttle().await;

        let request = match self.formatter.format(&record) {
            Ok(request) => request,
            Err(e) => {
                warn!(
                    protocol = self.protocol,
                    date_time = record.date_time,
                    error = %e,
                    "record could not be formatted, skipping"
                );
                return UploadOutcome::Unformattable(e);
            }
        };
        debug!(
            protocol = self.protocol,
            url = %request.redacted_url(),
            "upload request formatted"
        );

        if self.policy.skip_upload {
            info!(
                protocol = self.protocol,
                date_time = record.date_time,
                url = %request.redacted_url(),
                "skip_upload set, not posting"
            );
            self.last_post = Some(Instant::now());
            return UploadOutcome::DryRun;
        }

        match self.post_with_retries(&request).await {
            Ok(attempts) => {
                self.last_post = Some(Instant::now());
                if self.policy.log_success {
                    info!(
                        protocol = self.protocol,
                        date_time = record.date_time,
                        attempts = attempts,
                        "published record"
                    );
                }
                UploadOutcome::Sent { attempts }
            }
            Err((attempts, e)) => {
                if self.policy.log_failure {
                    error!(
                        protocol = self.protocol,
                        date_time = record.date_time,
                        attempts = attempts,
                        error = %e,
                        "failed to publish record"
                    );
                }
                UploadOutcome::Failed { attempts, error: e }
            }
        }
    }

    /// Age of `record` if it exceeds the staleness threshold.
    fn stale_age(&self, record: &ObservationRecord) -> Option<Duration> {
        let threshold = self.policy.stale.filter(|s| !s.is_zero())?;
        let timestamp = record.timestamp()?;
        let age = (Utc::now() - timestamp).to_std().ok()?;
        (age > threshold).then_some(age)
    }

    /// Sleep until `post_interval` has passed since the last successful post.
    async fn throttle(&self) {
        let Some(last_post) = self.last_post else {
            return;
        };
        let Some(ready_at) = last_post.checked_add(self.policy.post_interval) else {
            return;
        };
        let now = Instant::now();
        if now < ready_at {
            debug!(
                protocol = self.protocol,
                wait_ms = ready_at.saturating_duration_since(now).as_millis(),
                "throttling until post interval elapses"
            );
            sleep_until(ready_at).await;
        }
    }

    /// Send `request` up to `max_tries` times. Returns the attempts used on
    /// success, or the attempts made and the last error on failure.
    async fn post_with_retries(&self, request: &UploadRequest) -> Result<u32, (u32, UploadError)> {
        let max_tries = self.policy.max_tries.max(1);
        let mut attempt: u32 = 0;
        loop {
            attempt = attempt.saturating_add(1);
            match self.attempt(request).await {
                Ok(()) => return Ok(attempt),
                Err(e) if !e.is_retryable() || attempt >= max_tries => {
                    return Err((attempt, e));
                }
                Err(e) => {
                    debug!(
                        protocol = self.protocol,
                        attempt = attempt,
                        max_tries = max_tries,
                        error = %e,
                        "upload attempt failed, retrying"
                    );
                    sleep(self.policy.retry_wait).await;
                }
            }
        }
    }

    /// One send plus validation.
    async fn attempt(&self, request: &UploadRequest) -> Result<(), UploadError> {
        let reply = self.transport.send(request).await?;
        self.validator.validate(&reply)
    }
}

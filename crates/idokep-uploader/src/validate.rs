//! Response validation.
//!
//! Idokep answers every request with a short plain-text page. Only the
//! presence of the success phrase tells an accepted upload apart from a
//! rejected one; the HTTP status alone is not enough.

use crate::error::UploadError;
use crate::transport::HttpReply;

/// Longest body excerpt carried in a rejection message.
const MAX_EXCERPT_LEN: usize = 200;

/// Decides whether a server reply means the upload was accepted.
pub trait ResponseValidator: Send + Sync + 'static {
    /// Accept or reject `reply`.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::Rejected`] if the upload was not accepted.
    fn validate(&self, reply: &HttpReply) -> Result<(), UploadError>;
}

/// Accepts replies with a success status whose body contains a fixed phrase.
#[derive(Debug, Clone)]
pub struct MarkerValidator {
    marker: String,
}

impl MarkerValidator {
    /// Create a validator looking for `marker` anywhere in the body.
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            marker: marker.into(),
        }
    }
}

impl ResponseValidator for MarkerValidator {
    fn validate(&self, reply: &HttpReply) -> Result<(), UploadError> {
        if !reply.status.is_success() {
            return Err(UploadError::Rejected(format!(
                "server returned {}: {}",
                reply.status,
                excerpt(&reply.body)
            )));
        }
        if !reply.body.contains(&self.marker) {
            return Err(UploadError::Rejected(format!(
                "server returned '{}'",
                excerpt(&reply.body)
            )));
        }
        Ok(())
    }
}

/// First line-joined part of the body, bounded for logging.
fn excerpt(body: &str) -> String {
    let joined = body.lines().map(str::trim).collect::<Vec<_>>().join(", ");
    if joined.len() <= MAX_EXCERPT_LEN {
        return joined;
    }
    let mut end = MAX_EXCERPT_LEN;
    while end > 0 && !joined.is_char_boundary(end) {
        end = end.saturating_sub(1);
    }
    let mut truncated = joined.get(..end).unwrap_or_default().to_owned();
    truncated.push_str("...");
    truncated
}

#[cfg(test)]
mod tests {
    use reqwest::StatusCode;

    use super::*;

    fn reply(status: StatusCode, body: &str) -> HttpReply {
        HttpReply {
            status,
            body: body.to_owned(),
        }
    }

    #[test]
    fn marker_anywhere_in_body_is_accepted() {
        let validator = MarkerValidator::new("sz!");
        assert!(validator.validate(&reply(StatusCode::OK, "Adatok fogadva\nKész!\n")).is_ok());
    }

    #[test]
    fn missing_marker_is_rejected_despite_ok_status() {
        let validator = MarkerValidator::new("sz!");
        let result = validator.validate(&reply(StatusCode::OK, "Hibás jelszó"));
        assert!(matches!(result, Err(UploadError::Rejected(msg)) if msg.contains("Hibás jelszó")));
    }

    #[test]
    fn error_status_is_rejected_even_with_marker() {
        let validator = MarkerValidator::new("sz!");
        let result = validator.validate(&reply(StatusCode::INTERNAL_SERVER_ERROR, "Kész!"));
        assert!(matches!(result, Err(UploadError::Rejected(msg)) if msg.contains("500")));
    }

    #[test]
    fn long_bodies_are_truncated_on_char_boundary() {
        let body = "é".repeat(300);
        let short = excerpt(&body);
        assert!(short.ends_with("..."));
        assert!(short.len() <= MAX_EXCERPT_LEN + 3);
    }
}
